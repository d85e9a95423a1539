// Network access layer — transport trait, reqwest backend, reachability probe.

pub mod http_transport;
pub mod reachability;
pub mod traits;
