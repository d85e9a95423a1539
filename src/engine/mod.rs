// Engine orchestration — cache store, dispatcher, queue loop, task host.

pub mod cache;
pub mod dispatcher;
pub mod host;
pub mod persist;
pub mod queue;
