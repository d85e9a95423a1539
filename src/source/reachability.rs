use serde::{Deserialize, Serialize};

/// How the device is currently reaching the network, as reported by the
/// platform probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkType {
    /// No connectivity at all.
    None,
    /// Local-area network (wifi / ethernet).
    LocalArea,
    /// Carrier data network.
    Carrier,
}

/// Platform connectivity probe. The dispatcher consults it before every
/// network call; `NetworkType::None` short-circuits the request entirely.
pub trait Reachability: Send + Sync {
    fn current(&self) -> NetworkType;
}

/// Default probe for environments without a platform connectivity API:
/// always reports a local-area connection and lets the transport surface
/// real connection failures.
pub struct AssumeOnline;

impl Reachability for AssumeOnline {
    fn current(&self) -> NetworkType {
        NetworkType::LocalArea
    }
}
