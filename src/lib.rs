//! netqueue — batched, cached, persistent network fetch engine.
//!
//! Client code submits fetch descriptors (plain HTTP, image, audio,
//! versioned bundle) either for immediate dispatch through [`NetClient`] or
//! for deferred, rate-limited batch execution via the [`QueueEngine`], which
//! persists pending work across restarts and reconciles results with an
//! on-disk TTL cache.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod client;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod request;
pub mod source;

pub use client::NetClient;
pub use config::NetConfig;
pub use engine::cache::CacheStore;
pub use engine::dispatcher::{DispatchOutcome, Dispatcher};
pub use engine::host::TaskHost;
pub use engine::queue::{QueueEngine, QueueEvent};
pub use error::FetchError;
pub use request::{
    AudioFormat, AudioRequest, BundleRequest, Callbacks, ImageRequest, Method, Payload,
    RequestDescriptor, RequestId, WebRequest,
};
pub use source::http_transport::{ReqwestTransport, TransportSettings};
pub use source::reachability::{AssumeOnline, NetworkType, Reachability};
pub use source::traits::{HttpTransport, TransportRequest, TransportResponse};

static INIT_TRACING: Once = Once::new();

/// Install a default tracing subscriber, once. Respects `RUST_LOG`; quiets
/// the HTTP stack's own targets by default.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        info!("netqueue tracing initialized");
    });
}
