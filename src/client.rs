// Public endpoint — immediate dispatch, queue access, connectivity helpers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::NetConfig;
use crate::engine::cache::CacheStore;
use crate::engine::dispatcher::Dispatcher;
use crate::engine::host::TaskHost;
use crate::engine::queue::QueueEngine;
use crate::error::FetchError;
use crate::request::RequestDescriptor;
use crate::source::http_transport::ReqwestTransport;
use crate::source::reachability::{AssumeOnline, NetworkType, Reachability};
use crate::source::traits::{HttpTransport, TransportRequest};

/// Default URL probed when classifying the current network type.
const DEFAULT_PROBE_URL: &str = "https://google.com/";

/// Entry point tying the engine together: a dispatcher for immediate sends,
/// a queue for deferred batched execution, and an owned task host.
///
/// Construct inside a tokio runtime. When persistence is enabled, a queue
/// saved by a previous session is reloaded at construction and dispatch
/// resumes immediately.
pub struct NetClient {
    transport: Arc<dyn HttpTransport>,
    reachability: Arc<dyn Reachability>,
    dispatcher: Arc<Dispatcher>,
    queue: Arc<QueueEngine>,
    host: Arc<TaskHost>,
    probe_url: String,
}

impl NetClient {
    /// Build with the default reqwest transport and an always-online probe.
    pub fn new(config: NetConfig, data_dir: &Path, persist_dir: &Path) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::with_defaults()?);
        Self::with_parts(config, transport, Arc::new(AssumeOnline), data_dir, persist_dir)
    }

    /// Build with explicit collaborators (injected transport/probe).
    pub fn with_parts(
        config: NetConfig,
        transport: Arc<dyn HttpTransport>,
        reachability: Arc<dyn Reachability>,
        data_dir: &Path,
        persist_dir: &Path,
    ) -> Result<Self> {
        let config = config.clamped();
        let cache = Arc::new(CacheStore::new(data_dir, config.cache_lifetime)?);
        let host = Arc::new(TaskHost::new());
        let dispatcher = Arc::new(Dispatcher::new(
            config.clone(),
            Arc::clone(&transport),
            cache,
            Arc::clone(&reachability),
        ));
        let queue = QueueEngine::new(
            config.clone(),
            Arc::clone(&dispatcher),
            Arc::clone(&host),
            persist_dir,
        );

        if config.debug_mode {
            info!("netqueue client initialized");
        }

        // Resume a previous session's queue right away.
        if config.save_queue_between_sessions && queue.load_queue() {
            queue.start();
        }

        Ok(Self {
            transport,
            reachability,
            dispatcher,
            queue,
            host,
            probe_url: DEFAULT_PROBE_URL.to_string(),
        })
    }

    /// Override the URL used by `network_type` probing.
    pub fn set_probe_url(&mut self, url: impl Into<String>) {
        self.probe_url = url.into();
    }

    /// Dispatch a descriptor immediately, bypassing the queue. Outcome is
    /// reported solely through the descriptor's callbacks.
    pub fn send(&self, descriptor: impl Into<RequestDescriptor>) {
        let descriptor = descriptor.into();
        let dispatcher = Arc::clone(&self.dispatcher);
        self.host.spawn(async move {
            dispatcher.dispatch(&descriptor).await;
        });
    }

    pub fn queue(&self) -> &Arc<QueueEngine> {
        &self.queue
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        self.dispatcher.cache()
    }

    /// Classify the current network: the platform probe short-circuits to
    /// `None` without any request; otherwise a probe request decides between
    /// the reported reachability and `None` on failure.
    pub async fn network_type(&self) -> NetworkType {
        let reported = self.reachability.current();
        if reported == NetworkType::None {
            return NetworkType::None;
        }
        match self
            .transport
            .execute(TransportRequest::get(&self.probe_url))
            .await
        {
            Ok(_) => self.reachability.current(),
            Err(_) => NetworkType::None,
        }
    }

    /// HEAD probe for the Content-Length a URL would serve.
    pub async fn content_length(&self, url: &str) -> Result<u64, FetchError> {
        self.transport.head_content_length(url).await
    }

    /// Stop the queue loop and cancel all hosted background work.
    pub fn shutdown(&self) {
        self.queue.stop();
        self.host.shutdown();
    }
}
