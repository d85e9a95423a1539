// Single-attempt request execution — callbacks, caching, error classification.

use std::sync::Arc;

use tracing::{debug, warn};

use super::cache::CacheStore;
use crate::config::NetConfig;
use crate::error::FetchError;
use crate::request::{
    BundleRequest, Callbacks, Payload, RequestDescriptor, WebRequest,
};
use crate::source::reachability::{NetworkType, Reachability};
use crate::source::traits::{HttpTransport, TransportRequest};

/// Expected manifest line carrying the version hash, zero-based.
const MANIFEST_HASH_LINE: usize = 5;
/// A well-formed version hash is a 128-bit value in hex.
const MANIFEST_HASH_LEN: usize = 32;

/// Terminal result of one dispatch attempt.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Success,
    Failed(FetchError),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success)
    }
}

/// Executes one request descriptor against the network.
///
/// Fires the descriptor's terminal callback exactly once per attempt
/// (`on_progress` may fire multiple times first) and writes successful
/// cacheable payloads through to the cache store. Never retries — a failed
/// attempt is reported and left to the queue's retry policy.
pub struct Dispatcher {
    config: NetConfig,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<CacheStore>,
    reachability: Arc<dyn Reachability>,
}

impl Dispatcher {
    pub fn new(
        config: NetConfig,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<CacheStore>,
        reachability: Arc<dyn Reachability>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
            reachability,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Execute one attempt. The terminal error callback is invoked here;
    /// the returned outcome only tells the queue whether to remove the entry.
    pub async fn dispatch(&self, descriptor: &RequestDescriptor) -> DispatchOutcome {
        if self.reachability.current() == NetworkType::None {
            let err = FetchError::ConnectivityUnavailable;
            warn!(url = descriptor.url(), "no connectivity, request not attempted");
            descriptor.callbacks().error(err.to_string());
            return DispatchOutcome::Failed(err);
        }

        let result = match descriptor {
            RequestDescriptor::Web(request) => self.execute_web(request).await,
            RequestDescriptor::Image(request) => {
                self.execute_content(&request.url, request.cacheable, &request.callbacks)
                    .await
            }
            RequestDescriptor::Audio(request) => {
                self.execute_content(&request.url, request.cacheable, &request.callbacks)
                    .await
            }
            RequestDescriptor::Bundle(request) => self.execute_bundle(request).await,
        };

        match result {
            Ok(()) => {
                if self.config.debug_mode {
                    debug!(
                        kind = descriptor.kind(),
                        url = descriptor.url(),
                        "dispatch succeeded"
                    );
                }
                DispatchOutcome::Success
            }
            Err(err) => {
                if self.config.debug_mode {
                    warn!(
                        kind = descriptor.kind(),
                        url = descriptor.url(),
                        %err,
                        "dispatch failed"
                    );
                }
                descriptor.callbacks().error(err.to_string());
                DispatchOutcome::Failed(err)
            }
        }
    }

    async fn execute_web(&self, request: &WebRequest) -> Result<(), FetchError> {
        // Cache-hit branch: serve the cached body eagerly. Unless the
        // refresh flag is off, the network call still happens afterwards,
        // so a second on_complete may follow with fresh data.
        if request.cacheable {
            if let Some(cached) = self.cache.get_text(&request.url) {
                debug!(url = %request.url, "serving cached response");
                request.callbacks.complete(Payload::Text(cached));
                if !self.config.refresh_cached_requests {
                    return Ok(());
                }
            }
        }

        if self.config.debug_mode {
            debug!(
                method = request.method.as_str(),
                url = %request.url,
                "sending request"
            );
        }

        let transport_request = TransportRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            form: request.form_data.clone(),
        };
        let response = self
            .execute_with_progress(transport_request, &request.callbacks)
            .await?;
        let body = response.text()?;

        request.callbacks.complete(Payload::Text(body.clone()));
        if request.cacheable {
            if let Err(err) = self.cache.put_text(&request.url, &body) {
                warn!(url = %request.url, %err, "failed to write response cache");
            }
        }
        Ok(())
    }

    /// Shared path for image and audio downloads: content cache has no TTL.
    async fn execute_content(
        &self,
        url: &str,
        cacheable: bool,
        callbacks: &Callbacks,
    ) -> Result<(), FetchError> {
        if cacheable {
            if let Some(cached) = self.cache.get_content(url) {
                debug!(url, "serving cached content");
                callbacks.complete(Payload::Bytes(cached));
                if !self.config.refresh_cached_requests {
                    return Ok(());
                }
            }
        }

        if self.config.debug_mode {
            debug!(url, "downloading content");
        }

        let response = self
            .execute_with_progress(TransportRequest::get(url), callbacks)
            .await?;

        callbacks.complete(Payload::Bytes(response.body.clone()));
        if cacheable {
            if let Err(err) = self.cache.put_content(url, &response.body) {
                warn!(url, %err, "failed to write content cache");
            }
        }
        Ok(())
    }

    /// Two-stage bundle fetch: manifest text first, then the bundle itself
    /// versioned by the manifest hash. Any stage failure aborts the rest.
    async fn execute_bundle(&self, request: &BundleRequest) -> Result<(), FetchError> {
        if self.config.debug_mode {
            debug!(manifest_url = %request.manifest_url, "downloading bundle manifest");
        }

        let manifest = self
            .transport
            .execute(TransportRequest::get(&request.manifest_url))
            .await?
            .text()?;

        let hash = parse_manifest_hash(&manifest).ok_or_else(|| FetchError::ManifestInvalid {
            manifest_url: request.manifest_url.clone(),
        })?;

        if self.config.debug_mode {
            debug!(bundle_url = %request.bundle_url, %hash, "downloading bundle");
        }

        let response = self
            .execute_with_progress(
                TransportRequest::get(url_with_hash(&request.bundle_url, &hash)),
                &request.callbacks,
            )
            .await?;

        request.callbacks.complete(Payload::Bytes(response.body.clone()));
        if request.cacheable {
            // Keyed by the plain bundle URL, not the versioned one.
            if let Err(err) = self.cache.put_content(&request.bundle_url, &response.body) {
                warn!(url = %request.bundle_url, %err, "failed to write bundle cache");
            }
        }
        Ok(())
    }

    /// Route through the streaming transport when the descriptor wants
    /// progress reports, the buffered one otherwise.
    async fn execute_with_progress(
        &self,
        request: TransportRequest,
        callbacks: &Callbacks,
    ) -> Result<crate::source::traits::TransportResponse, FetchError> {
        match &callbacks.on_progress {
            Some(on_progress) => {
                let on_progress = Arc::clone(on_progress);
                self.transport
                    .execute_streaming(request, &move |fraction, bytes| {
                        on_progress(fraction, bytes)
                    })
                    .await
            }
            None => self.transport.execute(request).await,
        }
    }
}

/// Extract the version hash token from a bundle manifest body.
///
/// The hash lives at a fixed position: line index 5, after the colon.
/// Returns `None` when the line is missing or the token is not a 32-digit
/// hex value.
pub fn parse_manifest_hash(manifest: &str) -> Option<String> {
    let row = manifest.lines().nth(MANIFEST_HASH_LINE)?;
    let token = row.split(':').nth(1)?.trim();
    if token.len() == MANIFEST_HASH_LEN && token.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(token.to_ascii_lowercase())
    } else {
        None
    }
}

fn url_with_hash(url: &str, hash: &str) -> String {
    if url.contains('?') {
        format!("{url}&hash={hash}")
    } else {
        format!("{url}?hash={hash}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "ManifestFileVersion: 0\nCRC: 2422268106\nHashes:\n  AssetFileHash:\n    serializedVersion: 2\n    Hash: 8b6db55a2344f068cf8a9be0a662ba15\nClassTypes:\n";

    #[test]
    fn parses_hash_from_fixed_manifest_row() {
        assert_eq!(
            parse_manifest_hash(MANIFEST).as_deref(),
            Some("8b6db55a2344f068cf8a9be0a662ba15")
        );
    }

    #[test]
    fn rejects_short_or_non_hex_tokens() {
        let short = MANIFEST.replace("8b6db55a2344f068cf8a9be0a662ba15", "abc123");
        assert_eq!(parse_manifest_hash(&short), None);

        let non_hex = MANIFEST.replace("8b6db55a2344f068cf8a9be0a662ba15", &"z".repeat(32));
        assert_eq!(parse_manifest_hash(&non_hex), None);
    }

    #[test]
    fn rejects_truncated_manifest() {
        assert_eq!(parse_manifest_hash("only\nthree\nlines"), None);
    }

    #[test]
    fn hash_is_appended_as_query_parameter() {
        assert_eq!(
            url_with_hash("https://cdn/x.bundle", "ff"),
            "https://cdn/x.bundle?hash=ff"
        );
        assert_eq!(
            url_with_hash("https://cdn/x.bundle?v=1", "ff"),
            "https://cdn/x.bundle?v=1&hash=ff"
        );
    }
}
