// Durable queue snapshot — four per-variant collections in one file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::request::{AudioRequest, BundleRequest, ImageRequest, RequestDescriptor, WebRequest};

/// Fixed file name under the persistence root.
pub const QUEUE_FILE: &str = "queue.data";

/// Serializable queue state. Callbacks do not survive the round-trip;
/// reloaded descriptors carry empty callback slots.
///
/// Reload order is texture, web, bundle, audio — order within each
/// collection is preserved, the interleaving across variants is not.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub texture_requests: Vec<ImageRequest>,
    pub web_requests: Vec<WebRequest>,
    pub bundle_requests: Vec<BundleRequest>,
    pub audio_requests: Vec<AudioRequest>,
}

impl QueueSnapshot {
    /// Bucket live descriptors into their per-variant collections.
    pub fn from_descriptors<'a>(descriptors: impl Iterator<Item = &'a RequestDescriptor>) -> Self {
        let mut snapshot = Self::default();
        for descriptor in descriptors {
            match descriptor {
                RequestDescriptor::Image(r) => snapshot.texture_requests.push(r.clone()),
                RequestDescriptor::Web(r) => snapshot.web_requests.push(r.clone()),
                RequestDescriptor::Bundle(r) => snapshot.bundle_requests.push(r.clone()),
                RequestDescriptor::Audio(r) => snapshot.audio_requests.push(r.clone()),
            }
        }
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.texture_requests.is_empty()
            && self.web_requests.is_empty()
            && self.bundle_requests.is_empty()
            && self.audio_requests.is_empty()
    }

    /// Flatten back into descriptors in the fixed cross-variant order.
    pub fn into_descriptors(self) -> Vec<RequestDescriptor> {
        let mut descriptors = Vec::with_capacity(
            self.texture_requests.len()
                + self.web_requests.len()
                + self.bundle_requests.len()
                + self.audio_requests.len(),
        );
        descriptors.extend(self.texture_requests.into_iter().map(RequestDescriptor::Image));
        descriptors.extend(self.web_requests.into_iter().map(RequestDescriptor::Web));
        descriptors.extend(self.bundle_requests.into_iter().map(RequestDescriptor::Bundle));
        descriptors.extend(self.audio_requests.into_iter().map(RequestDescriptor::Audio));
        descriptors
    }
}

/// Reader/writer for the queue file. Writes are serialized through a mutex
/// because concurrently-completing dispatches can race to persist.
pub struct QueuePersistence {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl QueuePersistence {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(QUEUE_FILE),
            io_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        let _guard = self.io_lock.lock();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_vec(snapshot)?;
        fs::write(&self.path, blob)?;
        debug!(path = %self.path.display(), "queue persisted");
        Ok(())
    }

    /// Delete the queue file, so a drained queue leaves no stale snapshot.
    pub fn clear(&self) {
        let _guard = self.io_lock.lock();
        let _ = fs::remove_file(&self.path);
    }

    /// Read the snapshot back. `None` when no file exists (the expected
    /// empty state on first run) or when the blob cannot be decoded.
    pub fn load(&self) -> Option<QueueSnapshot> {
        let _guard = self.io_lock.lock();
        let blob = fs::read(&self.path).ok()?;
        match serde_json::from_slice(&blob) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "failed to decode queue file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AudioFormat;

    #[test]
    fn snapshot_buckets_by_variant_and_flattens_in_fixed_order() {
        let descriptors = vec![
            RequestDescriptor::Web(WebRequest::get("https://w1")),
            RequestDescriptor::Image(ImageRequest::new("https://i1")),
            RequestDescriptor::Audio(AudioRequest::new("https://a1", AudioFormat::Ogg)),
            RequestDescriptor::Web(WebRequest::get("https://w2")),
            RequestDescriptor::Bundle(BundleRequest::new("https://b1", "https://b1.manifest")),
        ];
        let snapshot = QueueSnapshot::from_descriptors(descriptors.iter());
        assert_eq!(snapshot.web_requests.len(), 2);
        assert_eq!(snapshot.texture_requests.len(), 1);

        let urls: Vec<String> = snapshot
            .into_descriptors()
            .iter()
            .map(|d| d.url().to_string())
            .collect();
        // Textures, web, bundles, audio.
        assert_eq!(
            urls,
            vec!["https://i1", "https://w1", "https://w2", "https://b1", "https://a1"]
        );
    }

    #[test]
    fn empty_snapshot_reports_empty() {
        assert!(QueueSnapshot::default().is_empty());
    }
}
