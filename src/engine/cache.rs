// On-disk response cache — TTL-stamped text entries plus unstamped content blobs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock;

/// File extension of a cached text response body.
const TEXT_EXT: &str = "cache";
/// File extension of the unix-second creation stamp next to a text entry.
const STAMP_EXT: &str = "cachestamp";
/// File extension of a cached binary payload (image, audio, bundle).
const CONTENT_EXT: &str = "contentcache";

/// Cache keyed by a reversible encoding of the request URL.
///
/// Text entries carry a sibling stamp file and expire `ttl` seconds after
/// creation; expired entries are purged on lookup, never served. Content
/// entries have no stamp and no expiry. All I/O is synchronous local-disk
/// access serialized through one mutex, so concurrent dispatch completions
/// cannot interleave partial writes.
pub struct CacheStore {
    root: PathBuf,
    ttl: u64,
    io_lock: Mutex<()>,
}

impl CacheStore {
    /// Open (creating if needed) a cache rooted at `root` with the given
    /// text-entry lifetime in seconds.
    pub fn new(root: &Path, ttl: u64) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            ttl,
            io_lock: Mutex::new(()),
        })
    }

    /// Filename-safe key for a URL. Injective by construction, so distinct
    /// URLs can never collide; long URLs produce long keys.
    pub fn key_for(url: &str) -> String {
        URL_SAFE_NO_PAD.encode(url.as_bytes())
    }

    fn path_for(&self, url: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{}.{}", Self::key_for(url), ext))
    }

    /// Look up a cached text response. Expired entries (and entries with an
    /// unreadable stamp) are deleted and reported as absent.
    pub fn get_text(&self, url: &str) -> Option<String> {
        let _guard = self.io_lock.lock();
        let body_path = self.path_for(url, TEXT_EXT);
        let stamp_path = self.path_for(url, STAMP_EXT);

        if !body_path.exists() || !stamp_path.exists() {
            return None;
        }

        let created_at = fs::read_to_string(&stamp_path)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok());

        let expired = match created_at {
            Some(created_at) => clock::seconds_elapsed(created_at) > self.ttl,
            None => {
                warn!(url, "unreadable cache stamp, dropping entry");
                true
            }
        };

        if expired {
            let _ = fs::remove_file(&body_path);
            let _ = fs::remove_file(&stamp_path);
            debug!(url, "cache entry expired");
            return None;
        }

        match fs::read_to_string(&body_path) {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(url, %err, "failed to read cache body");
                None
            }
        }
    }

    /// Store a text response and its creation stamp. No TTL check on write.
    pub fn put_text(&self, url: &str, body: &str) -> Result<()> {
        let _guard = self.io_lock.lock();
        fs::write(self.path_for(url, TEXT_EXT), body)?;
        fs::write(
            self.path_for(url, STAMP_EXT),
            clock::unix_now().to_string(),
        )?;
        Ok(())
    }

    /// Look up a cached binary payload. Content entries never expire.
    pub fn get_content(&self, url: &str) -> Option<Bytes> {
        let _guard = self.io_lock.lock();
        match fs::read(self.path_for(url, CONTENT_EXT)) {
            Ok(data) => Some(Bytes::from(data)),
            Err(_) => None,
        }
    }

    /// Store a binary payload. No stamp file is written.
    pub fn put_content(&self, url: &str, data: &[u8]) -> Result<()> {
        let _guard = self.io_lock.lock();
        fs::write(self.path_for(url, CONTENT_EXT), data)?;
        Ok(())
    }
}
