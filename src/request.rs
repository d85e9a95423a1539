// Request descriptors — one pending network operation plus its callbacks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Opaque handle assigned when a descriptor enters a queue.
///
/// Removal is by handle, so two descriptors with identical fields stay
/// distinguishable while queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Terminal payload delivered to `on_complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Text body of a plain web request.
    Text(String),
    /// Raw bytes of an image, audio clip, or bundle.
    Bytes(Bytes),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Bytes(bytes) => bytes,
        }
    }
}

pub type OnComplete = Arc<dyn Fn(Payload) + Send + Sync>;
pub type OnError = Arc<dyn Fn(String) + Send + Sync>;
pub type OnProgress = Arc<dyn Fn(f32, u64) + Send + Sync>;

/// Callback slots for one descriptor.
///
/// A dispatch attempt fires `on_complete` or `on_error` at most once each;
/// `on_progress` may fire any number of times before the terminal callback.
/// Callbacks are not serialized — descriptors reloaded from a persisted
/// queue carry empty slots.
#[derive(Default, Clone)]
pub struct Callbacks {
    pub on_complete: Option<OnComplete>,
    pub on_error: Option<OnError>,
    pub on_progress: Option<OnProgress>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(mut self, f: impl Fn(Payload) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }

    pub fn failed(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn progressed(mut self, f: impl Fn(f32, u64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    pub(crate) fn complete(&self, payload: Payload) {
        if let Some(cb) = &self.on_complete {
            cb(payload);
        }
    }

    pub(crate) fn error(&self, message: String) {
        if let Some(cb) = &self.on_error {
            cb(message);
        }
    }

    pub(crate) fn progress(&self, fraction: f32, bytes_so_far: u64) {
        if let Some(cb) = &self.on_progress {
            cb(fraction, bytes_so_far);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AudioFormat {
    #[default]
    Ogg,
    Mpeg,
    Wav,
    Aiff,
}

/// Plain HTTP request with header and form passthrough.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebRequest {
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub form_data: HashMap<String, String>,
    pub cacheable: bool,
    #[serde(skip)]
    pub callbacks: Callbacks,
}

impl WebRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            ..Self::default()
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data.insert(key.into(), value.into());
        self
    }

    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }
}

/// Image download keyed by URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRequest {
    pub url: String,
    pub cacheable: bool,
    #[serde(skip)]
    pub callbacks: Callbacks,
}

impl ImageRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cacheable: true,
            callbacks: Callbacks::default(),
        }
    }

    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }
}

/// Audio clip download keyed by URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioRequest {
    pub url: String,
    pub format: AudioFormat,
    pub cacheable: bool,
    #[serde(skip)]
    pub callbacks: Callbacks,
}

impl AudioRequest {
    pub fn new(url: impl Into<String>, format: AudioFormat) -> Self {
        Self {
            url: url.into(),
            format,
            cacheable: true,
            callbacks: Callbacks::default(),
        }
    }

    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }
}

/// Versioned bundle download: manifest first, then the bundle itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleRequest {
    pub bundle_url: String,
    pub manifest_url: String,
    pub cacheable: bool,
    #[serde(skip)]
    pub callbacks: Callbacks,
}

impl BundleRequest {
    pub fn new(bundle_url: impl Into<String>, manifest_url: impl Into<String>) -> Self {
        Self {
            bundle_url: bundle_url.into(),
            manifest_url: manifest_url.into(),
            cacheable: true,
            callbacks: Callbacks::default(),
        }
    }

    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }
}

/// One pending network operation of any variant.
#[derive(Debug, Clone)]
pub enum RequestDescriptor {
    Web(WebRequest),
    Image(ImageRequest),
    Audio(AudioRequest),
    Bundle(BundleRequest),
}

impl RequestDescriptor {
    /// URL the descriptor is identified by in logs and error messages.
    /// Bundle descriptors report their bundle URL.
    pub fn url(&self) -> &str {
        match self {
            RequestDescriptor::Web(r) => &r.url,
            RequestDescriptor::Image(r) => &r.url,
            RequestDescriptor::Audio(r) => &r.url,
            RequestDescriptor::Bundle(r) => &r.bundle_url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RequestDescriptor::Web(_) => "web",
            RequestDescriptor::Image(_) => "image",
            RequestDescriptor::Audio(_) => "audio",
            RequestDescriptor::Bundle(_) => "bundle",
        }
    }

    pub fn callbacks(&self) -> &Callbacks {
        match self {
            RequestDescriptor::Web(r) => &r.callbacks,
            RequestDescriptor::Image(r) => &r.callbacks,
            RequestDescriptor::Audio(r) => &r.callbacks,
            RequestDescriptor::Bundle(r) => &r.callbacks,
        }
    }
}

impl From<WebRequest> for RequestDescriptor {
    fn from(r: WebRequest) -> Self {
        RequestDescriptor::Web(r)
    }
}

impl From<ImageRequest> for RequestDescriptor {
    fn from(r: ImageRequest) -> Self {
        RequestDescriptor::Image(r)
    }
}

impl From<AudioRequest> for RequestDescriptor {
    fn from(r: AudioRequest) -> Self {
        RequestDescriptor::Audio(r)
    }
}

impl From<BundleRequest> for RequestDescriptor {
    fn from(r: BundleRequest) -> Self {
        RequestDescriptor::Bundle(r)
    }
}
