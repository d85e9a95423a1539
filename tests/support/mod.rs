// Shared test doubles: a scripted transport and a callback recorder.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use netqueue::{
    Callbacks, FetchError, HttpTransport, NetworkType, Payload, Reachability, TransportRequest,
    TransportResponse,
};

/// In-memory `HttpTransport` scripted per URL.
///
/// Each URL holds an ordered list of results; successive calls walk the
/// list and repeat the final entry once exhausted. Unscripted URLs fail
/// with a transport error. Every request URL is recorded in call order.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, ScriptState>>,
    calls: Mutex<Vec<String>>,
}

struct ScriptState {
    results: Vec<Result<TransportResponse, FetchError>>,
    next: usize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, url: &str, result: Result<TransportResponse, FetchError>) {
        let mut scripts = self.scripts.lock();
        scripts
            .entry(url.to_string())
            .or_insert_with(|| ScriptState {
                results: Vec::new(),
                next: 0,
            })
            .results
            .push(result);
    }

    pub fn ok(&self, url: &str, body: &str) {
        self.script(
            url,
            Ok(TransportResponse {
                status: 200,
                body: Bytes::copy_from_slice(body.as_bytes()),
            }),
        );
    }

    pub fn fail(&self, url: &str, err: FetchError) {
        self.script(url, Err(err));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|u| *u == url).count()
    }

    fn respond(&self, url: &str) -> Result<TransportResponse, FetchError> {
        self.calls.lock().push(url.to_string());
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(url) {
            Some(state) if !state.results.is_empty() => {
                let index = state.next.min(state.results.len() - 1);
                state.next += 1;
                state.results[index].clone()
            }
            _ => Err(FetchError::Transport(format!("unscripted url: {url}"))),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, FetchError> {
        self.respond(&request.url)
    }

    async fn execute_streaming(
        &self,
        request: TransportRequest,
        progress: &(dyn Fn(f32, u64) + Send + Sync),
    ) -> Result<TransportResponse, FetchError> {
        let response = self.respond(&request.url)?;
        let total = response.body.len() as u64;
        if total > 0 {
            progress(0.5, total / 2);
        }
        progress(1.0, total);
        Ok(response)
    }

    async fn head_content_length(&self, url: &str) -> Result<u64, FetchError> {
        self.respond(url).map(|response| response.body.len() as u64)
    }
}

/// Fixed-answer reachability probe.
pub struct FixedReachability(pub NetworkType);

impl Reachability for FixedReachability {
    fn current(&self) -> NetworkType {
        self.0
    }
}

/// What a descriptor's callbacks observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackEvent {
    Completed(Payload),
    Errored(String),
    Progressed(f32, u64),
}

/// Builds a `Callbacks` bundle that records every invocation.
#[derive(Default, Clone)]
pub struct Recorder {
    events: Arc<Mutex<Vec<CallbackEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callbacks(&self) -> Callbacks {
        let completed = Arc::clone(&self.events);
        let errored = Arc::clone(&self.events);
        let progressed = Arc::clone(&self.events);
        Callbacks::new()
            .completed(move |payload| completed.lock().push(CallbackEvent::Completed(payload)))
            .failed(move |message| errored.lock().push(CallbackEvent::Errored(message)))
            .progressed(move |fraction, bytes| {
                progressed.lock().push(CallbackEvent::Progressed(fraction, bytes))
            })
    }

    pub fn events(&self) -> Vec<CallbackEvent> {
        self.events.lock().clone()
    }

    pub fn completions(&self) -> Vec<Payload> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                CallbackEvent::Completed(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                CallbackEvent::Errored(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}
