//! Scripted host pieces shared by the updater unit tests.

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use crate::host::http::{HttpResponse, HttpTransport};
use crate::host::store::{MemoryTransientStore, TransientStore};
use crate::host::themes::StaticThemeDirectory;
use crate::host::{Host, RequestArgs};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Canned reply for a route.
#[derive(Clone)]
pub(crate) enum Reply {
    Respond(HttpResponse),
    Fail,
}

pub(crate) fn body(text: &str) -> Reply {
    Reply::Respond(HttpResponse::ok(text))
}

pub(crate) fn failure() -> Reply {
    Reply::Fail
}

/// Transport answering by URL path suffix and recording every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<Vec<(String, Reply)>>,
    requests: Mutex<Vec<(Url, RequestArgs)>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, path_suffix: &str, reply: Reply) -> Self {
        self.set_route(path_suffix, reply);
        self
    }

    pub(crate) fn set_route(&self, path_suffix: &str, reply: Reply) {
        let mut routes = self.routes.lock();
        routes.retain(|(suffix, _)| suffix != path_suffix);
        routes.push((path_suffix.to_string(), reply));
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub(crate) fn requests_to(&self, path_suffix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|(url, _)| url.path().ends_with(path_suffix))
            .count()
    }

    pub(crate) fn requested_urls(&self) -> Vec<Url> {
        self.requests.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    pub(crate) fn requested_args(&self) -> Vec<RequestArgs> {
        self.requests.lock().iter().map(|(_, args)| *args).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &Url, args: &RequestArgs) -> Result<HttpResponse> {
        self.requests.lock().push((url.clone(), *args));

        let reply = self
            .routes
            .lock()
            .iter()
            .find(|(suffix, _)| url.path().ends_with(suffix.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail) => Err(Error::Http(format!("connection refused: {url}"))),
            None => Ok(HttpResponse {
                status: 404,
                ..HttpResponse::default()
            }),
        }
    }
}

/// Host over `transport`, a fresh memory store and `themes`.
pub(crate) fn host_with(
    transport: Arc<ScriptedTransport>,
    themes: StaticThemeDirectory,
) -> (Host, Arc<MemoryTransientStore>) {
    let store = Arc::new(MemoryTransientStore::new());
    let host = Host::new(
        transport,
        Arc::clone(&store) as Arc<dyn TransientStore>,
        Arc::new(themes),
    );
    (host, store)
}

/// Memory store that also records the key and TTL of every write.
#[derive(Default)]
pub(crate) struct RecordingStore {
    inner: MemoryTransientStore,
    writes: Mutex<Vec<(String, Duration)>>,
}

impl RecordingStore {
    pub(crate) fn writes(&self) -> Vec<(String, Duration)> {
        self.writes.lock().clone()
    }
}

impl TransientStore for RecordingStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.writes.lock().push((key.to_string(), ttl));
        self.inner.set(key, value, ttl)
    }
}

/// Host over `transport` and a [`RecordingStore`], with no installed themes.
pub(crate) fn host_recording(transport: Arc<ScriptedTransport>) -> (Host, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::default());
    let host = Host::new(
        transport,
        Arc::clone(&store) as Arc<dyn TransientStore>,
        Arc::new(StaticThemeDirectory::new()),
    );
    (host, store)
}

/// Complete configuration for the `soli` theme.
pub(crate) fn sample_config() -> UpdaterConfig {
    UpdaterConfig {
        slug: "soli".to_string(),
        api_url: "https://api.github.com/repos/soli/theme".to_string(),
        raw_url: "https://raw.github.com/soli/theme/main".to_string(),
        repo_url: "https://github.com/soli/theme".to_string(),
        package_url: "https://github.com/soli/theme/releases/latest/download/theme.zip"
            .to_string(),
        min_host_version: "6.0.0".to_string(),
        tested_host_version: "6.7.0".to_string(),
        readme_filename: "README.md".to_string(),
        ..UpdaterConfig::default()
    }
}
