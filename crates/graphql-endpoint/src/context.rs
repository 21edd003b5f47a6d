//! Request-scoped values handed to resolvers.

use bytes::Bytes;
use futures::future::BoxFuture;
use hyper::{
    HeaderMap,
    Method,
    Uri,
    header::CONTENT_TYPE,
};
use parking_lot::Mutex;
use std::{
    borrow::Cow,
    fmt,
    future::Future,
    sync::Arc,
};

/// Read-only view of the inbound HTTP request.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestEnvelope {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The `Content-Type` header, or an empty string when it is missing or not
    /// visible ASCII.
    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    /// Decoded query-string pairs in the order they appear.
    pub fn query_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
        match self.uri.query() {
            Some(query) => url::form_urlencoded::parse(query.as_bytes()).collect(),
            None => Vec::new(),
        }
    }

    /// The value of a query-string parameter. When a key is repeated the last
    /// occurrence wins.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }
}

/// Collects work to run once the response has been sent to the client.
///
/// Tasks run one after another in the order they were added.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tasks: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.lock().push(Box::pin(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Runs every collected task, draining the collector.
    pub async fn run(self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.await;
        }
    }

    /// Hands the tasks to the current tokio runtime.
    pub(crate) fn spawn(self) {
        if self.is_empty() {
            return
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("Spawning {} background task(s)", self.len());
                handle.spawn(self.run());
            }
            Err(_) => {
                tracing::warn!(
                    "Dropping {} background task(s): no tokio runtime is running",
                    self.len()
                );
            }
        }
    }
}

impl fmt::Debug for BackgroundTasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundTasks")
            .field("len", &self.len())
            .finish()
    }
}

/// Context synthesized for a request when no static context value is
/// configured. Resolvers read it with `ctx.data::<RequestContext>()`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request: Arc<RequestEnvelope>,
    background: BackgroundTasks,
}

impl RequestContext {
    pub fn new(request: Arc<RequestEnvelope>) -> Self {
        Self {
            request,
            background: BackgroundTasks::new(),
        }
    }

    pub fn request(&self) -> &RequestEnvelope {
        &self.request
    }

    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }
}

/// Attaches a caller-supplied value to a GraphQL request as typed data.
pub(crate) type DataInjector =
    Arc<dyn Fn(async_graphql::Request) -> async_graphql::Request + Send + Sync>;

pub(crate) fn injector<T>(value: T) -> DataInjector
where
    T: Clone + Send + Sync + 'static,
{
    Arc::new(move |request| request.data(value.clone()))
}

/// The context value of one execution.
pub(crate) enum ExecutionContext {
    Static(DataInjector),
    Request(RequestContext),
}

impl ExecutionContext {
    pub fn new(configured: Option<&DataInjector>, request: Arc<RequestEnvelope>) -> Self {
        match configured {
            Some(inject) => ExecutionContext::Static(inject.clone()),
            None => ExecutionContext::Request(RequestContext::new(request)),
        }
    }

    pub fn attach(&self, request: async_graphql::Request) -> async_graphql::Request {
        match self {
            ExecutionContext::Static(inject) => inject(request),
            ExecutionContext::Request(context) => request.data(context.clone()),
        }
    }

    pub fn background(&self) -> Option<BackgroundTasks> {
        match self {
            ExecutionContext::Static(_) => None,
            ExecutionContext::Request(context) => Some(context.background().clone()),
        }
    }
}
