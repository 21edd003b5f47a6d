use crate::{
    ConfigError,
    DefaultExecution,
    Engine,
    ExecutionStrategy,
    GraphQLEndpoint,
    Middleware,
    context::{
        DataInjector,
        injector,
    },
};
use async_graphql::{
    ServerError,
    extensions::ExtensionFactory,
};
use std::sync::Arc;

/// Turns an engine error into the JSON record sent to the client.
pub type ErrorFormatter = Arc<dyn Fn(&ServerError) -> serde_json::Value + Send + Sync>;

/// The default error formatter: `message`, then `locations`, `path` and
/// `extensions` when the engine reported them.
pub fn format_error(error: &ServerError) -> serde_json::Value {
    serde_json::to_value(error)
        .unwrap_or_else(|_| serde_json::json!({ "message": error.message }))
}

/// The root value handed to resolvers, read with `ctx.data::<RootValue<T>>()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootValue<T>(pub T);

/// Immutable configuration shared by every request of one endpoint.
pub(crate) struct Config<E> {
    pub schema: E,
    pub graphiql: bool,
    pub body_limit: Option<usize>,
    pub context_value: Option<DataInjector>,
    pub root_value: Option<DataInjector>,
    pub error_formatter: ErrorFormatter,
    pub execution: Arc<dyn ExecutionStrategy<E>>,
}

/// Builds a [`GraphQLEndpoint`].
pub struct EndpointBuilder<B: Engine> {
    schema: B,
    graphiql: bool,
    body_limit: Option<usize>,
    context_value: Option<DataInjector>,
    root_value: Option<DataInjector>,
    middleware: Vec<Middleware>,
    error_formatter: ErrorFormatter,
    execution: Option<Arc<dyn ExecutionStrategy<B::Executor>>>,
}

impl<B: Engine> EndpointBuilder<B> {
    pub(crate) fn new(schema: B) -> Self {
        Self {
            schema,
            graphiql: true,
            body_limit: None,
            context_value: None,
            root_value: None,
            middleware: Vec::new(),
            error_formatter: Arc::new(format_error),
            execution: None,
        }
    }

    /// Serve GraphiQL on `GET` and `HEAD`. Enabled by default.
    pub fn graphiql(mut self, enabled: bool) -> Self {
        self.graphiql = enabled;
        self
    }

    /// Rejects request bodies longer than `bytes` with `413`. Unlimited by
    /// default.
    pub fn request_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = Some(bytes);
        self
    }

    /// Use `value` as the context of every request instead of a synthesized
    /// [`RequestContext`](crate::RequestContext).
    pub fn context_value<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.context_value = Some(injector(value));
        self
    }

    pub fn root_value<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.root_value = Some(injector(RootValue(value)));
        self
    }

    /// Appends a resolver-wrapping extension. The first one added is the
    /// outermost.
    pub fn middleware(mut self, middleware: impl ExtensionFactory) -> Self {
        self.middleware.push(Middleware::new(middleware));
        self
    }

    pub fn error_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&ServerError) -> serde_json::Value + Send + Sync + 'static,
    {
        self.error_formatter = Arc::new(formatter);
        self
    }

    /// Replaces the default execution with `strategy`.
    pub fn execution(
        mut self,
        strategy: impl ExecutionStrategy<B::Executor>,
    ) -> Self {
        self.execution = Some(Arc::new(strategy));
        self
    }

    pub fn build(self) -> Result<GraphQLEndpoint<B::Executor>, ConfigError> {
        let Self {
            schema,
            graphiql,
            body_limit,
            context_value,
            root_value,
            middleware,
            error_formatter,
            execution,
        } = self;

        let schema = schema.finish(middleware)?;
        let execution = execution.unwrap_or_else(|| Arc::new(DefaultExecution));

        Ok(GraphQLEndpoint::from_config(Config {
            schema,
            graphiql,
            body_limit,
            context_value,
            root_value,
            error_formatter,
            execution,
        }))
    }
}
