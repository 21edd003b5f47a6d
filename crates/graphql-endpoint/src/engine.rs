//! The seam between the endpoint and the GraphQL engine.

use crate::ConfigError;
use async_graphql::{
    Executor,
    ObjectType,
    Request,
    Response,
    Schema,
    SchemaBuilder,
    SubscriptionType,
    extensions::{
        Extension,
        ExtensionFactory,
    },
};
use std::sync::Arc;

/// Runs one GraphQL request against a schema.
///
/// The default strategy simply executes the request. Alternate strategies can
/// wrap execution, e.g. to time it or to post-process errors.
#[async_trait::async_trait]
pub trait ExecutionStrategy<E>: Send + Sync + 'static {
    async fn execute(&self, schema: &E, request: Request) -> Response;
}

/// Executes the request with the schema as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExecution;

#[async_trait::async_trait]
impl<E> ExecutionStrategy<E> for DefaultExecution
where
    E: Executor,
{
    async fn execute(&self, schema: &E, request: Request) -> Response {
        schema.execute(request).await
    }
}

/// A resolver-wrapping hook, attached to the schema as an async-graphql
/// extension.
#[derive(Clone)]
pub struct Middleware(Arc<dyn ExtensionFactory>);

impl Middleware {
    pub fn new(factory: impl ExtensionFactory) -> Self {
        Self(Arc::new(factory))
    }
}

impl ExtensionFactory for Middleware {
    fn create(&self) -> Arc<dyn Extension> {
        self.0.create()
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Middleware")
    }
}

/// Something that can be turned into an executable schema.
pub trait Engine {
    type Executor: Executor;

    /// Finishes the schema with `middleware` attached in order, the first one
    /// being the outermost.
    fn finish(self, middleware: Vec<Middleware>) -> Result<Self::Executor, ConfigError>;
}

impl<Query, Mutation, Subscription> Engine for SchemaBuilder<Query, Mutation, Subscription>
where
    Query: ObjectType + 'static,
    Mutation: ObjectType + 'static,
    Subscription: SubscriptionType + 'static,
{
    type Executor = Schema<Query, Mutation, Subscription>;

    fn finish(self, middleware: Vec<Middleware>) -> Result<Self::Executor, ConfigError> {
        let builder = middleware
            .into_iter()
            .fold(self, |builder, middleware| builder.extension(middleware));
        Ok(builder.finish())
    }
}

impl<Query, Mutation, Subscription> Engine for Schema<Query, Mutation, Subscription>
where
    Query: ObjectType + 'static,
    Mutation: ObjectType + 'static,
    Subscription: SubscriptionType + 'static,
{
    type Executor = Self;

    fn finish(self, middleware: Vec<Middleware>) -> Result<Self::Executor, ConfigError> {
        if !middleware.is_empty() {
            return Err(ConfigError::SchemaFinished(middleware.len()))
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::{
        EmptyMutation,
        EmptySubscription,
        Object,
        ServerResult,
        Value,
        extensions::{
            ExtensionContext,
            NextResolve,
            ResolveInfo,
        },
    };
    use parking_lot::Mutex;

    struct Query;

    #[Object]
    impl Query {
        async fn value(&self) -> i32 {
            1
        }
    }

    struct Recorder {
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ExtensionFactory for Recorder {
        fn create(&self) -> Arc<dyn Extension> {
            Arc::new(RecorderExtension {
                name: self.name,
                calls: self.calls.clone(),
            })
        }
    }

    struct RecorderExtension {
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait::async_trait]
    impl Extension for RecorderExtension {
        async fn resolve(
            &self,
            ctx: &ExtensionContext<'_>,
            info: ResolveInfo<'_>,
            next: NextResolve<'_>,
        ) -> ServerResult<Option<Value>> {
            self.calls.lock().push(self.name);
            next.run(ctx, info).await
        }
    }

    #[tokio::test]
    async fn middleware_wraps_resolvers_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let middleware = vec![
            Middleware::new(Recorder {
                name: "outer",
                calls: calls.clone(),
            }),
            Middleware::new(Recorder {
                name: "inner",
                calls: calls.clone(),
            }),
        ];

        let builder = Schema::build(Query, EmptyMutation, EmptySubscription);
        let schema = Engine::finish(builder, middleware).unwrap();
        let response = DefaultExecution
            .execute(&schema, Request::new("{ value }"))
            .await;

        assert!(response.errors.is_empty());
        assert_eq!(*calls.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn finished_schema_rejects_middleware() {
        let schema = Schema::new(Query, EmptyMutation, EmptySubscription);
        let middleware = vec![Middleware::new(Recorder {
            name: "late",
            calls: Default::default(),
        })];

        let Err(err) = Engine::finish(schema, middleware) else {
            panic!("a finished schema must not accept middleware")
        };

        assert!(matches!(err, ConfigError::SchemaFinished(1)));
    }

    #[test]
    fn finished_schema_without_middleware_is_accepted() {
        let schema = Schema::new(Query, EmptyMutation, EmptySubscription);

        assert!(Engine::finish(schema, Vec::new()).is_ok());
    }
}
