//! Demo schema served by the binary.

use async_graphql::{
    Context,
    EmptyMutation,
    EmptySubscription,
    Object,
    Result,
    Schema,
    extensions::Tracing,
};
use graphql_endpoint::{
    ConfigError,
    GraphQLEndpoint,
    RequestContext,
    RootValue,
};

pub type DemoSchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Salutation used by `hello`, configured with `--greeting`.
#[derive(Debug, Clone)]
pub struct Greeting(pub String);

pub struct Query;

#[Object]
impl Query {
    /// Greets `name`, or the world when no name is given.
    async fn hello(&self, ctx: &Context<'_>, name: Option<String>) -> Result<String> {
        let RootValue(Greeting(greeting)) = ctx.data::<RootValue<Greeting>>()?;
        let message = format!("{greeting}, {}!", name.as_deref().unwrap_or("world"));

        if let Ok(request) = ctx.data::<RequestContext>() {
            let logged = message.clone();
            request.background().add(async move {
                tracing::info!("Said `{logged}`");
            });
        }

        Ok(message)
    }

    /// The HTTP path the query was posted to.
    async fn request_path(&self, ctx: &Context<'_>) -> Result<String> {
        Ok(ctx.data::<RequestContext>()?.request().path().to_string())
    }
}

pub fn endpoint(
    greeting: String,
    graphiql: bool,
    body_limit: usize,
) -> Result<GraphQLEndpoint<DemoSchema>, ConfigError> {
    GraphQLEndpoint::builder(Schema::build(Query, EmptyMutation, EmptySubscription))
        .graphiql(graphiql)
        .request_body_limit(body_limit)
        .root_value(Greeting(greeting))
        .middleware(Tracing)
        .build()
}
