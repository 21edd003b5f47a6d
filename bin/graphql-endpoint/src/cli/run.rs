use crate::schema::{
    self,
    DemoSchema,
};
use anyhow::Context;
use axum::{
    Json,
    Router,
    routing::{
        any_service,
        get,
    },
};
use clap::Parser;
use graphql_endpoint::GraphQLEndpoint;
use serde_json::json;
use std::{
    net::{
        SocketAddr,
        TcpListener,
    },
    time::Duration,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use graphql::GraphQLArgs;

mod graphql;

pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, Parser)]
pub struct Command {
    #[clap(flatten)]
    pub graphql: GraphQLArgs,

    /// The path the GraphQL endpoint is mounted on.
    #[clap(long = "path", default_value = "/graphql", env = "GRAPHQL_PATH")]
    pub path: String,

    /// Disables the GraphiQL page served on `GET`.
    #[clap(long = "no-graphiql", env)]
    pub no_graphiql: bool,

    /// The salutation used by the `hello` query.
    #[clap(long = "greeting", default_value = "Hello", env)]
    pub greeting: String,
}

fn validate_path(path: &str) -> anyhow::Result<()> {
    if !path.starts_with('/') {
        anyhow::bail!("The endpoint path must start with `/`, got `{path}`")
    }
    if path == HEALTH_PATH {
        anyhow::bail!("The endpoint path `{path}` is reserved for health checks")
    }
    Ok(())
}

pub fn router(
    endpoint: GraphQLEndpoint<DemoSchema>,
    path: &str,
    concurrency_limit: usize,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .route(
            path,
            any_service(endpoint).layer(ConcurrencyLimitLayer::new(concurrency_limit)),
        )
        .route(HEALTH_PATH, get(health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "up": true }))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(err) => {
            tracing::error!("Unable to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await
        }
    }
}

pub async fn exec(command: Command) -> anyhow::Result<()> {
    let Command {
        graphql,
        path,
        no_graphiql,
        greeting,
    } = command;
    validate_path(&path)?;

    let endpoint = schema::endpoint(
        greeting,
        !no_graphiql,
        graphql.graphql_request_body_bytes_limit,
    )?;
    let router = router(
        endpoint,
        &path,
        graphql.graphql_max_concurrent_queries,
        graphql.api_request_timeout.into(),
    );

    let addr = SocketAddr::new(graphql.ip, graphql.port);
    let listener = TcpListener::bind(addr)
        .with_context(|| format!("Failed to bind the GraphQL service to {addr}"))?;
    let bound_address = listener.local_addr()?;
    tracing::info!("Binding GraphQL endpoint to http://{bound_address}{path}");

    axum::Server::from_tcp(listener)?
        .serve(router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("GraphQL endpoint stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{
            Method,
            Request,
            StatusCode,
            header::CONTENT_TYPE,
        },
    };
    use pretty_assertions::assert_eq;
    use clap::CommandFactory;
    use test_case::test_case;
    use tower::ServiceExt;

    fn test_router(path: &str) -> Router {
        let endpoint = schema::endpoint("Hello".to_string(), true, 64).unwrap();
        router(endpoint, path, 8, Duration::from_secs(5))
    }

    async fn body_json(body: axum::body::BoxBody) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(body).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test_case("/graphql", true ; "default path")]
    #[test_case("/api/v1/graphql", true ; "nested path")]
    #[test_case("graphql", false ; "relative path")]
    #[test_case("/health", false ; "health path")]
    fn endpoint_path_is_validated(path: &str, valid: bool) {
        assert_eq!(validate_path(path).is_ok(), valid);
    }

    fn declared_default(id: &str) -> String {
        let command = Command::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .unwrap();
        arg.get_default_values()
            .iter()
            .map(|value| value.to_string_lossy().into_owned())
            .collect()
    }

    // Declared defaults rather than parsed ones, so exported variables such
    // as `PORT` do not leak in.
    #[test_case("path", "/graphql" ; "path")]
    #[test_case("greeting", "Hello" ; "greeting")]
    #[test_case("port", "4000" ; "port")]
    #[test_case("api_request_timeout", "30s" ; "request timeout")]
    #[test_case("graphql_request_body_bytes_limit", "1048576" ; "body limit")]
    fn defaults_match_the_documented_flags(id: &str, expected: &str) {
        assert_eq!(declared_default(id), expected);
    }

    #[test]
    fn no_graphiql_is_off_unless_passed() {
        let arg_is_flag = Command::command()
            .get_arguments()
            .any(|arg| arg.get_id() == "no_graphiql" && !arg.get_action().takes_values());

        assert!(arg_is_flag);
    }

    #[tokio::test]
    async fn health_reports_up() {
        let request = Request::builder()
            .uri(HEALTH_PATH)
            .body(Body::empty())
            .unwrap();

        let response = test_router("/graphql").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response.into_body()).await, json!({"up": true}));
    }

    #[tokio::test]
    async fn endpoint_is_mounted_on_the_configured_path() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/graphql")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"query": "{ hello }"}"#))
            .unwrap();

        let response = test_router("/api/graphql").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response.into_body()).await,
            json!({"data": {"hello": "Hello, world!"}})
        );
    }

    #[tokio::test]
    async fn endpoint_answers_every_method_itself() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/graphql")
            .body(Body::empty())
            .unwrap();

        let response = test_router("/graphql").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let query = format!(r#"{{"query": "{{ hello }}", "pad": "{}"}}"#, "x".repeat(128));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/graphql")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(query))
            .unwrap();

        let response = test_router("/graphql").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
