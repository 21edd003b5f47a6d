use crate::{
    EndpointBuilder,
    Engine,
    RequestEnvelope,
    RequestError,
    config::Config,
    context::ExecutionContext,
    graphiql,
    payload::PayloadSource,
    response::{
        self,
        GraphQLResponseBody,
        ResponseBody,
    },
};
use async_graphql::Executor;
use bytes::Bytes;
use futures::future::BoxFuture;
use hyper::{
    Body,
    Method,
    Request,
    Response,
};
use std::{
    convert::Infallible,
    fmt,
    sync::Arc,
    task::{
        Context,
        Poll,
    },
};

/// Serves one GraphQL schema over HTTP.
///
/// `GET` and `HEAD` render GraphiQL, `POST` executes a query. The endpoint is
/// cheap to clone and can be mounted on any tower-compatible server.
pub struct GraphQLEndpoint<E> {
    config: Arc<Config<E>>,
}

impl<E> Clone for GraphQLEndpoint<E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl<E> fmt::Debug for GraphQLEndpoint<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLEndpoint")
            .field("graphiql", &self.config.graphiql)
            .field("static_context", &self.config.context_value.is_some())
            .field("root_value", &self.config.root_value.is_some())
            .finish()
    }
}

impl<E> GraphQLEndpoint<E>
where
    E: Executor,
{
    pub fn builder<B>(schema: B) -> EndpointBuilder<B>
    where
        B: Engine<Executor = E>,
    {
        EndpointBuilder::new(schema)
    }

    pub(crate) fn from_config(config: Config<E>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn schema(&self) -> &E {
        &self.config.schema
    }

    /// Answers one HTTP request. Every outcome is turned into a response.
    pub async fn handle(&self, request: Request<Body>) -> Response<ResponseBody> {
        match self.try_handle(request).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_fault() {
                    tracing::warn!("Rejecting GraphQL request: {err}");
                } else {
                    tracing::debug!("Rejecting GraphQL request: {err}");
                }
                response::rejection(&err)
            }
        }
    }

    async fn try_handle(
        &self,
        request: Request<Body>,
    ) -> Result<Response<ResponseBody>, RequestError> {
        match *request.method() {
            Method::GET | Method::HEAD => self.handle_graphiql(&request),
            Method::POST => self.handle_graphql(request).await,
            _ => Err(RequestError::MethodNotAllowed),
        }
    }

    fn handle_graphiql(
        &self,
        request: &Request<Body>,
    ) -> Result<Response<ResponseBody>, RequestError> {
        if !self.config.graphiql {
            return Err(RequestError::NotFound)
        }
        Ok(response::html(graphiql::render(request.uri().path())))
    }

    async fn handle_graphql(
        &self,
        request: Request<Body>,
    ) -> Result<Response<ResponseBody>, RequestError> {
        let (parts, body) = request.into_parts();
        let body = read_body(body, self.config.body_limit).await?;
        let envelope = Arc::new(RequestEnvelope::new(
            parts.method,
            parts.uri,
            parts.headers,
            body,
        ));

        let payload = PayloadSource::from_request(&envelope)?
            .ok_or(RequestError::UnsupportedMediaType)?
            .into_payload()?;
        tracing::debug!(
            operation_name = payload.operation_name.as_deref(),
            "Executing GraphQL query at {}",
            envelope.path()
        );

        let context = ExecutionContext::new(self.config.context_value.as_ref(), envelope);
        let mut graphql_request = context.attach(payload.into_request());
        if let Some(inject) = &self.config.root_value {
            graphql_request = inject(graphql_request);
        }

        let result = self
            .config
            .execution
            .execute(&self.config.schema, graphql_request)
            .await;

        let body = GraphQLResponseBody::new(result, &self.config.error_formatter);
        Ok(response::graphql(body, context.background()))
    }
}

async fn read_body(body: Body, limit: Option<usize>) -> Result<Bytes, RequestError> {
    let Some(limit) = limit else {
        return hyper::body::to_bytes(body)
            .await
            .map_err(|err| RequestError::ReadBody(err.into()))
    };

    hyper::body::to_bytes(http_body::Limited::new(body, limit))
        .await
        .map_err(|err| {
            if err.is::<http_body::LengthLimitError>() {
                RequestError::PayloadTooLarge
            } else {
                RequestError::ReadBody(err)
            }
        })
}

impl<E> tower::Service<Request<Body>> for GraphQLEndpoint<E>
where
    E: Executor,
{
    type Response = Response<ResponseBody>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let endpoint = self.clone();
        Box::pin(async move { Ok(endpoint.handle(request).await) })
    }
}
