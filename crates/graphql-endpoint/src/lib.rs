#![deny(unused_crate_dependencies)]

//! Exposes an async-graphql schema over HTTP.
//!
//! [`GraphQLEndpoint`] is a `tower::Service` over hyper requests. It answers
//! `POST` requests by executing the GraphQL query found in the body or the
//! query string, and `GET`/`HEAD` requests by serving GraphiQL.

mod config;
mod context;
mod endpoint;
mod engine;
mod error;
pub mod graphiql;
mod payload;
mod response;

pub use config::{
    EndpointBuilder,
    ErrorFormatter,
    RootValue,
    format_error,
};
pub use context::{
    BackgroundTasks,
    RequestContext,
    RequestEnvelope,
};
pub use endpoint::GraphQLEndpoint;
pub use engine::{
    DefaultExecution,
    Engine,
    ExecutionStrategy,
    Middleware,
};
pub use error::{
    ConfigError,
    RequestError,
};
pub use payload::{
    PayloadSource,
    QueryPayload,
};
pub use response::{
    GraphQLResponseBody,
    ResponseBody,
};
