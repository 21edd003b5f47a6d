use hyper::StatusCode;

/// Reasons a request is answered without running the GraphQL engine.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Not Found")]
    NotFound,
    #[error("Unsupported Media Type")]
    UnsupportedMediaType,
    #[error("No GraphQL query found in the request")]
    MissingQuery,
    #[error("Payload Too Large")]
    PayloadTooLarge,
    #[error("Invalid JSON in request body: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Request body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("Invalid GraphQL variables: {0}")]
    InvalidVariables(String),
    #[error("Failed to read request body: {0}")]
    ReadBody(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::NotFound => StatusCode::NOT_FOUND,
            RequestError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RequestError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RequestError::MissingQuery
            | RequestError::InvalidJson(_)
            | RequestError::InvalidUtf8(_)
            | RequestError::InvalidVariables(_) => StatusCode::BAD_REQUEST,
            RequestError::ReadBody(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Faults in the request itself rather than plain routing rejections.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            RequestError::InvalidJson(_)
                | RequestError::PayloadTooLarge
                | RequestError::InvalidUtf8(_)
                | RequestError::InvalidVariables(_)
                | RequestError::ReadBody(_)
        )
    }
}

/// Errors raised while building a [`GraphQLEndpoint`](crate::GraphQLEndpoint).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "{0} middleware cannot be attached to a finished schema, pass the `SchemaBuilder` instead"
    )]
    SchemaFinished(usize),
}
