//! HTTP responses produced by the endpoint.

use crate::{
    BackgroundTasks,
    RequestError,
    config::ErrorFormatter,
};
use bytes::Bytes;
use hyper::{
    Body,
    HeaderMap,
    Response,
    StatusCode,
    body::{
        HttpBody,
        SizeHint,
    },
    header::{
        CONTENT_TYPE,
        HeaderValue,
    },
};
use serde::Serialize;
use std::{
    pin::Pin,
    task::{
        Context,
        Poll,
    },
};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Response body that spawns the request's background tasks once the host
/// has written all of it.
///
/// A body dropped before its end was reached, e.g. because the client went
/// away, drops its tasks instead.
#[derive(Debug, Default)]
pub struct ResponseBody {
    inner: Body,
    background: Option<BackgroundTasks>,
    sent: bool,
}

impl ResponseBody {
    pub fn new(inner: Body) -> Self {
        Self {
            inner,
            background: None,
            sent: false,
        }
    }

    pub fn with_background(inner: Body, background: BackgroundTasks) -> Self {
        Self {
            inner,
            background: Some(background),
            sent: false,
        }
    }

    /// Whether the host has read the body to its end.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn background(&self) -> Option<&BackgroundTasks> {
        self.background.as_ref()
    }
}

impl HttpBody for ResponseBody {
    type Data = Bytes;
    type Error = hyper::Error;

    fn poll_data(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Self::Data, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_data(cx);
        // hyper stops polling once `is_end_stream` holds, so the last chunk
        // may be the final poll.
        match &polled {
            Poll::Ready(None) => self.sent = true,
            Poll::Ready(Some(Ok(_))) if self.inner.is_end_stream() => self.sent = true,
            _ => {}
        }
        polled
    }

    fn poll_trailers(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<HeaderMap>, Self::Error>> {
        Pin::new(&mut self.inner).poll_trailers(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for ResponseBody {
    fn drop(&mut self) {
        let Some(background) = self.background.take() else {
            return
        };
        if self.sent {
            background.spawn();
        } else if !background.is_empty() {
            tracing::debug!(
                "Dropping {} background task(s): the response was not sent",
                background.len()
            );
        }
    }
}

fn response(
    status: StatusCode,
    content_type: &'static str,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub(crate) fn plain_text(
    status: StatusCode,
    message: impl Into<String>,
) -> Response<ResponseBody> {
    response(
        status,
        TEXT_PLAIN,
        ResponseBody::new(Body::from(message.into())),
    )
}

pub(crate) fn html(page: String) -> Response<ResponseBody> {
    response(StatusCode::OK, TEXT_HTML, ResponseBody::new(Body::from(page)))
}

pub(crate) fn rejection(error: &RequestError) -> Response<ResponseBody> {
    plain_text(error.status(), error.to_string())
}

/// The JSON document returned for an executed query.
#[derive(Debug, Serialize)]
pub struct GraphQLResponseBody {
    pub data: async_graphql::Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,
}

impl GraphQLResponseBody {
    /// Formats each engine error in the order the engine reported them.
    pub fn new(response: async_graphql::Response, formatter: &ErrorFormatter) -> Self {
        let errors = response.errors.iter().map(|error| formatter(error)).collect();
        Self {
            data: response.data,
            errors,
        }
    }

    /// `400` as soon as one error is present, even next to partial data.
    pub fn status(&self) -> StatusCode {
        if self.errors.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

pub(crate) fn graphql(
    body: GraphQLResponseBody,
    background: Option<BackgroundTasks>,
) -> Response<ResponseBody> {
    let status = body.status();
    let bytes = match serde_json::to_vec(&body) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("Failed to serialize GraphQL response: {err}");
            return plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    };

    let body = match background {
        Some(background) => ResponseBody::with_background(Body::from(bytes), background),
        None => ResponseBody::new(Body::from(bytes)),
    };
    response(status, APPLICATION_JSON, body)
}
