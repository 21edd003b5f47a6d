//! Extraction of the GraphQL query from an HTTP request.

use crate::{
    RequestEnvelope,
    RequestError,
};
use async_graphql::Variables;
use serde_json::{
    Map,
    Value,
};
use std::{
    borrow::Cow,
    collections::HashMap,
};

const JSON_MEDIA_TYPE: &str = "application/json";
const GRAPHQL_MEDIA_TYPE: &str = "application/graphql";

/// The query, variables and operation name of one GraphQL request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPayload {
    pub query: String,
    pub variables: Option<Variables>,
    pub operation_name: Option<String>,
}

impl QueryPayload {
    pub fn into_request(self) -> async_graphql::Request {
        let mut request = async_graphql::Request::new(self.query);
        if let Some(variables) = self.variables {
            request = request.variables(variables);
        }
        if let Some(operation_name) = self.operation_name {
            request = request.operation_name(operation_name);
        }
        request
    }
}

/// Where the payload of a `POST` request was found.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSource {
    /// A JSON body, not necessarily an object.
    Json(Value),
    /// An `application/graphql` body.
    Graphql(String),
    /// The URL query string, with repeated keys resolved to their last value.
    QueryString {
        query: Option<String>,
        variables: Option<String>,
        operation_name: Option<String>,
    },
}

impl PayloadSource {
    /// Picks the payload source from the `Content-Type` header.
    ///
    /// Media types are matched by substring so parameters such as
    /// `charset=utf-8` are tolerated. `Ok(None)` means no source matched.
    pub fn from_request(request: &RequestEnvelope) -> Result<Option<Self>, RequestError> {
        let content_type = request.content_type();

        if content_type.contains(JSON_MEDIA_TYPE) {
            let json =
                serde_json::from_slice(request.body()).map_err(RequestError::InvalidJson)?;
            return Ok(Some(PayloadSource::Json(json)))
        }

        if content_type.contains(GRAPHQL_MEDIA_TYPE) {
            let query = std::str::from_utf8(request.body())?;
            return Ok(Some(PayloadSource::Graphql(query.to_owned())))
        }

        // Later pairs overwrite earlier ones.
        let mut params: HashMap<_, _> = request.query_pairs().into_iter().collect();
        if let Some(query) = params.remove("query") {
            return Ok(Some(PayloadSource::QueryString {
                query: Some(query.into_owned()),
                variables: params.remove("variables").map(Cow::into_owned),
                operation_name: params.remove("operationName").map(Cow::into_owned),
            }))
        }

        Ok(None)
    }

    pub fn into_payload(self) -> Result<QueryPayload, RequestError> {
        match self {
            PayloadSource::Json(Value::Object(object)) => from_json_object(object),
            PayloadSource::Json(_) => Err(RequestError::MissingQuery),
            PayloadSource::Graphql(query) => Ok(QueryPayload {
                query,
                variables: None,
                operation_name: None,
            }),
            PayloadSource::QueryString {
                query,
                variables,
                operation_name,
            } => {
                let query = query.ok_or(RequestError::MissingQuery)?;
                let variables = variables
                    .map(|raw| {
                        serde_json::from_str::<Value>(&raw)
                            .map_err(|e| RequestError::InvalidVariables(e.to_string()))
                            .and_then(variables_from_json)
                    })
                    .transpose()?
                    .flatten();

                Ok(QueryPayload {
                    query,
                    variables,
                    operation_name,
                })
            }
        }
    }
}

fn from_json_object(mut object: Map<String, Value>) -> Result<QueryPayload, RequestError> {
    let query = match object.remove("query") {
        Some(Value::String(query)) => query,
        _ => return Err(RequestError::MissingQuery),
    };

    let variables = match object.remove("variables") {
        Some(variables) => variables_from_json(variables)?,
        None => None,
    };

    let operation_name = match object.remove("operationName") {
        Some(Value::String(name)) => Some(name),
        _ => None,
    };

    Ok(QueryPayload {
        query,
        variables,
        operation_name,
    })
}

fn variables_from_json(value: Value) -> Result<Option<Variables>, RequestError> {
    match value {
        Value::Null => Ok(None),
        value @ Value::Object(_) => Ok(Some(Variables::from_json(value))),
        other => Err(RequestError::InvalidVariables(format!(
            "expected an object, found `{other}`"
        ))),
    }
}
