//! GraphiQL page served on `GET`/`HEAD`.

const GRAPHIQL: &str = include_str!("../assets/graphiql.html");

/// The placeholder replaced by the JSON-encoded request path.
pub const REQUEST_PATH_PLACEHOLDER: &str = "{{REQUEST_PATH}}";

/// Renders the GraphiQL page so that it posts queries back to `path`.
pub fn render(path: &str) -> String {
    let target = serde_json::Value::from(path).to_string();
    GRAPHIQL.replace(REQUEST_PATH_PLACEHOLDER, &target)
}
