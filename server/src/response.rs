//! Handler replies and their conversion to HTTP responses

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use http::{Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// Handler reply types with auto-serialization
#[derive(Debug)]
pub enum Reply {
    /// `200` plain text
    Text(String),
    /// `200` JSON document
    Json(serde_json::Value),
    /// `200` binary body
    Bytes(Bytes),
    /// Empty response with status code
    Status(StatusCode),
    /// Plain text error body with status code
    Error(StatusCode, String),
    /// Redirect with status code and `Location`
    Redirect(StatusCode, String),
    /// Custom response with full control
    Custom(Response<Full<Bytes>>),
}

/// JSON reply wrapper for auto-serialization
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T: Serialize> From<Json<T>> for Reply {
    fn from(json: Json<T>) -> Self {
        match serde_json::to_value(json.0) {
            Ok(value) => Reply::Json(value),
            Err(_) => Reply::Error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to serialize JSON".to_string(),
            ),
        }
    }
}

impl From<&'static str> for Reply {
    fn from(text: &'static str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<StatusCode> for Reply {
    fn from(status: StatusCode) -> Self {
        Reply::Status(status)
    }
}

impl Reply {
    /// Conventional text reply for a status: its reason phrase and a newline
    pub fn status_text(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown Status");
        Reply::Error(status, format!("{reason}\n"))
    }

    /// Status code the reply will be sent with
    pub fn status(&self) -> StatusCode {
        match self {
            Reply::Text(_) | Reply::Json(_) | Reply::Bytes(_) => StatusCode::OK,
            Reply::Status(status) | Reply::Error(status, _) | Reply::Redirect(status, _) => *status,
            Reply::Custom(response) => response.status(),
        }
    }

    /// Convert to the response written to the connection
    pub fn into_response(self) -> Response<Full<Bytes>> {
        match self {
            Reply::Text(text) => with_body(StatusCode::OK, "text/plain; charset=utf-8", text),
            Reply::Json(json) => match serde_json::to_vec(&json) {
                Ok(body) => with_body(StatusCode::OK, "application/json", body),
                Err(_) => with_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain; charset=utf-8",
                    "Failed to serialize JSON",
                ),
            },
            Reply::Bytes(bytes) => with_body(StatusCode::OK, "application/octet-stream", bytes),
            Reply::Status(status) => {
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = status;
                response
            }
            Reply::Error(status, message) => with_body(status, "text/plain; charset=utf-8", message),
            Reply::Redirect(status, location) => match HeaderValue::from_str(&location) {
                Ok(value) => {
                    let mut response = Response::new(Full::new(Bytes::new()));
                    *response.status_mut() = status;
                    response.headers_mut().insert(LOCATION, value);
                    response
                }
                Err(_) => with_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain; charset=utf-8",
                    "Invalid redirect location",
                ),
            },
            Reply::Custom(response) => response,
        }
    }
}

fn with_body(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_text_reply() {
        let response = Reply::from("hello").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_of(response).await, "hello");
    }

    #[tokio::test]
    async fn test_json_reply() {
        let reply: Reply = Json(json!({"id": 7})).into();
        assert!(matches!(reply, Reply::Json(_)));

        let response = reply.into_response();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_of(response).await, r#"{"id":7}"#);
    }

    #[tokio::test]
    async fn test_status_text_reply() {
        let reply = Reply::status_text(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(reply.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_of(reply.into_response()).await, "Method Not Allowed\n");
    }

    #[test]
    fn test_redirect_reply() {
        let response =
            Reply::Redirect(StatusCode::MOVED_PERMANENTLY, "/foo/?a=1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/foo/?a=1");

        let broken = Reply::Redirect(StatusCode::FOUND, "/bad\nheader".to_string()).into_response();
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_reply() {
        let reply = Reply::from(StatusCode::NO_CONTENT);
        assert_eq!(reply.status(), StatusCode::NO_CONTENT);
        assert_eq!(reply.into_response().status(), StatusCode::NO_CONTENT);
    }
}
