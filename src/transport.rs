use crate::config::{AlertConfig, HttpConfig};
use crate::error::{AppError, Result};
use crate::models::RemoteEndpoint;
use reqwest::Client;
use serde_json::Value;
use std::str::FromStr;
use strum::Display;
use tracing::debug;

/// Methods the remote API is driven with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            _ => Err(AppError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Status code plus the JSON body, if the body parsed as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    /// Body as a JSON object, `None` for non-object bodies
    pub fn object(&self) -> Option<&serde_json::Map<String, Value>> {
        self.body.as_ref().and_then(Value::as_object)
    }
}

/// JSM Ops integration API client
#[derive(Clone)]
pub struct JsmOpsClient {
    pub(crate) client: Client,
    pub(crate) api_url: String,
    pub(crate) authorization: String,
}

impl JsmOpsClient {
    /// Create a new client for one remote endpoint
    pub fn new(endpoint: &RemoteEndpoint, http: &HttpConfig, alert: &AlertConfig) -> Result<Self> {
        if endpoint.api_url.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "Required {} param is not set: \"api\".",
                alert.name
            )));
        }
        if endpoint.token.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "Required {} param is not set: \"token\".",
                alert.name
            )));
        }

        let mut builder = Client::builder()
            .timeout(http.timeout())
            .user_agent(http.user_agent.clone());

        builder = match endpoint.proxy.as_deref() {
            Some(proxy) => builder.proxy(
                reqwest::Proxy::all(proxy)
                    .map_err(|e| AppError::Configuration(format!("Invalid HTTP proxy: {}", e)))?,
            ),
            None => builder.no_proxy(),
        };

        let client = builder
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: endpoint.api_url.clone(),
            authorization: format!("{} {}", alert.auth_scheme, endpoint.token),
        })
    }

    /// Perform one call against `<api_url><path>`
    ///
    /// With `allow_404` a 404 answer counts as success; polling uses this
    /// while the remote request is not materialized yet.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        allow_404: bool,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.api_url, path);

        let mut request = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
        }
        .header("Content-Type", "application/json")
        .header("Authorization", &self.authorization);

        let payload = body.map(serde_json::to_string).transpose()?;
        debug!(
            method = %method,
            url = %url,
            body = payload.as_deref().unwrap_or_default(),
            "Sending request"
        );

        if let Some(payload) = payload {
            request = request.body(payload);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let raw = response.text().await?;

        debug!(status = status, body = %raw, "Received response");

        let parsed = if raw.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => Some(value),
                Err(_) => {
                    debug!("Failed to parse response");
                    None
                }
            }
        };

        if !is_success(status, allow_404) {
            return Err(AppError::RequestFailed {
                status,
                message: parsed.as_ref().and_then(extract_error_message),
            });
        }

        Ok(ApiResponse {
            status,
            body: parsed,
        })
    }
}

/// 2xx, or exactly 404 when tolerated
pub fn is_success(status: u16, allow_404: bool) -> bool {
    (200..300).contains(&status) || (allow_404 && status == 404)
}

/// Best-effort human readable reason from an error body
///
/// Tries `errors`, then `errorMessages`, then `message`.
pub fn extract_error_message(body: &Value) -> Option<String> {
    fn non_empty_collection(value: Option<&Value>) -> Option<String> {
        match value {
            Some(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map.clone()).to_string()),
            Some(Value::Array(items)) if !items.is_empty() => Some(Value::Array(items.clone()).to_string()),
            _ => None,
        }
    }

    non_empty_collection(body.get("errors"))
        .or_else(|| non_empty_collection(body.get("errorMessages")))
        .or_else(|| body.get("message").and_then(Value::as_str).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint(api_url: &str, token: &str) -> RemoteEndpoint {
        RemoteEndpoint {
            api_url: api_url.to_string(),
            web_url: "https://example.com/".to_string(),
            token: token.to_string(),
            proxy: None,
        }
    }

    fn client_for(api_url: &str) -> JsmOpsClient {
        JsmOpsClient::new(
            &endpoint(api_url, "key"),
            &HttpConfig::default(),
            &AlertConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_client_requires_api_and_token() {
        let result = JsmOpsClient::new(
            &endpoint("", "key"),
            &HttpConfig::default(),
            &AlertConfig::default(),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));

        let result = JsmOpsClient::new(
            &endpoint("https://api.example.com/", " "),
            &HttpConfig::default(),
            &AlertConfig::default(),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_authorization_header_value() {
        let client = client_for("https://api.example.com/");
        assert_eq!(client.authorization, "GenieKey key");
    }

    #[test]
    fn test_invalid_proxy_is_configuration_error() {
        let mut ep = endpoint("https://api.example.com/", "key");
        ep.proxy = Some("http://[::1".to_string());
        let result = JsmOpsClient::new(&ep, &HttpConfig::default(), &AlertConfig::default());
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert!(matches!(
            "delete".parse::<HttpMethod>(),
            Err(AppError::UnsupportedMethod(_))
        ));
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
    }

    #[test]
    fn test_success_band() {
        assert!(is_success(200, false));
        assert!(is_success(202, false));
        assert!(is_success(299, false));
        assert!(!is_success(300, false));
        assert!(!is_success(404, false));
        assert!(is_success(404, true));
        assert!(!is_success(400, true));
        assert!(!is_success(500, true));
    }

    #[test]
    fn test_error_message_priority() {
        let body = json!({"errors": {"alias": "too long"}, "message": "Invalid"});
        assert_eq!(extract_error_message(&body).unwrap(), r#"{"alias":"too long"}"#);

        let body = json!({"errors": {}, "errorMessages": ["bad key"], "message": "Invalid"});
        assert_eq!(extract_error_message(&body).unwrap(), r#"["bad key"]"#);

        let body = json!({"errors": [], "message": "Invalid"});
        assert_eq!(extract_error_message(&body).unwrap(), "Invalid");

        assert!(extract_error_message(&json!({"took": 0.1})).is_none());
    }

    #[tokio::test]
    async fn test_request_sends_headers_and_parses_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/alerts")
            .match_header("authorization", "GenieKey key")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(json!({"alias": "1"})))
            .with_status(202)
            .with_body(r#"{"result": "Request will be processed", "requestId": "r-1"}"#)
            .create_async()
            .await;

        let client = client_for(&format!("{}/", server.url()));
        let response = client
            .request(HttpMethod::Post, "alerts", Some(&json!({"alias": "1"})), false)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 202);
        assert_eq!(response.object().unwrap()["requestId"], "r-1");
    }

    #[tokio::test]
    async fn test_request_goes_through_proxy() {
        let mut proxy = mockito::Server::new_async().await;
        let mock = proxy
            .mock("POST", "/alerts")
            .match_header("authorization", "GenieKey key")
            .with_status(202)
            .with_body(r#"{"result": "Request will be processed", "requestId": "p-1"}"#)
            .create_async()
            .await;

        let mut ep = endpoint("http://jsm-ops.invalid/", "key");
        ep.proxy = Some(proxy.url());
        let client = JsmOpsClient::new(&ep, &HttpConfig::default(), &AlertConfig::default()).unwrap();

        let response = client
            .request(HttpMethod::Post, "alerts", Some(&json!({"alias": "1"})), false)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.object().unwrap()["requestId"], "p-1");
    }

    #[tokio::test]
    async fn test_truncated_body_is_network_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 202 Accepted\r\nContent-Length: 100\r\n\r\n{\"result\":")
                .await
                .unwrap();
        });

        let client = client_for(&format!("http://{}/", addr));
        let result = client.request(HttpMethod::Get, "requests/x", None, false).await;
        assert!(matches!(result, Err(AppError::Network(_))));
    }

    #[tokio::test]
    async fn test_request_non_json_body_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/requests/x")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = client_for(&format!("{}/", server.url()));
        let response = client
            .request(HttpMethod::Get, "requests/x", None, false)
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn test_request_failure_carries_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/requests/x")
            .with_status(404)
            .with_body(r#"{"message": "Request not found"}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&format!("{}/", server.url()));
        match client.request(HttpMethod::Get, "requests/x", None, false).await {
            Err(AppError::RequestFailed { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message.as_deref(), Some("Request not found"));
            }
            other => panic!("expected request failure, got {:?}", other),
        }

        let response = client
            .request(HttpMethod::Get, "requests/x", None, true)
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }
}
