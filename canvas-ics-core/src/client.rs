use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, ClientBuilder, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, LINK},
};
use serde_json::Value;

use crate::{
    ClientConfig, Error, Result,
    pager::{Page, PageSource, next_link},
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest slice of an error body kept in [`Error::Upstream`].
const MAX_ERROR_BODY: usize = 2048;

/// Builder for [`CanvasClient`]
pub struct CanvasClientBuilder {
    client_builder: ClientBuilder,
    base_url: String,
    token: String,
}

/// Authenticated Canvas HTTP client. Requests are issued one at a time.
#[derive(Clone)]
pub struct CanvasClient {
    client: Client,
    base_url: String,
    token: String,
}

impl CanvasClientBuilder {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client_builder = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("canvas-ics/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        Self {
            client_builder,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let builder = Self::new(&config.base_url, &config.token);
        match config.timeout {
            Some(secs) => builder.timeout(secs),
            None => builder,
        }
    }

    pub fn timeout(mut self, timeout_secs: u64) -> Self {
        self.client_builder = self
            .client_builder
            .timeout(Duration::from_secs(timeout_secs));
        self
    }

    pub fn build(self) -> Result<CanvasClient> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("Canvas base URL is empty".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Canvas base URL must start with http:// or https://, got {base_url}"
            )));
        }
        if self.token.trim().is_empty() {
            return Err(Error::Config("Canvas API token is empty".to_string()));
        }

        let client = self
            .client_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(CanvasClient {
            client,
            base_url,
            token: self.token,
        })
    }
}

impl CanvasClient {
    /// Instance root without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn handle_error_req(error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(error)
        }
    }
}

#[async_trait]
impl PageSource for CanvasClient {
    async fn fetch_page(&self, url: &str, params: &[(String, String)]) -> Result<Page> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await
            .map_err(Self::handle_error_req)?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status, url, body));
        }

        let next = response
            .headers()
            .get_all(LINK)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(next_link);

        let records = match response.json::<Value>().await.map_err(Self::handle_error_req)? {
            Value::Array(records) => records,
            Value::Null => Vec::new(),
            other => {
                return Err(Error::Internal(format!(
                    "expected a JSON array from {url}, got {}",
                    json_kind(&other)
                )));
            }
        };

        Ok(Page { records, next })
    }
}

fn upstream_error(status: StatusCode, url: String, mut body: String) -> Error {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    Error::Upstream {
        status: status.as_u16(),
        url,
        body,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::pager::{Pager, params};

    fn client_for(server: &MockServer) -> CanvasClient {
        CanvasClientBuilder::new(server.uri(), "secret-token")
            .timeout(5)
            .build()
            .unwrap()
    }

    #[test]
    fn build_rejects_bad_config() {
        assert!(matches!(
            CanvasClientBuilder::new("", "t").build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            CanvasClientBuilder::new("canvas.example.edu", "t").build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            CanvasClientBuilder::new("https://canvas.example.edu", " ").build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn build_trims_trailing_slash() {
        let client = CanvasClientBuilder::new("https://canvas.example.edu/", "t")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://canvas.example.edu");
    }

    #[tokio::test]
    async fn follows_link_header_with_bearer_auth() {
        let server = MockServer::start().await;
        let second = format!("{}/items?page=2", server.uri());

        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("per_page", "100"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", format!("<{second}>; rel=\"next\"").as_str())
                    .set_body_json(json!([{ "id": 1 }, { "id": 2 }])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("page", "2"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 3 }])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut pager = Pager::new(
            &client,
            format!("{}/items", server.uri()),
            params(&[("per_page", "100")]),
        );

        let first = pager.next_page().await.unwrap().unwrap();
        assert_eq!(first.len(), 2);
        let last = pager.next_page().await.unwrap().unwrap();
        assert_eq!(last, vec![json!({ "id": 3 })]);
        assert!(pager.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"errors":[{"message":"Invalid access token."}]}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_page(&format!("{}/items", server.uri()), &[])
            .await
            .unwrap_err();

        match err {
            Error::Upstream { status, body, .. } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid access token."));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_array_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_page(&format!("{}/items", server.uri()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "é".repeat(MAX_ERROR_BODY);
        match upstream_error(StatusCode::BAD_GATEWAY, "u".to_string(), body) {
            Error::Upstream { status, body, .. } => {
                assert_eq!(status, 502);
                assert!(body.len() <= MAX_ERROR_BODY + '…'.len_utf8());
                assert!(body.ends_with('…'));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
