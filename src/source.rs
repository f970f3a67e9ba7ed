use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{FetchError, PathError};

/// Anything that can answer a GET for `<base>/<path>?<query>` with JSON.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn get(&self, path: &str, query: Option<&str>) -> Result<Value, FetchError>;
}

/// A parsed 2xx upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Value,
}

/// The CMS REST API reached over HTTP.
#[derive(Debug, Clone)]
pub struct RestSource {
    client: reqwest::Client,
    base_url: String,
}

impl RestSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn from_config(cfg: &GatewayConfig) -> anyhow::Result<Self> {
        Ok(Self::new(cfg.http_client()?, cfg.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/<path>?<query>`. Each `/`-separated piece of `path` becomes
    /// one percent-encoded segment under the base, so `?` and `#` stay part
    /// of the path and `.`/`..` are refused. The query is appended as given.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> Result<Url, PathError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| PathError::Base(format!("{}: {e}", self.base_url)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| PathError::Base(self.base_url.clone()))?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                if segment == "." || segment == ".." {
                    return Err(PathError::DotSegment(path.to_string()));
                }
                segments.push(segment);
            }
        }
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    /// Anonymous GET of an absolute URL. Only the JSON content headers are
    /// sent; nothing from an inbound request is forwarded.
    pub async fn fetch(&self, url: &str) -> Result<JsonResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(%url, status = status.as_u16(), error = %e, "failed to read upstream error body");
                    String::new()
                }
            };
            return Err(FetchError::Status { status: status.as_u16(), body });
        }
        let bytes = resp.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;
        Ok(JsonResponse { status: status.as_u16(), body })
    }
}

#[async_trait]
impl ContentSource for RestSource {
    async fn get(&self, path: &str, query: Option<&str>) -> Result<Value, FetchError> {
        let url = self.url_for(path, query)?;
        debug!(%url, "fetching content");
        Ok(self.fetch(url.as_str()).await?.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn source(base: &str) -> RestSource {
        RestSource::new(reqwest::Client::new(), base)
    }

    fn url(s: &RestSource, path: &str, query: Option<&str>) -> String {
        s.url_for(path, query).unwrap().to_string()
    }

    #[test]
    fn url_for_joins_path_and_query() {
        let s = source("https://cms.test/wp-json/wp/v2/");
        assert_eq!(
            url(&s, "services", Some("_embed&per_page=100")),
            "https://cms.test/wp-json/wp/v2/services?_embed&per_page=100"
        );
        assert_eq!(
            url(&s, "/taxonomy/industry/3", None),
            "https://cms.test/wp-json/wp/v2/taxonomy/industry/3"
        );
        assert_eq!(url(&s, "team", Some("")), "https://cms.test/wp-json/wp/v2/team");
        assert_eq!(url(&source("http://127.0.0.1:9000"), "posts", None), "http://127.0.0.1:9000/posts");
    }

    #[test]
    fn url_for_keeps_reserved_characters_inside_the_path() {
        let s = source("https://cms.test/wp-json/wp/v2");
        assert_eq!(
            url(&s, "services?status=draft#top", None),
            "https://cms.test/wp-json/wp/v2/services%3Fstatus=draft%23top"
        );
        assert_eq!(url(&s, "a//b/", None), "https://cms.test/wp-json/wp/v2/a/b");
    }

    #[test]
    fn url_for_refuses_dot_segments() {
        let s = source("https://cms.test/wp-json/wp/v2");
        for path in ["../../../wp-admin/secret", "services/./team", ".."] {
            assert_eq!(s.url_for(path, None), Err(PathError::DotSegment(path.to_string())));
        }
    }

    #[test]
    fn url_for_reports_an_unusable_base() {
        assert!(matches!(source("not a url").url_for("services", None), Err(PathError::Base(_))));
        assert!(matches!(source("mailto:cms@agency.test").url_for("x", None), Err(PathError::Base(_))));
    }

    #[tokio::test]
    async fn fetch_sends_json_headers_and_parses_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/services")
            .match_header("accept", "application/json")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":1}]"#)
            .create_async()
            .await;

        let resp = source(&server.url()).fetch(&format!("{}/services", server.url())).await.unwrap();

        mock.assert_async().await;
        assert_eq!(resp, JsonResponse { status: 200, body: json!([{ "id": 1 }]) });
    }

    #[tokio::test]
    async fn non_success_status_keeps_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(404)
            .with_body("no route")
            .create_async()
            .await;

        let err = source(&server.url()).get("missing", None).await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no route");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn truncated_error_body_keeps_the_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\npartial")
                .await
                .unwrap();
        });

        let err = source(&format!("http://{addr}")).get("services", None).await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 503);
                assert!(body.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/posts")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = source(&server.url()).get("posts", None).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
