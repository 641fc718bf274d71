//! HTTP client for the SavvyCal links endpoints

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::error::{FetchError, FetchResult};
use super::models::{ListResponse, RawEntry};
use crate::credential::Credential;

/// Page size requested from the listing endpoint. Further pages are ignored.
pub const LIST_LIMIT: u32 = 100;

/// Client for the links API
///
/// Holds no per-call state, so a single instance can be shared across tasks
/// and used for concurrent requests.
#[derive(Debug, Clone)]
pub struct LinksClient {
    http: Client,
    api_url: String,
}

impl LinksClient {
    /// Create a client for the given API base URL (e.g. `https://api.savvycal.com`)
    pub fn new(api_url: &str, timeout: Duration) -> FetchResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("savvylinks/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// API base URL, without trailing slash
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the first page of links
    pub async fn list_links(&self, credential: &Credential) -> FetchResult<Vec<RawEntry>> {
        if credential.is_empty() {
            return Err(FetchError::Unauthenticated);
        }

        let url = format!("{}/v1/links", self.api_url);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("limit", LIST_LIMIT)])
            .bearer_auth(credential.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed = ListResponse::from_json(&body)?;
        Ok(parsed.entries)
    }

    /// Toggle a link between enabled and disabled
    pub async fn toggle_availability(
        &self,
        credential: &Credential,
        link_id: &str,
    ) -> FetchResult<()> {
        if credential.is_empty() {
            return Err(FetchError::Unauthenticated);
        }

        let url = format!("{}/v1/links/{}/toggle", self.api_url, link_id);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential.expose())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FetchError::HttpStatus(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LinksClient {
        LinksClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn sample_body() -> serde_json::Value {
        serde_json::json!({
            "entries": [{
                "id": "link_1",
                "state": "active",
                "slug": "intro",
                "name": "Intro Call",
                "private_name": null,
                "description": "",
                "scope": {"id": "s1", "name": "Acme", "slug": "acme"}
            }],
            "metadata": {"before": null, "after": null, "limit": 100}
        })
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = LinksClient::new("https://api.example.com/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_url(), "https://api.example.com");
    }

    #[tokio::test]
    async fn test_list_links_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .and(query_param("limit", "100"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let entries = client_for(&server)
            .list_links(&Credential::new("tok"))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Intro Call");
        assert!(entries[0].private_name.is_none());
    }

    #[tokio::test]
    async fn test_list_links_unauthenticated_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(0)
            .mount(&server)
            .await;

        let result = client_for(&server).list_links(&Credential::empty()).await;
        assert!(matches!(result, Err(FetchError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_list_links_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client_for(&server).list_links(&Credential::new("bad")).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(401))));
    }

    #[tokio::test]
    async fn test_list_links_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).list_links(&Credential::new("tok")).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_list_links_transport_error() {
        // Nothing listens on port 1
        let client = LinksClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let result = client.list_links(&Credential::new("tok")).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_toggle_success_and_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/links/ok/toggle"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/links/nope/toggle"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cred = Credential::new("tok");

        assert!(client.toggle_availability(&cred, "ok").await.is_ok());
        assert!(matches!(
            client.toggle_availability(&cred, "nope").await,
            Err(FetchError::HttpStatus(403))
        ));
    }
}
