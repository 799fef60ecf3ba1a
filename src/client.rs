//! HTTP client for the allotment backend
//!
//! Both endpoints accept a JSON body via POST and answer `202 Accepted` with a
//! `{ "data": ... }` envelope on success. Every other status is a failure; there
//! are no retries.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{Credentials, Envelope, StatusQuery, StatusResult, UserProfile};

/// Login endpoint path
pub const LOGIN_PATH: &str = "login";
/// Status endpoint path
pub const STATUS_PATH: &str = "get-ipo-status";

/// Backend operations the authenticator and poller depend on
///
/// [`HttpClient`] is the production implementation; anything else that speaks
/// the same contract (an in-process fake, a recorded session) can stand in.
#[async_trait]
pub trait StatusApi: Send + Sync {
    /// Submit credentials and return the user's profile
    async fn login(&self, credentials: &Credentials) -> Result<UserProfile>;

    /// Look up allotment status for one PAN number
    async fn ipo_status(&self, query: &StatusQuery) -> Result<StatusResult>;
}

/// `reqwest`-backed [`StatusApi`]
#[derive(Clone, Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a client from API settings
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        // Url::join drops the last path segment unless it ends with '/'
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| Error::Config {
            message: format!("cannot build URL for '{path}': {e}"),
            key: Some("base_url".to_string()),
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let endpoint = format!("/{path}");

        let response = self.http.post(url).json(body).send().await.map_err(|e| {
            tracing::warn!(endpoint = %endpoint, error = %e, "request failed");
            Error::Transport(e)
        })?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            tracing::error!(endpoint = %endpoint, status = %status, "bad request");
            return Err(Error::Protocol {
                endpoint,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(endpoint = %endpoint, bytes = bytes.len(), "response received");
        Ok(envelope.data)
    }
}

#[async_trait]
impl StatusApi for HttpClient {
    async fn login(&self, credentials: &Credentials) -> Result<UserProfile> {
        self.post(LOGIN_PATH, credentials).await
    }

    async fn ipo_status(&self, query: &StatusQuery) -> Result<StatusResult> {
        tracing::info!(identifier = %query.pan_number, target_name = %query.ipo_name, "getting status");
        self.post(STATUS_PATH, query).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpClient {
        let config = ApiConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
            request_timeout: None,
        };
        HttpClient::new(&config).unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = ApiConfig {
            base_url: Url::parse("http://backend.local/api/v1").unwrap(),
            request_timeout: None,
        };
        let client = HttpClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(STATUS_PATH).unwrap().as_str(),
            "http://backend.local/api/v1/get-ipo-status"
        );
    }

    #[tokio::test]
    async fn ipo_status_posts_query_and_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-ipo-status"))
            .and(body_json(json!({"ipo_name": "X Ltd", "pan_number": "AAAAA1111A"})))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "data": {
                    "ipo_name": "X Ltd",
                    "is_alloted": true,
                    "is_applied": true,
                    "pan_number": "AAAAA1111A",
                    "securities_alloted": "150"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .ipo_status(&StatusQuery::new("X Ltd", "AAAAA1111A"))
            .await
            .unwrap();

        assert!(result.is_applied);
        assert!(result.is_alloted);
        assert_eq!(result.securities_alloted, "150");
    }

    #[tokio::test]
    async fn plain_200_is_not_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-ipo-status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .ipo_status(&StatusQuery::new("X Ltd", "AAAAA1111A"))
            .await
            .unwrap_err();

        match err {
            Error::Protocol { endpoint, status } => {
                assert_eq!(endpoint, "/get-ipo-status");
                assert_eq!(status, 200);
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(202).set_body_string("not json"))
            .mount(&server)
            .await;

        let creds = Credentials {
            email: "a@b.c".into(),
            password: "pw".into(),
        };
        let err = client_for(&server).login(&creds).await.unwrap_err();
        assert!(matches!(err, Error::Decode { ref endpoint, .. } if endpoint == "/login"));
    }

    #[tokio::test]
    async fn login_returns_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({"email": "a@b.c", "password": "pw"})))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "data": {
                    "email": "a@b.c",
                    "id": "42",
                    "name": "Asha",
                    "phone_number": "9999999999",
                    "pan_numbers": ["AAAAA1111A", "BBBBB2222B"]
                }
            })))
            .mount(&server)
            .await;

        let creds = Credentials {
            email: "a@b.c".into(),
            password: "pw".into(),
        };
        let profile = client_for(&server).login(&creds).await.unwrap();
        assert_eq!(profile.id, "42");
        assert_eq!(profile.pan_numbers, vec!["AAAAA1111A", "BBBBB2222B"]);
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        // Nothing listens on port 1
        let config = ApiConfig {
            base_url: Url::parse("http://127.0.0.1:1").unwrap(),
            request_timeout: Some(std::time::Duration::from_secs(5)),
        };
        let err = HttpClient::new(&config)
            .unwrap()
            .ipo_status(&StatusQuery::new("X Ltd", "AAAAA1111A"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    }
}
