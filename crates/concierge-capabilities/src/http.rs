//! Remote capability service reached over HTTP.
//!
//! Wire contract:
//! - `POST {endpoint}/perform` with `{"user_id", "action"}` answers
//!   `{"message", "effect"?}`.
//! - `POST {endpoint}/search` with `{"user_id", "query"}` answers
//!   `{"items": [...]}`.
//! - Failures answer non-2xx with `{"error": {"code", "message"}}` where
//!   `code` is e.g. `OAUTH_NOT_CONNECTED` or `OAUTH_EXPIRED`.

use async_trait::async_trait;
use concierge_core::{
    action::{Action, Candidate, CapabilityReply, Domain, SearchQuery},
    config::CapabilityEndpoint,
    error::CapabilityError,
    traits::Capability,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpCapability {
    domain: Domain,
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

#[derive(Serialize)]
struct PerformRequest<'a> {
    user_id: &'a str,
    action: &'a Action,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    user_id: &'a str,
    query: &'a SearchQuery,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Candidate>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

impl HttpCapability {
    pub fn new(domain: Domain, config: &CapabilityEndpoint) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            domain,
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn service(&self) -> &'static str {
        self.domain.label()
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CapabilityError> {
        let url = format!("{}/{path}", self.endpoint);
        debug!("{}: POST {url}", self.domain.as_str());

        let mut req = self.client.post(&url).json(body);
        if !self.token.is_empty() {
            req = req.bearer_auth(&self.token);
        }

        let resp = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(env) => CapabilityError::from_code(
                    &env.error.code,
                    self.service(),
                    &env.error.message,
                ),
                Err(_) if status == reqwest::StatusCode::NOT_FOUND => {
                    CapabilityError::NotFound(format!("{}: {text}", self.service()))
                }
                Err(_) => {
                    CapabilityError::Upstream(format!("{} returned {status}", self.service()))
                }
            });
        }

        resp.json::<T>().await.map_err(|e| {
            warn!("{}: unreadable response: {e}", self.domain.as_str());
            CapabilityError::Upstream(format!("{}: malformed response", self.service()))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> CapabilityError {
        if e.is_timeout() {
            CapabilityError::Timeout {
                service: self.service().to_string(),
            }
        } else {
            CapabilityError::Upstream(format!("{}: {e}", self.service()))
        }
    }
}

#[async_trait]
impl Capability for HttpCapability {
    fn domain(&self) -> Domain {
        self.domain
    }

    async fn perform(
        &self,
        user_id: &str,
        action: &Action,
    ) -> Result<CapabilityReply, CapabilityError> {
        self.post("perform", &PerformRequest { user_id, action })
            .await
    }

    async fn search(
        &self,
        user_id: &str,
        query: &SearchQuery,
    ) -> Result<Vec<Candidate>, CapabilityError> {
        let resp: SearchResponse = self.post("search", &SearchRequest { user_id, query }).await?;
        Ok(resp.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn capability(domain: Domain, base: &str, timeout_secs: u64) -> HttpCapability {
        HttpCapability::new(
            domain,
            &CapabilityEndpoint {
                endpoint: base.to_string(),
                token: "secret".into(),
                timeout_secs,
            },
        )
    }

    #[tokio::test]
    async fn test_perform_returns_message() {
        let router = Router::new().route(
            "/perform",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["action"]["type"], "gmail_check");
                Json(json!({"message": format!("3 unread for {}", body["user_id"].as_str().unwrap())}))
            }),
        );
        let base = spawn(router).await;
        let cap = capability(Domain::Gmail, &base, 5);
        let reply = cap.perform("u1", &Action::GmailCheck).await.unwrap();
        assert_eq!(reply.message, "3 unread for u1");
        assert!(reply.effect.is_none());
    }

    #[tokio::test]
    async fn test_oauth_codes_are_typed() {
        let router = Router::new().route(
            "/perform",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"code": "OAUTH_EXPIRED", "message": "token expired"}})),
                )
            }),
        );
        let base = spawn(router).await;
        let cap = capability(Domain::Calendar, &base, 5);
        let err = cap.perform("u1", &Action::GmailCheck).await.unwrap_err();
        assert!(err.needs_reconnect());
        assert_eq!(
            err,
            CapabilityError::OAuthExpired {
                service: "Google Calendar".into()
            }
        );
    }

    #[tokio::test]
    async fn test_plain_server_error_is_upstream() {
        let router = Router::new().route(
            "/perform",
            post(|| async { (StatusCode::BAD_GATEWAY, "boom") }),
        );
        let base = spawn(router).await;
        let cap = capability(Domain::Drive, &base, 5);
        let err = cap.perform("u1", &Action::GmailCheck).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_search_parses_candidates() {
        let router = Router::new().route(
            "/search",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["query"]["type"], "open_tasks");
                Json(json!({"items": [
                    {"id": "t1", "title": "Pay rent", "source_list": "Home"},
                    {"id": "t2", "title": "Pay rent", "source_list": "Work"}
                ]}))
            }),
        );
        let base = spawn(router).await;
        let cap = capability(Domain::Tasks, &base, 5);
        let items = cap.search("u1", &SearchQuery::OpenTasks).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].source_list.as_deref(), Some("Work"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_upstream_error() {
        let cap = capability(Domain::WebSearch, "http://127.0.0.1:9", 2);
        let err = cap
            .perform(
                "u1",
                &Action::WebSearch {
                    query: "weather".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CapabilityError::Upstream(_) | CapabilityError::Timeout { .. }
        ));
    }
}
