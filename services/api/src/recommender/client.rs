//! HTTP client for the AI recommendation service

use std::time::Duration;

use anyhow::Result;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::RecommendError;
use crate::models::recommendation::{AiRecommendPayload, RecommendResponse};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_PATH: &str = "/api/v1/recommendations/recommend";

/// Where and how to reach the AI service
#[derive(Debug, Clone)]
pub struct AiServiceConfig {
    pub base_url: String,
    pub path: String,
    pub auth_token: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl AiServiceConfig {
    /// Create a new AiServiceConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AI_REC_BASE_URL`: Service origin (default: http://localhost:8000)
    /// - `AI_REC_PATH`: Recommend endpoint path (default: /api/v1/recommendations/recommend)
    /// - `AI_REC_AUTH_TOKEN`: Value sent as `X-Auth-Token` (required)
    /// - `AI_REC_CONNECT_TIMEOUT_SECS`: Connect timeout (default: 3)
    /// - `AI_REC_READ_TIMEOUT_SECS`: Whole-request timeout (default: 15)
    pub fn from_env() -> Result<Self> {
        let auth_token = std::env::var("AI_REC_AUTH_TOKEN")
            .map_err(|_| anyhow::anyhow!("AI_REC_AUTH_TOKEN environment variable not set"))?;

        let secs = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            base_url: std::env::var("AI_REC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            path: std::env::var("AI_REC_PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string()),
            auth_token,
            connect_timeout: Duration::from_secs(secs("AI_REC_CONNECT_TIMEOUT_SECS", 3)),
            read_timeout: Duration::from_secs(secs("AI_REC_READ_TIMEOUT_SECS", 15)),
        })
    }

    /// Full URL of the recommend endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Thin wrapper over a shared `reqwest::Client`
#[derive(Clone)]
pub struct RecommendationClient {
    http: reqwest::Client,
    endpoint: String,
    auth_token: String,
}

impl RecommendationClient {
    pub fn new(config: &AiServiceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// POST the payload and validate the response shape
    pub async fn recommend(
        &self,
        payload: &AiRecommendPayload,
    ) -> Result<RecommendResponse, RecommendError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Auth-Token", &self.auth_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!("AI service request failed: {}", e);
                RecommendError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RecommendError::Unreachable(e.to_string()))?;

        info!("AI service responded with status {}", status.as_u16());

        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "detail": text }));
            return Err(RecommendError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<RecommendResponse>(&text)
            .map_err(|e| RecommendError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recommendation::UserInfo;
    use mockito::Matcher;
    use serial_test::serial;

    fn config(base_url: &str) -> AiServiceConfig {
        AiServiceConfig {
            base_url: base_url.to_string(),
            path: DEFAULT_PATH.to_string(),
            auth_token: "test-token".to_string(),
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(2),
        }
    }

    fn payload() -> AiRecommendPayload {
        AiRecommendPayload {
            user_info: UserInfo {
                gender: Some("female".into()),
                skin_tone: Some("white".into()),
                color_preferences: vec![],
                face_shape: Some("oval".into()),
                body_shape: Some("pear".into()),
            },
            drawer_products: vec![],
            location: "Paris".into(),
            occasion: "dinner".into(),
        }
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let mut cfg = config("http://ai.local/");
        assert_eq!(cfg.endpoint(), "http://ai.local/api/v1/recommendations/recommend");
        cfg.path = "recommend".into();
        assert_eq!(cfg.endpoint(), "http://ai.local/recommend");
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        unsafe {
            std::env::remove_var("AI_REC_AUTH_TOKEN");
        }
        assert!(AiServiceConfig::from_env().is_err());

        unsafe {
            std::env::set_var("AI_REC_AUTH_TOKEN", "secret");
            std::env::set_var("AI_REC_BASE_URL", "http://ai.internal:9000");
            std::env::set_var("AI_REC_READ_TIMEOUT_SECS", "30");
            std::env::remove_var("AI_REC_PATH");
            std::env::remove_var("AI_REC_CONNECT_TIMEOUT_SECS");
        }

        let cfg = AiServiceConfig::from_env().unwrap();
        assert_eq!(cfg.auth_token, "secret");
        assert_eq!(
            cfg.endpoint(),
            "http://ai.internal:9000/api/v1/recommendations/recommend"
        );
        assert_eq!(cfg.connect_timeout, Duration::from_secs(3));
        assert_eq!(cfg.read_timeout, Duration::from_secs(30));

        unsafe {
            std::env::remove_var("AI_REC_AUTH_TOKEN");
            std::env::remove_var("AI_REC_BASE_URL");
            std::env::remove_var("AI_REC_READ_TIMEOUT_SECS");
        }
    }

    #[tokio::test]
    async fn test_sends_auth_header_and_parses_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", DEFAULT_PATH)
            .match_header("x-auth-token", "test-token")
            .match_body(Matcher::PartialJson(json!({"location": "Paris"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"recommendations": []}"#)
            .create_async()
            .await;

        let client = RecommendationClient::new(&config(&server.url())).unwrap();
        let response = client.recommend(&payload()).await.unwrap();

        assert!(response.recommendations.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_wrapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DEFAULT_PATH)
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = RecommendationClient::new(&config(&server.url())).unwrap();
        match client.recommend(&payload()).await {
            Err(RecommendError::Upstream { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, json!({"detail": "bad gateway"}));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_error_body_is_kept() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DEFAULT_PATH)
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "drawer_products empty"}"#)
            .create_async()
            .await;

        let client = RecommendationClient::new(&config(&server.url())).unwrap();
        let err = client.recommend(&payload()).await.unwrap_err();
        assert!(err.to_string().contains("drawer_products empty"));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DEFAULT_PATH)
            .with_status(200)
            .with_body(r#"{"outfits": []}"#)
            .create_async()
            .await;

        let client = RecommendationClient::new(&config(&server.url())).unwrap();
        assert!(matches!(
            client.recommend(&payload()).await,
            Err(RecommendError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let client = RecommendationClient::new(&config("http://127.0.0.1:1")).unwrap();
        assert!(matches!(
            client.recommend(&payload()).await,
            Err(RecommendError::Unreachable(_))
        ));
    }
}
