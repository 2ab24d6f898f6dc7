//! Firebase Cloud Messaging HTTP v1 client.
//!
//! Each message is posted to
//! `{endpoint}/v1/projects/{project_id}/messages:send` with a bearer
//! token. Messages of a batch are sent concurrently and reported back in
//! input order.
//!
//! The bearer token comes from a service account key when one is
//! configured, otherwise from the static `push.access_token`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cubby_core::config::PushConfig;
use cubby_core::error::{AppError, ErrorKind};
use cubby_core::result::AppResult;
use cubby_core::traits::PushGateway;
use cubby_core::types::push::{PushMessage, PushOutcome};

use crate::auth::{ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenCache};
use crate::mask_token;

/// Request body for `messages:send`.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
    android: AndroidConfig,
    apns: ApnsConfig,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct AndroidConfig {
    priority: &'static str,
}

#[derive(Debug, Serialize)]
struct ApnsConfig {
    payload: ApnsPayload,
}

#[derive(Debug, Serialize)]
struct ApnsPayload {
    aps: Aps,
}

#[derive(Debug, Serialize)]
struct Aps {
    sound: &'static str,
}

/// Successful response body.
#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

/// How a single send ended.
enum Attempt {
    Delivered(PushOutcome),
    Rejected(PushOutcome, StatusCode),
    Unreachable(PushOutcome),
}

/// Client for the FCM HTTP v1 API.
#[derive(Debug, Clone)]
pub struct FcmClient {
    http: reqwest::Client,
    send_url: String,
    tokens: Option<Arc<TokenCache>>,
}

impl FcmClient {
    /// Create a client from push configuration.
    pub fn new(config: &PushConfig) -> AppResult<Self> {
        let key = match (&config.credentials_json, &config.credentials_file) {
            (Some(json), _) => Some(ServiceAccountKey::from_json(json)?),
            (None, Some(path)) => Some(ServiceAccountKey::from_file(path)?),
            (None, None) => None,
        };

        let project_id = match key.as_ref().and_then(|k| k.project_id.as_deref()) {
            Some(from_key) if config.project_id.trim().is_empty() => from_key.to_string(),
            _ => config.project_id.trim().to_string(),
        };
        if project_id.is_empty() {
            return Err(AppError::configuration(
                "push.project_id is required for the fcm provider",
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        let tokens = match (key, &config.access_token) {
            (Some(key), _) => Some(TokenCache::new(Box::new(ServiceAccountTokenSource::new(
                key,
                http.clone(),
            )?))),
            (None, Some(token)) => Some(TokenCache::new(Box::new(StaticToken(token.clone())))),
            (None, None) => None,
        };

        Ok(Self {
            http,
            send_url: format!(
                "{}/v1/projects/{project_id}/messages:send",
                config.endpoint.trim_end_matches('/'),
            ),
            tokens: tokens.map(Arc::new),
        })
    }

    /// The URL messages are posted to.
    pub fn send_url(&self) -> &str {
        &self.send_url
    }

    async fn send_one(&self, access_token: &str, message: &PushMessage) -> Attempt {
        let body = request_body(message);
        let token = message.device_token.clone();

        let response = match self
            .http
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Attempt::Unreachable(PushOutcome::rejected(token, format!("transport: {e}")));
            }
        };

        let status = response.status();
        if status.is_success() {
            let message_id = response.json::<SendResponse>().await.ok().map(|r| r.name);
            return Attempt::Delivered(PushOutcome::accepted(token, message_id));
        }

        let detail = response.text().await.unwrap_or_default();
        Attempt::Rejected(
            PushOutcome::rejected(token, format!("{status}: {detail}")),
            status,
        )
    }
}

fn request_body(message: &PushMessage) -> SendRequest<'_> {
    SendRequest {
        message: FcmMessage {
            token: &message.device_token,
            notification: FcmNotification {
                title: &message.title,
                body: &message.body,
            },
            android: AndroidConfig { priority: "high" },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps { sound: "default" },
                },
            },
        },
    }
}

#[async_trait]
impl PushGateway for FcmClient {
    async fn send_batch(&self, messages: &[PushMessage]) -> AppResult<Vec<PushOutcome>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let Some(tokens) = self.tokens.as_ref() else {
            return Err(AppError::external_service(
                "FCM credentials are not configured",
            ));
        };
        let access_token = tokens.token().await?;

        let attempts = join_all(messages.iter().map(|m| self.send_one(&access_token, m))).await;

        let unauthorized = attempts.iter().all(|a| {
            matches!(a, Attempt::Rejected(_, s) if *s == StatusCode::UNAUTHORIZED || *s == StatusCode::FORBIDDEN)
        });
        if unauthorized {
            tokens.invalidate().await;
            return Err(AppError::external_service("FCM rejected the access token"));
        }

        let unreachable = attempts.iter().all(|a| matches!(a, Attempt::Unreachable(_)));
        if unreachable {
            return Err(AppError::external_service(format!(
                "FCM unreachable at {}",
                self.send_url
            )));
        }

        let outcomes: Vec<PushOutcome> = attempts
            .into_iter()
            .map(|attempt| match attempt {
                Attempt::Delivered(outcome) => outcome,
                Attempt::Rejected(outcome, _) | Attempt::Unreachable(outcome) => {
                    warn!(
                        token = %mask_token(&outcome.device_token),
                        error = outcome.error.as_deref().unwrap_or_default(),
                        "FCM did not accept message"
                    );
                    outcome
                }
            })
            .collect();

        debug!(
            sent = outcomes.iter().filter(|o| o.success).count(),
            total = outcomes.len(),
            "FCM batch finished"
        );
        Ok(outcomes)
    }

    fn name(&self) -> &str {
        "fcm"
    }
}
