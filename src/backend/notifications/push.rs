/**
 * Push Senders
 *
 * `PushSender` is the push-delivery sink: one alert to one device token.
 * Provider wire formats (APNs, FCM) live behind the HTTP gateway, not here.
 */
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::backend::notifications::NotifyError;
use crate::backend::server::config::{ConfigError, ServerConfig};

/// Alert shown on a device
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    /// Opaque data handed to the app when the alert is opened
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn alert(&self, token: &str, alert: &Alert) -> Result<(), NotifyError>;
}

/// Writes alerts to the log. Default for development.
#[derive(Debug, Clone, Default)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn alert(&self, token: &str, alert: &Alert) -> Result<(), NotifyError> {
        tracing::info!(
            "[Push] {} | {} | {} -> token {}",
            alert.title,
            alert.subtitle,
            alert.body,
            token
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoopPushSender;

#[async_trait]
impl PushSender for NoopPushSender {
    async fn alert(&self, _token: &str, _alert: &Alert) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    token: &'a str,
    #[serde(flatten)]
    alert: &'a Alert,
}

/// Forwards alerts to a push gateway as `POST {token, title, subtitle, body, payload}`
#[derive(Debug, Clone)]
pub struct HttpPushSender {
    client: reqwest::Client,
    gateway_url: String,
}

impl HttpPushSender {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url: gateway_url.into(),
        }
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn alert(&self, token: &str, alert: &Alert) -> Result<(), NotifyError> {
        self.client
            .post(&self.gateway_url)
            .json(&GatewayRequest { token, alert })
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!("[Push] Delivered alert '{}' via gateway", alert.title);
        Ok(())
    }
}

/// Pick the push sender named by `push_provider`
pub fn build_push_sender(config: &ServerConfig) -> Result<Arc<dyn PushSender>, ConfigError> {
    match config.push_provider.as_str() {
        "log" => Ok(Arc::new(LogPushSender)),
        "none" => Ok(Arc::new(NoopPushSender)),
        "http" => {
            let url = config
                .push_gateway_url
                .clone()
                .filter(|url| !url.is_empty())
                .ok_or_else(|| ConfigError::invalid("push_gateway_url", "required when push_provider = \"http\""))?;
            Ok(Arc::new(HttpPushSender::new(url)))
        }
        other => Err(ConfigError::invalid(
            "push_provider",
            format!("unknown provider '{}'", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> Alert {
        Alert {
            title: "New group".to_string(),
            subtitle: "Trip".to_string(),
            body: "Alice added you to Trip".to_string(),
            payload: serde_json::json!({ "type": "createSpendingGroup" }),
        }
    }

    #[test]
    fn test_gateway_request_shape() {
        let alert = alert();
        let json = serde_json::to_value(GatewayRequest { token: "tok", alert: &alert }).unwrap();
        assert_eq!(json["token"], "tok");
        assert_eq!(json["title"], "New group");
        assert_eq!(json["payload"]["type"], "createSpendingGroup");
    }

    #[tokio::test]
    async fn test_log_and_noop_senders_succeed() {
        assert!(LogPushSender.alert("tok", &alert()).await.is_ok());
        assert!(NoopPushSender.alert("tok", &alert()).await.is_ok());
    }

    #[test]
    fn test_build_push_sender() {
        let mut config = ServerConfig::default();
        config.push_provider = "none".to_string();
        assert!(build_push_sender(&config).is_ok());

        config.push_provider = "http".to_string();
        config.push_gateway_url = None;
        assert!(build_push_sender(&config).is_err());

        config.push_gateway_url = Some("http://localhost:9000/push".to_string());
        assert!(build_push_sender(&config).is_ok());

        config.push_provider = "apns".to_string();
        assert!(build_push_sender(&config).is_err());
    }
}
