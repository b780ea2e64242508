use super::{ChannelAdapter, ChannelType};
use crate::{error::DeliveryError, publish::IndexedEvent, settings::WebhookSettings};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    package_key: String,
    event_type: String,
    data: &'a Value,
}

#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(settings: &WebhookSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChannelAdapter for WebhookChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Webhook
    }

    async fn deliver(&self, target: &str, event: &IndexedEvent) -> Result<(), DeliveryError> {
        let payload = WebhookPayload {
            package_key: format!("{:#x}", event.package_key),
            event_type: event.kind.to_string(),
            data: &event.payload,
        };
        let response = self.client.post(target).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::indexed_event;
    use crate::events::EventKind;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn channel() -> WebhookChannel {
        WebhookChannel::new(&WebhookSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn posts_event_as_json() {
        let server = MockServer::start().await;
        let event = indexed_event(EventKind::Revoked, 150);
        Mock::given(method("POST"))
            .and(path("/hooks/vault"))
            .and(body_json(json!({
                "packageKey": format!("{:#x}", event.package_key),
                "eventType": "Revoked",
                "data": {},
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        channel()
            .deliver(&format!("{}/hooks/vault", server.uri()), &event)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = channel()
            .deliver(&server.uri(), &indexed_event(EventKind::CheckIn, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Status(status) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }
}
