use super::{ChannelAdapter, ChannelType, short_key};
use crate::{error::DeliveryError, publish::IndexedEvent, settings::EmailSettings};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailChannel {
    pub fn new(settings: &EmailSettings) -> Result<Self, DeliveryError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
            .port(settings.smtp_port)
            .timeout(Some(settings.timeout));
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: settings.from.parse()?,
        })
    }

    fn compose(&self, target: &str, event: &IndexedEvent) -> Result<Message, DeliveryError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(target.parse()?)
            .subject(subject(event))
            .header(ContentType::TEXT_PLAIN)
            .body(body(event))?;
        Ok(message)
    }
}

#[async_trait]
impl ChannelAdapter for EmailChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Email
    }

    async fn deliver(&self, target: &str, event: &IndexedEvent) -> Result<(), DeliveryError> {
        let message = self.compose(target, event)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn subject(event: &IndexedEvent) -> String {
    format!("[Arca] {} - Package {}", event.kind, short_key(event))
}

fn body(event: &IndexedEvent) -> String {
    let mut lines = vec![
        format!("Event: {}", event.kind),
        format!("Package: {:#x}", event.package_key),
        format!("Contract: {:#x}", event.contract_address),
        format!("Block: {}", event.block_number),
        format!("Transaction: {:#x}", event.tx_hash),
    ];

    if let Some(fields) = event.payload.as_object().filter(|fields| !fields.is_empty()) {
        lines.push(String::new());
        lines.push("Details:".to_string());
        lines.extend(fields.iter().map(|(name, value)| match value.as_str() {
            Some(value) => format!("  {name}: {value}"),
            None => format!("  {name}: {value}"),
        }));
    }
    lines.join("\n") + "\n"
}
