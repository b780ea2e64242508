//! Subscription management used by the surrounding application.

use super::channels::ChannelType;
use crate::{events::EventKind, repository::notification_subscriptions};
use alloy::primitives::{Address, B256};
use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ConnectionTrait, DbErr, IntoActiveModel,
};
use std::str::FromStr;
use thiserror::Error;
use vault_indexer_entity::notification_subscriptions::{ActiveModel, Model as Subscription};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChannelValidationError {
    #[error("unknown channel type '{0}'")]
    UnknownType(String),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("'{0}' is not a valid http(s) url")]
    InvalidWebhookUrl(String),
    #[error("push token must not be empty")]
    EmptyPushToken,
}

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error(transparent)]
    Validation(#[from] ChannelValidationError),
    #[error("subscription {0} not found")]
    NotFound(i64),
    #[error("db error: {0}")]
    Db(#[from] DbErr),
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub chain_id: i64,
    pub contract_address: Address,
    pub package_key: B256,
    pub subscriber: Address,
    pub channel_type: String,
    pub channel_value: String,
    pub event_types: Vec<EventKind>,
}

/// Fields left as `None` are not changed.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub event_types: Option<Vec<EventKind>>,
    pub channel_value: Option<String>,
    pub active: Option<bool>,
}

pub fn validate_channel(
    channel_type: &str,
    channel_value: &str,
) -> Result<ChannelType, ChannelValidationError> {
    let channel = ChannelType::from_str(channel_type)
        .map_err(|_| ChannelValidationError::UnknownType(channel_type.to_string()))?;

    match channel {
        ChannelType::Email => {
            lettre::Address::from_str(channel_value)
                .map_err(|_| ChannelValidationError::InvalidEmail(channel_value.to_string()))?;
        }
        ChannelType::Webhook => {
            let is_http = url::Url::parse(channel_value)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !is_http {
                return Err(ChannelValidationError::InvalidWebhookUrl(
                    channel_value.to_string(),
                ));
            }
        }
        ChannelType::Push => {
            if channel_value.trim().is_empty() {
                return Err(ChannelValidationError::EmptyPushToken);
            }
        }
    }
    Ok(channel)
}

pub async fn create<C>(db: &C, new: NewSubscription) -> Result<Subscription, SubscriptionError>
where
    C: ConnectionTrait,
{
    let channel = validate_channel(&new.channel_type, &new.channel_value)?;

    let model = ActiveModel {
        id: NotSet,
        chain_id: Set(new.chain_id),
        contract_address: Set(new.contract_address.to_vec()),
        package_key: Set(new.package_key.to_vec()),
        subscriber_address: Set(new.subscriber.to_vec()),
        event_types: Set(event_type_names(&new.event_types)),
        channel_type: Set(channel.to_string()),
        channel_value: Set(new.channel_value),
        active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        last_delivery_attempt: Set(None),
        last_delivery_status: Set(None),
    };
    Ok(notification_subscriptions::insert(db, model).await?)
}

pub async fn update<C>(
    db: &C,
    id: i64,
    update: SubscriptionUpdate,
) -> Result<Subscription, SubscriptionError>
where
    C: ConnectionTrait,
{
    let existing = notification_subscriptions::find_by_id(db, id)
        .await?
        .ok_or(SubscriptionError::NotFound(id))?;

    if let Some(value) = &update.channel_value {
        validate_channel(&existing.channel_type, value)?;
    }

    let mut model = existing.into_active_model();
    if let Some(event_types) = update.event_types {
        model.event_types = Set(event_type_names(&event_types));
    }
    if let Some(value) = update.channel_value {
        model.channel_value = Set(value);
    }
    if let Some(active) = update.active {
        model.active = Set(active);
    }
    Ok(notification_subscriptions::update(db, model).await?)
}

pub async fn delete<C>(db: &C, id: i64) -> Result<(), SubscriptionError>
where
    C: ConnectionTrait,
{
    if !notification_subscriptions::delete(db, id).await? {
        return Err(SubscriptionError::NotFound(id));
    }
    Ok(())
}

pub async fn list<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
    package_key: B256,
) -> Result<Vec<Subscription>, SubscriptionError>
where
    C: ConnectionTrait,
{
    Ok(notification_subscriptions::list_for_package(db, chain_id, contract, package_key).await?)
}

fn event_type_names(kinds: &[EventKind]) -> Vec<String> {
    let mut names: Vec<String> = kinds.iter().map(ToString::to_string).collect();
    names.sort();
    names.dedup();
    names
}
