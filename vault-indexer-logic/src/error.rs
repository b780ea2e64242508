use crate::{events::EventKind, notifications::ChannelType};
use sea_orm::DbErr;
use thiserror::Error;

/// Failure to turn a single log into a domain event. The log is skipped.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("log is missing {0}")]
    IncompleteLog(&'static str),
    #[error("log was removed by the node")]
    RemovedLog,
    #[error("{0} log has no package key topic")]
    MissingPackageKey(EventKind),
    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: EventKind,
        #[source]
        source: alloy::sol_types::Error,
    },
    #[error("{kind}.{field} does not fit into 64 bits")]
    ValueOutOfRange {
        kind: EventKind,
        field: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),
    #[error("rpc call {0} timed out")]
    Timeout(&'static str),
    #[error("block {0} not found")]
    BlockNotFound(u64),
    #[error("malformed log: {0}")]
    MalformedLog(#[from] DecodeError),
}

/// Aborts the current poll cycle. The next cycle retries the same range.
#[derive(Error, Debug)]
pub enum PollError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("db error: {0}")]
    Db(#[from] DbErr),
    #[error("failed to serialize event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build email: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("{0} channel is not implemented")]
    NotImplemented(ChannelType),
}
