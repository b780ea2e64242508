pub mod event_records;
pub mod notification_subscriptions;
pub mod package_projections;
pub mod processed_blocks;
