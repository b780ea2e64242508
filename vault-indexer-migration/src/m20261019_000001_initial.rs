use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TYPE "package_status" AS ENUM (
                'ACTIVE',
                'PENDING_RELEASE',
                'RELEASED',
                'REVOKED'
            );

            CREATE TYPE "delivery_status" AS ENUM (
                'delivered',
                'failed'
            );

            CREATE TABLE "processed_blocks" (
                "chain_id" bigint NOT NULL,
                "contract_address" bytea NOT NULL,
                "block_number" bigint NOT NULL,
                "block_hash" bytea NOT NULL,
                "created_at" timestamp NOT NULL DEFAULT (now()),
                PRIMARY KEY ("chain_id", "contract_address", "block_number")
            );

            CREATE TABLE "event_records" (
                "id" bigserial PRIMARY KEY,
                "chain_id" bigint NOT NULL,
                "contract_address" bytea NOT NULL,
                "package_key" bytea NOT NULL,
                "event_type" text NOT NULL,
                "emitting_address" bytea NOT NULL,
                "block_number" bigint NOT NULL,
                "block_hash" bytea NOT NULL,
                "tx_hash" bytea NOT NULL,
                "log_index" bigint NOT NULL,
                "block_timestamp" timestamp NOT NULL,
                "payload" jsonb NOT NULL,
                "created_at" timestamp NOT NULL DEFAULT (now()),
                CONSTRAINT "event_records_tx_hash_log_index_key" UNIQUE ("tx_hash", "log_index")
            );

            CREATE INDEX "event_records_chain_contract_block_idx"
                ON "event_records" ("chain_id", "contract_address", "block_number", "log_index");

            CREATE INDEX "event_records_package_key_idx"
                ON "event_records" ("chain_id", "contract_address", "package_key", "block_number", "log_index");

            CREATE TABLE "package_projections" (
                "id" bigserial PRIMARY KEY,
                "chain_id" bigint NOT NULL,
                "contract_address" bytea NOT NULL,
                "package_key" bytea NOT NULL,
                "owner_address" bytea,
                "beneficiary_address" bytea,
                "manifest_uri" text,
                "status" package_status NOT NULL,
                "pending_since" timestamp,
                "released_at" timestamp,
                "last_check_in" timestamp,
                "paid_until" timestamp,
                "last_indexed_block" bigint NOT NULL,
                "created_at" timestamp NOT NULL DEFAULT (now()),
                "updated_at" timestamp NOT NULL DEFAULT (now()),
                CONSTRAINT "package_projections_package_key_key" UNIQUE ("chain_id", "contract_address", "package_key")
            );

            CREATE TABLE "package_guardians" (
                "package_projection_id" bigint NOT NULL REFERENCES "package_projections" ("id") ON DELETE CASCADE,
                "position" integer NOT NULL,
                "guardian_address" bytea NOT NULL,
                PRIMARY KEY ("package_projection_id", "position")
            );

            CREATE TABLE "notification_subscriptions" (
                "id" bigserial PRIMARY KEY,
                "chain_id" bigint NOT NULL,
                "contract_address" bytea NOT NULL,
                "package_key" bytea NOT NULL,
                "subscriber_address" bytea NOT NULL,
                "event_types" text[] NOT NULL DEFAULT '{}',
                "channel_type" text NOT NULL,
                "channel_value" text NOT NULL,
                "active" boolean NOT NULL DEFAULT true,
                "created_at" timestamp NOT NULL DEFAULT (now()),
                "last_delivery_attempt" timestamp,
                "last_delivery_status" delivery_status
            );

            CREATE INDEX "notification_subscriptions_package_active_idx"
                ON "notification_subscriptions" ("chain_id", "contract_address", "package_key")
                WHERE "active";
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP TABLE "notification_subscriptions";
            DROP TABLE "package_guardians";
            DROP TABLE "package_projections";
            DROP TABLE "event_records";
            DROP TABLE "processed_blocks";
            DROP TYPE "delivery_status";
            DROP TYPE "package_status";
        "#;
        crate::from_sql(manager, sql).await
    }
}
