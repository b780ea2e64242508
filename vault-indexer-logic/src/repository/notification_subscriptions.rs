use alloy::primitives::{Address, B256};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use vault_indexer_entity::{
    notification_subscriptions::{ActiveModel, Column, Entity, Model},
    sea_orm_active_enums::DeliveryStatus,
};

pub async fn find_active<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
    package_key: B256,
) -> Result<Vec<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find()
        .filter(Column::ChainId.eq(chain_id))
        .filter(Column::ContractAddress.eq(contract.to_vec()))
        .filter(Column::PackageKey.eq(package_key.to_vec()))
        .filter(Column::Active.eq(true))
        .order_by_asc(Column::Id)
        .all(db)
        .await
}

pub async fn list_for_package<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
    package_key: B256,
) -> Result<Vec<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find()
        .filter(Column::ChainId.eq(chain_id))
        .filter(Column::ContractAddress.eq(contract.to_vec()))
        .filter(Column::PackageKey.eq(package_key.to_vec()))
        .order_by_asc(Column::Id)
        .all(db)
        .await
}

pub async fn find_by_id<C>(db: &C, id: i64) -> Result<Option<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find_by_id(id).one(db).await
}

pub async fn insert<C>(db: &C, subscription: ActiveModel) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    subscription.insert(db).await
}

pub async fn update<C>(db: &C, subscription: ActiveModel) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    subscription.update(db).await
}

pub async fn delete<C>(db: &C, id: i64) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

/// Only the delivery columns are written; subscription settings stay untouched.
pub async fn record_delivery<C>(
    db: &C,
    id: i64,
    status: DeliveryStatus,
    at: NaiveDateTime,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    Entity::update_many()
        .set(ActiveModel {
            last_delivery_attempt: Set(Some(at)),
            last_delivery_status: Set(Some(status)),
            ..Default::default()
        })
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}
