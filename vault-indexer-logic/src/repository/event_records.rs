use alloy::primitives::{Address, B256};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Select, sea_query::OnConflict,
};
use vault_indexer_entity::event_records::{ActiveModel, Column, Entity, Model};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub chain_id: i64,
    pub contract_address: Address,
    pub package_key: Option<B256>,
}

impl EventFilter {
    fn apply(&self, query: Select<Entity>) -> Select<Entity> {
        let query = query
            .filter(Column::ChainId.eq(self.chain_id))
            .filter(Column::ContractAddress.eq(self.contract_address.to_vec()));
        match self.package_key {
            Some(key) => query.filter(Column::PackageKey.eq(key.to_vec())),
            None => query,
        }
    }
}

pub async fn exists<C>(db: &C, tx_hash: B256, log_index: u64) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let count = Entity::find()
        .filter(Column::TxHash.eq(tx_hash.to_vec()))
        .filter(Column::LogIndex.eq(log_index as i64))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Returns `false` if a record with the same (tx_hash, log_index) already exists.
pub async fn insert<C>(db: &C, record: ActiveModel) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    match Entity::insert(record)
        .on_conflict(
            OnConflict::columns([Column::TxHash, Column::LogIndex])
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await
    {
        Ok(_) => Ok(true),
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(err) => Err(err),
    }
}

pub async fn delete_from<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
    from_block: u64,
) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let res = Entity::delete_many()
        .filter(Column::ChainId.eq(chain_id))
        .filter(Column::ContractAddress.eq(contract.to_vec()))
        .filter(Column::BlockNumber.gte(from_block as i64))
        .exec(db)
        .await?;

    Ok(res.rows_affected)
}

/// Page of records in chain order together with the total number of matching records.
pub async fn list<C>(
    db: &C,
    filter: &EventFilter,
    page: u64,
    page_size: u64,
) -> Result<(Vec<Model>, u64), DbErr>
where
    C: ConnectionTrait,
{
    let paginator = filter
        .apply(Entity::find())
        .order_by_asc(Column::BlockNumber)
        .order_by_asc(Column::LogIndex)
        .paginate(db, page_size);

    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page).await?;
    Ok((items, total))
}

pub async fn count<C>(db: &C, filter: &EventFilter) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    filter.apply(Entity::find()).count(db).await
}
