use alloy::primitives::{Address, B256};
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    prelude::Expr, sea_query::OnConflict,
};
use vault_indexer_entity::processed_blocks::{ActiveModel, Column, Entity};

// Keeps a single insert well below the postgres bind parameter limit.
const INSERT_BATCH_SIZE: usize = 5_000;

pub async fn max_block_number<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
) -> Result<Option<u64>, DbErr>
where
    C: ConnectionTrait,
{
    let max = Entity::find()
        .select_only()
        .column_as(Expr::col(Column::BlockNumber).max(), "max_block_number")
        .filter(Column::ChainId.eq(chain_id))
        .filter(Column::ContractAddress.eq(contract.to_vec()))
        .into_tuple::<Option<i64>>()
        .one(db)
        .await?
        .flatten();

    Ok(max.map(|block| block as u64))
}

pub async fn find_hash<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
    block_number: u64,
) -> Result<Option<B256>, DbErr>
where
    C: ConnectionTrait,
{
    let block = Entity::find_by_id((chain_id, contract.to_vec(), block_number as i64))
        .one(db)
        .await?;

    block
        .map(|block| {
            B256::try_from(block.block_hash.as_slice())
                .map_err(|_| DbErr::Custom(format!("invalid hash stored for block {block_number}")))
        })
        .transpose()
}

/// Marks blocks as scanned. Already recorded blocks keep their stored hash.
pub async fn insert_many<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
    blocks: impl IntoIterator<Item = (u64, B256)>,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let models: Vec<ActiveModel> = blocks
        .into_iter()
        .map(|(number, hash)| ActiveModel {
            chain_id: Set(chain_id),
            contract_address: Set(contract.to_vec()),
            block_number: Set(number as i64),
            block_hash: Set(hash.to_vec()),
            created_at: Set(now),
        })
        .collect();

    for chunk in models.chunks(INSERT_BATCH_SIZE) {
        match Entity::insert_many(chunk.to_vec())
            .on_conflict(
                OnConflict::columns([
                    Column::ChainId,
                    Column::ContractAddress,
                    Column::BlockNumber,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(err) => return Err(err),
        }
    }

    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CHAIN_ID, CONTRACT, init_db};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn ledger_tracks_max_block_and_hashes() {
        let guard = init_db("processed_blocks_ledger_tracks_max_block").await;
        let db = guard.client();

        assert_eq!(max_block_number(db.as_ref(), CHAIN_ID, CONTRACT).await.unwrap(), None);

        insert_many(
            db.as_ref(),
            CHAIN_ID,
            CONTRACT,
            (10..=12).map(|n| (n, B256::repeat_byte(n as u8))),
        )
        .await
        .unwrap();
        // conflicting rows are ignored
        insert_many(db.as_ref(), CHAIN_ID, CONTRACT, [(12, B256::repeat_byte(0xff))])
            .await
            .unwrap();

        assert_eq!(
            max_block_number(db.as_ref(), CHAIN_ID, CONTRACT).await.unwrap(),
            Some(12)
        );
        assert_eq!(
            find_hash(db.as_ref(), CHAIN_ID, CONTRACT, 12).await.unwrap(),
            Some(B256::repeat_byte(12))
        );
        assert_eq!(
            max_block_number(db.as_ref(), CHAIN_ID + 1, CONTRACT).await.unwrap(),
            None
        );

        let deleted = delete_from(db.as_ref(), CHAIN_ID, CONTRACT, 11).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(
            max_block_number(db.as_ref(), CHAIN_ID, CONTRACT).await.unwrap(),
            Some(10)
        );
    }
}
