use crate::projection::PackageProjection;
use alloy::primitives::{Address, B256};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    prelude::Expr,
    sea_query::OnConflict,
};
use vault_indexer_entity::{package_guardians, package_projections};

pub async fn find<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
    package_key: B256,
) -> Result<Option<PackageProjection>, DbErr>
where
    C: ConnectionTrait,
{
    let Some(model) = package_projections::Entity::find()
        .filter(package_projections::Column::ChainId.eq(chain_id))
        .filter(package_projections::Column::ContractAddress.eq(contract.to_vec()))
        .filter(package_projections::Column::PackageKey.eq(package_key.to_vec()))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let guardians = package_guardians::Entity::find()
        .filter(package_guardians::Column::PackageProjectionId.eq(model.id))
        .order_by_asc(package_guardians::Column::Position)
        .all(db)
        .await?;

    from_models(model, guardians).map(Some)
}

/// Inserts or overwrites the projection row and replaces its guardian set.
pub async fn upsert<C>(db: &C, projection: &PackageProjection) -> Result<i64, DbErr>
where
    C: ConnectionTrait,
{
    let model = package_projections::ActiveModel {
        id: NotSet,
        chain_id: Set(projection.chain_id),
        contract_address: Set(projection.contract_address.to_vec()),
        package_key: Set(projection.package_key.to_vec()),
        owner_address: Set(projection.owner.map(|a| a.to_vec())),
        beneficiary_address: Set(projection.beneficiary.map(|a| a.to_vec())),
        manifest_uri: Set(projection.manifest_uri.clone()),
        status: Set(projection.status),
        pending_since: Set(projection.pending_since),
        released_at: Set(projection.released_at),
        last_check_in: Set(projection.last_check_in),
        paid_until: Set(projection.paid_until),
        last_indexed_block: Set(projection.last_indexed_block as i64),
        created_at: Set(projection.created_at),
        updated_at: Set(projection.updated_at),
    };

    let id = package_projections::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                package_projections::Column::ChainId,
                package_projections::Column::ContractAddress,
                package_projections::Column::PackageKey,
            ])
            .update_columns([
                package_projections::Column::OwnerAddress,
                package_projections::Column::BeneficiaryAddress,
                package_projections::Column::ManifestUri,
                package_projections::Column::Status,
                package_projections::Column::PendingSince,
                package_projections::Column::ReleasedAt,
                package_projections::Column::LastCheckIn,
                package_projections::Column::PaidUntil,
                package_projections::Column::LastIndexedBlock,
                package_projections::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec(db)
        .await?
        .last_insert_id;

    package_guardians::Entity::delete_many()
        .filter(package_guardians::Column::PackageProjectionId.eq(id))
        .exec(db)
        .await?;

    if !projection.guardians.is_empty() {
        let guardians = projection
            .guardians
            .iter()
            .enumerate()
            .map(|(position, guardian)| package_guardians::ActiveModel {
                package_projection_id: Set(id),
                position: Set(position as i32),
                guardian_address: Set(guardian.to_vec()),
            });
        package_guardians::Entity::insert_many(guardians)
            .exec(db)
            .await?;
    }

    Ok(id)
}

/// Lowers `last_indexed_block` of every package that saw events at or above
/// `fork_point`, so canonical events re-indexed after a rewind are not stale.
pub async fn clamp_last_indexed_block<C>(
    db: &C,
    chain_id: i64,
    contract: Address,
    fork_point: u64,
) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let fork_point = fork_point as i64;
    let res = package_projections::Entity::update_many()
        .col_expr(
            package_projections::Column::LastIndexedBlock,
            Expr::value((fork_point - 1).max(0)),
        )
        .filter(package_projections::Column::ChainId.eq(chain_id))
        .filter(package_projections::Column::ContractAddress.eq(contract.to_vec()))
        .filter(package_projections::Column::LastIndexedBlock.gte(fork_point))
        .exec(db)
        .await?;

    Ok(res.rows_affected)
}

fn from_models(
    model: package_projections::Model,
    guardians: Vec<package_guardians::Model>,
) -> Result<PackageProjection, DbErr> {
    Ok(PackageProjection {
        chain_id: model.chain_id,
        contract_address: address(&model.contract_address)?,
        package_key: B256::try_from(model.package_key.as_slice())
            .map_err(|_| DbErr::Custom("invalid package key stored".to_string()))?,
        owner: model.owner_address.as_deref().map(address).transpose()?,
        beneficiary: model.beneficiary_address.as_deref().map(address).transpose()?,
        manifest_uri: model.manifest_uri,
        status: model.status,
        guardians: guardians
            .iter()
            .map(|guardian| address(&guardian.guardian_address))
            .collect::<Result<_, _>>()?,
        pending_since: model.pending_since,
        released_at: model.released_at,
        last_check_in: model.last_check_in,
        paid_until: model.paid_until,
        last_indexed_block: model.last_indexed_block.max(0) as u64,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn address(bytes: &[u8]) -> Result<Address, DbErr> {
    Address::try_from(bytes).map_err(|_| {
        DbErr::Custom(format!("invalid address stored: 0x{}", hex::encode(bytes)))
    })
}
