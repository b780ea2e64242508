use alloy::primitives::{Address, keccak256};
use sea_orm::{
    DatabaseConnection,
    sqlx::{self, Postgres, pool::PoolConnection},
};

/// Session level advisory lock that lets a single replica run the poller.
///
/// The lock lives as long as the dedicated connection it was taken on. It is
/// only attempted at startup, so if the holder dies no other running replica
/// takes over until it is restarted.
pub struct PollerLock {
    conn: PoolConnection<Postgres>,
    key: i64,
}

impl PollerLock {
    pub async fn try_acquire(db: &DatabaseConnection, key: i64) -> Result<Option<Self>, sqlx::Error> {
        let mut conn = db.get_postgres_connection_pool().acquire().await?;
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(key)
            .fetch_one(&mut *conn)
            .await?;

        Ok(acquired.then_some(Self { conn, key }))
    }

    pub fn key(&self) -> i64 {
        self.key
    }

    pub async fn release(mut self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(self.key)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}

/// Lock key for a monitored contract: `configured` if set, otherwise the first
/// eight bytes of keccak256 over the lowercase hex address.
pub fn lock_key(contract: &Address, configured: Option<i64>) -> i64 {
    configured.unwrap_or_else(|| {
        let digest = keccak256(format!("{contract:#x}").as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        i64::from_be_bytes(prefix)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_db;
    use alloy::primitives::address;
    use pretty_assertions::assert_eq;

    #[test]
    fn lock_key_is_deterministic_and_case_insensitive() {
        let lower = address!("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
        let key = lock_key(&lower, None);
        assert_eq!(key, lock_key(&lower, None));
        assert_eq!(
            key,
            lock_key(&"0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD".parse().unwrap(), None)
        );
        assert_ne!(key, lock_key(&Address::repeat_byte(0x01), None));
    }

    #[test]
    fn configured_lock_id_wins() {
        assert_eq!(lock_key(&Address::repeat_byte(0x01), Some(42)), 42);
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn second_holder_is_rejected_until_release() {
        let guard = init_db("lock_second_holder_is_rejected").await;
        let db = guard.client();

        let first = PollerLock::try_acquire(db.as_ref(), 7)
            .await
            .unwrap()
            .expect("first acquisition succeeds");
        assert!(PollerLock::try_acquire(db.as_ref(), 7).await.unwrap().is_none());

        first.release().await.unwrap();
        assert!(PollerLock::try_acquire(db.as_ref(), 7).await.unwrap().is_some());
    }
}
