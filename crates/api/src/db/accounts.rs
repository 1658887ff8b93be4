//! Account persistence.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use pressly_core::store::{Repository, StoreError};
use pressly_core::{Account, AccountId, InterfaceKind, Role};

use super::{PgStore, backend, non_negative};

#[derive(Debug, FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    role: String,
    order_count: i32,
    interface_preference: Option<String>,
    first_order_at: Option<DateTime<Utc>>,
    last_order_at: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::DataCorruption(format!("account {}: {e}", row.id)))?;
        let interface_preference = row
            .interface_preference
            .as_deref()
            .map(str::parse::<InterfaceKind>)
            .transpose()
            .map_err(|e| StoreError::DataCorruption(format!("account {}: {e}", row.id)))?;

        Ok(Self {
            id: AccountId::new(row.id),
            name: row.name,
            role,
            order_count: non_negative(row.order_count, "order_count")?,
            interface_preference,
            first_order_at: row.first_order_at,
            last_order_at: row.last_order_at,
        })
    }
}

const SELECT_ACCOUNTS: &str = r"
    SELECT id, name, role, order_count, interface_preference, first_order_at, last_order_at
    FROM accounts
";

impl Repository<Account> for PgStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_ACCOUNTS} WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(self.pool())
            .await
            .map_err(backend)?;

        row.map(Account::try_from).transpose()
    }

    async fn put(&self, account: Account) -> Result<(), StoreError> {
        let order_count = i32::try_from(account.order_count).unwrap_or(i32::MAX);

        sqlx::query(
            r"
            INSERT INTO accounts
                (id, name, role, order_count, interface_preference, first_order_at, last_order_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                role = EXCLUDED.role,
                order_count = EXCLUDED.order_count,
                interface_preference = EXCLUDED.interface_preference,
                first_order_at = EXCLUDED.first_order_at,
                last_order_at = EXCLUDED.last_order_at,
                updated_at = NOW()
            ",
        )
        .bind(account.id.as_i64())
        .bind(&account.name)
        .bind(account.role.as_str())
        .bind(order_count)
        .bind(account.interface_preference.map(InterfaceKind::as_str))
        .bind(account.first_order_at)
        .bind(account.last_order_at)
        .execute(self.pool())
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_ACCOUNTS} ORDER BY id"))
            .fetch_all(self.pool())
            .await
            .map_err(backend)?;

        rows.into_iter().map(Account::try_from).collect()
    }
}
