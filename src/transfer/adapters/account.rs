//! Account Store Adapter
//!
//! PostgreSQL point lookup of an account's lifecycle status.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, error, info};

use super::AccountGateway;
use crate::transfer::error::TransferError;
use crate::transfer::types::{Account, LifecycleStatus};

const ACCOUNT_QUERY: &str =
    "SELECT account_no, lifecycle_status_cd FROM account WHERE account_no = $1";

pub struct PgAccountGateway {
    pool: PgPool,
}

impl PgAccountGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a connection pool against the account store
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }
}

#[async_trait]
impl AccountGateway for PgAccountGateway {
    async fn fetch(&self, account_number: &str) -> Result<Account, TransferError> {
        debug!(account = account_number, "Account lookup");

        let row: Option<(String, String)> = sqlx::query_as(ACCOUNT_QUERY)
            .bind(account_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(account = account_number, error = %e, "Account lookup failed");
                TransferError::AccountLookup {
                    account: account_number.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let (account_no, status_code) = row.ok_or_else(|| TransferError::AccountLookup {
            account: account_number.to_string(),
            reason: "account not found".to_string(),
        })?;

        let account = Account::new(account_no.trim(), LifecycleStatus::from_code(&status_code));
        debug!(
            account = %account.account_number,
            status = %account.lifecycle_status,
            "Account found"
        );
        Ok(account)
    }
}
