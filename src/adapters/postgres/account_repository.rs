//! PostgreSQL implementation of AccountRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::{
    Account, DeviceToken, NotificationSettings, ReminderTime, SubscriptionPlan, SubscriptionRecord,
    SubscriptionStatus,
};
use crate::domain::foundation::{
    AccountId, CustomerRef, DomainError, ErrorCode, ExternalIdentityId, SubscriptionRef, Timestamp,
};
use crate::ports::AccountRepository;

/// sqlx-backed account store.
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an account.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    external_id: String,
    email: String,
    display_name: Option<String>,
    status: String,
    plan: Option<String>,
    customer_ref: Option<String>,
    subscription_ref: Option<String>,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    trial_ends_at: DateTime<Utc>,
    canceled_at: Option<DateTime<Utc>>,
    notifications_enabled: bool,
    reminder_times: Vec<String>,
    device_tokens: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = DomainError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::parse(&row.status).ok_or_else(|| {
            DomainError::database(format!("invalid status value: {}", row.status))
        })?;
        let plan = row
            .plan
            .as_deref()
            .map(|p| {
                SubscriptionPlan::parse(p)
                    .ok_or_else(|| DomainError::database(format!("invalid plan value: {}", p)))
            })
            .transpose()?;
        let reminder_times = row
            .reminder_times
            .iter()
            .map(|t| ReminderTime::parse(t).map_err(DomainError::from))
            .collect::<Result<Vec<_>, _>>()?;
        let device_tokens = row
            .device_tokens
            .iter()
            .map(|t| DeviceToken::new(t.clone()).map_err(DomainError::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Account {
            id: AccountId::from_uuid(row.id),
            external_id: ExternalIdentityId::new(row.external_id)
                .map_err(DomainError::from)?,
            email: row.email,
            display_name: row.display_name,
            subscription: SubscriptionRecord {
                status,
                plan,
                customer_ref: row
                    .customer_ref
                    .map(CustomerRef::new)
                    .transpose()
                    .map_err(DomainError::from)?,
                subscription_ref: row
                    .subscription_ref
                    .map(SubscriptionRef::new)
                    .transpose()
                    .map_err(DomainError::from)?,
                current_period_start: row.current_period_start.map(Timestamp::from_datetime),
                current_period_end: row.current_period_end.map(Timestamp::from_datetime),
                trial_ends_at: Timestamp::from_datetime(row.trial_ends_at),
                canceled_at: row.canceled_at.map(Timestamp::from_datetime),
            },
            notifications: NotificationSettings {
                enabled: row.notifications_enabled,
                reminder_times,
                device_tokens,
            },
            is_active: row.is_active,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, external_id, email, display_name, status, plan, customer_ref,
           subscription_ref, current_period_start, current_period_end,
           trial_ends_at, canceled_at, notifications_enabled, reminder_times,
           device_tokens, is_active, created_at, updated_at
    FROM accounts
"#;

fn reminder_times_strings(account: &Account) -> Vec<String> {
    account
        .notifications
        .reminder_times
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn device_token_strings(account: &Account) -> Vec<String> {
    account
        .notifications
        .device_tokens
        .iter()
        .map(|t| t.as_str().to_string())
        .collect()
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, external_id, email, display_name, status, plan, customer_ref,
                subscription_ref, current_period_start, current_period_end,
                trial_ends_at, canceled_at, notifications_enabled, reminder_times,
                device_tokens, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.external_id.as_str())
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(account.subscription.status.as_str())
        .bind(account.subscription.plan.map(|p| p.as_str()))
        .bind(account.subscription.customer_ref.as_ref().map(|c| c.as_str()))
        .bind(account.subscription.subscription_ref.as_ref().map(|s| s.as_str()))
        .bind(account.subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(account.subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(account.subscription.trial_ends_at.as_datetime())
        .bind(account.subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(account.notifications.enabled)
        .bind(reminder_times_strings(account))
        .bind(device_token_strings(account))
        .bind(account.is_active)
        .bind(account.created_at.as_datetime())
        .bind(account.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("accounts_external_id_key") {
                    return DomainError::new(
                        ErrorCode::Conflict,
                        "Account already exists for this identity",
                    );
                }
            }
            DomainError::database(format!("Failed to create account: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                email = $2,
                display_name = $3,
                status = $4,
                plan = $5,
                customer_ref = $6,
                subscription_ref = $7,
                current_period_start = $8,
                current_period_end = $9,
                canceled_at = $10,
                notifications_enabled = $11,
                reminder_times = $12,
                device_tokens = $13,
                is_active = $14,
                updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(account.subscription.status.as_str())
        .bind(account.subscription.plan.map(|p| p.as_str()))
        .bind(account.subscription.customer_ref.as_ref().map(|c| c.as_str()))
        .bind(account.subscription.subscription_ref.as_ref().map(|s| s.as_str()))
        .bind(account.subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(account.subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(account.subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(account.notifications.enabled)
        .bind(reminder_times_strings(account))
        .bind(device_token_strings(account))
        .bind(account.is_active)
        .bind(account.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update account: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::AccountNotFound,
                "Account not found",
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find account: {}", e)))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalIdentityId,
    ) -> Result<Option<Account>, DomainError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE external_id = $1", SELECT_COLUMNS))
                .bind(external_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find account: {}", e)))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_customer_ref(
        &self,
        customer_ref: &CustomerRef,
    ) -> Result<Option<Account>, DomainError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE customer_ref = $1", SELECT_COLUMNS))
                .bind(customer_ref.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find account: {}", e)))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_reminder_candidates(
        &self,
        time: ReminderTime,
    ) -> Result<Vec<Account>, DomainError> {
        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            r#"{}
            WHERE is_active
              AND notifications_enabled
              AND $1 = ANY(reminder_times)
              AND cardinality(device_tokens) > 0
            "#,
            SELECT_COLUMNS
        ))
        .bind(time.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to load reminder candidates: {}", e))
        })?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn find_trials_ending_between(
        &self,
        now: Timestamp,
        cutoff: Timestamp,
    ) -> Result<Vec<Account>, DomainError> {
        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            r#"{}
            WHERE is_active
              AND status = 'trial'
              AND trial_ends_at >= $1
              AND trial_ends_at <= $2
            "#,
            SELECT_COLUMNS
        ))
        .bind(now.as_datetime())
        .bind(cutoff.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load ending trials: {}", e)))?;

        rows.into_iter().map(Account::try_from).collect()
    }
}
