//! PostgreSQL implementation of PromoCodeRepository.
//!
//! Redemption is one conditional `UPDATE ... RETURNING` carrying every
//! redeemability predicate in its WHERE clause. Concurrent redeemers
//! serialize on the row; whichever statement re-evaluates second sees the
//! incremented counter and falls through to the rejection path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{AccountId, DomainError, ErrorCode, Timestamp};
use crate::domain::promo::{PromoCode, PromoCodeEntry, PromoCodeKind, RedemptionDenied};
use crate::ports::{InsertOutcome, PromoCodeRepository, RedeemOutcome};

/// sqlx-backed promo ledger.
pub struct PostgresPromoCodeRepository {
    pool: PgPool,
}

impl PostgresPromoCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct PromoCodeRow {
    code: String,
    kind: String,
    value: Option<i64>,
    usage_limit: Option<i32>,
    used_count: i32,
    used_by: Vec<Uuid>,
    valid_from: DateTime<Utc>,
    valid_until: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PromoCodeRow> for PromoCodeEntry {
    type Error = DomainError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        let code = PromoCode::try_new(&row.code).map_err(DomainError::from)?;
        let kind = PromoCodeKind::parse(&row.kind)
            .ok_or_else(|| DomainError::database(format!("invalid kind value: {}", row.kind)))?;

        Ok(PromoCodeEntry {
            code,
            kind,
            value: row.value,
            usage_limit: row.usage_limit.map(|l| l as u32),
            used_count: row.used_count as u32,
            used_by: row.used_by.into_iter().map(AccountId::from_uuid).collect(),
            valid_from: Timestamp::from_datetime(row.valid_from),
            valid_until: row.valid_until.map(Timestamp::from_datetime),
            is_active: row.is_active,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT code, kind, value, usage_limit, used_count, used_by, valid_from,
           valid_until, is_active, created_at, updated_at
    FROM promo_codes
"#;

#[async_trait]
impl PromoCodeRepository for PostgresPromoCodeRepository {
    async fn insert(&self, entry: &PromoCodeEntry) -> Result<InsertOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO promo_codes (
                code, kind, value, usage_limit, used_count, used_by,
                valid_from, valid_until, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(entry.code.as_str())
        .bind(entry.kind.as_str())
        .bind(entry.value)
        .bind(entry.usage_limit.map(|l| l as i32))
        .bind(entry.used_count as i32)
        .bind(entry.used_by.iter().map(|a| *a.as_uuid()).collect::<Vec<_>>())
        .bind(entry.valid_from.as_datetime())
        .bind(entry.valid_until.map(|t| *t.as_datetime()))
        .bind(entry.is_active)
        .bind(entry.created_at.as_datetime())
        .bind(entry.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert promo code: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::DuplicateCode)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn find(&self, code: &PromoCode) -> Result<Option<PromoCodeEntry>, DomainError> {
        let row: Option<PromoCodeRow> =
            sqlx::query_as(&format!("{} WHERE code = $1", SELECT_COLUMNS))
                .bind(code.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find promo code: {}", e)))?;

        row.map(PromoCodeEntry::try_from).transpose()
    }

    async fn redeem(
        &self,
        code: &PromoCode,
        account_id: AccountId,
    ) -> Result<RedeemOutcome, DomainError> {
        let row: Option<PromoCodeRow> = sqlx::query_as(
            r#"
            UPDATE promo_codes SET
                used_count = used_count + 1,
                used_by = array_append(used_by, $2),
                updated_at = NOW()
            WHERE code = $1
              AND is_active
              AND valid_from <= NOW()
              AND (valid_until IS NULL OR valid_until >= NOW())
              AND (usage_limit IS NULL OR used_count < usage_limit)
              AND NOT ($2 = ANY(used_by))
            RETURNING code, kind, value, usage_limit, used_count, used_by,
                      valid_from, valid_until, is_active, created_at, updated_at
            "#,
        )
        .bind(code.as_str())
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to redeem promo code: {}", e)))?;

        if let Some(row) = row {
            return Ok(RedeemOutcome::Redeemed(row.try_into()?));
        }

        // The guarded update matched nothing; re-read to name the reason.
        let Some(entry) = self.find(code).await? else {
            return Ok(RedeemOutcome::Rejected(RedemptionDenied::NotFound));
        };
        match entry.check_redeemable(Some(&account_id), Timestamp::now()) {
            Err(reason) => Ok(RedeemOutcome::Rejected(reason)),
            // The entry changed again between the update and this read.
            Ok(()) => Err(DomainError::new(
                ErrorCode::Conflict,
                "redemption raced with a concurrent update; retry",
            )),
        }
    }

    async fn list(&self) -> Result<Vec<PromoCodeEntry>, DomainError> {
        let rows: Vec<PromoCodeRow> =
            sqlx::query_as(&format!("{} ORDER BY created_at DESC", SELECT_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to list promo codes: {}", e)))?;

        rows.into_iter().map(PromoCodeEntry::try_from).collect()
    }

    async fn set_active(&self, code: &PromoCode, active: bool) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE promo_codes SET is_active = $2, updated_at = NOW() WHERE code = $1",
        )
        .bind(code.as_str())
        .bind(active)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update promo code: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
