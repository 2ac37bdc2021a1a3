//! Bulk promo code generation.
//!
//! Produces batches of codes sharing a kind, value, and prefix. Uniqueness
//! is established against the ledger itself: each candidate insert either
//! lands or reports a duplicate, in which case a fresh suffix is drawn, up
//! to a fixed ceiling. Exhausting the ceiling fails that one code, not the
//! batch.

use std::sync::Arc;

use rand::Rng;

use crate::domain::foundation::{DomainError, Timestamp, ValidationError};
use crate::ports::{InsertOutcome, PromoCodeRepository};

use super::code::PromoCode;
use super::entry::{PromoCodeEntry, PromoCodeKind};

/// Collision retries per code before giving up on it.
const MAX_COLLISION_ATTEMPTS: u32 = 5;

/// Random suffix length appended to the shared prefix.
const SUFFIX_LEN: usize = 6;

/// Suffix alphabet. Excludes 0/O/1/I so codes survive being read aloud.
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Parameters shared by every code in a batch.
#[derive(Debug, Clone)]
pub struct BatchSpec {
    pub count: u32,
    pub kind: PromoCodeKind,
    pub value: Option<i64>,
    pub prefix: String,
    pub usage_limit: Option<u32>,
    pub valid_from: Timestamp,
    pub valid_until: Option<Timestamp>,
}

/// Outcome of a batch run.
#[derive(Debug, Clone)]
pub struct BulkGenerationReport {
    /// Successfully inserted entries.
    pub created: Vec<PromoCodeEntry>,

    /// Codes abandoned after exhausting collision retries.
    pub collision_failures: u32,
}

/// Generates batches of unique codes against the ledger.
pub struct PromoCodeGenerator {
    ledger: Arc<dyn PromoCodeRepository>,
}

impl PromoCodeGenerator {
    pub fn new(ledger: Arc<dyn PromoCodeRepository>) -> Self {
        Self { ledger }
    }

    /// Generates `spec.count` codes.
    ///
    /// # Errors
    ///
    /// Fails the whole batch only for invalid parameters (bad prefix, bad
    /// kind/value pairing) or storage errors. Per-code collision exhaustion
    /// is reported in the result, not as an error.
    pub async fn generate_batch(
        &self,
        spec: &BatchSpec,
    ) -> Result<BulkGenerationReport, DomainError> {
        validate_prefix(&spec.prefix)?;

        let mut created = Vec::with_capacity(spec.count as usize);
        let mut collision_failures = 0u32;

        for _ in 0..spec.count {
            match self.generate_one(spec).await? {
                Some(entry) => created.push(entry),
                None => {
                    collision_failures += 1;
                    tracing::error!(
                        prefix = %spec.prefix,
                        attempts = MAX_COLLISION_ATTEMPTS,
                        "gave up generating a unique code"
                    );
                }
            }
        }

        tracing::info!(
            prefix = %spec.prefix,
            requested = spec.count,
            created = created.len(),
            collision_failures,
            "bulk promo generation finished"
        );

        Ok(BulkGenerationReport {
            created,
            collision_failures,
        })
    }

    async fn generate_one(&self, spec: &BatchSpec) -> Result<Option<PromoCodeEntry>, DomainError> {
        for _ in 0..MAX_COLLISION_ATTEMPTS {
            let code = PromoCode::try_new(&format!("{}{}", spec.prefix, random_suffix()))?;
            let entry = PromoCodeEntry::new(
                code,
                spec.kind,
                spec.value,
                spec.usage_limit,
                spec.valid_from,
                spec.valid_until,
            )?;

            match self.ledger.insert(&entry).await? {
                InsertOutcome::Inserted => return Ok(Some(entry)),
                InsertOutcome::DuplicateCode => continue,
            }
        }
        Ok(None)
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.len() + SUFFIX_LEN > 20 {
        return Err(ValidationError::out_of_range(
            "prefix_length",
            0,
            (20 - SUFFIX_LEN) as i64,
            prefix.len() as i64,
        ));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::invalid_format(
            "prefix",
            "alphanumeric characters only",
        ));
    }
    Ok(())
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_CHARSET.len());
            SUFFIX_CHARSET[idx] as char
        })
        .collect()
}
