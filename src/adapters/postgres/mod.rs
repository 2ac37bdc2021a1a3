//! PostgreSQL adapters.
//!
//! sqlx-backed implementations of the persistence ports. The promo ledger's
//! redeem is a single guarded `UPDATE ... RETURNING`, which is what upholds
//! the usage-limit and no-duplicate invariants under concurrent requests.

mod account_repository;
mod progress_log_reader;
mod promo_code_repository;

pub use account_repository::PostgresAccountRepository;
pub use progress_log_reader::PostgresProgressLogReader;
pub use promo_code_repository::PostgresPromoCodeRepository;
