//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! domain and the outside world. Adapters implement these ports.
//!
//! - `AccountRepository` - entitlement store persistence
//! - `PromoCodeRepository` - promo ledger with the atomic redeem primitive
//! - `ProgressLogReader` - existence of progress entries per calendar day
//! - `PushSender` - push notification dispatch with per-token outcomes
//! - `IdentityProvider` - bearer token verification
//! - `AuditLog` - audit/observability records
//! - `AccountCache` - short-lived read-through account cache

mod account_cache;
mod account_repository;
mod audit_log;
mod identity_provider;
mod progress_log_reader;
mod promo_code_repository;
mod push_sender;

pub use account_cache::AccountCache;
pub use account_repository::AccountRepository;
pub use audit_log::{AuditLog, AuditOutcome, AuditRecord};
pub use identity_provider::{IdentityError, IdentityProvider, VerifiedIdentity};
pub use progress_log_reader::ProgressLogReader;
pub use promo_code_repository::{InsertOutcome, PromoCodeRepository, RedeemOutcome};
pub use push_sender::{MulticastOutcome, PushError, PushMessage, PushSender};
