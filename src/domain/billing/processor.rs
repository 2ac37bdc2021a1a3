//! Payment event processor.
//!
//! Translates verified provider events into entitlement store mutations.
//! Period bounds and status are provider-authoritative: each handled event
//! overwrites them wholesale from the embedded snapshot, which makes
//! redelivery of the same event naturally idempotent.
//!
//! Events that cannot be attributed to an account are acknowledged and
//! flagged as anomalies instead of erroring; the provider retries
//! signature-valid events indefinitely otherwise.

use std::sync::Arc;

use crate::domain::account::{Account, SubscriptionPlan, SubscriptionStatus};
use crate::domain::foundation::{AccountId, CustomerRef, DomainError, SubscriptionRef, Timestamp};
use crate::ports::{AccountCache, AccountRepository, AuditLog, AuditOutcome, AuditRecord};

use super::account_locks::AccountLocks;
use super::payment_event::{InvoiceSnapshot, PaymentEvent, PaymentEventType, SubscriptionSnapshot};

/// What processing a verified event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The account's subscription sub-record was updated.
    Applied {
        account_id: AccountId,
        before: SubscriptionStatus,
        after: SubscriptionStatus,
    },

    /// The event was recognized but intentionally produced no mutation
    /// (payment failures keep the prior status until the provider sends an
    /// explicit subscription-status event).
    NoChange { account_id: AccountId },

    /// Unrecognized event type, acknowledged for forward compatibility.
    Ignored { reason: String },

    /// The event could not be attributed to an account or carried a
    /// malformed object. Acknowledged, flagged for operator review.
    Anomaly { reason: String },
}

/// Translates payment provider events into entitlement mutations.
pub struct PaymentEventProcessor {
    accounts: Arc<dyn AccountRepository>,
    cache: Arc<dyn AccountCache>,
    audit: Arc<dyn AuditLog>,
    locks: AccountLocks,
}

impl PaymentEventProcessor {
    /// Creates a processor sharing `locks` with every other writer of the
    /// account subscription sub-record (the redemption coordinator).
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        cache: Arc<dyn AccountCache>,
        audit: Arc<dyn AuditLog>,
        locks: AccountLocks,
    ) -> Self {
        Self {
            accounts,
            cache,
            audit,
            locks,
        }
    }

    /// Processes one verified event.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures (repository errors) surface; callers
    /// log and still acknowledge them to the provider.
    pub async fn process(&self, event: &PaymentEvent) -> Result<ProcessOutcome, DomainError> {
        let outcome = match event.parsed_type() {
            PaymentEventType::SubscriptionUpdated => self.on_subscription_updated(event).await?,
            PaymentEventType::SubscriptionDeleted => self.on_subscription_deleted(event).await?,
            PaymentEventType::InvoicePaymentSucceeded => self.on_payment_succeeded(event).await?,
            PaymentEventType::InvoicePaymentFailed => self.on_payment_failed(event).await?,
            PaymentEventType::Unknown => {
                let reason = format!("unrecognized event type '{}'", event.event_type);
                tracing::debug!(event_id = %event.id, event_type = %event.event_type, "ignoring event");
                self.audit
                    .record(AuditRecord::payment_event_ignored(&event.event_type, &reason))
                    .await;
                ProcessOutcome::Ignored { reason }
            }
        };
        Ok(outcome)
    }

    async fn on_subscription_updated(
        &self,
        event: &PaymentEvent,
    ) -> Result<ProcessOutcome, DomainError> {
        let snapshot: SubscriptionSnapshot = match event.deserialize_object() {
            Ok(s) => s,
            Err(e) => return Ok(self.malformed(event, e).await),
        };

        let Some(account) = self.resolve(event, &snapshot.customer).await? else {
            return Ok(self.unresolved(event, &snapshot.customer).await);
        };

        let after = SubscriptionStatus::from_provider(&snapshot.status);
        let plan = snapshot.plan.as_deref().and_then(SubscriptionPlan::parse);
        self.apply_snapshot(event, account, |account| {
            account.apply_provider_snapshot(
                after,
                plan,
                SubscriptionRef::new(snapshot.id.clone()).ok(),
                snapshot.current_period_start.map(Timestamp::from_unix_secs),
                snapshot.current_period_end.map(Timestamp::from_unix_secs),
                snapshot.canceled_at.map(Timestamp::from_unix_secs),
            );
        })
        .await
    }

    async fn on_subscription_deleted(
        &self,
        event: &PaymentEvent,
    ) -> Result<ProcessOutcome, DomainError> {
        let snapshot: SubscriptionSnapshot = match event.deserialize_object() {
            Ok(s) => s,
            Err(e) => return Ok(self.malformed(event, e).await),
        };

        let Some(account) = self.resolve(event, &snapshot.customer).await? else {
            return Ok(self.unresolved(event, &snapshot.customer).await);
        };

        self.apply_snapshot(event, account, |account| {
            account.expire_subscription(Timestamp::now());
        })
        .await
    }

    async fn on_payment_succeeded(
        &self,
        event: &PaymentEvent,
    ) -> Result<ProcessOutcome, DomainError> {
        let invoice: InvoiceSnapshot = match event.deserialize_object() {
            Ok(s) => s,
            Err(e) => return Ok(self.malformed(event, e).await),
        };

        let Some(account) = self.resolve(event, &invoice.customer).await? else {
            return Ok(self.unresolved(event, &invoice.customer).await);
        };

        let bounds = invoice.subscription.as_ref().map(|s| {
            (
                s.current_period_start.map(Timestamp::from_unix_secs),
                s.current_period_end.map(Timestamp::from_unix_secs),
            )
        });
        if bounds.is_none() {
            tracing::warn!(
                event_id = %event.id,
                customer = %invoice.customer,
                "invoice without subscription snapshot; activating without period refresh"
            );
        }

        self.apply_snapshot(event, account, |account| {
            let (start, end) = bounds.unwrap_or((None, None));
            account.activate_from_payment(start, end);
        })
        .await
    }

    /// Payment failures keep the prior status. Locking the account out on a
    /// transient card decline would be premature; the provider sends an
    /// explicit subscription-status event when the retries are exhausted.
    async fn on_payment_failed(&self, event: &PaymentEvent) -> Result<ProcessOutcome, DomainError> {
        let invoice: InvoiceSnapshot = match event.deserialize_object() {
            Ok(s) => s,
            Err(e) => return Ok(self.malformed(event, e).await),
        };

        let Some(account) = self.resolve(event, &invoice.customer).await? else {
            return Ok(self.unresolved(event, &invoice.customer).await);
        };

        let status = account.subscription.status;
        tracing::warn!(
            event_id = %event.id,
            account_id = %account.id,
            status = %status,
            "invoice payment failed; no state change"
        );
        self.audit
            .record(AuditRecord::payment_event(
                &event.event_type,
                account.id,
                status,
                status,
                AuditOutcome::Ignored,
            ))
            .await;

        Ok(ProcessOutcome::NoChange { account_id: account.id })
    }

    /// Serializes the mutation per account id, re-reading inside the lock so
    /// overlapping events apply in arrival order.
    async fn apply_snapshot<F>(
        &self,
        event: &PaymentEvent,
        account: Account,
        mutate: F,
    ) -> Result<ProcessOutcome, DomainError>
    where
        F: FnOnce(&mut Account),
    {
        let _guard = self.locks.acquire(account.id).await;

        let mut account = self
            .accounts
            .find_by_id(&account.id)
            .await?
            .unwrap_or(account);
        let before = account.subscription.status;

        mutate(&mut account);
        let after = account.subscription.status;

        let result = self.accounts.update(&account).await;
        let outcome = if result.is_ok() {
            AuditOutcome::Success
        } else {
            AuditOutcome::Failure
        };
        self.audit
            .record(AuditRecord::payment_event(
                &event.event_type,
                account.id,
                before,
                after,
                outcome,
            ))
            .await;
        result?;

        // Cache invalidation is synchronous with the write.
        self.cache.invalidate(&account.external_id).await;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            account_id = %account.id,
            before = %before,
            after = %after,
            "payment event applied"
        );

        Ok(ProcessOutcome::Applied {
            account_id: account.id,
            before,
            after,
        })
    }

    async fn resolve(
        &self,
        event: &PaymentEvent,
        customer: &str,
    ) -> Result<Option<Account>, DomainError> {
        let customer_ref = match CustomerRef::new(customer) {
            Ok(c) => c,
            Err(_) => {
                tracing::warn!(event_id = %event.id, "event carries empty customer reference");
                return Ok(None);
            }
        };
        self.accounts.find_by_customer_ref(&customer_ref).await
    }

    async fn unresolved(&self, event: &PaymentEvent, customer: &str) -> ProcessOutcome {
        let reason = format!("no account mapped to customer '{}'", customer);
        tracing::warn!(
            event_id = %event.id,
            event_type = %event.event_type,
            customer = %customer,
            "payment event for unknown customer"
        );
        self.audit
            .record(AuditRecord::anomaly(
                format!("payment_event.{}", event.event_type),
                &reason,
            ))
            .await;
        ProcessOutcome::Anomaly { reason }
    }

    async fn malformed(&self, event: &PaymentEvent, err: serde_json::Error) -> ProcessOutcome {
        let reason = format!("malformed event object: {}", err);
        tracing::warn!(event_id = %event.id, event_type = %event.event_type, error = %err, "malformed event object");
        self.audit
            .record(AuditRecord::anomaly(
                format!("payment_event.{}", event.event_type),
                &reason,
            ))
            .await;
        ProcessOutcome::Anomaly { reason }
    }
}
