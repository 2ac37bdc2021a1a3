//! Account aggregate entity.
//!
//! One account per verified external identity. The subscription sub-record
//! mirrors the payment provider's state; period bounds and status are always
//! overwritten wholesale from provider snapshots, never merged.
//!
//! # Invariants
//!
//! - `trial_ends_at` is set once at creation and never cleared; it is only
//!   consulted while `status` is `Trial`.
//! - Device tokens are deduplicated; reminder times are deduplicated and kept
//!   in chronological order.
//! - Accounts are soft-deactivated, never hard-deleted.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, CustomerRef, ExternalIdentityId, SubscriptionRef, Timestamp};

use super::{DeviceToken, ReminderTime, SubscriptionPlan, SubscriptionStatus};

/// Subscription sub-record of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Current lifecycle status.
    pub status: SubscriptionStatus,

    /// Billing plan, absent until the first checkout.
    pub plan: Option<SubscriptionPlan>,

    /// Payment provider customer reference.
    pub customer_ref: Option<CustomerRef>,

    /// Payment provider subscription reference.
    pub subscription_ref: Option<SubscriptionRef>,

    /// Start of the current billing period (provider-authoritative).
    pub current_period_start: Option<Timestamp>,

    /// End of the current billing period (provider-authoritative).
    pub current_period_end: Option<Timestamp>,

    /// End of the free trial. Set once at account creation.
    pub trial_ends_at: Timestamp,

    /// When cancellation was recorded, if any.
    pub canceled_at: Option<Timestamp>,
}

impl SubscriptionRecord {
    /// Fresh trial record for a new account.
    pub fn trial(trial_ends_at: Timestamp) -> Self {
        Self {
            status: SubscriptionStatus::Trial,
            plan: None,
            customer_ref: None,
            subscription_ref: None,
            current_period_start: None,
            current_period_end: None,
            trial_ends_at,
            canceled_at: None,
        }
    }
}

/// Notification sub-record of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Master switch for push notifications.
    pub enabled: bool,

    /// Times of day the account wants progress reminders, deduplicated and
    /// chronologically ordered.
    pub reminder_times: Vec<ReminderTime>,

    /// Registered device push tokens, deduplicated.
    pub device_tokens: Vec<DeviceToken>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_times: Vec::new(),
            device_tokens: Vec::new(),
        }
    }
}

/// Account aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable internal identifier.
    pub id: AccountId,

    /// External identity-provider id, 1:1 with this account.
    pub external_id: ExternalIdentityId,

    /// Verified email from the identity provider.
    pub email: String,

    /// Display name from the identity provider.
    pub display_name: Option<String>,

    /// Subscription sub-record.
    pub subscription: SubscriptionRecord,

    /// Notification sub-record.
    pub notifications: NotificationSettings,

    /// Soft-deactivation flag. Deactivated accounts are excluded from
    /// reminder selection and entitlement checks.
    pub is_active: bool,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    /// Creates an account from a freshly verified identity.
    ///
    /// New accounts start in trial; `trial_ends_at` is fixed here and never
    /// cleared afterwards.
    pub fn register(
        external_id: ExternalIdentityId,
        email: impl Into<String>,
        display_name: Option<String>,
        trial_days: i64,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: AccountId::new(),
            external_id,
            email: email.into(),
            display_name,
            subscription: SubscriptionRecord::trial(now.add_days(trial_days)),
            notifications: NotificationSettings::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the subscription currently grants access to paid features.
    pub fn has_access(&self, now: Timestamp) -> bool {
        if !self.is_active {
            return false;
        }
        match self.subscription.status {
            SubscriptionStatus::Trial => now <= self.subscription.trial_ends_at,
            SubscriptionStatus::Active => true,
            SubscriptionStatus::Canceled => match self.subscription.current_period_end {
                Some(end) => now <= end,
                None => false,
            },
            SubscriptionStatus::Expired => false,
        }
    }

    /// Overwrites status and period bounds from a provider snapshot.
    ///
    /// Wholesale assignment: applying the same snapshot twice yields the same
    /// state.
    pub fn apply_provider_snapshot(
        &mut self,
        status: SubscriptionStatus,
        plan: Option<SubscriptionPlan>,
        subscription_ref: Option<SubscriptionRef>,
        period_start: Option<Timestamp>,
        period_end: Option<Timestamp>,
        canceled_at: Option<Timestamp>,
    ) {
        self.subscription.status = status;
        if plan.is_some() {
            self.subscription.plan = plan;
        }
        if subscription_ref.is_some() {
            self.subscription.subscription_ref = subscription_ref;
        }
        self.subscription.current_period_start = period_start;
        self.subscription.current_period_end = period_end;
        self.subscription.canceled_at = canceled_at;
        self.updated_at = Timestamp::now();
    }

    /// Forces expiry after the provider deleted the subscription.
    pub fn expire_subscription(&mut self, now: Timestamp) {
        self.subscription.status = SubscriptionStatus::Expired;
        self.subscription.canceled_at = Some(now);
        self.updated_at = now;
    }

    /// Forces active after a successful invoice payment, refreshing period
    /// bounds when the snapshot carries them.
    pub fn activate_from_payment(
        &mut self,
        period_start: Option<Timestamp>,
        period_end: Option<Timestamp>,
    ) {
        self.subscription.status = SubscriptionStatus::Active;
        if period_start.is_some() {
            self.subscription.current_period_start = period_start;
        }
        if period_end.is_some() {
            self.subscription.current_period_end = period_end;
        }
        self.updated_at = Timestamp::now();
    }

    /// Extends the current period by whole calendar months (promo benefit).
    ///
    /// Extends from the current period end, or from now when no period is
    /// set yet (trial accounts redeeming a code).
    pub fn extend_period_months(&mut self, months: u32) {
        let base = self
            .subscription
            .current_period_end
            .unwrap_or_else(Timestamp::now);
        self.subscription.current_period_end = Some(base.add_calendar_months(months));
        self.subscription.status = SubscriptionStatus::Active;
        self.updated_at = Timestamp::now();
    }

    /// Grants a never-expiring entitlement (lifetime promo).
    pub fn grant_lifetime(&mut self) {
        self.subscription.status = SubscriptionStatus::Active;
        self.subscription.current_period_end = Some(Timestamp::far_future());
        self.updated_at = Timestamp::now();
    }

    /// Records the provider customer reference after checkout.
    pub fn link_customer(&mut self, customer_ref: CustomerRef) {
        self.subscription.customer_ref = Some(customer_ref);
        self.updated_at = Timestamp::now();
    }

    /// Whole days left in the trial, rounded up. `None` when not in trial.
    pub fn trial_days_left(&self, now: Timestamp) -> Option<i64> {
        if self.subscription.status != SubscriptionStatus::Trial {
            return None;
        }
        Some(now.days_until_ceil(&self.subscription.trial_ends_at))
    }

    /// Registers a device token, ignoring duplicates.
    pub fn add_device_token(&mut self, token: DeviceToken) {
        if !self.notifications.device_tokens.contains(&token) {
            self.notifications.device_tokens.push(token);
            self.updated_at = Timestamp::now();
        }
    }

    /// Removes a device token if present.
    pub fn remove_device_token(&mut self, token: &DeviceToken) {
        let before = self.notifications.device_tokens.len();
        self.notifications.device_tokens.retain(|t| t != token);
        if self.notifications.device_tokens.len() != before {
            self.updated_at = Timestamp::now();
        }
    }

    /// Replaces reminder-time preferences, deduplicating and sorting.
    pub fn set_reminder_times(&mut self, mut times: Vec<ReminderTime>) {
        times.sort();
        times.dedup();
        self.notifications.reminder_times = times;
        self.updated_at = Timestamp::now();
    }

    /// Whether this account wants a reminder at the given time.
    pub fn wants_reminder_at(&self, time: ReminderTime) -> bool {
        self.notifications.enabled && self.notifications.reminder_times.contains(&time)
    }

    /// Soft-deactivates the account.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Timestamp::now();
    }
}
