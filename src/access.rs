//! Access gating for the tutor chat.
//!
//! The stored `subscriptionStatus` is only a hint: nothing flips it when a
//! trial or Learning Pass runs out, so every decision is recomputed from the
//! snapshot's timestamps and an explicitly supplied `now`.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::{PlanConfig, DEFAULT_PLAN},
    student::{StudentSubscription, SubscriptionStatus},
};

/// Badge text shown to students and parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayStatus {
    PendingOnboarding,
    Trial { days_left: u32 },
    Active,
    Expired,
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingOnboarding => f.write_str("Pending Onboarding"),
            Self::Trial { days_left } => write!(f, "Trial — {days_left} days left"),
            Self::Active => f.write_str("Active — Learning Pass"),
            Self::Expired => f.write_str("Expired — Subscribe to continue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub can_chat: bool,
    /// Status derived from the timestamps, which may differ from the stored one.
    pub effective_status: SubscriptionStatus,
    pub display_status: DisplayStatus,
    /// Whole days left in the current trial or pass, rounded up. Zero otherwise.
    pub days_remaining: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessDecision {
    fn pending() -> Self {
        Self {
            can_chat: false,
            effective_status: SubscriptionStatus::PendingTrial,
            display_status: DisplayStatus::PendingOnboarding,
            days_remaining: 0,
            expires_at: None,
        }
    }

    fn expired() -> Self {
        Self {
            can_chat: false,
            effective_status: SubscriptionStatus::Expired,
            display_status: DisplayStatus::Expired,
            days_remaining: 0,
            expires_at: None,
        }
    }

    fn trial(expiry: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let days_left = days_until(expiry, now);
        Self {
            can_chat: true,
            effective_status: SubscriptionStatus::Trial,
            display_status: DisplayStatus::Trial { days_left },
            days_remaining: days_left,
            expires_at: Some(expiry),
        }
    }

    fn active(expiry: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            can_chat: true,
            effective_status: SubscriptionStatus::Active,
            display_status: DisplayStatus::Active,
            days_remaining: days_until(expiry, now),
            expires_at: Some(expiry),
        }
    }

    /// Whether the parent dashboard should show a payment prompt.
    pub fn needs_payment(&self) -> bool {
        matches!(
            self.effective_status,
            SubscriptionStatus::PendingTrial | SubscriptionStatus::Expired
        )
    }
}

/// Pure evaluator of a student snapshot against a point in time.
#[derive(Debug, Clone, Default)]
pub struct AccessEvaluator {
    plan: PlanConfig,
}

impl AccessEvaluator {
    pub fn new(plan: PlanConfig) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &PlanConfig {
        &self.plan
    }

    pub fn evaluate(&self, student: &StudentSubscription, now: DateTime<Utc>) -> AccessDecision {
        let stored = student.subscription_status;
        let trial_expiry = self.trial_expiry(student);

        let decision = if !student.has_onboarding_profile() {
            if stored != SubscriptionStatus::PendingTrial {
                warn!(%stored, "student has no onboarding profile, treating as pending");
            }
            AccessDecision::pending()
        } else if let Some(expiry) = student.subscription_expiry_date.filter(|e| now < *e) {
            // A paid pass preempts any trial days left over.
            AccessDecision::active(expiry, now)
        } else if let Some(expiry) = trial_expiry.filter(|e| now < *e) {
            AccessDecision::trial(expiry, now)
        } else if student.subscription_expiry_date.is_some()
            || trial_expiry.is_some()
            || stored == SubscriptionStatus::Expired
        {
            AccessDecision::expired()
        } else {
            if stored != SubscriptionStatus::PendingTrial {
                warn!(%stored, "student has no trial or pass dates, treating as pending");
            }
            AccessDecision::pending()
        };

        if decision.effective_status != stored {
            debug!(
                %stored,
                effective = %decision.effective_status,
                "stored subscription status is stale"
            );
        }
        debug!(
            can_chat = decision.can_chat,
            days_remaining = decision.days_remaining,
            "evaluated student access"
        );

        decision
    }

    /// Trial expiry, falling back to start plus the trial length when only
    /// the start was written.
    fn trial_expiry(&self, student: &StudentSubscription) -> Option<DateTime<Utc>> {
        student
            .trial_expiry_date
            .or_else(|| {
                student
                    .trial_start_date
                    .and_then(|start| start.checked_add_signed(self.plan.trial_length()))
            })
    }

    pub fn tally<'a, I>(&self, students: I, now: DateTime<Utc>) -> StatusTally
    where
        I: IntoIterator<Item = &'a StudentSubscription>,
    {
        let mut tally = StatusTally::default();
        for student in students {
            match self.evaluate(student, now).effective_status {
                SubscriptionStatus::PendingTrial => tally.pending_trial += 1,
                SubscriptionStatus::Trial => tally.trial += 1,
                SubscriptionStatus::Active => tally.active += 1,
                SubscriptionStatus::Expired => tally.expired += 1,
            }
        }
        tally
    }
}

/// Evaluate with the default plan.
pub fn evaluate(student: &StudentSubscription, now: DateTime<Utc>) -> AccessDecision {
    AccessEvaluator::new(DEFAULT_PLAN.clone()).evaluate(student, now)
}

/// Per-status counts for the school admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTally {
    pub pending_trial: usize,
    pub trial: usize,
    pub active: usize,
    pub expired: usize,
}

fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let remaining = (expiry - now).num_milliseconds();
    if remaining <= 0 {
        return 0;
    }

    let day = Duration::days(1).num_milliseconds();
    u32::try_from((remaining + day - 1) / day).unwrap_or(u32::MAX)
}
