use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type StudentId = String;
pub type ParentId = String;

/// Subscription state as stored on the student document.
///
/// This is a cached hint written by the onboarding and payment flows. Access
/// is always recomputed from the timestamps, see [`crate::access`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    PendingTrial,
    Trial,
    Active,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingTrial => "pending_trial",
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the subscription-related fields of a student document.
///
/// Every field has a default so partially written documents still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentSubscription {
    pub subscription_status: SubscriptionStatus,
    pub trial_start_date: Option<DateTime<Utc>>,
    pub trial_expiry_date: Option<DateTime<Utc>>,
    pub subscription_expiry_date: Option<DateTime<Utc>>,
    /// Minutes spent chatting. Stored as signed so a corrupt negative value
    /// can be read back, see [`StudentSubscription::time_spent_minutes`].
    pub total_time_spent: i64,
    pub career: Option<String>,
    pub hobbies: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
    /// Checkout reference of the last payment applied to this student.
    pub last_payment_reference: Option<String>,
}

impl StudentSubscription {
    /// A freshly enrolled student, as written by the school admin.
    pub fn enrolled() -> Self {
        Self::default()
    }

    /// Whether the career and at least one hobby have been recorded.
    pub fn has_onboarding_profile(&self) -> bool {
        let has_career = self
            .career
            .as_deref()
            .is_some_and(|career| !career.trim().is_empty());
        let has_hobby = self.hobbies.iter().any(|hobby| !hobby.trim().is_empty());

        has_career && has_hobby
    }

    pub fn time_spent_minutes(&self) -> u64 {
        self.total_time_spent.max(0) as u64
    }

    /// Merge an update into this snapshot the way the document store would.
    pub fn apply(&mut self, update: &SubscriptionUpdate) {
        if let Some(status) = update.subscription_status {
            self.subscription_status = status;
        }
        if let Some(start) = update.trial_start_date {
            self.trial_start_date = Some(start);
        }
        if let Some(expiry) = update.trial_expiry_date {
            self.trial_expiry_date = Some(expiry);
        }
        if let Some(expiry) = update.subscription_expiry_date {
            self.subscription_expiry_date = Some(expiry);
        }
        if let Some(total) = update.total_time_spent {
            self.total_time_spent = total;
        }
        if let Some(career) = &update.career {
            self.career = Some(career.clone());
        }
        if let Some(hobbies) = &update.hobbies {
            self.hobbies = hobbies.clone();
        }
        if let Some(reference) = &update.last_payment_reference {
            self.last_payment_reference = Some(reference.clone());
        }
    }
}

/// Fields to persist on a student document. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time_spent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_reference: Option<String>,
}

impl SubscriptionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Add chat minutes to a student's running total.
///
/// Negative reports are ignored so the total never goes down.
pub fn record_usage(student: &StudentSubscription, minutes: i64) -> SubscriptionUpdate {
    let current = student.time_spent_minutes() as i64;
    let total = current.saturating_add(minutes.max(0));

    SubscriptionUpdate {
        total_time_spent: Some(total),
        ..Default::default()
    }
}

/// Render minutes as `"{h}h {m}m"`.
pub fn format_time_spent(minutes: u64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}
