//! Parent checkout: which children to charge for, and what gets recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    access::AccessEvaluator,
    error::BillingError,
    student::{StudentId, StudentSubscription, SubscriptionStatus},
};

/// Minor units per major unit (kobo per naira).
pub const MINOR_UNITS: u64 = 100;

#[derive(Debug, Clone)]
pub struct ChildAccount {
    pub id: StudentId,
    pub full_name: String,
    pub subscription: StudentSubscription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub children_covered: Vec<StudentId>,
    pub children_names: Vec<String>,
    /// Total in minor currency units, as the checkout widget expects.
    pub amount: u64,
    pub currency: String,
}

impl CheckoutQuote {
    /// Price the selected children, skipping any whose pass is still running.
    pub fn build(
        children: &[ChildAccount],
        now: DateTime<Utc>,
        evaluator: &AccessEvaluator,
    ) -> Result<Self, BillingError> {
        let billable: Vec<&ChildAccount> = children
            .iter()
            .filter(|child| {
                evaluator.evaluate(&child.subscription, now).effective_status
                    != SubscriptionStatus::Active
            })
            .collect();

        if billable.is_empty() {
            if children.is_empty() {
                return Err(BillingError::NoChildrenSelected);
            }
            let ids = children.iter().map(|c| c.id.clone()).collect();
            return Err(BillingError::AllActive(ids));
        }

        let plan = evaluator.plan();
        let amount = plan.fee_per_child * MINOR_UNITS * billable.len() as u64;

        Ok(Self {
            children_covered: billable.iter().map(|c| c.id.clone()).collect(),
            children_names: billable.iter().map(|c| c.full_name.clone()).collect(),
            amount,
            currency: plan.currency.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Success,
    Failed,
    Pending,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Pending => "pending",
        };
        f.write_str(s)
    }
}

/// Entry in a parent's payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub date: DateTime<Utc>,
    pub amount: u64,
    pub children_covered: Vec<StudentId>,
    pub children_names: Vec<String>,
    pub status: PaymentStatus,
    /// Reference issued by the checkout provider.
    pub reference: String,
}

impl Payment {
    pub fn from_quote(
        quote: &CheckoutQuote,
        reference: impl Into<String>,
        status: PaymentStatus,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            date,
            amount: quote.amount,
            children_covered: quote.children_covered.clone(),
            children_names: quote.children_names.clone(),
            status,
            reference: reference.into(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Success
    }
}
