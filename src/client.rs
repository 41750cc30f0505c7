use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    access::{AccessDecision, AccessEvaluator},
    billing::{CheckoutQuote, ChildAccount, Payment},
    config::PlanConfig,
    error::PortalClientError,
    lifecycle::{self, OnboardingProfile, Transition},
    store::StudentStore,
    student::{self, StudentId},
};

/// Handlers behind the student chat screen, the parent dashboard, the
/// onboarding flow and the checkout callback.
///
/// Every call reads a fresh snapshot; nothing is cached between calls.
pub struct PortalClient<S> {
    store: S,
    evaluator: AccessEvaluator,
}

impl<S> PortalClient<S>
where
    S: StudentStore,
{
    pub fn new(store: S, plan: PlanConfig) -> Self {
        Self {
            store,
            evaluator: AccessEvaluator::new(plan),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn plan(&self) -> &PlanConfig {
        self.evaluator.plan()
    }

    pub async fn check_access(
        &self,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision, PortalClientError> {
        let student = self.store.fetch_student(student_id).await?;

        Ok(self.evaluator.evaluate(&student, now))
    }

    pub async fn complete_onboarding<C, I, H>(
        &self,
        student_id: &str,
        career: C,
        hobbies: I,
        now: DateTime<Utc>,
    ) -> Result<Transition, PortalClientError>
    where
        C: AsRef<str>,
        I: IntoIterator<Item = H>,
        H: AsRef<str>,
    {
        let profile = OnboardingProfile::new(career, hobbies)?;
        let student = self.store.fetch_student(student_id).await?;

        let transition =
            lifecycle::apply_onboarding_completion(&student, &profile, now, self.plan());
        if let Transition::Applied(update) = &transition {
            self.store.update_student(student_id, update).await?;
            info!(student_id, "onboarding completed");
        }

        Ok(transition)
    }

    /// Price a checkout for the given `(student id, full name)` pairs.
    pub async fn checkout_quote(
        &self,
        children: &[(&str, &str)],
        now: DateTime<Utc>,
    ) -> Result<CheckoutQuote, PortalClientError> {
        let mut accounts = Vec::with_capacity(children.len());
        for (id, full_name) in children {
            accounts.push(ChildAccount {
                id: id.to_string(),
                full_name: full_name.to_string(),
                subscription: self.store.fetch_student(id).await?,
            });
        }

        Ok(CheckoutQuote::build(&accounts, now, &self.evaluator)?)
    }

    /// Record a checkout result and, if it succeeded, extend every covered
    /// child's pass.
    ///
    /// Each child remembers the last reference applied to it, so a retry
    /// after a partial failure only touches the children that were missed.
    /// The payment is added to the history once every child is updated.
    pub async fn confirm_payment(
        &self,
        parent_id: &str,
        payment: Payment,
    ) -> Result<Vec<StudentId>, PortalClientError> {
        let history = self.store.payments(parent_id).await?;
        let recorded = history
            .iter()
            .any(|p| p.reference == payment.reference && p.status == payment.status);

        if !payment.is_successful() {
            if !recorded {
                self.store.append_payment(parent_id, payment.clone()).await?;
            }
            return Err(PortalClientError::PaymentNotSuccessful {
                reference: payment.reference,
                status: payment.status.to_string(),
            });
        }

        for child_id in &payment.children_covered {
            let student = self.store.fetch_student(child_id).await?;
            if student.last_payment_reference.as_deref() == Some(payment.reference.as_str()) {
                debug!(
                    child_id = %child_id,
                    reference = %payment.reference,
                    "payment already applied"
                );
                continue;
            }

            let mut update =
                lifecycle::apply_payment(&student, payment.date, self.plan().pass_days);
            update.last_payment_reference = Some(payment.reference.clone());
            self.store.update_student(child_id, &update).await?;
        }

        if !recorded {
            self.store.append_payment(parent_id, payment.clone()).await?;
        }
        info!(
            parent_id,
            reference = %payment.reference,
            children = payment.children_covered.len(),
            "payment confirmed"
        );

        Ok(payment.children_covered)
    }

    /// Add chat minutes and return the new total.
    pub async fn record_usage(
        &self,
        student_id: &str,
        minutes: i64,
    ) -> Result<u64, PortalClientError> {
        let student = self.store.fetch_student(student_id).await?;
        let update = student::record_usage(&student, minutes);
        self.store.update_student(student_id, &update).await?;

        Ok(update.total_time_spent.map_or(0, |total| total.max(0) as u64))
    }
}
