//! Onboarding and payment transitions.
//!
//! Both functions compute the fields to persist and leave the write to the
//! caller. Neither fails: a transition that does not apply comes back as
//! [`Transition::Unchanged`] so a retried submission is harmless.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::{
    config::PlanConfig,
    error::OnboardingError,
    student::{StudentSubscription, SubscriptionStatus, SubscriptionUpdate},
};

pub const MAX_HOBBIES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied(SubscriptionUpdate),
    Unchanged,
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn update(&self) -> Option<&SubscriptionUpdate> {
        match self {
            Self::Applied(update) => Some(update),
            Self::Unchanged => None,
        }
    }
}

/// A validated onboarding form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingProfile {
    career: String,
    hobbies: Vec<String>,
}

impl OnboardingProfile {
    pub fn new<S, I, H>(career: S, hobbies: I) -> Result<Self, OnboardingError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = H>,
        H: AsRef<str>,
    {
        let career = career.as_ref().trim();
        if career.is_empty() {
            return Err(OnboardingError::MissingCareer);
        }

        let mut selected: Vec<String> = Vec::new();
        for hobby in hobbies {
            let hobby = hobby.as_ref().trim();
            if !hobby.is_empty() && !selected.iter().any(|h| h == hobby) {
                selected.push(hobby.to_string());
            }
        }

        match selected.len() {
            0 => Err(OnboardingError::MissingHobbies),
            n if n > MAX_HOBBIES => Err(OnboardingError::TooManyHobbies {
                max: MAX_HOBBIES,
                got: n,
            }),
            _ => Ok(Self {
                career: career.to_string(),
                hobbies: selected,
            }),
        }
    }

    pub fn career(&self) -> &str {
        &self.career
    }

    pub fn hobbies(&self) -> &[String] {
        &self.hobbies
    }
}

/// Record the onboarding profile and start the free trial.
///
/// The stored status is not trusted here: a student counts as onboarded once
/// the profile exists alongside a trial start or a pass. A student whose
/// parent paid first, or whose trial start was already written, only gets
/// the profile; existing trial and pass dates are left alone. Anyone already
/// onboarded is left unchanged.
pub fn apply_onboarding_completion(
    student: &StudentSubscription,
    profile: &OnboardingProfile,
    now: DateTime<Utc>,
    plan: &PlanConfig,
) -> Transition {
    let has_dates =
        student.trial_start_date.is_some() || student.subscription_expiry_date.is_some();
    if student.has_onboarding_profile() && has_dates {
        debug!(
            status = %student.subscription_status,
            "onboarding already completed, ignoring"
        );
        return Transition::Unchanged;
    }

    let profile_only = SubscriptionUpdate {
        career: Some(profile.career.clone()),
        hobbies: Some(profile.hobbies.clone()),
        ..Default::default()
    };
    if has_dates {
        info!(
            status = %student.subscription_status,
            "saving onboarding profile, keeping existing dates"
        );
        return Transition::Applied(profile_only);
    }

    let Some(expiry) = now.checked_add_signed(plan.trial_length()) else {
        warn!(%now, "trial expiry out of range, not starting trial");
        return Transition::Unchanged;
    };
    info!(trial_expiry = %expiry, "starting free trial");

    Transition::Applied(SubscriptionUpdate {
        subscription_status: Some(SubscriptionStatus::Trial),
        trial_start_date: Some(now),
        trial_expiry_date: Some(expiry),
        ..profile_only
    })
}

/// Grant or extend the Learning Pass after a confirmed payment.
///
/// Extends from the later of `paid_at` and the current pass expiry, so
/// renewing early never loses days.
pub fn apply_payment(
    student: &StudentSubscription,
    paid_at: DateTime<Utc>,
    duration_days: u32,
) -> SubscriptionUpdate {
    let base = student
        .subscription_expiry_date
        .map_or(paid_at, |current| current.max(paid_at));
    let expiry = base
        .checked_add_signed(Duration::days(i64::from(duration_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    info!(
        previous = ?student.subscription_expiry_date,
        subscription_expiry = %expiry,
        "applying payment"
    );

    SubscriptionUpdate {
        subscription_status: Some(SubscriptionStatus::Active),
        subscription_expiry_date: Some(expiry),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::access::evaluate;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    fn profile() -> OnboardingProfile {
        OnboardingProfile::new("Doctor", ["Singing", "Reading stories"]).unwrap()
    }

    #[test]
    fn test_profile_validation() {
        assert_eq!(
            Err(OnboardingError::MissingCareer),
            OnboardingProfile::new("  ", ["Singing"])
        );
        assert_eq!(
            Err(OnboardingError::MissingHobbies),
            OnboardingProfile::new("Chef", Vec::<String>::new())
        );
        assert_eq!(
            Err(OnboardingError::TooManyHobbies { max: 3, got: 4 }),
            OnboardingProfile::new("Chef", ["Cooking", "Dancing", "Swimming", "Singing"])
        );
    }

    #[test]
    fn test_profile_drops_blank_and_duplicate_hobbies() {
        let profile =
            OnboardingProfile::new(" Pilot ", ["Swimming", "", "Swimming", "Cooking"]).unwrap();

        assert_eq!("Pilot", profile.career());
        assert_eq!(&["Swimming".to_string(), "Cooking".to_string()], profile.hobbies());
    }

    #[test]
    fn test_onboarding_starts_trial() {
        let student = StudentSubscription::enrolled();

        let transition =
            apply_onboarding_completion(&student, &profile(), t0(), &PlanConfig::default());
        let update = transition.update().unwrap();

        assert_eq!(Some(SubscriptionStatus::Trial), update.subscription_status);
        assert_eq!(Some(t0()), update.trial_start_date);
        assert_eq!(Some(t0() + Duration::days(7)), update.trial_expiry_date);
        assert_eq!(Some("Doctor".to_string()), update.career);
    }

    #[test]
    fn test_onboarding_is_idempotent() {
        let plan = PlanConfig::default();
        let mut student = StudentSubscription::enrolled();

        let first = apply_onboarding_completion(&student, &profile(), t0(), &plan);
        student.apply(first.update().unwrap());
        let once = student.clone();

        let second =
            apply_onboarding_completion(&student, &profile(), t0() + Duration::hours(1), &plan);

        assert_eq!(Transition::Unchanged, second);
        assert_eq!(once, student);
    }

    #[test]
    fn test_onboarding_keeps_existing_trial_dates() {
        let student = StudentSubscription {
            subscription_status: SubscriptionStatus::Trial,
            trial_start_date: Some(t0()),
            trial_expiry_date: Some(t0() + Duration::days(7)),
            ..Default::default()
        };

        let transition = apply_onboarding_completion(
            &student,
            &profile(),
            t0() + Duration::days(3),
            &PlanConfig::default(),
        );
        let update = transition.update().unwrap();

        assert_eq!(Some("Doctor".to_string()), update.career);
        assert_eq!(None, update.trial_start_date);
        assert_eq!(None, update.trial_expiry_date);
        assert_eq!(None, update.subscription_status);
    }

    #[test]
    fn test_onboarding_after_payment_keeps_pass() {
        let plan = PlanConfig::default();
        let mut student = StudentSubscription::enrolled();
        student.apply(&apply_payment(&student, t0(), plan.pass_days));

        let transition =
            apply_onboarding_completion(&student, &profile(), t0() + Duration::days(1), &plan);
        let update = transition.update().unwrap();
        assert_eq!(None, update.subscription_status);
        assert_eq!(None, update.subscription_expiry_date);
        assert_eq!(None, update.trial_start_date);

        student.apply(update);
        let decision = evaluate(&student, t0() + Duration::days(1));
        assert!(decision.can_chat);
        assert_eq!(SubscriptionStatus::Active, decision.effective_status);

        let retry = apply_onboarding_completion(&student, &profile(), t0(), &plan);
        assert_eq!(Transition::Unchanged, retry);
    }

    #[test]
    fn test_onboarding_ignores_stale_status_without_profile() {
        let student = StudentSubscription {
            subscription_status: SubscriptionStatus::Expired,
            ..Default::default()
        };

        let transition =
            apply_onboarding_completion(&student, &profile(), t0(), &PlanConfig::default());

        assert_eq!(
            Some(SubscriptionStatus::Trial),
            transition.update().unwrap().subscription_status
        );
    }

    #[test]
    fn test_onboarding_near_max_date_is_unchanged() {
        let now = DateTime::<Utc>::MAX_UTC - Duration::days(1);

        let transition = apply_onboarding_completion(
            &StudentSubscription::enrolled(),
            &profile(),
            now,
            &PlanConfig::default(),
        );

        assert_eq!(Transition::Unchanged, transition);
    }

    #[test]
    fn test_payment_near_max_date_saturates() {
        let student = StudentSubscription {
            subscription_expiry_date: Some(DateTime::<Utc>::MAX_UTC - Duration::days(10)),
            ..Default::default()
        };

        let update = apply_payment(&student, t0(), 90);

        assert_eq!(Some(DateTime::<Utc>::MAX_UTC), update.subscription_expiry_date);
    }

    #[test]
    fn test_payment_on_expired_student() {
        let mut student = StudentSubscription {
            subscription_status: SubscriptionStatus::Expired,
            trial_start_date: Some(t0()),
            trial_expiry_date: Some(t0() + Duration::days(7)),
            career: Some("Lawyer".into()),
            hobbies: vec!["Solving puzzles".into()],
            ..Default::default()
        };

        let t1 = t0() + Duration::days(20);
        assert!(!evaluate(&student, t1).can_chat);

        student.apply(&apply_payment(&student, t1, 90));

        assert!(evaluate(&student, t1 + Duration::days(1)).can_chat);
        assert!(!evaluate(&student, t1 + Duration::days(91)).can_chat);
    }

    #[test]
    fn test_payment_during_trial_preempts_it() {
        let plan = PlanConfig::default();
        let mut student = StudentSubscription::enrolled();
        student.apply(
            apply_onboarding_completion(&student, &profile(), t0(), &plan)
                .update()
                .unwrap(),
        );

        let paid_at = t0() + Duration::days(2);
        let update = apply_payment(&student, paid_at, plan.pass_days);

        assert_eq!(Some(paid_at + Duration::days(90)), update.subscription_expiry_date);
        assert_eq!(Some(SubscriptionStatus::Active), update.subscription_status);

        student.apply(&update);
        assert_eq!(
            SubscriptionStatus::Active,
            evaluate(&student, paid_at).effective_status
        );
    }

    #[test]
    fn test_early_renewal_extends_from_current_expiry() {
        let current = t0() + Duration::days(30);
        let student = StudentSubscription {
            subscription_status: SubscriptionStatus::Active,
            subscription_expiry_date: Some(current),
            ..Default::default()
        };

        let update = apply_payment(&student, t0(), 90);

        assert_eq!(Some(current + Duration::days(90)), update.subscription_expiry_date);
    }

    #[test]
    fn test_late_renewal_extends_from_payment() {
        let student = StudentSubscription {
            subscription_status: SubscriptionStatus::Expired,
            subscription_expiry_date: Some(t0() - Duration::days(5)),
            ..Default::default()
        };

        let update = apply_payment(&student, t0(), 90);

        assert_eq!(Some(t0() + Duration::days(90)), update.subscription_expiry_date);
    }
}
