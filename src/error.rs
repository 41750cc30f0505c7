use thiserror::Error;

use crate::student::{ParentId, StudentId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OnboardingError {
    #[error("A career must be selected")]
    MissingCareer,

    #[error("At least one hobby must be selected")]
    MissingHobbies,

    #[error("At most {max} hobbies may be selected, got {got}")]
    TooManyHobbies { max: usize, got: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillingError {
    #[error("No children were selected for payment")]
    NoChildrenSelected,

    #[error("All selected children already have an active Learning Pass: {}", .0.join(", "))]
    AllActive(Vec<StudentId>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Student {0} was not found")]
    StudentNotFound(StudentId),

    #[error("Parent {0} was not found")]
    ParentNotFound(ParentId),

    #[error("The document store is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum PortalClientError {
    #[error("A document store operation failed")]
    StoreError(#[from] StoreError),

    #[error("Onboarding form was rejected")]
    OnboardingError(#[from] OnboardingError),

    #[error("Checkout could not be prepared")]
    BillingError(#[from] BillingError),

    #[error("Payment {reference} was not successful ({status})")]
    PaymentNotSuccessful { reference: String, status: String },
}
