//! Trial and Learning Pass bookkeeping for the school tutor portal.
//!
//! The pure pieces live in [`access`] and [`lifecycle`]; [`client`] wires
//! them to a [`store::StudentStore`].

pub mod access;
pub mod billing;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod store;
pub mod student;

pub use access::{evaluate, AccessDecision, AccessEvaluator, DisplayStatus};
pub use client::PortalClient;
pub use config::PlanConfig;
pub use lifecycle::{apply_onboarding_completion, apply_payment, OnboardingProfile, Transition};
pub use student::{StudentSubscription, SubscriptionStatus, SubscriptionUpdate};
