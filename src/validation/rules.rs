//! Authoring rules for compiled action types using Validation.

use crate::machine::ActionType;
use crate::validation::checks;
use crate::validation::violations::{AuthoringError, ValidationPolicy};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Type alias for authoring check functions
pub type AuthoringCheck =
    Box<dyn Fn(&ActionType) -> Validation<(), NonEmptyVec<AuthoringError>> + Send + Sync>;

/// Checks run over an action type when it is built.
/// Uses Validation to accumulate ALL problems.
pub struct AuthoringRules {
    checks: Vec<AuthoringCheck>,
    policy: ValidationPolicy,
}

impl AuthoringRules {
    /// No checks; problems are warned about and accepted.
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            policy: ValidationPolicy::WarnAndAccept,
        }
    }

    /// Reachability, self-loop and empty-sequence checks.
    pub fn standard() -> Self {
        Self::new()
            .require(checks::reachable_segments)
            .require(checks::no_unconditional_self_loops)
            .require(checks::non_empty_sequences)
    }

    /// The standard checks plus unbound conditions, rejecting on failure.
    pub fn strict() -> Self {
        Self::standard()
            .require(checks::bound_conditions)
            .on_violation(ValidationPolicy::Reject)
    }

    /// Add a check returning a Validation.
    pub fn require<F>(mut self, check: F) -> Self
    where
        F: Fn(&ActionType) -> Validation<(), NonEmptyVec<AuthoringError>> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    /// Add a predicate check with an error message.
    pub fn require_pred<F>(self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&ActionType) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        self.require(move |action| {
            if predicate(action) {
                Validation::success(())
            } else {
                Validation::fail(AuthoringError::CustomCheckFailed {
                    message: message.clone(),
                })
            }
        })
    }

    pub fn on_violation(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check, accumulating ALL problems.
    pub fn enforce(&self, action: &ActionType) -> Validation<(), NonEmptyVec<AuthoringError>> {
        let results: Vec<_> = self.checks.iter().map(|check| check(action)).collect();
        Validation::all_vec(results).map(|_| ())
    }
}

impl Default for AuthoringRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for AuthoringRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthoringRules")
            .field("checks", &self.checks.len())
            .field("policy", &self.policy)
            .finish()
    }
}
