//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating status transitions,
//! e.g. a subscription moving from `Active` to `Cancelled`.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// ```ignore
/// let next = SubscriptionStatus::Active.transition_to(SubscriptionStatus::Cancelled)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Checkout {
        Open,
        Paid,
        Voided,
    }

    impl StateMachine for Checkout {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Checkout::Open => vec![Checkout::Paid, Checkout::Voided],
                Checkout::Paid => vec![Checkout::Voided],
                Checkout::Voided => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        assert_eq!(Checkout::Open.transition_to(Checkout::Paid), Ok(Checkout::Paid));
    }

    #[test]
    fn transition_to_reports_both_states_on_failure() {
        let err = Checkout::Voided.transition_to(Checkout::Paid).unwrap_err();
        assert!(err.to_string().contains("Voided"));
        assert!(err.to_string().contains("Paid"));
    }

    #[test]
    fn terminal_state_has_no_transitions() {
        assert!(Checkout::Voided.is_terminal());
        assert!(!Checkout::Open.is_terminal());
    }
}
