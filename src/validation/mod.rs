//! Validation of authored action types.
//!
//! Checks run over a compiled [`ActionType`](crate::machine::ActionType)
//! and use Stillwater's `Validation` type so that every problem is
//! reported in one pass instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use actionline::builder::{ActionTypeBuilder, BuildError, SegmentBuilder};
//! use actionline::validation::{AuthoringRules, ValidationPolicy};
//!
//! let result = ActionTypeBuilder::new("Attack")
//!     .segment(SegmentBuilder::new("Swing").tick_to("Swing"))
//!     .segment(SegmentBuilder::new("Unused"))
//!     .entry("Default", "Swing")
//!     .rules(AuthoringRules::standard().on_violation(ValidationPolicy::Reject))
//!     .build();
//!
//! match result {
//!     Err(BuildError::Authoring(problems)) => assert_eq!(problems.len(), 2),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod checks;
pub mod rules;
pub mod violations;

pub use rules::{AuthoringCheck, AuthoringRules};
pub use violations::{AuthoringError, ValidationPolicy};
