pub mod domain;
pub mod error;
pub mod steps;

pub use domain::{Draft, DraftId, DraftStats};
pub use steps::{StepDefinition, StepId, APPLICATION_STEPS, TOTAL_STEPS};
