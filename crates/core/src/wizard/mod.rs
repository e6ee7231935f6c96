pub mod engine;
pub mod plan;
pub mod session;
pub mod validation;

pub use engine::{AdvanceOutcome, StepController, StepTransitionError};
pub use plan::{FieldSpec, PlanError, Requirement, StepDescriptor, StepPlan};
pub use session::{CloseHandle, SubmissionState, SubmitOutcome, WizardError, WizardSession};
pub use validation::{validate_step, FieldViolation, ValidationReport};
