pub mod config;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod wizard;

pub use delivery::{DeliveryError, DeliveryReceipt, QuoteTransport};
pub use domain::fields::{
    FieldAccessError, FieldKind, FieldStore, FieldValue, Snapshot, ToggleOutcome,
};
pub use domain::request::{QuoteRequest, RequestId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use notify::{
    InMemoryNotificationSink, Notification, NotificationKind, NotificationSink,
    TracingNotificationSink,
};
pub use wizard::engine::{AdvanceOutcome, StepController, StepTransitionError};
pub use wizard::plan::{FieldSpec, PlanError, Requirement, StepDescriptor, StepPlan};
pub use wizard::session::{
    CloseHandle, SubmissionState, SubmitOutcome, WizardError, WizardSession,
};
pub use wizard::validation::{validate_step, FieldViolation, ValidationReport};
