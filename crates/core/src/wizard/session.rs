use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::delivery::{DeliveryError, DeliveryReceipt, QuoteTransport};
use crate::domain::fields::{FieldAccessError, FieldStore, Snapshot, ToggleOutcome};
use crate::domain::request::QuoteRequest;
use crate::notify::{Notification, NotificationKind, NotificationSink};
use crate::wizard::engine::{AdvanceOutcome, StepController, StepTransitionError};
use crate::wizard::plan::{StepDescriptor, StepPlan};
use crate::wizard::validation::{validate_step, ValidationReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The endpoint accepted the request; the session is now terminal.
    Delivered(DeliveryReceipt),
    /// The network call failed; field values are intact and the user may
    /// retry immediately.
    Failed(DeliveryError),
    /// Defensive final-step revalidation found stale state; no network call
    /// was made.
    Rejected(ValidationReport),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error(transparent)]
    Field(#[from] FieldAccessError),
    #[error(transparent)]
    Step(#[from] StepTransitionError),
    #[error("cannot submit from step {step}; the wizard is not on its final step")]
    SubmitBeforeFinalStep { step: u32 },
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("the wizard session already succeeded and no longer accepts edits")]
    SessionSucceeded,
    #[error("the wizard session is closed")]
    SessionClosed,
}

/// Shared close flag for a wizard session. The host keeps a handle and flips
/// it when the user dismisses the wizard; a submission result observed after
/// closure still settles the lifecycle but suppresses notifications.
#[derive(Clone, Debug, Default)]
pub struct CloseHandle {
    closed: Arc<AtomicBool>,
}

impl CloseHandle {
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// One wizard session: the field store, the step controller, and the
/// submission lifecycle behind a single mutable handle. All operations are
/// synchronous except `submit`, which awaits exactly one outbound delivery.
pub struct WizardSession {
    store: FieldStore,
    controller: StepController,
    submission: SubmissionState,
    correlation_id: String,
    close: CloseHandle,
}

impl WizardSession {
    pub fn new(plan: StepPlan) -> Self {
        Self {
            store: FieldStore::for_plan(&plan),
            controller: StepController::new(plan),
            submission: SubmissionState::Idle,
            correlation_id: Uuid::new_v4().simple().to_string(),
            close: CloseHandle::default(),
        }
    }

    pub fn standard() -> Self {
        Self::new(StepPlan::standard())
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn plan(&self) -> &StepPlan {
        self.controller.plan()
    }

    pub fn current_step(&self) -> u32 {
        self.controller.current_step()
    }

    pub fn total_steps(&self) -> u32 {
        self.controller.total_steps()
    }

    pub fn descriptor(&self) -> &StepDescriptor {
        self.controller.descriptor()
    }

    pub fn display_report(&self) -> &ValidationReport {
        self.controller.display_report()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submission
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    pub fn close(&mut self) {
        self.close.close();
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_closed()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Scalar/single-choice write. Clears the field's displayed error so the
    /// inline message disappears as soon as the user edits; this is a UX
    /// contract, not a validation pass.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.store.set_field(name, value)?;
        self.controller.clear_field_errors(name);
        Ok(())
    }

    pub fn toggle_member(
        &mut self,
        name: &str,
        token: impl Into<String>,
    ) -> Result<ToggleOutcome, WizardError> {
        self.ensure_editable()?;
        Ok(self.store.toggle_member(name, token)?)
    }

    pub fn advance(&mut self) -> Result<AdvanceOutcome, WizardError> {
        self.ensure_editable()?;
        let outcome = self.controller.advance(&self.store.snapshot())?;
        match &outcome {
            AdvanceOutcome::Advanced { from, to } => info!(
                event_name = "wizard.step_advanced",
                correlation_id = %self.correlation_id,
                from,
                to,
                "step gate passed"
            ),
            AdvanceOutcome::Blocked { report } => debug!(
                event_name = "wizard.step_blocked",
                correlation_id = %self.correlation_id,
                step = self.controller.current_step(),
                blocked_fields = report.violations.len(),
                "step gate blocked by validation"
            ),
        }
        Ok(outcome)
    }

    pub fn retreat(&mut self) -> Result<u32, WizardError> {
        self.ensure_editable()?;
        Ok(self.controller.retreat())
    }

    /// Submits the current snapshot to the intake endpoint.
    ///
    /// Contract misuse (wrong step, concurrent submit, terminal or closed
    /// session) fails fast with `WizardError` and performs no network call.
    /// Validation rejection and delivery failure are ordinary outcomes, not
    /// errors; delivery rejections are converted here and never propagate.
    pub async fn submit<T, S>(
        &mut self,
        transport: &T,
        sink: &S,
    ) -> Result<SubmitOutcome, WizardError>
    where
        T: QuoteTransport + ?Sized,
        S: NotificationSink + ?Sized,
    {
        if self.is_closed() {
            return Err(WizardError::SessionClosed);
        }
        match self.submission {
            SubmissionState::Submitting => return Err(WizardError::SubmissionInFlight),
            SubmissionState::Succeeded => return Err(WizardError::SessionSucceeded),
            SubmissionState::Idle | SubmissionState::Failed => {}
        }
        if !self.controller.is_final_step() {
            return Err(WizardError::SubmitBeforeFinalStep {
                step: self.controller.current_step(),
            });
        }

        let snapshot = self.store.snapshot();
        let report = validate_step(self.controller.descriptor(), &snapshot);
        if !report.is_clean() {
            self.controller.record_report(report.clone());
            debug!(
                event_name = "wizard.submission_rejected",
                correlation_id = %self.correlation_id,
                blocked_fields = report.violations.len(),
                "final-step revalidation rejected submission"
            );
            return Ok(SubmitOutcome::Rejected(report));
        }

        self.submission = SubmissionState::Submitting;
        let request = QuoteRequest::new(snapshot);
        info!(
            event_name = "wizard.submission_started",
            correlation_id = %self.correlation_id,
            request_id = %request.id,
            "delivering quote request"
        );

        let result = transport.deliver(&request).await;
        let suppress_notifications = self.is_closed();

        match result {
            Ok(receipt) => {
                self.submission = SubmissionState::Succeeded;
                info!(
                    event_name = "wizard.submission_succeeded",
                    correlation_id = %self.correlation_id,
                    request_id = %request.id,
                    status = receipt.status,
                    "quote request delivered"
                );
                if !suppress_notifications {
                    sink.notify(Notification::new(
                        Some(request.id.clone()),
                        self.correlation_id.clone(),
                        NotificationKind::SubmissionSucceeded,
                        "Your quote request has been sent. We will be in touch shortly.",
                    ));
                }
                Ok(SubmitOutcome::Delivered(receipt))
            }
            Err(error) => {
                self.submission = SubmissionState::Failed;
                warn!(
                    event_name = "wizard.submission_failed",
                    correlation_id = %self.correlation_id,
                    request_id = %request.id,
                    error = %error,
                    "quote request delivery failed"
                );
                if !suppress_notifications {
                    sink.notify(Notification::new(
                        Some(request.id.clone()),
                        self.correlation_id.clone(),
                        NotificationKind::SubmissionFailed,
                        "We could not send your quote request. Please try again.",
                    ));
                }
                Ok(SubmitOutcome::Failed(error))
            }
        }
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.is_closed() {
            return Err(WizardError::SessionClosed);
        }
        match self.submission {
            SubmissionState::Submitting => Err(WizardError::SubmissionInFlight),
            SubmissionState::Succeeded => Err(WizardError::SessionSucceeded),
            SubmissionState::Idle | SubmissionState::Failed => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::delivery::{DeliveryError, DeliveryReceipt, QuoteTransport};
    use crate::domain::request::QuoteRequest;
    use crate::notify::InMemoryNotificationSink;
    use crate::wizard::engine::AdvanceOutcome;
    use crate::wizard::session::{
        CloseHandle, SubmissionState, SubmitOutcome, WizardError, WizardSession,
    };

    struct StaticTransport {
        outcome: Result<u16, DeliveryError>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticTransport {
        fn succeeding() -> Self {
            Self { outcome: Ok(202), calls: Arc::new(AtomicUsize::new(0)) }
        }

        fn failing(error: DeliveryError) -> Self {
            Self { outcome: Err(error), calls: Arc::new(AtomicUsize::new(0)) }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteTransport for StaticTransport {
        async fn deliver(
            &self,
            request: &QuoteRequest,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(status) => Ok(DeliveryReceipt::accepted(request.id.clone(), *status)),
                Err(error) => Err(error.clone()),
            }
        }
    }

    struct StallingTransport;

    #[async_trait]
    impl QuoteTransport for StallingTransport {
        async fn deliver(
            &self,
            request: &QuoteRequest,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(DeliveryReceipt::accepted(request.id.clone(), 200))
        }
    }

    struct ClosingTransport {
        handle: CloseHandle,
    }

    #[async_trait]
    impl QuoteTransport for ClosingTransport {
        async fn deliver(
            &self,
            request: &QuoteRequest,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            self.handle.close();
            Ok(DeliveryReceipt::accepted(request.id.clone(), 200))
        }
    }

    fn fill_all_fields(session: &mut WizardSession) {
        session.set_field("name", "Jane Doe").expect("name");
        session.set_field("email", "jane@x.com").expect("email");
        session.set_field("phone", "555-1234").expect("phone");
        session.toggle_member("project_type", "website").expect("project type");
        session.set_field("industry", "retail").expect("industry");
        session.toggle_member("features", "cms").expect("features");
        session.toggle_member("platforms", "desktop_web").expect("platforms");
        session.set_field("timeline", "flexible").expect("timeline");
        session.set_field("budget", "5k_to_15k").expect("budget");
        session.set_field("description", "Storefront rebuild with booking").expect("description");
    }

    fn session_on_final_step() -> WizardSession {
        let mut session = WizardSession::standard();
        fill_all_fields(&mut session);
        while session.current_step() < session.total_steps() {
            let outcome = session.advance().expect("gated advance");
            assert!(matches!(outcome, AdvanceOutcome::Advanced { .. }));
        }
        session
    }

    #[test]
    fn empty_session_blocks_on_step_one_and_stays_there() {
        let mut session = WizardSession::standard();

        let outcome = session.advance().expect("advance call");
        let AdvanceOutcome::Blocked { report } = outcome else {
            panic!("expected blocked outcome");
        };

        assert_eq!(session.current_step(), 1);
        assert_eq!(report.violations.len(), 3);
        for field in ["name", "email", "phone"] {
            assert!(report.field_has_errors(field));
        }
    }

    #[test]
    fn valid_contact_details_unlock_step_two() {
        let mut session = WizardSession::standard();
        session.set_field("name", "Jane Doe").expect("name");
        session.set_field("email", "jane@x.com").expect("email");
        session.set_field("phone", "555-1234").expect("phone");

        let outcome = session.advance().expect("advance call");
        assert_eq!(outcome, AdvanceOutcome::Advanced { from: 1, to: 2 });
        assert_eq!(session.current_step(), 2);
    }

    #[test]
    fn scalar_edit_clears_the_displayed_error_for_that_field() {
        let mut session = WizardSession::standard();
        session.advance().expect("blocked advance");
        assert!(session.display_report().field_has_errors("name"));

        session.set_field("name", "Jane Doe").expect("name");

        assert!(!session.display_report().field_has_errors("name"));
        assert!(session.display_report().field_has_errors("email"));
    }

    #[tokio::test]
    async fn submit_before_the_final_step_is_caller_misuse() {
        let mut session = WizardSession::standard();
        let transport = StaticTransport::succeeding();
        let sink = InMemoryNotificationSink::default();

        let error = session.submit(&transport, &sink).await.expect_err("must reject");

        assert_eq!(error, WizardError::SubmitBeforeFinalStep { step: 1 });
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn successful_submission_is_terminal_and_notifies_once() {
        let mut session = session_on_final_step();
        let transport = StaticTransport::succeeding();
        let sink = InMemoryNotificationSink::default();

        let outcome = session.submit(&transport, &sink).await.expect("submit");

        assert!(matches!(outcome, SubmitOutcome::Delivered(_)));
        assert_eq!(session.submission_state(), SubmissionState::Succeeded);
        assert_eq!(transport.call_count(), 1);

        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].kind,
            crate::notify::NotificationKind::SubmissionSucceeded
        );
    }

    #[tokio::test]
    async fn failed_submission_keeps_data_and_permits_retry() {
        let mut session = session_on_final_step();
        let before = session.snapshot();
        let failing = StaticTransport::failing(DeliveryError::Status { status: 500 });
        let sink = InMemoryNotificationSink::default();

        let outcome = session.submit(&failing, &sink).await.expect("submit");
        assert_eq!(outcome, SubmitOutcome::Failed(DeliveryError::Status { status: 500 }));
        assert_eq!(session.submission_state(), SubmissionState::Failed);
        assert_eq!(session.snapshot(), before, "no data loss on failure");
        assert_eq!(sink.notifications().len(), 1);
        assert_eq!(
            sink.notifications()[0].kind,
            crate::notify::NotificationKind::SubmissionFailed
        );

        let retry_transport = StaticTransport::succeeding();
        let outcome = session.submit(&retry_transport, &sink).await.expect("retry");
        assert!(matches!(outcome, SubmitOutcome::Delivered(_)));
        assert_eq!(session.submission_state(), SubmissionState::Succeeded);
    }

    #[tokio::test]
    async fn stale_final_step_state_is_rejected_without_a_network_call() {
        let mut session = session_on_final_step();
        // Stale state: the user retreats, empties a gate field, then returns.
        session.retreat().expect("retreat");
        session.advance().expect("advance back");
        session.set_field("description", "").expect("clear description");

        let transport = StaticTransport::succeeding();
        let sink = InMemoryNotificationSink::default();
        let outcome = session.submit(&transport, &sink).await.expect("submit");

        let SubmitOutcome::Rejected(report) = outcome else {
            panic!("expected rejection");
        };
        assert!(report.field_has_errors("description"));
        assert_eq!(session.submission_state(), SubmissionState::Idle);
        assert_eq!(transport.call_count(), 0);
        assert!(sink.notifications().is_empty());
        assert!(session.display_report().field_has_errors("description"));
    }

    #[tokio::test]
    async fn edits_after_success_are_rejected() {
        let mut session = session_on_final_step();
        let transport = StaticTransport::succeeding();
        let sink = InMemoryNotificationSink::default();
        session.submit(&transport, &sink).await.expect("submit");

        let error = session.set_field("name", "Someone Else").expect_err("edit after success");
        assert_eq!(error, WizardError::SessionSucceeded);

        let error = session.toggle_member("features", "blog").expect_err("toggle after success");
        assert_eq!(error, WizardError::SessionSucceeded);

        let error = session.submit(&transport, &sink).await.expect_err("resubmit after success");
        assert_eq!(error, WizardError::SessionSucceeded);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn a_second_submit_while_one_is_in_flight_is_rejected() {
        let mut session = session_on_final_step();
        let sink = InMemoryNotificationSink::default();

        // Drop the first submission future at its suspension point; the
        // lifecycle is left in `Submitting`.
        let stalled = tokio::time::timeout(
            Duration::from_millis(20),
            session.submit(&StallingTransport, &sink),
        )
        .await;
        assert!(stalled.is_err(), "first submission should still be in flight");
        assert_eq!(session.submission_state(), SubmissionState::Submitting);

        let transport = StaticTransport::succeeding();
        let error = session.submit(&transport, &sink).await.expect_err("second submit");
        assert_eq!(error, WizardError::SubmissionInFlight);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn closing_mid_flight_suppresses_notifications_but_settles_state() {
        let mut session = session_on_final_step();
        let transport = ClosingTransport { handle: session.close_handle() };
        let sink = InMemoryNotificationSink::default();

        let outcome = session.submit(&transport, &sink).await.expect("submit");

        assert!(matches!(outcome, SubmitOutcome::Delivered(_)));
        assert_eq!(session.submission_state(), SubmissionState::Succeeded);
        assert!(session.is_closed());
        assert!(sink.notifications().is_empty(), "no toast after the wizard is closed");
    }

    #[tokio::test]
    async fn closed_sessions_reject_all_operations() {
        let mut session = session_on_final_step();
        session.close();

        assert_eq!(
            session.set_field("name", "Jane").expect_err("edit"),
            WizardError::SessionClosed
        );
        assert_eq!(session.retreat().expect_err("retreat"), WizardError::SessionClosed);

        let transport = StaticTransport::succeeding();
        let sink = InMemoryNotificationSink::default();
        let error = session.submit(&transport, &sink).await.expect_err("submit");
        assert_eq!(error, WizardError::SessionClosed);
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn retreat_is_free_from_any_step_above_one() {
        let mut session = session_on_final_step();
        let final_step = session.total_steps();

        for expected in (1..final_step).rev() {
            assert_eq!(session.retreat().expect("retreat"), expected);
        }
        assert_eq!(session.retreat().expect("retreat at floor"), 1);
    }
}
