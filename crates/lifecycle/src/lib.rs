//! Request lifecycle for invention analysis.
//!
//! A `RequestLifecycle` owns the single authoritative phase of one user
//! session and drives it through
//! `Idle -> Validating -> InFlight -> {Success, Failed}`.
//!
//! Dispatch and completion are split so the network call can be awaited
//! without holding the lifecycle: `submit` hands back a `PendingRequest`
//! tagged with a `Ticket`, and `complete` applies its outcome only if that
//! ticket still belongs to the newest submission. Anything older is stale
//! and is dropped.

use patentguard_client::AnalysisBackend;
use patentguard_model::AnalysisResult;
use patentguard_validate::{validate, InventionDescription, ValidationError};
use std::sync::Arc;
use std::time::Duration;

/// The single active phase of a lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPhase {
    Idle,
    Validating,
    InFlight,
    Success(AnalysisResult),
    Failed(String),
}

impl RequestPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Idle => PhaseKind::Idle,
            Self::Validating => PhaseKind::Validating,
            Self::InFlight => PhaseKind::InFlight,
            Self::Success(_) => PhaseKind::Success,
            Self::Failed(_) => PhaseKind::Failed,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Submission controls must be disabled while this holds.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

/// Payload-free view of a phase, used for transition reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Idle,
    Validating,
    InFlight,
    Success,
    Failed,
}

/// Identifies the submission a pending request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Outcome of a pending request, ready to be applied with
/// [`RequestLifecycle::complete`].
#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Result<AnalysisResult, String>,
}

/// A dispatched analysis call that has not been awaited yet.
pub struct PendingRequest<B> {
    ticket: Ticket,
    description: InventionDescription,
    backend: Arc<B>,
    deadline: Option<Duration>,
}

impl<B: AnalysisBackend> PendingRequest<B> {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn description(&self) -> &InventionDescription {
        &self.description
    }

    /// Perform the call. Never fails: every error becomes a user-facing
    /// message in the completion.
    pub async fn run(self) -> Completion {
        let call = self.backend.analyze(&self.description);

        let outcome = match self.deadline {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(ticket = self.ticket.0, ?limit, "Analysis deadline expired");
                    return Completion {
                        ticket: self.ticket,
                        outcome: Err(timeout_message(limit)),
                    };
                }
            },
            None => call.await,
        };

        let outcome = outcome.map_err(|e| {
            tracing::warn!(ticket = self.ticket.0, backend = self.backend.name(), error = %e, "Analysis failed");
            e.user_message()
        });

        Completion {
            ticket: self.ticket,
            outcome,
        }
    }
}

/// Result of [`RequestLifecycle::submit`].
pub enum Submission<B> {
    /// Validation failed; the lifecycle is already `Failed` and no call was made.
    Rejected(ValidationError),
    /// Validation passed; the lifecycle is `InFlight` awaiting this request.
    Dispatched(PendingRequest<B>),
}

/// Message for a call that outlived its deadline.
pub fn timeout_message(limit: Duration) -> String {
    format!(
        "The analysis did not finish within {} seconds. Please try again.",
        limit.as_secs_f64()
    )
}

type Observer = Box<dyn FnMut(PhaseKind) + Send>;

/// State machine for one session's analysis requests.
pub struct RequestLifecycle<B> {
    backend: Arc<B>,
    phase: RequestPhase,
    /// Ticket whose completion is still wanted.
    awaiting: Option<Ticket>,
    issued: u64,
    deadline: Option<Duration>,
    observer: Option<Observer>,
}

impl<B: AnalysisBackend> RequestLifecycle<B> {
    pub fn new(backend: B) -> Self {
        Self::with_shared_backend(Arc::new(backend))
    }

    pub fn with_shared_backend(backend: Arc<B>) -> Self {
        Self {
            backend,
            phase: RequestPhase::Idle,
            awaiting: None,
            issued: 0,
            deadline: None,
            observer: None,
        }
    }

    /// Bound every call; expiry completes as `Failed`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Receive every phase the lifecycle enters, in order.
    pub fn with_observer(mut self, observer: impl FnMut(PhaseKind) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn phase(&self) -> &RequestPhase {
        &self.phase
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Start a new submission from raw input.
    ///
    /// Any previous payload is cleared before validation runs, and any
    /// request still pending loses its claim on the phase.
    pub fn submit(&mut self, text: &str) -> Submission<B> {
        self.awaiting = None;
        self.enter(RequestPhase::Validating);

        let description = match validate(text) {
            Ok(description) => description,
            Err(err) => {
                tracing::debug!(error = %err, "Invention description rejected");
                self.enter(RequestPhase::Failed(err.to_string()));
                return Submission::Rejected(err);
            }
        };

        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.awaiting = Some(ticket);
        tracing::debug!(ticket = ticket.0, backend = self.backend.name(), "Dispatching analysis");
        self.enter(RequestPhase::InFlight);

        Submission::Dispatched(PendingRequest {
            ticket,
            description,
            backend: Arc::clone(&self.backend),
            deadline: self.deadline,
        })
    }

    /// Apply a completion. Returns `false` when it was stale and dropped.
    pub fn complete(&mut self, completion: Completion) -> bool {
        if self.awaiting != Some(completion.ticket) || !self.phase.is_in_flight() {
            tracing::debug!(ticket = completion.ticket.0, "Dropping stale analysis response");
            return false;
        }
        self.awaiting = None;

        match completion.outcome {
            Ok(result) => {
                tracing::info!(
                    ticket = completion.ticket.0,
                    risk_level = %result.risk_level,
                    matches = result.retrieved_patents.len(),
                    "Analysis complete"
                );
                self.enter(RequestPhase::Success(result));
            }
            Err(message) => self.enter(RequestPhase::Failed(message)),
        }
        true
    }

    /// Submit, await and apply in one step.
    pub async fn run(&mut self, text: &str) -> &RequestPhase {
        if let Submission::Dispatched(pending) = self.submit(text) {
            let completion = pending.run().await;
            self.complete(completion);
        }
        &self.phase
    }

    /// Discard interest in the pending request, if any.
    pub fn cancel(&mut self) {
        if self.awaiting.take().is_some() && self.phase.is_in_flight() {
            tracing::debug!("Pending analysis cancelled");
            self.enter(RequestPhase::Idle);
        }
    }

    fn enter(&mut self, phase: RequestPhase) {
        let kind = phase.kind();
        self.phase = phase;
        if let Some(observer) = self.observer.as_mut() {
            observer(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patentguard_client::{ClientError, GENERIC_FAILURE_MESSAGE};
    use patentguard_model::HealthStatus;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers from a script, in call order.
    #[derive(Default)]
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<AnalysisResult, ClientError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn with(responses: Vec<Result<AnalysisResult, ClientError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AnalysisBackend for ScriptedBackend {
        async fn analyze(
            &self,
            _description: &InventionDescription,
        ) -> Result<AnalysisResult, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(ClientError::Transport("script exhausted".into())))
        }

        async fn health_check(&self) -> Result<HealthStatus, ClientError> {
            Ok(HealthStatus::reachable())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    /// Echoes the description back as the analysis text.
    struct EchoBackend;

    impl AnalysisBackend for EchoBackend {
        async fn analyze(
            &self,
            description: &InventionDescription,
        ) -> Result<AnalysisResult, ClientError> {
            Ok(AnalysisResult::new("Low", description.as_str()))
        }

        async fn health_check(&self) -> Result<HealthStatus, ClientError> {
            Ok(HealthStatus::reachable())
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    /// Never answers within any reasonable deadline.
    struct StalledBackend;

    impl AnalysisBackend for StalledBackend {
        async fn analyze(
            &self,
            _description: &InventionDescription,
        ) -> Result<AnalysisResult, ClientError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(AnalysisResult::new("High", "too late"))
        }

        async fn health_check(&self) -> Result<HealthStatus, ClientError> {
            Ok(HealthStatus::reachable())
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<PhaseKind>>>, impl FnMut(PhaseKind) + Send + 'static) {
        let trail = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&trail);
        (trail, move |kind| sink.lock().unwrap().push(kind))
    }

    fn dispatched<B>(submission: Submission<B>) -> PendingRequest<B> {
        match submission {
            Submission::Dispatched(pending) => pending,
            Submission::Rejected(err) => panic!("unexpected rejection: {err}"),
        }
    }

    #[tokio::test]
    async fn test_success_walks_every_phase() {
        let backend = ScriptedBackend::with(vec![Ok(AnalysisResult::new(
            "Low",
            "No direct conflicts found.",
        ))]);
        let (trail, observer) = recorder();
        let mut lifecycle = RequestLifecycle::new(backend).with_observer(observer);

        assert_eq!(lifecycle.phase(), &RequestPhase::Idle);
        let phase = lifecycle.run("smart water bottle").await;

        assert_eq!(phase.result().unwrap().analysis, "No direct conflicts found.");
        assert_eq!(
            *trail.lock().unwrap(),
            vec![PhaseKind::Validating, PhaseKind::InFlight, PhaseKind::Success]
        );
    }

    #[tokio::test]
    async fn test_failure_walks_every_phase() {
        let backend = ScriptedBackend::with(vec![Err(ClientError::Status {
            status: 429,
            detail: Some("rate limited".into()),
        })]);
        let (trail, observer) = recorder();
        let mut lifecycle = RequestLifecycle::new(backend).with_observer(observer);

        let phase = lifecycle.run("smart water bottle").await;

        assert_eq!(phase, &RequestPhase::Failed("rate limited".into()));
        assert_eq!(
            *trail.lock().unwrap(),
            vec![PhaseKind::Validating, PhaseKind::InFlight, PhaseKind::Failed]
        );
    }

    #[tokio::test]
    async fn test_rejection_never_calls_backend() {
        let (trail, observer) = recorder();
        let mut lifecycle = RequestLifecycle::new(ScriptedBackend::default()).with_observer(observer);

        let submission = lifecycle.submit("short");

        assert!(matches!(submission, Submission::Rejected(ValidationError::TooShort { .. })));
        assert!(lifecycle
            .phase()
            .error_message()
            .unwrap()
            .contains("at least 10 characters"));
        assert_eq!(lifecycle.backend().calls(), 0);
        assert_eq!(
            *trail.lock().unwrap(),
            vec![PhaseKind::Validating, PhaseKind::Failed]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_uses_generic_message() {
        let backend = ScriptedBackend::with(vec![Err(ClientError::Transport("refused".into()))]);
        let mut lifecycle = RequestLifecycle::new(backend);

        let phase = lifecycle.run("smart water bottle").await;
        assert_eq!(phase.error_message(), Some(GENERIC_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn test_resubmission_clears_previous_result() {
        let backend = ScriptedBackend::with(vec![Ok(AnalysisResult::new("High", "Conflicts."))]);
        let mut lifecycle = RequestLifecycle::new(backend);

        lifecycle.run("smart water bottle").await;
        assert!(lifecycle.phase().result().is_some());

        lifecycle.run("tiny").await;
        assert!(lifecycle.phase().result().is_none());
        assert!(lifecycle.phase().error_message().is_some());
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let backend = ScriptedBackend::with(vec![
            Err(ClientError::Transport("refused".into())),
            Ok(AnalysisResult::new("Medium", "Partial overlap.")),
        ]);
        let mut lifecycle = RequestLifecycle::new(backend);

        assert_eq!(lifecycle.run("smart water bottle").await.kind(), PhaseKind::Failed);
        assert_eq!(lifecycle.run("smart water bottle").await.kind(), PhaseKind::Success);
        assert_eq!(lifecycle.backend().calls(), 2);
    }

    #[tokio::test]
    async fn test_stale_response_after_newer_submission_is_dropped() {
        let mut lifecycle = RequestLifecycle::new(EchoBackend);

        let first = dispatched(lifecycle.submit("first invention idea"));
        let second = dispatched(lifecycle.submit("second invention idea"));
        assert_ne!(first.ticket(), second.ticket());

        let second_done = second.run().await;
        let first_done = first.run().await;

        assert!(lifecycle.complete(second_done));
        assert!(!lifecycle.complete(first_done));
        assert_eq!(
            lifecycle.phase().result().unwrap().analysis,
            "second invention idea"
        );
    }

    #[tokio::test]
    async fn test_stale_response_before_newer_completion_is_dropped() {
        let mut lifecycle = RequestLifecycle::new(EchoBackend);

        let first = dispatched(lifecycle.submit("first invention idea"));
        let second = dispatched(lifecycle.submit("second invention idea"));
        let (first_done, second_done) = tokio::join!(first.run(), second.run());

        assert!(!lifecycle.complete(first_done));
        assert!(lifecycle.phase().is_in_flight());

        assert!(lifecycle.complete(second_done));
        assert_eq!(
            lifecycle.phase().result().unwrap().analysis,
            "second invention idea"
        );
    }

    #[tokio::test]
    async fn test_stale_response_after_rejected_submission_is_dropped() {
        let mut lifecycle = RequestLifecycle::new(EchoBackend);

        let pending = dispatched(lifecycle.submit("first invention idea"));
        lifecycle.submit("short");
        let completion = pending.run().await;

        assert!(!lifecycle.complete(completion));
        assert_eq!(lifecycle.phase().kind(), PhaseKind::Failed);
    }

    #[tokio::test]
    async fn test_cancel_discards_pending_request() {
        let mut lifecycle = RequestLifecycle::new(EchoBackend);

        let pending = dispatched(lifecycle.submit("first invention idea"));
        lifecycle.cancel();
        assert_eq!(lifecycle.phase(), &RequestPhase::Idle);

        assert!(!lifecycle.complete(pending.run().await));
        assert_eq!(lifecycle.phase(), &RequestPhase::Idle);
    }

    #[tokio::test]
    async fn test_cancel_keeps_settled_phase() {
        let mut lifecycle = RequestLifecycle::new(EchoBackend);
        lifecycle.run("first invention idea").await;

        lifecycle.cancel();
        assert_eq!(lifecycle.phase().kind(), PhaseKind::Success);
    }

    #[tokio::test]
    async fn test_completion_is_applied_once() {
        let mut lifecycle = RequestLifecycle::new(EchoBackend);

        let completion = dispatched(lifecycle.submit("first invention idea")).run().await;
        assert!(lifecycle.complete(completion.clone()));
        assert!(!lifecycle.complete(completion));
    }

    #[tokio::test]
    async fn test_deadline_expiry_fails() {
        let mut lifecycle =
            RequestLifecycle::new(StalledBackend).with_deadline(Duration::from_millis(20));

        let phase = lifecycle.run("smart water bottle").await;

        assert_eq!(
            phase.error_message(),
            Some(timeout_message(Duration::from_millis(20)).as_str())
        );
    }

    #[tokio::test]
    async fn test_pending_request_can_be_spawned() {
        let mut lifecycle = RequestLifecycle::new(EchoBackend);

        let pending = dispatched(lifecycle.submit("spawned invention idea"));
        let completion = tokio::spawn(pending.run()).await.unwrap();

        assert!(lifecycle.complete(completion));
        assert_eq!(lifecycle.phase().kind(), PhaseKind::Success);
    }
}
