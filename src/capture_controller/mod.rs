//! Capture controller - camera lifecycle and the capture round trip
//!
//! ## Responsibilities
//!
//! - Own the camera stream from acquisition to teardown
//! - Drive the single capture -> encode -> analyze -> log round trip
//! - Enforce at most one capture in flight
//! - Discard results that arrive after teardown
//!
//! ## State machine
//!
//! `Uninitialized -> Streaming` on acquisition, `-> StreamError` on denial.
//! `Streaming -> Analyzing` on an explicit capture trigger; any trigger in
//! another state is a no-op. `Analyzing -> Streaming` on both success and
//! failure, so the user can retry immediately. Teardown stops the stream
//! tracks, cancels the session token, and returns to `Uninitialized`.

use crate::camera::{self, CameraSource, CameraStream, Facing};
use crate::credential::CredentialHolder;
use crate::error::Result;
use crate::log_store::{AnalysisRecord, LogStore};
use crate::vision_client::ImageAnalyzer;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Controller state, visible to the view layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    /// No stream held; initial state and the state after teardown
    Uninitialized,
    /// Camera live, capture trigger enabled
    Streaming,
    /// Camera denied or unavailable; carries the displayable reason
    StreamError(String),
    /// One capture in flight; trigger disabled
    Analyzing,
}

/// Result of one capture trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Analysis completed and the record was appended
    Logged(Uuid),
    /// Analysis failed; the message is transient and displayable
    Failed(String),
    /// Trigger arrived while not `Streaming`; nothing was done
    Ignored,
    /// Controller was torn down mid-flight; the result was discarded
    Discarded,
}

/// Owns the camera stream lifecycle and the capture round trip
pub struct CaptureController {
    analyzer: Arc<dyn ImageAnalyzer>,
    credential: Arc<CredentialHolder>,
    log: Arc<LogStore>,
    jpeg_quality: u8,
    state: RwLock<CaptureState>,
    stream: Mutex<Option<Box<dyn CameraStream>>>,
    /// Cancelled on teardown; in-flight captures race it
    session: RwLock<CancellationToken>,
    /// Most recent transient analysis failure, for display
    last_error: RwLock<Option<String>>,
}

impl CaptureController {
    /// Create a controller in `Uninitialized` state
    pub fn new(
        analyzer: Arc<dyn ImageAnalyzer>,
        credential: Arc<CredentialHolder>,
        log: Arc<LogStore>,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            analyzer,
            credential,
            log,
            jpeg_quality,
            state: RwLock::new(CaptureState::Uninitialized),
            stream: Mutex::new(None),
            session: RwLock::new(CancellationToken::new()),
            last_error: RwLock::new(None),
        }
    }

    /// Current state snapshot
    pub async fn state(&self) -> CaptureState {
        self.state.read().await.clone()
    }

    /// Whether the capture trigger is enabled
    pub async fn can_capture(&self) -> bool {
        *self.state.read().await == CaptureState::Streaming
    }

    /// Most recent transient analysis failure message
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Acquire a camera stream and enter `Streaming`.
    ///
    /// Only valid from `Uninitialized`; a redundant call is a warned
    /// no-op. On denial the state becomes `StreamError` with the reason,
    /// and the error is also returned.
    pub async fn start(&self, source: &dyn CameraSource, facing: Facing) -> Result<()> {
        {
            let state = self.state.read().await;
            if *state != CaptureState::Uninitialized {
                tracing::warn!(state = ?*state, "Capture controller already started");
                return Ok(());
            }
        }

        // Fresh token per streaming session
        *self.session.write().await = CancellationToken::new();

        match source.acquire(facing).await {
            Ok(stream) => {
                let (width, height) = stream.resolution();
                *self.stream.lock().await = Some(stream);
                *self.state.write().await = CaptureState::Streaming;
                *self.last_error.write().await = None;
                tracing::info!(width, height, "Streaming started");
                Ok(())
            }
            Err(e) => {
                let reason = e.user_message().into_owned();
                *self.state.write().await = CaptureState::StreamError(reason);
                Err(e)
            }
        }
    }

    /// One explicit capture trigger.
    ///
    /// A trigger in any state other than `Streaming` returns `Ignored`,
    /// which makes re-entrant triggers during `Analyzing` no-ops.
    pub async fn capture_and_analyze(&self) -> CaptureOutcome {
        {
            let mut state = self.state.write().await;
            if *state != CaptureState::Streaming {
                tracing::debug!(state = ?*state, "Capture trigger ignored");
                return CaptureOutcome::Ignored;
            }
            *state = CaptureState::Analyzing;
        }

        let token = self.session.read().await.clone();
        let outcome = self.run_capture(&token).await;

        if outcome != CaptureOutcome::Discarded {
            // Back to ready unless teardown got there first
            let mut state = self.state.write().await;
            if *state == CaptureState::Analyzing {
                *state = CaptureState::Streaming;
            }
        }

        outcome
    }

    async fn run_capture(&self, token: &CancellationToken) -> CaptureOutcome {
        let sample_start = Instant::now();
        let frame = {
            let mut guard = self.stream.lock().await;
            let Some(stream) = guard.as_mut() else {
                return self.fail("Camera stream is not available.".to_string()).await;
            };
            match stream.sample().await {
                Ok(frame) => frame,
                Err(e) => return self.fail(e.user_message().into_owned()).await,
            }
        };
        let sample_ms = sample_start.elapsed().as_millis() as u64;

        let encode_start = Instant::now();
        let encoded = match camera::encode_jpeg(&frame, self.jpeg_quality) {
            Ok(encoded) => encoded,
            Err(e) => return self.fail(e.user_message().into_owned()).await,
        };
        let encode_ms = encode_start.elapsed().as_millis() as u64;

        let Some(credential) = self.credential.get().await else {
            return self.fail("No session credential available.".to_string()).await;
        };

        let payload = encoded.to_data_uri();
        let analyze_start = Instant::now();
        let analysis = tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("Capture discarded: controller torn down during analysis");
                return CaptureOutcome::Discarded;
            }
            result = self.analyzer.analyze(&credential, &payload) => result,
        };

        // A result that resolves in the same poll as the cancellation
        // still must not reach the log
        if token.is_cancelled() {
            tracing::info!("Late analysis result discarded after teardown");
            return CaptureOutcome::Discarded;
        }

        match analysis {
            Ok(description) => {
                let record = AnalysisRecord::new(encoded, description);
                let id = record.id;
                self.log.append(record).await;
                *self.last_error.write().await = None;
                tracing::info!(
                    id = %id,
                    sample_ms,
                    encode_ms,
                    analyze_ms = analyze_start.elapsed().as_millis() as u64,
                    "Capture logged"
                );
                CaptureOutcome::Logged(id)
            }
            Err(e) => self.fail(e.user_message().into_owned()).await,
        }
    }

    async fn fail(&self, message: String) -> CaptureOutcome {
        tracing::warn!(error = %message, "Capture failed");
        *self.last_error.write().await = Some(message.clone());
        CaptureOutcome::Failed(message)
    }

    /// Leave the capture screen: stop stream tracks, release the handle,
    /// cancel the session token so in-flight results are discarded, and
    /// return to `Uninitialized` for the next entry.
    pub async fn teardown(&self) {
        self.session.read().await.cancel();

        if let Some(mut stream) = self.stream.lock().await.take() {
            stream.stop();
        }

        *self.state.write().await = CaptureState::Uninitialized;
        *self.last_error.write().await = None;
        tracing::info!("Capture controller torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SyntheticCamera;
    use crate::credential::Credential;
    use crate::error::Error;
    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    struct EchoAnalyzer(String);

    #[async_trait]
    impl ImageAnalyzer for EchoAnalyzer {
        async fn analyze(&self, _credential: &Credential, _payload: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl ImageAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _credential: &Credential, _payload: &str) -> Result<String> {
            Err(Error::Analysis(
                crate::vision_client::ANALYSIS_FAILED.to_string(),
            ))
        }
    }

    /// Blocks inside analyze until released, signalling when it starts
    struct GatedAnalyzer {
        started: Arc<Semaphore>,
        release: Arc<Semaphore>,
    }

    #[async_trait]
    impl ImageAnalyzer for GatedAnalyzer {
        async fn analyze(&self, _credential: &Credential, _payload: &str) -> Result<String> {
            self.started.add_permits(1);
            let _permit = self.release.acquire().await.unwrap();
            Ok("gated description".to_string())
        }
    }

    async fn holder_with_key() -> Arc<CredentialHolder> {
        let holder = Arc::new(CredentialHolder::new());
        let mut buffer = String::from("test-key");
        holder.accept(&mut buffer).await.unwrap();
        holder
    }

    fn controller(analyzer: Arc<dyn ImageAnalyzer>, holder: Arc<CredentialHolder>) -> (Arc<CaptureController>, Arc<LogStore>) {
        let log = Arc::new(LogStore::new());
        let controller = Arc::new(CaptureController::new(analyzer, holder, log.clone(), 80));
        (controller, log)
    }

    #[tokio::test]
    async fn test_start_enters_streaming() {
        let (controller, _) =
            controller(Arc::new(EchoAnalyzer("x".into())), holder_with_key().await);
        controller
            .start(&SyntheticCamera::new(8, 8), Facing::Environment)
            .await
            .unwrap();

        assert_eq!(controller.state().await, CaptureState::Streaming);
        assert!(controller.can_capture().await);
    }

    #[tokio::test]
    async fn test_denied_camera_enters_stream_error() {
        let (controller, _) =
            controller(Arc::new(EchoAnalyzer("x".into())), holder_with_key().await);
        let err = controller
            .start(&SyntheticCamera::unavailable(), Facing::Environment)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Permission(_)));
        assert!(matches!(
            controller.state().await,
            CaptureState::StreamError(_)
        ));
        assert!(!controller.can_capture().await);
        // Trigger stays disabled
        assert_eq!(
            controller.capture_and_analyze().await,
            CaptureOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_successful_capture_logs_and_returns_to_streaming() {
        let (controller, log) = controller(
            Arc::new(EchoAnalyzer("A red mug on a desk.".into())),
            holder_with_key().await,
        );
        controller
            .start(&SyntheticCamera::new(8, 8), Facing::Environment)
            .await
            .unwrap();

        let outcome = controller.capture_and_analyze().await;
        assert!(matches!(outcome, CaptureOutcome::Logged(_)));
        assert_eq!(controller.state().await, CaptureState::Streaming);

        let snapshot = log.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].description, "A red mug on a desk.");
    }

    #[tokio::test]
    async fn test_failed_capture_leaves_log_unchanged() {
        let (controller, log) =
            controller(Arc::new(FailingAnalyzer), holder_with_key().await);
        controller
            .start(&SyntheticCamera::new(8, 8), Facing::Environment)
            .await
            .unwrap();

        let outcome = controller.capture_and_analyze().await;
        match outcome {
            CaptureOutcome::Failed(msg) => {
                assert_eq!(msg, crate::vision_client::ANALYSIS_FAILED)
            }
            other => panic!("expected Failed, got {other:?}"),
        }

        assert!(log.is_empty().await);
        assert_eq!(controller.state().await, CaptureState::Streaming);
        assert_eq!(
            controller.last_error().await.as_deref(),
            Some(crate::vision_client::ANALYSIS_FAILED)
        );
    }

    #[tokio::test]
    async fn test_reentrant_trigger_is_noop() {
        let started = Arc::new(Semaphore::new(0));
        let release = Arc::new(Semaphore::new(0));
        let analyzer = Arc::new(GatedAnalyzer {
            started: started.clone(),
            release: release.clone(),
        });
        let (controller, log) = controller(analyzer, holder_with_key().await);
        controller
            .start(&SyntheticCamera::new(8, 8), Facing::Environment)
            .await
            .unwrap();

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.capture_and_analyze().await })
        };

        // Wait until the first capture is inside the analyzer
        let _started = started.acquire().await.unwrap();
        assert_eq!(controller.state().await, CaptureState::Analyzing);
        assert_eq!(
            controller.capture_and_analyze().await,
            CaptureOutcome::Ignored
        );

        release.add_permits(1);
        assert!(matches!(first.await.unwrap(), CaptureOutcome::Logged(_)));
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn test_teardown_discards_inflight_result() {
        let started = Arc::new(Semaphore::new(0));
        let release = Arc::new(Semaphore::new(0));
        let analyzer = Arc::new(GatedAnalyzer {
            started: started.clone(),
            release: release.clone(),
        });
        let (controller, log) = controller(analyzer, holder_with_key().await);
        controller
            .start(&SyntheticCamera::new(8, 8), Facing::Environment)
            .await
            .unwrap();

        let inflight = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.capture_and_analyze().await })
        };

        let _started = started.acquire().await.unwrap();
        controller.teardown().await;
        release.add_permits(1);

        assert_eq!(inflight.await.unwrap(), CaptureOutcome::Discarded);
        assert!(log.is_empty().await);
        assert_eq!(controller.state().await, CaptureState::Uninitialized);

        // Next entry starts cleanly
        controller
            .start(&SyntheticCamera::new(8, 8), Facing::Environment)
            .await
            .unwrap();
        assert_eq!(controller.state().await, CaptureState::Streaming);
    }

    #[tokio::test]
    async fn test_redundant_start_is_noop() {
        let (controller, _) =
            controller(Arc::new(EchoAnalyzer("x".into())), holder_with_key().await);
        let source = SyntheticCamera::new(8, 8);
        controller.start(&source, Facing::Environment).await.unwrap();
        controller.start(&source, Facing::Environment).await.unwrap();
        assert_eq!(controller.state().await, CaptureState::Streaming);
    }
}
