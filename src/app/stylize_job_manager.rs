use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use crate::domain::{StylizeError, StylizeRequest, StylizedImage};

use super::StylizeService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StylizeJobState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StylizeJobUpdate {
    pub job_id: u64,
    pub state: StylizeJobState,
    pub result: Option<StylizedImage>,
    pub error: Option<StylizeError>,
}

impl StylizeJobUpdate {
    fn running(job_id: u64) -> Self {
        Self {
            job_id,
            state: StylizeJobState::Running,
            result: None,
            error: None,
        }
    }

    fn succeeded(job_id: u64, result: StylizedImage) -> Self {
        Self {
            job_id,
            state: StylizeJobState::Succeeded,
            result: Some(result),
            error: None,
        }
    }

    fn failed(job_id: u64, error: StylizeError) -> Self {
        Self {
            job_id,
            state: StylizeJobState::Failed,
            result: None,
            error: Some(error),
        }
    }
}

/// Runs stylize jobs on a background worker thread. Jobs execute one at a
/// time in submission order; an in-flight job always runs to completion, so
/// callers gate new submissions on `state()` rather than cancelling.
pub struct StylizeJobManager {
    next_job_id: AtomicU64,
    command_tx: mpsc::Sender<WorkerMessage>,
    shared: Arc<Mutex<SharedState>>,
    worker_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl StylizeJobManager {
    pub fn new(service: StylizeService) -> Result<Self, StylizeError> {
        let shared = Arc::new(Mutex::new(SharedState::default()));
        let worker_shared = Arc::clone(&shared);
        let (command_tx, command_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("restyle-stylize-job-worker".to_string())
            .spawn(move || worker_loop(service, command_rx, worker_shared))
            .map_err(|error| {
                StylizeError::internal(format!(
                    "failed to start stylize job worker thread: {error}"
                ))
            })?;

        Ok(Self {
            next_job_id: AtomicU64::new(1),
            command_tx,
            shared,
            worker_handle: Mutex::new(Some(handle)),
        })
    }

    pub fn submit_stylize(&self, request: StylizeRequest) -> Result<u64, StylizeError> {
        let job_id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
        self.command_tx
            .send(WorkerMessage::Start { job_id, request })
            .map_err(|error| {
                StylizeError::internal(format!(
                    "failed to submit stylize job to worker queue: {error}"
                ))
            })?;
        Ok(job_id)
    }

    pub fn state(&self) -> StylizeJobState {
        self.shared
            .lock()
            .expect("stylize job state lock poisoned")
            .state
    }

    pub fn latest_update(&self) -> Option<StylizeJobUpdate> {
        self.shared
            .lock()
            .expect("stylize job state lock poisoned")
            .latest
            .clone()
    }

    pub fn drain_updates(&self) -> Vec<StylizeJobUpdate> {
        let mut shared = self
            .shared
            .lock()
            .expect("stylize job state lock poisoned");
        shared.updates.drain(..).collect()
    }
}

impl Drop for StylizeJobManager {
    fn drop(&mut self) {
        let _ = self.command_tx.send(WorkerMessage::Shutdown);

        if let Some(handle) = self
            .worker_handle
            .lock()
            .expect("stylize worker handle lock poisoned")
            .take()
        {
            let _ = handle.join();
        }
    }
}

#[derive(Default)]
struct SharedState {
    state: StylizeJobState,
    latest: Option<StylizeJobUpdate>,
    updates: VecDeque<StylizeJobUpdate>,
}

enum WorkerMessage {
    Start { job_id: u64, request: StylizeRequest },
    Shutdown,
}

fn worker_loop(
    service: StylizeService,
    command_rx: mpsc::Receiver<WorkerMessage>,
    shared: Arc<Mutex<SharedState>>,
) {
    while let Ok(message) = command_rx.recv() {
        match message {
            WorkerMessage::Start { job_id, request } => {
                push_update(&shared, StylizeJobUpdate::running(job_id));

                let update = match service.generate(&request) {
                    Ok(result) => StylizeJobUpdate::succeeded(job_id, result),
                    Err(error) => StylizeJobUpdate::failed(job_id, error),
                };
                push_update(&shared, update);
            }
            WorkerMessage::Shutdown => break,
        }
    }
}

fn push_update(shared: &Arc<Mutex<SharedState>>, update: StylizeJobUpdate) {
    let mut shared = shared
        .lock()
        .expect("stylize job state lock poisoned during update");
    shared.state = update.state;
    shared.latest = Some(update.clone());
    shared.updates.push_back(update);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, mpsc};
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::domain::{
        ImagePayload, ImageRole, StylizeError, StylizeRequest, StylizedImage,
    };
    use crate::infra::genai::ImageGenerationProvider;

    use super::{StylizeJobManager, StylizeJobState, StylizeService};

    struct BlockingProvider {
        entered: Arc<AtomicBool>,
        release_rx: Arc<Mutex<mpsc::Receiver<()>>>,
    }

    impl ImageGenerationProvider for BlockingProvider {
        fn provider_id(&self) -> &str {
            "gemini"
        }

        fn generate(&self, _request: &StylizeRequest) -> Result<StylizedImage, StylizeError> {
            self.entered.store(true, Ordering::SeqCst);
            let _ = self
                .release_rx
                .lock()
                .expect("release channel lock poisoned")
                .recv();
            Ok(StylizedImage::from_png_base64("cmVzdWx0"))
        }
    }

    struct FailingProvider;

    impl ImageGenerationProvider for FailingProvider {
        fn provider_id(&self) -> &str {
            "gemini"
        }

        fn generate(&self, _request: &StylizeRequest) -> Result<StylizedImage, StylizeError> {
            Err(StylizeError::Timeout)
        }
    }

    struct SlowCompletionProvider {
        delay: Duration,
        completed: Arc<AtomicBool>,
    }

    impl ImageGenerationProvider for SlowCompletionProvider {
        fn provider_id(&self) -> &str {
            "gemini"
        }

        fn generate(&self, _request: &StylizeRequest) -> Result<StylizedImage, StylizeError> {
            thread::sleep(self.delay);
            self.completed.store(true, Ordering::SeqCst);
            Ok(StylizedImage::from_png_base64("cmVzdWx0"))
        }
    }

    fn valid_request() -> StylizeRequest {
        StylizeRequest::new(
            ImagePayload::new(ImageRole::Content, "data:image/png;base64,Y29udGVudA=="),
            None,
            "Restyle this character.",
        )
    }

    fn manager_with_provider(provider: Arc<dyn ImageGenerationProvider>) -> StylizeJobManager {
        StylizeJobManager::new(StylizeService::new(provider))
            .expect("job manager should start worker")
    }

    fn wait_for(
        manager: &StylizeJobManager,
        predicate: impl Fn(StylizeJobState) -> bool,
        timeout: Duration,
    ) {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if predicate(manager.state()) {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }

        panic!("condition was not met within {:?}", timeout);
    }

    #[test]
    fn submit_stylize_runs_provider_on_background_worker() {
        let entered = Arc::new(AtomicBool::new(false));
        let (release_tx, release_rx) = mpsc::channel();

        let provider = Arc::new(BlockingProvider {
            entered: Arc::clone(&entered),
            release_rx: Arc::new(Mutex::new(release_rx)),
        });
        let manager = manager_with_provider(provider);

        let start = Instant::now();
        manager
            .submit_stylize(valid_request())
            .expect("submit should succeed");
        assert!(
            start.elapsed() < Duration::from_millis(50),
            "submit_stylize should return quickly and not block caller thread"
        );

        let wait_start = Instant::now();
        while wait_start.elapsed() < Duration::from_millis(200) {
            if entered.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        assert!(entered.load(Ordering::SeqCst));
        assert_eq!(manager.state(), StylizeJobState::Running);

        release_tx.send(()).expect("release should succeed");

        wait_for(
            &manager,
            |state| state == StylizeJobState::Succeeded,
            Duration::from_millis(500),
        );

        let latest = manager
            .latest_update()
            .expect("latest update should be set after success");
        assert_eq!(latest.state, StylizeJobState::Succeeded);
        assert_eq!(
            latest
                .result
                .expect("successful update should carry an image")
                .raw_base64(),
            "cmVzdWx0"
        );
    }

    #[test]
    fn failed_job_transitions_to_failed_state_with_error() {
        let manager = manager_with_provider(Arc::new(FailingProvider));

        let job_id = manager
            .submit_stylize(valid_request())
            .expect("submit should succeed");

        wait_for(
            &manager,
            |state| state == StylizeJobState::Failed,
            Duration::from_millis(500),
        );

        let latest = manager.latest_update().expect("latest update should exist");
        assert_eq!(latest.job_id, job_id);
        assert!(matches!(latest.error, Some(StylizeError::Timeout)));
        assert!(latest.result.is_none());
    }

    #[test]
    fn updates_arrive_in_running_then_terminal_order() {
        let manager = manager_with_provider(Arc::new(FailingProvider));
        manager
            .submit_stylize(valid_request())
            .expect("submit should succeed");

        wait_for(
            &manager,
            |state| state == StylizeJobState::Failed,
            Duration::from_millis(500),
        );

        let updates = manager.drain_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].state, StylizeJobState::Running);
        assert_eq!(updates[1].state, StylizeJobState::Failed);
        assert!(manager.drain_updates().is_empty());
    }

    #[test]
    fn drop_waits_for_in_flight_job_to_finish() {
        let completed = Arc::new(AtomicBool::new(false));
        let provider = Arc::new(SlowCompletionProvider {
            delay: Duration::from_millis(150),
            completed: Arc::clone(&completed),
        });
        let manager = manager_with_provider(provider);

        manager
            .submit_stylize(valid_request())
            .expect("submit should succeed");

        wait_for(
            &manager,
            |state| state == StylizeJobState::Running || state == StylizeJobState::Succeeded,
            Duration::from_millis(300),
        );

        drop(manager);

        assert!(
            completed.load(Ordering::SeqCst),
            "drop should only return after the worker finishes the job"
        );
    }
}
