//! Training service - builds a person group from a training set and trains it
//!
//! Run stages: create the group, create every person concurrently, upload
//! every face concurrently, submit training, then poll until the remote job
//! reaches a terminal status. Every remote call waits on the shared rate
//! limiter first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::{
    fan_out, CancellationSignal, DomainError, FaceService, FaceUpload, PersonCreationPolicy,
    PersonEntity, PersonGroupId, PersonId, SkippedPerson, TrainingConfig, TrainingOutcome,
    TrainingReport, TrainingState, TrainingStatus, TrainingStatusKind, UploadResult,
};
use crate::infrastructure::image_source::read_image;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::train_set::TrainSet;

/// Training service for person groups
pub struct TrainingService {
    faces: Arc<dyn FaceService>,
    limiter: Arc<RateLimiter>,
    config: TrainingConfig,
}

impl std::fmt::Debug for TrainingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TrainingService {
    pub fn new(
        faces: Arc<dyn FaceService>,
        limiter: Arc<RateLimiter>,
        config: TrainingConfig,
    ) -> Self {
        Self {
            faces,
            limiter,
            config,
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train a new person group from the training set under `root`
    pub async fn train(
        &self,
        root: impl AsRef<Path>,
        cancel: &CancellationSignal,
    ) -> Result<TrainingReport, DomainError> {
        let train_set = TrainSet::scan(root).await?;
        self.train_set(PersonGroupId::generate(), &train_set, cancel)
            .await
    }

    /// Train `group_id` from an already scanned training set
    pub async fn train_set(
        &self,
        group_id: PersonGroupId,
        train_set: &TrainSet,
        cancel: &CancellationSignal,
    ) -> Result<TrainingReport, DomainError> {
        info!(
            group_id = %group_id,
            root = %train_set.root().display(),
            people = train_set.people().len(),
            images = train_set.image_count(),
            "Starting training run"
        );

        self.limiter.acquire_until(cancel).await?;
        self.faces
            .create_person_group(&group_id, group_id.as_str())
            .await?;
        info!(group_id = %group_id, "Created person group");
        log_state(&group_id, TrainingState::Created);

        let (people, skipped_people) = self.create_people(&group_id, train_set, cancel).await?;
        log_state(&group_id, TrainingState::PeopleCreated);

        let uploads = self
            .upload_faces(&group_id, train_set, &people, cancel)
            .await?;
        log_state(&group_id, TrainingState::FacesUploaded);

        let uploaded = uploads.iter().filter(|u| u.is_uploaded()).count();
        if uploaded == 0 {
            error!(group_id = %group_id, "No faces were uploaded, not submitting for training");
            return Err(DomainError::no_training_faces(group_id.as_str()));
        }

        self.limiter.acquire_until(cancel).await?;
        self.faces.submit_training(&group_id).await?;
        info!(
            group_id = %group_id,
            people = people.len(),
            faces = uploaded,
            "Submitted person group for training"
        );
        log_state(&group_id, TrainingState::Submitted);

        let status = self.wait_for_training(&group_id, cancel).await?;
        let outcome = match status.status {
            TrainingStatusKind::Succeeded => TrainingOutcome::Trained,
            _ => TrainingOutcome::Failed {
                message: status.message,
            },
        };

        let report = TrainingReport {
            group_id,
            people,
            skipped_people,
            uploads,
            outcome,
        };
        log_state(&report.group_id, report.state());

        Ok(report)
    }

    async fn create_people(
        &self,
        group_id: &PersonGroupId,
        train_set: &TrainSet,
        cancel: &CancellationSignal,
    ) -> Result<(Vec<PersonEntity>, Vec<SkippedPerson>), DomainError> {
        let report = fan_out(train_set.names().map(str::to_string), |name| async move {
            self.limiter.acquire_until(cancel).await?;
            let person = self.faces.create_person(group_id, &name).await?;
            info!(name = %name, person_id = %person.person_id, "Created person");
            Ok::<_, DomainError>(person)
        })
        .await;

        let (created, failed) = report.into_parts();
        let mut skipped = Vec::new();

        for (name, error) in failed {
            if error.is_interruption() {
                return Err(error);
            }

            match self.config.person_creation_policy {
                PersonCreationPolicy::Abort => {
                    error!(name = %name, error = %error, "Unable to create person, aborting training run");
                    return Err(error);
                }
                PersonCreationPolicy::Skip => {
                    warn!(name = %name, error = %error, "Unable to create person, skipping");
                    skipped.push(SkippedPerson {
                        name,
                        reason: error.to_string(),
                    });
                }
            }
        }

        let people = created.into_iter().map(|(_, person)| person).collect();
        Ok((people, skipped))
    }

    async fn upload_faces(
        &self,
        group_id: &PersonGroupId,
        train_set: &TrainSet,
        people: &[PersonEntity],
        cancel: &CancellationSignal,
    ) -> Result<Vec<FaceUpload>, DomainError> {
        let items: Vec<(PersonId, PathBuf)> = people
            .iter()
            .flat_map(|person| {
                let images = train_set.images_for(&person.name);
                if images.is_empty() {
                    warn!(name = %person.name, "Person has no images, skipping");
                }
                images
                    .iter()
                    .map(move |path| (person.person_id.clone(), path.clone()))
            })
            .collect();

        let report = fan_out(items, |(person_id, path)| async move {
            // Permit first, so files are only opened once the call may proceed
            self.limiter.acquire_until(cancel).await?;
            let image = read_image(&path).await?;
            self.faces.add_face(group_id, &person_id, image).await
        })
        .await;

        let mut uploads = Vec::with_capacity(report.len());

        for outcome in report.into_outcomes() {
            let (person_id, path) = outcome.key;

            let result = match outcome.result {
                Ok(face_id) => {
                    info!(path = %path.display(), "Uploaded face");
                    UploadResult::Uploaded(face_id)
                }
                Err(error) if error.is_interruption() => return Err(error),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Unable to upload face");
                    UploadResult::Failed(error.to_string())
                }
            };

            uploads.push(FaceUpload {
                person_id,
                path,
                result,
            });
        }

        Ok(uploads)
    }

    /// Poll the training status until it is terminal, the deadline passes or
    /// the run is cancelled
    async fn wait_for_training(
        &self,
        group_id: &PersonGroupId,
        cancel: &CancellationSignal,
    ) -> Result<TrainingStatus, DomainError> {
        log_state(group_id, TrainingState::Polling);

        let deadline = self.config.poll_deadline.map(|d| Instant::now() + d);
        let mut consecutive_errors = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(group_id));
            }

            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    return Err(self.deadline_exceeded(group_id));
                }
                Some(deadline) => {
                    tokio::select! {
                        biased;
                        permit = self.limiter.acquire_until(cancel) => { permit?; }
                        _ = sleep_until(deadline) => return Err(self.deadline_exceeded(group_id)),
                    }
                }
                None => {
                    self.limiter.acquire_until(cancel).await?;
                }
            }

            match self.faces.training_status(group_id).await {
                Ok(status) => {
                    consecutive_errors = 0;
                    debug!(group_id = %group_id, status = %status.status, "Polled training status");

                    if status.is_terminal() {
                        info!(group_id = %group_id, status = %status.status, "Training finished");
                        return Ok(status);
                    }
                }
                Err(error) => {
                    consecutive_errors += 1;

                    if consecutive_errors > self.config.max_poll_errors {
                        error!(
                            group_id = %group_id,
                            attempts = consecutive_errors,
                            error = %error,
                            "Training status poll failed, giving up"
                        );
                        return Err(error);
                    }

                    warn!(
                        group_id = %group_id,
                        attempt = consecutive_errors,
                        max_errors = self.config.max_poll_errors,
                        error = %error,
                        "Training status poll failed, retrying"
                    );
                }
            }

            let mut wake_at = Instant::now() + self.config.poll_interval;
            if let Some(deadline) = deadline {
                wake_at = wake_at.min(deadline);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(group_id)),
                _ = sleep_until(wake_at) => {}
            }
        }
    }

    fn deadline_exceeded(&self, group_id: &PersonGroupId) -> DomainError {
        DomainError::deadline_exceeded(format!(
            "training of person group '{}' did not finish within {:?}",
            group_id,
            self.config.poll_deadline.unwrap_or_default()
        ))
    }
}

fn cancelled(group_id: &PersonGroupId) -> DomainError {
    DomainError::cancelled(format!(
        "training of person group '{}' was cancelled",
        group_id
    ))
}

fn log_state(group_id: &PersonGroupId, state: TrainingState) {
    if state.is_terminal() {
        info!(group_id = %group_id, state = %state, "Training run finished");
    } else {
        debug!(group_id = %group_id, state = %state, "Training run state changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use crate::domain::face::MockFaceService;
    use crate::domain::PersistedFaceId;
    use crate::infrastructure::rate_limit::RateLimitConfig;

    fn limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(RateLimitConfig::default()).unwrap())
    }

    fn service(mock: MockFaceService, config: TrainingConfig) -> TrainingService {
        TrainingService::new(Arc::new(mock), limiter(), config)
    }

    /// Creates `<person>/<n>.jpg` files whose contents are `<person>-<n>`
    fn train_set_dir(people: &[(&str, usize)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, count) in people {
            let person_dir = dir.path().join(name);
            std::fs::create_dir(&person_dir).unwrap();
            for n in 1..=*count {
                std::fs::write(
                    person_dir.join(format!("{}.jpg", n)),
                    format!("{}-{}", name, n),
                )
                .unwrap();
            }
        }
        dir
    }

    fn expect_people(mock: &mut MockFaceService) {
        mock.expect_create_person_group().returning(|_, _| Ok(()));
        mock.expect_create_person().returning(|_, name| {
            Ok(PersonEntity::new(
                PersonId::new(format!("id-{}", name)),
                name,
            ))
        });
    }

    fn expect_uploads_failing_on(mock: &mut MockFaceService, failing: &'static [&'static str]) {
        mock.expect_add_face().returning(move |_, _, image| {
            let content = String::from_utf8_lossy(&image).to_string();
            if failing.contains(&content.as_str()) {
                Err(DomainError::service("add_face", "HTTP 400: No face detected"))
            } else {
                Ok(PersistedFaceId::new(format!("face-{}", content)))
            }
        });
    }

    fn expect_training_succeeds(mock: &mut MockFaceService) {
        mock.expect_submit_training().times(1).returning(|_| Ok(()));
        mock.expect_training_status()
            .returning(|_| Ok(TrainingStatus::new(TrainingStatusKind::Succeeded)));
    }

    #[tokio::test]
    async fn test_single_upload_failure_does_not_abort_run() {
        let dir = train_set_dir(&[("alice", 2), ("bob", 2), ("carol", 2)]);
        let mut mock = MockFaceService::new();
        expect_people(&mut mock);
        expect_uploads_failing_on(&mut mock, &["bob-1"]);
        expect_training_succeeds(&mut mock);

        let report = service(mock, TrainingConfig::default())
            .train(dir.path(), &CancellationSignal::new())
            .await
            .unwrap();

        assert!(report.is_trained());
        assert_eq!(report.people.len(), 3);
        assert_eq!(report.uploads.len(), 6);
        assert_eq!(report.uploaded_count(), 5);

        let failed: Vec<_> = report.failed_uploads().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path, dir.path().join("bob").join("1.jpg"));
        assert_eq!(failed[0].person_id, PersonId::new("id-bob"));
        assert!(matches!(failed[0].result, UploadResult::Failed(ref reason) if reason.contains("No face detected")));
    }

    #[tokio::test]
    async fn test_person_creation_failure_aborts_by_default() {
        let dir = train_set_dir(&[("alice", 1), ("bob", 1), ("carol", 1)]);
        let mut mock = MockFaceService::new();
        mock.expect_create_person_group().returning(|_, _| Ok(()));
        mock.expect_create_person().times(3).returning(|_, name| {
            if name == "bob" {
                Err(DomainError::service("create_person", "HTTP 500"))
            } else {
                Ok(PersonEntity::new(PersonId::new(name), name))
            }
        });
        mock.expect_add_face().times(0);
        mock.expect_submit_training().times(0);

        let result = service(mock, TrainingConfig::default())
            .train(dir.path(), &CancellationSignal::new())
            .await;

        assert!(matches!(result, Err(DomainError::Service { .. })));
    }

    #[tokio::test]
    async fn test_skip_policy_drops_failed_person() {
        let dir = train_set_dir(&[("alice", 2), ("bob", 2), ("carol", 2)]);
        let mut mock = MockFaceService::new();
        mock.expect_create_person_group().returning(|_, _| Ok(()));
        mock.expect_create_person().returning(|_, name| {
            if name == "bob" {
                Err(DomainError::service("create_person", "HTTP 409"))
            } else {
                Ok(PersonEntity::new(PersonId::new(name), name))
            }
        });
        mock.expect_add_face()
            .times(4)
            .returning(|_, person_id, _| Ok(PersistedFaceId::new(person_id.as_str())));
        expect_training_succeeds(&mut mock);

        let config =
            TrainingConfig::default().with_person_creation_policy(PersonCreationPolicy::Skip);
        let report = service(mock, config)
            .train(dir.path(), &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(report.people.len(), 2);
        assert_eq!(report.skipped_people.len(), 1);
        assert_eq!(report.skipped_people[0].name, "bob");
        assert_eq!(report.uploaded_count(), 4);
    }

    #[tokio::test]
    async fn test_person_without_images_is_tolerated() {
        let dir = train_set_dir(&[("alice", 2), ("empty", 0)]);
        let mut mock = MockFaceService::new();
        expect_people(&mut mock);
        expect_uploads_failing_on(&mut mock, &[]);
        expect_training_succeeds(&mut mock);

        let report = service(mock, TrainingConfig::default())
            .train(dir.path(), &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(report.people.len(), 2);
        assert_eq!(report.uploaded_count(), 2);
    }

    #[tokio::test]
    async fn test_no_uploaded_faces_is_not_submitted() {
        let dir = train_set_dir(&[("alice", 1), ("bob", 1)]);
        let mut mock = MockFaceService::new();
        expect_people(&mut mock);
        expect_uploads_failing_on(&mut mock, &["alice-1", "bob-1"]);
        mock.expect_submit_training().times(0);
        mock.expect_training_status().times(0);

        let result = service(mock, TrainingConfig::default())
            .train(dir.path(), &CancellationSignal::new())
            .await;

        assert!(matches!(result, Err(DomainError::NoTrainingFaces { .. })));
    }

    #[tokio::test]
    async fn test_group_creation_failure_propagates() {
        let dir = train_set_dir(&[("alice", 1)]);
        let mut mock = MockFaceService::new();
        mock.expect_create_person_group()
            .returning(|_, _| Err(DomainError::service("create_person_group", "HTTP 401")));
        mock.expect_create_person().times(0);

        let result = service(mock, TrainingConfig::default())
            .train(dir.path(), &CancellationSignal::new())
            .await;

        assert!(matches!(result, Err(DomainError::Service { .. })));
    }

    #[tokio::test]
    async fn test_training_failure_is_reported() {
        let dir = train_set_dir(&[("alice", 1)]);
        let mut mock = MockFaceService::new();
        expect_people(&mut mock);
        expect_uploads_failing_on(&mut mock, &[]);
        mock.expect_submit_training().returning(|_| Ok(()));
        mock.expect_training_status().returning(|_| {
            Ok(TrainingStatus::new(TrainingStatusKind::Failed).with_message("Training failed"))
        });

        let report = service(mock, TrainingConfig::default())
            .train(dir.path(), &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(report.state(), TrainingState::Failed);
        assert!(report.group_id_if_trained().is_none());
        assert!(matches!(
            report.into_trained(),
            Err(DomainError::TrainingFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_each_run_uses_a_new_group_id() {
        let dir = train_set_dir(&[("alice", 1)]);
        let groups = Arc::new(StdMutex::new(Vec::new()));

        let mut mock = MockFaceService::new();
        let seen = groups.clone();
        mock.expect_create_person_group()
            .times(2)
            .returning(move |group_id, _| {
                seen.lock().unwrap().push(group_id.clone());
                Ok(())
            });
        mock.expect_create_person()
            .returning(|_, name| Ok(PersonEntity::new(PersonId::new(name), name)));
        expect_uploads_failing_on(&mut mock, &[]);
        mock.expect_submit_training().returning(|_| Ok(()));
        mock.expect_training_status()
            .returning(|_| Ok(TrainingStatus::new(TrainingStatusKind::Succeeded)));

        let service = service(mock, TrainingConfig::default());
        let cancel = CancellationSignal::new();
        let first = service.train(dir.path(), &cancel).await.unwrap();
        let second = service.train(dir.path(), &cancel).await.unwrap();

        assert_ne!(first.group_id, second.group_id);
        assert_eq!(*groups.lock().unwrap(), vec![first.group_id, second.group_id]);
    }

    fn status_sequence(
        mock: &mut MockFaceService,
        statuses: Vec<Result<TrainingStatusKind, &'static str>>,
    ) -> Arc<StdMutex<Vec<Instant>>> {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let recorded = calls.clone();
        let index = AtomicUsize::new(0);

        mock.expect_training_status().returning(move |_| {
            recorded.lock().unwrap().push(Instant::now());
            let i = index.fetch_add(1, Ordering::SeqCst).min(statuses.len() - 1);
            match statuses[i] {
                Ok(kind) => Ok(TrainingStatus::new(kind)),
                Err(message) => Err(DomainError::service("training_status", message)),
            }
        });

        calls
    }

    fn group() -> PersonGroupId {
        PersonGroupId::new("group").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_succeeded() {
        let mut mock = MockFaceService::new();
        let calls = status_sequence(
            &mut mock,
            vec![
                Ok(TrainingStatusKind::Running),
                Ok(TrainingStatusKind::Running),
                Ok(TrainingStatusKind::Succeeded),
            ],
        );

        let status = service(mock, TrainingConfig::default())
            .wait_for_training(&group(), &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(status.status, TrainingStatusKind::Succeeded);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(gap >= Duration::from_secs(10));
            assert!(gap < Duration::from_secs(11));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_started_keeps_polling() {
        let mut mock = MockFaceService::new();
        let calls = status_sequence(
            &mut mock,
            vec![
                Ok(TrainingStatusKind::NotStarted),
                Ok(TrainingStatusKind::Failed),
            ],
        );

        let status = service(mock, TrainingConfig::default())
            .wait_for_training(&group(), &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(status.status, TrainingStatusKind::Failed);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_poll_errors_are_retried() {
        let mut mock = MockFaceService::new();
        let calls = status_sequence(
            &mut mock,
            vec![
                Err("HTTP 503"),
                Err("HTTP 503"),
                Ok(TrainingStatusKind::Running),
                Err("HTTP 503"),
                Ok(TrainingStatusKind::Succeeded),
            ],
        );

        let status = service(mock, TrainingConfig::default().with_max_poll_errors(2))
            .wait_for_training(&group(), &CancellationSignal::new())
            .await
            .unwrap();

        assert_eq!(status.status, TrainingStatusKind::Succeeded);
        assert_eq!(calls.lock().unwrap().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_poll_errors_fail_the_run() {
        let mut mock = MockFaceService::new();
        let calls = status_sequence(&mut mock, vec![Err("HTTP 500")]);

        let result = service(mock, TrainingConfig::default().with_max_poll_errors(2))
            .wait_for_training(&group(), &CancellationSignal::new())
            .await;

        assert!(matches!(result, Err(DomainError::Service { .. })));
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_tolerance_fails_on_first_poll_error() {
        let mut mock = MockFaceService::new();
        let calls = status_sequence(&mut mock, vec![Err("HTTP 500")]);

        let result = service(mock, TrainingConfig::default().with_max_poll_errors(0))
            .wait_for_training(&group(), &CancellationSignal::new())
            .await;

        assert!(result.is_err());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_deadline() {
        let mut mock = MockFaceService::new();
        let calls = status_sequence(&mut mock, vec![Ok(TrainingStatusKind::Running)]);

        let config = TrainingConfig::default().with_poll_deadline(Duration::from_secs(25));
        let start = Instant::now();
        let result = service(mock, config)
            .wait_for_training(&group(), &CancellationSignal::new())
            .await;

        assert!(matches!(result, Err(DomainError::DeadlineExceeded { .. })));
        assert_eq!(calls.lock().unwrap().len(), 3);
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_deadline_bounds_the_permit_wait() {
        let mut mock = MockFaceService::new();
        mock.expect_training_status().times(0);

        // One call per minute, already spent
        let limiter =
            Arc::new(RateLimiter::new(RateLimitConfig::new(1, Duration::from_secs(60))).unwrap());
        limiter.acquire().await;

        let config = TrainingConfig::default().with_poll_deadline(Duration::from_secs(5));
        let service = TrainingService::new(Arc::new(mock), limiter, config);

        let start = Instant::now();
        let result = service
            .wait_for_training(&group(), &CancellationSignal::new())
            .await;

        assert!(matches!(result, Err(DomainError::DeadlineExceeded { .. })));
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_polling() {
        let mut mock = MockFaceService::new();
        let calls = status_sequence(&mut mock, vec![Ok(TrainingStatusKind::Running)]);
        let service = service(mock, TrainingConfig::default());
        let signal = CancellationSignal::new();
        let group = group();

        let (result, _) = tokio::join!(service.wait_for_training(&group, &signal), async {
            tokio::time::sleep(Duration::from_secs(15)).await;
            signal.cancel();
        });

        assert!(matches!(result, Err(DomainError::Cancelled { .. })));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }
}
