//! Face identifier - the training and matching entry points behind one
//! shared rate limiter

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::{MatchingService, TrainingService};
use crate::config::AppConfig;
use crate::domain::{
    CancellationSignal, DomainError, FaceService, MatchReport, PersonGroupId, TrainingConfig,
    TrainingReport,
};
use crate::infrastructure::face_api::FaceServiceFactory;
use crate::infrastructure::image_source::ImageSource;
use crate::infrastructure::rate_limit::{RateLimitConfig, RateLimiter};

/// Trains person groups and matches images against them.
///
/// Both operations draw on the same rate limiter, so concurrent training and
/// matching calls from one identifier never exceed the configured budget.
pub struct FaceIdentifier {
    limiter: Arc<RateLimiter>,
    training: TrainingService,
    matching: MatchingService,
}

impl std::fmt::Debug for FaceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceIdentifier")
            .field("rate_limit", self.limiter.config())
            .field("training", self.training.config())
            .finish_non_exhaustive()
    }
}

impl FaceIdentifier {
    pub fn new(
        faces: Arc<dyn FaceService>,
        rate_limit: RateLimitConfig,
        training: TrainingConfig,
    ) -> Result<Self, DomainError> {
        let limiter = Arc::new(RateLimiter::new(rate_limit)?);

        Ok(Self {
            training: TrainingService::new(faces.clone(), limiter.clone(), training),
            matching: MatchingService::new(faces, limiter.clone()),
            limiter,
        })
    }

    /// Build an identifier talking to the configured face service
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let faces =
            FaceServiceFactory::create(&config.face_api_config(), config.request_timeout())?;
        Self::new(faces, config.rate_limit_config(), config.training_config())
    }

    /// Train a new person group from `root`, returning its id when training
    /// succeeded and `None` when the remote job reported failure
    pub async fn train(
        &self,
        root: impl AsRef<Path>,
    ) -> Result<Option<PersonGroupId>, DomainError> {
        let report = self.train_report(root, &CancellationSignal::new()).await?;

        if !report.is_trained() {
            warn!(group_id = %report.group_id, "Person group training failed");
            return Ok(None);
        }

        info!(
            group_id = %report.group_id,
            people = report.people.len(),
            faces = report.uploaded_count(),
            "Person group trained"
        );
        Ok(Some(report.group_id))
    }

    /// Train a new person group from `root` and return the full run report
    pub async fn train_report(
        &self,
        root: impl AsRef<Path>,
        cancel: &CancellationSignal,
    ) -> Result<TrainingReport, DomainError> {
        self.training.train(root, cancel).await
    }

    /// True when the two images share at least one identified person
    pub async fn predict(
        &self,
        group_id: &PersonGroupId,
        confidence_threshold: f64,
        image1: impl AsRef<Path>,
        image2: impl AsRef<Path>,
    ) -> Result<bool, DomainError> {
        self.matching
            .predict(
                group_id,
                confidence_threshold,
                &ImageSource::from(image1.as_ref()),
                &ImageSource::from(image2.as_ref()),
            )
            .await
    }

    /// Detailed match between two images of any source
    pub async fn match_images(
        &self,
        group_id: &PersonGroupId,
        confidence_threshold: f64,
        image1: &ImageSource,
        image2: &ImageSource,
        cancel: &CancellationSignal,
    ) -> Result<MatchReport, DomainError> {
        self.matching
            .match_images(group_id, confidence_threshold, image1, image2, cancel)
            .await
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}
