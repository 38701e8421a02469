//! Matching service - decides whether two images show a common person

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::face::validate_confidence_threshold;
use crate::domain::{
    CancellationSignal, DomainError, FaceHandle, FaceService, MatchReport, PersonGroupId,
};
use crate::infrastructure::image_source::ImageSource;
use crate::infrastructure::rate_limit::RateLimiter;

/// Matching service over a trained person group
pub struct MatchingService {
    faces: Arc<dyn FaceService>,
    limiter: Arc<RateLimiter>,
}

impl std::fmt::Debug for MatchingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingService").finish_non_exhaustive()
    }
}

impl MatchingService {
    pub fn new(faces: Arc<dyn FaceService>, limiter: Arc<RateLimiter>) -> Self {
        Self { faces, limiter }
    }

    /// True when at least one person identified in `image1` is also
    /// identified in `image2`
    pub async fn predict(
        &self,
        group_id: &PersonGroupId,
        confidence_threshold: f64,
        image1: &ImageSource,
        image2: &ImageSource,
    ) -> Result<bool, DomainError> {
        let report = self
            .match_images(
                group_id,
                confidence_threshold,
                image1,
                image2,
                &CancellationSignal::new(),
            )
            .await?;

        Ok(report.is_match())
    }

    /// Detect faces in both images concurrently, identify them in one call and
    /// report the people found in each image
    pub async fn match_images(
        &self,
        group_id: &PersonGroupId,
        confidence_threshold: f64,
        image1: &ImageSource,
        image2: &ImageSource,
        cancel: &CancellationSignal,
    ) -> Result<MatchReport, DomainError> {
        validate_confidence_threshold(confidence_threshold)?;

        let (faces1, faces2) = tokio::join!(
            self.detect(image1, cancel),
            self.detect(image2, cancel)
        );
        let (faces1, faces2) = (faces1?, faces2?);

        if faces1.is_empty() || faces2.is_empty() {
            info!(
                image1 = %image1,
                image2 = %image2,
                faces1 = faces1.len(),
                faces2 = faces2.len(),
                "No face in one of the images, skipping identification"
            );
            return Ok(MatchReport::without_identification(faces1, faces2));
        }

        let all_faces: Vec<FaceHandle> = faces1.iter().chain(faces2.iter()).cloned().collect();

        self.limiter.acquire_until(cancel).await?;
        let results = self
            .faces
            .identify(&all_faces, group_id, confidence_threshold)
            .await?;

        for result in &results {
            let people: Vec<&str> = result.person_ids().map(|p| p.as_str()).collect();
            debug!(face_id = %result.face_id, people = ?people, "Identified face");
        }

        let report = MatchReport::from_candidates(faces1, faces2, &results);
        info!(
            group_id = %group_id,
            image1 = %image1,
            image2 = %image2,
            people1 = report.people1.len(),
            people2 = report.people2.len(),
            is_match = report.is_match(),
            "Matched images"
        );

        Ok(report)
    }

    async fn detect(
        &self,
        image: &ImageSource,
        cancel: &CancellationSignal,
    ) -> Result<Vec<FaceHandle>, DomainError> {
        self.limiter.acquire_until(cancel).await?;
        let data = image.load().await?;
        let faces = self.faces.detect(data).await?;

        debug!(image = %image, faces = faces.len(), "Detected faces");
        Ok(faces)
    }
}
