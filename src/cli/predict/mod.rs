//! Predict command - checks two images against a trained person group

use std::path::PathBuf;

use clap::Args;

use super::{load_config, ServiceArgs};
use crate::domain::PersonGroupId;
use crate::infrastructure::services::FaceIdentifier;

/// Arguments for the predict command
#[derive(Args, Clone, Debug)]
pub struct PredictArgs {
    /// Id of a trained person group
    pub group_id: String,

    /// Minimum identification confidence, between 0 and 1
    pub threshold: f64,

    pub image1: PathBuf,

    pub image2: PathBuf,
}

/// Print `true` when both images show a common person, `false` otherwise
pub async fn run(service: ServiceArgs, args: PredictArgs) -> anyhow::Result<()> {
    let config = load_config(&service)?;
    let identifier = FaceIdentifier::from_config(&config)?;
    let group_id = PersonGroupId::new(args.group_id)?;

    let matched = identifier
        .predict(&group_id, args.threshold, &args.image1, &args.image2)
        .await?;

    println!("{}", matched);

    Ok(())
}
