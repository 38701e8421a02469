//! Train command - builds a person group from a training directory

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tokio::signal;
use tracing::{info, warn};

use super::{load_config, ServiceArgs};
use crate::domain::CancellationSignal;
use crate::infrastructure::services::FaceIdentifier;

/// Arguments for the train command
#[derive(Args, Clone, Debug)]
pub struct TrainArgs {
    /// Directory holding one subdirectory of images per person
    pub root: PathBuf,
}

/// Run a training job and print the trained group id on stdout
pub async fn run(service: ServiceArgs, args: TrainArgs) -> anyhow::Result<()> {
    let config = load_config(&service)?;
    let identifier = FaceIdentifier::from_config(&config)?;

    let cancel = CancellationSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling training run");
            on_interrupt.cancel();
        }
    });

    let report = identifier
        .train_report(&args.root, &cancel)
        .await
        .with_context(|| format!("training from {} failed", args.root.display()))?;

    for upload in report.failed_uploads() {
        warn!(path = %upload.path.display(), "Face was not uploaded");
    }

    let group_id = report.into_trained()?;
    info!(group_id = %group_id, "Training complete");
    println!("{}", group_id);

    Ok(())
}
