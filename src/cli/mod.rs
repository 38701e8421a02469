//! CLI module for the face identifier
//!
//! Subcommands:
//! - `train`: build and train a person group from a directory of people
//! - `predict`: check whether two images show a common person

pub mod predict;
pub mod train;

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::DomainError;
use crate::infrastructure::logging;

/// Face identifier - trains person groups and matches faces against them
#[derive(Parser)]
#[command(name = "face-identifier")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the face service connection
#[derive(Args, Clone, Debug, Default)]
pub struct ServiceArgs {
    /// Face service endpoint (overrides config)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Face service subscription key (overrides config)
    #[arg(long, global = true)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Train a new person group and print its id
    Train(train::TrainArgs),

    /// Print whether two images share an identified person
    Predict(predict::PredictArgs),
}

/// Load configuration, apply command line overrides and start logging
pub(crate) fn load_config(service: &ServiceArgs) -> Result<AppConfig, DomainError> {
    dotenvy::dotenv().ok();

    let config = resolve_config(AppConfig::load(), service)?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}

fn resolve_config(
    loaded: Result<AppConfig, config::ConfigError>,
    service: &ServiceArgs,
) -> Result<AppConfig, DomainError> {
    let mut config = loaded
        .map_err(|e| DomainError::configuration(format!("Invalid configuration: {}", e)))?;
    apply_overrides(&mut config, service);

    Ok(config)
}

fn apply_overrides(config: &mut AppConfig, service: &ServiceArgs) {
    if let Some(endpoint) = &service.endpoint {
        config.face_api.endpoint = endpoint.clone();
    }

    if let Some(api_key) = &service.api_key {
        config.face_api.api_key = api_key.clone();
    }
}
