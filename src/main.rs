use clap::Parser;
use face_identifier::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Train(args) => cli::train::run(cli.service, args).await,
        Command::Predict(args) => cli::predict::run(cli.service, args).await,
    }
}
