use clap::Parser;
use deploy_scripts::{cli::Cli, client::setup_client, commands::deploy_all, errors::ScriptError};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let connection = setup_client(&cli).await?;

    deploy_all(
        connection.provider.clone(),
        connection.sender,
        &cli.artifacts_dir,
    )
    .await?;

    Ok(())
}
