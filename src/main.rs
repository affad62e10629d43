use clap::Parser;
use twrec::application::{ejecutar_cli, preparar_config};
use twrec::infrastructure::init_tracing;
use twrec::presentation::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = preparar_config(&cli)?;
    let _telemetry = init_tracing(&config.log_level, config.log_file.as_deref());

    ejecutar_cli(cli, config).await
}
