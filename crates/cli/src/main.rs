use clap::Parser;
use mercado::Cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    mercado_utils::init_tracing().map_err(|e| eyre::eyre!(e))?;

    let cli = Cli::parse();
    cli.command.execute(cli.config.as_deref()).await
}
