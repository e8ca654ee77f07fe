use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tributary::app::AppContext;
use tributary::cli::{commands, Cli, Commands};
use tributary::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(workers) = cli.workers {
        config.ingest.workers = workers;
    }

    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Subscribe { url, no_wait } => {
            commands::subscribe(&ctx, &url, !no_wait).await?;
        }
        Commands::Poll { no_wait } => {
            commands::poll_sources(&ctx, !no_wait).await?;
        }
        Commands::Discover { url } => {
            commands::discover(&ctx, &url).await?;
        }
        Commands::Article { url } => {
            commands::fetch_article(&ctx, &url).await?;
        }
        Commands::Extract { url } => {
            commands::extract(&ctx, &url).await?;
        }
        Commands::List { source, limit } => match source {
            Some(source) => commands::list_articles(&ctx, &source, limit)?,
            None => commands::list_sources(&ctx)?,
        },
    }

    ctx.queue.shutdown();
    Ok(())
}
