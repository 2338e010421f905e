use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytdataset::cli::{Cli, Commands};
use ytdataset::config::Config;
use ytdataset::pipeline::DatasetPipeline;
use ytdataset::playlist::PlaylistResolver;
use ytdataset::progress::{ConsoleObserver, ProgressObserver, TracingObserver};
use ytdataset::{output, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "ytdataset=debug" } else { "ytdataset=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Create {
            url,
            output,
            min_clips,
        } => {
            warn_missing_dependencies(&config).await;
            let output_dir = output.unwrap_or_else(|| config.dataset.output_dir.clone());
            let min_clips = min_clips.unwrap_or(config.dataset.min_clips);
            let pipeline = DatasetPipeline::new(config, observer(cli.quiet));

            tracing::info!("Starting dataset creation for URL: {}", url);

            let outcome = pipeline.create_from_url(&url, &output_dir, min_clips).await?;
            output::print_outcome(&outcome);
        }
        Commands::Batch {
            urls_file,
            output,
            min_clips,
        } => {
            warn_missing_dependencies(&config).await;
            let output_dir = output.unwrap_or_else(|| config.dataset.output_dir.clone());
            let min_clips = min_clips.unwrap_or(config.dataset.min_clips);
            let pipeline = DatasetPipeline::new(config, observer(cli.quiet));

            let report = pipeline
                .create_from_url_json(&urls_file, &output_dir, min_clips)
                .await?;
            output::print_batch_report(&report);
        }
        Commands::Playlist { url, output } => {
            let resolver = PlaylistResolver::new(&config.playlist.user_agent)?;
            let urls = resolver.resolve(&url).await?;

            match output {
                Some(path) => {
                    output::save_urls(&urls, &path)?;
                    println!("{} URLs saved to: {}", urls.len(), path.display());
                }
                None => output::print_urls(&urls),
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the configuration file to change settings:");
                match cli.config {
                    Some(path) => println!("  {}", path.display()),
                    None => println!("  {}", Config::config_path()?.display()),
                }
            }
        }
        Commands::Check => {
            let missing = utils::check_dependencies(&config.tools).await;
            if missing.is_empty() {
                println!("All external tools are available.");
            } else {
                println!("Missing tools:");
                for dep in &missing {
                    println!("  • {}", dep);
                }
                anyhow::bail!("{} required tool(s) missing", missing.len());
            }
        }
    }

    Ok(())
}

fn observer(quiet: bool) -> Box<dyn ProgressObserver> {
    if quiet {
        Box::new(TracingObserver)
    } else {
        Box::new(ConsoleObserver::new())
    }
}

// Non-fatal: the tools may still be reachable at run time
async fn warn_missing_dependencies(config: &Config) {
    let missing = utils::check_dependencies(&config.tools).await;
    if !missing.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }
}
