use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swipe_mission::api::{self, StaticDirs};
use swipe_mission::config::ServerConfig;
use swipe_mission::corpus::ImageCorpus;
use swipe_mission::db::KvStore;
use swipe_mission::session::SessionService;

#[derive(Parser)]
#[command(name = "swipe")]
#[command(about = "Swipe-to-label image review server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    config: ServerConfig,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the review server (default)
    Serve,
    /// Print every attitude with its labeling progress
    Attitudes,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "swipe_mission=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_service(config: &ServerConfig) -> anyhow::Result<SessionService> {
    let corpus = ImageCorpus::scan(
        &config.images_dir,
        &config.results_dir,
        config.image_extensions.as_slice(),
    )?;
    let store: Arc<dyn KvStore> = Arc::new(config.open_database()?);
    Ok(SessionService::new(store, Arc::new(corpus))?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.config;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Starting swipe server on {}", config.bind_addr());

            let sessions = Arc::new(build_service(&config)?);
            let files = StaticDirs {
                images: config.images_dir.clone(),
                frontend: config.frontend_dir.clone(),
            };
            let app = api::create_router(sessions, Some(files));

            let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
            tracing::info!("Swipe server listening on http://{}", config.bind_addr());

            axum::serve(listener, app).await?;
        }
        Commands::Attitudes => {
            let sessions = build_service(&config)?;
            for attitude in sessions.list_attitudes() {
                println!(
                    "{} ({}/{}, {} correct, {} wrong)",
                    attitude.name, attitude.progress, attitude.total, attitude.correct, attitude.wrong
                );
            }
        }
    }

    Ok(())
}
