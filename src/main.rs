use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use weatherdash::api::AppState;
use weatherdash::{
    ConsolePresenter, CycleOutcome, DashboardSession, IpPositionSensor, PreferenceStore,
    PresentationPort, RecordingPresenter, WeatherDashConfig, logging, web,
};

mod cli;

use cli::{Cli, Command, ShowArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = WeatherDashConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.cmd {
        Command::Show(args) => show(&config, args).await,
        Command::Serve { port } => serve(&config, port).await,
        Command::User { name } => user(&config, name).await,
    }
}

fn session(
    config: &WeatherDashConfig,
    presenter: Arc<dyn PresentationPort>,
) -> Result<DashboardSession> {
    let sensor = Arc::new(IpPositionSensor::new(&config.location.ip_lookup_url)?);
    Ok(DashboardSession::from_config(config, sensor, presenter)?)
}

async fn show(config: &WeatherDashConfig, args: ShowArgs) -> Result<()> {
    let recorder = Arc::new(RecordingPresenter::new());
    let presenter: Arc<dyn PresentationPort> = if args.json {
        recorder.clone()
    } else {
        Arc::new(ConsolePresenter)
    };
    let session = session(config, presenter)?;

    let outcome = match args.city {
        Some(city) => session.change_city(&city).await,
        None if args.device => session.locate().await,
        None => session.load_initial().await,
    }
    .map_err(|e| anyhow!(e.user_message()))?;

    if args.json {
        if let CycleOutcome::Applied(_) = outcome {
            let snapshot = recorder.take_snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }
    Ok(())
}

async fn serve(config: &WeatherDashConfig, port: u16) -> Result<()> {
    let presenter = Arc::new(RecordingPresenter::new());
    let session = Arc::new(session(config, presenter.clone())?);
    let preferences = Arc::new(
        PreferenceStore::open(&config.preferences.path)
            .with_context(|| format!("Failed to open preferences at {}", config.preferences.path))?,
    );

    let initial = session.clone();
    tokio::spawn(async move {
        if let Err(e) = initial.load_initial().await {
            tracing::error!("Initial load failed: {}", e);
        }
    });

    web::run(
        port,
        AppState {
            session,
            presenter,
            preferences,
        },
    )
    .await
}

async fn user(config: &WeatherDashConfig, name: Option<String>) -> Result<()> {
    let preferences = PreferenceStore::open(&config.preferences.path)
        .with_context(|| format!("Failed to open preferences at {}", config.preferences.path))?;

    let name = match name {
        Some(name) => preferences.set_display_name(&name).await?,
        None => preferences.display_name().await?,
    };
    println!("{name}");
    Ok(())
}
