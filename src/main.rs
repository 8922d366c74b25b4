//! Kiosk Controls CLI - validate, render and simulate a kiosk controller

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::mpsc;

use kiosk_controls::reconcile::ToggleLabel;
use kiosk_controls::store::SettingKey;
use kiosk_controls::{
    FixSuggestion, KioskConfig, KioskController, KioskError, KioskMode, MemoryBackend, PanelIds,
    PanelLayout, RawEvent, RecordingHousekeeping, RecordingSurface,
};

#[derive(Parser)]
#[command(name = "kiosk-controls")]
#[command(about = "Kiosk Controls - kiosk mode controller for shared touch-panel devices")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file
    Validate {
        /// Path to config.yaml (default: ~/.config/kiosk-controls/config.yaml)
        config: Option<PathBuf>,
    },

    /// Print the control panel XML
    Panel {
        /// Path to config.yaml
        config: Option<PathBuf>,

        /// Render the toggle as it looks while kiosk mode is on
        #[arg(long)]
        enabled: bool,
    },

    /// Run the controller against in-memory device fakes
    Simulate {
        /// Path to config.yaml
        config: Option<PathBuf>,

        /// JSON-lines file of inbound events to replay
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Start with kiosk mode on
        #[arg(long)]
        enabled: bool,

        /// Initial kiosk URL
        #[arg(long, default_value = "")]
        url: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { config } => validate_config(config),
        Commands::Panel { config, enabled } => print_panel(config, enabled),
        Commands::Simulate {
            config,
            script,
            enabled,
            url,
        } => simulate(config, script, enabled, &url).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<KioskConfig, KioskError> {
    let path = path.unwrap_or_else(KioskConfig::config_path);
    KioskConfig::load(&path)
}

fn validate_config(path: Option<PathBuf>) -> Result<(), KioskError> {
    let config = load_config(path)?;

    println!("{} Config '{}' is valid", "✓".green(), config.name);
    println!("  Panel id: {}", config.panel_id);
    println!(
        "  PIN unlock: {}",
        if config.pin_unlock_enabled() { "on" } else { "off" }
    );
    println!("  Destinations: {}", config.destinations.len());
    for (i, dest) in config.destinations.iter().enumerate() {
        println!("    {}. {} {}", i + 1, dest.label.bold(), dest.url.dimmed());
    }

    Ok(())
}

fn print_panel(path: Option<PathBuf>, enabled: bool) -> Result<(), KioskError> {
    let config = load_config(path)?;
    let registry = config.registry()?;
    let ids = PanelIds::new(config.panel_id.as_str());
    let toggle = if enabled {
        ToggleLabel::Disable
    } else {
        ToggleLabel::Enable
    };

    let layout = PanelLayout::control_panel(&config.name, &ids, &registry, toggle.text(), None);
    println!("{}", layout.to_xml());
    Ok(())
}

async fn simulate(
    path: Option<PathBuf>,
    script: Option<PathBuf>,
    enabled: bool,
    url: &str,
) -> Result<(), KioskError> {
    let config = load_config(path)?;

    let events = match script {
        Some(script) => {
            let content = tokio::fs::read_to_string(&script).await?;
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str::<RawEvent>(line))
                .collect::<Result<Vec<_>, _>>()?
        }
        None => Vec::new(),
    };

    let mode = if enabled {
        KioskMode::Enabled
    } else {
        KioskMode::Disabled
    };
    let backend = Arc::new(MemoryBackend::with_kiosk(mode.as_setting(), url));
    let surface = Arc::new(RecordingSurface::new());
    let controller = KioskController::new(
        config,
        backend.clone(),
        surface.clone(),
        Arc::new(RecordingHousekeeping::new()),
    )?;

    controller.start().await?;

    let (tx, rx) = mpsc::channel(events.len().max(1));
    for event in events {
        // capacity fits the whole script
        let _ = tx.try_send(event);
    }
    drop(tx);
    controller.run(rx).await;

    let selected = surface.widget_value(&controller.ids().site_group());
    println!("{}", "Final state:".cyan().bold());
    println!(
        "  Mode: {}",
        backend.value(SettingKey::KioskMode).unwrap_or_default()
    );
    println!(
        "  URL: {}",
        backend.value(SettingKey::KioskUrl).unwrap_or_default()
    );
    println!("  Selected: {}", selected.as_deref().unwrap_or("-"));

    println!("{}", "Events:".cyan().bold());
    println!(
        "{}",
        serde_json::to_string_pretty(&controller.event_log().to_json())?
    );
    Ok(())
}
