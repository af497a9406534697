mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use fertiplan::config::{Config, OutputFormat};
use fertiplan::settings::{load_project, Settings};
use fertiplan::logic::AdvisoryEngine;
use fertiplan::{compute_recommendation, compute_scenario, seed};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the result.
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // `init --config <new file>` starts from defaults.
    let config = match (&cli.command, cli.config.as_deref()) {
        (Commands::Init { .. }, Some(p)) if !p.exists() => Config::default(),
        (_, path) => Config::load(path).context("Failed to load configuration")?,
    };
    let settings_path = config.settings_path(cli.settings.as_deref())?;

    match cli.command {
        Commands::Init { force } => init(&config, cli.config.as_deref(), &settings_path, force),
        Commands::Check => check(&settings_path),
        Commands::Regions => {
            let settings = load_settings(&settings_path)?;
            for region in settings.regions() {
                println!("{}", region);
            }
            Ok(())
        }
        Commands::Crops => {
            let settings = load_settings(&settings_path)?;
            for crop in settings.crops() {
                if settings.crop_meta.is_orchard(&crop) {
                    println!("{} (orchard)", crop);
                } else {
                    println!("{}", crop);
                }
            }
            Ok(())
        }
        Commands::Recommend {
            project,
            scenario,
            format,
        } => {
            let settings = load_settings(&settings_path)?;
            let precision = config.default_precision.unwrap_or(settings.ui.precision);
            let input = load_project(&project, &settings, precision)
                .with_context(|| format!("Failed to load project {}", project.display()))?;

            let recommendation = match scenario.as_deref() {
                Some(name) => compute_scenario(&input, &settings, name)?,
                None => compute_recommendation(&input, &settings),
            };
            if recommendation.is_blocked() {
                tracing::warn!("Recommendation for {} is blocked", recommendation.project_id);
            }
            emit(&recommendation, format.unwrap_or(config.output))
        }
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load(path).with_context(|| {
        format!(
            "Failed to load settings from {} (run `fertiplan init` to create them)",
            path.display()
        )
    })
}

fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", text);
    Ok(())
}

fn check(settings_path: &Path) -> Result<()> {
    let settings = load_settings(settings_path)?;
    println!("Settings: {}", settings_path.display());
    for (nutrient, table) in settings.reference_tables.iter() {
        println!(
            "  {:<5} {} bins, {} region tables",
            nutrient.as_str(),
            table.bins.len(),
            table.supported_region_tables.len()
        );
    }
    println!("  Products: {}", settings.fertilizer_catalog.len());
    println!("  Presets:  {}", settings.schedule_presets.len());
    println!("  Rules:    {}", settings.adjustment_rules.len());
    let advisories: Vec<&str> = AdvisoryEngine::new()
        .list_advisories()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    println!("  Advisories: {}", advisories.join(", "));
    println!("  Regions:  {}", settings.regions().join(", "));
    println!("OK");
    Ok(())
}

fn init(
    config: &Config,
    config_override: Option<&Path>,
    settings_path: &Path,
    force: bool,
) -> Result<()> {
    let written = seed::write_seed(settings_path, force)?;
    for path in &written {
        println!("Wrote {}", path.display());
    }

    let config_path = match config_override {
        Some(p) => p.to_path_buf(),
        None => Config::default_config_path()?,
    };
    if config_path.exists() && !force {
        println!("Keeping existing config {}", config_path.display());
        return Ok(());
    }

    let new_config = Config {
        settings_path: Some(settings_path.to_path_buf()),
        ..config.clone()
    };
    new_config.write(&config_path)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
