//! `taskrelay config`: Configuration management commands.

use std::path::Path;

use clap::Subcommand;
use taskrelay_config::{AppConfig, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
    /// Load and check the configuration
    Validate,
}

pub async fn run(
    action: ConfigAction,
    path: &Path,
    loaded: Result<AppConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => show(loaded),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Validate => validate(path, loaded),
    }
}

fn show(loaded: Result<AppConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    let config = loaded.map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Soft problems that still let the binary run.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.store.backend == "memory" {
        warnings.push("In-memory store: tasks are lost when the process exits");
    }
    if config.store.backend != "sqlite" && config.store.path.is_some() {
        warnings.push("store.path is set but only the sqlite backend reads it");
    }
    if config.executor.timeout_ms < 100 {
        warnings.push("executor.timeout_ms below 100ms will time out most store calls");
    }
    warnings
}

fn validate(path: &Path, loaded: Result<AppConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration at {}...", path.display());

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Store:       {}", config.store.backend);
    if config.store.backend == "sqlite" {
        println!("   Database:    {}", config.store_path().display());
    }
    println!("   Timeout:     {}ms", config.executor.timeout_ms);
    println!("   Concurrency: {}", config.executor.max_concurrent);
    println!("   Audit log:   {}", config.audit.resolved_jsonl_path().display());
    println!("   Logging:     {} ({})", config.logging.level, config.logging.format);

    Ok(())
}
