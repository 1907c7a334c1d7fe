//! `ledgerloop config`: configuration management commands.

use ledgerloop_config::AppConfig;
use std::path::{Path, PathBuf};

pub fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn validate(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");
    if let Err(e) = config.validate() {
        println!("   Config error: {e}");
        return Err(e.into());
    }

    println!("   All checks passed");
    println!();
    println!("   Max iterations:  {}", config.executor.max_iterations);
    println!("   Return steps:    {}", config.executor.return_intermediate_steps);
    println!("   Parse recovery:  {}", config.executor.handle_parsing_errors);
    println!("   Memory:          {}", config.memory.backend);
    println!("   Log format:      {}", config.logging.format);
    Ok(())
}

pub fn path(explicit: Option<&Path>) {
    println!("{}", config_path(explicit).display());
}

fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}
