use anyhow::Result;
use std::path::Path;

use crate::cli::ConfigAction;
use crate::config::LitperConfig;

/// Handle config subcommands.
pub async fn handle(action: ConfigAction, config_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = LitperConfig::config_path(config_dir);
            if path.exists() {
                println!("Config already exists at: {}", path.display());
                println!("Use `litper config show` to view it.");
                return Ok(());
            }

            let config = LitperConfig::default();
            config.save(config_dir)?;
            println!("Created default config at: {}", path.display());
            println!();
            print_config(&config, config_dir);
        }

        ConfigAction::Show => {
            let config = LitperConfig::load(config_dir)?;
            print_config(&config, config_dir);
        }
    }
    Ok(())
}

fn print_config(config: &LitperConfig, config_dir: &Path) {
    println!("Configuration:");
    println!("  state_dir:          {}", config.data_dir(config_dir).display());
    println!(
        "  api_url:            {}",
        config.api_url.as_deref().unwrap_or("(none, local data only)")
    );
    println!("  backend_timeout_ms: {}", config.backend_timeout_ms);
    println!("  bind_addr:          {}", config.bind_addr);
    println!(
        "  assistant:          {} --model {}",
        config.assistant_command, config.assistant_model
    );
    println!("  default_country:    {}", config.default_country);
    println!("  sla_days:           {}", config.sla_days);
    println!("  trend_days:         {}", config.trend_days);
    println!("  max_chat_messages:  {}", config.max_chat_messages);
    println!("  log_format:         {}", config.log_format);
    println!("  city_tick_secs:     {}", config.city_tick_secs);
}
