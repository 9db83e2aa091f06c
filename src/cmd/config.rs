//! Configuration commands — `scopectl config`.

use anyhow::Result;
use console::style;
use scopectl::config::Config;
use scopectl::ui;

use super::super::ConfigCommands;

pub fn cmd_config(command: Option<ConfigCommands>) -> Result<()> {
    let path = Config::default_path()?;
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = Config::load()?;
            println!("{}", style("scopectl configuration").bold());
            println!();
            if path.exists() {
                ui::detail("config file", &path.display().to_string());
            } else {
                ui::notice("No config file; showing defaults and environment overrides.");
            }
            println!();
            println!("[services]");
            ui::detail("session_url", &config.services.session_url);
            ui::detail("organizations_url", &config.services.organizations_url);
            ui::detail("companies_url", &config.services.companies_url);
            ui::detail("products_url", &config.services.products_url);
            ui::detail("authorization_url", &config.services.authorization_url);
            println!();
            println!("[session]");
            ui::detail(
                "token",
                if config.session.token.is_some() {
                    "set"
                } else {
                    "not set"
                },
            );
            println!();
            println!("[state]");
            ui::detail(
                "dir",
                &config
                    .state
                    .dir
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_else(|| "default".to_string()),
            );
        }
        Some(ConfigCommands::Path) => {
            println!("{}", path.display());
        }
        Some(ConfigCommands::Init { force }) => {
            if path.exists() && !force {
                ui::notice(&format!(
                    "Config already exists at {} (use --force to overwrite)",
                    path.display()
                ));
                return Ok(());
            }
            Config::default().write_to(&path)?;
            ui::success(&format!("Wrote default config to {}", path.display()));
        }
    }
    Ok(())
}
