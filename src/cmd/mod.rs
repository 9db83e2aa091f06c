//! CLI command implementations.
//!
//! | Module   | Commands handled                                  |
//! |----------|---------------------------------------------------|
//! | `status` | `status`, `permissions`                           |
//! | `scope`  | `orgs`, `companies`, `products`, `use`, `up`      |
//! | `config` | `config`                                          |

pub mod config;
pub mod scope;
pub mod status;

pub use config::cmd_config;
pub use scope::{cmd_companies, cmd_orgs, cmd_products, cmd_up, cmd_use};
pub use status::{cmd_permissions, cmd_status};

use std::sync::Arc;

use anyhow::{Context, Result};
use scopectl::clients::http::PlatformClient;
use scopectl::clients::SessionProvider;
use scopectl::config::Config;
use scopectl::context::{ActiveContextManager, FileContextStore};
use scopectl::ui;
use tracing::warn;

/// Build the manager against the configured services, resolve the session,
/// and run the bootstrap load. Every command starts here; the persisted
/// context from the previous invocation is restored inside `initialize`.
pub(crate) async fn bootstrap() -> Result<ActiveContextManager> {
    let config = Config::load()?;
    let client = Arc::new(PlatformClient::new(&config).context("Failed to build HTTP client")?);
    let store = Arc::new(match &config.state.dir {
        Some(dir) => FileContextStore::in_dir(dir),
        None => FileContextStore::at_default_path()?,
    });

    let manager = ActiveContextManager::new(
        client.clone(),
        client.clone(),
        client.clone(),
        client.clone(),
        client.clone(),
        store,
    );

    let user_id = match client.current_user().await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "failed to resolve session user");
            None
        }
    };

    let pb = ui::spinner("Loading scope…");
    manager.initialize(user_id.as_deref()).await;
    pb.finish_and_clear();

    Ok(manager)
}
