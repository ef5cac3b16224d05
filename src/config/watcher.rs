//! Hot reload of the configuration file.
//!
//! The parent directory is watched rather than the file itself: editors that
//! save by writing a temporary file and renaming it over the original replace
//! the inode, and a watch on the old inode goes silent.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Watches one configuration file and forwards every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for validated configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Events stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Self { path, update_tx } = self;
        let file_name = path.file_name().map(|name| name.to_os_string());

        let handler_path = path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };

                let touches_config = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == file_name.as_deref());
                if !touches_config || !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }

                match load_config(&handler_path) {
                    Ok(config) => {
                        tracing::info!(path = %handler_path.display(), "Configuration reloaded");
                        if update_tx.send(config).is_err() {
                            tracing::warn!("Config receiver dropped; change not applied");
                        }
                    }
                    Err(e) => tracing::error!(
                        path = %handler_path.display(),
                        error = %e,
                        "Rejected config change; keeping current configuration"
                    ),
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), dir = %dir.display(), "Watching configuration");
        Ok(watcher)
    }
}
