//! Configuration file watcher for hot reload.
//!
//! Reloaded configs only affect circuits registered afterwards; bundles that
//! already exist keep the window they were built with.
//!
//! # Design Decisions
//! - Watches the parent directory so editors that replace the file on save
//!   are still seen
//! - Only validated configs are forwarded; a broken file keeps the current one
//! - A reload that parses to the config last forwarded is dropped

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::StatsConfig;
use crate::registry::Registry;

/// Poll interval for backends that cannot subscribe to file events.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches one stats config file and forwards validated reloads.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<StatsConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for validated reloads.
    /// Feed the receiver to [`apply_updates`].
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<StatsConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            update_tx,
        };
        (watcher, update_rx)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Start watching. Reloads stop, and the receiver closes, when the
    /// returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Some(file_name) = self.path.file_name().map(OsString::from) else {
            return Err(notify::Error::path_not_found().add_path(self.path));
        };
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // Whatever is on disk now is the baseline; rewriting it unchanged is not a reload.
        let mut last = load_config(&self.path).ok();
        let path = self.path.clone();
        let tx = self.update_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &file_name) => match load_config(&path) {
                    Ok(config) if last.as_ref() == Some(&config) => {
                        tracing::trace!(path = ?path, "Config file rewritten without changes");
                    }
                    Ok(config) => {
                        tracing::info!(path = ?path, "Config file change detected, reloading");
                        last = Some(config.clone());
                        if tx.send(config).is_err() {
                            tracing::debug!(path = ?path, "No receiver for config reloads");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = ?path,
                            error = %e,
                            "Failed to reload config, keeping current configuration"
                        );
                    }
                },
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// A create or modify event that names the watched file.
fn touches(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// Apply every update from `updates` to `registry` until the sender side closes.
pub async fn apply_updates(
    registry: &Registry,
    mut updates: mpsc::UnboundedReceiver<StatsConfig>,
) {
    while let Some(config) = updates.recv().await {
        if let Err(e) = registry.apply_config(config) {
            tracing::warn!(error = %e, "Rejected configuration update");
        }
    }
    tracing::debug!("Config update channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use notify::event::{AccessKind, CreateKind, DataChange, EventKind, ModifyKind};

    #[test]
    fn test_touches_only_the_watched_file() {
        let name = OsString::from("stats.toml");
        let modify = || EventKind::Modify(ModifyKind::Data(DataChange::Any));

        let own = Event::new(modify()).add_path(PathBuf::from("/etc/app/stats.toml"));
        assert!(touches(&own, &name));

        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/app/stats.toml"));
        assert!(touches(&created, &name));

        let sibling = Event::new(modify()).add_path(PathBuf::from("/etc/app/other.toml"));
        assert!(!touches(&sibling, &name));

        let read = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/etc/app/stats.toml"));
        assert!(!touches(&read, &name));
    }

    #[tokio::test]
    async fn test_apply_updates_swaps_registry_config() {
        let registry = Registry::new(StatsConfig::default()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut next = StatsConfig::default();
        next.rolling.num_buckets = 3;
        tx.send(next).unwrap();

        let mut invalid = StatsConfig::default();
        invalid.rolling.num_buckets = 0;
        tx.send(invalid).unwrap();
        drop(tx);

        apply_updates(&registry, rx).await;
        assert_eq!(registry.config().rolling.num_buckets, 3);
    }

    #[tokio::test]
    async fn test_file_change_reaches_registry() {
        let dir = std::env::temp_dir().join(format!("circuit-stats-watch-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stats.toml");
        fs::write(&path, "[rolling]\nnum_buckets = 5\n").unwrap();

        let registry = Arc::new(Registry::new(StatsConfig::default()).unwrap());
        let (watcher, rx) = ConfigWatcher::new(&path);
        let handle = watcher
            .with_poll_interval(Duration::from_millis(50))
            .run()
            .unwrap();
        let applier = {
            let registry = registry.clone();
            tokio::spawn(async move { apply_updates(&registry, rx).await })
        };

        // An invalid edit is skipped; the valid one after it goes through.
        fs::write(&path, "[rolling]\nnum_buckets = 0\n").unwrap();
        fs::write(&path, "[rolling]\nnum_buckets = 3\n").unwrap();

        let reloaded = tokio::time::timeout(Duration::from_secs(5), async {
            while registry.config().rolling.num_buckets != 3 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        assert!(reloaded.is_ok(), "reload did not reach the registry");

        let circuit = registry.bundles_for("after-reload").unwrap();
        assert_eq!(circuit.command().rolling_config().num_buckets, 3);

        // Dropping the handle closes the channel and ends the applier.
        drop(handle);
        tokio::time::timeout(Duration::from_secs(5), applier)
            .await
            .expect("applier should stop once the watcher is gone")
            .unwrap();

        fs::remove_dir_all(&dir).unwrap_or_default();
    }
}
