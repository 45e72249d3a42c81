//! Composition root for command-line runs
//!
//! Builds config, durable slot, history store, session and coordinator once
//! per process and hands them to the commands.

use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::core::{Config, HistoryStore, RollbackCoordinator, Session, ShortIdIndex};

/// Everything a command needs
pub struct AppContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub session: Arc<Session>,
    pub coordinator: RollbackCoordinator,
}

impl AppContext {
    /// Load config from the standard locations and apply command-line overrides
    pub fn from_global(global: &GlobalOpts) -> Result<Self> {
        Self::with_config(Config::load(), global)
    }

    pub fn with_config(mut config: Config, global: &GlobalOpts) -> Result<Self> {
        if let Some(dir) = &global.data_dir {
            config.history.data_dir = Some(dir.clone());
        }
        if let Some(backend) = global.backend {
            config.history.backend = backend;
        }
        if let Some(id) = &global.user_id {
            config.user.id = Some(id.clone());
            config.user.name = global.user_name.clone();
        }

        let data_dir = config.data_dir();
        let slot = config.open_slot()?;
        let store = HistoryStore::open(slot, config.history.capacity);

        let session = Arc::new(match config.user.actor() {
            Some(actor) => Session::signed_in(actor),
            None => Session::anonymous(),
        });
        debug!(
            data_dir = %data_dir.display(),
            backend = %config.history.backend,
            slot = store.slot_key(),
            entries = store.len(),
            signed_in = session.is_authenticated(),
            "opened history"
        );
        let coordinator = RollbackCoordinator::new(store.into_shared(), session.clone())
            .with_policy(config.history.unauthenticated);

        Ok(Self {
            config,
            data_dir,
            session,
            coordinator,
        })
    }

    pub fn short_ids(&self) -> ShortIdIndex {
        ShortIdIndex::load(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Actor, EntityRef, HistoryFilter, IdentityProvider, SlotBackend};
    use tempfile::tempdir;

    #[test]
    fn test_context_wires_user_and_store() {
        let tmp = tempdir().unwrap();
        let global = GlobalOpts {
            data_dir: Some(tmp.path().to_path_buf()),
            user_id: Some("hub-1".to_string()),
            user_name: Some("Hub Manager".to_string()),
            ..Default::default()
        };
        let ctx = AppContext::with_config(Config::default(), &global).unwrap();
        assert_eq!(ctx.session.current_actor(), Some(Actor::new("hub-1", "Hub Manager")));

        ctx.coordinator
            .save_state("Update price", &EntityRef::new("product", "p1"), &1, &2)
            .unwrap();
        drop(ctx);

        // A second run sees the persisted entry
        let ctx = AppContext::with_config(Config::default(), &global).unwrap();
        assert_eq!(ctx.coordinator.get_history(&HistoryFilter::All).len(), 1);
    }

    #[test]
    fn test_context_sqlite_backend() {
        let tmp = tempdir().unwrap();
        let mut config = Config::default();
        config.history.backend = SlotBackend::Sqlite;
        let global = GlobalOpts {
            data_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        let ctx = AppContext::with_config(config, &global).unwrap();
        assert!(ctx.session.current_actor().is_none());
        assert!(tmp.path().join("freshline.db").exists());
    }

    #[test]
    fn test_backend_flag_overrides_config() {
        let tmp = tempdir().unwrap();
        let global = GlobalOpts {
            data_dir: Some(tmp.path().to_path_buf()),
            backend: Some(SlotBackend::Sqlite),
            ..Default::default()
        };
        let ctx = AppContext::with_config(Config::default(), &global).unwrap();
        assert_eq!(ctx.config.history.backend, SlotBackend::Sqlite);
        assert!(tmp.path().join("freshline.db").exists());
        assert!(!tmp.path().join("state_history.json").exists());
    }
}
