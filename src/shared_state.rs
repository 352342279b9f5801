use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::FromRef;

use crate::config::CalculationTable;
use crate::services::catalog::{EquipmentCatalog, StaticCatalog};

#[derive(Clone)]
pub struct AppState {
    /// Remote catalog, when one is configured
    pub remote_catalog: Option<Arc<dyn EquipmentCatalog>>,
    /// Catalog served from config, used offline
    pub offline_catalog: Arc<StaticCatalog>,
    /// Offline mode flag, toggled at runtime via API
    pub offline_mode: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        remote_catalog: Option<Arc<dyn EquipmentCatalog>>,
        offline_catalog: StaticCatalog,
        offline_mode_default: bool,
    ) -> Self {
        Self {
            remote_catalog,
            offline_catalog: Arc::new(offline_catalog),
            offline_mode: Arc::new(AtomicBool::new(offline_mode_default)),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline_mode.load(Ordering::Relaxed)
    }

    pub fn set_offline(&self, value: bool) {
        self.offline_mode.store(value, Ordering::Relaxed);
    }

    /// Catalog answering reads right now.
    pub fn catalog(&self) -> Arc<dyn EquipmentCatalog> {
        match &self.remote_catalog {
            Some(remote) if !self.is_offline() => Arc::clone(remote),
            _ => self.offline_catalog.clone() as Arc<dyn EquipmentCatalog>,
        }
    }
}

/// Router state. Handlers extract `State<AppState>` and/or
/// `State<Arc<CalculationTable>>` through `FromRef`.
#[derive(Clone)]
pub struct SharedState {
    pub app: AppState,
    pub table: Arc<CalculationTable>,
}

impl SharedState {
    pub fn new(app: AppState, table: CalculationTable) -> Self {
        Self { app, table: Arc::new(table) }
    }
}

impl FromRef<SharedState> for AppState {
    fn from_ref(shared: &SharedState) -> Self {
        shared.app.clone()
    }
}

impl FromRef<SharedState> for Arc<CalculationTable> {
    fn from_ref(shared: &SharedState) -> Self {
        Arc::clone(&shared.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::services::catalog::RestCatalog;

    #[test]
    fn test_catalog_follows_offline_flag() {
        let remote =
            RestCatalog::new("http://localhost:3000", None, Duration::from_secs(1)).unwrap();
        let state = AppState::new(Some(Arc::new(remote)), StaticCatalog::default(), false);
        assert_eq!(state.catalog().name(), "rest");

        state.set_offline(true);
        assert!(state.is_offline());
        assert_eq!(state.catalog().name(), "static");
    }

    #[test]
    fn test_without_remote_always_static() {
        let state = AppState::new(None, StaticCatalog::default(), false);
        assert!(!state.is_offline());
        assert_eq!(state.catalog().name(), "static");
    }
}
