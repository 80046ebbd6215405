pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod reservation_log;
pub mod services;

use tracing::info;

use crate::catalog::EventStore;
use crate::models::SeatingLayout;
use crate::reservation_log::ReservationLog;
use crate::services::ReservationService;

// Everything one booking session needs, wired from config
pub struct AppState {
    pub config: config::Config,
    pub service: ReservationService,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let storage = &config.storage;
        let store = EventStore::new(
            storage.catalog_path.clone(),
            SeatingLayout::standard(),
            storage.on_corrupt_record,
        );
        let log = ReservationLog::new(storage.reservation_log_path.clone());

        info!(
            "Catalog at {}, reservation log at {}, corrupt records: {:?}",
            storage.catalog_path.display(),
            storage.reservation_log_path.display(),
            storage.on_corrupt_record
        );

        let service = ReservationService::new(store, log);
        Self { config, service }
    }
}
