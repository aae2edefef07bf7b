use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    error::Result,
    roster::{PgRoster, Roster},
    store::{AttendanceStore, postgres::PgAttendanceStore},
};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The attendance session/record store.
    pub store: Arc<dyn AttendanceStore>,
    /// The class-membership collaborator view.
    pub roster: Arc<dyn Roster>,
    /// The time source used for expiry decisions.
    pub clock: Arc<dyn Clock>,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates the production state: PostgreSQL-backed store and roster,
    /// wall-clock time.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized with deadpool-postgres");

        Ok(AppState {
            store: Arc::new(PgAttendanceStore::new(pool.clone())),
            roster: Arc::new(PgRoster::new(pool)),
            clock: Arc::new(SystemClock),
            config: config.clone(),
        })
    }

    /// Assembles state from explicit parts. Tests use this with the
    /// in-memory store and a manual clock.
    pub fn with_parts(
        store: Arc<dyn AttendanceStore>,
        roster: Arc<dyn Roster>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        Self {
            store,
            roster,
            clock,
            config,
        }
    }
}
