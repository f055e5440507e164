pub mod db;
pub mod feed;
pub mod models;
pub mod settings;
pub mod store;
pub mod utils;
pub mod validation;

use std::sync::Arc;

use anyhow::Result;
use log::info;

use db::Database;
use settings::{Backend, Settings};
use store::{FactStore, SupabaseStore};

/// Opens whichever store the settings select.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn FactStore>> {
    match settings.backend {
        Backend::Supabase => {
            info!("Using hosted store at {}", settings.supabase.url);
            Ok(Arc::new(SupabaseStore::new(&settings.supabase)?))
        }
        Backend::Sqlite => {
            let database = Database::new(settings.sqlite.path.clone())?;
            info!("Using local store at {}", database.path().display());
            Ok(Arc::new(database))
        }
    }
}
