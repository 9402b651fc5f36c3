//! # Application State
//!
//! Shared state handed to every handler.
//!
//! ```text
//! AppState (Clone, cheap)
//! ├── db:     Database              pool handle, repositories
//! ├── blobs:  Arc<dyn BlobStore>    product images
//! ├── config: Arc<ServerConfig>     read-only after startup
//! └── offset: FixedOffset           dashboard day boundaries
//! ```
//!
//! Nothing here is mutable: stock and invoices live in the database, so no
//! mutex is needed.

use std::sync::Arc;

use chrono::FixedOffset;
use stockly_db::{BlobStore, Database};

use crate::config::{ConfigError, ServerConfig};

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub blobs: Arc<dyn BlobStore>,
    pub config: Arc<ServerConfig>,
    pub offset: FixedOffset,
}

impl AppState {
    pub fn new(
        db: Database,
        blobs: Arc<dyn BlobStore>,
        config: ServerConfig,
    ) -> Result<Self, ConfigError> {
        let offset = config.utc_offset()?;
        Ok(AppState {
            db,
            blobs,
            config: Arc::new(config),
            offset,
        })
    }
}
