use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::media::{MediaStore, S3Media};
use crate::users::repo::PgUserStore;
use crate::users::store::UserStore;

/// Process-wide handles, created once at startup and passed into the router.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub media: Arc<dyn MediaStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let store = Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>;
        let media = Arc::new(S3Media::new(&config.media).await?) as Arc<dyn MediaStore>;

        Ok(Self { store, media, config })
    }

    pub fn from_parts(
        store: Arc<dyn UserStore>,
        media: Arc<dyn MediaStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self { store, media, config }
    }
}
