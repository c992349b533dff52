use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::pagination::Paginator;
use crate::posts::repository::{BlogRepository, SqliteBlogRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub blog: Arc<dyn BlogRepository>,
}

impl AppState {
    /// State backed by the SQLite repository on `db`.
    pub fn new(db: DbPool, config: Config) -> Self {
        let blog = Arc::new(SqliteBlogRepository::new(db.clone()));
        Self { db, config, blog }
    }

    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.config.feed.page_size)
    }
}
