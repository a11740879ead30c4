//! Profile repository.

use std::sync::Arc;

use crate::entities::{Profile, profile};
use sea_orm::{DatabaseConnection, EntityTrait};
use taisen_common::{AppError, AppResult};
use uuid::Uuid;

/// Profile repository for database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by user ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether the user is an administrator. Unknown users are not.
    pub async fn is_admin(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some_and(|p| p.is_admin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_is_admin() {
        let id = Uuid::new_v4();
        let admin = profile::Model {
            id,
            username: Some("referee".to_string()),
            image_url: None,
            is_admin: true,
            created_at: Utc::now().into(),
            updated_at: None,
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![admin]])
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        assert!(repo.is_admin(id).await.unwrap());
        assert!(!repo.is_admin(Uuid::new_v4()).await.unwrap());
    }
}
