//! Weight class repository.

use std::sync::Arc;

use crate::entities::{WeightClass, fighter::Gender, weight_class};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use taisen_common::{AppError, AppResult};

/// Weight class repository for database operations.
#[derive(Clone)]
pub struct WeightClassRepository {
    db: Arc<DatabaseConnection>,
}

impl WeightClassRepository {
    /// Create a new weight class repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a weight class by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<weight_class::Model>> {
        WeightClass::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find weight classes by IDs.
    pub async fn find_by_ids(&self, ids: &[i32]) -> AppResult<Vec<weight_class::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        WeightClass::find()
            .filter(weight_class::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Weight classes in ID order, optionally for one gender.
    pub async fn list(&self, gender: Option<Gender>) -> AppResult<Vec<weight_class::Model>> {
        let mut query = WeightClass::find().order_by_asc(weight_class::Column::Id);

        if let Some(gender) = gender {
            query = query.filter(weight_class::Column::Gender.eq(gender));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_list_by_gender() {
        let class = weight_class::Model {
            id: 4,
            name: "Flyweight".to_string(),
            gender: Gender::Female,
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[class]])
                .into_connection(),
        );

        let repo = WeightClassRepository::new(db);
        let classes = repo.list(Some(Gender::Female)).await.unwrap();

        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].gender, Gender::Female);
    }
}
