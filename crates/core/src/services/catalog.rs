//! Read access to the roster, organizations, and weight classes.

use serde::Deserialize;
use taisen_common::AppResult;
use taisen_db::{
    entities::fighter::Gender,
    repositories::{FighterRepository, OrganizationRepository, WeightClassRepository},
};

use super::views::{FighterRef, OrganizationRef, WeightClassRef};

/// Maximum fighters returned for a name search.
pub const FIGHTER_SEARCH_LIMIT: u64 = 20;

/// Fighter listing query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterQuery {
    /// Only fighters of this gender.
    pub gender: Option<Gender>,
    /// Substring of the fighter's name.
    pub query: Option<String>,
}

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    fighter_repo: FighterRepository,
    organization_repo: OrganizationRepository,
    weight_class_repo: WeightClassRepository,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(
        fighter_repo: FighterRepository,
        organization_repo: OrganizationRepository,
        weight_class_repo: WeightClassRepository,
    ) -> Self {
        Self {
            fighter_repo,
            organization_repo,
            weight_class_repo,
        }
    }

    /// Fighters by name. A search is capped at [`FIGHTER_SEARCH_LIMIT`].
    pub async fn fighters(&self, query: FighterQuery) -> AppResult<Vec<FighterRef>> {
        let search = query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let limit = search.map(|_| FIGHTER_SEARCH_LIMIT);

        let fighters = self.fighter_repo.list(query.gender, search, limit).await?;
        Ok(fighters.iter().map(FighterRef::from).collect())
    }

    /// All organizations.
    pub async fn organizations(&self) -> AppResult<Vec<OrganizationRef>> {
        let organizations = self.organization_repo.find_all().await?;
        Ok(organizations.iter().map(OrganizationRef::from).collect())
    }

    /// Weight classes, optionally for one gender.
    pub async fn weight_classes(&self, gender: Option<Gender>) -> AppResult<Vec<WeightClassRef>> {
        let classes = self.weight_class_repo.list(gender).await?;
        Ok(classes.iter().map(WeightClassRef::from).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use taisen_db::entities::fighter;

    #[tokio::test]
    async fn test_fighter_search_is_limited() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fighter::Model {
                    id: 1,
                    name: "Kai Asakura".to_string(),
                    gender: Gender::Male,
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let svc = CatalogService::new(
            FighterRepository::new(db.clone()),
            OrganizationRepository::new(db.clone()),
            WeightClassRepository::new(db.clone()),
        );

        let fighters = svc
            .fighters(FighterQuery {
                gender: Some(Gender::Male),
                query: Some(" Asa ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(fighters.len(), 1);
        assert_eq!(fighters[0].name, "Kai Asakura");

        drop(svc);
        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("LIMIT"));
        assert!(log.contains("%Asa%"));
    }
}
