//! Fight card service: creation and read models.

use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use taisen_common::{AppError, AppResult, LocalDay};
use taisen_db::{
    entities::{fight_card, vote::VoteType},
    repositories::{
        FightCardRepository, FighterRepository, OrganizationRepository, VoteRepository,
        WeightClassRepository,
    },
};
use validator::Validate;

use super::session::Session;
use super::views::{CardRefs, FightCardView};

/// Default number of cards a user may create per local day.
pub const DEFAULT_DAILY_FIGHT_CARDS: u64 = 3;

/// Input for creating a fight card. Unselected fields are `None`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFightCardInput {
    /// First-listed fighter.
    #[validate(range(min = 1))]
    pub fighter1_id: Option<i32>,
    /// Second-listed fighter.
    #[validate(range(min = 1))]
    pub fighter2_id: Option<i32>,
    /// Promoting organization.
    #[validate(range(min = 1))]
    pub organization_id: Option<i32>,
    /// Weight class; must match the fighters' gender.
    #[validate(range(min = 1))]
    pub weight_class_id: Option<i32>,
}

/// Fight card service for business logic.
#[derive(Clone)]
pub struct FightCardService {
    fight_card_repo: FightCardRepository,
    fighter_repo: FighterRepository,
    organization_repo: OrganizationRepository,
    weight_class_repo: WeightClassRepository,
    vote_repo: VoteRepository,
    day: LocalDay,
    daily_limit: u64,
}

impl FightCardService {
    /// Create a new fight card service.
    #[must_use]
    pub const fn new(
        fight_card_repo: FightCardRepository,
        fighter_repo: FighterRepository,
        organization_repo: OrganizationRepository,
        weight_class_repo: WeightClassRepository,
        vote_repo: VoteRepository,
        day: LocalDay,
        daily_limit: u64,
    ) -> Self {
        Self {
            fight_card_repo,
            fighter_repo,
            organization_repo,
            weight_class_repo,
            vote_repo,
            day,
            daily_limit,
        }
    }

    /// Propose a new matchup.
    ///
    /// Checks run in order: sign-in, the daily quota, field validation, then
    /// the duplicate matchup check. The unique index on the matchup is the
    /// final arbiter; a lost race surfaces as [`AppError::Conflict`].
    pub async fn create(
        &self,
        session: &Session,
        input: CreateFightCardInput,
    ) -> AppResult<FightCardView> {
        let user_id = session.require_user()?;

        let created_today = self
            .fight_card_repo
            .count_created_since(user_id, self.day.start_of_today())
            .await?;
        if created_today >= self.daily_limit {
            return Err(AppError::QuotaExceeded(format!(
                "Fight cards can be created up to {} times per day",
                self.daily_limit
            )));
        }

        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let (Some(fighter1_id), Some(fighter2_id)) = (input.fighter1_id, input.fighter2_id) else {
            return Err(AppError::Validation("Select both fighters".to_string()));
        };
        let weight_class_id = input
            .weight_class_id
            .ok_or_else(|| AppError::Validation("Select a weight class".to_string()))?;
        let organization_id = input
            .organization_id
            .ok_or_else(|| AppError::Validation("Select an organization".to_string()))?;
        if fighter1_id == fighter2_id {
            return Err(AppError::Validation(
                "A fighter cannot face themselves".to_string(),
            ));
        }

        let fighter1 = self
            .fighter_repo
            .find_by_id(fighter1_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Unknown fighter: {fighter1_id}")))?;
        let fighter2 = self
            .fighter_repo
            .find_by_id(fighter2_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Unknown fighter: {fighter2_id}")))?;
        if fighter1.gender != fighter2.gender {
            return Err(AppError::Validation(
                "Fighters must be of the same gender".to_string(),
            ));
        }

        let weight_class = self
            .weight_class_repo
            .find_by_id(weight_class_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Unknown weight class: {weight_class_id}"))
            })?;
        if weight_class.gender != fighter1.gender {
            return Err(AppError::Validation(
                "Weight class does not match the fighters' gender".to_string(),
            ));
        }

        let organization = self
            .organization_repo
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Unknown organization: {organization_id}"))
            })?;

        if let Some(existing) = self
            .fight_card_repo
            .find_matchup(fighter1_id, fighter2_id, organization_id, weight_class_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "This matchup already exists (fight card {})",
                existing.id
            )));
        }

        let model = fight_card::ActiveModel {
            fighter1_id: Set(fighter1_id),
            fighter2_id: Set(fighter2_id),
            organization_id: Set(organization_id),
            weight_class_id: Set(weight_class_id),
            fighter1_votes: Set(0),
            fighter2_votes: Set(0),
            popularity_votes: Set(0),
            created_by: Set(user_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let card = self.fight_card_repo.create(model).await?;

        tracing::info!(
            card_id = card.id,
            user_id = %user_id,
            fighter1 = %fighter1.name,
            fighter2 = %fighter2.name,
            "Fight card created"
        );

        CardRefs::new(&[fighter1, fighter2], &[organization], &[weight_class])
            .resolve(&card)
            .ok_or_else(|| AppError::Internal("created card failed to resolve".to_string()))
    }

    /// Every card, most popular first.
    pub async fn list(&self) -> AppResult<Vec<FightCardView>> {
        let cards = self.fight_card_repo.find_all().await?;
        self.resolve(cards).await
    }

    /// One card.
    pub async fn get(&self, id: i32) -> AppResult<FightCardView> {
        let card = self.fight_card_repo.get_by_id(id).await?;
        self.resolve(vec![card])
            .await?
            .pop()
            .ok_or(AppError::FightCardNotFound(id))
    }

    /// Cards the caller holds a popularity vote on, most popular first.
    pub async fn voted_cards(&self, session: &Session) -> AppResult<Vec<FightCardView>> {
        let user_id = session.require_user()?;
        let ids: Vec<i32> = self
            .vote_repo
            .find_by_user(user_id)
            .await?
            .into_iter()
            .filter(|v| v.vote_type == VoteType::Popularity)
            .map(|v| v.fight_card_id)
            .collect();
        let cards = self.fight_card_repo.find_by_ids(&ids).await?;
        self.resolve(cards).await
    }

    /// Resolve references for a batch of cards, keeping their order.
    async fn resolve(&self, cards: Vec<fight_card::Model>) -> AppResult<Vec<FightCardView>> {
        if cards.is_empty() {
            return Ok(vec![]);
        }

        let fighter_ids: BTreeSet<i32> = cards
            .iter()
            .flat_map(|c| [c.fighter1_id, c.fighter2_id])
            .collect();
        let organization_ids: BTreeSet<i32> = cards.iter().map(|c| c.organization_id).collect();
        let weight_class_ids: BTreeSet<i32> = cards.iter().map(|c| c.weight_class_id).collect();

        let fighters = self
            .fighter_repo
            .find_by_ids(&fighter_ids.into_iter().collect::<Vec<_>>())
            .await?;
        let organizations = self
            .organization_repo
            .find_by_ids(&organization_ids.into_iter().collect::<Vec<_>>())
            .await?;
        let weight_classes = self
            .weight_class_repo
            .find_by_ids(&weight_class_ids.into_iter().collect::<Vec<_>>())
            .await?;

        let refs = CardRefs::new(&fighters, &organizations, &weight_classes);
        Ok(cards
            .iter()
            .filter_map(|card| {
                let view = refs.resolve(card);
                if view.is_none() {
                    tracing::warn!(card_id = card.id, "Skipping card with dangling references");
                }
                view
            })
            .collect())
    }
}
