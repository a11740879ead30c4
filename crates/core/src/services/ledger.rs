//! Vote ledger abstraction.
//!
//! The tally engine talks to storage only through [`VoteLedger`], so the
//! toggle protocol can run against the database or an in-memory store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use taisen_common::AppResult;
use taisen_db::{
    entities::{fight_card, vote, vote::VoteType},
    repositories::{CardVoteCounts, FightCardRepository, TallyColumn, VoteRepository},
};
use uuid::Uuid;

/// Prediction side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The first-listed fighter.
    Fighter1,
    /// The second-listed fighter.
    Fighter2,
}

impl Side {
    /// Stored `vote_for` value.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Fighter1 => 1,
            Self::Fighter2 => 2,
        }
    }

    /// Parse a stored `vote_for` value.
    #[must_use]
    pub const fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Fighter1),
            2 => Some(Self::Fighter2),
            _ => None,
        }
    }

    /// Counter holding predictions for this side.
    #[must_use]
    pub const fn column(self) -> TallyColumn {
        match self {
            Self::Fighter1 => TallyColumn::Fighter1,
            Self::Fighter2 => TallyColumn::Fighter2,
        }
    }
}

/// What a toggle request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    /// Win prediction for one side.
    Prediction(Side),
    /// Popularity vote.
    Popularity,
}

impl VoteChoice {
    /// Ledger vote type.
    #[must_use]
    pub const fn vote_type(self) -> VoteType {
        match self {
            Self::Prediction(_) => VoteType::Prediction,
            Self::Popularity => VoteType::Popularity,
        }
    }

    /// Side, for predictions.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Prediction(side) => Some(side),
            Self::Popularity => None,
        }
    }

    /// Counter this choice moves.
    #[must_use]
    pub const fn column(self) -> TallyColumn {
        match self {
            Self::Prediction(side) => side.column(),
            Self::Popularity => TallyColumn::Popularity,
        }
    }

    /// Reconstruct the choice a stored vote represents.
    ///
    /// Returns `None` for a prediction row without a valid side.
    #[must_use]
    pub fn of_vote(vote: &vote::Model) -> Option<Self> {
        match vote.vote_type {
            VoteType::Popularity => Some(Self::Popularity),
            VoteType::Prediction => vote
                .vote_for
                .and_then(Side::from_i16)
                .map(Self::Prediction),
        }
    }
}

/// Direction of a counter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterChange {
    /// `+1`
    Increment,
    /// `-1`, floored at zero
    Decrement,
}

/// Cached counters of one fight card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    /// Fight card ID.
    pub fight_card_id: i32,
    /// Predictions for fighter 1.
    pub fighter1_votes: i32,
    /// Predictions for fighter 2.
    pub fighter2_votes: i32,
    /// Popularity votes.
    pub popularity_votes: i32,
}

/// Prediction share as whole percentages summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSplit {
    /// Share of fighter 1.
    pub fighter1_percent: u8,
    /// Share of fighter 2.
    pub fighter2_percent: u8,
}

impl Tally {
    /// Prediction share. An even 50/50 when nobody has predicted yet.
    #[must_use]
    pub fn prediction_split(&self) -> PredictionSplit {
        let left = i64::from(self.fighter1_votes.max(0));
        let right = i64::from(self.fighter2_votes.max(0));
        let total = left + right;
        if total == 0 {
            return PredictionSplit {
                fighter1_percent: 50,
                fighter2_percent: 50,
            };
        }

        let fighter1_percent = ((left * 100) as f64 / total as f64).round() as u8;
        PredictionSplit {
            fighter1_percent,
            fighter2_percent: 100 - fighter1_percent,
        }
    }

    /// Whether the counters agree with ledger-derived counts.
    #[must_use]
    pub fn matches(&self, counts: &CardVoteCounts) -> bool {
        i64::from(self.fighter1_votes) == counts.fighter1
            && i64::from(self.fighter2_votes) == counts.fighter2
            && i64::from(self.popularity_votes) == counts.popularity
    }
}

impl From<&fight_card::Model> for Tally {
    fn from(card: &fight_card::Model) -> Self {
        Self {
            fight_card_id: card.id,
            fighter1_votes: card.fighter1_votes,
            fighter2_votes: card.fighter2_votes,
            popularity_votes: card.popularity_votes,
        }
    }
}

/// Storage operations the tally engine needs.
///
/// `insert_vote` must report a duplicate `(user, card, type)` as
/// [`taisen_common::AppError::Conflict`].
#[async_trait]
pub trait VoteLedger: Send + Sync {
    /// Current counters of a card, `None` if the card does not exist.
    async fn tally(&self, card_id: i32) -> AppResult<Option<Tally>>;

    /// Counters of every card.
    async fn tallies(&self) -> AppResult<Vec<Tally>>;

    /// The vote a user holds on a card for one type.
    async fn find_vote(
        &self,
        user_id: Uuid,
        card_id: i32,
        vote_type: VoteType,
    ) -> AppResult<Option<vote::Model>>;

    /// Number of votes of one type a user holds.
    async fn count_votes(&self, user_id: Uuid, vote_type: VoteType) -> AppResult<u64>;

    /// All votes a user holds.
    async fn votes_by_user(&self, user_id: Uuid) -> AppResult<Vec<vote::Model>>;

    /// Record a vote.
    async fn insert_vote(
        &self,
        user_id: Uuid,
        card_id: i32,
        choice: VoteChoice,
    ) -> AppResult<vote::Model>;

    /// Remove a vote. Returns whether it existed.
    async fn delete_vote(&self, vote_id: i32) -> AppResult<bool>;

    /// Move one counter by one. Returns the post-update counters.
    async fn adjust(
        &self,
        card_id: i32,
        column: TallyColumn,
        change: CounterChange,
    ) -> AppResult<Option<Tally>>;

    /// Count one card's votes from the ledger.
    async fn recount(&self, card_id: i32) -> AppResult<CardVoteCounts>;

    /// Count every card's votes from the ledger. Cards without votes are absent.
    async fn recount_all(&self) -> AppResult<BTreeMap<i32, CardVoteCounts>>;

    /// Overwrite a card's counters.
    async fn store_counts(&self, card_id: i32, counts: CardVoteCounts) -> AppResult<Tally>;
}

/// [`VoteLedger`] backed by the database.
#[derive(Clone)]
pub struct DatabaseLedger {
    vote_repo: VoteRepository,
    fight_card_repo: FightCardRepository,
}

impl DatabaseLedger {
    /// Create a new database ledger.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository, fight_card_repo: FightCardRepository) -> Self {
        Self {
            vote_repo,
            fight_card_repo,
        }
    }
}

fn clamp_count(count: i64) -> i32 {
    i32::try_from(count.max(0)).unwrap_or(i32::MAX)
}

#[async_trait]
impl VoteLedger for DatabaseLedger {
    async fn tally(&self, card_id: i32) -> AppResult<Option<Tally>> {
        Ok(self
            .fight_card_repo
            .find_by_id(card_id)
            .await?
            .as_ref()
            .map(Tally::from))
    }

    async fn tallies(&self) -> AppResult<Vec<Tally>> {
        Ok(self
            .fight_card_repo
            .find_all()
            .await?
            .iter()
            .map(Tally::from)
            .collect())
    }

    async fn find_vote(
        &self,
        user_id: Uuid,
        card_id: i32,
        vote_type: VoteType,
    ) -> AppResult<Option<vote::Model>> {
        self.vote_repo
            .find_by_user_card_type(user_id, card_id, vote_type)
            .await
    }

    async fn count_votes(&self, user_id: Uuid, vote_type: VoteType) -> AppResult<u64> {
        self.vote_repo
            .count_by_user_and_type(user_id, vote_type)
            .await
    }

    async fn votes_by_user(&self, user_id: Uuid) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_by_user(user_id).await
    }

    async fn insert_vote(
        &self,
        user_id: Uuid,
        card_id: i32,
        choice: VoteChoice,
    ) -> AppResult<vote::Model> {
        let model = vote::ActiveModel {
            user_id: Set(user_id),
            fight_card_id: Set(card_id),
            vote_type: Set(choice.vote_type()),
            vote_for: Set(choice.side().map(Side::as_i16)),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        self.vote_repo.create(model).await
    }

    async fn delete_vote(&self, vote_id: i32) -> AppResult<bool> {
        self.vote_repo.delete(vote_id).await
    }

    async fn adjust(
        &self,
        card_id: i32,
        column: TallyColumn,
        change: CounterChange,
    ) -> AppResult<Option<Tally>> {
        let updated = match change {
            CounterChange::Increment => self.fight_card_repo.increment(card_id, column).await?,
            CounterChange::Decrement => self.fight_card_repo.decrement(card_id, column).await?,
        };
        Ok(updated.as_ref().map(Tally::from))
    }

    async fn recount(&self, card_id: i32) -> AppResult<CardVoteCounts> {
        self.vote_repo.count_for_card(card_id).await
    }

    async fn recount_all(&self) -> AppResult<BTreeMap<i32, CardVoteCounts>> {
        self.vote_repo.count_all_cards().await
    }

    async fn store_counts(&self, card_id: i32, counts: CardVoteCounts) -> AppResult<Tally> {
        let updated = self
            .fight_card_repo
            .set_counters(
                card_id,
                clamp_count(counts.fighter1),
                clamp_count(counts.fighter2),
                clamp_count(counts.popularity),
            )
            .await?;
        Ok(Tally::from(&updated))
    }
}
