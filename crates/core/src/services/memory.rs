//! In-memory [`VoteLedger`] for tests and local experiments.
//!
//! Enforces the same uniqueness rule as the database and can inject the
//! failures the tally engine has to survive.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use taisen_common::{AppError, AppResult};
use taisen_db::{
    entities::{vote, vote::VoteType},
    repositories::{CardVoteCounts, TallyColumn},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ledger::{CounterChange, Side, Tally, VoteChoice, VoteLedger};

#[derive(Default)]
struct State {
    cards: BTreeMap<i32, Tally>,
    votes: Vec<vote::Model>,
    next_vote_id: i32,
}

#[derive(Default, Clone, Copy)]
struct Faults {
    counters: bool,
    inserts: bool,
    insert_race: bool,
    race_winner: Option<VoteChoice>,
}

/// In-memory vote ledger.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<State>,
    faults: RwLock<Faults>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger holding the given (empty) cards.
    #[must_use]
    pub fn with_cards(ids: impl IntoIterator<Item = i32>) -> Self {
        let state = State {
            cards: ids
                .into_iter()
                .map(|id| (id, Self::empty_tally(id)))
                .collect(),
            ..State::default()
        };
        Self {
            state: RwLock::new(state),
            faults: RwLock::default(),
        }
    }

    const fn empty_tally(id: i32) -> Tally {
        Tally {
            fight_card_id: id,
            fighter1_votes: 0,
            fighter2_votes: 0,
            popularity_votes: 0,
        }
    }

    /// Add a vote row and move its counter, bypassing every check.
    pub async fn seed_vote(&self, user_id: Uuid, card_id: i32, choice: VoteChoice) {
        let mut state = self.state.write().await;
        Self::push_vote(&mut state, user_id, card_id, choice);
        if let Some(tally) = state.cards.get_mut(&card_id) {
            bump(tally, choice.column(), CounterChange::Increment);
        }
    }

    /// Overwrite a card's counters without touching the ledger.
    pub async fn set_tally(&self, tally: Tally) {
        self.state
            .write()
            .await
            .cards
            .insert(tally.fight_card_id, tally);
    }

    /// Current counters of a card.
    pub async fn snapshot(&self, card_id: i32) -> Option<Tally> {
        self.state.read().await.cards.get(&card_id).copied()
    }

    /// Every stored vote row.
    pub async fn rows(&self) -> Vec<vote::Model> {
        self.state.read().await.votes.clone()
    }

    /// Make every counter update fail.
    pub async fn fail_counter_updates(&self, fail: bool) {
        self.faults.write().await.counters = fail;
    }

    /// Make every vote insert fail with a storage error.
    pub async fn fail_inserts(&self, fail: bool) {
        self.faults.write().await.inserts = fail;
    }

    /// Let a competing request win the next inserts: the row appears, but
    /// the caller's insert is rejected as a duplicate.
    pub async fn simulate_insert_race(&self, race: bool) {
        let mut faults = self.faults.write().await;
        faults.insert_race = race;
        faults.race_winner = None;
    }

    /// Like [`Self::simulate_insert_race`], but the competing request
    /// records `winner` instead of the caller's choice.
    pub async fn simulate_insert_race_by(&self, winner: VoteChoice) {
        let mut faults = self.faults.write().await;
        faults.insert_race = true;
        faults.race_winner = Some(winner);
    }

    fn push_vote(
        state: &mut State,
        user_id: Uuid,
        card_id: i32,
        choice: VoteChoice,
    ) -> vote::Model {
        state.next_vote_id += 1;
        let row = vote::Model {
            id: state.next_vote_id,
            user_id,
            fight_card_id: card_id,
            vote_type: choice.vote_type(),
            vote_for: choice.side().map(Side::as_i16),
            created_at: Utc::now().into(),
        };
        state.votes.push(row.clone());
        row
    }

    fn count(state: &State, card_id: i32) -> CardVoteCounts {
        let mut counts = CardVoteCounts::default();
        for row in state.votes.iter().filter(|v| v.fight_card_id == card_id) {
            match (row.vote_type, row.vote_for) {
                (VoteType::Popularity, _) => counts.popularity += 1,
                (VoteType::Prediction, Some(1)) => counts.fighter1 += 1,
                (VoteType::Prediction, Some(2)) => counts.fighter2 += 1,
                (VoteType::Prediction, _) => {}
            }
        }
        counts
    }
}

fn bump(tally: &mut Tally, column: TallyColumn, change: CounterChange) {
    let slot = match column {
        TallyColumn::Fighter1 => &mut tally.fighter1_votes,
        TallyColumn::Fighter2 => &mut tally.fighter2_votes,
        TallyColumn::Popularity => &mut tally.popularity_votes,
    };
    *slot = match change {
        CounterChange::Increment => *slot + 1,
        CounterChange::Decrement => (*slot - 1).max(0),
    };
}

fn to_i32(count: i64) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[async_trait]
impl VoteLedger for MemoryLedger {
    async fn tally(&self, card_id: i32) -> AppResult<Option<Tally>> {
        Ok(self.snapshot(card_id).await)
    }

    async fn tallies(&self) -> AppResult<Vec<Tally>> {
        Ok(self.state.read().await.cards.values().copied().collect())
    }

    async fn find_vote(
        &self,
        user_id: Uuid,
        card_id: i32,
        vote_type: VoteType,
    ) -> AppResult<Option<vote::Model>> {
        Ok(self
            .state
            .read()
            .await
            .votes
            .iter()
            .find(|v| v.user_id == user_id && v.fight_card_id == card_id && v.vote_type == vote_type)
            .cloned())
    }

    async fn count_votes(&self, user_id: Uuid, vote_type: VoteType) -> AppResult<u64> {
        Ok(self
            .state
            .read()
            .await
            .votes
            .iter()
            .filter(|v| v.user_id == user_id && v.vote_type == vote_type)
            .count() as u64)
    }

    async fn votes_by_user(&self, user_id: Uuid) -> AppResult<Vec<vote::Model>> {
        Ok(self
            .state
            .read()
            .await
            .votes
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_vote(
        &self,
        user_id: Uuid,
        card_id: i32,
        choice: VoteChoice,
    ) -> AppResult<vote::Model> {
        let faults = *self.faults.read().await;
        if faults.inserts {
            return Err(AppError::Database("insert failed".to_string()));
        }

        let mut state = self.state.write().await;
        if !state.cards.contains_key(&card_id) {
            return Err(AppError::Database(format!(
                "foreign key violation: fight card {card_id}"
            )));
        }

        if faults.insert_race {
            let winner = faults.race_winner.unwrap_or(choice);
            Self::push_vote(&mut state, user_id, card_id, winner);
        }

        let duplicate = state.votes.iter().any(|v| {
            v.user_id == user_id && v.fight_card_id == card_id && v.vote_type == choice.vote_type()
        });
        if duplicate {
            return Err(AppError::Conflict("vote already exists".to_string()));
        }

        Ok(Self::push_vote(&mut state, user_id, card_id, choice))
    }

    async fn delete_vote(&self, vote_id: i32) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.votes.len();
        state.votes.retain(|v| v.id != vote_id);
        Ok(state.votes.len() < before)
    }

    async fn adjust(
        &self,
        card_id: i32,
        column: TallyColumn,
        change: CounterChange,
    ) -> AppResult<Option<Tally>> {
        if self.faults.read().await.counters {
            return Err(AppError::Database("counter update failed".to_string()));
        }

        let mut state = self.state.write().await;
        Ok(state.cards.get_mut(&card_id).map(|tally| {
            bump(tally, column, change);
            *tally
        }))
    }

    async fn recount(&self, card_id: i32) -> AppResult<CardVoteCounts> {
        Ok(Self::count(&*self.state.read().await, card_id))
    }

    async fn recount_all(&self) -> AppResult<BTreeMap<i32, CardVoteCounts>> {
        let state = self.state.read().await;
        let mut ids: Vec<i32> = state.votes.iter().map(|v| v.fight_card_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .into_iter()
            .map(|id| (id, Self::count(&state, id)))
            .collect())
    }

    async fn store_counts(&self, card_id: i32, counts: CardVoteCounts) -> AppResult<Tally> {
        let mut state = self.state.write().await;
        let tally = state
            .cards
            .get_mut(&card_id)
            .ok_or(AppError::FightCardNotFound(card_id))?;
        tally.fighter1_votes = to_i32(counts.fighter1);
        tally.fighter2_votes = to_i32(counts.fighter2);
        tally.popularity_votes = to_i32(counts.popularity);
        Ok(*tally)
    }
}
