//! Tally engine: the vote toggle protocol and counter reconciliation.
//!
//! The ledger is authoritative. Counters on the fight card are caches that
//! move by one per toggle and are rebuilt from the ledger when an update
//! fails or drift is found.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use taisen_common::{AppError, AppResult};
use taisen_db::entities::{vote, vote::VoteType};
use uuid::Uuid;

use super::ledger::{CounterChange, Side, Tally, VoteChoice, VoteLedger};
use super::session::Session;

/// Default cap on popularity votes held by one user.
pub const DEFAULT_POPULARITY_CAP: u64 = 30;

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleAction {
    /// A new vote was recorded.
    Cast,
    /// The existing vote was removed.
    Cancelled,
    /// A concurrent request recorded the same vote first; nothing changed.
    AlreadyVoted,
}

/// Result of a toggle: the action taken and the confirmed counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Action taken.
    pub action: ToggleAction,
    /// Vote type toggled.
    pub vote_type: VoteType,
    /// Side of the vote cast or cancelled, for predictions.
    pub side: Option<Side>,
    /// Counters after the operation.
    pub tally: Tally,
}

/// Result of a reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Cards examined.
    pub checked: usize,
    /// Cards whose counters were rewritten.
    pub repaired: usize,
}

type ToggleKey = (Uuid, i32, VoteType);

/// Marks a toggle as running until dropped.
struct InFlight {
    set: Arc<Mutex<HashSet<ToggleKey>>>,
    key: ToggleKey,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Tally service for vote toggling and counter maintenance.
#[derive(Clone)]
pub struct TallyService {
    ledger: Arc<dyn VoteLedger>,
    popularity_cap: u64,
    in_flight: Arc<Mutex<HashSet<ToggleKey>>>,
}

impl TallyService {
    /// Create a new tally service.
    #[must_use]
    pub fn new(ledger: Arc<dyn VoteLedger>, popularity_cap: u64) -> Self {
        Self {
            ledger,
            popularity_cap,
            in_flight: Arc::default(),
        }
    }

    /// Popularity votes a user may hold at once.
    #[must_use]
    pub const fn popularity_cap(&self) -> u64 {
        self.popularity_cap
    }

    /// Toggle a vote.
    ///
    /// Cancels the caller's existing vote of the same type on the card, or
    /// casts a new one. A prediction toggle while holding a prediction for
    /// the other side cancels the held one. Casting a popularity vote is
    /// refused once the caller holds the cap; cancelling never is.
    pub async fn toggle_vote(
        &self,
        session: &Session,
        card_id: i32,
        choice: VoteChoice,
    ) -> AppResult<ToggleOutcome> {
        let user_id = session.require_user()?;
        let vote_type = choice.vote_type();
        let _guard = self.claim((user_id, card_id, vote_type))?;

        let current = self
            .ledger
            .tally(card_id)
            .await?
            .ok_or(AppError::FightCardNotFound(card_id))?;

        match self.ledger.find_vote(user_id, card_id, vote_type).await? {
            Some(existing) => self.cancel(existing, current).await,
            None => self.cast(user_id, card_id, choice, current).await,
        }
    }

    /// Cancel the caller's popularity votes on the given cards.
    ///
    /// Cards the caller has no popularity vote on are skipped. Returns the
    /// confirmed counters of each card whose vote was removed.
    pub async fn cancel_popularity_votes(
        &self,
        session: &Session,
        card_ids: &[i32],
    ) -> AppResult<Vec<Tally>> {
        let user_id = session.require_user()?;

        let mut seen = HashSet::new();
        let mut tallies = Vec::new();
        for &card_id in card_ids {
            if !seen.insert(card_id) {
                continue;
            }

            let _guard = self.claim((user_id, card_id, VoteType::Popularity))?;
            let Some(existing) = self
                .ledger
                .find_vote(user_id, card_id, VoteType::Popularity)
                .await?
            else {
                continue;
            };
            let Some(current) = self.ledger.tally(card_id).await? else {
                continue;
            };

            let outcome = self.cancel(existing, current).await?;
            tallies.push(outcome.tally);
        }

        tracing::info!(
            user_id = %user_id,
            requested = card_ids.len(),
            cancelled = tallies.len(),
            "Cancelled popularity votes"
        );

        Ok(tallies)
    }

    /// Current counters of a card.
    pub async fn tally(&self, card_id: i32) -> AppResult<Tally> {
        self.ledger
            .tally(card_id)
            .await?
            .ok_or(AppError::FightCardNotFound(card_id))
    }

    /// Votes held by the caller.
    pub async fn user_votes(&self, session: &Session) -> AppResult<Vec<vote::Model>> {
        let user_id = session.require_user()?;
        self.ledger.votes_by_user(user_id).await
    }

    /// Rebuild one card's counters from the ledger if they drifted.
    pub async fn reconcile_card(&self, card_id: i32) -> AppResult<Tally> {
        let current = self.tally(card_id).await?;
        let counts = self.ledger.recount(card_id).await?;
        if current.matches(&counts) {
            return Ok(current);
        }

        tracing::warn!(
            card_id,
            cached = ?current,
            counted = ?counts,
            "Counter drift detected, rewriting from ledger"
        );
        self.ledger.store_counts(card_id, counts).await
    }

    /// Rebuild every card's counters that drifted from the ledger.
    pub async fn reconcile_all(&self) -> AppResult<ReconcileReport> {
        let tallies = self.ledger.tallies().await?;
        let counts = self.ledger.recount_all().await?;

        let mut report = ReconcileReport {
            checked: tallies.len(),
            repaired: 0,
        };
        for tally in tallies {
            let expected = counts
                .get(&tally.fight_card_id)
                .copied()
                .unwrap_or_default();
            if tally.matches(&expected) {
                continue;
            }

            tracing::warn!(
                card_id = tally.fight_card_id,
                cached = ?tally,
                counted = ?expected,
                "Counter drift detected, rewriting from ledger"
            );
            self.ledger
                .store_counts(tally.fight_card_id, expected)
                .await?;
            report.repaired += 1;
        }

        tracing::info!(
            checked = report.checked,
            repaired = report.repaired,
            "Counter reconciliation finished"
        );
        Ok(report)
    }

    fn claim(&self, key: ToggleKey) -> AppResult<InFlight> {
        let mut running = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !running.insert(key) {
            return Err(AppError::Conflict(
                "This vote is already being processed".to_string(),
            ));
        }
        Ok(InFlight {
            set: self.in_flight.clone(),
            key,
        })
    }

    async fn cast(
        &self,
        user_id: Uuid,
        card_id: i32,
        choice: VoteChoice,
        current: Tally,
    ) -> AppResult<ToggleOutcome> {
        if choice == VoteChoice::Popularity {
            let held = self
                .ledger
                .count_votes(user_id, VoteType::Popularity)
                .await?;
            if held >= self.popularity_cap {
                return Err(AppError::QuotaExceeded(format!(
                    "Popularity votes are limited to {}",
                    self.popularity_cap
                )));
            }
        }

        match self.ledger.insert_vote(user_id, card_id, choice).await {
            Ok(_) => {}
            Err(AppError::Conflict(_)) => {
                tracing::info!(
                    user_id = %user_id,
                    card_id,
                    vote_type = ?choice.vote_type(),
                    "Vote already recorded by a concurrent request"
                );
                let winner = self
                    .ledger
                    .find_vote(user_id, card_id, choice.vote_type())
                    .await?;
                let side = winner
                    .as_ref()
                    .and_then(VoteChoice::of_vote)
                    .map_or(choice.side(), VoteChoice::side);
                let tally = self.ledger.tally(card_id).await?.unwrap_or(current);
                return Ok(ToggleOutcome {
                    action: ToggleAction::AlreadyVoted,
                    vote_type: choice.vote_type(),
                    side,
                    tally,
                });
            }
            Err(e) => return Err(e),
        }

        let tally = self
            .apply(card_id, Some(choice), CounterChange::Increment)
            .await?;

        tracing::debug!(user_id = %user_id, card_id, choice = ?choice, "Vote cast");

        Ok(ToggleOutcome {
            action: ToggleAction::Cast,
            vote_type: choice.vote_type(),
            side: choice.side(),
            tally,
        })
    }

    async fn cancel(&self, existing: vote::Model, current: Tally) -> AppResult<ToggleOutcome> {
        let card_id = existing.fight_card_id;
        let stored = VoteChoice::of_vote(&existing);

        let tally = if self.ledger.delete_vote(existing.id).await? {
            self.apply(card_id, stored, CounterChange::Decrement)
                .await?
        } else {
            // Already removed by a concurrent request; its counter update is its own.
            self.ledger.tally(card_id).await?.unwrap_or(current)
        };

        tracing::debug!(
            user_id = %existing.user_id,
            card_id,
            vote_type = ?existing.vote_type,
            "Vote cancelled"
        );

        Ok(ToggleOutcome {
            action: ToggleAction::Cancelled,
            vote_type: existing.vote_type,
            side: stored.and_then(VoteChoice::side),
            tally,
        })
    }

    /// Move the counter for `choice` after a committed ledger write.
    ///
    /// A failed update, or a row with no usable side, falls back to a recount.
    async fn apply(
        &self,
        card_id: i32,
        choice: Option<VoteChoice>,
        change: CounterChange,
    ) -> AppResult<Tally> {
        let Some(choice) = choice else {
            tracing::warn!(card_id, "Vote row without a valid side, recounting");
            return self.reconcile_card(card_id).await;
        };

        match self.ledger.adjust(card_id, choice.column(), change).await {
            Ok(Some(tally)) => Ok(tally),
            Ok(None) => Err(AppError::FightCardNotFound(card_id)),
            Err(e) => {
                tracing::warn!(
                    card_id,
                    error = %e,
                    "Counter update failed after ledger write, recounting"
                );
                self.reconcile_card(card_id).await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryLedger;

    const CARD: i32 = 1;

    fn service(ledger: &Arc<MemoryLedger>) -> TallyService {
        TallyService::new(ledger.clone(), DEFAULT_POPULARITY_CAP)
    }

    #[tokio::test]
    async fn test_anonymous_toggle_is_rejected() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        let tally = service(&ledger);

        let result = tally
            .toggle_vote(&Session::anonymous(), CARD, VoteChoice::Popularity)
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert!(ledger.rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_card() {
        let ledger = Arc::new(MemoryLedger::new());
        let tally = service(&ledger);

        let result = tally
            .toggle_vote(&Session::user(Uuid::new_v4()), 9, VoteChoice::Popularity)
            .await;

        assert!(matches!(result, Err(AppError::FightCardNotFound(9))));
    }

    #[tokio::test]
    async fn test_popularity_cast_then_cancel() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        for _ in 0..5 {
            ledger
                .seed_vote(Uuid::new_v4(), CARD, VoteChoice::Popularity)
                .await;
        }
        let tally = service(&ledger);
        let session = Session::user(Uuid::new_v4());

        let cast = tally
            .toggle_vote(&session, CARD, VoteChoice::Popularity)
            .await
            .unwrap();
        assert_eq!(cast.action, ToggleAction::Cast);
        assert_eq!(cast.tally.popularity_votes, 6);
        assert_eq!(ledger.rows().await.len(), 6);

        let cancel = tally
            .toggle_vote(&session, CARD, VoteChoice::Popularity)
            .await
            .unwrap();
        assert_eq!(cancel.action, ToggleAction::Cancelled);
        assert_eq!(cancel.tally.popularity_votes, 5);
        assert_eq!(ledger.rows().await.len(), 5);
    }

    #[tokio::test]
    async fn test_prediction_moves_only_its_side() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        for _ in 0..2 {
            ledger
                .seed_vote(Uuid::new_v4(), CARD, VoteChoice::Prediction(Side::Fighter1))
                .await;
        }
        for _ in 0..3 {
            ledger
                .seed_vote(Uuid::new_v4(), CARD, VoteChoice::Prediction(Side::Fighter2))
                .await;
        }
        let tally = service(&ledger);

        let outcome = tally
            .toggle_vote(
                &Session::user(Uuid::new_v4()),
                CARD,
                VoteChoice::Prediction(Side::Fighter1),
            )
            .await
            .unwrap();

        assert_eq!(outcome.action, ToggleAction::Cast);
        assert_eq!(outcome.side, Some(Side::Fighter1));
        assert_eq!(outcome.tally.fighter1_votes, 3);
        assert_eq!(outcome.tally.fighter2_votes, 3);
        assert_eq!(outcome.tally.popularity_votes, 0);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        let tally = service(&ledger);
        let session = Session::user(Uuid::new_v4());
        let before = ledger.snapshot(CARD).await.unwrap();

        for choice in [
            VoteChoice::Popularity,
            VoteChoice::Prediction(Side::Fighter2),
        ] {
            tally.toggle_vote(&session, CARD, choice).await.unwrap();
            tally.toggle_vote(&session, CARD, choice).await.unwrap();
        }

        assert_eq!(ledger.snapshot(CARD).await.unwrap(), before);
        assert!(ledger.rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_other_side_cancels_stored_side() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        let tally = service(&ledger);
        let session = Session::user(Uuid::new_v4());

        tally
            .toggle_vote(&session, CARD, VoteChoice::Prediction(Side::Fighter1))
            .await
            .unwrap();
        let outcome = tally
            .toggle_vote(&session, CARD, VoteChoice::Prediction(Side::Fighter2))
            .await
            .unwrap();

        assert_eq!(outcome.action, ToggleAction::Cancelled);
        assert_eq!(outcome.side, Some(Side::Fighter1));
        assert_eq!(outcome.tally.fighter1_votes, 0);
        assert_eq!(outcome.tally.fighter2_votes, 0);
    }

    #[tokio::test]
    async fn test_cancel_floors_counter_at_zero() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        let user = Uuid::new_v4();
        ledger.seed_vote(user, CARD, VoteChoice::Popularity).await;
        // Counter already lost the vote somewhere.
        ledger
            .set_tally(Tally {
                fight_card_id: CARD,
                fighter1_votes: 0,
                fighter2_votes: 0,
                popularity_votes: 0,
            })
            .await;
        let tally = service(&ledger);

        let outcome = tally
            .toggle_vote(&Session::user(user), CARD, VoteChoice::Popularity)
            .await
            .unwrap();

        assert_eq!(outcome.action, ToggleAction::Cancelled);
        assert_eq!(outcome.tally.popularity_votes, 0);
    }

    #[tokio::test]
    async fn test_popularity_cap() {
        let cards: Vec<i32> = (1..=31).collect();
        let ledger = Arc::new(MemoryLedger::with_cards(cards.clone()));
        let user = Uuid::new_v4();
        for card in &cards[..30] {
            ledger.seed_vote(user, *card, VoteChoice::Popularity).await;
        }
        let tally = service(&ledger);
        let session = Session::user(user);

        let refused = tally
            .toggle_vote(&session, 31, VoteChoice::Popularity)
            .await;
        assert!(matches!(refused, Err(AppError::QuotaExceeded(_))));
        assert_eq!(ledger.snapshot(31).await.unwrap().popularity_votes, 0);
        assert_eq!(ledger.rows().await.len(), 30);

        // Predictions are not capped.
        let prediction = tally
            .toggle_vote(&session, 31, VoteChoice::Prediction(Side::Fighter1))
            .await
            .unwrap();
        assert_eq!(prediction.action, ToggleAction::Cast);

        // Any held vote can still be cancelled.
        let cancel = tally
            .toggle_vote(&session, 17, VoteChoice::Popularity)
            .await
            .unwrap();
        assert_eq!(cancel.action, ToggleAction::Cancelled);

        let cast = tally
            .toggle_vote(&session, 31, VoteChoice::Popularity)
            .await
            .unwrap();
        assert_eq!(cast.action, ToggleAction::Cast);
    }

    #[tokio::test]
    async fn test_insert_race_is_benign() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        ledger.simulate_insert_race(true).await;
        let tally = service(&ledger);
        let user = Uuid::new_v4();

        let outcome = tally
            .toggle_vote(&Session::user(user), CARD, VoteChoice::Popularity)
            .await
            .unwrap();

        assert_eq!(outcome.action, ToggleAction::AlreadyVoted);
        let rows = ledger.rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, user);
    }

    #[tokio::test]
    async fn test_insert_race_reports_stored_side() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        ledger
            .simulate_insert_race_by(VoteChoice::Prediction(Side::Fighter2))
            .await;
        let tally = service(&ledger);

        let outcome = tally
            .toggle_vote(
                &Session::user(Uuid::new_v4()),
                CARD,
                VoteChoice::Prediction(Side::Fighter1),
            )
            .await
            .unwrap();

        assert_eq!(outcome.action, ToggleAction::AlreadyVoted);
        assert_eq!(outcome.side, Some(Side::Fighter2));
        let rows = ledger.rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vote_for, Some(2));
    }

    #[tokio::test]
    async fn test_insert_failure_changes_nothing() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        ledger.fail_inserts(true).await;
        let tally = service(&ledger);

        let result = tally
            .toggle_vote(&Session::user(Uuid::new_v4()), CARD, VoteChoice::Popularity)
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(ledger.snapshot(CARD).await.unwrap().popularity_votes, 0);
    }

    #[tokio::test]
    async fn test_counter_failure_returns_recounted_state() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        ledger
            .seed_vote(Uuid::new_v4(), CARD, VoteChoice::Popularity)
            .await;
        ledger.fail_counter_updates(true).await;
        let tally = service(&ledger);

        let outcome = tally
            .toggle_vote(&Session::user(Uuid::new_v4()), CARD, VoteChoice::Popularity)
            .await
            .unwrap();

        assert_eq!(outcome.action, ToggleAction::Cast);
        assert_eq!(outcome.tally.popularity_votes, 2);
        assert_eq!(ledger.snapshot(CARD).await.unwrap().popularity_votes, 2);
    }

    #[tokio::test]
    async fn test_in_flight_toggle_is_rejected() {
        let ledger = Arc::new(MemoryLedger::with_cards([CARD]));
        let tally = service(&ledger);
        let user = Uuid::new_v4();

        let guard = tally.claim((user, CARD, VoteType::Popularity)).unwrap();
        let blocked = tally
            .toggle_vote(&Session::user(user), CARD, VoteChoice::Popularity)
            .await;
        assert!(matches!(blocked, Err(AppError::Conflict(_))));

        // Other vote types on the same card are independent.
        tally
            .toggle_vote(&Session::user(user), CARD, VoteChoice::Prediction(Side::Fighter2))
            .await
            .unwrap();

        drop(guard);
        let outcome = tally
            .toggle_vote(&Session::user(user), CARD, VoteChoice::Popularity)
            .await
            .unwrap();
        assert_eq!(outcome.action, ToggleAction::Cast);
    }

    #[tokio::test]
    async fn test_cancel_popularity_votes_in_bulk() {
        let ledger = Arc::new(MemoryLedger::with_cards([1, 2, 3]));
        let user = Uuid::new_v4();
        ledger.seed_vote(user, 1, VoteChoice::Popularity).await;
        ledger.seed_vote(user, 2, VoteChoice::Popularity).await;
        ledger.seed_vote(user, 2, VoteChoice::Prediction(Side::Fighter1)).await;
        let tally = service(&ledger);

        let tallies = tally
            .cancel_popularity_votes(&Session::user(user), &[1, 2, 2, 3])
            .await
            .unwrap();

        assert_eq!(tallies.len(), 2);
        assert!(tallies.iter().all(|t| t.popularity_votes == 0));
        let remaining = ledger.rows().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].vote_type, VoteType::Prediction);
        assert_eq!(ledger.snapshot(2).await.unwrap().fighter1_votes, 1);
    }

    #[tokio::test]
    async fn test_reconcile_all_repairs_drift() {
        let ledger = Arc::new(MemoryLedger::with_cards([1, 2, 3]));
        ledger
            .seed_vote(Uuid::new_v4(), 1, VoteChoice::Prediction(Side::Fighter2))
            .await;
        ledger
            .seed_vote(Uuid::new_v4(), 2, VoteChoice::Popularity)
            .await;
        ledger
            .set_tally(Tally {
                fight_card_id: 2,
                fighter1_votes: 4,
                fighter2_votes: 0,
                popularity_votes: 9,
            })
            .await;
        ledger
            .set_tally(Tally {
                fight_card_id: 3,
                fighter1_votes: 0,
                fighter2_votes: 0,
                popularity_votes: 2,
            })
            .await;
        let tally = service(&ledger);

        let report = tally.reconcile_all().await.unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                checked: 3,
                repaired: 2,
            }
        );
        let card2 = ledger.snapshot(2).await.unwrap();
        assert_eq!(card2.fighter1_votes, 0);
        assert_eq!(card2.popularity_votes, 1);
        assert_eq!(ledger.snapshot(3).await.unwrap().popularity_votes, 0);
        assert_eq!(ledger.snapshot(1).await.unwrap().fighter2_votes, 1);
    }

    #[tokio::test]
    async fn test_counters_match_ledger_after_mixed_toggles() {
        let ledger = Arc::new(MemoryLedger::with_cards([1, 2]));
        let tally = service(&ledger);
        let users: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();

        for (i, user) in users.iter().enumerate() {
            let session = Session::user(*user);
            let side = if i % 2 == 0 { Side::Fighter1 } else { Side::Fighter2 };
            tally
                .toggle_vote(&session, 1, VoteChoice::Prediction(side))
                .await
                .unwrap();
            tally
                .toggle_vote(&session, 2, VoteChoice::Popularity)
                .await
                .unwrap();
            if i % 3 == 0 {
                tally
                    .toggle_vote(&session, 2, VoteChoice::Popularity)
                    .await
                    .unwrap();
            }
        }

        for card in [1, 2] {
            let counts = ledger.recount(card).await.unwrap();
            assert!(ledger.snapshot(card).await.unwrap().matches(&counts));
        }
    }
}
