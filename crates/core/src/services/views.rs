//! Read models returned to callers.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use taisen_db::entities::{fight_card, fighter, fighter::Gender, organization, weight_class};
use uuid::Uuid;

use super::ledger::{PredictionSplit, Tally};

/// Fighter reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterRef {
    /// Fighter ID.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Gender.
    pub gender: Gender,
}

impl From<&fighter::Model> for FighterRef {
    fn from(model: &fighter::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            gender: model.gender,
        }
    }
}

/// Organization reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRef {
    /// Organization ID.
    pub id: i32,
    /// Display name.
    pub name: String,
}

impl From<&organization::Model> for OrganizationRef {
    fn from(model: &organization::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
        }
    }
}

/// Weight class reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightClassRef {
    /// Weight class ID.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Gender of the division.
    pub gender: Gender,
}

impl From<&weight_class::Model> for WeightClassRef {
    fn from(model: &weight_class::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            gender: model.gender,
        }
    }
}

/// A fight card with its references resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FightCardView {
    /// Fight card ID.
    pub id: i32,
    /// First-listed fighter.
    pub fighter1: FighterRef,
    /// Second-listed fighter.
    pub fighter2: FighterRef,
    /// Organization.
    pub organization: OrganizationRef,
    /// Weight class.
    pub weight_class: WeightClassRef,
    /// Predictions for fighter 1.
    pub fighter1_votes: i32,
    /// Predictions for fighter 2.
    pub fighter2_votes: i32,
    /// Popularity votes.
    pub popularity_votes: i32,
    /// Prediction share.
    pub prediction_split: PredictionSplit,
    /// Proposer.
    pub created_by: Uuid,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

/// Lookup tables used to resolve card references.
#[derive(Debug, Default)]
pub struct CardRefs {
    pub(crate) fighters: HashMap<i32, FighterRef>,
    pub(crate) organizations: HashMap<i32, OrganizationRef>,
    pub(crate) weight_classes: HashMap<i32, WeightClassRef>,
}

impl CardRefs {
    /// Build lookup tables from loaded models.
    #[must_use]
    pub fn new(
        fighters: &[fighter::Model],
        organizations: &[organization::Model],
        weight_classes: &[weight_class::Model],
    ) -> Self {
        Self {
            fighters: fighters.iter().map(|f| (f.id, f.into())).collect(),
            organizations: organizations.iter().map(|o| (o.id, o.into())).collect(),
            weight_classes: weight_classes.iter().map(|w| (w.id, w.into())).collect(),
        }
    }

    /// Resolve a card. `None` when a reference is missing.
    #[must_use]
    pub fn resolve(&self, card: &fight_card::Model) -> Option<FightCardView> {
        Some(FightCardView {
            id: card.id,
            fighter1: self.fighters.get(&card.fighter1_id)?.clone(),
            fighter2: self.fighters.get(&card.fighter2_id)?.clone(),
            organization: self.organizations.get(&card.organization_id)?.clone(),
            weight_class: self.weight_classes.get(&card.weight_class_id)?.clone(),
            fighter1_votes: card.fighter1_votes,
            fighter2_votes: card.fighter2_votes,
            popularity_votes: card.popularity_votes,
            prediction_split: Tally::from(card).prediction_split(),
            created_by: card.created_by,
            created_at: card.created_at,
        })
    }
}
