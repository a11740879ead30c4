//! Business logic services.

#![allow(missing_docs)]

pub mod catalog;
pub mod fight_card;
pub mod fighter_request;
pub mod ledger;
pub mod memory;
pub mod ranking;
pub mod session;
pub mod tally;
pub mod top4;
pub mod views;

pub use catalog::{CatalogService, FighterQuery};
pub use fight_card::{CreateFightCardInput, FightCardService};
pub use fighter_request::{FighterRequestService, SubmitFighterRequestInput};
pub use ledger::{
    CounterChange, DatabaseLedger, PredictionSplit, Side, Tally, VoteChoice, VoteLedger,
};
pub use memory::MemoryLedger;
pub use ranking::{
    Medal, RankedCard, RankingFilter, RankingProjection, RemainderPage, project_ranking,
};
pub use session::{Identity, Session};
pub use tally::{ReconcileReport, TallyService, ToggleAction, ToggleOutcome};
pub use top4::{
    ClearTop4SlotInput, CommunityBoard, CommunityPick, SaveTop4Input, Top4Board, Top4Service,
};
pub use views::{CardRefs, FightCardView, FighterRef, OrganizationRef, WeightClassRef};
