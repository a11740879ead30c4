//! Database repositories.

mod fight_card;
mod fighter;
mod fighter_request;
mod organization;
mod profile;
mod user_top4;
mod vote;
mod weight_class;

pub use fight_card::{FightCardRepository, TallyColumn};
pub use fighter::FighterRepository;
pub use fighter_request::FighterRequestRepository;
pub use organization::OrganizationRepository;
pub use profile::ProfileRepository;
pub use user_top4::{PickCount, UserTop4Repository};
pub use vote::{CardVoteCounts, VoteRepository};
pub use weight_class::WeightClassRepository;

use sea_orm::{DbErr, SqlErr};
use taisen_common::AppError;

/// Map a write error, turning unique-index violations into [`AppError::Conflict`].
pub(crate) fn map_write_err(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            AppError::Conflict(format!("{what} already exists ({detail})"))
        }
        _ => AppError::Database(err.to_string()),
    }
}
