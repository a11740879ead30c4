//! Database entities.

#![allow(missing_docs)]

pub mod fight_card;
pub mod fighter;
pub mod fighter_request;
pub mod organization;
pub mod profile;
pub mod user_top4;
pub mod vote;
pub mod weight_class;

pub use fight_card::Entity as FightCard;
pub use fighter::Entity as Fighter;
pub use fighter_request::Entity as FighterRequest;
pub use organization::Entity as Organization;
pub use profile::Entity as Profile;
pub use user_top4::Entity as UserTop4;
pub use vote::Entity as Vote;
pub use weight_class::Entity as WeightClass;
