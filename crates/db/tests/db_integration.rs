//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `taisen_test`)
//!   `TEST_DB_PASSWORD` (default: `taisen_test`)
//!   `TEST_DB_NAME` (default: `taisen_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use taisen_common::AppError;
use taisen_db::{
    entities::{fight_card, fighter::Gender, organization, vote, vote::VoteType, weight_class},
    repositories::{FightCardRepository, FighterRepository, TallyColumn, VoteRepository},
    test_utils::TestDatabase,
};
use uuid::Uuid;

struct Seed {
    card: fight_card::Model,
    fighter_a: i32,
    fighter_b: i32,
}

async fn seed_card(db: &TestDatabase) -> Seed {
    let conn = Arc::new(db.connection().clone());
    let fighters = FighterRepository::new(conn.clone());
    let a = fighters.create("Red Corner", Gender::Male).await.unwrap();
    let b = fighters.create("Blue Corner", Gender::Male).await.unwrap();

    let org = organization::ActiveModel {
        name: Set("Test Promotion".to_string()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db.connection())
    .await
    .unwrap();
    let class = weight_class::ActiveModel {
        name: Set("Lightweight".to_string()),
        gender: Set(Gender::Male),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db.connection())
    .await
    .unwrap();

    let card = FightCardRepository::new(conn)
        .create(fight_card::ActiveModel {
            fighter1_id: Set(a.id),
            fighter2_id: Set(b.id),
            organization_id: Set(org.id),
            weight_class_id: Set(class.id),
            fighter1_votes: Set(0),
            fighter2_votes: Set(0),
            popularity_votes: Set(0),
            created_by: Set(Uuid::new_v4()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap();

    Seed {
        card,
        fighter_a: a.id,
        fighter_b: b.id,
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_vote_is_conflict() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let seed = seed_card(&db).await;
    let votes = VoteRepository::new(Arc::new(db.connection().clone()));
    let user = Uuid::new_v4();

    let model = || vote::ActiveModel {
        user_id: Set(user),
        fight_card_id: Set(seed.card.id),
        vote_type: Set(VoteType::Popularity),
        vote_for: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    votes.create(model()).await.unwrap();
    let second = votes.create(model()).await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_prediction_requires_side() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let seed = seed_card(&db).await;
    let votes = VoteRepository::new(Arc::new(db.connection().clone()));

    let result = votes
        .create(vote::ActiveModel {
            user_id: Set(Uuid::new_v4()),
            fight_card_id: Set(seed.card.id),
            vote_type: Set(VoteType::Prediction),
            vote_for: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));
    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_counter_floor_and_increment() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let seed = seed_card(&db).await;
    let cards = FightCardRepository::new(Arc::new(db.connection().clone()));

    let after = cards
        .decrement(seed.card.id, TallyColumn::Popularity)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.popularity_votes, 0);

    let after = cards
        .increment(seed.card.id, TallyColumn::Fighter2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.fighter2_votes, 1);
    assert_eq!(after.fighter1_votes, 0);

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_reversed_matchup_is_conflict() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let seed = seed_card(&db).await;
    let cards = FightCardRepository::new(Arc::new(db.connection().clone()));

    let reversed = cards
        .create(fight_card::ActiveModel {
            fighter1_id: Set(seed.fighter_b),
            fighter2_id: Set(seed.fighter_a),
            organization_id: Set(seed.card.organization_id),
            weight_class_id: Set(seed.card.weight_class_id),
            fighter1_votes: Set(0),
            fighter2_votes: Set(0),
            popularity_votes: Set(0),
            created_by: Set(Uuid::new_v4()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await;

    assert!(matches!(reversed, Err(AppError::Conflict(_))));

    let existing = cards
        .find_matchup(
            seed.fighter_b,
            seed.fighter_a,
            seed.card.organization_id,
            seed.card.weight_class_id,
        )
        .await
        .unwrap();
    assert_eq!(existing.map(|c| c.id), Some(seed.card.id));

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_removing_fighter_cascades_to_cards_and_votes() {
    let db = TestDatabase::new().await.unwrap();
    db.cleanup().await.unwrap();
    let seed = seed_card(&db).await;
    let conn = Arc::new(db.connection().clone());
    let votes = VoteRepository::new(conn.clone());
    let user = Uuid::new_v4();

    votes
        .create(vote::ActiveModel {
            user_id: Set(user),
            fight_card_id: Set(seed.card.id),
            vote_type: Set(VoteType::Prediction),
            vote_for: Set(Some(1)),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(FighterRepository::new(conn.clone()).delete(seed.fighter_a).await.unwrap());

    let card = FightCardRepository::new(conn).find_by_id(seed.card.id).await.unwrap();
    assert!(card.is_none());
    assert!(votes.find_by_user(user).await.unwrap().is_empty());

    db.cleanup().await.unwrap();
}
