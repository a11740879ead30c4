//! Fighter request service: user submissions and the admin review workflow.
//!
//! Requests move `pending -> approved` or `pending -> rejected` and never
//! leave a terminal state. Approval applies the roster change first and only
//! then records the outcome, so a failed roster write leaves the request
//! pending.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use taisen_common::{AppError, AppResult, LocalDay};
use taisen_db::{
    entities::{
        fighter::Gender,
        fighter_request::{self, DeleteReason, RequestStatus, RequestType},
    },
    repositories::{FighterRepository, FighterRequestRepository},
};
use validator::Validate;

use super::session::Session;

/// Default number of requests a user may submit per local day.
pub const DEFAULT_DAILY_FIGHTER_REQUESTS: u64 = 1;

/// Default maximum length of a requested fighter name, in characters.
pub const DEFAULT_FIGHTER_NAME_MAX_LEN: usize = 30;

/// Input for submitting a roster change request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFighterRequestInput {
    /// Add a new fighter or remove an existing one.
    pub request_type: RequestType,
    /// Name of the fighter to add.
    #[validate(length(max = 256))]
    pub player_name: Option<String>,
    /// Gender of the fighter to add.
    pub player_gender: Option<Gender>,
    /// Fighter to remove.
    #[validate(range(min = 1))]
    pub target_fighter_id: Option<i32>,
    /// Why the fighter should be removed.
    pub delete_reason: Option<DeleteReason>,
}

/// Fighter request service for business logic.
#[derive(Clone)]
pub struct FighterRequestService {
    request_repo: FighterRequestRepository,
    fighter_repo: FighterRepository,
    day: LocalDay,
    daily_limit: u64,
    name_max_len: usize,
}

impl FighterRequestService {
    /// Create a new fighter request service.
    #[must_use]
    pub const fn new(
        request_repo: FighterRequestRepository,
        fighter_repo: FighterRepository,
        day: LocalDay,
        daily_limit: u64,
        name_max_len: usize,
    ) -> Self {
        Self {
            request_repo,
            fighter_repo,
            day,
            daily_limit,
            name_max_len,
        }
    }

    /// Submit a request to add or remove a fighter.
    pub async fn submit(
        &self,
        session: &Session,
        input: SubmitFighterRequestInput,
    ) -> AppResult<fighter_request::Model> {
        let user_id = session.require_user()?;

        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let submitted_today = self
            .request_repo
            .count_created_since(user_id, self.day.start_of_today())
            .await?;
        if submitted_today >= self.daily_limit {
            return Err(AppError::QuotaExceeded(format!(
                "Fighter requests can be submitted up to {} times per day",
                self.daily_limit
            )));
        }

        let mut model = fighter_request::ActiveModel {
            request_type: Set(input.request_type),
            status: Set(RequestStatus::Pending),
            created_by: Set(user_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match input.request_type {
            RequestType::Add => {
                let name = input
                    .player_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| AppError::Validation("Enter the fighter's name".to_string()))?;
                if name.chars().count() > self.name_max_len {
                    return Err(AppError::Validation(format!(
                        "Fighter names are limited to {} characters",
                        self.name_max_len
                    )));
                }
                let gender = input
                    .player_gender
                    .ok_or_else(|| AppError::Validation("Select a gender".to_string()))?;
                if self.fighter_repo.find_by_name(name).await?.is_some() {
                    return Err(AppError::Validation(format!(
                        "{name} is already registered"
                    )));
                }

                model.player_name = Set(name.to_string());
                model.player_gender = Set(Some(gender));
            }
            RequestType::Delete => {
                let target_id = input
                    .target_fighter_id
                    .ok_or_else(|| AppError::Validation("Select a fighter".to_string()))?;
                let reason = input
                    .delete_reason
                    .ok_or_else(|| AppError::Validation("Select a reason".to_string()))?;
                let target = self
                    .fighter_repo
                    .find_by_id(target_id)
                    .await?
                    .ok_or_else(|| AppError::Validation(format!("Unknown fighter: {target_id}")))?;

                model.player_name = Set(target.name);
                model.player_gender = Set(Some(target.gender));
                model.target_fighter_id = Set(Some(target_id));
                model.delete_reason = Set(Some(reason));
            }
        }

        let request = self.request_repo.create(model).await?;

        tracing::info!(
            request_id = request.id,
            user_id = %user_id,
            request_type = ?request.request_type,
            player_name = %request.player_name,
            "Fighter request submitted"
        );

        Ok(request)
    }

    /// Requests for review, newest first.
    pub async fn list(
        &self,
        session: &Session,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<fighter_request::Model>> {
        session.require_admin()?;
        self.request_repo.list(status).await
    }

    /// Approve a pending request and apply its roster change.
    pub async fn approve(&self, session: &Session, id: i32) -> AppResult<fighter_request::Model> {
        let admin_id = session.require_admin()?;
        let request = self.get_pending(id).await?;

        match request.request_type {
            RequestType::Add => {
                let gender = request.player_gender.ok_or_else(|| {
                    AppError::Validation("Request has no fighter gender".to_string())
                })?;
                let fighter = self
                    .fighter_repo
                    .create(&request.player_name, gender)
                    .await?;
                tracing::info!(fighter_id = fighter.id, name = %fighter.name, "Fighter added");
            }
            RequestType::Delete => {
                let target_id = request.target_fighter_id.ok_or_else(|| {
                    AppError::Validation("Request has no target fighter".to_string())
                })?;
                if !self.fighter_repo.delete(target_id).await? {
                    return Err(AppError::NotFound(format!("Fighter {target_id}")));
                }
                tracing::info!(fighter_id = target_id, "Fighter removed");
            }
        }

        let updated = self
            .request_repo
            .mark_processed(id, RequestStatus::Approved, admin_id, Utc::now().into())
            .await?;

        tracing::info!(request_id = id, admin_id = %admin_id, "Fighter request approved");
        Ok(updated)
    }

    /// Reject a pending request. The roster is untouched.
    pub async fn reject(&self, session: &Session, id: i32) -> AppResult<fighter_request::Model> {
        let admin_id = session.require_admin()?;
        self.get_pending(id).await?;

        let updated = self
            .request_repo
            .mark_processed(id, RequestStatus::Rejected, admin_id, Utc::now().into())
            .await?;

        tracing::info!(request_id = id, admin_id = %admin_id, "Fighter request rejected");
        Ok(updated)
    }

    /// Remove a request record regardless of its status.
    pub async fn delete(&self, session: &Session, id: i32) -> AppResult<()> {
        let admin_id = session.require_admin()?;

        if !self.request_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Fighter request {id}")));
        }

        tracing::info!(request_id = id, admin_id = %admin_id, "Fighter request deleted");
        Ok(())
    }

    async fn get_pending(&self, id: i32) -> AppResult<fighter_request::Model> {
        let request = self
            .request_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fighter request {id}")))?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::AlreadyProcessed(format!(
                "Fighter request {id} is already {:?}",
                request.status
            )));
        }
        Ok(request)
    }
}
