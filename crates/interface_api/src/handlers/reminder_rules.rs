//! Reminder rule and reminder run handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{BatchId, ReminderRuleId};
use domain_reminders::{NewReminderRule, ReminderRule, ReminderRuleUpdate};

use crate::auth::{Claims, ADMIN_ONLY, STAFF};
use crate::dto::reminders::{
    CreateReminderRuleRequest, RunRemindersQuery, RunRemindersResponse, UpdateReminderRuleRequest,
};
use crate::error::ApiError;
use crate::AppState;

async fn load_rule(state: &AppState, claims: &Claims, id: Uuid) -> Result<ReminderRule, ApiError> {
    let rule = state.rules.get(ReminderRuleId::from(id)).await?;
    if rule.institute_id != claims.institute_id {
        return Err(ApiError::NotFound("Rule not found".to_string()));
    }
    Ok(rule)
}

/// Lists the institute's rules, newest first
pub async fn list_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ReminderRule>>, ApiError> {
    claims.require_role(STAFF)?;
    Ok(Json(state.rules.list_for_institute(claims.institute_id).await?))
}

/// Creates a rule, optionally scoped to one batch
pub async fn create_rule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateReminderRuleRequest>,
) -> Result<(StatusCode, Json<ReminderRule>), ApiError> {
    claims.require_role(ADMIN_ONLY)?;
    request.validate()?;

    let batch_id = request.batch_id.map(BatchId::from);
    if let Some(batch_id) = batch_id {
        state
            .directory
            .find_batch(batch_id)
            .await?
            .filter(|b| b.institute_id == claims.institute_id)
            .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?;
    }

    let new_rule = NewReminderRule {
        institute_id: claims.institute_id,
        batch_id,
        name: request.name.clone(),
        params: request.params(),
        is_active: request.is_active,
    };
    new_rule.validate()?;

    let rule = state.rules.create(new_rule).await?;
    info!(rule_id = %rule.id, name = %rule.name, "reminder rule created");
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Applies a partial update to a rule
pub async fn update_rule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReminderRuleRequest>,
) -> Result<Json<ReminderRule>, ApiError> {
    claims.require_role(ADMIN_ONLY)?;
    request.validate()?;

    let rule = load_rule(&state, &claims, id).await?;
    let updated = ReminderRuleUpdate::from(request).apply(&rule, Utc::now())?;

    Ok(Json(state.rules.update(updated).await?))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    claims.require_role(ADMIN_ONLY)?;

    let rule = load_rule(&state, &claims, id).await?;
    state.rules.delete(rule.id).await?;
    info!(rule_id = %rule.id, "reminder rule deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Runs the reminder engine for the caller's institute
pub async fn run_reminders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RunRemindersQuery>,
) -> Result<Json<RunRemindersResponse>, ApiError> {
    claims.require_role(STAFF)?;

    let scope = Some(claims.institute_id);
    let report = match query.run_date.as_deref() {
        Some(run_date) => state.engine.run_for_date_str(run_date, scope).await?,
        None => state.engine.run(state.timezone.today(), scope).await?,
    };

    Ok(Json(RunRemindersResponse {
        created_notifications: report.created,
        run_date: report.run_date,
        fees_scanned: report.fees_scanned,
        duplicates_skipped: report.duplicates_skipped,
    }))
}
