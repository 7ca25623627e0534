//! Notification handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use core_kernel::{NotificationId, Page, PageRequest, StudentId};
use domain_reminders::{Notification, NotificationQuery, StudentAudience};

use crate::auth::Claims;
use crate::dto::notifications::{NotificationListQuery, WhatsappTemplateResponse};
use crate::dto::DEFAULT_PAGE_SIZE;
use crate::error::ApiError;
use crate::AppState;

async fn audience(state: &AppState, student_id: StudentId) -> Result<StudentAudience, ApiError> {
    Ok(StudentAudience {
        student_id,
        batch_ids: state.directory.list_student_batches(student_id).await?,
    })
}

/// Loads a notification of the caller's institute that the caller may see
async fn load_visible(state: &AppState, claims: &Claims, id: Uuid) -> Result<Notification, ApiError> {
    let notification = state.notifications.get(NotificationId::from(id)).await?;
    if notification.institute_id != claims.institute_id {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    if let Some(student_id) = claims.student_scope()? {
        if !notification.visible_to(&audience(state, student_id).await?) {
            return Err(ApiError::Forbidden("Not allowed".to_string()));
        }
    }
    Ok(notification)
}

/// Lists notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Page<Notification>>, ApiError> {
    let audience = match claims.student_scope()? {
        Some(student_id) => Some(audience(&state, student_id).await?),
        None => None,
    };

    let page = state
        .notifications
        .list(NotificationQuery {
            institute_id: claims.institute_id,
            notification_type: query.notification_type,
            audience,
            page: PageRequest::new(query.page, query.page_size, DEFAULT_PAGE_SIZE),
        })
        .await?;

    Ok(Json(page))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = load_visible(&state, &claims, id).await?;
    Ok(Json(state.notifications.mark_read(notification.id, Utc::now()).await?))
}

/// WhatsApp-ready text of a notification
pub async fn whatsapp_template(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<WhatsappTemplateResponse>, ApiError> {
    let notification = load_visible(&state, &claims, id).await?;
    Ok(Json(WhatsappTemplateResponse {
        template: notification.whatsapp_template(),
    }))
}
