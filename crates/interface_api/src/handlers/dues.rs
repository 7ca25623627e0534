//! Dues report handler

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use core_kernel::{BatchId, StudentId};
use domain_fees::{DueFilter, DueItem, FeeQuery};

use crate::auth::Claims;
use crate::dto::fees::DuesQuery;
use crate::error::ApiError;
use crate::handlers::directory_names;
use crate::AppState;

/// Lists fees with something still owed
///
/// Students only ever see their own rows.
pub async fn list_dues(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<DuesQuery>,
) -> Result<Json<Vec<DueItem>>, ApiError> {
    let filter = DueFilter {
        batch_id: query.batch_id.map(BatchId::from),
        student_id: claims
            .student_scope()?
            .or(query.student_id.map(StudentId::from)),
        due_from: query.due_from,
        due_to: query.due_to,
    };

    let fees = state
        .fees
        .list_student_fees(FeeQuery::for_institute(claims.institute_id))
        .await?;
    let names = directory_names(&state, claims.institute_id).await?;

    Ok(Json(DueItem::report(&fees, &filter, &names)))
}
