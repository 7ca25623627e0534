//! Dashboard handlers

use axum::{extract::State, Extension, Json};

use domain_fees::{DashboardSummary, FeeQuery};

use crate::auth::{Claims, STAFF};
use crate::error::ApiError;
use crate::handlers::directory_names;
use crate::AppState;

/// Fee totals and the next upcoming dues of the institute
pub async fn fee_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardSummary>, ApiError> {
    claims.require_role(STAFF)?;

    let fees = state
        .fees
        .list_student_fees(FeeQuery::for_institute(claims.institute_id))
        .await?;
    let names = directory_names(&state, claims.institute_id).await?;

    Ok(Json(DashboardSummary::from_fees(&fees, &names)))
}
