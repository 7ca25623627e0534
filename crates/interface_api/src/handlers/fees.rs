//! Student fee handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{BatchId, Page, PageRequest, StudentFeeId, StudentId};
use domain_fees::{FeeQuery, NewStudentFee, StudentFee};

use crate::auth::{Claims, STAFF};
use crate::dto::fees::{CreateStudentFeeRequest, StudentFeeListQuery, StudentFeeResponse};
use crate::dto::DEFAULT_PAGE_SIZE;
use crate::error::ApiError;
use crate::AppState;

/// Loads a fee of the caller's institute that the caller may see
pub(crate) async fn load_fee(state: &AppState, claims: &Claims, id: StudentFeeId) -> Result<StudentFee, ApiError> {
    let fee = state.fees.get_student_fee(id).await?;
    if fee.institute_id != claims.institute_id {
        return Err(ApiError::NotFound("Student fee mapping not found".to_string()));
    }
    if let Some(student_id) = claims.student_scope()? {
        if fee.student_id != student_id {
            return Err(ApiError::Forbidden("Not allowed".to_string()));
        }
    }
    Ok(fee)
}

/// Maps a student in a batch to a fee
pub async fn create_student_fee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateStudentFeeRequest>,
) -> Result<(StatusCode, Json<StudentFeeResponse>), ApiError> {
    claims.require_role(STAFF)?;
    request.validate()?;

    let student_id = StudentId::from(request.student_id);
    let batch_id = BatchId::from(request.batch_id);

    state
        .directory
        .find_student(student_id)
        .await?
        .filter(|s| s.institute_id == claims.institute_id)
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
    state
        .directory
        .find_batch(batch_id)
        .await?
        .filter(|b| b.institute_id == claims.institute_id)
        .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?;

    if !state.directory.list_student_batches(student_id).await?.contains(&batch_id) {
        return Err(ApiError::BadRequest(
            "Student must be assigned to batch before fee mapping".to_string(),
        ));
    }
    if state.fees.find_by_student_batch(student_id, batch_id).await?.is_some() {
        return Err(ApiError::Conflict("Student fee mapping already exists".to_string()));
    }

    let new_fee = NewStudentFee {
        institute_id: claims.institute_id,
        student_id,
        batch_id,
        fee_plan_id: request.fee_plan_id.map(Into::into),
        total_fee: request.total_fee,
        discount: request.discount,
        due_schedule: request.schedule(),
    };
    new_fee.validate()?;

    let fee = state.fees.create_student_fee(new_fee).await?;
    info!(student_fee_id = %fee.id, student_id = %fee.student_id, "student fee created");

    Ok((StatusCode::CREATED, Json(StudentFeeResponse::from(&fee))))
}

/// Lists fees of the caller's institute, newest first
pub async fn list_student_fees(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<StudentFeeListQuery>,
) -> Result<Json<Page<StudentFeeResponse>>, ApiError> {
    let mut fee_query = FeeQuery::for_institute(claims.institute_id);
    fee_query.student_id = query.student_id.map(StudentId::from);
    fee_query.batch_id = query.batch_id.map(BatchId::from);
    if let Some(student_id) = claims.student_scope()? {
        fee_query.student_id = Some(student_id);
    }

    let fees = state.fees.list_student_fees(fee_query).await?;
    let page = PageRequest::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);

    Ok(Json(Page::from_vec(fees, page).map(|fee| StudentFeeResponse::from(&fee))))
}

/// Gets one fee with its computed balances
pub async fn get_student_fee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentFeeResponse>, ApiError> {
    let fee = load_fee(&state, &claims, StudentFeeId::from(id)).await?;
    Ok(Json(StudentFeeResponse::from(&fee)))
}
