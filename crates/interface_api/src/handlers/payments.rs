//! Payment handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use tracing::info;
use validator::Validate;

use core_kernel::{Page, PageRequest, StudentFeeId};
use domain_fees::{NewPayment, Payment, PaymentMode, PaymentQuery};

use crate::auth::{Claims, STAFF};
use crate::dto::fees::{CreatePaymentRequest, PaymentListQuery};
use crate::dto::DEFAULT_PAGE_SIZE;
use crate::error::ApiError;
use crate::handlers::fees::load_fee;
use crate::AppState;

/// Records a payment against a fee
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    claims.require_role(STAFF)?;
    request.validate()?;
    let mode: PaymentMode = request.mode.parse()?;

    let fee = load_fee(&state, &claims, StudentFeeId::from(request.student_fee_id)).await?;
    fee.validate_payment(request.amount)?;

    let payment = NewPayment {
        institute_id: claims.institute_id,
        student_fee_id: fee.id,
        amount: request.amount,
        paid_on: request.paid_on,
        mode,
        remarks: request.remarks,
        created_by: claims.user_id(),
    }
    .into_payment(Utc::now());

    // Re-checked against the balance at write time
    let payment = state.fees.record_payment(payment).await?.into_result()?;
    info!(
        action = "FEE_PAYMENT_CREATED",
        actor = %claims.sub,
        payment_id = %payment.id,
        student_fee_id = %payment.student_fee_id,
        amount = %payment.amount,
        mode = %payment.mode,
        receipt_no = %payment.receipt_no,
        "payment recorded"
    );

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Lists payments of the caller's institute, newest first
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<Page<Payment>>, ApiError> {
    let payments = state
        .fees
        .list_payments(PaymentQuery {
            institute_id: claims.institute_id,
            student_fee_id: query.student_fee_id.map(StudentFeeId::from),
            student_id: claims.student_scope()?,
        })
        .await?;

    let page = PageRequest::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);
    Ok(Json(Page::from_vec(payments, page)))
}
