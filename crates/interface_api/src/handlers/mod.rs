//! Request handlers

pub mod health;
pub mod fees;
pub mod payments;
pub mod dues;
pub mod dashboard;
pub mod reminder_rules;
pub mod notifications;

use core_kernel::InstituteId;
use domain_fees::DirectoryNames;

use crate::error::ApiError;
use crate::AppState;

/// Student and batch names of an institute for report rows
pub(crate) async fn directory_names(state: &AppState, institute_id: InstituteId) -> Result<DirectoryNames, ApiError> {
    let students = state.directory.list_students(institute_id).await?;
    let batches = state.directory.list_batches(institute_id).await?;
    Ok(DirectoryNames::new(&students, &batches))
}
