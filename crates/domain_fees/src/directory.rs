//! Read-only views of students and batches
//!
//! Only the fields needed to label fees and reminders are exposed here.

use serde::{Deserialize, Serialize};

use core_kernel::{BatchId, InstituteId, StudentId, UserId};

/// A student enrolled with an institute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub institute_id: InstituteId,
    /// Login account linked to the student, if any
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub email: Option<String>,
}

/// A batch (class group) run by an institute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProfile {
    pub id: BatchId,
    pub institute_id: InstituteId,
    pub name: String,
    pub course: Option<String>,
}
