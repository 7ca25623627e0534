//! Fee Domain Ports
//!
//! Port interfaces for the fee ledger and the student/batch directory.
//!
//! - **Postgres adapters** live in `infra_db`
//! - **Mock adapters** (in-memory) live in [`mock`] behind the `mock` feature
//!
//! ```rust,ignore
//! pub struct DuesService {
//!     fees: Arc<dyn FeeLedgerPort>,
//! }
//!
//! impl DuesService {
//!     pub async fn due(&self, id: StudentFeeId) -> Result<Money, PortError> {
//!         Ok(self.fees.get_student_fee(id).await?.amount_due())
//!     }
//! }
//! ```

use async_trait::async_trait;

use core_kernel::{
    BatchId, DomainPort, HealthCheckable, InstituteId, PortError, StudentFeeId, StudentId,
};

use crate::directory::{BatchProfile, StudentProfile};
use crate::payment::{Payment, PaymentOutcome};
use crate::student_fee::{NewStudentFee, StudentFee};

/// Query parameters for listing student fees
#[derive(Debug, Clone, Default)]
pub struct FeeQuery {
    /// `None` lists fees of every institute (scheduler runs)
    pub institute_id: Option<InstituteId>,
    pub student_id: Option<StudentId>,
    pub batch_id: Option<BatchId>,
}

impl FeeQuery {
    /// All fees of one institute
    pub fn for_institute(institute_id: InstituteId) -> Self {
        Self {
            institute_id: Some(institute_id),
            ..Default::default()
        }
    }

    pub fn student(mut self, student_id: StudentId) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn batch(mut self, batch_id: BatchId) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    pub fn matches(&self, fee: &StudentFee) -> bool {
        self.institute_id.map_or(true, |i| fee.institute_id == i)
            && self.student_id.map_or(true, |s| fee.student_id == s)
            && self.batch_id.map_or(true, |b| fee.batch_id == b)
    }
}

/// Query parameters for listing payments
#[derive(Debug, Clone)]
pub struct PaymentQuery {
    pub institute_id: InstituteId,
    pub student_fee_id: Option<StudentFeeId>,
    /// Restricts to payments on fees owned by this student
    pub student_id: Option<StudentId>,
}

/// Storage for student fees and their payments
///
/// Returned `StudentFee` values always carry their payments. Lists are
/// ordered newest first.
#[async_trait]
pub trait FeeLedgerPort: DomainPort + HealthCheckable {
    /// Retrieves a fee with its payments, or `PortError::NotFound`
    async fn get_student_fee(&self, id: StudentFeeId) -> Result<StudentFee, PortError>;

    /// Lists fees matching the query
    async fn list_student_fees(&self, query: FeeQuery) -> Result<Vec<StudentFee>, PortError>;

    /// Finds the fee for a student and batch pair
    async fn find_by_student_batch(
        &self,
        student_id: StudentId,
        batch_id: BatchId,
    ) -> Result<Option<StudentFee>, PortError>;

    /// Creates a fee, or `PortError::Conflict` if the pair already has one
    async fn create_student_fee(&self, fee: NewStudentFee) -> Result<StudentFee, PortError>;

    /// Persists a payment if it still fits the fee's amount due
    ///
    /// The balance check and the write are atomic with respect to other
    /// payments on the same fee. A duplicate receipt number is
    /// `PortError::Conflict`.
    async fn record_payment(&self, payment: Payment) -> Result<PaymentOutcome, PortError>;

    /// Lists payments matching the query
    async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Payment>, PortError>;
}

/// Read access to students and batches
#[async_trait]
pub trait DirectoryPort: DomainPort + HealthCheckable {
    async fn find_student(&self, id: StudentId) -> Result<Option<StudentProfile>, PortError>;

    async fn find_batch(&self, id: BatchId) -> Result<Option<BatchProfile>, PortError>;

    async fn list_students(&self, institute_id: InstituteId) -> Result<Vec<StudentProfile>, PortError>;

    async fn list_batches(&self, institute_id: InstituteId) -> Result<Vec<BatchProfile>, PortError>;

    /// Batches the student is enrolled in
    async fn list_student_batches(&self, student_id: StudentId) -> Result<Vec<BatchId>, PortError>;
}

/// In-memory implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory fee ledger
    #[derive(Debug, Default, Clone)]
    pub struct MockFeeLedgerPort {
        fees: Arc<RwLock<HashMap<StudentFeeId, StudentFee>>>,
    }

    impl MockFeeLedgerPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with fees (payments included)
        pub async fn with_fees(fees: Vec<StudentFee>) -> Self {
            let port = Self::new();
            {
                let mut store = port.fees.write().await;
                for fee in fees {
                    store.insert(fee.id, fee);
                }
            }
            port
        }

        pub async fn insert(&self, fee: StudentFee) {
            self.fees.write().await.insert(fee.id, fee);
        }
    }

    impl DomainPort for MockFeeLedgerPort {}

    #[async_trait]
    impl HealthCheckable for MockFeeLedgerPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-fee-ledger-port")
        }
    }

    fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) {
        items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    }

    #[async_trait]
    impl FeeLedgerPort for MockFeeLedgerPort {
        async fn get_student_fee(&self, id: StudentFeeId) -> Result<StudentFee, PortError> {
            self.fees
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("StudentFee", id))
        }

        async fn list_student_fees(&self, query: FeeQuery) -> Result<Vec<StudentFee>, PortError> {
            let mut fees: Vec<StudentFee> = self
                .fees
                .read()
                .await
                .values()
                .filter(|f| query.matches(f))
                .cloned()
                .collect();
            newest_first(&mut fees, |f| f.created_at);
            Ok(fees)
        }

        async fn find_by_student_batch(
            &self,
            student_id: StudentId,
            batch_id: BatchId,
        ) -> Result<Option<StudentFee>, PortError> {
            Ok(self
                .fees
                .read()
                .await
                .values()
                .find(|f| f.student_id == student_id && f.batch_id == batch_id)
                .cloned())
        }

        async fn create_student_fee(&self, fee: NewStudentFee) -> Result<StudentFee, PortError> {
            let mut fees = self.fees.write().await;
            if fees
                .values()
                .any(|f| f.student_id == fee.student_id && f.batch_id == fee.batch_id)
            {
                return Err(PortError::conflict(
                    "fee mapping already exists for this student and batch",
                ));
            }
            let created = fee.into_student_fee(Utc::now());
            fees.insert(created.id, created.clone());
            Ok(created)
        }

        async fn record_payment(&self, payment: Payment) -> Result<PaymentOutcome, PortError> {
            let mut fees = self.fees.write().await;
            if fees
                .values()
                .flat_map(|f| f.payments.iter())
                .any(|p| p.receipt_no == payment.receipt_no)
            {
                return Err(PortError::conflict("duplicate receipt number"));
            }
            let fee = fees
                .get_mut(&payment.student_fee_id)
                .ok_or_else(|| PortError::not_found("StudentFee", payment.student_fee_id))?;
            let due = fee.amount_due();
            if payment.amount > due {
                return Ok(PaymentOutcome::ExceedsDue {
                    amount: payment.amount,
                    due,
                });
            }
            fee.payments.push(payment.clone());
            Ok(PaymentOutcome::Recorded(payment))
        }

        async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Payment>, PortError> {
            let fees = self.fees.read().await;
            let mut payments: Vec<Payment> = fees
                .values()
                .filter(|f| f.institute_id == query.institute_id)
                .filter(|f| query.student_fee_id.map_or(true, |id| f.id == id))
                .filter(|f| query.student_id.map_or(true, |s| f.student_id == s))
                .flat_map(|f| f.payments.iter().cloned())
                .collect();
            newest_first(&mut payments, |p| p.created_at);
            Ok(payments)
        }
    }

    /// In-memory student and batch directory
    #[derive(Debug, Default, Clone)]
    pub struct MockDirectoryPort {
        students: Arc<RwLock<HashMap<StudentId, StudentProfile>>>,
        batches: Arc<RwLock<HashMap<BatchId, BatchProfile>>>,
        enrollments: Arc<RwLock<Vec<(StudentId, BatchId)>>>,
    }

    impl MockDirectoryPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_profiles(students: Vec<StudentProfile>, batches: Vec<BatchProfile>) -> Self {
            let port = Self::new();
            for student in students {
                port.add_student(student).await;
            }
            for batch in batches {
                port.add_batch(batch).await;
            }
            port
        }

        pub async fn add_student(&self, student: StudentProfile) {
            self.students.write().await.insert(student.id, student);
        }

        pub async fn add_batch(&self, batch: BatchProfile) {
            self.batches.write().await.insert(batch.id, batch);
        }

        pub async fn enroll(&self, student_id: StudentId, batch_id: BatchId) {
            self.enrollments.write().await.push((student_id, batch_id));
        }

        pub async fn remove_student(&self, id: StudentId) {
            self.students.write().await.remove(&id);
        }
    }

    impl DomainPort for MockDirectoryPort {}

    #[async_trait]
    impl HealthCheckable for MockDirectoryPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-directory-port")
        }
    }

    #[async_trait]
    impl DirectoryPort for MockDirectoryPort {
        async fn find_student(&self, id: StudentId) -> Result<Option<StudentProfile>, PortError> {
            Ok(self.students.read().await.get(&id).cloned())
        }

        async fn find_batch(&self, id: BatchId) -> Result<Option<BatchProfile>, PortError> {
            Ok(self.batches.read().await.get(&id).cloned())
        }

        async fn list_students(&self, institute_id: InstituteId) -> Result<Vec<StudentProfile>, PortError> {
            Ok(self
                .students
                .read()
                .await
                .values()
                .filter(|s| s.institute_id == institute_id)
                .cloned()
                .collect())
        }

        async fn list_batches(&self, institute_id: InstituteId) -> Result<Vec<BatchProfile>, PortError> {
            Ok(self
                .batches
                .read()
                .await
                .values()
                .filter(|b| b.institute_id == institute_id)
                .cloned()
                .collect())
        }

        async fn list_student_batches(&self, student_id: StudentId) -> Result<Vec<BatchId>, PortError> {
            Ok(self
                .enrollments
                .read()
                .await
                .iter()
                .filter(|(s, _)| *s == student_id)
                .map(|(_, b)| *b)
                .collect())
        }
    }
}
