//! Persistence seam for employees and attendance.
//!
//! Handlers only see `dyn Store`; `mysql::MySqlStore` backs production and
//! `memory::MemoryStore` backs database-less runs and tests.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

use crate::model::attendance::{Attendance, AttendanceFields, AttendanceFilter, Upserted};
use crate::model::employee::{Employee, EmployeeFilter, EmployeeKey, NewEmployee};
use crate::report::Counts;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn employee_not_found(key: &EmployeeKey) -> Self {
        StoreError::NotFound(format!("Employee not found: {key}"))
    }

    pub fn duplicate_email(email: &str) -> Self {
        StoreError::Conflict(format!("Employee with email {email} already exists"))
    }
}

/// InnoDB picked this transaction as a deadlock victim.
const ER_LOCK_DEADLOCK: u16 = 1213;

pub(crate) fn is_deadlock(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| e.number() == ER_LOCK_DEADLOCK),
        _ => false,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_deadlock(&err) {
            return StoreError::Conflict("Concurrent update conflicted, please retry".to_string());
        }
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(format!("Duplicate record: {}", db_err.message()))
            }
            other => StoreError::Internal(other.to_string()),
        }
    }
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Insert an employee under the next free identifier.
    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee>;

    async fn get_employee(&self, key: &EmployeeKey) -> StoreResult<Employee>;

    /// Matching employees, newest first.
    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>>;

    async fn department_counts(&self) -> StoreResult<Counts>;

    async fn designation_counts(&self) -> StoreResult<Counts>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Create or update the single record for (employee, date).
    async fn upsert_attendance(
        &self,
        employee: &EmployeeKey,
        date: NaiveDate,
        fields: AttendanceFields,
    ) -> StoreResult<Upserted>;

    /// Matching records, latest date first.
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>>;
}

/// Everything the API layer needs from persistence.
pub trait Store: EmployeeStore + AttendanceStore {}

impl<T: EmployeeStore + AttendanceStore> Store for T {}
