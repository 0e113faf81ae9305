use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{debug, error, warn};

use super::{AttendanceStore, EmployeeStore, StoreError, StoreResult, is_deadlock};
use crate::model::attendance::{Attendance, AttendanceFields, AttendanceFilter, Upserted};
use crate::model::employee::{Employee, EmployeeFilter, EmployeeKey, NewEmployee};
use crate::report::Counts;
use crate::utils::db_utils::{SqlValue, WhereClause, bind_values, contains_pattern};
use crate::utils::identifier::{next_identifier, parse_sequence};

const EMPLOYEE_COLUMNS: &str = "id, employee_id, name, email, phone, address, designation, \
     department, date_of_joining, created_at, updated_at";

const EMAIL_KEY: &str = "uq_employees_email";
const EMPLOYEE_ID_KEY: &str = "uq_employees_employee_id";
const CREATE_ATTEMPTS: u32 = 3;

const ATTENDANCE_SELECT: &str = r#"
    SELECT
        a.id,
        e.employee_id,
        e.name AS employee_name,
        a.date,
        a.in_time,
        a.out_time,
        a.status,
        a.notes,
        a.created_at,
        a.updated_at
    FROM attendance a
    JOIN employees e ON e.id = a.employee_pk
"#;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn grouped_counts(&self, column: &'static str) -> StoreResult<Counts> {
        let sql = format!("SELECT {column}, COUNT(*) FROM employees GROUP BY {column}");
        let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, column, "Failed to count employees");
                StoreError::from(e)
            })?;
        Ok(rows.into_iter().collect())
    }

    /// One create attempt; the highest identifier stays locked until commit.
    async fn insert_employee(&self, new: &NewEmployee) -> Result<Employee, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let last: Option<String> = sqlx::query_scalar(
            r#"
            SELECT employee_id
            FROM employees
            WHERE employee_id LIKE 'EMP%'
            ORDER BY CHAR_LENGTH(employee_id) DESC, employee_id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;
        let employee_id = next_identifier(last.as_deref().and_then(parse_sequence));

        let inserted = sqlx::query(
            r#"
            INSERT INTO employees
            (employee_id, name, email, phone, address, designation, department, date_of_joining)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee_id.as_str())
        .bind(new.name.as_str())
        .bind(new.email.as_str())
        .bind(new.phone.as_str())
        .bind(new.address.as_str())
        .bind(new.designation.as_str())
        .bind(new.department.as_str())
        .bind(new.date_of_joining)
        .execute(&mut *tx)
        .await?;

        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
        ))
        .bind(inserted.last_insert_id())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(employee)
    }
}

/// Index named by a duplicate-entry message such as
/// `Duplicate entry 'x' for key 'employees.uq_employees_email'`.
fn duplicate_key(message: &str) -> Option<&str> {
    let (_, key) = message.rsplit_once("for key '")?;
    let key = key.strip_suffix('\'')?;
    Some(key.rsplit_once('.').map_or(key, |(_, name)| name))
}

fn violated_key(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => duplicate_key(db.message()),
        _ => None,
    }
}

/// Internal primary key for an employee reference.
async fn employee_pk(conn: &mut MySqlConnection, key: &EmployeeKey) -> StoreResult<u64> {
    let found: Option<u64> = match key {
        EmployeeKey::Id(id) => {
            sqlx::query_scalar("SELECT id FROM employees WHERE id = ?")
                .bind(*id)
                .fetch_optional(&mut *conn)
                .await?
        }
        EmployeeKey::Code(code) => {
            sqlx::query_scalar("SELECT id FROM employees WHERE employee_id = ?")
                .bind(code.as_str())
                .fetch_optional(&mut *conn)
                .await?
        }
    };
    found.ok_or_else(|| StoreError::employee_not_found(key))
}

#[async_trait]
impl EmployeeStore for MySqlStore {
    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let mut attempt = 1;
        loop {
            let err = match self.insert_employee(&new).await {
                Ok(employee) => {
                    debug!(employee_id = %employee.employee_id, attempt, "Employee created");
                    return Ok(employee);
                }
                Err(err) => err,
            };

            let key = violated_key(&err);
            if key == Some(EMAIL_KEY) {
                return Err(StoreError::duplicate_email(&new.email));
            }
            let lost_race = key == Some(EMPLOYEE_ID_KEY) || is_deadlock(&err);
            if !lost_race {
                error!(error = %err, "Failed to create employee");
                return Err(err.into());
            }

            // Lost the identifier race to a concurrent create
            if attempt == CREATE_ATTEMPTS {
                warn!(attempt, error = %err, "Giving up on employee identifier allocation");
                return Err(StoreError::Conflict(
                    "Employee identifier allocation conflicted, please retry".to_string(),
                ));
            }
            debug!(attempt, error = %err, "Retrying employee create");
            attempt += 1;
        }
    }

    async fn get_employee(&self, key: &EmployeeKey) -> StoreResult<Employee> {
        let query = match key {
            EmployeeKey::Id(id) => sqlx::query_as::<_, Employee>(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
            ))
            .bind(*id)
            .fetch_optional(&self.pool)
            .await,
            EmployeeKey::Code(code) => sqlx::query_as::<_, Employee>(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?"
            ))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await,
        };

        query
            .map_err(|e| {
                error!(error = %e, employee_id = %key, "Failed to fetch employee");
                StoreError::from(e)
            })?
            .ok_or_else(|| StoreError::employee_not_found(key))
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>> {
        let mut clause = WhereClause::new();

        if let Some(department) = &filter.department {
            clause.push("department = ?", [SqlValue::String(department.clone())]);
        }

        if let Some(search) = &filter.search {
            let like = contains_pattern(search);
            clause.push(
                "(LOWER(name) LIKE ? OR LOWER(email) LIKE ? OR LOWER(employee_id) LIKE ?)",
                [
                    SqlValue::String(like.clone()),
                    SqlValue::String(like.clone()),
                    SqlValue::String(like),
                ],
            );
        }

        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees {} ORDER BY created_at DESC, id DESC",
            clause.sql()
        );
        debug!(sql = %sql, ?filter, "Fetching employees");

        bind_values(sqlx::query_as::<_, Employee>(&sql), clause.into_values())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, sql = %sql, "Failed to fetch employees");
                StoreError::from(e)
            })
    }

    async fn department_counts(&self) -> StoreResult<Counts> {
        self.grouped_counts("department").await
    }

    async fn designation_counts(&self) -> StoreResult<Counts> {
        self.grouped_counts("designation").await
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn upsert_attendance(
        &self,
        employee: &EmployeeKey,
        date: NaiveDate,
        fields: AttendanceFields,
    ) -> StoreResult<Upserted> {
        let mut tx = self.pool.begin().await?;
        let pk = employee_pk(&mut tx, employee).await?;

        let existing: Option<u64> = sqlx::query_scalar(
            "SELECT id FROM attendance WHERE employee_pk = ? AND date = ? FOR UPDATE",
        )
        .bind(pk)
        .bind(date)
        .fetch_optional(&mut *tx)
        .await?;

        let (id, created) = match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE attendance
                    SET in_time = COALESCE(?, in_time),
                        out_time = COALESCE(?, out_time),
                        status = COALESCE(?, status),
                        notes = COALESCE(?, notes)
                    WHERE id = ?
                    "#,
                )
                .bind(fields.in_time)
                .bind(fields.out_time)
                .bind(fields.status.map(|s| s.to_string()))
                .bind(fields.notes.as_deref())
                .bind(id)
                .execute(&mut *tx)
                .await?;
                (id, false)
            }
            None => {
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO attendance (employee_pk, date, in_time, out_time, status, notes)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(pk)
                .bind(date)
                .bind(fields.in_time)
                .bind(fields.out_time)
                .bind(fields.status.unwrap_or_default().to_string())
                .bind(fields.notes.as_deref())
                .execute(&mut *tx)
                .await?;
                (inserted.last_insert_id(), true)
            }
        };

        let attendance = sqlx::query_as::<_, Attendance>(&format!("{ATTENDANCE_SELECT} WHERE a.id = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(employee_id = %attendance.employee_id, %date, created, "Attendance saved");
        Ok(Upserted {
            attendance,
            created,
        })
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let mut clause = WhereClause::new();

        if let Some(key) = &filter.employee {
            let mut conn = self.pool.acquire().await?;
            let pk = employee_pk(&mut conn, key).await?;
            clause.push("a.employee_pk = ?", [SqlValue::U64(pk)]);
        }
        if let Some(date) = filter.date {
            clause.push("a.date = ?", [SqlValue::Date(date)]);
        }
        if let Some(start) = filter.start_date {
            clause.push("a.date >= ?", [SqlValue::Date(start)]);
        }
        if let Some(end) = filter.end_date {
            clause.push("a.date <= ?", [SqlValue::Date(end)]);
        }

        let mut sql = format!(
            "{ATTENDANCE_SELECT} {} ORDER BY a.date DESC, a.in_time DESC, a.id DESC",
            clause.sql()
        );
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        debug!(sql = %sql, "Fetching attendance");

        bind_values(sqlx::query_as::<_, Attendance>(&sql), clause.into_values())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, sql = %sql, "Failed to fetch attendance");
                StoreError::from(e)
            })
    }
}
