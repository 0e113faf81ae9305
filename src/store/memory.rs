use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use super::{AttendanceStore, EmployeeStore, StoreError, StoreResult};
use crate::model::attendance::{
    Attendance, AttendanceFields, AttendanceFilter, AttendanceStatus, Upserted,
};
use crate::model::employee::{Employee, EmployeeFilter, EmployeeKey, NewEmployee};
use crate::report::{Counts, count_by};
use crate::utils::identifier::{max_sequence, next_identifier};

/// In-process store. Every operation runs under one lock, so the
/// read-max-then-insert identifier step cannot interleave.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    employees: Vec<Employee>,
    attendance: Vec<AttendanceRow>,
    last_employee_pk: u64,
    last_attendance_pk: u64,
}

struct AttendanceRow {
    id: u64,
    employee_pk: u64,
    date: NaiveDate,
    in_time: Option<NaiveTime>,
    out_time: Option<NaiveTime>,
    status: AttendanceStatus,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl AttendanceRow {
    fn joined(&self, employee: &Employee) -> Attendance {
        Attendance {
            id: self.id,
            employee_id: employee.employee_id.clone(),
            employee_name: employee.name.clone(),
            date: self.date,
            in_time: self.in_time,
            out_time: self.out_time,
            status: self.status,
            notes: self.notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl State {
    fn employee(&self, key: &EmployeeKey) -> StoreResult<&Employee> {
        self.employees
            .iter()
            .find(|e| key.matches(e))
            .ok_or_else(|| StoreError::employee_not_found(key))
    }

    fn employee_by_pk(&self, pk: u64) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == pk)
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let mut state = self.lock()?;

        let email = new.email.to_lowercase();
        if state.employees.iter().any(|e| e.email.to_lowercase() == email) {
            return Err(StoreError::duplicate_email(&new.email));
        }

        let current = max_sequence(state.employees.iter().map(|e| e.employee_id.as_str()));
        state.last_employee_pk += 1;
        let created_at = now();

        let employee = Employee {
            id: state.last_employee_pk,
            employee_id: next_identifier(current),
            name: new.name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            designation: new.designation,
            department: new.department,
            date_of_joining: new.date_of_joining,
            created_at,
            updated_at: created_at,
        };
        state.employees.push(employee.clone());

        debug!(employee_id = %employee.employee_id, "Employee stored in memory");
        Ok(employee)
    }

    async fn get_employee(&self, key: &EmployeeKey) -> StoreResult<Employee> {
        self.lock()?.employee(key).cloned()
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>> {
        let state = self.lock()?;
        let mut employees: Vec<Employee> = state
            .employees
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        employees.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(employees)
    }

    async fn department_counts(&self) -> StoreResult<Counts> {
        Ok(count_by(&self.lock()?.employees, |e| e.department.as_str()))
    }

    async fn designation_counts(&self) -> StoreResult<Counts> {
        Ok(count_by(&self.lock()?.employees, |e| e.designation.as_str()))
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn upsert_attendance(
        &self,
        employee: &EmployeeKey,
        date: NaiveDate,
        fields: AttendanceFields,
    ) -> StoreResult<Upserted> {
        let mut state = self.lock()?;
        let owner = state.employee(employee)?.clone();
        let stamp = now();

        let existing = state
            .attendance
            .iter()
            .position(|r| r.employee_pk == owner.id && r.date == date);

        let (index, created) = match existing {
            Some(index) => {
                let row = &mut state.attendance[index];
                if fields.in_time.is_some() {
                    row.in_time = fields.in_time;
                }
                if fields.out_time.is_some() {
                    row.out_time = fields.out_time;
                }
                if let Some(status) = fields.status {
                    row.status = status;
                }
                if fields.notes.is_some() {
                    row.notes = fields.notes;
                }
                row.updated_at = stamp;
                (index, false)
            }
            None => {
                state.last_attendance_pk += 1;
                let id = state.last_attendance_pk;
                state.attendance.push(AttendanceRow {
                    id,
                    employee_pk: owner.id,
                    date,
                    in_time: fields.in_time,
                    out_time: fields.out_time,
                    status: fields.status.unwrap_or_default(),
                    notes: fields.notes,
                    created_at: stamp,
                    updated_at: stamp,
                });
                (state.attendance.len() - 1, true)
            }
        };

        let attendance = state.attendance[index].joined(&owner);
        debug!(employee_id = %owner.employee_id, %date, created, "Attendance stored in memory");
        Ok(Upserted {
            attendance,
            created,
        })
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let state = self.lock()?;

        let owner_pk = match &filter.employee {
            Some(key) => Some(state.employee(key)?.id),
            None => None,
        };

        let mut records: Vec<Attendance> = state
            .attendance
            .iter()
            .filter(|r| owner_pk.is_none_or(|pk| r.employee_pk == pk))
            .filter(|r| filter.matches_date(r.date))
            .filter_map(|r| state.employee_by_pk(r.employee_pk).map(|e| r.joined(e)))
            .collect();

        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.in_time.cmp(&a.in_time))
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(limit) = filter.limit {
            records.truncate(limit as usize);
        }
        Ok(records)
    }
}
