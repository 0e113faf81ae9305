use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "EMP000001",
        "name": "John Doe",
        "email": "john@example.com",
        "phone": "+8801712345678",
        "address": "12 Lake Road, Dhaka",
        "designation": "Developer",
        "department": "IT",
        "date_of_joining": "2024-01-01",
        "created_at": "2024-01-01T09:30:00",
        "updated_at": "2024-01-01T09:30:00"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP000001")]
    pub employee_id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john@example.com")]
    pub email: String,

    #[schema(example = "+8801712345678")]
    pub phone: String,

    #[schema(example = "12 Lake Road, Dhaka")]
    pub address: String,

    #[schema(example = "Developer")]
    pub designation: String,

    #[schema(example = "IT")]
    pub department: String,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub date_of_joining: NaiveDate,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

/// Validated fields for a new employee; the identifier is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub designation: String,
    pub department: String,
    pub date_of_joining: NaiveDate,
}

/// How a caller refers to an employee: the public identifier, or the
/// internal numeric id when the reference is all digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeKey {
    Id(u64),
    Code(String),
}

impl EmployeeKey {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = raw.parse() {
                return EmployeeKey::Id(id);
            }
        }
        EmployeeKey::Code(raw.to_string())
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        match self {
            EmployeeKey::Id(id) => employee.id == *id,
            EmployeeKey::Code(code) => employee.employee_id == *code,
        }
    }
}

impl std::fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmployeeKey::Id(id) => write!(f, "{id}"),
            EmployeeKey::Code(code) => f.write_str(code),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub search: Option<String>,
}

impl EmployeeFilter {
    /// In-process equivalent of the SQL filter.
    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(department) = &self.department {
            if employee.department != *department {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = [&employee.name, &employee.email, &employee.employee_id]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}
