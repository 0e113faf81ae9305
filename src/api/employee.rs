use crate::{
    api::attendance::AttendanceResponse,
    error::ApiResult,
    model::attendance::AttendanceFilter,
    model::employee::{Employee, EmployeeFilter, EmployeeKey, NewEmployee},
    report::{StatusSummary, status_summary},
    store::Store,
    utils::validation::{
        FieldError, TEXT_MAX, max_len, not_in_future, optional, parse_date, required, validate_email,
        validate_phone,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

/// Attendance rows included in the employee detail view.
const RECENT_ATTENDANCE: u32 = 30;

// Column widths of the employees table
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 254;
const PHONE_MAX: usize = 15;
const DESIGNATION_MAX: usize = 50;
const DEPARTMENT_MAX: usize = 50;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "John Doe", value_type = String)]
    pub name: Option<String>,
    #[schema(example = "john@example.com", format = "email", value_type = String)]
    pub email: Option<String>,
    #[schema(example = "+8801712345678", value_type = String)]
    pub phone: Option<String>,
    #[schema(example = "12 Lake Road, Dhaka", value_type = String)]
    pub address: Option<String>,
    #[schema(example = "Developer", value_type = String)]
    pub designation: Option<String>,
    #[schema(example = "IT", value_type = String)]
    pub department: Option<String>,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date_of_joining: Option<String>,
}

impl CreateEmployee {
    /// Check every field and produce the store input. Joining dates after
    /// `today` are rejected.
    pub fn validate(self, today: NaiveDate) -> Result<NewEmployee, FieldError> {
        let name = required("name", self.name)?;
        let email = required("email", self.email)?;
        let phone = required("phone", self.phone)?;
        let address = required("address", self.address)?;
        let designation = required("designation", self.designation)?;
        let department = required("department", self.department)?;
        let joined = required("date_of_joining", self.date_of_joining)?;

        let name = max_len("name", name, NAME_MAX)?;
        let email = max_len("email", email, EMAIL_MAX)?;
        let phone = max_len("phone", phone, PHONE_MAX)?;
        let address = max_len("address", address, TEXT_MAX)?;
        let designation = max_len("designation", designation, DESIGNATION_MAX)?;
        let department = max_len("department", department, DEPARTMENT_MAX)?;

        validate_email(&email)?;
        validate_phone(&phone)?;
        let date_of_joining =
            not_in_future("date_of_joining", parse_date("date_of_joining", &joined)?, today)?;

        Ok(NewEmployee {
            name,
            email,
            phone,
            address,
            designation,
            department,
            date_of_joining,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Exact department name
    pub department: Option<String>,
    /// Case-insensitive match on name, email or employee id
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: Employee,
    pub attendances: Vec<AttendanceResponse>,
    pub summary: StatusSummary,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing or malformed field", body = Object, example = json!({
            "error": "Missing required field: email"
        })),
        (status = 409, description = "Email already in use", body = Object, example = json!({
            "error": "Employee with email john@example.com already exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    store: web::Data<dyn Store>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<HttpResponse> {
    let new = payload.into_inner().validate(Local::now().date_naive())?;
    let employee = store.create_employee(new).await?;

    info!(employee_id = %employee.employee_id, "Employee created");
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employees, newest first", body = [Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    store: web::Data<dyn Store>,
    query: web::Query<EmployeeQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let filter = EmployeeFilter {
        department: optional(query.department),
        search: optional(query.search),
    };

    let employees = store.list_employees(&filter).await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Get Employee with recent attendance
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Public id (EMP000001) or internal numeric id")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeDetail),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found: EMP000404"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = EmployeeKey::parse(&path.into_inner());
    let employee = store.get_employee(&key).await?;

    let records = store
        .list_attendance(&AttendanceFilter {
            employee: Some(EmployeeKey::Id(employee.id)),
            limit: Some(RECENT_ATTENDANCE),
            ..Default::default()
        })
        .await?;

    let summary = status_summary(&records);
    Ok(HttpResponse::Ok().json(EmployeeDetail {
        employee,
        attendances: records.into_iter().map(AttendanceResponse::from).collect(),
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use actix_web::http::StatusCode;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn john() -> Value {
        json!({
            "name": "John Doe",
            "email": "john@example.com",
            "phone": "+8801712345678",
            "address": "12 Lake Road",
            "designation": "Developer",
            "department": "IT",
            "date_of_joining": "2024-01-01"
        })
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn payload(value: Value) -> CreateEmployee {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let mut body = john();
        body.as_object_mut().unwrap().remove("phone");
        assert_eq!(
            payload(body).validate(today()),
            Err(FieldError::Missing("phone"))
        );
    }

    #[test]
    fn validate_rejects_bad_dates_and_email() {
        let mut body = john();
        body["date_of_joining"] = json!("01-01-2024");
        assert_eq!(
            payload(body).validate(today()),
            Err(FieldError::InvalidDate("date_of_joining"))
        );

        let mut body = john();
        body["date_of_joining"] = json!("2024-06-02");
        assert_eq!(
            payload(body).validate(today()),
            Err(FieldError::FutureDate("date_of_joining"))
        );

        let mut body = john();
        body["email"] = json!("not-an-email");
        assert!(matches!(
            payload(body).validate(today()),
            Err(FieldError::InvalidEmail(_))
        ));
    }

    #[test]
    fn validate_enforces_column_widths_and_phone_digits() {
        let mut body = john();
        body["phone"] = json!("+880 1712-345678");
        assert_eq!(
            payload(body).validate(today()),
            Err(FieldError::TooLong("phone", 15))
        );

        let mut body = john();
        body["phone"] = json!("123");
        assert_eq!(payload(body).validate(today()), Err(FieldError::InvalidPhone));

        let mut body = john();
        body["department"] = json!("D".repeat(80));
        assert_eq!(
            payload(body).validate(today()),
            Err(FieldError::TooLong("department", 50))
        );

        let mut body = john();
        body["name"] = json!("N".repeat(100));
        assert!(payload(body).validate(today()).is_ok());
    }

    #[actix_web::test]
    async fn oversized_or_short_phone_is_bad_request() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = crate::api::test_app!(store);

        for (phone, message) in [
            ("+880 1712-345678", "phone must be at most 15 characters"),
            ("123", "Phone number must be at least 10 digits"),
        ] {
            let mut body = john();
            body["phone"] = json!(phone);
            let req = actix_web::test::TestRequest::post()
                .uri("/api/employees/")
                .set_json(body)
                .to_request();
            let resp = actix_web::test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let err: Value = actix_web::test::read_body_json(resp).await;
            assert_eq!(err, json!({ "error": message }));
        }

        let req = actix_web::test::TestRequest::get().uri("/api/employees/").to_request();
        let all: Vec<Value> = actix_web::test::call_and_read_body_json(&app, req).await;
        assert!(all.is_empty());
    }

    #[actix_web::test]
    async fn create_then_get_returns_same_fields_and_no_attendance() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = crate::api::test_app!(store);

        let req = actix_web::test::TestRequest::post()
            .uri("/api/employees/")
            .set_json(john())
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = actix_web::test::read_body_json(resp).await;

        let id = created["employee_id"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 9);
        assert!(id.starts_with("EMP"));
        assert!(id[3..].bytes().all(|b| b.is_ascii_digit()));

        let req = actix_web::test::TestRequest::get()
            .uri(&format!("/api/employees/{id}/"))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let detail: Value = actix_web::test::read_body_json(resp).await;

        for field in ["employee_id", "name", "email", "phone", "address", "designation", "department", "date_of_joining"] {
            assert_eq!(detail[field], created[field], "{field} differs");
        }
        assert_eq!(detail["attendances"], json!([]));
        assert_eq!(detail["summary"]["total_present"], json!(0));
    }

    #[actix_web::test]
    async fn duplicate_email_is_conflict() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = crate::api::test_app!(store);

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let req = actix_web::test::TestRequest::post()
                .uri("/api/employees/")
                .set_json(john())
                .to_request();
            let resp = actix_web::test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }

    #[actix_web::test]
    async fn missing_field_is_bad_request() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = crate::api::test_app!(store);

        let mut body = john();
        body.as_object_mut().unwrap().remove("email");
        let req = actix_web::test::TestRequest::post()
            .uri("/api/employees/")
            .set_json(body)
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(err, json!({ "error": "Missing required field: email" }));
    }

    #[actix_web::test]
    async fn malformed_json_is_bad_request() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = crate::api::test_app!(store);

        let req = actix_web::test::TestRequest::post()
            .uri("/api/employees/")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = actix_web::test::read_body_json(resp).await;
        assert!(err["error"].as_str().unwrap().starts_with("Invalid JSON data"));
    }

    #[actix_web::test]
    async fn list_filters_by_department_and_search() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = crate::api::test_app!(store);

        for (name, email, department) in [
            ("John Doe", "john@example.com", "IT"),
            ("Mary Major", "mary@example.com", "HR"),
        ] {
            let mut body = john();
            body["name"] = json!(name);
            body["email"] = json!(email);
            body["department"] = json!(department);
            let req = actix_web::test::TestRequest::post()
                .uri("/api/employees/")
                .set_json(body)
                .to_request();
            assert_eq!(actix_web::test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = actix_web::test::TestRequest::get().uri("/api/employees/").to_request();
        let all: Vec<Value> = actix_web::test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["name"], "Mary Major");

        let req = actix_web::test::TestRequest::get()
            .uri("/api/employees/?department=IT")
            .to_request();
        let it: Vec<Value> = actix_web::test::call_and_read_body_json(&app, req).await;
        assert_eq!(it.len(), 1);
        assert_eq!(it[0]["name"], "John Doe");

        let req = actix_web::test::TestRequest::get()
            .uri("/api/employees/?search=MARY")
            .to_request();
        let found: Vec<Value> = actix_web::test::call_and_read_body_json(&app, req).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["email"], "mary@example.com");
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = crate::api::test_app!(store);

        let req = actix_web::test::TestRequest::get()
            .uri("/api/employees/EMP000404/")
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
