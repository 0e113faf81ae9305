use crate::{
    error::ApiResult,
    model::attendance::{Attendance, AttendanceFields, AttendanceFilter, AttendanceStatus},
    model::employee::EmployeeKey,
    store::Store,
    utils::validation::{
        FieldError, TEXT_MAX, max_len, optional, parse_optional_date, parse_optional_time,
        required,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

/// Attendance record as returned by the API, with derived work hours.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceResponse {
    #[serde(flatten)]
    pub record: Attendance,
    #[schema(example = 9.0)]
    pub work_hours: Option<f64>,
}

impl From<Attendance> for AttendanceResponse {
    fn from(record: Attendance) -> Self {
        let work_hours = record.work_hours();
        Self { record, work_hours }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Public id (EMP000001) or internal numeric id
    pub employee_id: Option<String>,
    /// Exact date, YYYY-MM-DD
    pub date: Option<String>,
    /// Inclusive lower bound, YYYY-MM-DD
    pub start_date: Option<String>,
    /// Inclusive upper bound, YYYY-MM-DD
    pub end_date: Option<String>,
}

impl AttendanceQuery {
    pub fn into_filter(self) -> Result<AttendanceFilter, FieldError> {
        Ok(AttendanceFilter {
            employee: optional(self.employee_id).map(|raw| EmployeeKey::parse(&raw)),
            date: parse_optional_date("date", self.date)?,
            start_date: parse_optional_date("start_date", self.start_date)?,
            end_date: parse_optional_date("end_date", self.end_date)?,
            limit: None,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = "EMP000001", value_type = String)]
    pub employee_id: Option<String>,
    #[schema(example = "2024-01-15", format = "date")]
    pub date: Option<String>,
    #[schema(example = "09:00:00")]
    pub in_time: Option<String>,
    #[schema(example = "18:00:00")]
    pub out_time: Option<String>,
    #[schema(example = "Present")]
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl MarkAttendance {
    /// Resolve the payload into the store's upsert arguments. A missing
    /// date means `today`.
    pub fn validate(
        self,
        today: NaiveDate,
    ) -> Result<(EmployeeKey, NaiveDate, AttendanceFields), FieldError> {
        let employee = EmployeeKey::parse(&required("employee_id", self.employee_id)?);
        let date = parse_optional_date("date", self.date)?.unwrap_or(today);
        let in_time = parse_optional_time("in_time", self.in_time)?;
        let out_time = parse_optional_time("out_time", self.out_time)?;

        let status = match optional(self.status) {
            Some(raw) => match raw.parse::<AttendanceStatus>() {
                Ok(status) => Some(status),
                Err(_) => return Err(FieldError::InvalidStatus(raw)),
            },
            None => None,
        };

        Ok((
            employee,
            date,
            AttendanceFields {
                in_time,
                out_time,
                status,
                notes: optional(self.notes)
                    .map(|notes| max_len("notes", notes, TEXT_MAX))
                    .transpose()?,
            },
        ))
    }
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance records, latest first", body = [AttendanceResponse]),
        (status = 400, description = "Malformed date", body = Object, example = json!({
            "error": "Invalid start_date format. Use YYYY-MM-DD"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    store: web::Data<dyn Store>,
    query: web::Query<AttendanceQuery>,
) -> ApiResult<HttpResponse> {
    let filter = query.into_inner().into_filter()?;
    let records = store.list_attendance(&filter).await?;

    let body: Vec<AttendanceResponse> = records.into_iter().map(AttendanceResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Mark attendance (create or update the record for that day)
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance created", body = AttendanceResponse),
        (status = 200, description = "Existing record for the day updated", body = AttendanceResponse),
        (status = 400, description = "Malformed input", body = Object, example = json!({
            "error": "Invalid in_time format. Use HH:MM:SS or HH:MM"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found: EMP000001"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    store: web::Data<dyn Store>,
    payload: web::Json<MarkAttendance>,
) -> ApiResult<HttpResponse> {
    let (employee, date, fields) = payload.into_inner().validate(Local::now().date_naive())?;
    let upserted = store.upsert_attendance(&employee, date, fields).await?;

    info!(
        employee_id = %upserted.attendance.employee_id,
        %date,
        created = upserted.created,
        "Attendance marked"
    );

    let body = AttendanceResponse::from(upserted.attendance);
    if upserted.created {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::NewEmployee;
    use crate::store::EmployeeStore;
    use crate::store::memory::MemoryStore;
    use actix_web::http::StatusCode;
    use chrono::NaiveTime;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn mark(value: Value) -> MarkAttendance {
        serde_json::from_value(value).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn date_defaults_to_today_and_blank_times_are_absent() {
        let (key, date, fields) = mark(json!({
            "employee_id": "EMP000001",
            "in_time": "09:15",
            "out_time": ""
        }))
        .validate(today())
        .unwrap();
        assert_eq!(key, EmployeeKey::Code("EMP000001".into()));
        assert_eq!(date, today());
        assert_eq!(fields.in_time, NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(fields.out_time, None);
        assert_eq!(fields.status, None);
    }

    #[test]
    fn rejects_unknown_status_and_bad_time() {
        assert_eq!(
            mark(json!({ "employee_id": "EMP000001", "status": "Sick" })).validate(today()),
            Err(FieldError::InvalidStatus("Sick".into()))
        );
        assert_eq!(
            mark(json!({ "employee_id": "EMP000001", "out_time": "6pm" })).validate(today()),
            Err(FieldError::InvalidTime("out_time"))
        );
        assert_eq!(
            mark(json!({ "date": "2024-01-15" })).validate(today()),
            Err(FieldError::Missing("employee_id"))
        );
        assert_eq!(
            mark(json!({ "employee_id": "EMP000001", "notes": "n".repeat(TEXT_MAX + 1) }))
                .validate(today()),
            Err(FieldError::TooLong("notes", TEXT_MAX))
        );
    }

    async fn seeded() -> (Arc<dyn Store>, String) {
        let store = MemoryStore::new();
        let employee = store
            .create_employee(NewEmployee {
                name: "John Doe".into(),
                email: "john@example.com".into(),
                phone: "+8801712345678".into(),
                address: "12 Lake Road".into(),
                designation: "Developer".into(),
                department: "IT".into(),
                date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            })
            .await
            .unwrap();
        (Arc::new(store), employee.employee_id)
    }

    #[actix_web::test]
    async fn second_mark_for_same_day_updates_single_record() {
        let (store, id) = seeded().await;
        let app = crate::api::test_app!(store);

        let req = actix_web::test::TestRequest::post()
            .uri("/api/attendance/")
            .set_json(json!({
                "employee_id": id,
                "date": "2024-01-15",
                "in_time": "09:00:00",
                "status": "Present"
            }))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let first: Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(first["work_hours"], Value::Null);

        let req = actix_web::test::TestRequest::post()
            .uri("/api/attendance/")
            .set_json(json!({
                "employee_id": id,
                "date": "2024-01-15",
                "out_time": "18:00",
                "status": "Half Day",
                "notes": "doctor visit"
            }))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let second: Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(second["id"], first["id"]);

        let req = actix_web::test::TestRequest::get()
            .uri(&format!("/api/attendance/?employee_id={id}&date=2024-01-15"))
            .to_request();
        let records: Vec<Value> = actix_web::test::call_and_read_body_json(&app, req).await;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["employee_id"], json!(id));
        assert_eq!(record["employee_name"], "John Doe");
        assert_eq!(record["in_time"], "09:00:00");
        assert_eq!(record["out_time"], "18:00:00");
        assert_eq!(record["status"], "Half Day");
        assert_eq!(record["notes"], "doctor visit");
        assert_eq!(record["work_hours"], json!(9.0));
    }

    #[actix_web::test]
    async fn employee_detail_lists_recent_attendance() {
        let (store, id) = seeded().await;
        let app = crate::api::test_app!(store);

        for (date, status) in [("2024-01-15", "Present"), ("2024-01-16", "Leave")] {
            let req = actix_web::test::TestRequest::post()
                .uri("/api/attendance/")
                .set_json(json!({ "employee_id": id, "date": date, "status": status }))
                .to_request();
            assert_eq!(actix_web::test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = actix_web::test::TestRequest::get()
            .uri(&format!("/api/employees/{id}/"))
            .to_request();
        let detail: Value = actix_web::test::call_and_read_body_json(&app, req).await;
        let attendances = detail["attendances"].as_array().unwrap();
        assert_eq!(attendances.len(), 2);
        assert_eq!(attendances[0]["date"], "2024-01-16");
        assert_eq!(detail["summary"]["total_present"], json!(1));
        assert_eq!(detail["summary"]["total_leave"], json!(1));
    }

    #[actix_web::test]
    async fn list_rejects_malformed_dates_and_unknown_employee() {
        let (store, _) = seeded().await;
        let app = crate::api::test_app!(store);

        let req = actix_web::test::TestRequest::get()
            .uri("/api/attendance/?start_date=2024/01/01")
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(err["error"], "Invalid start_date format. Use YYYY-MM-DD");

        let req = actix_web::test::TestRequest::get()
            .uri("/api/attendance/?employee_id=EMP000404")
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn list_applies_date_range() {
        let (store, id) = seeded().await;
        let app = crate::api::test_app!(store);

        for date in ["2024-01-10", "2024-01-15", "2024-01-20"] {
            let req = actix_web::test::TestRequest::post()
                .uri("/api/attendance/")
                .set_json(json!({ "employee_id": id, "date": date }))
                .to_request();
            assert_eq!(actix_web::test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = actix_web::test::TestRequest::get()
            .uri("/api/attendance/?start_date=2024-01-12&end_date=2024-01-20")
            .to_request();
        let records: Vec<Value> = actix_web::test::call_and_read_body_json(&app, req).await;
        let dates: Vec<&str> = records.iter().map(|r| r["date"].as_str().unwrap()).collect();
        assert_eq!(dates, ["2024-01-20", "2024-01-15"]);
        assert!(records.iter().all(|r| r["status"] == "Present"));
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = crate::api::test_app!(store);

        let req = actix_web::test::TestRequest::post()
            .uri("/api/attendance/")
            .set_json(json!({
                "employee_id": "EMP000001",
                "date": "2024-01-15",
                "in_time": "09:00:00",
                "out_time": "18:00:00",
                "status": "Present"
            }))
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let err: Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(err, json!({ "error": "Employee not found: EMP000001" }));
    }
}
