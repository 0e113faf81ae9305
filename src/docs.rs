use crate::api::attendance::{AttendanceResponse, MarkAttendance};
use crate::api::employee::{CreateEmployee, EmployeeDetail};
use crate::api::report::ReportResponse;
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::Employee;
use crate::report::{BreakdownRow, StatusSummary};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRMS API",
        version = "1.0.0",
        description = r#"
## Employee & Attendance Tracking

### 🔹 Key Features
- **Employees**
  - Create, list, filter and view employees; identifiers are issued as `EMP000001`, `EMP000002`, ...
- **Attendance**
  - One record per employee per day; marking the same day again updates it
  - Work hours derived from check-in and check-out
- **Reports**
  - Headcount by department and designation with percentages

### 📦 Response Format
- JSON bodies
- Errors are `{"error": "<message>"}` with 400 / 404 / 409 / 500

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,

        crate::api::attendance::list_attendance,
        crate::api::attendance::mark_attendance,

        crate::api::report::get_report
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            EmployeeDetail,
            Attendance,
            AttendanceStatus,
            AttendanceResponse,
            MarkAttendance,
            StatusSummary,
            BreakdownRow,
            ReportResponse
        )
    ),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Reports", description = "Headcount reporting APIs"),
    )
)]
pub struct ApiDoc;
