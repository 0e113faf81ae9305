use crate::{
    error::ApiResult,
    report::{BreakdownRow, breakdown},
    store::Store,
};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    #[schema(example = 10)]
    pub total_employees: i64,
    #[schema(example = 3)]
    pub total_departments: usize,
    #[schema(example = 4)]
    pub total_designations: usize,
    pub departments: Vec<BreakdownRow>,
    pub designations: Vec<BreakdownRow>,
}

/// Department and designation distribution
#[utoipa::path(
    get,
    path = "/api/reports",
    responses(
        (status = 200, description = "Headcount breakdown", body = ReportResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reports"
)]
pub async fn get_report(store: web::Data<dyn Store>) -> ApiResult<HttpResponse> {
    let departments = store.department_counts().await?;
    let designations = store.designation_counts().await?;

    Ok(HttpResponse::Ok().json(ReportResponse {
        total_employees: departments.values().sum(),
        total_departments: departments.len(),
        total_designations: designations.len(),
        departments: breakdown(&departments),
        designations: breakdown(&designations),
    }))
}
