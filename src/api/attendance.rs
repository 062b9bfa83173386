use crate::attendance::{
    AttendanceFilter, AttendanceRequest, MySqlAttendanceStore, MySqlEmployeeDirectory, Reconciler,
};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::face::FaceClient;
use crate::model::attendance::{AttendanceAction, AttendanceRecord};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct AttendanceCapture {
    /// Captured frame as a data URI.
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQSkZJRg==")]
    pub image: Option<String>,

    /// Only needed when an admin, HR or a kiosk records for someone else.
    #[schema(example = 7, nullable = true)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    #[schema(example = "checked_in")]
    pub status: String,
    #[schema(example = "Checked in successfully")]
    pub message: String,
    #[schema(example = "EMP-007")]
    pub recognized: String,
    #[schema(example = 0.93, nullable = true)]
    pub confidence: Option<f64>,
    pub record: AttendanceRecord,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,
    #[schema(example = 20)]
    pub per_page: Option<u32>,
    #[schema(example = 7)]
    pub employee_id: Option<u64>,
    #[schema(example = "2026-03-01", value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-03-31", value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Check in or check out with a captured face image
#[utoipa::path(
    post,
    path = "/api/attendance/{action}",
    params(
        ("action" = String, Path, description = "check-in or check-out")
    ),
    request_body = AttendanceCapture,
    responses(
        (status = 200, description = "Attendance recorded, or no change needed", body = AttendanceResponse),
        (status = 400, description = "Unknown action, missing or undecodable image", body = Object, example = json!({
            "error": "invalid_image",
            "message": "captured image could not be decoded: captured image is empty"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "No check-in found for today", body = Object, example = json!({
            "error": "no_check_in",
            "message": "No check-in found for today"
        })),
        (status = 422, description = "Face could not be verified, retry the capture", body = Object, example = json!({
            "error": "face_mismatch",
            "message": "Face does not match, please try again"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<AttendanceCapture>,
    face: web::Data<FaceClient>,
    store: web::Data<MySqlAttendanceStore>,
    directory: web::Data<MySqlEmployeeDirectory>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let action: AttendanceAction = path.into_inner().parse()?;
    let payload = payload.into_inner();
    let employee_id = auth.acting_employee(payload.employee_id)?;

    let image = payload
        .image
        .filter(|image| !image.trim().is_empty())
        .ok_or_else(|| AppError::InvalidAction("image is required".to_string()))?;

    let request = AttendanceRequest {
        employee_id,
        action,
        image,
    };
    let reconciler = Reconciler {
        recognizer: face.get_ref(),
        store: store.get_ref(),
        directory: directory.get_ref(),
        shift: config.shift,
    };

    let span = tracing::info_span!(
        "attendance",
        request_id = %Uuid::new_v4(),
        employee_id,
        %action,
        user_id = auth.user_id,
        username = %auth.username
    );
    let outcome = reconciler
        .reconcile(&request, Local::now().naive_local())
        .instrument(span)
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse {
        status: outcome.transition.as_str().to_string(),
        message: outcome.transition.message().to_string(),
        recognized: outcome.recognized,
        confidence: outcome.confidence,
        record: outcome.record,
    }))
}

/// List attendance records
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    store: web::Data<MySqlAttendanceStore>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    // everyone but HR and admins only ever sees their own days
    let employee_id = if auth.is_hr_or_admin() {
        query.employee_id
    } else {
        let own = auth
            .employee_id
            .ok_or(AppError::Forbidden("No employee profile"))?;
        if query.employee_id.is_some_and(|id| id != own) {
            return Err(AppError::Forbidden(
                "Cannot view another employee's attendance",
            ));
        }
        Some(own)
    };

    let filter = AttendanceFilter {
        employee_id,
        from: query.from,
        to: query.to,
    };
    let (data, total) = store.list(&filter, page, per_page).await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page,
        per_page,
        total,
    }))
}
