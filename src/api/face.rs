use crate::attendance::{EmployeeDirectory, MySqlEmployeeDirectory};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::face::FaceClient;
use crate::utils::image_capture::decode_data_uri;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct EnrollFaces {
    /// One or more face photos as data URIs.
    #[schema(example = json!(["data:image/jpeg;base64,/9j/4AAQSkZJRg=="]))]
    pub images: Vec<String>,
}

/// Enroll an employee's face
#[utoipa::path(
    post,
    path = "/api/employee/{employee_id}/face",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = EnrollFaces,
    responses(
        (status = 200, description = "Face enrolled", body = Object, example = json!({
            "message": "Face enrolled successfully",
            "employee_code": "EMP-007",
            "index_rebuilt": true
        })),
        (status = 400, description = "No images, or an image could not be decoded"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found"),
        (status = 502, description = "Face service rejected the enrollment")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Face"
)]
pub async fn enroll_face(
    auth: AuthUser,
    path: web::Path<u64>,
    payload: web::Json<EnrollFaces>,
    face: web::Data<FaceClient>,
    directory: web::Data<MySqlEmployeeDirectory>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    if payload.images.is_empty() {
        return Err(AppError::InvalidAction(
            "at least one face image is required".to_string(),
        ));
    }
    let images = payload
        .images
        .iter()
        .map(|image| decode_data_uri(image))
        .collect::<Result<Vec<_>, _>>()?;

    let employee = directory
        .identity(employee_id)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))?;

    let enrollment = face
        .enroll(&employee.employee_code, &images)
        .await
        .map_err(AppError::FaceService)?;
    info!(
        employee_id,
        employee_code = %employee.employee_code,
        images = images.len(),
        "Face enrolled"
    );

    // enrollment already succeeded; a stale index only delays recognition
    let index_rebuilt = match face.rebuild_index().await {
        Ok(_) => true,
        Err(e) => {
            warn!(employee_id, error = %e, "Index rebuild after enrollment failed");
            false
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": "Face enrolled successfully",
        "employee_code": employee.employee_code,
        "enrollment": enrollment,
        "index_rebuilt": index_rebuilt,
    })))
}

/// Rebuild the face recognition index
#[utoipa::path(
    post,
    path = "/api/face/rebuild",
    responses(
        (status = 200, description = "Rebuild triggered", body = Object),
        (status = 403, description = "Admin only"),
        (status = 502, description = "Face service error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Face"
)]
pub async fn rebuild_index(
    auth: AuthUser,
    face: web::Data<FaceClient>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let result = face.rebuild_index().await.map_err(AppError::FaceService)?;
    info!(user_id = auth.user_id, "Face index rebuild triggered");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Index rebuild triggered",
        "result": result,
    })))
}

/// Migrate the face recognition index
#[utoipa::path(
    post,
    path = "/api/face/migrate",
    responses(
        (status = 200, description = "Migration triggered", body = Object),
        (status = 403, description = "Admin only"),
        (status = 502, description = "Face service error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Face"
)]
pub async fn migrate_index(
    auth: AuthUser,
    face: web::Data<FaceClient>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let result = face.reindex().await.map_err(AppError::FaceService)?;
    info!(user_id = auth.user_id, "Face index migration triggered");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Index migration triggered",
        "result": result,
    })))
}
