use crate::api::attendance::{
    AttendanceCapture, AttendanceListResponse, AttendanceQuery, AttendanceResponse,
};
use crate::api::face::EnrollFaces;
use crate::model::attendance::AttendanceRecord;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Face-verified attendance

Employees check in and out in front of a camera. Each capture is sent to the
face recognition service and only recorded when the recognized person is the
employee the attendance is claimed for.

### Key Features
- **Attendance**
  - Check-in / check-out with face verification, worked time and lateness
  - Paginated attendance history
- **Face enrollment**
  - Enroll employee photos and maintain the recognition index

### Security
Every endpoint requires a **JWT Bearer** access token.
Employees act for themselves; Admin, HR and kiosk accounts may record for any employee.
"#,
    ),
    paths(
        crate::api::attendance::record_attendance,
        crate::api::attendance::list_attendance,

        crate::api::face::enroll_face,
        crate::api::face::rebuild_index,
        crate::api::face::migrate_index
    ),
    components(
        schemas(
            AttendanceCapture,
            AttendanceResponse,
            AttendanceQuery,
            AttendanceListResponse,
            AttendanceRecord,
            EnrollFaces
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Face", description = "Face enrollment and index maintenance APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
