//! Face-verified check-in / check-out.
//!
//! A request goes through, in order: image decoding, employee lookup,
//! identification, identity matching and finally the day's record update.
//! Every step before the update rejects without touching attendance state.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use super::directory::EmployeeDirectory;
use super::store::AttendanceStore;
use crate::config::ShiftConfig;
use crate::error::AppError;
use crate::face::{FaceRecognizer, IdentifyResult};
use crate::model::attendance::{AttendanceAction, AttendanceRecord, Transition};
use crate::utils::image_capture::decode_data_uri;

#[derive(Debug, Clone)]
pub struct AttendanceRequest {
    pub employee_id: u64,
    pub action: AttendanceAction,
    /// Captured frame as a data URI.
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct Reconciled {
    pub record: AttendanceRecord,
    pub transition: Transition,
    pub recognized: String,
    pub confidence: Option<f64>,
}

pub struct Reconciler<'a, R, S, D> {
    pub recognizer: &'a R,
    pub store: &'a S,
    pub directory: &'a D,
    pub shift: ShiftConfig,
}

impl<R, S, D> Reconciler<'_, R, S, D>
where
    R: FaceRecognizer,
    S: AttendanceStore,
    D: EmployeeDirectory,
{
    pub async fn reconcile(
        &self,
        request: &AttendanceRequest,
        now: NaiveDateTime,
    ) -> Result<Reconciled, AppError> {
        let employee_id = request.employee_id;
        let image = decode_data_uri(&request.image)?;

        let employee = self
            .directory
            .identity(employee_id)
            .await?
            .ok_or(AppError::EmployeeNotFound(employee_id))?;

        let response = self.recognizer.identify(&image).await.map_err(|e| {
            warn!(employee_id, action = %request.action, error = %e, "Face verification failed");
            AppError::VerificationFailed(e)
        })?;

        let identified = IdentifyResult::from(&response);
        let recognized = match identified.best_guess() {
            Some(name) if employee.matches(name) => name.to_string(),
            other => {
                info!(employee_id, recognized = ?other, "Face does not match employee");
                return Err(AppError::VerificationMismatch {
                    employee_id,
                    recognized: other.map(str::to_string),
                });
            }
        };

        let (record, transition) = self
            .store
            .reconcile(employee.id, now.date(), |record| {
                record.apply(request.action, now, &self.shift)
            })
            .await?;

        info!(
            employee_id,
            action = %request.action,
            transition = ?transition,
            state = ?record.state(),
            late = record.late,
            "Attendance reconciled"
        );

        Ok(Reconciled {
            record,
            transition,
            recognized,
            confidence: identified.confidence(),
        })
    }
}
