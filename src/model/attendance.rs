use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::ShiftConfig;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "employee_id": 7,
        "date": "2026-03-02",
        "check_in": "2026-03-02T09:04:11",
        "check_out": "2026-03-02T17:31:40",
        "worked_seconds": 30449,
        "late": true
    })
)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    /// check_out minus check_in, whenever both are set.
    #[schema(nullable = true)]
    pub worked_seconds: Option<i64>,
    pub late: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
}

impl FromStr for AttendanceAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check-in" | "check_in" | "checkin" => Ok(AttendanceAction::CheckIn),
            "check-out" | "check_out" | "checkout" => Ok(AttendanceAction::CheckOut),
            other => Err(AppError::InvalidAction(format!(
                "unsupported attendance action {other:?}"
            ))),
        }
    }
}

impl fmt::Display for AttendanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceAction::CheckIn => f.write_str("check-in"),
            AttendanceAction::CheckOut => f.write_str("check-out"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttendanceState {
    NotStarted,
    InProgress,
    Completed,
}

/// What a successful attendance action did to the day's record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transition {
    CheckedIn,
    /// A check-in already exists; the first one wins.
    AlreadyCheckedIn,
    CheckedOut,
    /// An earlier check-out was overwritten.
    CheckOutCorrected,
}

impl Transition {
    pub fn changed(self) -> bool {
        !matches!(self, Transition::AlreadyCheckedIn)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::CheckedIn => "checked_in",
            Transition::AlreadyCheckedIn => "no_change",
            Transition::CheckedOut => "checked_out",
            Transition::CheckOutCorrected => "check_out_corrected",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Transition::CheckedIn => "Checked in successfully",
            Transition::AlreadyCheckedIn => "Already checked in today, no change applied",
            Transition::CheckedOut => "Checked out successfully",
            Transition::CheckOutCorrected => "Check-out updated",
        }
    }
}

impl AttendanceRecord {
    /// Blank record for a day with no attendance yet.
    pub fn new(employee_id: u64, date: NaiveDate) -> Self {
        Self {
            id: 0,
            employee_id,
            date,
            check_in: None,
            check_out: None,
            worked_seconds: None,
            late: false,
        }
    }

    pub fn state(&self) -> AttendanceState {
        match (self.check_in, self.check_out) {
            (None, _) => AttendanceState::NotStarted,
            (Some(_), None) => AttendanceState::InProgress,
            (Some(_), Some(_)) => AttendanceState::Completed,
        }
    }

    /// Applies a verified action at time `at`.
    ///
    /// On error the record is left untouched.
    pub fn apply(
        &mut self,
        action: AttendanceAction,
        at: NaiveDateTime,
        shift: &ShiftConfig,
    ) -> Result<Transition, AppError> {
        match action {
            AttendanceAction::CheckIn => {
                if self.check_in.is_some() {
                    return Ok(Transition::AlreadyCheckedIn);
                }
                self.check_in = Some(at);
                self.late = shift.is_late(at.time());
                Ok(Transition::CheckedIn)
            }
            AttendanceAction::CheckOut => {
                let check_in = self.check_in.ok_or(AppError::NoCheckIn)?;
                if at < check_in {
                    return Err(AppError::CheckOutBeforeCheckIn);
                }

                let corrected = self.check_out.is_some();
                self.check_out = Some(at);
                self.worked_seconds = Some((at - check_in).num_seconds());

                Ok(if corrected {
                    Transition::CheckOutCorrected
                } else {
                    Transition::CheckedOut
                })
            }
        }
    }
}
