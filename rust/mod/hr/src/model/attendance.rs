use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

clinic_core::code_enum! {
    pub enum AttendanceStatus {
        Present => "PRESENT",
        Late => "LATE",
        HalfDay => "HALF_DAY",
        Absent => "ABSENT",
        Leave => "LEAVE",
    }
}

/// One staff member's day. Unique per (staff, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: String,
    pub staff_id: String,
    pub work_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// HR entry of a day's status, e.g. leave or absence.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    pub staff_id: String,
    pub work_date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Day counts per status over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceCounts {
    pub present: i64,
    pub late: i64,
    pub half_day: i64,
    pub absent: i64,
    pub leave: i64,
}

impl AttendanceCounts {
    pub fn add(&mut self, status: AttendanceStatus, n: i64) {
        match status {
            AttendanceStatus::Present => self.present += n,
            AttendanceStatus::Late => self.late += n,
            AttendanceStatus::HalfDay => self.half_day += n,
            AttendanceStatus::Absent => self.absent += n,
            AttendanceStatus::Leave => self.leave += n,
        }
    }

    /// Paid working days: half days count half.
    pub fn work_days(&self) -> f64 {
        (self.present + self.late) as f64 + 0.5 * self.half_day as f64
    }
}
