use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use clinic_core::ServiceError;

clinic_core::code_enum! {
    /// Appointment lifecycle.
    ///
    /// ```text
    /// SCHEDULED → CONFIRMED → ARRIVED → COMPLETED
    ///     ↘ CANCELLED / NO_SHOW (before arrival)
    /// ```
    pub enum AppointmentStatus {
        Scheduled => "SCHEDULED",
        Confirmed => "CONFIRMED",
        Arrived => "ARRIVED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        NoShow => "NO_SHOW",
    }
}

impl AppointmentStatus {
    /// Calendar colour.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Scheduled => "#3b82f6",
            Self::Confirmed => "#6366f1",
            Self::Arrived => "#f59e0b",
            Self::Completed => "#10b981",
            Self::Cancelled => "#9ca3af",
            Self::NoShow => "#ef4444",
        }
    }

    /// The customer came in.
    pub fn has_arrived(&self) -> bool {
        matches!(self, Self::Arrived | Self::Completed)
    }
}

/// Default slot length when neither the request nor the service says.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;
/// Longest bookable slot: one day.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// Reject durations outside `1..=MAX_DURATION_MINUTES`.
pub fn check_duration(minutes: i64) -> Result<(), ServiceError> {
    if (1..=MAX_DURATION_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "duration must be between 1 and {MAX_DURATION_MINUTES} minutes"
        )))
    }
}

/// End of a slot, or Validation when it falls outside the calendar.
pub fn slot_end(start: NaiveDateTime, minutes: i64) -> Result<NaiveDateTime, ServiceError> {
    check_duration(minutes)?;
    start
        .checked_add_signed(Duration::minutes(minutes))
        .ok_or_else(|| ServiceError::Validation(format!("appointment at {start} ends outside the calendar")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub created_by: String,
    /// Consultant or technician handling the visit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<NaiveDateTime>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Saturates at the calendar's end; stored appointments pass `slot_end`.
    pub fn ends_at(&self) -> NaiveDateTime {
        slot_end(self.scheduled_at, self.duration_minutes).unwrap_or(NaiveDateTime::MAX)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointment {
    pub customer_id: String,
    #[serde(default)]
    pub service_id: Option<String>,
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Filters for listing appointments. Dates are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Half-open window `[start, end)` for the calendar feed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CalendarWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// One event in the calendar feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: AppointmentStatus,
    pub color: &'static str,
    pub customer_id: String,
}
