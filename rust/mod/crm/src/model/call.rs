use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

clinic_core::code_enum! {
    /// Result of an outbound call.
    pub enum CallOutcome {
        Answered => "ANSWERED",
        NoAnswer => "NO_ANSWER",
        Busy => "BUSY",
        WrongNumber => "WRONG_NUMBER",
        Callback => "CALLBACK",
        NotInterested => "NOT_INTERESTED",
        Booked => "BOOKED",
    }
}

/// One telesale call to a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    pub id: String,
    pub customer_id: String,
    pub staff_id: String,
    pub called_at: NaiveDateTime,
    pub outcome: CallOutcome,
    #[serde(default)]
    pub duration_secs: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the customer asked to be called again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_at: Option<NaiveDateTime>,
    pub created_at: String,
}

/// Input for logging a call. `called_at` defaults to now.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCall {
    pub customer_id: String,
    pub outcome: CallOutcome,
    #[serde(default)]
    pub called_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_secs: i64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub callback_at: Option<NaiveDateTime>,
}

/// Filters for listing call logs. Dates are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallQuery {
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Inclusive date range used by reports.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Per-telesale activity over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelesaleStats {
    pub staff_id: String,
    pub calls: i64,
    pub answered: i64,
    /// Appointments this staff member created in the range.
    pub booked: i64,
    /// Of those, how many customers actually showed up.
    pub arrivals: i64,
    /// `arrivals / calls`, 0 when there were no calls.
    pub conversion_rate: f64,
}
