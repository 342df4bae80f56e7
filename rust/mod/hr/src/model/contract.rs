use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

clinic_core::code_enum! {
    pub enum ContractType {
        Probation => "PROBATION",
        FixedTerm => "FIXED_TERM",
        Indefinite => "INDEFINITE",
        PartTime => "PART_TIME",
        Collaborator => "COLLABORATOR",
    }
}

/// Employment terms for one staff member. At most one is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeContract {
    pub id: String,
    pub staff_id: String,
    pub contract_type: ContractType,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Monthly base salary, VND.
    pub base_salary: i64,
    /// Fixed monthly allowance, VND.
    #[serde(default)]
    pub allowance: i64,
    /// Sales commission in basis points (1% = 100).
    #[serde(default)]
    pub commission_rate_bp: i64,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl EmployeeContract {
    /// Whether the contract covers any day of `[from, to]`.
    pub fn covers(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.start_date <= to && self.end_date.map_or(true, |end| end >= from)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContract {
    pub staff_id: String,
    pub contract_type: ContractType,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub base_salary: i64,
    #[serde(default)]
    pub allowance: i64,
    #[serde(default)]
    pub commission_rate_bp: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractQuery {
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_open_and_closed_ranges() {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let mut c = EmployeeContract {
            id: "c".into(),
            staff_id: "s".into(),
            contract_type: ContractType::FixedTerm,
            start_date: d(3, 15),
            end_date: None,
            base_salary: 0,
            allowance: 0,
            commission_rate_bp: 0,
            active: true,
            note: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!(c.covers(d(3, 1), d(3, 31)));
        assert!(!c.covers(d(2, 1), d(2, 29)));
        c.end_date = Some(d(4, 10));
        assert!(c.covers(d(4, 1), d(4, 30)));
        assert!(!c.covers(d(5, 1), d(5, 31)));
    }
}
