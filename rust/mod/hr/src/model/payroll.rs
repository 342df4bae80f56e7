use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clinic_core::ServiceError;

clinic_core::code_enum! {
    pub enum SlipStatus {
        Draft => "DRAFT",
        Confirmed => "CONFIRMED",
        Paid => "PAID",
    }
}

/// A month's pay for one staff member. Amounts in VND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalarySlip {
    pub id: String,
    pub staff_id: String,
    /// `YYYY-MM`.
    pub month: String,
    pub contract_id: String,
    pub base_salary: i64,
    pub standard_days: i64,
    pub work_days: f64,
    pub late_count: i64,
    pub prorated_salary: i64,
    pub allowance: i64,
    /// Sales credited to the staff member in the month.
    pub revenue: i64,
    pub commission_rate_bp: i64,
    pub commission: i64,
    pub bonus: i64,
    pub late_penalty: i64,
    /// Manual deductions entered by HR.
    pub other_deduction: i64,
    /// `late_penalty + other_deduction`.
    pub deduction: i64,
    pub net_pay: i64,
    pub status: SlipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl SalarySlip {
    /// Recompute every derived amount from the inputs on the slip.
    ///
    /// `late_penalty_each` is charged per late day. Amounts that do not
    /// fit in an `i64` are rejected.
    pub fn compute(&mut self, late_penalty_each: i64) -> Result<(), ServiceError> {
        let overflow = || ServiceError::Validation(format!("salary amounts for {} overflow", self.staff_id));
        self.prorated_salary = if self.standard_days > 0 {
            (self.base_salary as f64 * self.work_days / self.standard_days as f64).round() as i64
        } else {
            0
        };
        self.commission = self
            .revenue
            .checked_mul(self.commission_rate_bp)
            .ok_or_else(overflow)?
            / 10_000;
        self.late_penalty = self.late_count.checked_mul(late_penalty_each).ok_or_else(overflow)?;
        self.deduction = self.late_penalty.checked_add(self.other_deduction).ok_or_else(overflow)?;
        let gross = [self.allowance, self.commission, self.bonus]
            .into_iter()
            .try_fold(self.prorated_salary, i64::checked_add)
            .ok_or_else(overflow)?;
        self.net_pay = gross.checked_sub(self.deduction).ok_or_else(overflow)?.max(0);
        Ok(())
    }
}

/// Manual changes to a draft slip.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustSlip {
    #[serde(default)]
    pub bonus: Option<i64>,
    #[serde(default)]
    pub other_deduction: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayroll {
    pub month: String,
    /// Only this staff member; everyone with a contract when absent.
    #[serde(default)]
    pub staff_id: Option<String>,
}

/// Outcome of a payroll run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRun {
    pub month: String,
    pub slips: Vec<SalarySlip>,
    /// Staff whose slip was already confirmed or paid.
    pub locked: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipQuery {
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub status: Option<SlipStatus>,
}

/// First and last day of a `YYYY-MM` month.
pub fn month_bounds(month: &str) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let invalid = || ServiceError::Validation(format!("month must be YYYY-MM, got '{month}'"));
    let (y, m) = month.split_once('-').ok_or_else(invalid)?;
    if y.len() != 4 || m.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let mon: u32 = m.parse().map_err(|_| invalid())?;
    let first = NaiveDate::from_ymd_opt(year, mon, 1).ok_or_else(invalid)?;
    let next = if mon == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, mon + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next.pred_opt().ok_or_else(invalid)?;
    Ok((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slip() -> SalarySlip {
        SalarySlip {
            id: "s".into(),
            staff_id: "u".into(),
            month: "2024-05".into(),
            contract_id: "c".into(),
            base_salary: 10_400_000,
            standard_days: 26,
            work_days: 0.0,
            late_count: 0,
            prorated_salary: 0,
            allowance: 500_000,
            revenue: 0,
            commission_rate_bp: 0,
            commission: 0,
            bonus: 0,
            late_penalty: 0,
            other_deduction: 0,
            deduction: 0,
            net_pay: 0,
            status: SlipStatus::Draft,
            note: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn prorates_and_adds_commission() {
        let mut s = slip();
        s.work_days = 20.5;
        s.late_count = 2;
        s.revenue = 30_000_000;
        s.commission_rate_bp = 250;
        s.bonus = 100_000;
        s.other_deduction = 40_000;
        s.compute(50_000).unwrap();

        assert_eq!(s.prorated_salary, 8_200_000);
        assert_eq!(s.commission, 750_000);
        assert_eq!(s.late_penalty, 100_000);
        assert_eq!(s.deduction, 140_000);
        assert_eq!(s.net_pay, 8_200_000 + 500_000 + 750_000 + 100_000 - 140_000);
    }

    #[test]
    fn net_pay_never_negative() {
        let mut s = slip();
        s.allowance = 0;
        s.other_deduction = 1_000_000;
        s.compute(0).unwrap();
        assert_eq!(s.net_pay, 0);
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let mut s = slip();
        s.revenue = i64::MAX / 2;
        s.commission_rate_bp = 500;
        assert!(matches!(s.compute(0), Err(ServiceError::Validation(_))));

        let mut s = slip();
        s.bonus = i64::MAX;
        assert!(matches!(s.compute(0), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn month_parsing() {
        let (first, last) = month_bounds("2024-02").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(month_bounds("2023-12").unwrap().1, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        for bad in ["2024-13", "2024-5", "May 2024", "2024"] {
            assert!(matches!(month_bounds(bad), Err(ServiceError::Validation(_))));
        }
    }
}
