use tracing::info;

use clinic_core::{new_id, now_rfc3339, transaction, Filter, Principal, Role, ServiceError};
use clinic_sql::{Executor, Value};

use crate::model::{
    month_bounds, AdjustSlip, EmployeeContract, GeneratePayroll, PayrollRun, SalarySlip, SlipQuery, SlipStatus,
};
use crate::service::attendance::count_days;
use crate::service::{HrService, CONTRACTS, SLIPS};

fn indexes(s: &SalarySlip) -> Vec<(&'static str, Value)> {
    vec![
        ("staff_id", Value::from(s.staff_id.as_str())),
        ("month", Value::from(s.month.as_str())),
        ("status", Value::from(s.status.as_str())),
        ("updated_at", Value::from(s.updated_at.as_str())),
    ]
}

fn find_slip<E: Executor + ?Sized>(db: &E, staff_id: &str, month: &str) -> Result<Option<SalarySlip>, ServiceError> {
    let found: Vec<SalarySlip> = SLIPS.select(
        db,
        &Filter::new().eq("staff_id", staff_id).eq("month", month),
        "id",
    )?;
    Ok(found.into_iter().next())
}

impl HrService {
    /// Generate draft slips for a month from contracts, attendance and sales.
    ///
    /// Existing drafts are recomputed, keeping their bonus, manual
    /// deductions and note. Confirmed or paid slips are left alone: for a
    /// single staff member that is a conflict, for a full run the staff id
    /// is reported in `locked`.
    pub fn run_payroll(&self, caller: &Principal, input: GeneratePayroll) -> Result<PayrollRun, ServiceError> {
        caller.require(&[Role::Hr])?;
        let month = input.month.trim().to_string();
        let (from, to) = month_bounds(&month)?;

        let filter = Filter::new()
            .eq("active", true)
            .eq_opt("staff_id", input.staff_id.clone());
        let contracts: Vec<EmployeeContract> = CONTRACTS
            .select::<_, EmployeeContract>(self.sql.as_ref(), &filter, "staff_id")?
            .into_iter()
            .filter(|c| c.covers(from, to))
            .collect();
        if let (Some(staff_id), true) = (&input.staff_id, contracts.is_empty()) {
            return Err(ServiceError::NotFound(format!(
                "staff '{staff_id}' has no contract covering {month}"
            )));
        }

        // The ledger reads the same store; query it before the transaction.
        let revenues = contracts
            .iter()
            .map(|c| self.ledger.revenue_for_staff(&c.staff_id, from, to))
            .collect::<Result<Vec<i64>, _>>()?;

        let run = transaction(self.sql.as_ref(), |tx| {
            let mut run = PayrollRun {
                month: month.clone(),
                ..Default::default()
            };
            for (contract, revenue) in contracts.iter().zip(revenues) {
                let existing = find_slip(tx, &contract.staff_id, &month)?;
                if let Some(slip) = existing.as_ref().filter(|s| s.status != SlipStatus::Draft) {
                    if input.staff_id.is_some() {
                        return Err(ServiceError::Conflict(format!(
                            "{month} slip for '{}' is already {}",
                            slip.staff_id, slip.status
                        )));
                    }
                    run.locked.push(slip.staff_id.clone());
                    continue;
                }

                let counts = count_days(tx, &contract.staff_id, from, to)?;
                let now = now_rfc3339();
                let mut slip = SalarySlip {
                    id: existing.as_ref().map_or_else(new_id, |s| s.id.clone()),
                    staff_id: contract.staff_id.clone(),
                    month: month.clone(),
                    contract_id: contract.id.clone(),
                    base_salary: contract.base_salary,
                    standard_days: self.config.standard_days,
                    work_days: counts.work_days(),
                    late_count: counts.late,
                    prorated_salary: 0,
                    allowance: contract.allowance,
                    revenue,
                    commission_rate_bp: contract.commission_rate_bp,
                    commission: 0,
                    bonus: existing.as_ref().map_or(0, |s| s.bonus),
                    late_penalty: 0,
                    other_deduction: existing.as_ref().map_or(0, |s| s.other_deduction),
                    deduction: 0,
                    net_pay: 0,
                    status: SlipStatus::Draft,
                    note: existing.as_ref().and_then(|s| s.note.clone()),
                    created_at: existing.as_ref().map_or_else(|| now.clone(), |s| s.created_at.clone()),
                    updated_at: now,
                };
                slip.compute(self.config.late_penalty)?;

                if existing.is_some() {
                    SLIPS.update(tx, &slip.id, &slip, &indexes(&slip))?;
                } else {
                    SLIPS.insert(tx, &slip.id, &slip, &indexes(&slip))?;
                }
                run.slips.push(slip);
            }
            Ok(run)
        })?;

        info!(
            month = %run.month,
            slips = run.slips.len(),
            locked = run.locked.len(),
            by = %caller.staff_id,
            "payroll run"
        );
        Ok(run)
    }

    /// Set bonus, manual deduction or note on a draft slip.
    pub fn adjust_slip(&self, caller: &Principal, id: &str, input: AdjustSlip) -> Result<SalarySlip, ServiceError> {
        caller.require(&[Role::Hr])?;
        if input.bonus.is_some_and(|b| b < 0) || input.other_deduction.is_some_and(|d| d < 0) {
            return Err(ServiceError::Validation("bonus and deduction cannot be negative".into()));
        }
        let mut slip: SalarySlip = SLIPS.get(self.sql.as_ref(), id)?;
        if slip.status != SlipStatus::Draft {
            return Err(ServiceError::Conflict(format!("a {} slip can no longer be changed", slip.status)));
        }
        if let Some(bonus) = input.bonus {
            slip.bonus = bonus;
        }
        if let Some(deduction) = input.other_deduction {
            slip.other_deduction = deduction;
        }
        if input.note.is_some() {
            slip.note = input.note;
        }
        slip.compute(self.config.late_penalty)?;
        slip.updated_at = now_rfc3339();
        SLIPS.update(self.sql.as_ref(), id, &slip, &indexes(&slip))?;
        Ok(slip)
    }

    /// Lock a draft slip for payment.
    pub fn confirm_slip(&self, caller: &Principal, id: &str) -> Result<SalarySlip, ServiceError> {
        caller.require(&[Role::Hr])?;
        self.move_slip(caller, id, SlipStatus::Draft, SlipStatus::Confirmed)
    }

    /// Record that a confirmed slip was paid out.
    pub fn pay_slip(&self, caller: &Principal, id: &str) -> Result<SalarySlip, ServiceError> {
        caller.require(&[Role::Hr, Role::Accountant])?;
        self.move_slip(caller, id, SlipStatus::Confirmed, SlipStatus::Paid)
    }

    fn move_slip(
        &self,
        caller: &Principal,
        id: &str,
        from: SlipStatus,
        to: SlipStatus,
    ) -> Result<SalarySlip, ServiceError> {
        let mut slip: SalarySlip = SLIPS.get(self.sql.as_ref(), id)?;
        if slip.status != from {
            return Err(ServiceError::Validation(format!(
                "cannot move a {} slip to {to}",
                slip.status
            )));
        }
        slip.status = to;
        slip.updated_at = now_rfc3339();
        SLIPS.update(self.sql.as_ref(), id, &slip, &indexes(&slip))?;
        info!(slip = %id, staff = %slip.staff_id, month = %slip.month, status = %to, by = %caller.staff_id, "salary slip updated");
        Ok(slip)
    }

    pub fn get_slip(&self, caller: &Principal, id: &str) -> Result<SalarySlip, ServiceError> {
        let slip: SalarySlip = SLIPS.get(self.sql.as_ref(), id)?;
        if slip.staff_id != caller.staff_id {
            caller.require(&[Role::Hr, Role::Accountant])?;
        }
        Ok(slip)
    }

    /// HR and accounting list all slips; staff list their own.
    pub fn list_slips(&self, caller: &Principal, query: &SlipQuery) -> Result<Vec<SalarySlip>, ServiceError> {
        let staff_id = if caller.require(&[Role::Hr, Role::Accountant]).is_ok() {
            query.staff_id.clone()
        } else {
            Some(caller.staff_id.clone())
        };
        let filter = Filter::new()
            .eq_opt("staff_id", staff_id)
            .eq_opt("month", query.month.clone())
            .eq_opt("status", query.status.map(|s| s.as_str()));
        SLIPS.select(self.sql.as_ref(), &filter, "month DESC, staff_id")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::model::{AttendanceStatus, ContractType, CreateContract, MarkAttendance};
    use crate::service::testing::{day, hr, service, who};

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        day(5, d).and_hms_opt(h, m, 0).unwrap()
    }

    fn contract(svc: &HrService, staff: &str, base: i64, bp: i64) {
        svc.create_contract(
            &hr(),
            CreateContract {
                staff_id: staff.into(),
                contract_type: ContractType::Indefinite,
                start_date: day(1, 1),
                end_date: None,
                base_salary: base,
                allowance: 1_000_000,
                commission_rate_bp: bp,
                note: None,
            },
        )
        .unwrap();
    }

    fn may() -> GeneratePayroll {
        GeneratePayroll { month: "2024-05".into(), staff_id: None }
    }

    #[test]
    fn payroll_arithmetic() {
        let (svc, ledger) = service();
        contract(&svc, "s1", 13_000_000, 200);
        ledger.set("s1", 40_000_000);

        let me = who("s1", Role::Telesale);
        svc.check_in_at(&me, at(2, 7, 55)).unwrap();
        svc.check_in_at(&me, at(3, 8, 40)).unwrap();
        svc.check_in_at(&me, at(6, 8, 0)).unwrap();
        svc.check_out_at(&me, at(6, 10, 0)).unwrap();
        svc.mark_attendance(
            &hr(),
            MarkAttendance { staff_id: "s1".into(), work_date: day(5, 7), status: AttendanceStatus::Absent, note: None },
        )
        .unwrap();

        let run = svc.run_payroll(&hr(), may()).unwrap();
        assert_eq!(run.slips.len(), 1);
        let slip = &run.slips[0];
        assert!((slip.work_days - 2.5).abs() < 1e-9);
        assert_eq!(slip.late_count, 1);
        assert_eq!(slip.prorated_salary, 1_250_000);
        assert_eq!(slip.commission, 800_000);
        assert_eq!(slip.late_penalty, 50_000);
        assert_eq!(slip.net_pay, 1_250_000 + 1_000_000 + 800_000 - 50_000);
    }

    #[test]
    fn drafts_regenerate_and_confirmed_slips_lock() {
        let (svc, ledger) = service();
        contract(&svc, "s1", 2_600_000, 0);
        contract(&svc, "s2", 2_600_000, 0);

        let first = svc.run_payroll(&hr(), may()).unwrap();
        let slip_id = first.slips[0].id.clone();
        let adjusted = svc
            .adjust_slip(&hr(), &slip_id, AdjustSlip { bonus: Some(300_000), other_deduction: None, note: None })
            .unwrap();
        assert_eq!(adjusted.net_pay, 1_000_000 + 300_000);

        ledger.set("s1", 1_000_000);
        let again = svc.run_payroll(&hr(), may()).unwrap();
        let s1 = again.slips.iter().find(|s| s.staff_id == "s1").unwrap();
        assert_eq!(s1.id, slip_id);
        assert_eq!(s1.bonus, 300_000);

        svc.confirm_slip(&hr(), &slip_id).unwrap();
        let run = svc.run_payroll(&hr(), may()).unwrap();
        assert_eq!(run.locked, vec!["s1".to_string()]);
        assert_eq!(run.slips.len(), 1);

        let single = GeneratePayroll { month: "2024-05".into(), staff_id: Some("s1".into()) };
        assert!(matches!(svc.run_payroll(&hr(), single), Err(ServiceError::Conflict(_))));
        assert!(matches!(
            svc.adjust_slip(&hr(), &slip_id, AdjustSlip::default()),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn slip_lifecycle_and_access() {
        let (svc, _) = service();
        contract(&svc, "s1", 2_600_000, 0);
        let slip = svc.run_payroll(&hr(), may()).unwrap().slips.remove(0);
        let accountant = who("acc", Role::Accountant);

        assert!(matches!(svc.pay_slip(&accountant, &slip.id), Err(ServiceError::Validation(_))));
        assert!(matches!(svc.confirm_slip(&accountant, &slip.id), Err(ServiceError::PermissionDenied(_))));
        svc.confirm_slip(&hr(), &slip.id).unwrap();
        assert_eq!(svc.pay_slip(&accountant, &slip.id).unwrap().status, SlipStatus::Paid);

        assert!(svc.get_slip(&who("s1", Role::Technician), &slip.id).is_ok());
        assert!(svc.get_slip(&who("s2", Role::Technician), &slip.id).is_err());
        assert!(svc.list_slips(&who("s2", Role::Technician), &SlipQuery::default()).unwrap().is_empty());
        assert_eq!(svc.list_slips(&accountant, &SlipQuery::default()).unwrap().len(), 1);

        let nobody = GeneratePayroll { month: "2024-05".into(), staff_id: Some("ghost".into()) };
        assert!(matches!(svc.run_payroll(&hr(), nobody), Err(ServiceError::NotFound(_))));
        let bad = GeneratePayroll { month: "05/2024".into(), staff_id: None };
        assert!(matches!(svc.run_payroll(&hr(), bad), Err(ServiceError::Validation(_))));
    }
}
