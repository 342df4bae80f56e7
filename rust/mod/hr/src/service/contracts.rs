use tracing::info;

use clinic_core::{merge_patch, new_id, now_rfc3339, transaction, Filter, Principal, Role, ServiceError};
use clinic_sql::{Executor, Value};

use crate::model::{ContractQuery, CreateContract, EmployeeContract};
use crate::service::{HrService, CONTRACTS};

const PROTECTED: [&str; 5] = ["id", "staffId", "active", "createdAt", "updatedAt"];

fn indexes(c: &EmployeeContract) -> Vec<(&'static str, Value)> {
    vec![
        ("staff_id", Value::from(c.staff_id.as_str())),
        ("active", Value::from(c.active)),
        ("start_date", Value::from(c.start_date.to_string())),
        ("updated_at", Value::from(c.updated_at.as_str())),
    ]
}

fn validate(c: &EmployeeContract) -> Result<(), ServiceError> {
    if c.staff_id.trim().is_empty() {
        return Err(ServiceError::Validation("staff id is required".into()));
    }
    if c.base_salary < 0 || c.allowance < 0 {
        return Err(ServiceError::Validation("salary amounts cannot be negative".into()));
    }
    if !(0..=10_000).contains(&c.commission_rate_bp) {
        return Err(ServiceError::Validation("commission rate must be 0..=10000 basis points".into()));
    }
    if c.end_date.is_some_and(|end| end < c.start_date) {
        return Err(ServiceError::Validation("contract ends before it starts".into()));
    }
    Ok(())
}

/// The staff member's active contract, if any.
pub(crate) fn active_contract<E: Executor + ?Sized>(
    db: &E,
    staff_id: &str,
) -> Result<Option<EmployeeContract>, ServiceError> {
    let found: Vec<EmployeeContract> = CONTRACTS.select(
        db,
        &Filter::new().eq("staff_id", staff_id).eq("active", true),
        "start_date DESC",
    )?;
    Ok(found.into_iter().next())
}

impl HrService {
    /// Sign a new contract. The staff member's previous active contract
    /// is closed.
    pub fn create_contract(&self, caller: &Principal, input: CreateContract) -> Result<EmployeeContract, ServiceError> {
        caller.require(&[Role::Hr])?;
        let now = now_rfc3339();
        let contract = EmployeeContract {
            id: new_id(),
            staff_id: input.staff_id.trim().to_string(),
            contract_type: input.contract_type,
            start_date: input.start_date,
            end_date: input.end_date,
            base_salary: input.base_salary,
            allowance: input.allowance,
            commission_rate_bp: input.commission_rate_bp,
            active: true,
            note: input.note,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        validate(&contract)?;

        transaction(self.sql.as_ref(), |tx| {
            if let Some(mut previous) = active_contract(tx, &contract.staff_id)? {
                previous.active = false;
                previous.updated_at = now.clone();
                CONTRACTS.update(tx, &previous.id, &previous, &indexes(&previous))?;
                info!(staff = %contract.staff_id, contract = %previous.id, "closed previous contract");
            }
            let mut idx = indexes(&contract);
            idx.push(("created_at", Value::from(now.as_str())));
            CONTRACTS.insert(tx, &contract.id, &contract, &idx)?;
            Ok(())
        })?;
        info!(staff = %contract.staff_id, contract = %contract.id, kind = %contract.contract_type, "signed contract");
        Ok(contract)
    }

    /// HR and accounting see every contract; staff see their own.
    pub fn get_contract(&self, caller: &Principal, id: &str) -> Result<EmployeeContract, ServiceError> {
        let contract: EmployeeContract = CONTRACTS.get(self.sql.as_ref(), id)?;
        if contract.staff_id != caller.staff_id {
            caller.require(&[Role::Hr, Role::Accountant])?;
        }
        Ok(contract)
    }

    pub fn list_contracts(
        &self,
        caller: &Principal,
        query: &ContractQuery,
    ) -> Result<Vec<EmployeeContract>, ServiceError> {
        let staff_id = if caller.require(&[Role::Hr, Role::Accountant]).is_ok() {
            query.staff_id.clone()
        } else {
            Some(caller.staff_id.clone())
        };
        let filter = Filter::new()
            .eq_opt("staff_id", staff_id)
            .eq_opt("active", query.active);
        CONTRACTS.select(self.sql.as_ref(), &filter, "staff_id, start_date DESC")
    }

    /// Amend salary terms, dates or note.
    pub fn update_contract(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<EmployeeContract, ServiceError> {
        caller.require(&[Role::Hr])?;
        let current: EmployeeContract = CONTRACTS.get(self.sql.as_ref(), id)?;
        let original = serde_json::to_value(&current)?;
        let mut base = original.clone();
        merge_patch(&mut base, &patch);
        for key in PROTECTED {
            base[key] = original[key].clone();
        }
        base["updatedAt"] = serde_json::json!(now_rfc3339());
        let updated: EmployeeContract = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid contract: {e}")))?;
        validate(&updated)?;
        CONTRACTS.update(self.sql.as_ref(), id, &updated, &indexes(&updated))?;
        Ok(updated)
    }

    /// End a contract early.
    pub fn terminate_contract(&self, caller: &Principal, id: &str) -> Result<EmployeeContract, ServiceError> {
        caller.require(&[Role::Hr])?;
        let mut contract: EmployeeContract = CONTRACTS.get(self.sql.as_ref(), id)?;
        if !contract.active {
            return Err(ServiceError::Validation("contract is already inactive".into()));
        }
        contract.active = false;
        contract.updated_at = now_rfc3339();
        CONTRACTS.update(self.sql.as_ref(), id, &contract, &indexes(&contract))?;
        info!(staff = %contract.staff_id, contract = %id, "terminated contract");
        Ok(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContractType;
    use crate::service::testing::{day, hr, service, who};

    fn input(staff: &str, salary: i64) -> CreateContract {
        CreateContract {
            staff_id: staff.into(),
            contract_type: ContractType::FixedTerm,
            start_date: day(1, 1),
            end_date: None,
            base_salary: salary,
            allowance: 0,
            commission_rate_bp: 100,
            note: None,
        }
    }

    #[test]
    fn new_contract_replaces_active_one() {
        let (svc, _) = service();
        let first = svc.create_contract(&hr(), input("s1", 8_000_000)).unwrap();
        let mut second = input("s1", 9_000_000);
        second.start_date = day(7, 1);
        let second = svc.create_contract(&hr(), second).unwrap();

        assert!(!svc.get_contract(&hr(), &first.id).unwrap().active);
        let active = active_contract(svc.sql.as_ref(), "s1").unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(
            svc.list_contracts(&hr(), &ContractQuery { staff_id: Some("s1".into()), active: None })
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn validation_and_access() {
        let (svc, _) = service();
        let mut bad = input("s1", 1);
        bad.commission_rate_bp = 20_000;
        assert!(matches!(svc.create_contract(&hr(), bad), Err(ServiceError::Validation(_))));
        assert!(matches!(
            svc.create_contract(&who("m", Role::Manager), input("s1", 1)),
            Err(ServiceError::PermissionDenied(_))
        ));

        let c = svc.create_contract(&hr(), input("s1", 5_000_000)).unwrap();
        assert!(svc.get_contract(&who("s1", Role::Telesale), &c.id).is_ok());
        assert!(matches!(
            svc.get_contract(&who("s2", Role::Telesale), &c.id),
            Err(ServiceError::PermissionDenied(_))
        ));
        assert!(svc.list_contracts(&who("s2", Role::Telesale), &ContractQuery::default()).unwrap().is_empty());

        let updated = svc
            .update_contract(&hr(), &c.id, serde_json::json!({"allowance": 300000, "active": false}))
            .unwrap();
        assert_eq!(updated.allowance, 300_000);
        assert!(updated.active);

        svc.terminate_contract(&hr(), &c.id).unwrap();
        assert!(matches!(svc.terminate_contract(&hr(), &c.id), Err(ServiceError::Validation(_))));
    }
}
