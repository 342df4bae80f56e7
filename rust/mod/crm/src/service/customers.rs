use std::collections::HashMap;

use tracing::info;

use clinic_core::{
    merge_patch, new_id, now_rfc3339, today, transaction, Filter, ListResult, Principal, Role,
    ServiceError, Team,
};
use clinic_sql::{Executor, Value};

use crate::model::{CreateCustomer, Customer, CustomerQuery, CustomerStatus, Rank};
use crate::service::{normalize_phone, page, CrmService, CUSTOMERS};

/// Keys a customer update never changes.
const PROTECTED: [&str; 6] = ["id", "createdBy", "createdAt", "totalSpent", "rank", "phone"];

pub(crate) fn indexes(c: &Customer) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::from(c.name.as_str())),
        ("phone", Value::from(c.phone.as_str())),
        ("status", Value::from(c.status.as_str())),
        ("source", Value::from(c.source.as_str())),
        ("rank", Value::from(c.rank.as_str())),
        ("total_spent", Value::from(c.total_spent)),
        ("assigned_to", Value::from(c.assigned_to.clone())),
        ("created_by", Value::from(c.created_by.as_str())),
        ("updated_at", Value::from(c.updated_at.as_str())),
    ]
}

/// Rows of `customers` the caller may see.
pub(crate) fn scope_filter(caller: &Principal) -> Result<Filter, ServiceError> {
    match caller.role {
        Role::Admin
        | Role::Manager
        | Role::Accountant
        | Role::Receptionist
        | Role::Consultant
        | Role::Technician => Ok(Filter::new()),
        Role::Telesale => Ok(Filter::new().any_eq(&[
            ("assigned_to", Value::from(caller.staff_id.as_str())),
            ("created_by", Value::from(caller.staff_id.as_str())),
        ])),
        Role::Marketing => Ok(Filter::new().eq("created_by", caller.staff_id.as_str())),
        Role::Hr | Role::Warehouse => Err(ServiceError::PermissionDenied(format!(
            "role {} has no access to customers",
            caller.role
        ))),
    }
}

/// Whether `customer` is inside the caller's scope.
pub(crate) fn is_visible(caller: &Principal, customer: &Customer) -> bool {
    match caller.role {
        Role::Telesale => {
            customer.assigned_to.as_deref() == Some(caller.staff_id.as_str())
                || customer.created_by == caller.staff_id
        }
        Role::Marketing => customer.created_by == caller.staff_id,
        Role::Hr | Role::Warehouse => false,
        _ => true,
    }
}

/// Load a customer inside a transaction, applying the caller's scope.
pub(crate) fn load_visible<E: Executor + ?Sized>(
    db: &E,
    caller: &Principal,
    id: &str,
) -> Result<Customer, ServiceError> {
    scope_filter(caller)?;
    let customer: Customer = CUSTOMERS.get(db, id)?;
    if !is_visible(caller, &customer) {
        return Err(ServiceError::NotFound(format!("customer '{id}' not found")));
    }
    Ok(customer)
}

/// Pick the Team B telesale with the fewest assigned customers.
fn least_loaded(db: &dyn Executor, members: &[String]) -> Result<Option<String>, ServiceError> {
    let rows = db.query(
        "SELECT assigned_to, COUNT(*) AS n FROM customers
         WHERE assigned_to IS NOT NULL GROUP BY assigned_to",
        &[],
    )?;
    let loads: HashMap<&str, i64> = rows
        .iter()
        .filter_map(|r| Some((r.get_str("assigned_to")?, r.get_i64("n")?)))
        .collect();

    Ok(members
        .iter()
        .min_by(|a, b| {
            let la = loads.get(a.as_str()).copied().unwrap_or(0);
            let lb = loads.get(b.as_str()).copied().unwrap_or(0);
            la.cmp(&lb).then_with(|| a.cmp(b))
        })
        .cloned())
}

impl CrmService {
    /// The Team B roster when `caller` sources leads for Team B.
    ///
    /// Must be fetched before opening a transaction: the roster reads the
    /// same store.
    pub(crate) fn lead_pool(&self, caller: &Principal) -> Result<Option<Vec<String>>, ServiceError> {
        if caller.role == Role::Telesale && caller.team == Some(Team::A) {
            return Ok(Some(self.roster.team_members(Team::B)?));
        }
        Ok(None)
    }

    /// Validate and insert one customer, choosing the assignee.
    pub(crate) fn insert_customer(
        &self,
        db: &dyn Executor,
        caller: &Principal,
        input: CreateCustomer,
        pool: Option<&[String]>,
    ) -> Result<Customer, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("customer name is required".into()));
        }
        let phone = normalize_phone(&input.phone)
            .ok_or_else(|| ServiceError::Validation(format!("invalid phone number '{}'", input.phone.trim())))?;

        let existing = db.query(
            "SELECT id FROM customers WHERE phone = ?1",
            &[Value::from(phone.as_str())],
        )?;
        if !existing.is_empty() {
            return Err(ServiceError::Conflict(format!("phone {phone} is already registered")));
        }

        let assigned_to = match (caller.role, pool) {
            (Role::Telesale, Some(members)) if !members.is_empty() => least_loaded(db, members)?,
            (Role::Telesale, _) => Some(caller.staff_id.clone()),
            _ => input.assigned_to.filter(|s| !s.trim().is_empty()),
        };

        let now = now_rfc3339();
        let customer = Customer {
            id: new_id(),
            name,
            phone,
            email: input.email.filter(|s| !s.trim().is_empty()),
            gender: input.gender,
            birth_date: input.birth_date,
            address: input.address.filter(|s| !s.trim().is_empty()),
            source: input.source,
            status: CustomerStatus::New,
            rank: Rank::Member,
            total_spent: 0,
            assigned_to,
            created_by: caller.staff_id.clone(),
            note: input.note,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let mut idx = indexes(&customer);
        idx.push(("created_on", Value::from(today().to_string())));
        idx.push(("created_at", Value::from(now)));
        CUSTOMERS.insert(db, &customer.id, &customer, &idx)?;

        if customer.assigned_to.is_some() && customer.assigned_to.as_deref() != Some(caller.staff_id.as_str()) {
            info!(
                customer = %customer.id,
                assignee = customer.assigned_to.as_deref().unwrap_or_default(),
                "assigned lead created by {}",
                caller.staff_id
            );
        }
        Ok(customer)
    }

    /// Create a customer. Telesale creators go through lead assignment.
    pub fn create_customer(&self, caller: &Principal, input: CreateCustomer) -> Result<Customer, ServiceError> {
        scope_filter(caller)?;
        let pool = self.lead_pool(caller)?;
        transaction(self.sql.as_ref(), |tx| {
            self.insert_customer(tx, caller, input, pool.as_deref())
        })
    }

    /// Get a customer within the caller's scope.
    pub fn get_customer(&self, caller: &Principal, id: &str) -> Result<Customer, ServiceError> {
        load_visible(self.sql.as_ref(), caller, id)
    }

    /// List customers within the caller's scope.
    pub fn list_customers(
        &self,
        caller: &Principal,
        query: &CustomerQuery,
    ) -> Result<ListResult<Customer>, ServiceError> {
        let mut filter = scope_filter(caller)?
            .eq_opt("status", query.status.map(|s| s.as_str()))
            .eq_opt("source", query.source.map(|s| s.as_str()))
            .eq_opt("rank", query.rank.map(|r| r.as_str()))
            .eq_opt("assigned_to", query.assigned_to.clone());
        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            // Phone searches should match however the number was typed.
            let digits: String = q.chars().filter(|c| c.is_ascii_digit()).collect();
            let needle = if digits.len() >= 3 && digits.len() * 2 >= q.len() { digits } else { q.to_string() };
            filter = filter.search(&["name", "phone"], &needle);
        }
        let (limit, offset) = page(query.limit, query.offset);
        CUSTOMERS.list(self.sql.as_ref(), &filter, "created_at DESC, id", limit, offset)
    }

    /// Update with merge-patch semantics.
    ///
    /// Derived fields cannot be patched. Changing the assignee needs
    /// management; a new phone is normalised and must stay unique.
    pub fn update_customer(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Customer, ServiceError> {
        if patch.get("assignedTo").is_some() && !caller.is_management() {
            return Err(ServiceError::PermissionDenied(
                "only management can reassign customers".into(),
            ));
        }
        let new_phone = match patch.get("phone") {
            Some(serde_json::Value::String(raw)) => Some(
                normalize_phone(raw)
                    .ok_or_else(|| ServiceError::Validation(format!("invalid phone number '{raw}'")))?,
            ),
            Some(serde_json::Value::Null) | None => None,
            Some(_) => return Err(ServiceError::Validation("phone must be a string".into())),
        };

        transaction(self.sql.as_ref(), |tx| {
            let current = load_visible(tx, caller, id)?;
            let original = serde_json::to_value(&current)?;
            let mut base = original.clone();
            merge_patch(&mut base, &patch);
            for key in PROTECTED {
                base[key] = original[key].clone();
            }
            if let Some(phone) = &new_phone {
                base["phone"] = serde_json::json!(phone);
            }
            base["updatedAt"] = serde_json::json!(now_rfc3339());

            let updated: Customer = serde_json::from_value(base)
                .map_err(|e| ServiceError::Validation(format!("invalid customer: {e}")))?;
            if updated.name.trim().is_empty() {
                return Err(ServiceError::Validation("customer name is required".into()));
            }
            CUSTOMERS
                .update(tx, id, &updated, &indexes(&updated))
                .map_err(|e| match e {
                    ServiceError::Conflict(_) => {
                        ServiceError::Conflict(format!("phone {} is already registered", updated.phone))
                    }
                    other => other,
                })?;
            Ok(updated)
        })
    }

    /// Delete a customer with their calls and appointments. Management only.
    ///
    /// Customers with orders cannot be deleted.
    pub fn delete_customer(&self, caller: &Principal, id: &str) -> Result<(), ServiceError> {
        caller.require_management()?;
        CUSTOMERS.delete(self.sql.as_ref(), id)?;
        info!(customer = %id, "deleted customer");
        Ok(())
    }

    /// Hand a customer to another staff member. Management only.
    pub fn reassign_customer(
        &self,
        caller: &Principal,
        id: &str,
        staff_id: &str,
    ) -> Result<Customer, ServiceError> {
        caller.require_management()?;
        if staff_id.trim().is_empty() {
            return Err(ServiceError::Validation("staff id is required".into()));
        }
        transaction(self.sql.as_ref(), |tx| {
            let mut customer: Customer = CUSTOMERS.get(tx, id)?;
            customer.assigned_to = Some(staff_id.to_string());
            customer.updated_at = now_rfc3339();
            CUSTOMERS.update(tx, id, &customer, &indexes(&customer))?;
            info!(customer = %id, assignee = staff_id, "reassigned customer");
            Ok(customer)
        })
    }

    /// Biggest spenders first, within the caller's scope.
    pub fn top_customers(&self, caller: &Principal, limit: usize) -> Result<Vec<Customer>, ServiceError> {
        let filter = scope_filter(caller)?.gte("total_spent", 1_i64);
        let result = CUSTOMERS.list(
            self.sql.as_ref(),
            &filter,
            "total_spent DESC, id",
            limit.clamp(1, 100),
            0,
        )?;
        Ok(result.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{admin, service, who};

    fn lead(name: &str, phone: &str) -> CreateCustomer {
        CreateCustomer {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    #[test]
    fn team_a_leads_go_to_least_loaded_team_b() {
        let (svc, roster) = service();
        roster.set(Team::B, &["b2", "b1", "b3"]);
        let a = who("a1", Role::Telesale, Some(Team::A));

        // b1 already holds one customer.
        svc.create_customer(&who("b1", Role::Telesale, Some(Team::B)), lead("Own", "0900000001"))
            .unwrap();

        let c1 = svc.create_customer(&a, lead("Mai", "0900000002")).unwrap();
        assert_eq!(c1.assigned_to.as_deref(), Some("b2"));
        let c2 = svc.create_customer(&a, lead("Lan", "0900000003")).unwrap();
        assert_eq!(c2.assigned_to.as_deref(), Some("b3"));
        let c3 = svc.create_customer(&a, lead("Hoa", "0900000004")).unwrap();
        assert_eq!(c3.assigned_to.as_deref(), Some("b1"));
        assert_eq!(c3.created_by, "a1");
    }

    #[test]
    fn empty_team_b_keeps_lead_with_creator() {
        let (svc, _) = service();
        let a = who("a1", Role::Telesale, Some(Team::A));
        let c = svc.create_customer(&a, lead("Mai", "0900000002")).unwrap();
        assert_eq!(c.assigned_to.as_deref(), Some("a1"));
    }

    #[test]
    fn other_roles_assign_explicitly() {
        let (svc, _) = service();
        let mut input = lead("Mai", "+84 912 345 678");
        input.assigned_to = Some("b9".into());
        let c = svc.create_customer(&who("r1", Role::Receptionist, None), input).unwrap();
        assert_eq!(c.assigned_to.as_deref(), Some("b9"));
        assert_eq!(c.phone, "0912345678");
        assert_eq!(c.rank, Rank::Member);

        let c = svc.create_customer(&who("m1", Role::Marketing, None), lead("Tuan", "0912000000")).unwrap();
        assert_eq!(c.assigned_to, None);
    }

    #[test]
    fn duplicate_phone_conflicts_after_normalisation() {
        let (svc, _) = service();
        svc.create_customer(&admin(), lead("Mai", "0912345678")).unwrap();
        let err = svc.create_customer(&admin(), lead("Mai 2", "84912345678")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn invalid_phone_rejected() {
        let (svc, _) = service();
        let err = svc.create_customer(&admin(), lead("Mai", "12345")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn role_based_visibility() {
        let (svc, _) = service();
        let t1 = who("t1", Role::Telesale, Some(Team::B));
        let t2 = who("t2", Role::Telesale, Some(Team::B));
        let mk = who("mk", Role::Marketing, None);

        let own = svc.create_customer(&t1, lead("A", "0900000001")).unwrap();
        let from_marketing = svc.create_customer(&mk, lead("B", "0900000002")).unwrap();

        assert_eq!(svc.list_customers(&t1, &CustomerQuery::default()).unwrap().total, 1);
        assert_eq!(svc.list_customers(&t2, &CustomerQuery::default()).unwrap().total, 0);
        assert_eq!(svc.list_customers(&mk, &CustomerQuery::default()).unwrap().total, 1);
        assert_eq!(
            svc.list_customers(&who("c", Role::Consultant, None), &CustomerQuery::default())
                .unwrap()
                .total,
            2
        );

        assert!(matches!(svc.get_customer(&t2, &own.id), Err(ServiceError::NotFound(_))));
        assert!(svc.get_customer(&mk, &from_marketing.id).is_ok());
        assert!(matches!(
            svc.list_customers(&who("h", Role::Hr, None), &CustomerQuery::default()),
            Err(ServiceError::PermissionDenied(_))
        ));

        svc.reassign_customer(&admin(), &own.id, "t2").unwrap();
        // Still visible to t1 as creator, now also to t2.
        assert!(svc.get_customer(&t1, &own.id).is_ok());
        assert!(svc.get_customer(&t2, &own.id).is_ok());
    }

    #[test]
    fn search_by_name_or_phone() {
        let (svc, _) = service();
        svc.create_customer(&admin(), lead("Nguyen Thi Mai", "0912345678")).unwrap();
        svc.create_customer(&admin(), lead("Tran Van Nam", "0987654321")).unwrap();

        let q = |s: &str| CustomerQuery {
            q: Some(s.into()),
            ..Default::default()
        };
        assert_eq!(svc.list_customers(&admin(), &q("mai")).unwrap().total, 1);
        assert_eq!(svc.list_customers(&admin(), &q("0987 654")).unwrap().total, 1);
        assert_eq!(svc.list_customers(&admin(), &q("xyz")).unwrap().total, 0);
    }

    #[test]
    fn update_respects_protected_fields() {
        let (svc, _) = service();
        let t1 = who("t1", Role::Telesale, None);
        let c = svc.create_customer(&t1, lead("Mai", "0912345678")).unwrap();

        let updated = svc
            .update_customer(
                &t1,
                &c.id,
                serde_json::json!({"note": "prefers evenings", "totalSpent": 999, "status": "POTENTIAL"}),
            )
            .unwrap();
        assert_eq!(updated.note.as_deref(), Some("prefers evenings"));
        assert_eq!(updated.total_spent, 0);
        assert_eq!(updated.status, CustomerStatus::Potential);

        let err = svc
            .update_customer(&t1, &c.id, serde_json::json!({"assignedTo": "t9"}))
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));

        let updated = svc
            .update_customer(&admin(), &c.id, serde_json::json!({"phone": "+84 90 111 2222"}))
            .unwrap();
        assert_eq!(updated.phone, "0901112222");
    }

    #[test]
    fn delete_requires_management() {
        let (svc, _) = service();
        let c = svc.create_customer(&admin(), lead("Mai", "0912345678")).unwrap();
        let err = svc
            .delete_customer(&who("t1", Role::Telesale, None), &c.id)
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
        svc.delete_customer(&admin(), &c.id).unwrap();
        assert!(svc.get_customer(&admin(), &c.id).is_err());
    }
}
