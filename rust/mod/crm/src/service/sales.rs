use chrono::NaiveDate;
use tracing::{debug, info};

use clinic_core::{
    merge_patch, new_id, now_rfc3339, today, transaction, Filter, ListResult, Principal, Role,
    ServiceError,
};
use clinic_sql::{Executor, Row, Value};

use crate::model::{
    check_duration, Appointment, CreateOrder, CreateService, Customer, CustomerStatus, DateRange, Order,
    OrderQuery, RevenueLine, RevenueReport, Service,
};
use crate::service::customers::indexes as customer_indexes;
use crate::service::ranking::refresh_ranking;
use crate::service::{page, CrmService, APPOINTMENTS, CUSTOMERS, ORDERS, SERVICES};

const ORDER_ROLES: [Role; 4] = [Role::Manager, Role::Receptionist, Role::Consultant, Role::Accountant];
const FINANCE_ROLES: [Role; 2] = [Role::Manager, Role::Accountant];

/// Keys an order edit never changes.
const ORDER_PROTECTED: [&str; 10] = [
    "id",
    "customerId",
    "appointmentId",
    "serviceId",
    "telesaleId",
    "debt",
    "isPaid",
    "createdBy",
    "createdAt",
    "updatedAt",
];

const SERVICE_PROTECTED: [&str; 3] = ["id", "createdAt", "updatedAt"];

fn service_indexes(s: &Service) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::from(s.name.as_str())),
        ("category", Value::from(s.category.clone())),
        ("active", Value::from(s.active)),
        ("updated_at", Value::from(s.updated_at.as_str())),
    ]
}

fn order_indexes(o: &Order) -> Vec<(&'static str, Value)> {
    vec![
        ("customer_id", Value::from(o.customer_id.as_str())),
        ("appointment_id", Value::from(o.appointment_id.clone())),
        ("service_id", Value::from(o.service_id.as_str())),
        ("consultant_id", Value::from(o.consultant_id.clone())),
        ("telesale_id", Value::from(o.telesale_id.clone())),
        ("order_date", Value::from(o.order_date.to_string())),
        ("total_amount", Value::from(o.total_amount)),
        ("actual_revenue", Value::from(o.actual_revenue)),
        ("debt", Value::from(o.debt)),
        ("is_paid", Value::from(o.is_paid)),
        ("updated_at", Value::from(o.updated_at.as_str())),
    ]
}

fn validate_service(s: &Service) -> Result<(), ServiceError> {
    if s.name.trim().is_empty() {
        return Err(ServiceError::Validation("service name is required".into()));
    }
    if s.price < 0 {
        return Err(ServiceError::Validation("price cannot be negative".into()));
    }
    check_duration(s.duration_minutes)
}

fn validate_amounts(total: i64, actual: i64) -> Result<(), ServiceError> {
    if total < 0 || actual < 0 {
        return Err(ServiceError::Validation("amounts cannot be negative".into()));
    }
    Ok(())
}

/// A service that exists and is still sold.
pub(crate) fn active_service(db: &dyn Executor, id: &str) -> Result<Service, ServiceError> {
    let service: Service = SERVICES.get(db, id)?;
    if !service.active {
        return Err(ServiceError::Validation(format!("service '{}' is no longer offered", service.name)));
    }
    Ok(service)
}

/// Telesales only see the orders credited to them.
fn order_scope(caller: &Principal) -> Result<Filter, ServiceError> {
    match caller.role {
        Role::Telesale => Ok(Filter::new().eq("telesale_id", caller.staff_id.as_str())),
        _ => {
            caller.require(&ORDER_ROLES)?;
            Ok(Filter::new())
        }
    }
}

fn revenue_lines(rows: &[Row]) -> Vec<RevenueLine> {
    rows.iter()
        .map(|r| RevenueLine {
            key: r.get_str("group_key").unwrap_or_default().to_string(),
            label: r.get_str("label").map(str::to_string),
            orders: r.get_i64("orders").unwrap_or(0),
            total_amount: r.get_i64("total_amount").unwrap_or(0),
            actual_revenue: r.get_i64("actual_revenue").unwrap_or(0),
        })
        .collect()
}

impl CrmService {
    // ── Services ────────────────────────────────────────────────────

    pub fn create_service(&self, caller: &Principal, input: CreateService) -> Result<Service, ServiceError> {
        caller.require_management()?;
        let now = now_rfc3339();
        let service = Service {
            id: new_id(),
            name: input.name.trim().to_string(),
            category: input.category,
            price: input.price,
            duration_minutes: input.duration_minutes,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        validate_service(&service)?;
        let mut idx = service_indexes(&service);
        idx.push(("created_at", Value::from(service.created_at.as_str())));
        SERVICES.insert(self.sql.as_ref(), &service.id, &service, &idx)?;
        info!(service = %service.id, name = %service.name, "created service");
        Ok(service)
    }

    pub fn get_service(&self, id: &str) -> Result<Service, ServiceError> {
        SERVICES.get(self.sql.as_ref(), id)
    }

    /// The service menu, by category then name.
    pub fn list_services(&self, include_inactive: bool) -> Result<Vec<Service>, ServiceError> {
        let filter = if include_inactive {
            Filter::new()
        } else {
            Filter::new().eq("active", true)
        };
        SERVICES.select(self.sql.as_ref(), &filter, "category, name")
    }

    pub fn update_service(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Service, ServiceError> {
        caller.require_management()?;
        let current: Service = SERVICES.get(self.sql.as_ref(), id)?;
        let original = serde_json::to_value(&current)?;
        let mut base = original.clone();
        merge_patch(&mut base, &patch);
        for key in SERVICE_PROTECTED {
            base[key] = original[key].clone();
        }
        base["updatedAt"] = serde_json::json!(now_rfc3339());
        let updated: Service = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid service: {e}")))?;
        validate_service(&updated)?;
        SERVICES.update(self.sql.as_ref(), id, &updated, &service_indexes(&updated))?;
        Ok(updated)
    }

    /// Remove a service nobody has booked or bought.
    pub fn delete_service(&self, caller: &Principal, id: &str) -> Result<(), ServiceError> {
        caller.require_management()?;
        SERVICES.delete(self.sql.as_ref(), id)
    }

    // ── Orders ──────────────────────────────────────────────────────

    /// Record a sale, convert the customer and refresh their rank.
    pub fn create_order(&self, caller: &Principal, input: CreateOrder) -> Result<Order, ServiceError> {
        caller.require(&ORDER_ROLES)?;
        let total = input.total_amount.unwrap_or(0);
        validate_amounts(total, input.actual_revenue)?;

        transaction(self.sql.as_ref(), |tx| {
            let mut customer: Customer = CUSTOMERS.get(tx, &input.customer_id)?;
            let service: Service = SERVICES.get(tx, &input.service_id)?;

            let appointment = match input.appointment_id.as_deref() {
                Some(appointment_id) => {
                    let appt: Appointment = APPOINTMENTS.get(tx, appointment_id)?;
                    if appt.customer_id != customer.id {
                        return Err(ServiceError::Validation(format!(
                            "appointment '{appointment_id}' belongs to another customer"
                        )));
                    }
                    let existing = ORDERS.count(tx, &Filter::new().eq("appointment_id", appointment_id))?;
                    if existing > 0 {
                        return Err(ServiceError::Conflict(format!(
                            "appointment '{appointment_id}' already has an order"
                        )));
                    }
                    Some(appt)
                }
                None => None,
            };

            let now = now_rfc3339();
            let mut order = Order {
                id: new_id(),
                customer_id: customer.id.clone(),
                appointment_id: appointment.as_ref().map(|a| a.id.clone()),
                service_id: service.id,
                consultant_id: input
                    .consultant_id
                    .or_else(|| appointment.and_then(|a| a.assigned_to)),
                telesale_id: customer.assigned_to.clone(),
                order_date: input.order_date.unwrap_or_else(today),
                total_amount: total,
                actual_revenue: input.actual_revenue,
                debt: 0,
                is_paid: false,
                payment_method: input.payment_method,
                note: input.note,
                created_by: caller.staff_id.clone(),
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            order.apply_financials();

            let mut idx = order_indexes(&order);
            idx.push(("created_at", Value::from(now)));
            ORDERS.insert(tx, &order.id, &order, &idx)?;

            if customer.status != CustomerStatus::Converted {
                customer.status = CustomerStatus::Converted;
                customer.updated_at = now_rfc3339();
                CUSTOMERS.update(tx, &customer.id, &customer, &customer_indexes(&customer))?;
            }
            refresh_ranking(tx, &customer.id)?;
            info!(
                order = %order.id,
                customer = %order.customer_id,
                total = order.total_amount,
                debt = order.debt,
                "created order"
            );
            Ok(order)
        })
    }

    pub fn get_order(&self, caller: &Principal, id: &str) -> Result<Order, ServiceError> {
        order_scope(caller)?;
        let order: Order = ORDERS.get(self.sql.as_ref(), id)?;
        if caller.role == Role::Telesale && order.telesale_id.as_deref() != Some(caller.staff_id.as_str()) {
            return Err(ServiceError::NotFound(format!("order '{id}' not found")));
        }
        Ok(order)
    }

    pub fn list_orders(&self, caller: &Principal, query: &OrderQuery) -> Result<ListResult<Order>, ServiceError> {
        let mut filter = order_scope(caller)?
            .eq_opt("customer_id", query.customer_id.clone())
            .eq_opt("is_paid", query.is_paid);
        if let Some(from) = query.from {
            filter = filter.gte("order_date", from.to_string());
        }
        if let Some(to) = query.to {
            filter = filter.lte("order_date", to.to_string());
        }
        let (limit, offset) = page(query.limit, query.offset);
        ORDERS.list(self.sql.as_ref(), &filter, "order_date DESC, created_at DESC", limit, offset)
    }

    /// Edit amounts, payment method, consultant, date or note.
    pub fn update_order(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Order, ServiceError> {
        caller.require(&FINANCE_ROLES)?;
        transaction(self.sql.as_ref(), |tx| {
            let current: Order = ORDERS.get(tx, id)?;
            let original = serde_json::to_value(&current)?;
            let mut base = original.clone();
            merge_patch(&mut base, &patch);
            for key in ORDER_PROTECTED {
                base[key] = original[key].clone();
            }
            let mut updated: Order = serde_json::from_value(base)
                .map_err(|e| ServiceError::Validation(format!("invalid order: {e}")))?;
            validate_amounts(updated.total_amount, updated.actual_revenue)?;
            updated.apply_financials();
            updated.updated_at = now_rfc3339();

            ORDERS.update(tx, id, &updated, &order_indexes(&updated))?;
            refresh_ranking(tx, &updated.customer_id)?;
            Ok(updated)
        })
    }

    /// Collect part or all of an order's outstanding debt.
    pub fn pay_debt(&self, caller: &Principal, id: &str, amount: i64) -> Result<Order, ServiceError> {
        caller.require(&[Role::Manager, Role::Accountant, Role::Receptionist])?;
        if amount <= 0 {
            return Err(ServiceError::Validation("payment must be positive".into()));
        }
        transaction(self.sql.as_ref(), |tx| {
            let mut order: Order = ORDERS.get(tx, id)?;
            if amount > order.debt {
                return Err(ServiceError::Validation(format!(
                    "payment {amount} exceeds outstanding debt {}",
                    order.debt
                )));
            }
            order.actual_revenue += amount;
            order.apply_financials();
            order.updated_at = now_rfc3339();
            ORDERS.update(tx, id, &order, &order_indexes(&order))?;
            refresh_ranking(tx, &order.customer_id)?;
            info!(order = %id, amount, remaining = order.debt, by = %caller.staff_id, "debt payment");
            Ok(order)
        })
    }

    pub fn delete_order(&self, caller: &Principal, id: &str) -> Result<(), ServiceError> {
        caller.require_management()?;
        transaction(self.sql.as_ref(), |tx| {
            let order: Order = ORDERS.get(tx, id)?;
            ORDERS.delete(tx, id)?;
            refresh_ranking(tx, &order.customer_id)?;
            info!(order = %id, customer = %order.customer_id, "deleted order");
            Ok(())
        })
    }

    /// Unpaid orders, largest debt first.
    pub fn debt_list(&self, caller: &Principal) -> Result<Vec<Order>, ServiceError> {
        caller.require(&[Role::Manager, Role::Accountant, Role::Receptionist])?;
        ORDERS.select(
            self.sql.as_ref(),
            &Filter::new().eq("is_paid", false),
            "debt DESC, order_date, id",
        )
    }

    /// Order totals over a date range, with breakdowns.
    pub fn revenue_report(&self, caller: &Principal, range: DateRange) -> Result<RevenueReport, ServiceError> {
        caller.require(&FINANCE_ROLES)?;
        if range.from > range.to {
            return Err(ServiceError::Validation("report range starts after it ends".into()));
        }
        let bounds = [Value::from(range.from.to_string()), Value::from(range.to.to_string())];
        let db = self.sql.as_ref();

        let totals = db.query(
            "SELECT COUNT(*) AS orders,
                    COALESCE(SUM(total_amount), 0) AS total_amount,
                    COALESCE(SUM(actual_revenue), 0) AS actual_revenue,
                    COALESCE(SUM(debt), 0) AS debt
             FROM orders WHERE order_date >= ?1 AND order_date <= ?2",
            &bounds,
        )?;
        let by_service = db.query(
            "SELECT o.service_id AS group_key, s.name AS label, COUNT(*) AS orders,
                    SUM(o.total_amount) AS total_amount, SUM(o.actual_revenue) AS actual_revenue
             FROM orders o LEFT JOIN services s ON s.id = o.service_id
             WHERE o.order_date >= ?1 AND o.order_date <= ?2
             GROUP BY o.service_id, s.name
             ORDER BY actual_revenue DESC, group_key",
            &bounds,
        )?;
        let by_consultant = db.query(
            "SELECT COALESCE(consultant_id, '') AS group_key, COUNT(*) AS orders,
                    SUM(total_amount) AS total_amount, SUM(actual_revenue) AS actual_revenue
             FROM orders WHERE order_date >= ?1 AND order_date <= ?2
             GROUP BY group_key
             ORDER BY actual_revenue DESC, group_key",
            &bounds,
        )?;

        let t = totals.first();
        let sum = |col: &str| t.and_then(|r| r.get_i64(col)).unwrap_or(0);
        debug!(from = %range.from, to = %range.to, services = by_service.len(), "revenue report");
        Ok(RevenueReport {
            from: range.from,
            to: range.to,
            orders: sum("orders"),
            total_amount: sum("total_amount"),
            actual_revenue: sum("actual_revenue"),
            outstanding_debt: sum("debt"),
            by_service: revenue_lines(&by_service),
            by_consultant: revenue_lines(&by_consultant),
        })
    }

    /// Money collected on orders a staff member sold or sourced.
    pub fn revenue_for_staff(&self, staff_id: &str, from: NaiveDate, to: NaiveDate) -> Result<i64, ServiceError> {
        let rows = self.sql.query(
            "SELECT COALESCE(SUM(actual_revenue), 0) AS revenue FROM orders
             WHERE (consultant_id = ?1 OR telesale_id = ?1)
               AND order_date >= ?2 AND order_date <= ?3",
            &[
                Value::from(staff_id),
                Value::from(from.to_string()),
                Value::from(to.to_string()),
            ],
        )?;
        Ok(rows.first().and_then(|r| r.get_i64("revenue")).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateAppointment, CreateCustomer, PaymentMethod, Rank};
    use crate::service::testing::{admin, service, who};

    struct Fixture {
        svc: std::sync::Arc<CrmService>,
        customer: String,
        service: String,
    }

    fn fixture() -> Fixture {
        let (svc, _) = service();
        let customer = svc
            .create_customer(
                &who("t1", Role::Telesale, None),
                CreateCustomer { name: "Mai".into(), phone: "0912345678".into(), ..Default::default() },
            )
            .unwrap();
        let service = svc
            .create_service(
                &admin(),
                CreateService { name: "Laser".into(), category: Some("skin".into()), price: 20_000_000, duration_minutes: 60 },
            )
            .unwrap();
        Fixture { svc, customer: customer.id, service: service.id }
    }

    fn sale(f: &Fixture, total: Option<i64>, actual: i64) -> CreateOrder {
        CreateOrder {
            customer_id: f.customer.clone(),
            service_id: f.service.clone(),
            appointment_id: None,
            consultant_id: Some("k1".into()),
            order_date: NaiveDate::from_ymd_opt(2024, 5, 10),
            total_amount: total,
            actual_revenue: actual,
            payment_method: PaymentMethod::Transfer,
            note: None,
        }
    }

    #[test]
    fn service_validation() {
        let (svc, _) = service();
        let bad = CreateService { name: "X".into(), category: None, price: -1, duration_minutes: 30 };
        assert!(matches!(svc.create_service(&admin(), bad), Err(ServiceError::Validation(_))));
        let endless = CreateService { name: "X".into(), category: None, price: 0, duration_minutes: 1_000_000 };
        assert!(matches!(svc.create_service(&admin(), endless), Err(ServiceError::Validation(_))));
        let ok = CreateService { name: "X".into(), category: None, price: 0, duration_minutes: 30 };
        assert!(matches!(
            svc.create_service(&who("r", Role::Receptionist, None), ok.clone()),
            Err(ServiceError::PermissionDenied(_))
        ));
        let s = svc.create_service(&admin(), ok).unwrap();
        let s = svc.update_service(&admin(), &s.id, serde_json::json!({"active": false})).unwrap();
        assert!(!s.active);
        assert!(svc.list_services(false).unwrap().is_empty());
        assert_eq!(svc.list_services(true).unwrap().len(), 1);
    }

    #[test]
    fn order_converts_customer_and_credits_telesale() {
        let f = fixture();
        let order = f.svc.create_order(&admin(), sale(&f, Some(5_000_000), 2_000_000)).unwrap();
        assert_eq!(order.debt, 3_000_000);
        assert!(!order.is_paid);
        assert_eq!(order.telesale_id.as_deref(), Some("t1"));

        let customer = f.svc.get_customer(&admin(), &f.customer).unwrap();
        assert_eq!(customer.status, CustomerStatus::Converted);
        // Unpaid orders do not count towards spend.
        assert_eq!(customer.total_spent, 0);

        let unset = f.svc.create_order(&admin(), sale(&f, None, 700_000)).unwrap();
        assert_eq!(unset.total_amount, 700_000);
        assert!(unset.is_paid);

        let over = f.svc.create_order(&admin(), sale(&f, Some(100), 500)).unwrap();
        assert_eq!(over.debt, 0);
        assert!(over.is_paid);

        assert!(matches!(
            f.svc.create_order(&admin(), sale(&f, Some(-5), 0)),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn one_order_per_appointment() {
        let f = fixture();
        let appt = f
            .svc
            .create_appointment(
                &admin(),
                CreateAppointment {
                    customer_id: f.customer.clone(),
                    service_id: Some(f.service.clone()),
                    scheduled_at: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap().and_hms_opt(9, 0, 0).unwrap(),
                    duration_minutes: None,
                    assigned_to: Some("k2".into()),
                    note: None,
                },
            )
            .unwrap();
        let mut input = sale(&f, Some(1_000), 1_000);
        input.appointment_id = Some(appt.id.clone());
        input.consultant_id = None;
        let order = f.svc.create_order(&admin(), input.clone()).unwrap();
        assert_eq!(order.consultant_id.as_deref(), Some("k2"));

        assert!(matches!(f.svc.create_order(&admin(), input), Err(ServiceError::Conflict(_))));

        let other = f
            .svc
            .create_customer(&admin(), CreateCustomer { name: "Lan".into(), phone: "0987654321".into(), ..Default::default() })
            .unwrap();
        let mut wrong = sale(&f, Some(1_000), 1_000);
        wrong.customer_id = other.id;
        wrong.appointment_id = Some(appt.id);
        assert!(matches!(f.svc.create_order(&admin(), wrong), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn paying_debt_moves_rank() {
        let f = fixture();
        let order = f.svc.create_order(&admin(), sale(&f, Some(12_000_000), 2_000_000)).unwrap();
        assert_eq!(f.svc.get_customer(&admin(), &f.customer).unwrap().rank, Rank::Member);

        assert!(matches!(
            f.svc.pay_debt(&admin(), &order.id, 10_000_001),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(f.svc.pay_debt(&admin(), &order.id, 0), Err(ServiceError::Validation(_))));

        let paid = f.svc.pay_debt(&admin(), &order.id, 10_000_000).unwrap();
        assert!(paid.is_paid);
        let customer = f.svc.get_customer(&admin(), &f.customer).unwrap();
        assert_eq!(customer.total_spent, 12_000_000);
        assert_eq!(customer.rank, Rank::Silver);
        assert!(f.svc.debt_list(&admin()).unwrap().is_empty());
    }

    #[test]
    fn ranking_follows_updates_and_deletes() {
        let f = fixture();
        let big = f.svc.create_order(&admin(), sale(&f, None, 45_000_000)).unwrap();
        let small = f.svc.create_order(&admin(), sale(&f, None, 10_000_000)).unwrap();
        assert_eq!(f.svc.get_customer(&admin(), &f.customer).unwrap().rank, Rank::Gold);

        f.svc
            .update_order(&admin(), &big.id, serde_json::json!({"totalAmount": 95_000_000, "actualRevenue": 95_000_000}))
            .unwrap();
        assert_eq!(f.svc.get_customer(&admin(), &f.customer).unwrap().rank, Rank::Diamond);

        f.svc.delete_order(&admin(), &big.id).unwrap();
        let customer = f.svc.get_customer(&admin(), &f.customer).unwrap();
        assert_eq!(customer.total_spent, 10_000_000);
        assert_eq!(customer.rank, Rank::Silver);

        f.svc.delete_order(&admin(), &small.id).unwrap();
        assert_eq!(f.svc.get_customer(&admin(), &f.customer).unwrap().rank, Rank::Member);
    }

    #[test]
    fn update_keeps_protected_fields() {
        let f = fixture();
        let order = f.svc.create_order(&admin(), sale(&f, Some(3_000), 1_000)).unwrap();
        let updated = f
            .svc
            .update_order(
                &who("acc", Role::Accountant, None),
                &order.id,
                serde_json::json!({"debt": 0, "isPaid": true, "telesaleId": "x", "paymentMethod": "CARD"}),
            )
            .unwrap();
        assert_eq!(updated.debt, 2_000);
        assert!(!updated.is_paid);
        assert_eq!(updated.telesale_id.as_deref(), Some("t1"));
        assert_eq!(updated.payment_method, PaymentMethod::Card);

        assert!(matches!(
            f.svc.update_order(&who("r", Role::Receptionist, None), &order.id, serde_json::json!({})),
            Err(ServiceError::PermissionDenied(_))
        ));
    }

    #[test]
    fn revenue_report_and_staff_revenue() {
        let f = fixture();
        f.svc.create_order(&admin(), sale(&f, Some(5_000), 3_000)).unwrap();
        let mut other = sale(&f, None, 1_000);
        other.consultant_id = None;
        f.svc.create_order(&admin(), other).unwrap();
        let mut outside = sale(&f, None, 9_999);
        outside.order_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        f.svc.create_order(&admin(), outside).unwrap();

        let may = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        };
        let report = f.svc.revenue_report(&admin(), may).unwrap();
        assert_eq!(report.orders, 2);
        assert_eq!(report.total_amount, 6_000);
        assert_eq!(report.actual_revenue, 4_000);
        assert_eq!(report.outstanding_debt, 2_000);
        assert_eq!(report.by_service.len(), 1);
        assert_eq!(report.by_service[0].label.as_deref(), Some("Laser"));
        assert_eq!(report.by_consultant.len(), 2);
        assert_eq!(report.by_consultant[0].key, "k1");

        assert_eq!(f.svc.revenue_for_staff("k1", may.from, may.to).unwrap(), 3_000);
        assert_eq!(f.svc.revenue_for_staff("t1", may.from, may.to).unwrap(), 4_000);
        assert_eq!(f.svc.revenue_for_staff("nobody", may.from, may.to).unwrap(), 0);

        assert!(matches!(
            f.svc.revenue_report(&who("t1", Role::Telesale, None), may),
            Err(ServiceError::PermissionDenied(_))
        ));
        let mine = f.svc.list_orders(&who("t1", Role::Telesale, None), &OrderQuery::default()).unwrap();
        assert_eq!(mine.total, 3);
    }
}
