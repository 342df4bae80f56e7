use std::collections::BTreeMap;

use clinic_core::{today, Principal, Role, ServiceError};
use clinic_sql::Value;

use crate::model::{AppointmentStatus, Dashboard};
use crate::service::CrmService;

impl CrmService {
    /// Today's front-desk numbers.
    pub fn dashboard(&self, caller: &Principal) -> Result<Dashboard, ServiceError> {
        caller.require(&[Role::Manager, Role::Receptionist, Role::Accountant, Role::Consultant])?;
        let date = today();
        let day = [Value::from(date.to_string())];
        let db = self.sql.as_ref();

        let mut appointments: BTreeMap<String, i64> = AppointmentStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let rows = db.query(
            "SELECT status, COUNT(*) AS n FROM appointments WHERE scheduled_date = ?1 GROUP BY status",
            &day,
        )?;
        for row in &rows {
            if let (Some(status), Some(n)) = (row.get_str("status"), row.get_i64("n")) {
                appointments.insert(status.to_string(), n);
            }
        }

        let scalar = |sql: &str, params: &[Value], col: &str| -> Result<i64, ServiceError> {
            let rows = db.query(sql, params)?;
            Ok(rows.first().and_then(|r| r.get_i64(col)).unwrap_or(0))
        };
        let new_customers = scalar("SELECT COUNT(*) AS n FROM customers WHERE created_on = ?1", &day, "n")?;
        let revenue = scalar(
            "SELECT COALESCE(SUM(actual_revenue), 0) AS n FROM orders WHERE order_date = ?1",
            &day,
            "n",
        )?;
        let outstanding_debt = scalar("SELECT COALESCE(SUM(debt), 0) AS n FROM orders", &[], "n")?;

        Ok(Dashboard {
            date,
            appointments,
            new_customers,
            revenue,
            outstanding_debt,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::model::{CreateAppointment, CreateCustomer, CreateOrder, CreateService, PaymentMethod};
    use crate::service::testing::{admin, service, who};

    #[test]
    fn counts_today() {
        let (svc, _) = service();
        let c = svc
            .create_customer(&admin(), CreateCustomer { name: "Mai".into(), phone: "0912345678".into(), ..Default::default() })
            .unwrap();
        let s = svc
            .create_service(&admin(), CreateService { name: "Peel".into(), category: None, price: 1_000, duration_minutes: 30 })
            .unwrap();
        svc.create_appointment(
            &admin(),
            CreateAppointment {
                customer_id: c.id.clone(),
                service_id: Some(s.id.clone()),
                scheduled_at: Local::now().naive_local(),
                duration_minutes: None,
                assigned_to: None,
                note: None,
            },
        )
        .unwrap();
        svc.create_order(
            &admin(),
            CreateOrder {
                customer_id: c.id,
                service_id: s.id,
                appointment_id: None,
                consultant_id: None,
                order_date: None,
                total_amount: Some(5_000),
                actual_revenue: 2_000,
                payment_method: PaymentMethod::Cash,
                note: None,
            },
        )
        .unwrap();

        let d = svc.dashboard(&who("r", Role::Receptionist, None)).unwrap();
        assert_eq!(d.appointments["SCHEDULED"], 1);
        assert_eq!(d.appointments["CANCELLED"], 0);
        assert_eq!(d.new_customers, 1);
        assert_eq!(d.revenue, 2_000);
        assert_eq!(d.outstanding_debt, 3_000);

        assert!(svc.dashboard(&who("t", Role::Telesale, None)).is_err());
    }
}
