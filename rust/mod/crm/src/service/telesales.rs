use std::collections::BTreeMap;

use chrono::Local;
use tracing::debug;

use clinic_core::{new_id, now_rfc3339, transaction, Filter, ListResult, Principal, Role, ServiceError};
use clinic_sql::Value;

use crate::model::{CallLog, CallOutcome, CallQuery, CustomerStatus, DateRange, LogCall, TelesaleStats};
use crate::service::customers::{indexes, load_visible};
use crate::service::{page, ts, CrmService, CALL_LOGS, CUSTOMERS};

/// Outcomes where the customer picked up.
const CONNECTED: [CallOutcome; 4] = [
    CallOutcome::Answered,
    CallOutcome::Callback,
    CallOutcome::NotInterested,
    CallOutcome::Booked,
];

/// Customer status after a call, or `None` to leave it alone.
///
/// Converted customers never move; a lead is only pushed forward except
/// when the call shows it is dead.
pub fn follow_up(current: CustomerStatus, outcome: CallOutcome) -> Option<CustomerStatus> {
    use CustomerStatus::*;
    if current == Converted {
        return None;
    }
    let next = match outcome {
        CallOutcome::Answered if current == New => Contacted,
        CallOutcome::Callback if matches!(current, New | Contacted | Lost) => Potential,
        CallOutcome::NotInterested | CallOutcome::WrongNumber => Lost,
        CallOutcome::Booked => Booked,
        _ => return None,
    };
    (next != current).then_some(next)
}

impl CrmService {
    /// Record a call and advance the customer's status.
    pub fn log_call(&self, caller: &Principal, input: LogCall) -> Result<CallLog, ServiceError> {
        caller.require(&[Role::Manager, Role::Telesale, Role::Receptionist])?;
        if input.duration_secs < 0 {
            return Err(ServiceError::Validation("call duration cannot be negative".into()));
        }

        transaction(self.sql.as_ref(), |tx| {
            let mut customer = load_visible(tx, caller, &input.customer_id)?;

            let called_at = input.called_at.unwrap_or_else(|| Local::now().naive_local());
            let log = CallLog {
                id: new_id(),
                customer_id: customer.id.clone(),
                staff_id: caller.staff_id.clone(),
                called_at,
                outcome: input.outcome,
                duration_secs: input.duration_secs,
                note: input.note,
                callback_at: input.callback_at,
                created_at: now_rfc3339(),
            };
            CALL_LOGS.insert(
                tx,
                &log.id,
                &log,
                &[
                    ("customer_id", Value::from(log.customer_id.as_str())),
                    ("staff_id", Value::from(log.staff_id.as_str())),
                    ("called_at", Value::from(ts(&log.called_at))),
                    ("call_date", Value::from(log.called_at.date().to_string())),
                    ("outcome", Value::from(log.outcome.as_str())),
                ],
            )?;

            if let Some(next) = follow_up(customer.status, log.outcome) {
                debug!(customer = %customer.id, from = %customer.status, to = %next, "call moved customer");
                customer.status = next;
                customer.updated_at = now_rfc3339();
                CUSTOMERS.update(tx, &customer.id, &customer, &indexes(&customer))?;
            }
            Ok(log)
        })
    }

    /// List call logs. Telesales only see their own calls.
    pub fn list_calls(&self, caller: &Principal, query: &CallQuery) -> Result<ListResult<CallLog>, ServiceError> {
        let staff_id = match caller.role {
            Role::Telesale => Some(caller.staff_id.clone()),
            _ => {
                caller.require_management()?;
                query.staff_id.clone()
            }
        };
        let filter = Filter::new()
            .eq_opt("staff_id", staff_id)
            .eq_opt("customer_id", query.customer_id.clone());
        let filter = match (query.from, query.to) {
            (Some(from), Some(to)) => filter.gte("call_date", from.to_string()).lte("call_date", to.to_string()),
            (Some(from), None) => filter.gte("call_date", from.to_string()),
            (None, Some(to)) => filter.lte("call_date", to.to_string()),
            (None, None) => filter,
        };
        let (limit, offset) = page(query.limit, query.offset);
        CALL_LOGS.list(self.sql.as_ref(), &filter, "called_at DESC, id", limit, offset)
    }

    /// Calls, connections, bookings and arrivals per telesale.
    ///
    /// Covers staff who logged calls in the range. Bookings count
    /// appointments the staff member created in the range; arrivals are
    /// those that were checked in.
    pub fn telesale_report(&self, caller: &Principal, range: DateRange) -> Result<Vec<TelesaleStats>, ServiceError> {
        let only = match caller.role {
            Role::Telesale => Some(caller.staff_id.clone()),
            _ => {
                caller.require_management()?;
                None
            }
        };
        if range.from > range.to {
            return Err(ServiceError::Validation("report range starts after it ends".into()));
        }
        let bounds = [Value::from(range.from.to_string()), Value::from(range.to.to_string())];

        let connected = CONNECTED
            .iter()
            .map(|o| format!("'{}'", o.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let calls = self.sql.query(
            &format!(
                "SELECT staff_id, COUNT(*) AS calls,
                        SUM(CASE WHEN outcome IN ({connected}) THEN 1 ELSE 0 END) AS answered
                 FROM call_logs WHERE call_date >= ?1 AND call_date <= ?2
                 GROUP BY staff_id"
            ),
            &bounds,
        )?;
        let bookings = self.sql.query(
            "SELECT created_by, COUNT(*) AS booked,
                    SUM(CASE WHEN status IN ('ARRIVED', 'COMPLETED') THEN 1 ELSE 0 END) AS arrivals
             FROM appointments WHERE created_on >= ?1 AND created_on <= ?2
             GROUP BY created_by",
            &bounds,
        )?;

        let mut stats: BTreeMap<String, TelesaleStats> = BTreeMap::new();
        for row in &calls {
            let Some(staff_id) = row.get_str("staff_id") else { continue };
            if only.as_deref().is_some_and(|me| me != staff_id) {
                continue;
            }
            stats.insert(
                staff_id.to_string(),
                TelesaleStats {
                    staff_id: staff_id.to_string(),
                    calls: row.get_i64("calls").unwrap_or(0),
                    answered: row.get_i64("answered").unwrap_or(0),
                    booked: 0,
                    arrivals: 0,
                    conversion_rate: 0.0,
                },
            );
        }
        for row in &bookings {
            let Some(entry) = row.get_str("created_by").and_then(|id| stats.get_mut(id)) else {
                continue;
            };
            entry.booked = row.get_i64("booked").unwrap_or(0);
            entry.arrivals = row.get_i64("arrivals").unwrap_or(0);
        }
        for entry in stats.values_mut() {
            if entry.calls > 0 {
                entry.conversion_rate = entry.arrivals as f64 / entry.calls as f64;
            }
        }
        Ok(stats.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateAppointment, CreateCustomer};
    use crate::service::testing::{admin, service, who};
    use chrono::NaiveDate;

    #[test]
    fn status_follow_up_rules() {
        use CustomerStatus::*;
        assert_eq!(follow_up(New, CallOutcome::Answered), Some(Contacted));
        assert_eq!(follow_up(Contacted, CallOutcome::Answered), None);
        assert_eq!(follow_up(New, CallOutcome::Callback), Some(Potential));
        assert_eq!(follow_up(Contacted, CallOutcome::Callback), Some(Potential));
        assert_eq!(follow_up(Booked, CallOutcome::Callback), None);
        assert_eq!(follow_up(Potential, CallOutcome::NotInterested), Some(Lost));
        assert_eq!(follow_up(New, CallOutcome::WrongNumber), Some(Lost));
        assert_eq!(follow_up(Potential, CallOutcome::Booked), Some(Booked));
        assert_eq!(follow_up(New, CallOutcome::NoAnswer), None);
        assert_eq!(follow_up(Converted, CallOutcome::NotInterested), None);
        assert_eq!(follow_up(Converted, CallOutcome::Booked), None);
    }

    #[test]
    fn logging_a_call_updates_customer() {
        let (svc, _) = service();
        let t1 = who("t1", Role::Telesale, None);
        let c = svc
            .create_customer(&t1, CreateCustomer { name: "Mai".into(), phone: "0912345678".into(), ..Default::default() })
            .unwrap();

        svc.log_call(
            &t1,
            LogCall {
                customer_id: c.id.clone(),
                outcome: CallOutcome::Answered,
                called_at: None,
                duration_secs: 90,
                note: None,
                callback_at: None,
            },
        )
        .unwrap();
        assert_eq!(svc.get_customer(&t1, &c.id).unwrap().status, CustomerStatus::Contacted);

        // Another telesale cannot see the customer.
        let err = svc
            .log_call(
                &who("t2", Role::Telesale, None),
                LogCall {
                    customer_id: c.id.clone(),
                    outcome: CallOutcome::Busy,
                    called_at: None,
                    duration_secs: 0,
                    note: None,
                    callback_at: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let mine = svc.list_calls(&t1, &CallQuery::default()).unwrap();
        assert_eq!(mine.total, 1);
        assert!(matches!(
            svc.list_calls(&who("c", Role::Consultant, None), &CallQuery::default()),
            Err(ServiceError::PermissionDenied(_))
        ));
    }

    #[test]
    fn report_counts_calls_and_arrivals() {
        let (svc, _) = service();
        let t1 = who("t1", Role::Telesale, None);
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let at = day.and_hms_opt(10, 0, 0).unwrap();

        let c = svc
            .create_customer(&t1, CreateCustomer { name: "Mai".into(), phone: "0912345678".into(), ..Default::default() })
            .unwrap();
        for outcome in [CallOutcome::NoAnswer, CallOutcome::Answered, CallOutcome::Booked, CallOutcome::Busy] {
            svc.log_call(
                &t1,
                LogCall {
                    customer_id: c.id.clone(),
                    outcome,
                    called_at: Some(at),
                    duration_secs: 30,
                    note: None,
                    callback_at: None,
                },
            )
            .unwrap();
        }
        let appt = svc
            .create_appointment(
                &t1,
                CreateAppointment {
                    customer_id: c.id.clone(),
                    service_id: None,
                    scheduled_at: at,
                    duration_minutes: None,
                    assigned_to: None,
                    note: None,
                },
            )
            .unwrap();
        svc.check_in(&admin(), &appt.id).unwrap();

        let today = clinic_core::today();
        let range = DateRange { from: day, to: today.max(day) };
        let report = svc.telesale_report(&admin(), range).unwrap();
        assert_eq!(report.len(), 1);
        let row = &report[0];
        assert_eq!(row.calls, 4);
        assert_eq!(row.answered, 2);
        assert_eq!(row.booked, 1);
        assert_eq!(row.arrivals, 1);
        assert!((row.conversion_rate - 0.25).abs() < 1e-9);

        let own = svc.telesale_report(&who("t2", Role::Telesale, None), range).unwrap();
        assert!(own.is_empty());
    }
}
