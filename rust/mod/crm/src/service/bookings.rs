use chrono::Local;
use tracing::info;

use clinic_core::{
    merge_patch, new_id, now_rfc3339, today, transaction, Filter, ListResult, Principal, Role,
    ServiceError,
};
use clinic_sql::{Executor, Value};

use crate::model::{
    slot_end, Appointment, AppointmentQuery, AppointmentStatus, CalendarEvent,
    CalendarWindow, CreateAppointment, CustomerStatus, DEFAULT_DURATION_MINUTES,
};
use crate::service::customers::{indexes as customer_indexes, load_visible};
use crate::service::sales::active_service;
use crate::service::{page, ts, CrmService, APPOINTMENTS, CUSTOMERS};

const BOOKING_ROLES: [Role; 4] = [Role::Manager, Role::Telesale, Role::Receptionist, Role::Consultant];
const VIEW_ROLES: [Role; 6] = [
    Role::Manager,
    Role::Telesale,
    Role::Receptionist,
    Role::Consultant,
    Role::Technician,
    Role::Accountant,
];

/// Keys an appointment edit never changes.
const PROTECTED: [&str; 6] = ["id", "customerId", "status", "createdBy", "checkedInAt", "createdAt"];

/// A status change requested on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirm,
    CheckIn,
    Complete,
    Cancel,
    NoShow,
}

impl Transition {
    pub fn target(&self) -> AppointmentStatus {
        match self {
            Self::Confirm => AppointmentStatus::Confirmed,
            Self::CheckIn => AppointmentStatus::Arrived,
            Self::Complete => AppointmentStatus::Completed,
            Self::Cancel => AppointmentStatus::Cancelled,
            Self::NoShow => AppointmentStatus::NoShow,
        }
    }

    pub fn allowed_from(&self, current: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match self {
            Self::Confirm => current == Scheduled,
            Self::CheckIn | Self::NoShow => matches!(current, Scheduled | Confirmed),
            Self::Complete => current == Arrived,
            Self::Cancel => matches!(current, Scheduled | Confirmed),
        }
    }

    fn roles(&self) -> &'static [Role] {
        match self {
            Self::Confirm | Self::Cancel => &[Role::Manager, Role::Telesale, Role::Receptionist],
            Self::CheckIn | Self::NoShow => &[Role::Manager, Role::Receptionist],
            Self::Complete => &[Role::Manager, Role::Receptionist, Role::Consultant, Role::Technician],
        }
    }
}

fn indexes(a: &Appointment) -> Vec<(&'static str, Value)> {
    vec![
        ("customer_id", Value::from(a.customer_id.as_str())),
        ("service_id", Value::from(a.service_id.clone())),
        ("scheduled_at", Value::from(ts(&a.scheduled_at))),
        ("ends_at", Value::from(ts(&a.ends_at()))),
        ("scheduled_date", Value::from(a.scheduled_at.date().to_string())),
        ("status", Value::from(a.status.as_str())),
        ("created_by", Value::from(a.created_by.as_str())),
        ("updated_at", Value::from(a.updated_at.as_str())),
    ]
}

/// Telesales work with the appointments they booked; other roles see all.
fn view_filter(caller: &Principal) -> Result<Filter, ServiceError> {
    caller.require(&VIEW_ROLES)?;
    Ok(match caller.role {
        Role::Telesale => Filter::new().eq("created_by", caller.staff_id.as_str()),
        _ => Filter::new(),
    })
}

impl CrmService {
    /// Book an appointment and mark the customer as booked.
    pub fn create_appointment(
        &self,
        caller: &Principal,
        input: CreateAppointment,
    ) -> Result<Appointment, ServiceError> {
        caller.require(&BOOKING_ROLES)?;
        if let Some(minutes) = input.duration_minutes {
            slot_end(input.scheduled_at, minutes)?;
        }

        transaction(self.sql.as_ref(), |tx| {
            let mut customer = load_visible(tx, caller, &input.customer_id)?;
            let service = match input.service_id.as_deref() {
                Some(id) => Some(active_service(tx, id)?),
                None => None,
            };
            let duration = input
                .duration_minutes
                .or_else(|| service.as_ref().map(|s| s.duration_minutes))
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_DURATION_MINUTES);
            slot_end(input.scheduled_at, duration)?;

            let now = now_rfc3339();
            let appt = Appointment {
                id: new_id(),
                customer_id: customer.id.clone(),
                service_id: service.map(|s| s.id),
                scheduled_at: input.scheduled_at,
                duration_minutes: duration,
                status: AppointmentStatus::Scheduled,
                created_by: caller.staff_id.clone(),
                assigned_to: input.assigned_to,
                note: input.note,
                checked_in_at: None,
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            let mut idx = indexes(&appt);
            idx.push(("created_on", Value::from(today().to_string())));
            idx.push(("created_at", Value::from(now)));
            APPOINTMENTS.insert(tx, &appt.id, &appt, &idx)?;

            if !matches!(customer.status, CustomerStatus::Converted | CustomerStatus::Booked) {
                customer.status = CustomerStatus::Booked;
                customer.updated_at = now_rfc3339();
                CUSTOMERS.update(tx, &customer.id, &customer, &customer_indexes(&customer))?;
            }
            info!(appointment = %appt.id, customer = %appt.customer_id, at = %appt.scheduled_at, "booked appointment");
            Ok(appt)
        })
    }

    pub fn get_appointment(&self, caller: &Principal, id: &str) -> Result<Appointment, ServiceError> {
        view_filter(caller)?;
        let appt: Appointment = APPOINTMENTS.get(self.sql.as_ref(), id)?;
        if caller.role == Role::Telesale && appt.created_by != caller.staff_id {
            return Err(ServiceError::NotFound(format!("appointment '{id}' not found")));
        }
        Ok(appt)
    }

    /// List appointments by date range, status or customer.
    pub fn list_appointments(
        &self,
        caller: &Principal,
        query: &AppointmentQuery,
    ) -> Result<ListResult<Appointment>, ServiceError> {
        let mut filter = view_filter(caller)?
            .eq_opt("status", query.status.map(|s| s.as_str()))
            .eq_opt("customer_id", query.customer_id.clone());
        if let Some(from) = query.from {
            filter = filter.gte("scheduled_date", from.to_string());
        }
        if let Some(to) = query.to {
            filter = filter.lte("scheduled_date", to.to_string());
        }
        let (limit, offset) = page(query.limit, query.offset);
        APPOINTMENTS.list(self.sql.as_ref(), &filter, "scheduled_at, id", limit, offset)
    }

    /// Reschedule or reassign an appointment that has not happened yet.
    pub fn update_appointment(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Appointment, ServiceError> {
        caller.require(&BOOKING_ROLES)?;
        transaction(self.sql.as_ref(), |tx| {
            let current = self.get_appointment_in(tx, caller, id)?;
            if !matches!(current.status, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed) {
                return Err(ServiceError::Validation(format!(
                    "a {} appointment can no longer be changed",
                    current.status
                )));
            }
            let original = serde_json::to_value(&current)?;
            let mut base = original.clone();
            merge_patch(&mut base, &patch);
            for key in PROTECTED {
                base[key] = original[key].clone();
            }
            base["updatedAt"] = serde_json::json!(now_rfc3339());
            let updated: Appointment = serde_json::from_value(base)
                .map_err(|e| ServiceError::Validation(format!("invalid appointment: {e}")))?;

            slot_end(updated.scheduled_at, updated.duration_minutes)?;
            if updated.service_id != current.service_id {
                if let Some(service_id) = updated.service_id.as_deref() {
                    active_service(tx, service_id)?;
                }
            }
            APPOINTMENTS.update(tx, id, &updated, &indexes(&updated))?;
            Ok(updated)
        })
    }

    fn get_appointment_in(&self, tx: &dyn Executor, caller: &Principal, id: &str) -> Result<Appointment, ServiceError> {
        let appt: Appointment = APPOINTMENTS.get(tx, id)?;
        if caller.role == Role::Telesale && appt.created_by != caller.staff_id {
            return Err(ServiceError::NotFound(format!("appointment '{id}' not found")));
        }
        Ok(appt)
    }

    /// Apply a status change, checking role and source status.
    pub fn transition_appointment(
        &self,
        caller: &Principal,
        id: &str,
        transition: Transition,
    ) -> Result<Appointment, ServiceError> {
        caller.require(transition.roles())?;
        transaction(self.sql.as_ref(), |tx| {
            let mut appt = self.get_appointment_in(tx, caller, id)?;
            if !transition.allowed_from(appt.status) {
                return Err(ServiceError::Validation(format!(
                    "cannot move appointment from {} to {}",
                    appt.status,
                    transition.target()
                )));
            }
            appt.status = transition.target();
            if transition == Transition::CheckIn {
                appt.checked_in_at = Some(Local::now().naive_local());
            }
            appt.updated_at = now_rfc3339();
            APPOINTMENTS.update(tx, id, &appt, &indexes(&appt))?;
            info!(appointment = %id, status = %appt.status, by = %caller.staff_id, "appointment status changed");
            Ok(appt)
        })
    }

    pub fn confirm_appointment(&self, caller: &Principal, id: &str) -> Result<Appointment, ServiceError> {
        self.transition_appointment(caller, id, Transition::Confirm)
    }

    /// Front-desk check-in: the customer has arrived.
    pub fn check_in(&self, caller: &Principal, id: &str) -> Result<Appointment, ServiceError> {
        self.transition_appointment(caller, id, Transition::CheckIn)
    }

    pub fn complete_appointment(&self, caller: &Principal, id: &str) -> Result<Appointment, ServiceError> {
        self.transition_appointment(caller, id, Transition::Complete)
    }

    pub fn cancel_appointment(&self, caller: &Principal, id: &str) -> Result<Appointment, ServiceError> {
        self.transition_appointment(caller, id, Transition::Cancel)
    }

    pub fn mark_no_show(&self, caller: &Principal, id: &str) -> Result<Appointment, ServiceError> {
        self.transition_appointment(caller, id, Transition::NoShow)
    }

    /// Appointments overlapping `[start, end)` as calendar events.
    pub fn calendar(&self, caller: &Principal, window: CalendarWindow) -> Result<Vec<CalendarEvent>, ServiceError> {
        view_filter(caller)?;
        if window.end <= window.start {
            return Err(ServiceError::Validation("calendar window is empty".into()));
        }
        let mut sql = String::from(
            "SELECT a.data AS data, c.name AS customer_name, s.name AS service_name
             FROM appointments a
             JOIN customers c ON c.id = a.customer_id
             LEFT JOIN services s ON s.id = a.service_id
             WHERE a.scheduled_at < ?1 AND a.ends_at > ?2",
        );
        let mut params = vec![Value::from(ts(&window.end)), Value::from(ts(&window.start))];
        if caller.role == Role::Telesale {
            sql.push_str(" AND a.created_by = ?3");
            params.push(Value::from(caller.staff_id.as_str()));
        }
        sql.push_str(" ORDER BY a.scheduled_at, a.id");

        let rows = self.sql.query(&sql, &params)?;
        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
            let appt: Appointment = serde_json::from_str(data)?;
            let customer = row.get_str("customer_name").unwrap_or_default();
            let title = match row.get_str("service_name") {
                Some(service) => format!("{customer} - {service}"),
                None => customer.to_string(),
            };
            events.push(CalendarEvent {
                end: appt.ends_at(),
                color: appt.status.color(),
                id: appt.id,
                title,
                start: appt.scheduled_at,
                status: appt.status,
                customer_id: appt.customer_id,
            });
        }
        Ok(events)
    }
}
