use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use clinic_core::{new_id, now_rfc3339, Filter, ListResult, Principal, Role, ServiceError};
use clinic_sql::{Executor, Value};

use crate::model::{Attendance, AttendanceCounts, AttendanceQuery, AttendanceStatus, MarkAttendance};
use crate::service::{page, HrConfig, HrService, ATTENDANCE};

/// Worked hours below which a day only counts half.
const HALF_DAY_HOURS: i64 = 4;

fn indexes(a: &Attendance) -> Vec<(&'static str, Value)> {
    vec![
        ("staff_id", Value::from(a.staff_id.as_str())),
        ("work_date", Value::from(a.work_date.to_string())),
        ("status", Value::from(a.status.as_str())),
        ("updated_at", Value::from(a.updated_at.as_str())),
    ]
}

/// Present or Late, depending on the check-in time.
pub fn arrival_status(config: &HrConfig, at: NaiveDateTime) -> AttendanceStatus {
    let deadline = at.date().and_time(config.shift_start) + Duration::minutes(config.late_grace_minutes);
    if at > deadline {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

fn find_day<E: Executor + ?Sized>(
    db: &E,
    staff_id: &str,
    date: NaiveDate,
) -> Result<Option<Attendance>, ServiceError> {
    let found: Vec<Attendance> = ATTENDANCE.select(
        db,
        &Filter::new().eq("staff_id", staff_id).eq("work_date", date.to_string()),
        "id",
    )?;
    Ok(found.into_iter().next())
}

/// Day counts per status for one staff member in `[from, to]`.
pub(crate) fn count_days<E: Executor + ?Sized>(
    db: &E,
    staff_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<AttendanceCounts, ServiceError> {
    let rows = db.query(
        "SELECT status, COUNT(*) AS n FROM hr_attendance
         WHERE staff_id = ?1 AND work_date >= ?2 AND work_date <= ?3
         GROUP BY status",
        &[
            Value::from(staff_id),
            Value::from(from.to_string()),
            Value::from(to.to_string()),
        ],
    )?;
    let mut counts = AttendanceCounts::default();
    for row in &rows {
        let status = row.get_str("status").and_then(AttendanceStatus::from_str);
        if let (Some(status), Some(n)) = (status, row.get_i64("n")) {
            counts.add(status, n);
        }
    }
    Ok(counts)
}

impl HrService {
    /// Start the caller's working day on the server clock. Corrections go
    /// through `mark_attendance`.
    pub fn check_in(&self, caller: &Principal) -> Result<Attendance, ServiceError> {
        self.check_in_at(caller, Local::now().naive_local())
    }

    pub(crate) fn check_in_at(&self, caller: &Principal, at: NaiveDateTime) -> Result<Attendance, ServiceError> {
        let date = at.date();
        let status = arrival_status(&self.config, at);
        let now = now_rfc3339();
        let db = self.sql.as_ref();

        let record = match find_day(db, &caller.staff_id, date)? {
            Some(existing) if existing.check_in.is_some() => {
                return Err(ServiceError::Conflict(format!("already checked in on {date}")));
            }
            Some(existing) if existing.status == AttendanceStatus::Leave => {
                return Err(ServiceError::Validation(format!("{date} is recorded as leave")));
            }
            Some(mut existing) => {
                existing.check_in = Some(at);
                existing.status = status;
                existing.updated_at = now;
                ATTENDANCE.update(db, &existing.id, &existing, &indexes(&existing))?;
                existing
            }
            None => {
                let record = Attendance {
                    id: new_id(),
                    staff_id: caller.staff_id.clone(),
                    work_date: date,
                    check_in: Some(at),
                    check_out: None,
                    status,
                    note: None,
                    created_at: now.clone(),
                    updated_at: now,
                };
                ATTENDANCE.insert(db, &record.id, &record, &indexes(&record))?;
                record
            }
        };
        debug!(staff = %caller.staff_id, %date, status = %record.status, "checked in");
        Ok(record)
    }

    /// End the caller's working day on the server clock. Short days become
    /// half days.
    pub fn check_out(&self, caller: &Principal) -> Result<Attendance, ServiceError> {
        self.check_out_at(caller, Local::now().naive_local())
    }

    pub(crate) fn check_out_at(&self, caller: &Principal, at: NaiveDateTime) -> Result<Attendance, ServiceError> {
        let date = at.date();
        let db = self.sql.as_ref();

        let mut record = find_day(db, &caller.staff_id, date)?
            .ok_or_else(|| ServiceError::Validation(format!("no check-in on {date}")))?;
        let Some(started) = record.check_in else {
            return Err(ServiceError::Validation(format!("no check-in on {date}")));
        };
        if record.check_out.is_some() {
            return Err(ServiceError::Conflict(format!("already checked out on {date}")));
        }
        if at <= started {
            return Err(ServiceError::Validation("check-out must be after check-in".into()));
        }

        record.check_out = Some(at);
        if at - started < Duration::hours(HALF_DAY_HOURS)
            && matches!(record.status, AttendanceStatus::Present | AttendanceStatus::Late)
        {
            record.status = AttendanceStatus::HalfDay;
        }
        record.updated_at = now_rfc3339();
        ATTENDANCE.update(db, &record.id, &record, &indexes(&record))?;
        debug!(staff = %caller.staff_id, %date, status = %record.status, "checked out");
        Ok(record)
    }

    /// Set a day's status by hand, creating the record when missing.
    pub fn mark_attendance(&self, caller: &Principal, input: MarkAttendance) -> Result<Attendance, ServiceError> {
        caller.require(&[Role::Hr])?;
        let db = self.sql.as_ref();
        let now = now_rfc3339();
        let record = match find_day(db, &input.staff_id, input.work_date)? {
            Some(mut existing) => {
                existing.status = input.status;
                if input.note.is_some() {
                    existing.note = input.note;
                }
                existing.updated_at = now;
                ATTENDANCE.update(db, &existing.id, &existing, &indexes(&existing))?;
                existing
            }
            None => {
                let record = Attendance {
                    id: new_id(),
                    staff_id: input.staff_id,
                    work_date: input.work_date,
                    check_in: None,
                    check_out: None,
                    status: input.status,
                    note: input.note,
                    created_at: now.clone(),
                    updated_at: now,
                };
                ATTENDANCE.insert(db, &record.id, &record, &indexes(&record))?;
                record
            }
        };
        info!(staff = %record.staff_id, date = %record.work_date, status = %record.status, by = %caller.staff_id, "attendance marked");
        Ok(record)
    }

    /// HR and managers see everyone; staff see their own days.
    pub fn list_attendance(
        &self,
        caller: &Principal,
        query: &AttendanceQuery,
    ) -> Result<ListResult<Attendance>, ServiceError> {
        let staff_id = if caller.require(&[Role::Hr, Role::Manager]).is_ok() {
            query.staff_id.clone()
        } else {
            Some(caller.staff_id.clone())
        };
        let mut filter = Filter::new().eq_opt("staff_id", staff_id);
        if let Some(from) = query.from {
            filter = filter.gte("work_date", from.to_string());
        }
        if let Some(to) = query.to {
            filter = filter.lte("work_date", to.to_string());
        }
        let (limit, offset) = page(query.limit, query.offset);
        ATTENDANCE.list(self.sql.as_ref(), &filter, "work_date DESC, staff_id", limit, offset)
    }

    /// Day counts per status for a staff member over a period.
    pub fn attendance_summary(
        &self,
        caller: &Principal,
        staff_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<AttendanceCounts, ServiceError> {
        if staff_id != caller.staff_id {
            caller.require(&[Role::Hr, Role::Manager, Role::Accountant])?;
        }
        count_days(self.sql.as_ref(), staff_id, from, to)
    }
}
