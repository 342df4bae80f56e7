use tracing::{info, warn};

use clinic_core::{
    merge_patch, new_id, now_rfc3339, Filter, ListResult, Principal, Role, ServiceError, Team,
};
use clinic_sql::Value;

use crate::model::{CreateStaff, Staff, StaffQuery};
use crate::service::{hash_password, verify_password, StaffService, STAFF};

const LOGIN_FAILED: &str = "invalid username or password";

/// Fields only an admin may change through an update.
const ADMIN_FIELDS: [&str; 3] = ["role", "team", "active"];

fn indexes(staff: &Staff) -> Vec<(&'static str, Value)> {
    vec![
        ("username", Value::from(staff.username.as_str())),
        ("name", Value::from(staff.name.as_str())),
        ("role", Value::from(staff.role.as_str())),
        ("team", Value::from(staff.team.map(|t| t.as_str()))),
        ("active", Value::from(staff.active)),
        ("created_at", Value::from(staff.created_at.as_str())),
        ("updated_at", Value::from(staff.updated_at.as_str())),
    ]
}

fn check_team(role: Role, team: Option<Team>) -> Result<(), ServiceError> {
    if team.is_some() && role != Role::Telesale {
        return Err(ServiceError::Validation(
            "team is only valid for telesale staff".into(),
        ));
    }
    Ok(())
}

impl StaffService {
    /// Create a staff account. Admin only.
    pub fn create_staff(&self, caller: &Principal, input: CreateStaff) -> Result<Staff, ServiceError> {
        caller.require(&[])?;
        let username = input.username.trim().to_lowercase();
        if username.is_empty() || username.contains(char::is_whitespace) {
            return Err(ServiceError::Validation("username must be a single word".into()));
        }
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation("name is required".into()));
        }
        check_team(input.role, input.team)?;
        let password_hash = hash_password(&input.password)?;

        let now = now_rfc3339();
        let staff = Staff {
            id: new_id(),
            username,
            name: input.name.trim().to_string(),
            role: input.role,
            team: input.team,
            phone: input.phone,
            email: input.email,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        self.insert(&staff, &password_hash)?;
        info!(staff = %staff.id, role = %staff.role, "created staff account {}", staff.username);
        Ok(staff)
    }

    fn insert(&self, staff: &Staff, password_hash: &str) -> Result<(), ServiceError> {
        let mut idx = indexes(staff);
        idx.push(("password_hash", Value::from(password_hash)));
        STAFF
            .insert(self.sql.as_ref(), &staff.id, staff, &idx)
            .map_err(|e| match e {
                ServiceError::Conflict(_) => ServiceError::Conflict(format!(
                    "username '{}' is already taken",
                    staff.username
                )),
                other => other,
            })
    }

    /// Get a staff member by id.
    pub fn get_staff(&self, id: &str) -> Result<Staff, ServiceError> {
        STAFF.get(self.sql.as_ref(), id)
    }

    /// List staff with optional role/team/active filters.
    pub fn list_staff(&self, query: &StaffQuery) -> Result<ListResult<Staff>, ServiceError> {
        let mut filter = Filter::new()
            .eq_opt("role", query.role.map(|r| r.as_str()))
            .eq_opt("team", query.team.map(|t| t.as_str()))
            .eq_opt("active", query.active);
        if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
            filter = filter.search(&["name", "username"], q);
        }
        STAFF.list(
            self.sql.as_ref(),
            &filter,
            "name, id",
            query.limit.unwrap_or(50).clamp(1, 500),
            query.offset.unwrap_or(0),
        )
    }

    /// Update with merge-patch semantics.
    ///
    /// Staff may edit their own contact details. Role, team and active flag
    /// changes are admin only. Username and password never change here.
    pub fn update_staff(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Staff, ServiceError> {
        let is_admin = caller.role == Role::Admin;
        if !is_admin && caller.staff_id != id {
            return Err(ServiceError::PermissionDenied(
                "only admins can edit other staff accounts".into(),
            ));
        }
        if !is_admin && ADMIN_FIELDS.iter().any(|f| patch.get(f).is_some()) {
            return Err(ServiceError::PermissionDenied(
                "role, team and active can only be changed by an admin".into(),
            ));
        }

        let current = self.get_staff(id)?;
        let mut base = serde_json::to_value(&current)?;
        merge_patch(&mut base, &patch);
        base["id"] = serde_json::json!(current.id);
        base["username"] = serde_json::json!(current.username);
        base["createdAt"] = serde_json::json!(current.created_at);
        base["updatedAt"] = serde_json::json!(now_rfc3339());

        let updated: Staff = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid staff record: {e}")))?;
        check_team(updated.role, updated.team)?;
        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("name is required".into()));
        }

        STAFF.update(self.sql.as_ref(), id, &updated, &indexes(&updated))?;
        Ok(updated)
    }

    /// Change a password. Staff may change their own; admins anyone's.
    pub fn set_password(&self, caller: &Principal, id: &str, password: &str) -> Result<(), ServiceError> {
        if caller.role != Role::Admin && caller.staff_id != id {
            return Err(ServiceError::PermissionDenied(
                "only admins can reset other staff passwords".into(),
            ));
        }
        let hash = hash_password(password)?;
        let affected = self.sql.exec(
            "UPDATE staff SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            &[Value::from(hash), Value::from(now_rfc3339()), Value::from(id)],
        )?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("staff member '{id}' not found")));
        }
        info!(staff = %id, "password changed");
        Ok(())
    }

    /// Disable a login. Admin only, and not on one's own account.
    pub fn deactivate_staff(&self, caller: &Principal, id: &str) -> Result<Staff, ServiceError> {
        caller.require(&[])?;
        if caller.staff_id == id {
            return Err(ServiceError::Validation("cannot deactivate your own account".into()));
        }
        let mut staff = self.get_staff(id)?;
        staff.active = false;
        staff.updated_at = now_rfc3339();
        STAFF.update(self.sql.as_ref(), id, &staff, &indexes(&staff))?;
        info!(staff = %id, "deactivated staff account");
        Ok(staff)
    }

    /// Verify login credentials.
    ///
    /// Unknown username, wrong password and disabled accounts all fail with
    /// the same message.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Staff, ServiceError> {
        let rows = self.sql.query(
            "SELECT data, password_hash, active FROM staff WHERE username = ?1",
            &[Value::from(username.trim().to_lowercase())],
        )?;
        let Some(row) = rows.first() else {
            warn!(username, "login rejected: unknown user");
            return Err(ServiceError::Unauthorized(LOGIN_FAILED.into()));
        };
        let hash = row.get_str("password_hash").unwrap_or_default();
        if !verify_password(password, hash) {
            warn!(username, "login rejected: wrong password");
            return Err(ServiceError::Unauthorized(LOGIN_FAILED.into()));
        }
        if row.get_i64("active") != Some(1) {
            warn!(username, "login rejected: account disabled");
            return Err(ServiceError::Unauthorized(LOGIN_FAILED.into()));
        }
        let data = row
            .get_str("data")
            .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
        Ok(serde_json::from_str(data)?)
    }

    /// Ids of the active telesale staff in `team`, ascending.
    pub fn team_members(&self, team: Team) -> Result<Vec<String>, ServiceError> {
        let rows = self.sql.query(
            "SELECT id FROM staff WHERE role = ?1 AND team = ?2 AND active = 1 ORDER BY id",
            &[Value::from(Role::Telesale.as_str()), Value::from(team.as_str())],
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("id").map(str::to_string))
            .collect())
    }

    /// Create the bootstrap admin account unless the username exists.
    ///
    /// Returns the new account, or `None` when nothing was created.
    pub fn ensure_admin(&self, username: &str, password_hash: &str) -> Result<Option<Staff>, ServiceError> {
        let username = username.trim().to_lowercase();
        let rows = self.sql.query(
            "SELECT id FROM staff WHERE username = ?1",
            &[Value::from(username.as_str())],
        )?;
        if !rows.is_empty() {
            return Ok(None);
        }
        let now = now_rfc3339();
        let staff = Staff {
            id: new_id(),
            username,
            name: "Administrator".into(),
            role: Role::Admin,
            team: None,
            phone: None,
            email: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        self.insert(&staff, password_hash)?;
        info!(staff = %staff.id, "created bootstrap admin {}", staff.username);
        Ok(Some(staff))
    }
}
