pub mod schema;
mod documents;
mod questions;
mod quiz;

use std::sync::Arc;

use clinic_core::{Principal, Role, ServiceError, Table};
use clinic_sql::SQLStore;

pub(crate) const DOCUMENTS: Table = Table::new("training_documents", "document");
pub(crate) const QUESTIONS: Table = Table::new("training_questions", "question");
pub(crate) const QUIZZES: Table = Table::new("training_quizzes", "quiz");
pub(crate) const ATTEMPTS: Table = Table::new("training_attempts", "quiz attempt");

/// Roles that write documents and questions.
const EDITORS: [Role; 2] = [Role::Manager, Role::Hr];

/// Product documents, question bank and quizzes.
pub struct TrainingService {
    pub(crate) sql: Arc<dyn SQLStore>,
}

impl TrainingService {
    /// Create the service, initializing the schema.
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Arc<Self>, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql }))
    }
}

pub(crate) fn require_editor(caller: &Principal) -> Result<(), ServiceError> {
    caller.require(&EDITORS)
}

pub(crate) fn is_editor(caller: &Principal) -> bool {
    require_editor(caller).is_ok()
}

pub(crate) fn page(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
    (limit.unwrap_or(50).clamp(1, 500), offset.unwrap_or(0))
}

/// Trimmed text, `None` when blank.
pub(crate) fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use clinic_core::{Principal, Role};
    use clinic_sql::SqliteStore;

    use super::TrainingService;

    pub fn service() -> Arc<TrainingService> {
        TrainingService::new(Arc::new(SqliteStore::open_in_memory().unwrap())).unwrap()
    }

    pub fn who(id: &str, role: Role) -> Principal {
        Principal {
            staff_id: id.into(),
            name: id.to_uppercase(),
            role,
            team: None,
        }
    }

    pub fn hr() -> Principal {
        who("hr1", Role::Hr)
    }
}
