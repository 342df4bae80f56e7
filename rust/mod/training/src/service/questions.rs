use tracing::info;

use clinic_core::{merge_patch, new_id, now_rfc3339, Filter, Principal, ServiceError};
use clinic_sql::Value;

use crate::model::{CreateQuestion, QuestionQuery, TrainingQuestion, MAX_OPTIONS, MIN_OPTIONS};
use crate::service::{non_blank, require_editor, TrainingService, DOCUMENTS, QUESTIONS};

const PROTECTED: [&str; 3] = ["id", "createdAt", "updatedAt"];

fn indexes(q: &TrainingQuestion) -> Vec<(&'static str, Value)> {
    vec![
        ("document_id", Value::from(q.document_id.clone())),
        ("category", Value::from(q.category.clone())),
        ("updated_at", Value::from(q.updated_at.as_str())),
    ]
}

fn normalize(q: &mut TrainingQuestion) -> Result<(), ServiceError> {
    q.question = q.question.trim().to_string();
    if q.question.is_empty() {
        return Err(ServiceError::Validation("question text is required".into()));
    }
    for option in q.options.iter_mut() {
        *option = option.trim().to_string();
    }
    if q.options.iter().any(String::is_empty) {
        return Err(ServiceError::Validation("answer options cannot be blank".into()));
    }
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&q.options.len()) {
        return Err(ServiceError::Validation(format!(
            "a question needs {MIN_OPTIONS} to {MAX_OPTIONS} options"
        )));
    }
    if q.correct_index >= q.options.len() {
        return Err(ServiceError::Validation("correct answer is not one of the options".into()));
    }
    Ok(())
}

impl TrainingService {
    fn check_document(&self, document_id: Option<&str>) -> Result<(), ServiceError> {
        if let Some(id) = document_id {
            if DOCUMENTS.find::<_, serde_json::Value>(self.sql.as_ref(), id)?.is_none() {
                return Err(ServiceError::Validation(format!("document '{id}' does not exist")));
            }
        }
        Ok(())
    }

    pub fn create_question(&self, caller: &Principal, input: CreateQuestion) -> Result<TrainingQuestion, ServiceError> {
        require_editor(caller)?;
        let now = now_rfc3339();
        let mut question = TrainingQuestion {
            id: new_id(),
            document_id: non_blank(input.document_id),
            category: non_blank(input.category),
            question: input.question,
            options: input.options,
            correct_index: input.correct_index,
            explanation: non_blank(input.explanation),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        normalize(&mut question)?;
        self.check_document(question.document_id.as_deref())?;
        let mut idx = indexes(&question);
        idx.push(("created_at", Value::from(now)));
        QUESTIONS.insert(self.sql.as_ref(), &question.id, &question, &idx)?;
        info!(question = %question.id, options = question.options.len(), "added training question");
        Ok(question)
    }

    /// Full question with its answer key. Editors only.
    pub fn get_question(&self, caller: &Principal, id: &str) -> Result<TrainingQuestion, ServiceError> {
        require_editor(caller)?;
        QUESTIONS.get(self.sql.as_ref(), id)
    }

    pub fn list_questions(
        &self,
        caller: &Principal,
        query: &QuestionQuery,
    ) -> Result<Vec<TrainingQuestion>, ServiceError> {
        require_editor(caller)?;
        let filter = Filter::new()
            .eq_opt("category", query.category.clone())
            .eq_opt("document_id", query.document_id.clone());
        QUESTIONS.select(self.sql.as_ref(), &filter, "created_at, id")
    }

    pub fn update_question(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<TrainingQuestion, ServiceError> {
        require_editor(caller)?;
        let current: TrainingQuestion = QUESTIONS.get(self.sql.as_ref(), id)?;
        let original = serde_json::to_value(&current)?;
        let mut base = original.clone();
        merge_patch(&mut base, &patch);
        for key in PROTECTED {
            base[key] = original[key].clone();
        }
        base["updatedAt"] = serde_json::json!(now_rfc3339());
        let mut updated: TrainingQuestion = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid question: {e}")))?;
        normalize(&mut updated)?;
        if updated.document_id != current.document_id {
            self.check_document(updated.document_id.as_deref())?;
        }
        QUESTIONS.update(self.sql.as_ref(), id, &updated, &indexes(&updated))?;
        Ok(updated)
    }

    pub fn delete_question(&self, caller: &Principal, id: &str) -> Result<(), ServiceError> {
        require_editor(caller)?;
        QUESTIONS.delete(self.sql.as_ref(), id)
    }
}
