use tracing::info;

use clinic_core::{merge_patch, new_id, now_rfc3339, Filter, ListResult, Principal, ServiceError};
use clinic_sql::Value;

use crate::model::{CreateDocument, DocumentQuery, ProductDocument};
use crate::service::{is_editor, non_blank, page, require_editor, TrainingService, DOCUMENTS};

const PROTECTED: [&str; 4] = ["id", "createdBy", "createdAt", "updatedAt"];

fn indexes(d: &ProductDocument) -> Vec<(&'static str, Value)> {
    vec![
        ("title", Value::from(d.title.as_str())),
        ("category", Value::from(d.category.clone())),
        ("published", Value::from(d.published)),
        ("updated_at", Value::from(d.updated_at.as_str())),
    ]
}

fn validate(d: &ProductDocument) -> Result<(), ServiceError> {
    if d.title.trim().is_empty() {
        return Err(ServiceError::Validation("document title is required".into()));
    }
    if let Some(url) = &d.attachment_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ServiceError::Validation("attachment must be an http(s) url".into()));
        }
    }
    Ok(())
}

impl TrainingService {
    pub fn create_document(&self, caller: &Principal, input: CreateDocument) -> Result<ProductDocument, ServiceError> {
        require_editor(caller)?;
        let now = now_rfc3339();
        let doc = ProductDocument {
            id: new_id(),
            title: input.title.trim().to_string(),
            category: non_blank(input.category),
            content: input.content,
            attachment_url: non_blank(input.attachment_url),
            published: input.published,
            created_by: caller.staff_id.clone(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        validate(&doc)?;
        let mut idx = indexes(&doc);
        idx.push(("created_at", Value::from(now)));
        DOCUMENTS.insert(self.sql.as_ref(), &doc.id, &doc, &idx)?;
        info!(document = %doc.id, published = doc.published, "created training document");
        Ok(doc)
    }

    /// Drafts read as not found for non-editors.
    pub fn get_document(&self, caller: &Principal, id: &str) -> Result<ProductDocument, ServiceError> {
        let doc: ProductDocument = DOCUMENTS.get(self.sql.as_ref(), id)?;
        if !doc.published && !is_editor(caller) {
            return Err(ServiceError::NotFound(format!("document '{id}' not found")));
        }
        Ok(doc)
    }

    pub fn list_documents(
        &self,
        caller: &Principal,
        query: &DocumentQuery,
    ) -> Result<ListResult<ProductDocument>, ServiceError> {
        let mut filter = Filter::new().eq_opt("category", query.category.clone());
        if !is_editor(caller) {
            filter = filter.eq("published", true);
        }
        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            filter = filter.search(&["title", "category"], q);
        }
        let (limit, offset) = page(query.limit, query.offset);
        DOCUMENTS.list(self.sql.as_ref(), &filter, "title", limit, offset)
    }

    pub fn update_document(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<ProductDocument, ServiceError> {
        require_editor(caller)?;
        let current: ProductDocument = DOCUMENTS.get(self.sql.as_ref(), id)?;
        let original = serde_json::to_value(&current)?;
        let mut base = original.clone();
        merge_patch(&mut base, &patch);
        for key in PROTECTED {
            base[key] = original[key].clone();
        }
        base["updatedAt"] = serde_json::json!(now_rfc3339());
        let updated: ProductDocument = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid document: {e}")))?;
        validate(&updated)?;
        DOCUMENTS.update(self.sql.as_ref(), id, &updated, &indexes(&updated))?;
        Ok(updated)
    }

    /// Questions linked to the document keep their text and lose the link.
    pub fn delete_document(&self, caller: &Principal, id: &str) -> Result<(), ServiceError> {
        require_editor(caller)?;
        DOCUMENTS.delete(self.sql.as_ref(), id)?;
        info!(document = %id, by = %caller.staff_id, "deleted training document");
        Ok(())
    }
}
