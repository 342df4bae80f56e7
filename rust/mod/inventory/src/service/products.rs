use tracing::info;

use clinic_core::{merge_patch, new_id, now_rfc3339, Filter, ListResult, Principal, ServiceError};
use clinic_sql::Value;

use crate::model::{CreateProduct, Product, ProductQuery};
use crate::service::{page, require_writer, InventoryService, PRODUCTS};

/// Keys a product edit never changes. Quantity moves only through logs.
const PROTECTED: [&str; 4] = ["id", "quantity", "createdAt", "updatedAt"];

pub(crate) fn indexes(p: &Product) -> Vec<(&'static str, Value)> {
    vec![
        ("sku", Value::from(p.sku.as_str())),
        ("name", Value::from(p.name.as_str())),
        ("category", Value::from(p.category.clone())),
        ("quantity", Value::from(p.quantity)),
        ("min_quantity", Value::from(p.min_quantity)),
        ("active", Value::from(p.active)),
        ("updated_at", Value::from(p.updated_at.as_str())),
    ]
}

fn validate(p: &Product) -> Result<(), ServiceError> {
    if p.sku.is_empty() || p.name.trim().is_empty() {
        return Err(ServiceError::Validation("sku and name are required".into()));
    }
    if p.min_quantity < 0 || p.cost_price < 0 || p.sale_price < 0 {
        return Err(ServiceError::Validation("quantities and prices cannot be negative".into()));
    }
    Ok(())
}

impl InventoryService {
    pub fn create_product(&self, caller: &Principal, input: CreateProduct) -> Result<Product, ServiceError> {
        require_writer(caller)?;
        let now = now_rfc3339();
        let product = Product {
            id: new_id(),
            sku: input.sku.trim().to_uppercase(),
            name: input.name.trim().to_string(),
            category: input.category.filter(|c| !c.trim().is_empty()),
            unit: input.unit,
            quantity: 0,
            min_quantity: input.min_quantity,
            cost_price: input.cost_price,
            sale_price: input.sale_price,
            active: true,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        validate(&product)?;
        let mut idx = indexes(&product);
        idx.push(("created_at", Value::from(now)));
        PRODUCTS
            .insert(self.sql.as_ref(), &product.id, &product, &idx)
            .map_err(|e| match e {
                ServiceError::Conflict(_) => ServiceError::Conflict(format!("sku {} already exists", product.sku)),
                other => other,
            })?;
        info!(product = %product.id, sku = %product.sku, "created product");
        Ok(product)
    }

    pub fn get_product(&self, id: &str) -> Result<Product, ServiceError> {
        PRODUCTS.get(self.sql.as_ref(), id)
    }

    pub fn list_products(&self, query: &ProductQuery) -> Result<ListResult<Product>, ServiceError> {
        let mut filter = Filter::new()
            .eq_opt("category", query.category.clone())
            .eq_opt("active", query.active);
        if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
            filter = filter.search(&["sku", "name"], q.trim());
        }
        let (limit, offset) = page(query.limit, query.offset);
        PRODUCTS.list(self.sql.as_ref(), &filter, "name, sku", limit, offset)
    }

    /// Edit catalogue fields. Stock changes go through movements.
    pub fn update_product(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Product, ServiceError> {
        require_writer(caller)?;
        let current: Product = PRODUCTS.get(self.sql.as_ref(), id)?;
        let original = serde_json::to_value(&current)?;
        let mut base = original.clone();
        merge_patch(&mut base, &patch);
        for key in PROTECTED {
            base[key] = original[key].clone();
        }
        base["updatedAt"] = serde_json::json!(now_rfc3339());
        let mut updated: Product = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid product: {e}")))?;
        updated.sku = updated.sku.trim().to_uppercase();
        validate(&updated)?;
        PRODUCTS.update(self.sql.as_ref(), id, &updated, &indexes(&updated))?;
        Ok(updated)
    }

    /// Active products at or below their reorder threshold, emptiest first.
    pub fn low_stock(&self) -> Result<Vec<Product>, ServiceError> {
        let filter = Filter::new()
            .eq("active", true)
            .raw("quantity <= min_quantity".to_string(), Vec::new());
        PRODUCTS.select(self.sql.as_ref(), &filter, "quantity - min_quantity, name")
    }
}
