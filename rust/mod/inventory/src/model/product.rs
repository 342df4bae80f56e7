use serde::{Deserialize, Serialize};

/// A stocked item: consumables, retail products, equipment parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    /// Stock keeping unit, upper-case and unique.
    pub sku: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub unit: String,
    /// Current stock. Only changed through movements.
    pub quantity: i64,
    /// Reorder threshold.
    pub min_quantity: i64,
    pub cost_price: i64,
    pub sale_price: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    pub fn is_low(&self) -> bool {
        self.quantity <= self.min_quantity
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub min_quantity: i64,
    #[serde(default)]
    pub cost_price: i64,
    #[serde(default)]
    pub sale_price: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

fn default_unit() -> String {
    "unit".to_string()
}
