use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

clinic_core::code_enum! {
    pub enum PaymentMethod {
        Cash => "CASH",
        Transfer => "TRANSFER",
        Card => "CARD",
        Installment => "INSTALLMENT",
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Cash
    }
}

/// A treatment or product the clinic sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// List price, VND.
    pub price: i64,
    pub duration_minutes: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateService {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub price: i64,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
}

/// A sale. `debt` and `is_paid` are derived from the amounts on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telesale_id: Option<String>,
    pub order_date: NaiveDate,
    /// Agreed price, VND.
    pub total_amount: i64,
    /// Money actually collected so far, VND.
    pub actual_revenue: i64,
    pub debt: i64,
    pub is_paid: bool,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    /// Re-derive total, debt and paid flag from the amounts.
    ///
    /// A zero total means "not agreed separately" and takes the collected
    /// amount.
    pub fn apply_financials(&mut self) {
        if self.total_amount == 0 {
            self.total_amount = self.actual_revenue;
        }
        self.debt = (self.total_amount - self.actual_revenue).max(0);
        self.is_paid = self.debt == 0;
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub customer_id: String,
    pub service_id: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub consultant_id: Option<String>,
    /// Defaults to today.
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_amount: Option<i64>,
    #[serde(default)]
    pub actual_revenue: i64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of a debt payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PayDebt {
    pub amount: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Revenue grouped by one key (service or consultant).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueLine {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub orders: i64,
    pub total_amount: i64,
    pub actual_revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub orders: i64,
    pub total_amount: i64,
    pub actual_revenue: i64,
    pub outstanding_debt: i64,
    pub by_service: Vec<RevenueLine>,
    pub by_consultant: Vec<RevenueLine>,
}

/// Front-desk overview for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub date: NaiveDate,
    /// Status code → count of today's appointments.
    pub appointments: std::collections::BTreeMap<String, i64>,
    pub new_customers: i64,
    pub revenue: i64,
    pub outstanding_debt: i64,
}

fn default_true() -> bool {
    true
}

fn default_duration() -> i64 {
    60
}
