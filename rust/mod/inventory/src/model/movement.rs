use serde::{Deserialize, Serialize};

clinic_core::code_enum! {
    pub enum MovementKind {
        /// Goods received.
        Import => "IMPORT",
        /// Goods used or sold.
        Export => "EXPORT",
        /// Stock count: sets the absolute quantity.
        Adjust => "ADJUST",
    }
}

/// One stock movement. Never edited after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLog {
    pub id: String,
    pub product_id: String,
    pub kind: MovementKind,
    /// Amount entered: moved for Import/Export, counted for Adjust.
    pub quantity: i64,
    /// Signed change applied to the stock.
    pub change: i64,
    /// Stock after the movement.
    pub balance: i64,
    pub staff_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMovement {
    pub product_id: String,
    pub kind: MovementKind,
    pub quantity: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub kind: Option<MovementKind>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Signed stock change for a movement, given the current stock.
///
/// Returns `None` when the movement is impossible: non-positive amounts,
/// a negative count, or an export beyond the stock on hand.
pub fn stock_change(kind: MovementKind, quantity: i64, on_hand: i64) -> Option<i64> {
    match kind {
        MovementKind::Import if quantity > 0 => Some(quantity),
        MovementKind::Export if quantity > 0 && quantity <= on_hand => Some(-quantity),
        MovementKind::Adjust if quantity >= 0 => Some(quantity - on_hand),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_rules() {
        assert_eq!(stock_change(MovementKind::Import, 5, 0), Some(5));
        assert_eq!(stock_change(MovementKind::Import, 0, 3), None);
        assert_eq!(stock_change(MovementKind::Export, 3, 3), Some(-3));
        assert_eq!(stock_change(MovementKind::Export, 4, 3), None);
        assert_eq!(stock_change(MovementKind::Adjust, 7, 10), Some(-3));
        assert_eq!(stock_change(MovementKind::Adjust, 0, 10), Some(-10));
        assert_eq!(stock_change(MovementKind::Adjust, -1, 10), None);
    }
}
