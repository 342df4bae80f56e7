use tracing::{info, warn};

use clinic_core::{new_id, now_rfc3339, transaction, Filter, ListResult, Principal, ServiceError};
use clinic_sql::Value;

use crate::model::{stock_change, InventoryLog, LogQuery, MovementKind, Product, RecordMovement};
use crate::service::products::indexes as product_indexes;
use crate::service::{page, require_writer, InventoryService, LOGS, PRODUCTS};

impl InventoryService {
    /// Apply a stock movement and write its log in one transaction.
    pub fn record_movement(&self, caller: &Principal, input: RecordMovement) -> Result<InventoryLog, ServiceError> {
        require_writer(caller)?;
        transaction(self.sql.as_ref(), |tx| {
            let mut product: Product = PRODUCTS.get(tx, &input.product_id)?;
            if !product.active && input.kind != MovementKind::Adjust {
                return Err(ServiceError::Validation(format!("product {} is inactive", product.sku)));
            }
            let change = stock_change(input.kind, input.quantity, product.quantity).ok_or_else(|| {
                if input.kind == MovementKind::Export && input.quantity > product.quantity {
                    warn!(sku = %product.sku, on_hand = product.quantity, wanted = input.quantity, "export beyond stock");
                    ServiceError::Validation(format!(
                        "insufficient stock for {}: {} on hand, {} requested",
                        product.sku, product.quantity, input.quantity
                    ))
                } else {
                    ServiceError::Validation(format!("invalid {} quantity {}", input.kind, input.quantity))
                }
            })?;

            product.quantity = product.quantity.checked_add(change).ok_or_else(|| {
                ServiceError::Validation(format!("stock of {} would exceed the supported maximum", product.sku))
            })?;
            let now = now_rfc3339();
            product.updated_at = now.clone();
            PRODUCTS.update(tx, &product.id, &product, &product_indexes(&product))?;

            let log = InventoryLog {
                id: new_id(),
                product_id: product.id.clone(),
                kind: input.kind,
                quantity: input.quantity,
                change,
                balance: product.quantity,
                staff_id: caller.staff_id.clone(),
                note: input.note.clone(),
                created_at: now,
            };
            LOGS.insert(
                tx,
                &log.id,
                &log,
                &[
                    ("product_id", Value::from(log.product_id.as_str())),
                    ("kind", Value::from(log.kind.as_str())),
                    ("created_at", Value::from(log.created_at.as_str())),
                ],
            )?;
            info!(sku = %product.sku, kind = %log.kind, change, balance = log.balance, "stock movement");
            Ok(log)
        })
    }

    /// Movement history, newest first.
    pub fn list_logs(&self, query: &LogQuery) -> Result<ListResult<InventoryLog>, ServiceError> {
        let filter = Filter::new()
            .eq_opt("product_id", query.product_id.clone())
            .eq_opt("kind", query.kind.map(|k| k.as_str()));
        let (limit, offset) = page(query.limit, query.offset);
        LOGS.list(self.sql.as_ref(), &filter, "created_at DESC, id", limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateProduct;
    use crate::service::testing::{service, who};
    use clinic_core::Role;

    fn product(svc: &InventoryService) -> Product {
        svc.create_product(
            &who(Role::Warehouse),
            CreateProduct {
                sku: "SER-01".into(),
                name: "Vitamin C serum".into(),
                category: None,
                unit: "bottle".into(),
                min_quantity: 3,
                cost_price: 150_000,
                sale_price: 390_000,
            },
        )
        .unwrap()
    }

    fn move_stock(svc: &InventoryService, id: &str, kind: MovementKind, quantity: i64) -> Result<InventoryLog, ServiceError> {
        svc.record_movement(
            &who(Role::Warehouse),
            RecordMovement { product_id: id.into(), kind, quantity, note: None },
        )
    }

    #[test]
    fn movements_keep_balance() {
        let svc = service();
        let p = product(&svc);

        let log = move_stock(&svc, &p.id, MovementKind::Import, 10).unwrap();
        assert_eq!(log.balance, 10);
        let log = move_stock(&svc, &p.id, MovementKind::Export, 4).unwrap();
        assert_eq!((log.change, log.balance), (-4, 6));
        let log = move_stock(&svc, &p.id, MovementKind::Adjust, 2).unwrap();
        assert_eq!((log.change, log.balance), (-4, 2));
        assert_eq!(svc.get_product(&p.id).unwrap().quantity, 2);

        let logs = svc.list_logs(&LogQuery { product_id: Some(p.id.clone()), ..Default::default() }).unwrap();
        assert_eq!(logs.total, 3);
    }

    #[test]
    fn export_beyond_stock_changes_nothing() {
        let svc = service();
        let p = product(&svc);
        move_stock(&svc, &p.id, MovementKind::Import, 5).unwrap();

        let err = move_stock(&svc, &p.id, MovementKind::Export, 6).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get_product(&p.id).unwrap().quantity, 5);
        assert_eq!(svc.list_logs(&LogQuery::default()).unwrap().total, 1);

        assert!(matches!(
            svc.record_movement(
                &who(Role::Consultant),
                RecordMovement { product_id: p.id.clone(), kind: MovementKind::Import, quantity: 1, note: None },
            ),
            Err(ServiceError::PermissionDenied(_))
        ));
    }

    #[test]
    fn import_past_the_maximum_is_rejected() {
        let svc = service();
        let p = product(&svc);
        move_stock(&svc, &p.id, MovementKind::Import, i64::MAX - 1).unwrap();

        let err = move_stock(&svc, &p.id, MovementKind::Import, 2).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get_product(&p.id).unwrap().quantity, i64::MAX - 1);
        assert_eq!(svc.list_logs(&LogQuery::default()).unwrap().total, 1);
    }

    #[test]
    fn low_stock_lists_products_at_threshold() {
        let svc = service();
        let p = product(&svc);
        assert_eq!(svc.low_stock().unwrap().len(), 1);
        move_stock(&svc, &p.id, MovementKind::Import, 4).unwrap();
        assert!(svc.low_stock().unwrap().is_empty());
        move_stock(&svc, &p.id, MovementKind::Export, 1).unwrap();
        assert_eq!(svc.low_stock().unwrap()[0].id, p.id);

        svc.update_product(&who(Role::Manager), &p.id, serde_json::json!({"active": false})).unwrap();
        assert!(svc.low_stock().unwrap().is_empty());
    }
}
