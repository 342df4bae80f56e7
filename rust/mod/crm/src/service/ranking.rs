use tracing::info;

use clinic_core::{now_rfc3339, ServiceError};
use clinic_sql::{Executor, Value};

use crate::model::{Customer, Rank};
use crate::service::customers::indexes;
use crate::service::CUSTOMERS;

/// Recompute a customer's paid spend and tier from their orders.
///
/// Runs inside the transaction that changed the orders.
pub(crate) fn refresh_ranking(tx: &dyn Executor, customer_id: &str) -> Result<Customer, ServiceError> {
    let rows = tx.query(
        "SELECT COALESCE(SUM(total_amount), 0) AS spent FROM orders
         WHERE customer_id = ?1 AND is_paid = 1",
        &[Value::from(customer_id)],
    )?;
    let spent = rows.first().and_then(|r| r.get_i64("spent")).unwrap_or(0);

    let mut customer: Customer = CUSTOMERS.get(tx, customer_id)?;
    if customer.total_spent == spent {
        return Ok(customer);
    }

    let rank = Rank::for_spent(spent);
    if rank != customer.rank {
        info!(customer = %customer_id, from = %customer.rank, to = %rank, "customer rank changed");
    }
    customer.total_spent = spent;
    customer.rank = rank;
    customer.updated_at = now_rfc3339();
    CUSTOMERS.update(tx, customer_id, &customer, &indexes(&customer))?;
    Ok(customer)
}
