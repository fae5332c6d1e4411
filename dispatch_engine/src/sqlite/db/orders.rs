use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, RiderId},
    traits::DispatchError,
};

/// Inserts a new order and its line items using the given connection. This is not atomic on its
/// own. You can embed this call inside a transaction if you need atomicity, and pass `&mut *tx`
/// as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, DispatchError> {
    let items = order.items;
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_id,
                status,
                total_price,
                currency,
                address_line1,
                address_line2,
                city,
                postcode
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.customer_id)
    .bind(order.status.to_string())
    .bind(order.total_price.value())
    .bind(order.currency)
    .bind(order.address_line1)
    .bind(order.address_line2)
    .bind(order.city)
    .bind(order.postcode)
    .fetch_one(&mut *conn)
    .await?;
    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, vendor_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, \
             $4, $5)",
        )
        .bind(inserted.id)
        .bind(item.vendor_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price.value())
        .execute(&mut *conn)
        .await?;
    }
    debug!("📝️ Order [{}] inserted with id {}", inserted.order_number, inserted.id);
    Ok(inserted)
}

/// Returns the order with the given human-facing order number.
pub async fn fetch_order_by_number(
    order_number: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches the line items for an order (internal id).
pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// The distinct vendor set named by the order's line items, in line-item order.
pub async fn vendors_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT vendor_id FROM order_items WHERE order_id = $1 ORDER BY vendor_id")
            .bind(order_id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().map(|(v,)| v).collect())
}

/// The authoritative guard of the acceptance engine.
///
/// A single conditional update: assign the rider, stamp `assigned_at` and move the order to
/// `OutForDelivery` — only if the order is *still* `Ready` with no rider at apply time. The
/// check-and-write pair is indivisible with respect to concurrent writers of the same row, so
/// among N concurrent accepts exactly one call gets `Some(order)` back; the rest get `None` and
/// must re-read to classify their loss.
pub(crate) async fn try_assign_rider(
    id: i64,
    rider_id: &RiderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, DispatchError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET rider_id = $1,
                assigned_at = CURRENT_TIMESTAMP,
                status = 'OutForDelivery',
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'Ready' AND rider_id IS NULL
            RETURNING *;
        "#,
    )
    .bind(rider_id.as_str())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Unconditional status change. Dispatch never calls this on its own authority; it exists for the
/// out-of-scope fulfilment transitions (vendor marks packed, admin cancels) and for test fixtures.
pub async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, DispatchError> {
    let status = status.to_string();
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or_else(|| DispatchError::DatabaseError(format!("No order with internal id {id}")))
}

/// `Ready`, unassigned orders that include at least one line item from the given vendor, oldest
/// first.
pub async fn ready_orders_for_vendor(
    vendor_id: &str,
    offset: i64,
    count: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status = 'Ready' AND rider_id IS NULL
              AND id IN (SELECT order_id FROM order_items WHERE vendor_id = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3;
        "#,
    )
    .bind(vendor_id)
    .bind(count)
    .bind(offset)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
