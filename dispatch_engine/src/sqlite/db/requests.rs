use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AssignmentRequest, RiderId},
    traits::DispatchError,
};

/// Appends a `Pending` request for each rider that does not already have one on this order.
/// The `UNIQUE (order_id, rider_id)` constraint makes repeat broadcasts no-ops for riders already
/// listed, whatever state their entry is in. Returns the rider ids actually added.
pub async fn insert_pending_requests(
    order_id: i64,
    riders: &[RiderId],
    conn: &mut SqliteConnection,
) -> Result<Vec<RiderId>, DispatchError> {
    let mut added = Vec::new();
    for rider in riders {
        let res = sqlx::query(
            "INSERT INTO assignment_requests (order_id, rider_id) VALUES ($1, $2) ON CONFLICT (order_id, \
             rider_id) DO NOTHING",
        )
        .bind(order_id)
        .bind(rider.as_str())
        .execute(&mut *conn)
        .await?;
        if res.rows_affected() > 0 {
            added.push(rider.clone());
        }
    }
    trace!("📮️ {} of {} assignment requests were new for order id {order_id}", added.len(), riders.len());
    Ok(added)
}

pub async fn fetch_requests_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<AssignmentRequest>, sqlx::Error> {
    let requests = sqlx::query_as("SELECT * FROM assignment_requests WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(requests)
}

pub async fn fetch_request(
    order_id: i64,
    rider_id: &RiderId,
    conn: &mut SqliteConnection,
) -> Result<Option<AssignmentRequest>, sqlx::Error> {
    let request = sqlx::query_as("SELECT * FROM assignment_requests WHERE order_id = $1 AND rider_id = $2")
        .bind(order_id)
        .bind(rider_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(request)
}

/// Records the winner's `Accepted` entry. An upsert, so the first-come path (an accept against an
/// order that was never broadcast) produces the entry on the spot. Only ever called after
/// [`try_assign_rider`](super::orders::try_assign_rider) has succeeded, inside the same
/// transaction.
pub(crate) async fn mark_winner_accepted(
    order_id: i64,
    rider_id: &RiderId,
    conn: &mut SqliteConnection,
) -> Result<AssignmentRequest, DispatchError> {
    let request = sqlx::query_as(
        r#"
            INSERT INTO assignment_requests (order_id, rider_id, status, responded_at)
            VALUES ($1, $2, 'Accepted', CURRENT_TIMESTAMP)
            ON CONFLICT (order_id, rider_id)
            DO UPDATE SET status = 'Accepted', responded_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(rider_id.as_str())
    .fetch_one(conn)
    .await?;
    Ok(request)
}

/// Expires every other rider's still-`Pending` entry once a winner holds the order.
pub(crate) async fn expire_other_pending(
    order_id: i64,
    winner: &RiderId,
    conn: &mut SqliteConnection,
) -> Result<u64, DispatchError> {
    let res = sqlx::query(
        "UPDATE assignment_requests SET status = 'Expired', responded_at = CURRENT_TIMESTAMP WHERE order_id = $1 \
         AND rider_id != $2 AND status = 'Pending'",
    )
    .bind(order_id)
    .bind(winner.as_str())
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

/// The rider's own reject. Conditional on the entry still being `Pending`; a `None` return means
/// the caller must re-read to distinguish "no such request" from "already responded".
pub async fn mark_rejected(
    order_id: i64,
    rider_id: &RiderId,
    reason: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<AssignmentRequest>, DispatchError> {
    let request = sqlx::query_as(
        r#"
            UPDATE assignment_requests
            SET status = 'Rejected', responded_at = CURRENT_TIMESTAMP, rejection_reason = $3
            WHERE order_id = $1 AND rider_id = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(rider_id.as_str())
    .bind(reason)
    .fetch_optional(conn)
    .await?;
    Ok(request)
}

/// Expires `Pending` requests created before the cutoff. Returns the number of rows touched.
///
/// `created_at` holds `CURRENT_TIMESTAMP` strings (`YYYY-MM-DD HH:MM:SS`), so the cutoff must be
/// bound in the same format for the comparison to hold.
pub async fn expire_older_than(cutoff: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, DispatchError> {
    let cutoff = cutoff.format("%Y-%m-%d %H:%M:%S").to_string();
    let res = sqlx::query(
        "UPDATE assignment_requests SET status = 'Expired', responded_at = CURRENT_TIMESTAMP WHERE status = \
         'Pending' AND created_at < $1",
    )
    .bind(cutoff)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}
