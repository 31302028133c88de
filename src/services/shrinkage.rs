//! Shrinkage ("merma") recording and its audit listing.
//!
//! A request is served from exactly one batch: the oldest one of the cookie
//! that still has stock. It is never split across batches, so a request the
//! cookie's total stock could cover is still rejected when it exceeds that
//! batch.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    entities::{cookie, cookie_batch, cookie_shrinkage},
    errors::ServiceError,
    forms::{ChoiceSet, RecordShrinkage},
};

pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 200;

/// Outcome of a successful shrinkage.
#[derive(Debug, Clone, PartialEq)]
pub struct ShrinkageReceipt {
    pub record: cookie_shrinkage::Model,
    /// Batch quantity left after the decrement.
    pub remaining: i32,
}

/// Oldest batch of `cookie_id` with positive quantity.
pub async fn oldest_available_batch<C: ConnectionTrait>(
    conn: &C,
    cookie_id: i32,
) -> Result<Option<cookie_batch::Model>, ServiceError> {
    Ok(cookie_batch::Entity::find()
        .filter(cookie_batch::Column::CookieId.eq(cookie_id))
        .filter(cookie_batch::Column::Quantity.gt(0))
        .order_by_asc(cookie_batch::Column::ProducedOn)
        .order_by_asc(cookie_batch::Column::Id)
        .one(conn)
        .await?)
}

/// Subtracts `quantity` from the batch in one conditional statement that only
/// matches while the batch still holds at least `quantity`, then returns the
/// batch as stored after the decrement.
pub async fn take_from_batch<C: ConnectionTrait>(
    conn: &C,
    batch_id: i32,
    quantity: i32,
) -> Result<cookie_batch::Model, ServiceError> {
    let updated = cookie_batch::Entity::update_many()
        .col_expr(
            cookie_batch::Column::Quantity,
            Expr::col(cookie_batch::Column::Quantity).sub(quantity),
        )
        .filter(cookie_batch::Column::Id.eq(batch_id))
        .filter(cookie_batch::Column::Quantity.gte(quantity))
        .exec(conn)
        .await?;

    if updated.rows_affected == 0 {
        rejected("concurrent_modification");
        return Err(ServiceError::ConcurrentModification { batch_id });
    }

    cookie_batch::Entity::find_by_id(batch_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Batch {batch_id} not found")))
}

fn rejected(reason: &'static str) {
    warn!(reason, "Shrinkage rejected");
    counter!("galletas.shrinkage.rejected", 1, "reason" => reason);
}

/// Draws `cmd.quantity` from the cookie's oldest stocked batch and appends the
/// audit record.
///
/// The decrement only applies while the batch still holds at least the
/// requested quantity. If another writer drained it first nothing is
/// recorded and [`ServiceError::ConcurrentModification`] is returned; the
/// caller owns the transaction and must roll it back.
#[instrument(skip(conn, eligible, cmd), fields(cookie_id = cmd.cookie_id, quantity = cmd.quantity))]
pub async fn record_shrinkage<C: ConnectionTrait>(
    conn: &C,
    eligible: &ChoiceSet,
    cmd: RecordShrinkage,
) -> Result<ShrinkageReceipt, ServiceError> {
    cmd.validate()?;

    if !eligible.contains(cmd.cookie_id) {
        rejected("not_eligible");
        return Err(ServiceError::NotEligible(format!(
            "Cookie {} is not eligible for shrinkage",
            cmd.cookie_id
        )));
    }

    let Some(batch) = oldest_available_batch(conn, cmd.cookie_id).await? else {
        rejected("no_batch");
        return Err(ServiceError::NoAvailableBatch {
            cookie_id: cmd.cookie_id,
        });
    };

    if cmd.quantity > batch.quantity {
        rejected("insufficient_stock");
        return Err(ServiceError::InsufficientStock {
            requested: cmd.quantity,
            available: batch.quantity,
        });
    }

    let drawn = take_from_batch(conn, batch.id, cmd.quantity).await?;

    let record = cookie_shrinkage::ActiveModel {
        batch_id: Set(batch.id),
        kind: Set(cmd.kind.to_string()),
        quantity: Set(cmd.quantity),
        description: Set(cmd.description),
        recorded_on: Set(cmd.date),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    counter!("galletas.shrinkage.recorded", 1);
    info!(
        batch_id = batch.id,
        shrinkage_id = record.id,
        kind = %cmd.kind,
        "Recorded shrinkage"
    );

    Ok(ShrinkageReceipt {
        record,
        remaining: drawn.quantity,
    })
}

/// Filters for the shrinkage history.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShrinkageFilter {
    /// Only records drawn from batches of this cookie.
    pub galleta_id: Option<i32>,
    /// Maximum records returned (default 50, capped at 200).
    pub limit: Option<u64>,
}

impl ShrinkageFilter {
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ShrinkageEntry {
    pub id: i32,
    pub cookie_id: i32,
    pub cookie_name: String,
    pub batch_id: i32,
    pub batch_produced_on: NaiveDate,
    pub kind: String,
    pub quantity: i32,
    pub description: String,
    pub recorded_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Shrinkage history, newest first.
pub async fn list_shrinkages<C: ConnectionTrait>(
    conn: &C,
    filter: &ShrinkageFilter,
) -> Result<Vec<ShrinkageEntry>, ServiceError> {
    let mut query = cookie_shrinkage::Entity::find().find_also_related(cookie_batch::Entity);
    if let Some(cookie_id) = filter.galleta_id {
        query = query.filter(cookie_batch::Column::CookieId.eq(cookie_id));
    }

    let rows = query
        .order_by_desc(cookie_shrinkage::Column::CreatedAt)
        .order_by_desc(cookie_shrinkage::Column::Id)
        .limit(filter.effective_limit())
        .all(conn)
        .await?;

    let cookie_ids: Vec<i32> = rows
        .iter()
        .filter_map(|(_, batch)| batch.as_ref().map(|b| b.cookie_id))
        .collect();
    let names: HashMap<i32, String> = if cookie_ids.is_empty() {
        HashMap::new()
    } else {
        cookie::Entity::find()
            .filter(cookie::Column::Id.is_in(cookie_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect()
    };

    rows.into_iter()
        .map(|(record, batch)| {
            let batch = batch.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Shrinkage {} references missing batch {}",
                    record.id, record.batch_id
                ))
            })?;
            Ok(ShrinkageEntry {
                id: record.id,
                cookie_id: batch.cookie_id,
                cookie_name: names.get(&batch.cookie_id).cloned().unwrap_or_default(),
                batch_id: batch.id,
                batch_produced_on: batch.produced_on,
                kind: record.kind,
                quantity: record.quantity,
                description: record.description,
                recorded_on: record.recorded_on,
                created_at: record.created_at,
            })
        })
        .collect()
}
