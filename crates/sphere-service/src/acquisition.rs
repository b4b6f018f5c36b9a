//! Executes the acquisition flow's write intents against the database.
//!
//! The decision layer (`sphere-advent`) stays pure; this module loads
//! snapshots, steps the machine, runs the emitted writes, and reports
//! the outcome back into it. Bundle writes run in one transaction so a
//! partially placed snowdome cannot be observed.

use chrono::{DateTime, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use sphere_advent::calendar::day_number;
use sphere_advent::flow::{FlowEvent, FlowState, RoomContext, WriteIntent};
use sphere_advent::openability::can_open_day;
use sphere_advent::snapshot::{CalendarItemView, Position, RoomView, Rotation};
use sphere_db::db::connection::DbConnection;
use sphere_db::db::query::{calendar_item as slot_query, room as room_query};
use sphere_db::db::transaction::with_transaction;
use sphere_db::model::calendar_item::UpdateCalendarItem;

use crate::error::{ServiceError, ServiceResult};
use crate::invalidation::Invalidation;

/// A room's current state as the decision layer sees it.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room: RoomView,
    pub items: Vec<CalendarItemView>,
}

impl RoomSnapshot {
    #[must_use]
    pub fn context(&self) -> RoomContext<'_> {
        RoomContext {
            room: Some(&self.room),
            items: &self.items,
        }
    }
}

/// ## Summary
/// Loads the snapshot the flow decides against.
///
/// ## Errors
/// `NotFound` for an unknown room, or any query error.
pub async fn load_snapshot(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
) -> ServiceResult<RoomSnapshot> {
    let room = room_query::get(conn, room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room {room_id}")))?;

    let rows = slot_query::list_with_items(conn, room_id).await?;
    let items = rows
        .iter()
        .map(sphere_db::model::calendar_item::CalendarItemWithItem::to_view)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RoomSnapshot {
        room: room.to_view(),
        items,
    })
}

/// Opening a slot that is still closed requires the openability
/// predicate to pass right now. Already-opened slots (deferred bundle
/// parts, repositioned items) pass through.
fn ensure_openable(
    snapshot: &RoomSnapshot,
    item: &CalendarItemView,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    if item.is_opened {
        return Ok(());
    }
    let day = day_number(snapshot.room.start_at, item.open_date);
    if can_open_day(&snapshot.room, &snapshot.items, day, now) {
        Ok(())
    } else {
        Err(ServiceError::NotOpenable { day })
    }
}

fn find_item<'a>(
    snapshot: &'a RoomSnapshot,
    id: uuid::Uuid,
) -> ServiceResult<&'a CalendarItemView> {
    snapshot
        .items
        .iter()
        .find(|item| item.id == id)
        .ok_or_else(|| ServiceError::NotFound(format!("calendar item {id}")))
}

/// ## Summary
/// Executes one write intent emitted by the flow machine.
///
/// ## Side Effects
/// Updates one or more `calendar_item` rows. Multi-part placements run
/// inside a transaction.
///
/// ## Errors
/// `NotOpenable` when a closed slot fails the server-side predicate,
/// `BundleWrite` when a multi-part transaction fails, or any query
/// error.
#[tracing::instrument(skip(conn, snapshot), fields(room_id = %snapshot.room.id))]
pub async fn execute_intent(
    conn: &mut DbConnection<'_>,
    snapshot: &RoomSnapshot,
    intent: &WriteIntent,
    now: DateTime<Utc>,
) -> ServiceResult<Invalidation> {
    let room_id = snapshot.room.id;

    match intent {
        WriteIntent::SkipPlacement { item_id } => {
            let item = find_item(snapshot, *item_id)?;
            ensure_openable(snapshot, item, now)?;
            slot_query::update_one(conn, room_id, *item_id, &UpdateCalendarItem::skipped())
                .await?;
        }
        WriteIntent::Place {
            item_ids,
            position,
            rotation,
        } => {
            for id in item_ids {
                let item = find_item(snapshot, *id)?;
                ensure_openable(snapshot, item, now)?;
            }
            place_slots(conn, room_id, item_ids, *position, *rotation).await?;
        }
    }

    Ok(Invalidation::slot_views(room_id))
}

/// ## Summary
/// Places a set of slots at one spot. A single slot is a plain update;
/// several move in one transaction.
///
/// ## Errors
/// `BundleWrite` when the transaction fails, or any query error.
pub async fn place_slots(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
    item_ids: &[uuid::Uuid],
    position: Position,
    rotation: Rotation,
) -> ServiceResult<()> {
    let changes = UpdateCalendarItem::placed(position, rotation);

    if let [only] = item_ids {
        slot_query::update_one(conn, room_id, *only, &changes).await?;
        return Ok(());
    }

    let ids = item_ids.to_vec();
    let total = ids.len();
    with_transaction(conn, |conn| {
        async move {
            let written = slot_query::update_many(conn, room_id, &ids, &changes).await?;
            if written == total {
                Ok(())
            } else {
                anyhow::bail!("expected {total} parts, matched {written}")
            }
        }
        .scope_boxed()
    })
    .await
    .map_err(|source| ServiceError::BundleWrite {
        written: 0,
        total,
        source,
    })
}

/// ## Summary
/// Returns one placed slot to the inventory. `is_opened` is untouched.
///
/// ## Errors
/// `NotFound` for an unknown slot, or any query error.
#[tracing::instrument(skip(conn))]
pub async fn return_to_inventory(
    conn: &mut DbConnection<'_>,
    room_id: uuid::Uuid,
    id: uuid::Uuid,
) -> ServiceResult<Invalidation> {
    slot_query::update_one(conn, room_id, id, &UpdateCalendarItem::returned_to_inventory())
        .await?;
    Ok(Invalidation::slot_views(room_id))
}

/// ## Summary
/// Returns a slot to the inventory; for a placed bundle part, every
/// part standing at the same spot moves back together in one
/// transaction.
///
/// ## Errors
/// `NotFound`, `BundleWrite` when the group transaction fails, or any
/// query error.
#[tracing::instrument(skip(conn, snapshot), fields(room_id = %snapshot.room.id))]
pub async fn return_bundle_to_inventory(
    conn: &mut DbConnection<'_>,
    snapshot: &RoomSnapshot,
    trigger_id: uuid::Uuid,
) -> ServiceResult<Invalidation> {
    let room_id = snapshot.room.id;
    let trigger = find_item(snapshot, trigger_id)?;

    let targets: Vec<uuid::Uuid> = match (trigger.item_type.is_bundled(), trigger.position) {
        (true, Some(position)) => {
            sphere_advent::bundle::placed_parts_at(&snapshot.items, trigger, position)
                .iter()
                .map(|item| item.id)
                .collect()
        }
        _ => vec![trigger_id],
    };

    if let [only] = targets.as_slice() {
        return return_to_inventory(conn, room_id, *only).await;
    }

    let total = targets.len();
    let changes = UpdateCalendarItem::returned_to_inventory();
    with_transaction(conn, |conn| {
        async move {
            let written = slot_query::update_many(conn, room_id, &targets, &changes).await?;
            if written == total {
                Ok(())
            } else {
                anyhow::bail!("expected {total} parts, matched {written}")
            }
        }
        .scope_boxed()
    })
    .await
    .map_err(|source| ServiceError::BundleWrite {
        written: 0,
        total,
        source,
    })?;

    Ok(Invalidation::slot_views(room_id))
}

/// One acquisition flow per room session: holds the machine state and
/// runs its writes, mirroring a participant's dialog sequence.
#[derive(Debug)]
pub struct AcquisitionSession {
    room_id: uuid::Uuid,
    state: FlowState,
}

impl AcquisitionSession {
    #[must_use]
    pub const fn new(room_id: uuid::Uuid) -> Self {
        Self {
            room_id,
            state: FlowState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &FlowState {
        &self.state
    }

    /// ## Summary
    /// Feeds one event through the machine, executing any emitted
    /// write. On write failure the machine is told and left in its
    /// retryable pre-write state, and the error is returned for the
    /// caller to surface.
    ///
    /// ## Errors
    /// Any snapshot or write error. The session itself stays usable.
    #[tracing::instrument(skip(self, conn, event), fields(room_id = %self.room_id, phase = self.state.phase_name()))]
    pub async fn handle(
        &mut self,
        conn: &mut DbConnection<'_>,
        event: FlowEvent,
        now: DateTime<Utc>,
    ) -> ServiceResult<Option<Invalidation>> {
        let snapshot = load_snapshot(conn, self.room_id).await?;
        let step = self.state.clone().step(event, &snapshot.context(), now);
        self.state = step.state;

        let Some(intent) = step.intent else {
            return Ok(None);
        };

        match execute_intent(conn, &snapshot, &intent, now).await {
            Ok(invalidation) => {
                let outcome =
                    self.state
                        .clone()
                        .step(FlowEvent::WriteSucceeded, &snapshot.context(), now);
                self.state = outcome.state;
                Ok(Some(invalidation))
            }
            Err(error) => {
                let outcome =
                    self.state
                        .clone()
                        .step(FlowEvent::WriteFailed, &snapshot.context(), now);
                self.state = outcome.state;
                Err(error)
            }
        }
    }
}
