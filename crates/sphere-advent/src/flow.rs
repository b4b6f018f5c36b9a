//! The item-acquisition flow.
//!
//! One machine instance lives per room session. State is a plain value
//! stepped by [`FlowState::step`]; persistence writes come back as
//! [`WriteIntent`]s for the caller to execute, and the caller reports
//! the outcome with [`FlowEvent::WriteSucceeded`] /
//! [`FlowEvent::WriteFailed`]. Events that fail a guard leave the state
//! untouched and emit nothing.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::bundle::resolve_bundle;
use crate::calendar::is_final_part_date;
use crate::openability::{can_open_day, item_for_day};
use crate::snapshot::{CalendarItemView, Position, RoomView, Rotation};

/// Current snapshot of the room the machine is deciding against.
#[derive(Debug, Clone, Copy)]
pub struct RoomContext<'a> {
    /// `None` while the room is still loading; every guard fails then.
    pub room: Option<&'a RoomView>,
    pub items: &'a [CalendarItemView],
}

impl RoomContext<'_> {
    fn item(&self, id: Uuid) -> Option<&CalendarItemView> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Where the flow currently stands.
///
/// `pending` marks a write in flight: repeat confirms are ignored until
/// the caller reports the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// Resting state; nothing in progress.
    Idle,
    /// A drawer passed the openability check and the reveal is showing.
    /// The slot is not yet marked opened in storage.
    GetModal {
        day: i64,
        item_id: Uuid,
        pending: bool,
    },
    /// A normal item awaits a drop location or a deferral.
    Placement {
        item_id: Uuid,
        /// `None` when entered from the inventory rather than a drawer.
        day: Option<i64>,
        pending: bool,
    },
    /// A snowdome part awaits placement; confirming acts on the whole
    /// resolved bundle.
    SnowdomePlacement {
        item_id: Uuid,
        day: Option<i64>,
        pending: bool,
    },
    /// A write landed; shown briefly before returning to `Idle`.
    Completed,
}

impl FlowState {
    #[must_use]
    pub const fn phase_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::GetModal { .. } => "get_modal",
            Self::Placement { .. } => "placement",
            Self::SnowdomePlacement { .. } => "snowdome_placement",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::GetModal { pending: true, .. }
                | Self::Placement { pending: true, .. }
                | Self::SnowdomePlacement { pending: true, .. }
        )
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.phase_name())
    }
}

/// Inputs the machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// A drawer was clicked.
    DayClicked { day: i64 },
    /// "Next" pressed on the reveal dialog.
    Next,
    /// A drop location was confirmed.
    ConfirmPlacement {
        position: Position,
        rotation: Rotation,
    },
    /// Placement deferred; the item goes to the inventory.
    SkipPlacement,
    /// An opened item was selected from the inventory, or a placed item
    /// was picked up for repositioning.
    StartFromInventory { item_id: Uuid },
    /// A dialog was dismissed without confirming.
    Dismissed,
    /// The in-flight write landed.
    WriteSucceeded,
    /// The in-flight write was rejected; the caller surfaces the error.
    WriteFailed,
    /// The completed notice has been shown long enough.
    CompletedShown,
}

/// A persistence write the caller must execute.
///
/// `is_opened` only ever moves to `true`; none of these reset it.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteIntent {
    /// Mark every listed slot opened and place it at the same spot.
    Place {
        item_ids: Vec<Uuid>,
        position: Position,
        rotation: Rotation,
    },
    /// Mark the slot opened with no position: straight to the inventory.
    /// Used both for deferred placement and for non-final snowdome parts.
    SkipPlacement { item_id: Uuid },
}

/// Result of stepping the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: FlowState,
    pub intent: Option<WriteIntent>,
}

impl Step {
    const fn to(state: FlowState) -> Self {
        Self {
            state,
            intent: None,
        }
    }

    const fn with(state: FlowState, intent: WriteIntent) -> Self {
        Self {
            state,
            intent: Some(intent),
        }
    }
}

impl FlowState {
    /// ## Summary
    /// Advances the machine by one event against the given snapshot.
    ///
    /// Pure: the only outputs are the next state and at most one
    /// [`WriteIntent`]. Guard failures return the state unchanged.
    #[must_use]
    #[tracing::instrument(skip(self, ctx), level = "trace", fields(phase = self.phase_name()))]
    pub fn step(self, event: FlowEvent, ctx: &RoomContext<'_>, now: DateTime<Utc>) -> Step {
        // Dismissal abandons whatever is in progress, pending or not.
        if matches!(event, FlowEvent::Dismissed) {
            return Step::to(Self::Idle);
        }

        match self {
            Self::Idle => Self::step_idle(event, ctx, now),
            Self::GetModal {
                day,
                item_id,
                pending,
            } => Self::step_get_modal(day, item_id, pending, event, ctx),
            Self::Placement {
                item_id,
                day,
                pending,
            } => Self::step_placement(item_id, day, pending, event),
            Self::SnowdomePlacement {
                item_id,
                day,
                pending,
            } => Self::step_snowdome_placement(item_id, day, pending, event, ctx),
            Self::Completed => match event {
                FlowEvent::CompletedShown => Step::to(Self::Idle),
                _ => Step::to(Self::Completed),
            },
        }
    }

    fn step_idle(event: FlowEvent, ctx: &RoomContext<'_>, now: DateTime<Utc>) -> Step {
        match event {
            FlowEvent::DayClicked { day } => {
                let Some(room) = ctx.room else {
                    return Step::to(Self::Idle);
                };
                if !can_open_day(room, ctx.items, day, now) {
                    return Step::to(Self::Idle);
                }
                match item_for_day(ctx.items, room.start_at, day) {
                    Some(item) => Step::to(Self::GetModal {
                        day,
                        item_id: item.id,
                        pending: false,
                    }),
                    None => Step::to(Self::Idle),
                }
            }
            FlowEvent::StartFromInventory { item_id } => Self::start_from_inventory(item_id, ctx),
            _ => Step::to(Self::Idle),
        }
    }

    fn start_from_inventory(item_id: Uuid, ctx: &RoomContext<'_>) -> Step {
        let Some(item) = ctx.item(item_id) else {
            return Step::to(Self::Idle);
        };
        if !item.is_opened {
            return Step::to(Self::Idle);
        }
        if item.item_type.is_bundled() {
            Step::to(Self::SnowdomePlacement {
                item_id,
                day: None,
                pending: false,
            })
        } else {
            Step::to(Self::Placement {
                item_id,
                day: None,
                pending: false,
            })
        }
    }

    fn step_get_modal(
        day: i64,
        item_id: Uuid,
        pending: bool,
        event: FlowEvent,
        ctx: &RoomContext<'_>,
    ) -> Step {
        let current = Self::GetModal {
            day,
            item_id,
            pending,
        };

        if pending {
            return match event {
                FlowEvent::WriteSucceeded => Step::to(Self::Completed),
                FlowEvent::WriteFailed => Step::to(Self::GetModal {
                    day,
                    item_id,
                    pending: false,
                }),
                _ => Step::to(current),
            };
        }

        match event {
            FlowEvent::Next => {
                let (Some(room), Some(item)) = (ctx.room, ctx.item(item_id)) else {
                    return Step::to(current);
                };

                if item.item_type.is_bundled() {
                    if is_final_part_date(room, item.open_date) {
                        // Final part: place the whole dome.
                        Step::to(Self::SnowdomePlacement {
                            item_id,
                            day: Some(day),
                            pending: false,
                        })
                    } else {
                        // Earlier parts go straight to the inventory.
                        Step::with(
                            Self::GetModal {
                                day,
                                item_id,
                                pending: true,
                            },
                            WriteIntent::SkipPlacement { item_id },
                        )
                    }
                } else {
                    Step::to(Self::Placement {
                        item_id,
                        day: Some(day),
                        pending: false,
                    })
                }
            }
            _ => Step::to(current),
        }
    }

    fn step_placement(item_id: Uuid, day: Option<i64>, pending: bool, event: FlowEvent) -> Step {
        let current = Self::Placement {
            item_id,
            day,
            pending,
        };

        if pending {
            return match event {
                FlowEvent::WriteSucceeded => Step::to(Self::Completed),
                FlowEvent::WriteFailed => Step::to(Self::Placement {
                    item_id,
                    day,
                    pending: false,
                }),
                _ => Step::to(current),
            };
        }

        match event {
            FlowEvent::ConfirmPlacement { position, rotation } => Step::with(
                Self::Placement {
                    item_id,
                    day,
                    pending: true,
                },
                WriteIntent::Place {
                    item_ids: vec![item_id],
                    position,
                    rotation,
                },
            ),
            FlowEvent::SkipPlacement => Step::with(
                Self::Placement {
                    item_id,
                    day,
                    pending: true,
                },
                WriteIntent::SkipPlacement { item_id },
            ),
            _ => Step::to(current),
        }
    }

    fn step_snowdome_placement(
        item_id: Uuid,
        day: Option<i64>,
        pending: bool,
        event: FlowEvent,
        ctx: &RoomContext<'_>,
    ) -> Step {
        let current = Self::SnowdomePlacement {
            item_id,
            day,
            pending,
        };

        if pending {
            return match event {
                FlowEvent::WriteSucceeded => Step::to(Self::Completed),
                FlowEvent::WriteFailed => Step::to(Self::SnowdomePlacement {
                    item_id,
                    day,
                    pending: false,
                }),
                _ => Step::to(current),
            };
        }

        match event {
            FlowEvent::ConfirmPlacement { position, rotation } => {
                let Some(trigger) = ctx.item(item_id) else {
                    return Step::to(current);
                };
                let item_ids = resolve_bundle(trigger, ctx.items);
                Step::with(
                    Self::SnowdomePlacement {
                        item_id,
                        day,
                        pending: true,
                    },
                    WriteIntent::Place {
                        item_ids,
                        position,
                        rotation,
                    },
                )
            }
            // Deferring affects only the targeted part.
            FlowEvent::SkipPlacement => Step::with(
                Self::SnowdomePlacement {
                    item_id,
                    day,
                    pending: true,
                },
                WriteIntent::SkipPlacement { item_id },
            ),
            _ => Step::to(current),
        }
    }
}
