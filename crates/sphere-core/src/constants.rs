/// Number of drawers in a calendar room. Day numbers run 1..=25.
pub const CALENDAR_DAY_COUNT: i64 = 25;

/// A snowdome collectible is split into exactly this many parts.
pub const SNOWDOME_PART_COUNT: usize = 4;

/// Two placed parts count as standing together when every coordinate
/// differs by less than this.
pub const POSITION_EPSILON: f64 = 0.001;

/// Per-room cap on AI image generations.
pub const AI_GENERATE_LIMIT: i32 = 5;

/// Rooms whose start date is older than this are swept.
pub const ROOM_RETENTION_DAYS: i64 = 90;

/// Object storage key prefixes
pub const ITEM_OBJECT_PREFIX: &str = "item/object";
pub const ITEM_THUMBNAIL_PREFIX: &str = "item/thumbnail";
pub const USER_IMAGE_PREFIX: &str = "item/user_image";
