//! Database enum types with Diesel serialization.
//!
//! Type-safe wrappers for database CHECK constraints. Each enum
//! implements `ToSql` and `FromSql` for automatic conversion between
//! Rust and `PostgreSQL`.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

/// Catalog item classification.
///
/// Maps to the `item.item_type` CHECK constraint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    PhotoFrame,
    Snowdome,
    Christmas,
    Sticker,
    Model,
}

impl ToSql<Text, Pg> for ItemType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for ItemType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"photo_frame" => Ok(Self::PhotoFrame),
            b"snowdome" => Ok(Self::Snowdome),
            b"christmas" => Ok(Self::Christmas),
            b"sticker" => Ok(Self::Sticker),
            b"model" => Ok(Self::Model),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl ItemType {
    /// Returns the database string representation of this item type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PhotoFrame => "photo_frame",
            Self::Snowdome => "snowdome",
            Self::Christmas => "christmas",
            Self::Sticker => "sticker",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ItemType> for sphere_core::types::ItemType {
    fn from(value: ItemType) -> Self {
        match value {
            ItemType::PhotoFrame => Self::PhotoFrame,
            ItemType::Snowdome => Self::Snowdome,
            ItemType::Christmas => Self::Christmas,
            ItemType::Sticker => Self::Sticker,
            ItemType::Model => Self::Model,
        }
    }
}

impl From<sphere_core::types::ItemType> for ItemType {
    fn from(value: sphere_core::types::ItemType) -> Self {
        match value {
            sphere_core::types::ItemType::PhotoFrame => Self::PhotoFrame,
            sphere_core::types::ItemType::Snowdome => Self::Snowdome,
            sphere_core::types::ItemType::Christmas => Self::Christmas,
            sphere_core::types::ItemType::Sticker => Self::Sticker,
            sphere_core::types::ItemType::Model => Self::Model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_as_str_matches_core() {
        for ty in [
            ItemType::PhotoFrame,
            ItemType::Snowdome,
            ItemType::Christmas,
            ItemType::Sticker,
            ItemType::Model,
        ] {
            let core: sphere_core::types::ItemType = ty.into();
            assert_eq!(ty.as_str(), core.as_str());
            assert_eq!(ItemType::from(core), ty);
        }
    }
}
