/// Catalog item classification without database dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    PhotoFrame,
    Snowdome,
    Christmas,
    Sticker,
    Model,
}

impl ItemType {
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

    /// Snowdome parts are bundled: they are placed, moved, and returned
    /// to the inventory as a group.
    #[must_use]
    pub const fn is_bundled(self) -> bool {
        matches!(self, Self::Snowdome)
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo_frame" => Ok(Self::PhotoFrame),
            "snowdome" => Ok(Self::Snowdome),
            "christmas" => Ok(Self::Christmas),
            "sticker" => Ok(Self::Sticker),
            "model" => Ok(Self::Model),
            other => Err(crate::error::CoreError::ParseError(format!(
                "unknown item type: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_item_type_round_trip() {
        for ty in [
            ItemType::PhotoFrame,
            ItemType::Snowdome,
            ItemType::Christmas,
            ItemType::Sticker,
            ItemType::Model,
        ] {
            assert_eq!(ItemType::from_str(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_item_type_rejected() {
        assert!(ItemType::from_str("teapot").is_err());
    }

    #[test]
    fn test_only_snowdome_is_bundled() {
        assert!(ItemType::Snowdome.is_bundled());
        assert!(!ItemType::PhotoFrame.is_bundled());
        assert!(!ItemType::Christmas.is_bundled());
    }
}
