use std::collections::BTreeSet;
use std::fmt;

use crate::env::ZoneSpec;
use crate::state::{EntityId, Position};

/// Handle of a zone registered in an [`OccupancyGrid`](super::OccupancyGrid).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneId(pub u32);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ZoneKind {
    /// Leaving the level; entering one as the player requests a transition.
    Exit,
    /// Scripted trigger area.
    Trigger,
    /// Area controlled by an object (guard post, shop counter).
    Control,
}

/// Who registered a zone. Object-owned zones go away with their owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZoneOwner {
    Level,
    Object(EntityId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Zone {
    pub name: String,
    pub kind: ZoneKind,
    pub target: Option<String>,
    pub tiles: BTreeSet<Position>,
    pub owner: ZoneOwner,
}

impl Zone {
    pub fn new(
        name: impl Into<String>,
        kind: ZoneKind,
        tiles: impl IntoIterator<Item = Position>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            target: None,
            tiles: tiles.into_iter().collect(),
            owner: ZoneOwner::Level,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn owned_by(mut self, owner: EntityId) -> Self {
        self.owner = ZoneOwner::Object(owner);
        self
    }

    pub fn contains(&self, position: Position) -> bool {
        self.tiles.contains(&position)
    }

    pub fn is_exit(&self) -> bool {
        self.kind == ZoneKind::Exit
    }
}

impl From<ZoneSpec> for Zone {
    fn from(spec: ZoneSpec) -> Self {
        Self {
            name: spec.name,
            kind: spec.kind,
            target: spec.target,
            tiles: spec.tiles.into_iter().collect(),
            owner: ZoneOwner::Level,
        }
    }
}

/// Membership change produced by [`OccupancyGrid::trigger_zone`](super::OccupancyGrid::trigger_zone).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneTransition {
    Entered(ZoneId),
    Exited(ZoneId),
}
