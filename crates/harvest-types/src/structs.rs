//! Core value types shared between the engine, disciplines, and hosts.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, ItemId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Identifier of a map (facet). Coordinates are only comparable within a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapId(pub u16);

impl core::fmt::Display for MapId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "map{}", self.0)
    }
}

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point3D {
    /// East-west coordinate.
    pub x: i32,
    /// North-south coordinate.
    pub y: i32,
    /// Altitude.
    pub z: i32,
}

impl Point3D {
    /// Create a point from its coordinates.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Whether `other` lies within `range` tiles on both axes.
    ///
    /// Altitude is ignored, matching how reach works on a tiled map.
    pub const fn in_range(&self, other: &Self, range: u32) -> bool {
        self.x.abs_diff(other.x) <= range && self.y.abs_diff(other.y) <= range
    }

    /// Return this point shifted by `(dx, dy)`, or `None` on overflow.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z,
        })
    }
}

impl core::fmt::Display for Point3D {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The type of an item, e.g. `"fish"` or `"treasure_map"`.
///
/// Disciplines declare their kinds as `const` values via
/// [`ItemKind::from_static`]; kinds read from configuration are owned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKind(pub Cow<'static, str>);

impl ItemKind {
    /// Create a kind from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Return the kind's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The type of a harvesting tool, e.g. `"fishing_pole"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ToolKind(pub Cow<'static, str>);

impl ToolKind {
    /// Create a tool kind from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Return the tool kind's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A concrete item instance: a harvested yield, a marker, or a container.
///
/// Discipline-specific metadata lives in `properties` as JSON values (for
/// example the fisher stamped on a big fish, or a shipwreck marker's target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestedItem {
    /// Unique item identifier.
    pub id: ItemId,
    /// What the item is.
    pub kind: ItemKind,
    /// Stack size.
    pub amount: u32,
    /// The actor whose harvest produced the item, if any.
    pub origin: Option<ActorId>,
    /// Discipline-attached metadata.
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Items held inside this one when it is a container.
    pub contents: Vec<HarvestedItem>,
}

impl HarvestedItem {
    /// Create a fresh item with no origin, properties, or contents.
    pub fn new(kind: ItemKind, amount: u32) -> Self {
        Self {
            id: ItemId::new(),
            kind,
            amount,
            origin: None,
            properties: BTreeMap::new(),
            contents: Vec::new(),
        }
    }

    /// Set the producing actor.
    #[must_use]
    pub fn with_origin(mut self, origin: ActorId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Attach a property.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    /// Attach a point-valued property.
    #[must_use]
    pub fn with_point(mut self, key: &str, point: Point3D) -> Self {
        if let Ok(value) = serde_json::to_value(point) {
            self.properties.insert(key.to_owned(), value);
        }
        self
    }

    /// Put another item inside this one.
    pub fn push_content(&mut self, item: Self) {
        self.contents.push(item);
    }

    /// Whether this item holds other items.
    pub fn is_container(&self) -> bool {
        !self.contents.is_empty()
    }

    /// Read an integer property.
    pub fn property_i64(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(serde_json::Value::as_i64)
    }

    /// Read a boolean property, defaulting to `false` when absent.
    pub fn property_flag(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Read a string property.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }

    /// Read a point-valued property written by [`HarvestedItem::with_point`].
    pub fn property_point(&self, key: &str) -> Option<Point3D> {
        self.properties
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// A tool held by an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// The tool's item identifier.
    pub id: ItemId,
    /// What kind of tool it is.
    pub kind: ToolKind,
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// Read-only snapshot of an actor, as supplied by the actor host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorView {
    /// The actor's identifier.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// The map the actor is on.
    pub map: MapId,
    /// Current position.
    pub position: Point3D,
    /// Whether the actor is alive.
    pub alive: bool,
    /// Whether the actor is riding a mount.
    pub mounted: bool,
    /// Whether the actor is a new ("young") player.
    pub young: bool,
}

/// A skill reading: the unmodified base and the effective value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillValue {
    /// Trained value without item or spell modifiers.
    pub base: f64,
    /// Effective value including modifiers.
    pub value: f64,
}

impl SkillValue {
    /// A reading whose base and effective values are equal.
    pub const fn flat(value: f64) -> Self {
        Self { base: value, value }
    }
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// A text notice delivered to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// A catalog message by number, with optional substitution arguments.
    Localized {
        /// Catalog number.
        number: u32,
        /// Substitution arguments, tab-separated when there are several.
        args: Option<String>,
    },
    /// A literal text message.
    Literal(String),
}

impl Notice {
    /// A catalog notice without arguments.
    pub const fn localized(number: u32) -> Self {
        Self::Localized { number, args: None }
    }

    /// A catalog notice with substitution arguments.
    pub fn localized_with(number: u32, args: impl Into<String>) -> Self {
        Self::Localized {
            number,
            args: Some(args.into()),
        }
    }

    /// A literal notice.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// The catalog number, for localized notices.
    pub const fn number(&self) -> Option<u32> {
        match self {
            Self::Localized { number, .. } => Some(*number),
            Self::Literal(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_ignores_altitude() {
        let a = Point3D::new(100, 100, 0);
        let b = Point3D::new(104, 96, -5);
        assert!(a.in_range(&b, 4));
        assert!(!a.in_range(&b, 3));
    }

    #[test]
    fn offset_checks_overflow() {
        let p = Point3D::new(i32::MAX, 0, 0);
        assert!(p.offset(1, 0).is_none());
        assert_eq!(p.offset(-1, 2), Some(Point3D::new(i32::MAX - 1, 2, 0)));
    }

    #[test]
    fn static_and_owned_kinds_compare_equal() {
        let a = ItemKind::from_static("fish");
        let b = ItemKind(Cow::Owned(String::from("fish")));
        assert_eq!(a, b);
    }

    #[test]
    fn item_properties_roundtrip() {
        let item = HarvestedItem::new(ItemKind::from_static("sos"), 1)
            .with_property("level", 3)
            .with_property("ancient", true)
            .with_point("target", Point3D::new(10, 20, -5));
        assert_eq!(item.property_i64("level"), Some(3));
        assert!(item.property_flag("ancient"));
        assert!(!item.property_flag("missing"));
        assert_eq!(item.property_point("target"), Some(Point3D::new(10, 20, -5)));
    }

    #[test]
    fn containers_report_contents() {
        let mut chest = HarvestedItem::new(ItemKind::from_static("wooden_chest"), 1);
        assert!(!chest.is_container());
        chest.push_content(HarvestedItem::new(ItemKind::from_static("net"), 1));
        assert!(chest.is_container());
    }

    #[test]
    fn notice_numbers() {
        assert_eq!(Notice::localized(500_972).number(), Some(500_972));
        assert_eq!(Notice::literal("hello").number(), None);
        assert_eq!(
            Notice::localized_with(1_008_124, "a fish"),
            Notice::Localized {
                number: 1_008_124,
                args: Some(String::from("a fish")),
            }
        );
    }
}
