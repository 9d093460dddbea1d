//! Error types for the `harvest-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias. "No resources left" is not an error: it is
//! reported by [`ResourceBank::try_consume`](crate::bank::ResourceBank::try_consume)
//! returning `false`.

use harvest_types::MapId;

/// Errors that can occur during world and bank operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A map was not found in the tile grid.
    #[error("map not found: {0}")]
    MapNotFound(MapId),

    /// A map with this identifier was already added.
    #[error("duplicate map id: {0}")]
    DuplicateMap(MapId),

    /// A coordinate lies outside a map's bounds.
    #[error("({x}, {y}) is outside {map}")]
    OutOfBounds {
        /// The map that was queried.
        map: MapId,
        /// East-west coordinate.
        x: i32,
        /// North-south coordinate.
        y: i32,
    },

    /// A map was declared with a zero or oversized dimension.
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Bank sizing or respawn timing is inconsistent.
    #[error("invalid bank configuration: {reason}")]
    InvalidBankConfig {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
