//! Dimensions are identified by a symbolic `namespace:path` string. Older
//! records stored an integer id instead, those are mapped through a fixed
//! legacy registry onto the symbolic form
//!

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Symbolic id of the overworld
pub const OVERWORLD: &str = "minecraft:overworld";
/// Symbolic id of the nether
pub const THE_NETHER: &str = "minecraft:the_nether";
/// Symbolic id of the end
pub const THE_END: &str = "minecraft:the_end";

/// Fixed mapping of legacy integer dimension ids to their symbolic form
const LEGACY_DIMENSIONS: [(i32, &str); 3] = [(0, OVERWORLD), (-1, THE_NETHER), (1, THE_END)];

/// Unique identifier of a dimension (a world with its own blocks and entities)
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect, Serialize, Deserialize)]
pub struct DimensionId(String);

impl Default for DimensionId {
	fn default() -> Self {
		DimensionId::overworld()
	}
}

impl DimensionId {
	/// Create a new instance of [DimensionId] from a symbolic identifier
	pub fn new(id: impl Into<String>) -> Self {
		DimensionId(id.into())
	}
	/// The surface dimension
	pub fn overworld() -> Self {
		DimensionId::new(OVERWORLD)
	}
	/// The nether dimension
	pub fn the_nether() -> Self {
		DimensionId::new(THE_NETHER)
	}
	/// The end dimension
	pub fn the_end() -> Self {
		DimensionId::new(THE_END)
	}
	/// Map a legacy integer id onto its symbolic id. Ids outside of the
	/// registry become `legacy:<id>` which won't match any loaded level
	pub fn from_legacy(id: i32) -> Self {
		LEGACY_DIMENSIONS
			.iter()
			.find(|(legacy, _)| *legacy == id)
			.map(|(_, symbolic)| DimensionId::new(*symbolic))
			.unwrap_or_else(|| DimensionId(format!("legacy:{}", id)))
	}
	/// Get the legacy integer id of this dimension if it has one
	pub fn get_legacy(&self) -> Option<i32> {
		LEGACY_DIMENSIONS
			.iter()
			.find(|(_, symbolic)| *symbolic == self.0)
			.map(|(legacy, _)| *legacy)
	}
	/// Get the symbolic identifier
	pub fn get(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for DimensionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn legacy_ids_are_stable() {
		assert_eq!(DimensionId::overworld(), DimensionId::from_legacy(0));
		assert_eq!(DimensionId::the_nether(), DimensionId::from_legacy(-1));
		assert_eq!(DimensionId::the_end(), DimensionId::from_legacy(1));
	}
	#[test]
	fn unknown_legacy_id() {
		let result = DimensionId::from_legacy(7);
		assert_eq!("legacy:7", result.get());
		assert_eq!(None, result.get_legacy());
	}
	#[test]
	fn symbolic_to_legacy() {
		assert_eq!(Some(-1), DimensionId::the_nether().get_legacy());
		assert_eq!(None, DimensionId::new("mymod:mining").get_legacy());
	}
}
