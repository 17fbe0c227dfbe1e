//! A [PortalTarget] is a named, optionally coloured destination in some
//! dimension. Targets are stored in the slots of a [PortalGroup] or of an
//! ungrouped [Hub] and persisted as a [TargetRecord]
//!

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Name given to a persisted target that carries none
pub const PLACEHOLDER_NAME: &str = "Target Destination";

/// Destination of a teleport
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct PortalTarget {
	/// Dimension of the destination
	dimension: DimensionId,
	/// Block the traveller arrives in
	pos: BlockPos,
	/// Facing of the traveller on arrival
	yaw: f32,
	/// Label of the target, at most [MAX_NAME_LENGTH] characters
	name: String,
	/// Colour tag of the target
	color: Option<DyeColor>,
}

impl PortalTarget {
	/// Create a new instance of [PortalTarget], names longer than
	/// [MAX_NAME_LENGTH] are truncated
	pub fn new(
		dimension: DimensionId,
		pos: BlockPos,
		yaw: f32,
		name: &str,
		color: Option<DyeColor>,
	) -> Self {
		PortalTarget {
			dimension,
			pos,
			yaw,
			name: truncate_name(name),
			color,
		}
	}
	/// Get the dimension to arrive in
	pub fn get_dimension(&self) -> &DimensionId {
		&self.dimension
	}
	/// Get the block to arrive in
	pub fn get_pos(&self) -> BlockPos {
		self.pos
	}
	/// Get the facing on arrival
	pub fn get_yaw(&self) -> f32 {
		self.yaw
	}
	/// Get the display name
	pub fn get_name(&self) -> &str {
		&self.name
	}
	/// Get the colour shown for this target
	pub fn get_color(&self) -> Option<DyeColor> {
		self.color
	}
	/// Rename, keeping at most [MAX_NAME_LENGTH] characters
	pub(crate) fn set_name(&mut self, name: &str) {
		self.name = truncate_name(name);
	}
	/// Set or clear the colour
	pub(crate) fn set_color(&mut self, color: Option<DyeColor>) {
		self.color = color;
	}
	/// Where a traveller is placed, the horizontal centre of the target block
	pub fn get_destination(&self) -> Vec3 {
		let (x, y, z) = self.pos.get();
		Vec3::new(x as f32 + 0.5, y as f32, z as f32 + 0.5)
	}
	/// Get the level of the target dimension, [None] when it isn't loaded
	pub fn get_world<'a>(&self, dimensions: &'a Dimensions) -> Option<&'a Level> {
		dimensions.get_level(&self.dimension)
	}
	/// Get the level of the target dimension or report it as unreachable
	pub fn resolve<'a>(&self, dimensions: &'a Dimensions) -> Result<&'a Level, PortalError> {
		self.get_world(dimensions)
			.ok_or_else(|| PortalError::UnreachableTarget(self.dimension.clone()))
	}
	/// Persist the target, the dimension is always written in its symbolic form
	pub fn write(&self) -> TargetRecord {
		let (x, y, z) = self.pos.get();
		TargetRecord {
			dimension: Some(DimensionField::Symbolic(self.dimension.get().to_string())),
			x,
			y,
			z,
			yaw: self.yaw,
			name: Some(self.name.clone()),
			color: self.color.map(|c| c.get_id() as i32),
		}
	}
	/// Restore a target from a record. Missing fields take their defaults
	/// and a colour id outside of the 16 dyes is dropped
	pub fn read(record: &TargetRecord) -> Self {
		let dimension = match &record.dimension {
			Some(DimensionField::Symbolic(id)) => DimensionId::new(id.as_str()),
			Some(DimensionField::Legacy(id)) => DimensionId::from_legacy(*id),
			None => DimensionId::overworld(),
		};
		let name = record.name.as_deref().unwrap_or(PLACEHOLDER_NAME);
		PortalTarget::new(
			dimension,
			BlockPos::new(record.x, record.y, record.z),
			record.yaw,
			name,
			record.color.and_then(DyeColor::from_id),
		)
	}
}

/// Names are counted in characters rather than bytes
fn truncate_name(name: &str) -> String {
	name.chars().take(MAX_NAME_LENGTH).collect()
}

/// A dimension as found in a persisted record, either the symbolic id or a
/// legacy integer id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionField {
	/// Id such as `minecraft:the_nether`
	Symbolic(String),
	/// Integer id written by old saves
	Legacy(i32),
}

/// Persisted form of a [PortalTarget]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetRecord {
	/// Dimension to arrive in, missing means the overworld
	pub dimension: Option<DimensionField>,
	/// Block `x`
	pub x: i32,
	/// Block `y`
	pub y: i32,
	/// Block `z`
	pub z: i32,
	/// Facing on arrival
	pub yaw: f32,
	/// Display name
	pub name: Option<String>,
	/// Colour as a dye index
	#[serde(skip_serializing_if = "Option::is_none")]
	pub color: Option<i32>,
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn long_name_truncated() {
		let target = PortalTarget::new(
			DimensionId::overworld(),
			BlockPos::new(0, 0, 0),
			0.0,
			"Underground Base",
			None,
		);
		assert_eq!("Undergroun", target.get_name());
	}
	#[test]
	fn rename_truncates() {
		let mut target = PortalTarget::new(
			DimensionId::overworld(),
			BlockPos::new(0, 0, 0),
			0.0,
			"Home",
			None,
		);
		target.set_name("Ümlaut Ünterführung");
		assert_eq!(10, target.get_name().chars().count());
	}
	#[test]
	fn write_read() {
		let target = PortalTarget::new(
			DimensionId::the_nether(),
			BlockPos::new(-12, 40, 900),
			90.0,
			"Fortress",
			Some(DyeColor::Purple),
		);
		let result = PortalTarget::read(&target.write());
		assert_eq!(target, result);
	}
	#[test]
	fn legacy_dimension_matches_symbolic() {
		let mut dimensions = Dimensions::default();
		dimensions.insert_level(Level::new(DimensionId::the_nether()));
		let legacy = TargetRecord {
			dimension: Some(DimensionField::Legacy(-1)),
			..Default::default()
		};
		let symbolic = TargetRecord {
			dimension: Some(DimensionField::Symbolic("minecraft:the_nether".to_string())),
			..Default::default()
		};
		let a = PortalTarget::read(&legacy);
		let b = PortalTarget::read(&symbolic);
		let level_a = a.get_world(&dimensions).unwrap();
		let level_b = b.get_world(&dimensions).unwrap();
		assert_eq!(level_a.get_dimension(), level_b.get_dimension());
	}
	#[test]
	fn missing_fields_take_defaults() {
		let result = PortalTarget::read(&TargetRecord::default());
		assert_eq!(&DimensionId::overworld(), result.get_dimension());
		assert_eq!(BlockPos::new(0, 0, 0), result.get_pos());
		assert_eq!("Target Des", result.get_name());
		assert_eq!(None, result.get_color());
	}
	#[test]
	fn invalid_color_dropped() {
		let record = TargetRecord {
			color: Some(42),
			..Default::default()
		};
		assert_eq!(None, PortalTarget::read(&record).get_color());
	}
	#[test]
	fn unloaded_dimension_is_unreachable() {
		let dimensions = Dimensions::default();
		let target = PortalTarget::new(
			DimensionId::the_end(),
			BlockPos::new(0, 0, 0),
			0.0,
			"End",
			None,
		);
		assert!(target.get_world(&dimensions).is_none());
		let result = target.resolve(&dimensions);
		assert!(matches!(result, Err(PortalError::UnreachableTarget(_))));
	}
	#[test]
	fn destination_is_block_centre() {
		let target = PortalTarget::new(
			DimensionId::overworld(),
			BlockPos::new(3, 70, -8),
			0.0,
			"Spawn",
			None,
		);
		assert_eq!(Vec3::new(3.5, 70.0, -7.5), target.get_destination());
	}
	#[test]
	#[cfg(feature = "ron")]
	fn legacy_integer_dimension_from_ron() {
		let record: TargetRecord = ron::from_str("(dimension: Some(1), x: 5, name: Some(\"Stronghold\"))").unwrap();
		let result = PortalTarget::read(&record);
		assert_eq!(&DimensionId::the_end(), result.get_dimension());
		assert_eq!("Stronghold", result.get_name());
	}
}
