//! A [Level] is the block grid of one dimension along with the entities of
//! any structures (hubs, harvesters, energy cells) placed in it. All loaded
//! levels live in the [Dimensions] resource which plays the role of the
//! server handle when resolving a [PortalTarget]
//!

use std::collections::{BTreeMap, HashMap};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// The kind of block occupying a cell
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Reflect, Serialize, Deserialize)]
pub enum BlockKind {
	/// Empty cell
	#[default]
	Air,
	/// Any block with no meaning to the portal network
	Solid,
	/// Plain portal frame block
	Frame,
	/// Frame block hosting a [Hub]
	Stabilizer,
	/// Filled interior cell of an active portal, optionally painted
	Portal(Option<DyeColor>),
	/// Block hosting a [Harvester]
	Harvester,
	/// Block hosting a generic [EnergyBuffer]
	EnergyCell,
}

impl BlockKind {
	/// Whether the block can form part of a portal frame
	pub fn is_frame_material(&self) -> bool {
		matches!(self, BlockKind::Frame | BlockKind::Stabilizer)
	}
	/// Whether the block can sit inside a portal frame
	pub fn is_interior(&self) -> bool {
		matches!(self, BlockKind::Air | BlockKind::Portal(_))
	}
}

/// Read access to block state, implemented by [Level] and by anything else
/// shape detection should be able to run against
pub trait BlockReader {
	/// Get the block at `pos`, unset cells are [BlockKind::Air]
	fn get_block(&self, pos: BlockPos) -> BlockKind;
}

/// Blocks and structure entities of a single dimension
#[derive(Debug, Clone)]
pub struct Level {
	/// The dimension this level belongs to
	dimension: DimensionId,
	/// Sparse block storage, any position not present is air
	blocks: HashMap<BlockPos, BlockKind>,
	/// Entities of the structures placed in the level
	structures: HashMap<BlockPos, Entity>,
	/// Positions changed through [Level::set_block] since the last drain
	changes: Vec<BlockPos>,
}

impl BlockReader for Level {
	fn get_block(&self, pos: BlockPos) -> BlockKind {
		self.blocks.get(&pos).copied().unwrap_or_default()
	}
}

impl Level {
	/// Create a new empty [Level]
	pub fn new(dimension: DimensionId) -> Self {
		Level {
			dimension,
			blocks: HashMap::new(),
			structures: HashMap::new(),
			changes: Vec::new(),
		}
	}
	/// Get the dimension of the level
	pub fn get_dimension(&self) -> &DimensionId {
		&self.dimension
	}
	/// Replace the block at `pos` and record the change so that any portal
	/// group built around `pos` can react to it. Returns the previous block
	pub fn set_block(&mut self, pos: BlockPos, kind: BlockKind) -> BlockKind {
		let previous = self.fill_block(pos, kind);
		if previous != kind {
			self.changes.push(pos);
		}
		previous
	}
	/// Replace the block at `pos` without recording a change, used by the
	/// portal network itself when painting or filling portal interiors
	pub(crate) fn fill_block(&mut self, pos: BlockPos, kind: BlockKind) -> BlockKind {
		let previous = if kind == BlockKind::Air {
			self.blocks.remove(&pos)
		} else {
			self.blocks.insert(pos, kind)
		};
		previous.unwrap_or_default()
	}
	/// Place a block along with the entity of the structure it hosts
	pub fn place_structure(&mut self, pos: BlockPos, kind: BlockKind, entity: Entity) {
		self.set_block(pos, kind);
		self.structures.insert(pos, entity);
	}
	/// Break the structure at `pos`, leaving air behind. Returns the entity
	/// that was hosted there so the caller can despawn it
	pub fn remove_structure(&mut self, pos: BlockPos) -> Option<Entity> {
		self.set_block(pos, BlockKind::Air);
		self.structures.remove(&pos)
	}
	/// Get the entity of the structure at `pos`
	pub fn get_structure(&self, pos: BlockPos) -> Option<Entity> {
		self.structures.get(&pos).copied()
	}
	/// Take every position changed since the last call
	pub fn drain_changes(&mut self) -> Vec<BlockPos> {
		std::mem::take(&mut self.changes)
	}
}

/// Every loaded [Level] keyed by its [DimensionId]
#[derive(Resource, Default, Debug)]
pub struct Dimensions {
	/// Loaded levels
	levels: BTreeMap<DimensionId, Level>,
}

impl Dimensions {
	/// Load a level, replacing any level already loaded for the same dimension
	pub fn insert_level(&mut self, level: Level) {
		self.levels.insert(level.get_dimension().clone(), level);
	}
	/// Unload the level of a dimension
	pub fn remove_level(&mut self, dimension: &DimensionId) -> Option<Level> {
		self.levels.remove(dimension)
	}
	/// Get a loaded level, [None] if the dimension isn't loaded
	pub fn get_level(&self, dimension: &DimensionId) -> Option<&Level> {
		self.levels.get(dimension)
	}
	/// Get a mutable reference to a loaded level
	pub fn get_level_mut(&mut self, dimension: &DimensionId) -> Option<&mut Level> {
		self.levels.get_mut(dimension)
	}
	/// Get a mutable reference to a level, loading an empty one if needed
	pub fn get_or_insert(&mut self, dimension: &DimensionId) -> &mut Level {
		self.levels
			.entry(dimension.clone())
			.or_insert_with(|| Level::new(dimension.clone()))
	}
	/// Iterate over mutable references of every loaded level
	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Level> {
		self.levels.values_mut()
	}
}

/// Where a structure entity sits in the world
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct Structure {
	/// Dimension of the structure
	dimension: DimensionId,
	/// Block position of the structure
	pos: BlockPos,
}

impl Structure {
	/// Create a new instance of [Structure]
	pub fn new(dimension: DimensionId, pos: BlockPos) -> Self {
		Structure { dimension, pos }
	}
	/// Get the dimension of the structure
	pub fn get_dimension(&self) -> &DimensionId {
		&self.dimension
	}
	/// Get the block the structure occupies
	pub fn get_pos(&self) -> BlockPos {
		self.pos
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn unset_cells_are_air() {
		let level = Level::new(DimensionId::overworld());
		assert_eq!(BlockKind::Air, level.get_block(BlockPos::new(4, 70, -3)));
	}
	#[test]
	fn set_block_records_change() {
		let mut level = Level::new(DimensionId::overworld());
		let pos = BlockPos::new(1, 2, 3);
		level.set_block(pos, BlockKind::Frame);
		// same block again is not a change
		level.set_block(pos, BlockKind::Frame);
		assert_eq!(vec![pos], level.drain_changes());
		assert!(level.drain_changes().is_empty());
	}
	#[test]
	fn fill_block_is_silent() {
		let mut level = Level::new(DimensionId::overworld());
		let pos = BlockPos::new(1, 2, 3);
		level.fill_block(pos, BlockKind::Portal(None));
		assert_eq!(BlockKind::Portal(None), level.get_block(pos));
		assert!(level.drain_changes().is_empty());
	}
	#[test]
	fn remove_structure_leaves_air() {
		let mut level = Level::new(DimensionId::overworld());
		let pos = BlockPos::new(0, 0, 0);
		let entity = Entity::from_raw(7);
		level.place_structure(pos, BlockKind::Stabilizer, entity);
		assert_eq!(Some(entity), level.get_structure(pos));
		assert_eq!(Some(entity), level.remove_structure(pos));
		assert_eq!(BlockKind::Air, level.get_block(pos));
		assert_eq!(None, level.get_structure(pos));
	}
	#[test]
	fn unloaded_dimension() {
		let mut dimensions = Dimensions::default();
		dimensions.get_or_insert(&DimensionId::the_end());
		assert!(dimensions.get_level(&DimensionId::the_end()).is_some());
		assert!(dimensions.get_level(&DimensionId::the_nether()).is_none());
	}
}
