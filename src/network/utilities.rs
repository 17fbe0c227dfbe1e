//! Useful structures and tools used across the portal network
//!

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of candidate cells a [crate::prelude::Harvester] classifies each tick
pub const HARVEST_CELLS_PER_TICK: usize = 5;
/// Longest name a [crate::prelude::PortalTarget] can carry, longer names are truncated
pub const MAX_NAME_LENGTH: usize = 10;

/// Integer `(x, y, z)` position of a block within a single dimension
#[derive(
	Clone,
	Copy,
	PartialEq,
	Eq,
	PartialOrd,
	Ord,
	Debug,
	Default,
	Hash,
	Reflect,
	Serialize,
	Deserialize,
)]
pub struct BlockPos((i32, i32, i32));

impl BlockPos {
	/// Create a new instance of [BlockPos]
	pub fn new(x: i32, y: i32, z: i32) -> Self {
		BlockPos((x, y, z))
	}
	/// Get the `(x, y, z)` tuple
	pub fn get(&self) -> (i32, i32, i32) {
		self.0
	}
	/// Get the `x` coordinate
	pub fn get_x(&self) -> i32 {
		self.0 .0
	}
	/// Get the `y` coordinate
	pub fn get_y(&self) -> i32 {
		self.0 .1
	}
	/// Get the `z` coordinate
	pub fn get_z(&self) -> i32 {
		self.0 .2
	}
	/// Position shifted by `(dx, dy, dz)`
	pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
		BlockPos::new(self.get_x() + dx, self.get_y() + dy, self.get_z() + dz)
	}
	/// The block containing a point in continuous space, coordinates are
	/// floored so that `-0.5` lands in block `-1`
	pub fn from_translation(translation: Vec3) -> Self {
		BlockPos::new(
			translation.x.floor() as i32,
			translation.y.floor() as i32,
			translation.z.floor() as i32,
		)
	}
}

/// The normal of the plane a portal frame is built in. A frame standing
/// upright and facing north/south has the normal [PlaneAxis::Z], a frame lying
/// flat on the ground has the normal [PlaneAxis::Y]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Reflect, Serialize, Deserialize)]
pub enum PlaneAxis {
	/// East-west normal
	X,
	/// Up-down normal, a frame lying flat
	Y,
	/// North-south normal
	Z,
}

impl PlaneAxis {
	/// Every plane normal in the order shape detection tries them
	pub const ALL: [PlaneAxis; 3] = [PlaneAxis::X, PlaneAxis::Y, PlaneAxis::Z];

	/// The four orthogonal neighbour offsets lying within the plane of this normal
	pub fn get_plane_offsets(&self) -> [(i32, i32, i32); 4] {
		match self {
			PlaneAxis::X => [(0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)],
			PlaneAxis::Y => [(1, 0, 0), (-1, 0, 0), (0, 0, 1), (0, 0, -1)],
			PlaneAxis::Z => [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0)],
		}
	}
	/// Largest distance between two positions along either of the in-plane axes
	pub fn get_plane_span(&self, a: BlockPos, b: BlockPos) -> i32 {
		let dx = (a.get_x() - b.get_x()).abs();
		let dy = (a.get_y() - b.get_y()).abs();
		let dz = (a.get_z() - b.get_z()).abs();
		match self {
			PlaneAxis::X => dy.max(dz),
			PlaneAxis::Y => dx.max(dz),
			PlaneAxis::Z => dx.max(dy),
		}
	}
}
