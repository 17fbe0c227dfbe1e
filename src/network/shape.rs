//! Recognition of portal frames. Starting from a frame block the detector
//! flood fills the open cells next to it within one of the three axis
//! aligned planes. A fill that stays bounded by frame blocks is a valid
//! [PortalShape], anything else is a [ShapeRejection].
//!
//! ```text
//!  F F F F
//!  F . . F      F - frame or stabilizer block
//!  F . . F      . - air or portal block, the area of the shape
//!  F . . F
//!  F F F F
//! ```
//!

use std::collections::{BTreeSet, VecDeque};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// The interior cells of a validated portal frame and the frame cells bordering them
#[derive(Clone, Debug, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct PortalShape {
	/// Normal of the plane the frame is built in
	axis: PlaneAxis,
	/// Interior cells, sorted and unique
	area: Vec<BlockPos>,
	/// Frame cells touching the interior, sorted and unique
	frame: Vec<BlockPos>,
}

impl PortalShape {
	/// Create a new instance of [PortalShape] from unordered cells
	pub fn new(axis: PlaneAxis, area: Vec<BlockPos>, frame: Vec<BlockPos>) -> Self {
		let area: BTreeSet<BlockPos> = area.into_iter().collect();
		let frame: BTreeSet<BlockPos> = frame.into_iter().collect();
		PortalShape {
			axis,
			area: area.into_iter().collect(),
			frame: frame.into_iter().collect(),
		}
	}
	/// Get the normal of the frame plane
	pub fn get_axis(&self) -> PlaneAxis {
		self.axis
	}
	/// Get the interior cells
	pub fn get_area(&self) -> &[BlockPos] {
		&self.area
	}
	/// Get the frame blocks enclosing the interior
	pub fn get_frame(&self) -> &[BlockPos] {
		&self.frame
	}
	/// Number of interior cells
	pub fn get_area_size(&self) -> usize {
		self.area.len()
	}
	/// Whether `pos` is an interior cell of the shape
	pub fn contains(&self, pos: &BlockPos) -> bool {
		self.area.binary_search(pos).is_ok()
	}
	/// Two shapes overlap when their interiors share at least one cell
	pub fn overlaps(&self, other: &PortalShape) -> bool {
		let (small, large) = if self.area.len() <= other.area.len() {
			(self, other)
		} else {
			(other, self)
		};
		small.area.iter().any(|pos| large.contains(pos))
	}
	/// Whether the blocks still describe this shape, every frame cell is frame
	/// material and every interior cell can still be an interior
	pub fn is_intact(&self, level: &impl BlockReader) -> bool {
		self.frame
			.iter()
			.all(|pos| level.get_block(*pos).is_frame_material())
			&& self.area.iter().all(|pos| level.get_block(*pos).is_interior())
	}
	/// Detect the portal shape the frame block at `seed` belongs to.
	///
	/// Each plane is tried in [PlaneAxis::ALL] order and within a plane each open
	/// neighbour of the seed in [PlaneAxis::get_plane_offsets] order. The first
	/// bounded fill is returned. When every fill is rejected the first
	/// rejection met is returned
	pub fn find(
		level: &impl BlockReader,
		seed: BlockPos,
		max_area: usize,
		max_size: i32,
	) -> Result<PortalShape, ShapeRejection> {
		if !level.get_block(seed).is_frame_material() {
			return Err(ShapeRejection::NotAFrame(seed));
		}
		let mut first_rejection = None;
		for axis in PlaneAxis::ALL {
			for (dx, dy, dz) in axis.get_plane_offsets() {
				let start = seed.offset(dx, dy, dz);
				if !level.get_block(start).is_interior() {
					continue;
				}
				match flood(level, axis, seed, start, max_area, max_size) {
					Ok(shape) => return Ok(shape),
					Err(rejection) => {
						trace!("Fill from {:?} along {:?} rejected: {}", start, axis, rejection);
						if first_rejection.is_none() {
							first_rejection = Some(rejection);
						}
					}
				}
			}
		}
		Err(first_rejection.unwrap_or(ShapeRejection::NoInterior(seed)))
	}
}

/// Breadth first fill of interior cells from `start` within the plane of `axis`
fn flood(
	level: &impl BlockReader,
	axis: PlaneAxis,
	seed: BlockPos,
	start: BlockPos,
	max_area: usize,
	max_size: i32,
) -> Result<PortalShape, ShapeRejection> {
	let mut area = BTreeSet::from([start]);
	let mut frame = BTreeSet::new();
	let mut queue = VecDeque::from([start]);
	while let Some(cell) = queue.pop_front() {
		if axis.get_plane_span(seed, cell) > max_size {
			return Err(ShapeRejection::NotClosed { seed, max_size });
		}
		for (dx, dy, dz) in axis.get_plane_offsets() {
			let next = cell.offset(dx, dy, dz);
			if area.contains(&next) || frame.contains(&next) {
				continue;
			}
			let block = level.get_block(next);
			if block.is_frame_material() {
				frame.insert(next);
			} else if block.is_interior() {
				if area.len() >= max_area {
					return Err(ShapeRejection::TooLarge { max_area });
				}
				area.insert(next);
				queue.push_back(next);
			} else {
				return Err(ShapeRejection::InvalidInterior(next));
			}
		}
	}
	Ok(PortalShape {
		axis,
		area: area.into_iter().collect(),
		frame: frame.into_iter().collect(),
	})
}
