//! Recoverable failures of the portal network. Bookkeeping bugs (a target
//! index outside of the declared capacity, a group used after it has been
//! destroyed) are not represented here, they panic
//!

use thiserror::Error;

use crate::prelude::*;

/// Why shape detection could not produce a [PortalShape]. This is the normal
/// "frame not built yet" outcome and is reported back to the operator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeRejection {
	/// The seed block is not frame material
	#[error("block at {0:?} is not part of a portal frame")]
	NotAFrame(BlockPos),
	/// No air or portal cell borders the seed
	#[error("frame block at {0:?} has no open interior next to it")]
	NoInterior(BlockPos),
	/// The flood fill escaped the size limit
	#[error("portal frame around {seed:?} does not close within {max_size} blocks")]
	NotClosed { seed: BlockPos, max_size: i32 },
	/// Too many interior cells
	#[error("portal interior exceeds the maximum area of {max_area} blocks")]
	TooLarge { max_area: usize },
	/// A cell inside the frame is neither air nor portal
	#[error("block at {0:?} cannot be part of a portal interior")]
	InvalidInterior(BlockPos),
}

/// Errors surfaced by the portal network
#[derive(Debug, Error)]
pub enum PortalError {
	/// Shape detection failed
	#[error("portal shape rejected: {0}")]
	Shape(#[from] ShapeRejection),
	/// The dimension of a target is not loaded, the caller should skip the
	/// transfer and try again on the next activation
	#[error("target dimension `{0}` is not loaded")]
	UnreachableTarget(DimensionId),
	/// Reading a file failed
	#[error("failed reading config file: {0}")]
	Io(#[from] std::io::Error),
	/// A `ron` file is malformed
	#[cfg(feature = "ron")]
	#[error("failed deserializing config: {0}")]
	Ron(#[from] ron::error::SpannedError),
}
