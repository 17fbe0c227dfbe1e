//! The 16 dye colours used to tag portal targets and paint portal blocks
//!

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A dye colour with a stable numeric id used in persisted records
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect, Serialize, Deserialize)]
pub enum DyeColor {
	/// Id `0`
	White,
	/// Id `1`
	Orange,
	/// Id `2`
	Magenta,
	/// Id `3`
	LightBlue,
	/// Id `4`
	Yellow,
	/// Id `5`
	Lime,
	/// Id `6`
	Pink,
	/// Id `7`
	Gray,
	/// Id `8`
	LightGray,
	/// Id `9`
	Cyan,
	/// Id `10`
	Purple,
	/// Id `11`
	Blue,
	/// Id `12`
	Brown,
	/// Id `13`
	Green,
	/// Id `14`
	Red,
	/// Id `15`
	Black,
}

impl DyeColor {
	/// Every colour ordered by id
	pub const ALL: [DyeColor; 16] = [
		DyeColor::White,
		DyeColor::Orange,
		DyeColor::Magenta,
		DyeColor::LightBlue,
		DyeColor::Yellow,
		DyeColor::Lime,
		DyeColor::Pink,
		DyeColor::Gray,
		DyeColor::LightGray,
		DyeColor::Cyan,
		DyeColor::Purple,
		DyeColor::Blue,
		DyeColor::Brown,
		DyeColor::Green,
		DyeColor::Red,
		DyeColor::Black,
	];
	/// Get the persisted id `0..=15`
	pub fn get_id(&self) -> u8 {
		*self as u8
	}
	/// Look up a colour from its persisted id, [None] for anything outside `0..=15`
	pub fn from_id(id: i32) -> Option<Self> {
		usize::try_from(id)
			.ok()
			.and_then(|index| DyeColor::ALL.get(index).copied())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn ids_match_order() {
		for (i, color) in DyeColor::ALL.iter().enumerate() {
			assert_eq!(i as u8, color.get_id());
			assert_eq!(Some(*color), DyeColor::from_id(i as i32));
		}
	}
	#[test]
	fn out_of_range_id() {
		assert_eq!(None, DyeColor::from_id(16));
		assert_eq!(None, DyeColor::from_id(-1));
	}
}
