//! Tunable limits of the portal network. A [PortalConfig] is read once when
//! the plugin is built and domain types copy what they need at construction,
//! nothing reads it back later on
//!

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "ron")]
use crate::prelude::*;

/// Capacities, ranges and limits used when building groups, hubs and harvesters
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
	/// Largest number of interior cells a portal frame may enclose
	pub max_portal_area: usize,
	/// Largest distance from the activated frame block to any interior cell
	/// along either axis of the frame plane
	pub max_portal_size: i32,
	/// Number of target slots of a group and of an ungrouped hub
	pub target_capacity: usize,
	/// Energy a group can pool
	pub group_energy_capacity: i32,
	/// Energy an ungrouped hub can hold locally
	pub hub_energy_capacity: i32,
	/// Energy a harvester can buffer
	pub harvester_energy_capacity: i32,
	/// Half-width of the cube a harvester scans around itself
	pub harvester_range: i32,
	/// Most energy a harvester hands out per tick across all consumers
	pub harvester_transfer_limit: i32,
	/// Energy a harvester produces on its own each tick
	pub harvester_generation_per_tick: i32,
	/// Ticks after a teleport during which the same traveller cannot teleport again
	pub teleport_cooldown_ticks: i64,
	/// Change in stored energy that makes a group or hub publish an update
	pub energy_report_threshold: i32,
}

impl Default for PortalConfig {
	fn default() -> Self {
		PortalConfig {
			max_portal_area: 400,
			max_portal_size: 24,
			target_capacity: 4,
			group_energy_capacity: 1000,
			hub_energy_capacity: 1000,
			harvester_energy_capacity: 10_000,
			harvester_range: 5,
			harvester_transfer_limit: 100,
			harvester_generation_per_tick: 0,
			teleport_cooldown_ticks: 40,
			energy_report_threshold: 100,
		}
	}
}

impl PortalConfig {
	/// From a `ron` file generate the [PortalConfig], any field missing from
	/// the file keeps its default value
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> Result<Self, PortalError> {
		let file = std::fs::File::open(path)?;
		let config: PortalConfig = ron::de::from_reader(file)?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn default_cooldown_is_two_seconds() {
		let config = PortalConfig::default();
		assert_eq!(40, config.teleport_cooldown_ticks);
	}
	#[test]
	#[cfg(feature = "ron")]
	fn config_file() {
		let path = env!("CARGO_MANIFEST_DIR").to_string() + "/assets/portal_config.ron";
		let result = PortalConfig::from_ron(path).unwrap();
		assert_eq!(2000, result.group_energy_capacity);
		assert_eq!(3, result.harvester_range);
		// absent from the file
		assert_eq!(40, result.teleport_cooldown_ticks);
	}
	#[test]
	#[cfg(feature = "ron")]
	fn missing_config_file() {
		let path = env!("CARGO_MANIFEST_DIR").to_string() + "/assets/does_not_exist.ron";
		let result = PortalConfig::from_ron(path);
		assert!(matches!(result, Err(PortalError::Io(_))));
	}
}
