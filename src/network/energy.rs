//! The energy capability. Anything able to hold energy exposes it through
//! [EnergyStorage], structures that can forward calls to a [PortalGroup]
//! expose [GroupEnergyStorage] which carries the extra `from_group` flag
//! telling them to answer from their own storage.
//!
//! All calls are total, they never fail and a call made with `simulate`
//! set to `true` reports what would happen without changing anything
//!

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Energy capability seen by producers and consumers
pub trait EnergyStorage {
	/// Offer `amount` of energy, returns how much was (or would be) accepted
	fn receive_energy(&mut self, amount: i32, simulate: bool) -> i32;
	/// Request `amount` of energy, returns how much was (or would be) handed over
	fn extract_energy(&mut self, amount: i32, simulate: bool) -> i32;
	/// Energy currently held
	fn get_energy_stored(&self) -> i32;
	/// Most energy that can be held
	fn get_max_energy_stored(&self) -> i32;
	/// Whether energy can be offered
	fn can_receive(&self) -> bool;
	/// Whether energy can be requested
	fn can_extract(&self) -> bool;
}

/// Energy capability of a structure that may belong to a [PortalGroup]. With
/// `from_group` set to `false` a grouped structure forwards to the group, with
/// `from_group` set to `true` it always uses its own storage
pub trait GroupEnergyStorage {
	/// Offer `amount`, see [EnergyStorage::receive_energy]
	fn receive_energy(&mut self, amount: i32, simulate: bool, from_group: bool) -> i32;
	/// Request `amount`, see [EnergyStorage::extract_energy]
	fn extract_energy(&mut self, amount: i32, simulate: bool, from_group: bool) -> i32;
	/// Energy held by the group, or locally
	fn get_energy_stored(&self, from_group: bool) -> i32;
	/// Capacity of the group, or of the local storage
	fn get_max_energy_stored(&self, from_group: bool) -> i32;
}

/// Generic block energy storage, e.g. an energy cell a [Harvester] can charge
#[derive(Component, Clone, Debug, Default, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct EnergyBuffer {
	/// Energy held
	energy: i32,
	/// Most energy held
	capacity: i32,
}

impl EnergyBuffer {
	/// Create a new empty instance of [EnergyBuffer]
	pub fn new(capacity: i32) -> Self {
		EnergyBuffer {
			energy: 0,
			capacity,
		}
	}
}

impl EnergyStorage for EnergyBuffer {
	fn receive_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		if amount < 0 {
			return -self.extract_energy(amount.saturating_neg(), simulate);
		}
		let accepted = amount.min(self.capacity - self.energy);
		if !simulate {
			self.energy += accepted;
		}
		accepted
	}
	fn extract_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		if amount < 0 {
			return -self.receive_energy(amount.saturating_neg(), simulate);
		}
		let extracted = amount.min(self.energy);
		if !simulate {
			self.energy -= extracted;
		}
		extracted
	}
	fn get_energy_stored(&self) -> i32 {
		self.energy
	}
	fn get_max_energy_stored(&self) -> i32 {
		self.capacity
	}
	fn can_receive(&self) -> bool {
		true
	}
	fn can_extract(&self) -> bool {
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn buffer_caps_at_capacity() {
		let mut buffer = EnergyBuffer::new(50);
		assert_eq!(50, buffer.receive_energy(80, false));
		assert_eq!(0, buffer.receive_energy(1, false));
		assert_eq!(50, buffer.get_energy_stored());
	}
	#[test]
	fn simulate_does_not_mutate() {
		let mut buffer = EnergyBuffer::new(50);
		assert_eq!(30, buffer.receive_energy(30, true));
		assert_eq!(0, buffer.get_energy_stored());
		buffer.receive_energy(30, false);
		assert_eq!(30, buffer.extract_energy(40, true));
		assert_eq!(30, buffer.get_energy_stored());
	}
	#[test]
	fn negative_receive_extracts() {
		let mut buffer = EnergyBuffer::new(50);
		buffer.receive_energy(20, false);
		assert_eq!(-20, buffer.receive_energy(-35, false));
		assert_eq!(0, buffer.get_energy_stored());
	}
	#[test]
	fn most_negative_amount_is_total() {
		let mut buffer = EnergyBuffer::new(50);
		buffer.receive_energy(20, false);
		assert_eq!(-20, buffer.receive_energy(i32::MIN, false));
		assert_eq!(-50, buffer.extract_energy(i32::MIN, false));
		assert_eq!(50, buffer.get_energy_stored());
	}
}
