//! Member structures of a portal. A hub (stabilizer block) keeps its own
//! target slots and energy for as long as it isn't part of a group, once it
//! joins one every query goes to the group instead. Relay cells carry no
//! state of their own.
//!
//! Since a hub never holds a reference to its group the pairing is made at
//! the call site: look the group up in [PortalGroups] and wrap both in a
//! [HubView] (or a [RelayView] for an interior cell)
//!

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Local state of a stabilizer
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Hub {
	/// Target slots used while ungrouped
	targets: Vec<Option<PortalTarget>>,
	/// Energy held while ungrouped, never handed to a group
	energy: i32,
	/// Most energy held while ungrouped
	energy_capacity: i32,
	/// Targets changed since the last sync
	dirty: bool,
	/// Energy reported by the last sync
	last_synced_energy: i32,
}

impl Hub {
	/// Create a new instance of [Hub] with empty slots
	pub fn new(config: &PortalConfig) -> Self {
		Hub {
			targets: vec![None; config.target_capacity],
			energy: 0,
			energy_capacity: config.hub_energy_capacity,
			dirty: true,
			last_synced_energy: 0,
		}
	}
	/// Get the local target slots
	pub fn get_targets(&self) -> &[Option<PortalTarget>] {
		&self.targets
	}
	/// Panics when `index` is not a slot of this hub
	fn check_index(&self, index: usize) {
		if index >= self.targets.len() {
			panic!(
				"Target index {} is outside of the {} slots of the hub",
				index,
				self.targets.len()
			);
		}
	}
	/// Whether clients should be told about this hub
	pub fn needs_sync(&self, threshold: i32) -> bool {
		self.dirty
			|| energy_report_due(
				self.energy,
				self.last_synced_energy,
				self.energy_capacity,
				threshold,
			)
	}
	/// Remember what clients were last told
	pub(crate) fn mark_synced(&mut self) {
		self.dirty = false;
		self.last_synced_energy = self.energy;
	}
	/// Force the next sync, used when the hub joins or leaves a group
	pub(crate) fn mark_dirty(&mut self) {
		self.dirty = true;
	}
	/// Persist the local state. The legacy single target field is never written
	pub fn write(&self) -> HubRecord {
		HubRecord {
			targets: self
				.targets
				.iter()
				.map(|slot| slot.as_ref().map(PortalTarget::write))
				.collect(),
			energy: self.energy,
			group: None,
		}
	}
	/// Restore the local state, migrating a legacy record first. Slots past
	/// the configured capacity are dropped and energy is clamped
	pub fn read(record: HubRecord, config: &PortalConfig) -> Self {
		let record = record.migrate();
		let mut targets: Vec<Option<PortalTarget>> = record
			.targets
			.iter()
			.map(|slot| slot.as_ref().map(PortalTarget::read))
			.collect();
		targets.resize(config.target_capacity, None);
		let energy = record.energy.clamp(0, config.hub_energy_capacity);
		Hub {
			targets,
			energy,
			energy_capacity: config.hub_energy_capacity,
			dirty: true,
			last_synced_energy: energy,
		}
	}
}

/// A [Hub] paired with the group it belongs to, if any
pub struct HubView<'a> {
	/// The hub
	hub: &'a mut Hub,
	/// Group the hub belongs to
	group: Option<&'a mut PortalGroup>,
}

impl<'a> HubView<'a> {
	/// Create a new instance of [HubView]
	pub fn new(hub: &'a mut Hub, group: Option<&'a mut PortalGroup>) -> Self {
		HubView { hub, group }
	}
	/// Whether the hub is part of a group
	pub fn has_group(&self) -> bool {
		self.group.is_some()
	}
	/// Get the group unless `from_group` asks for local storage
	fn delegate(&mut self, from_group: bool) -> Option<&mut PortalGroup> {
		if from_group {
			None
		} else {
			self.group.as_deref_mut()
		}
	}
	/// Get the group unless `from_group` asks for local storage
	fn delegate_ref(&self, from_group: bool) -> Option<&PortalGroup> {
		if from_group {
			None
		} else {
			self.group.as_deref()
		}
	}
	/// Get the target in slot `index` of the group, or of the hub itself
	pub fn get_target(&self, index: usize, from_group: bool) -> Option<&PortalTarget> {
		match self.delegate_ref(from_group) {
			Some(group) => group.get_target(index),
			None => {
				self.hub.check_index(index);
				self.hub.targets[index].as_ref()
			}
		}
	}
	/// Store or clear slot `index` of the group, or of the hub itself
	pub fn set_target(&mut self, index: usize, target: Option<PortalTarget>, from_group: bool) {
		match self.delegate(from_group) {
			Some(group) => group.set_target(index, target),
			None => {
				self.hub.check_index(index);
				self.hub.targets[index] = target;
				self.hub.dirty = true;
			}
		}
	}
	/// Put `target` in the first empty slot, [None] when every slot is taken
	pub fn add_target(&mut self, target: PortalTarget, from_group: bool) -> Option<usize> {
		match self.delegate(from_group) {
			Some(group) => group.add_target(target),
			None => {
				let index = self.hub.targets.iter().position(|slot| slot.is_none())?;
				self.hub.targets[index] = Some(target);
				self.hub.dirty = true;
				Some(index)
			}
		}
	}
	/// Number of slots holding a target
	pub fn get_non_null_target_count(&self, from_group: bool) -> usize {
		match self.delegate_ref(from_group) {
			Some(group) => group.get_non_null_target_count(),
			None => self.hub.targets.iter().filter(|slot| slot.is_some()).count(),
		}
	}
	/// Number of slots
	pub fn get_target_capacity(&self, from_group: bool) -> usize {
		match self.delegate_ref(from_group) {
			Some(group) => group.get_target_capacity(),
			None => self.hub.targets.len(),
		}
	}
	/// Rename the target in slot `index`, returns `false` for an empty slot
	pub fn rename_target(&mut self, index: usize, name: &str, from_group: bool) -> bool {
		match self.delegate(from_group) {
			Some(group) => group.rename_target(index, name),
			None => {
				self.hub.check_index(index);
				match self.hub.targets[index].as_mut() {
					Some(target) => {
						target.set_name(name);
						self.hub.dirty = true;
						true
					}
					None => false,
				}
			}
		}
	}
	/// Recolour the target in slot `index`, returns `false` for an empty slot
	pub fn set_target_color(
		&mut self,
		index: usize,
		color: Option<DyeColor>,
		from_group: bool,
	) -> bool {
		match self.delegate(from_group) {
			Some(group) => group.set_target_color(index, color),
			None => {
				self.hub.check_index(index);
				match self.hub.targets[index].as_mut() {
					Some(target) => {
						target.set_color(color);
						self.hub.dirty = true;
						true
					}
					None => false,
				}
			}
		}
	}
}

impl GroupEnergyStorage for HubView<'_> {
	fn receive_energy(&mut self, amount: i32, simulate: bool, from_group: bool) -> i32 {
		if let Some(group) = self.delegate(from_group) {
			return group.receive_energy(amount, simulate);
		}
		if amount < 0 {
			return -GroupEnergyStorage::extract_energy(self, amount.saturating_neg(), simulate, true);
		}
		let hub = &mut *self.hub;
		let accepted = amount.min(hub.energy_capacity - hub.energy);
		if !simulate {
			hub.energy += accepted;
		}
		accepted
	}
	fn extract_energy(&mut self, amount: i32, simulate: bool, from_group: bool) -> i32 {
		if let Some(group) = self.delegate(from_group) {
			return group.extract_energy(amount, simulate);
		}
		if amount < 0 {
			return -GroupEnergyStorage::receive_energy(self, amount.saturating_neg(), simulate, true);
		}
		let hub = &mut *self.hub;
		let extracted = amount.min(hub.energy);
		if !simulate {
			hub.energy -= extracted;
		}
		extracted
	}
	fn get_energy_stored(&self, from_group: bool) -> i32 {
		match self.delegate_ref(from_group) {
			Some(group) => group.get_energy_stored(),
			None => self.hub.energy,
		}
	}
	fn get_max_energy_stored(&self, from_group: bool) -> i32 {
		match self.delegate_ref(from_group) {
			Some(group) => group.get_max_energy_stored(),
			None => self.hub.energy_capacity,
		}
	}
}

/// Outside view of a hub, producers push energy in but nothing can pull it out
impl EnergyStorage for HubView<'_> {
	fn receive_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		GroupEnergyStorage::receive_energy(self, amount, simulate, false)
	}
	fn extract_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		GroupEnergyStorage::extract_energy(self, amount, simulate, false)
	}
	fn get_energy_stored(&self) -> i32 {
		GroupEnergyStorage::get_energy_stored(self, false)
	}
	fn get_max_energy_stored(&self) -> i32 {
		GroupEnergyStorage::get_max_energy_stored(self, false)
	}
	fn can_receive(&self) -> bool {
		true
	}
	fn can_extract(&self) -> bool {
		false
	}
}

/// An interior cell paired with its group. An ungrouped relay has no storage
pub struct RelayView<'a> {
	/// Group of the relay cell
	group: Option<&'a mut PortalGroup>,
}

impl<'a> RelayView<'a> {
	/// Create a new instance of [RelayView]
	pub fn new(group: Option<&'a mut PortalGroup>) -> Self {
		RelayView { group }
	}
	/// Whether the relay cell is part of a group
	pub fn has_group(&self) -> bool {
		self.group.is_some()
	}
}

impl EnergyStorage for RelayView<'_> {
	fn receive_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		match self.group.as_deref_mut() {
			Some(group) => group.receive_energy(amount, simulate),
			None => 0,
		}
	}
	fn extract_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		match self.group.as_deref_mut() {
			Some(group) => group.extract_energy(amount, simulate),
			None => 0,
		}
	}
	fn get_energy_stored(&self) -> i32 {
		self.group.as_deref().map_or(0, |g| g.get_energy_stored())
	}
	fn get_max_energy_stored(&self) -> i32 {
		self.group.as_deref().map_or(0, |g| g.get_max_energy_stored())
	}
	fn can_receive(&self) -> bool {
		self.group.is_some()
	}
	fn can_extract(&self) -> bool {
		false
	}
}

/// Persisted form of a [Hub]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubRecord {
	/// Indexed target slots
	pub targets: Vec<Option<TargetRecord>>,
	/// Energy held while ungrouped
	pub energy: i32,
	/// Single target kept by records written before hubs had slots
	#[serde(skip_serializing)]
	pub group: Option<LegacyGroupRecord>,
}

/// The `group` field of an old [HubRecord]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyGroupRecord {
	/// The only target of an old hub
	pub target: Option<TargetRecord>,
}

impl HubRecord {
	/// Move a legacy single target into slot 0
	pub fn migrate(mut self) -> Self {
		if let Some(target) = self.group.take().and_then(|legacy| legacy.target) {
			if self.targets.is_empty() {
				self.targets.push(None);
			}
			self.targets[0] = Some(target);
		}
		self
	}
	/// From a `ron` file read a [HubRecord]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> Result<Self, PortalError> {
		let file = std::fs::File::open(path)?;
		let record: HubRecord = ron::de::from_reader(file)?;
		Ok(record)
	}
}
