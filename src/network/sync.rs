//! Snapshots published to clients. A group or hub marks itself dirty when
//! its targets or colour change and when its energy moves far enough, the
//! sync layer then publishes one full snapshot and clears the mark.
//! Snapshots carry complete state so a [GroupMirror] can apply the same
//! snapshot any number of times
//!

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::prelude::*;

/// Full client visible state of a [PortalGroup]
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSnapshot {
	/// Group id
	pub id: GroupId,
	/// Dimension of the frame
	pub dimension: DimensionId,
	/// Stabilizer positions
	pub hubs: Vec<BlockPos>,
	/// Number of interior cells
	pub relay_count: usize,
	/// Pooled energy
	pub energy: i32,
	/// Most energy the pool holds
	pub energy_capacity: i32,
	/// Target slots
	pub targets: Vec<Option<PortalTarget>>,
	/// Slot travellers are sent to
	pub active_target: Option<usize>,
	/// Paint colour of the portal
	pub color: Option<DyeColor>,
}

impl GroupSnapshot {
	/// Capture the current state of a group
	pub fn new(group: &PortalGroup) -> Self {
		GroupSnapshot {
			id: group.get_id(),
			dimension: group.get_dimension().clone(),
			hubs: group.get_hubs().iter().copied().collect(),
			relay_count: group.get_relays().len(),
			energy: group.get_energy_stored(),
			energy_capacity: group.get_max_energy_stored(),
			targets: group.get_targets().to_vec(),
			active_target: group.get_active_target_index(),
			color: group.get_color(),
		}
	}
}

/// Client visible state of a single hub, `group` is set while the hub is
/// grouped in which case energy and targets are those of the group
#[derive(Clone, Debug, PartialEq)]
pub struct HubSnapshot {
	/// Entity of the [Hub]
	pub hub: Entity,
	/// Group of the hub, if any
	pub group: Option<GroupId>,
	/// Energy of the hub or its group
	pub energy: i32,
	/// Capacity of the hub or its group
	pub energy_capacity: i32,
	/// Target slots of the hub or its group
	pub targets: Vec<Option<PortalTarget>>,
}

impl HubSnapshot {
	/// Capture what a client sees of a hub through its view
	pub fn new(hub: Entity, group: Option<GroupId>, view: &HubView) -> Self {
		let capacity = view.get_target_capacity(false);
		HubSnapshot {
			hub,
			group,
			energy: GroupEnergyStorage::get_energy_stored(view, false),
			energy_capacity: GroupEnergyStorage::get_max_energy_stored(view, false),
			targets: (0..capacity)
				.map(|i| view.get_target(i, false).cloned())
				.collect(),
		}
	}
}

/// Client side copy of every group, kept up to date from snapshots
#[derive(Resource, Default, Debug)]
pub struct GroupMirror {
	/// Latest snapshot of every group
	groups: BTreeMap<GroupId, GroupSnapshot>,
}

impl GroupMirror {
	/// Store a snapshot, replacing any older one of the same group
	pub fn apply(&mut self, snapshot: GroupSnapshot) {
		self.groups.insert(snapshot.id, snapshot);
	}
	/// Forget a destroyed group
	pub fn remove(&mut self, id: GroupId) -> Option<GroupSnapshot> {
		self.groups.remove(&id)
	}
	/// Get the latest snapshot of a group
	pub fn get(&self, id: GroupId) -> Option<&GroupSnapshot> {
		self.groups.get(&id)
	}
	/// Number of mirrored groups
	pub fn len(&self) -> usize {
		self.groups.len()
	}
	/// Whether no group is mirrored
	pub fn is_empty(&self) -> bool {
		self.groups.is_empty()
	}
}
