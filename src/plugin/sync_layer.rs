//! Publishes snapshots of groups and hubs that changed during the tick.
//! Hubs are published first as a grouped hub mirrors the state of its group
//! and that state is only marked clean once the groups have gone out
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Full state of a group that changed
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EventGroupUpdate(GroupSnapshot);

impl EventGroupUpdate {
	/// Create a new instance of [EventGroupUpdate]
	#[cfg(not(tarpaulin_include))]
	pub fn new(snapshot: GroupSnapshot) -> Self {
		EventGroupUpdate(snapshot)
	}
	/// Get the snapshot
	#[cfg(not(tarpaulin_include))]
	pub fn get(&self) -> &GroupSnapshot {
		&self.0
	}
}

/// Full state of a hub that changed, or whose group did
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EventHubUpdate(HubSnapshot);

impl EventHubUpdate {
	/// Create a new instance of [EventHubUpdate]
	#[cfg(not(tarpaulin_include))]
	pub fn new(snapshot: HubSnapshot) -> Self {
		EventHubUpdate(snapshot)
	}
	/// Get the snapshot
	#[cfg(not(tarpaulin_include))]
	pub fn get(&self) -> &HubSnapshot {
		&self.0
	}
}

/// A group was destroyed
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventGroupRemoved(GroupId);

impl EventGroupRemoved {
	/// Create a new instance of [EventGroupRemoved]
	#[cfg(not(tarpaulin_include))]
	pub fn new(id: GroupId) -> Self {
		EventGroupRemoved(id)
	}
	/// Get the id of the destroyed group
	#[cfg(not(tarpaulin_include))]
	pub fn get(&self) -> GroupId {
		self.0
	}
}

/// Publish every hub that is dirty itself or belongs to a dirty group
#[cfg(not(tarpaulin_include))]
pub fn publish_hub_updates(
	mut hubs: Query<(Entity, &mut Hub, &Structure)>,
	mut groups: ResMut<PortalGroups>,
	config: Res<PortalConfig>,
	mut event_update: EventWriter<EventHubUpdate>,
) {
	let threshold = config.energy_report_threshold;
	for (entity, mut hub, structure) in hubs.iter_mut() {
		let group = groups.group_at_mut(structure.get_dimension(), &structure.get_pos());
		let group_due = group.as_ref().is_some_and(|g| g.needs_sync(threshold));
		if !group_due && !hub.needs_sync(threshold) {
			continue;
		}
		let id = group.as_ref().map(|g| g.get_id());
		let snapshot = {
			let view = HubView::new(&mut hub, group);
			HubSnapshot::new(entity, id, &view)
		};
		hub.mark_synced();
		event_update.write(EventHubUpdate::new(snapshot));
	}
}

/// Publish every group whose state changed enough since its last snapshot
#[cfg(not(tarpaulin_include))]
pub fn publish_group_updates(
	mut groups: ResMut<PortalGroups>,
	config: Res<PortalConfig>,
	mut event_update: EventWriter<EventGroupUpdate>,
) {
	let threshold = config.energy_report_threshold;
	for group in groups.iter_mut() {
		if group.needs_sync(threshold) {
			event_update.write(EventGroupUpdate::new(GroupSnapshot::new(group)));
			group.mark_synced();
		}
	}
}

/// Keep the client side [GroupMirror] up to date, when one is present
#[cfg(not(tarpaulin_include))]
pub fn mirror_group_updates(
	mut updates: EventReader<EventGroupUpdate>,
	mut removals: EventReader<EventGroupRemoved>,
	mirror: Option<ResMut<GroupMirror>>,
) {
	let Some(mut mirror) = mirror else {
		return;
	};
	for update in updates.read() {
		mirror.apply(update.get().clone());
	}
	for removal in removals.read() {
		if mirror.remove(removal.get()).is_none() {
			trace!("Removed group {:?} was never mirrored", removal.get());
		}
	}
}
