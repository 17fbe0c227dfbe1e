//! Logic for keeping portal groups in step with the blocks they are built
//! from: reacting to block changes, forming groups when a hub is activated,
//! editing targets and filling portal interiors
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Ask a hub to look for a portal frame around itself and form a group
#[derive(Event)]
pub struct EventActivateHub {
	/// Entity of the [Hub]
	hub: Entity,
}

impl EventActivateHub {
	/// Create a new instance of [EventActivateHub]
	#[cfg(not(tarpaulin_include))]
	pub fn new(hub: Entity) -> Self {
		EventActivateHub { hub }
	}
	/// Get the hub to activate
	#[cfg(not(tarpaulin_include))]
	pub fn get_hub(&self) -> Entity {
		self.hub
	}
}

/// Outcome of an [EventActivateHub], the group the hub now belongs to or
/// why no portal frame was found
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EventHubActivated {
	/// Entity of the [Hub]
	hub: Entity,
	/// Group of the hub, or why no frame was found
	result: Result<GroupId, ShapeRejection>,
}

impl EventHubActivated {
	/// Create a new instance of [EventHubActivated]
	#[cfg(not(tarpaulin_include))]
	pub fn new(hub: Entity, result: Result<GroupId, ShapeRejection>) -> Self {
		EventHubActivated { hub, result }
	}
	/// Get the activated hub
	#[cfg(not(tarpaulin_include))]
	pub fn get_hub(&self) -> Entity {
		self.hub
	}
	/// Get the group of the hub or why no frame was found
	#[cfg(not(tarpaulin_include))]
	pub fn get_result(&self) -> &Result<GroupId, ShapeRejection> {
		&self.result
	}
}

/// Store or clear a target in a slot of a hub, or of its group when grouped
#[derive(Event)]
pub struct EventSetTarget {
	/// Entity of the [Hub]
	hub: Entity,
	/// Slot to write
	index: usize,
	/// [None] clears the slot
	target: Option<PortalTarget>,
}

impl EventSetTarget {
	/// Create a new instance of [EventSetTarget]
	#[cfg(not(tarpaulin_include))]
	pub fn new(hub: Entity, index: usize, target: Option<PortalTarget>) -> Self {
		EventSetTarget { hub, index, target }
	}
}

/// Choose which slot of the group of a hub travellers are sent to, [None]
/// switches the portal off
#[derive(Event)]
pub struct EventSelectTarget {
	/// Entity of the [Hub]
	hub: Entity,
	/// Slot to select
	index: Option<usize>,
}

impl EventSelectTarget {
	/// Create a new instance of [EventSelectTarget]
	#[cfg(not(tarpaulin_include))]
	pub fn new(hub: Entity, index: Option<usize>) -> Self {
		EventSelectTarget { hub, index }
	}
}

/// Change applied by an [EventEditTarget]
#[derive(Clone, Debug, PartialEq)]
pub enum TargetEdit {
	/// New display name
	Rename(String),
	/// New colour, [None] clears it
	Recolor(Option<DyeColor>),
}

/// Rename or recolour the target in a slot of a hub or its group
#[derive(Event)]
pub struct EventEditTarget {
	/// Entity of the [Hub]
	hub: Entity,
	/// Slot to edit
	index: usize,
	/// Change to apply
	edit: TargetEdit,
}

impl EventEditTarget {
	/// Create a new instance of [EventEditTarget]
	#[cfg(not(tarpaulin_include))]
	pub fn new(hub: Entity, index: usize, edit: TargetEdit) -> Self {
		EventEditTarget { hub, index, edit }
	}
}

/// What an operator holds when using a portal block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeldItem {
	/// Paints an active portal
	Dye(DyeColor),
	/// Anything else, switches the portal off
	Other,
}

/// An operator used the portal block at `pos`
#[derive(Event)]
pub struct EventUsePortal {
	/// Dimension of the portal block
	dimension: DimensionId,
	/// Position of the portal block
	pos: BlockPos,
	/// What the operator holds
	held: HeldItem,
}

impl EventUsePortal {
	/// Create a new instance of [EventUsePortal]
	#[cfg(not(tarpaulin_include))]
	pub fn new(dimension: DimensionId, pos: BlockPos, held: HeldItem) -> Self {
		EventUsePortal {
			dimension,
			pos,
			held,
		}
	}
}

/// Drain the block changes of every level and let the registry decide what
/// they break. Destroyed groups have their portal blocks removed
#[cfg(not(tarpaulin_include))]
pub fn process_block_changes(
	mut dimensions: ResMut<Dimensions>,
	mut groups: ResMut<PortalGroups>,
	mut hubs: Query<&mut Hub>,
	mut event_removed: EventWriter<EventGroupRemoved>,
) {
	for level in dimensions.iter_mut() {
		let dimension = level.get_dimension().clone();
		for pos in level.drain_changes() {
			let block = level.get_block(pos);
			match groups.on_block_changed(&dimension, &pos, block) {
				BlockChangeOutcome::Destroyed(destroyed) => {
					for group in destroyed {
						debug!(
							"Portal group {:?} broken by {:?} at {:?}",
							group.get_id(),
							block,
							pos
						);
						tear_down(level, &group, &mut hubs);
						event_removed.write(EventGroupRemoved::new(group.get_id()));
					}
				}
				BlockChangeOutcome::Deactivated(id) => {
					debug!("Portal block at {:?} broken, group {:?} deactivated", pos, id);
				}
				BlockChangeOutcome::Unchanged | BlockChangeOutcome::Untracked => {}
			}
		}
	}
}

/// Clear the portal blocks of a destroyed group and tell its hubs they are on their own again
fn tear_down(level: &mut Level, group: &PortalGroup, hubs: &mut Query<&mut Hub>) {
	for relay in group.get_relays() {
		if matches!(level.get_block(*relay), BlockKind::Portal(_)) {
			level.fill_block(*relay, BlockKind::Air);
		}
	}
	for pos in group.get_hubs() {
		if let Some(entity) = level.get_structure(*pos) {
			match hubs.get_mut(entity) {
				Ok(mut hub) => hub.mark_dirty(),
				Err(_) => error!("Structure {:?} at hub position {:?} has no hub", entity, pos),
			}
		}
	}
}

/// Run shape detection for every activated hub that isn't grouped yet. On
/// success the hub's own targets are copied into the empty slots of its new group
#[cfg(not(tarpaulin_include))]
pub fn activate_hubs(
	mut events: EventReader<EventActivateHub>,
	mut hubs: Query<(&mut Hub, &Structure)>,
	dimensions: Res<Dimensions>,
	mut groups: ResMut<PortalGroups>,
	config: Res<PortalConfig>,
	mut event_activated: EventWriter<EventHubActivated>,
) {
	for event in events.read() {
		let entity = event.get_hub();
		let Ok((mut hub, structure)) = hubs.get_mut(entity) else {
			error!("Activated hub {:?} does not exist", entity);
			continue;
		};
		let dimension = structure.get_dimension();
		let pos = structure.get_pos();
		if let Some(id) = groups.group_of(dimension, &pos) {
			// already part of a portal
			event_activated.write(EventHubActivated::new(entity, Ok(id)));
			continue;
		}
		let Some(level) = dimensions.get_level(dimension) else {
			error!("Hub {:?} sits in unloaded dimension {}", entity, dimension);
			continue;
		};
		let result = PortalShape::find(level, pos, config.max_portal_area, config.max_portal_size)
			.map(|shape| {
				let id = groups.add(level, shape);
				if let Some(group) = groups.get_mut(id) {
					for target in hub.get_targets().iter().flatten() {
						if group.add_target(target.clone()).is_none() {
							break;
						}
					}
				}
				hub.mark_dirty();
				id
			});
		match &result {
			Ok(id) => info!("Hub {:?} formed portal group {:?}", entity, id),
			Err(rejection) => warn!("Hub {:?} found no portal: {}", entity, rejection),
		}
		event_activated.write(EventHubActivated::new(entity, result));
	}
}

/// Apply target edits to hubs, grouped hubs forward them to their group
#[cfg(not(tarpaulin_include))]
pub fn edit_targets(
	mut set_events: EventReader<EventSetTarget>,
	mut select_events: EventReader<EventSelectTarget>,
	mut edit_events: EventReader<EventEditTarget>,
	mut hubs: Query<(&mut Hub, &Structure)>,
	mut groups: ResMut<PortalGroups>,
) {
	for event in set_events.read() {
		let Ok((mut hub, structure)) = hubs.get_mut(event.hub) else {
			error!("Target set on missing hub {:?}", event.hub);
			continue;
		};
		let group = groups.group_at_mut(structure.get_dimension(), &structure.get_pos());
		let mut view = HubView::new(&mut hub, group);
		if event.index >= view.get_target_capacity(false) {
			warn!("Hub {:?} has no target slot {}", event.hub, event.index);
			continue;
		}
		view.set_target(event.index, event.target.clone(), false);
	}
	for event in edit_events.read() {
		let Ok((mut hub, structure)) = hubs.get_mut(event.hub) else {
			error!("Target edit on missing hub {:?}", event.hub);
			continue;
		};
		let group = groups.group_at_mut(structure.get_dimension(), &structure.get_pos());
		let mut view = HubView::new(&mut hub, group);
		if event.index >= view.get_target_capacity(false) {
			warn!("Hub {:?} has no target slot {}", event.hub, event.index);
			continue;
		}
		let edited = match &event.edit {
			TargetEdit::Rename(name) => view.rename_target(event.index, name, false),
			TargetEdit::Recolor(color) => view.set_target_color(event.index, *color, false),
		};
		if !edited {
			warn!("Hub {:?} has no target in slot {}", event.hub, event.index);
		}
	}
	for event in select_events.read() {
		let Ok((_, structure)) = hubs.get(event.hub) else {
			error!("Target selected on missing hub {:?}", event.hub);
			continue;
		};
		let Some(group) = groups.group_at_mut(structure.get_dimension(), &structure.get_pos()) else {
			warn!("Hub {:?} is not part of a portal", event.hub);
			continue;
		};
		if event
			.index
			.is_some_and(|i| i >= group.get_target_capacity())
		{
			warn!("Hub {:?} has no target slot {:?}", event.hub, event.index);
			continue;
		}
		if !group.set_active_target(event.index) {
			warn!("Hub {:?} selected the empty slot {:?}", event.hub, event.index);
		}
	}
}

/// Paint an active portal with the dye an operator used on it
#[cfg(not(tarpaulin_include))]
pub fn use_portal(mut events: EventReader<EventUsePortal>, mut groups: ResMut<PortalGroups>) {
	for event in events.read() {
		let HeldItem::Dye(color) = event.held else {
			continue;
		};
		let Some((id, MemberRole::Relay)) = groups.role_of(&event.dimension, &event.pos) else {
			continue;
		};
		if let Some(group) = groups.get_mut(id) {
			if group.set_color(color) {
				debug!("Portal group {:?} painted {:?}", id, color);
			}
		}
	}
}

/// Fill the interior of groups whose active target or colour changed,
/// active portals get portal blocks and inactive ones air
#[cfg(not(tarpaulin_include))]
pub fn refresh_portal_blocks(mut groups: ResMut<PortalGroups>, mut dimensions: ResMut<Dimensions>) {
	for group in groups.iter_mut().filter(|group| group.is_fill_stale()) {
		let Some(level) = dimensions.get_level_mut(group.get_dimension()) else {
			continue;
		};
		let block = group.get_portal_block();
		for relay in group.get_relays() {
			if level.get_block(*relay).is_interior() {
				level.fill_block(*relay, block);
			}
		}
		group.mark_filled();
	}
}
