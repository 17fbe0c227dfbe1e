//! Logic for sending travellers through active portals. Contacts queue a
//! request in [DeferredTeleports], the queue is drained in
//! [OrderingSet::Deferred] once every structure has been processed
//!

use crate::prelude::*;
use bevy::prelude::*;

/// A traveller touched the block at `pos`, for hosts running their own collision detection
#[derive(Event)]
pub struct EventPortalContact {
	/// Entity touching the block
	traveller: Entity,
	/// Dimension of the block
	dimension: DimensionId,
	/// Position of the block
	pos: BlockPos,
}

impl EventPortalContact {
	/// Create a new instance of [EventPortalContact]
	#[cfg(not(tarpaulin_include))]
	pub fn new(traveller: Entity, dimension: DimensionId, pos: BlockPos) -> Self {
		EventPortalContact {
			traveller,
			dimension,
			pos,
		}
	}
}

/// A traveller reached its target. For a rebuilt traveller `traveller` is
/// the new entity
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EventTeleported {
	/// Entity that arrived
	traveller: Entity,
	/// How it got there
	kind: MoveKind,
}

impl EventTeleported {
	/// Create a new instance of [EventTeleported]
	#[cfg(not(tarpaulin_include))]
	pub fn new(traveller: Entity, kind: MoveKind) -> Self {
		EventTeleported { traveller, kind }
	}
	/// Get the entity that arrived
	#[cfg(not(tarpaulin_include))]
	pub fn get_traveller(&self) -> Entity {
		self.traveller
	}
	/// Get how the traveller got there
	#[cfg(not(tarpaulin_include))]
	pub fn get_kind(&self) -> MoveKind {
		self.kind
	}
}

/// A simple traveller was rebuilt in another dimension, hosts can move any
/// state of their own from `original` over to `rebuilt`
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EventTravellerRebuilt {
	/// Entity that was despawned
	original: Entity,
	/// Entity spawned in its place
	rebuilt: Entity,
}

impl EventTravellerRebuilt {
	/// Create a new instance of [EventTravellerRebuilt]
	#[cfg(not(tarpaulin_include))]
	pub fn new(original: Entity, rebuilt: Entity) -> Self {
		EventTravellerRebuilt { original, rebuilt }
	}
	/// Get the despawned entity
	#[cfg(not(tarpaulin_include))]
	pub fn get_original(&self) -> Entity {
		self.original
	}
	/// Get the entity spawned in its place
	#[cfg(not(tarpaulin_include))]
	pub fn get_rebuilt(&self) -> Entity {
		self.rebuilt
	}
}

/// Start a new simulation tick
#[cfg(not(tarpaulin_include))]
pub fn advance_simulation_tick(mut tick: ResMut<SimulationTick>) {
	tick.advance();
}

/// Queue a teleport for every traveller standing in, or reported touching,
/// a relay cell of a portal with an active target
#[cfg(not(tarpaulin_include))]
pub fn detect_portal_contacts(
	mut events: EventReader<EventPortalContact>,
	travellers: Query<(Entity, &Location), With<Traveller>>,
	groups: Res<PortalGroups>,
	mut deferred: ResMut<DeferredTeleports>,
) {
	let contacts = travellers
		.iter()
		.map(|(entity, location)| (entity, location.get_dimension(), location.get_block_pos()))
		.chain(
			events
				.read()
				.map(|event| (event.traveller, &event.dimension, event.pos)),
		);
	for (entity, dimension, pos) in contacts {
		let Some((id, MemberRole::Relay)) = groups.role_of(dimension, &pos) else {
			continue;
		};
		let Some(target) = groups.get(id).and_then(|group| group.get_active_target()) else {
			continue;
		};
		if deferred.push(TeleportRequest::new(entity, target.clone())) {
			trace!("Traveller {:?} entered portal group {:?}", entity, id);
		}
	}
}

/// Carry out every queued teleport. Unreachable targets and travellers
/// still cooling down are skipped
#[cfg(not(tarpaulin_include))]
#[allow(clippy::too_many_arguments)]
pub fn process_deferred_teleports(
	mut commands: Commands,
	mut deferred: ResMut<DeferredTeleports>,
	dimensions: Res<Dimensions>,
	tick: Res<SimulationTick>,
	config: Res<PortalConfig>,
	mut travellers: Query<(&mut Location, &mut Traveller, Option<&mut TeleportCooldown>)>,
	mut event_teleported: EventWriter<EventTeleported>,
	mut event_rebuilt: EventWriter<EventTravellerRebuilt>,
) {
	let now = tick.get();
	for request in deferred.drain() {
		let entity = request.get_traveller();
		let target = request.get_target();
		let Ok((mut location, mut traveller, cooldown)) = travellers.get_mut(entity) else {
			debug!("Traveller {:?} left before its teleport", entity);
			continue;
		};
		if let Err(e) = target.resolve(&dimensions) {
			debug!("Teleport of {:?} skipped: {}", entity, e);
			continue;
		}
		let stamp = cooldown.as_ref().and_then(|c| c.get_last_teleport_tick());
		if !cooldown_allows(stamp, now, config.teleport_cooldown_ticks) {
			continue;
		}
		let kind = MoveKind::plan(&location, &traveller, target);
		let moved = match kind {
			MoveKind::InPlace | MoveKind::Relocate => {
				arrive(&mut location, &mut traveller, target);
				entity
			}
			MoveKind::Rebuild => {
				let mut new_location = location.clone();
				let mut new_traveller = traveller.clone();
				arrive(&mut new_location, &mut new_traveller, target);
				let copied_cooldown = cooldown.as_deref().copied().unwrap_or_default();
				let rebuilt = commands
					.spawn(TravellerBundle::new(new_location, new_traveller))
					.insert(copied_cooldown)
					.id();
				commands.entity(entity).despawn();
				event_rebuilt.write(EventTravellerRebuilt::new(entity, rebuilt));
				rebuilt
			}
		};
		if traveller.is_complex() {
			match cooldown {
				Some(mut cooldown) => cooldown.stamp(now),
				None => {
					let mut cooldown = TeleportCooldown::default();
					cooldown.stamp(now);
					commands.entity(entity).insert(cooldown);
				}
			}
		}
		debug!(
			"Traveller {:?} sent to {} at {:?}",
			moved,
			target.get_dimension(),
			target.get_pos()
		);
		event_teleported.write(EventTeleported::new(moved, kind));
	}
}
