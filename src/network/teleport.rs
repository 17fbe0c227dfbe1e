//! Moving travellers through portals. Touching an active portal only queues
//! a [TeleportRequest], requests are carried out once the structure pass of
//! the tick is over so that no entity moves while the world is being walked.
//!
//! Complex travellers (players) keep their identity when crossing into
//! another dimension. Simple travellers are rebuilt there instead: a copy is
//! spawned at the destination and the original is removed
//!

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::prelude::*;

/// Count of simulation ticks since the plugin started
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub struct SimulationTick(i64);

impl SimulationTick {
	/// Create a new instance of [SimulationTick]
	pub fn new(tick: i64) -> Self {
		SimulationTick(tick)
	}
	/// Get the tick count
	pub fn get(&self) -> i64 {
		self.0
	}
	/// Move on to the next tick
	pub fn advance(&mut self) {
		self.0 += 1;
	}
}

/// Dimension, position and facing of a traveller
#[derive(Component, Clone, Debug, PartialEq, Reflect)]
pub struct Location {
	/// Dimension the traveller is in
	dimension: DimensionId,
	/// Position in continuous space
	position: Vec3,
	/// Facing in degrees
	yaw: f32,
}

impl Location {
	/// Create a new instance of [Location]
	pub fn new(dimension: DimensionId, position: Vec3, yaw: f32) -> Self {
		Location {
			dimension,
			position,
			yaw,
		}
	}
	/// Get the dimension the traveller is in
	pub fn get_dimension(&self) -> &DimensionId {
		&self.dimension
	}
	/// Get the position in continuous space
	pub fn get_position(&self) -> Vec3 {
		self.position
	}
	/// Get the facing in degrees
	pub fn get_yaw(&self) -> f32 {
		self.yaw
	}
	/// The block the traveller stands in
	pub fn get_block_pos(&self) -> BlockPos {
		BlockPos::from_translation(self.position)
	}
}

/// Movement state of anything that can pass through a portal
#[derive(Component, Clone, Debug, Default, PartialEq, Reflect)]
pub struct Traveller {
	/// Players and other entities that must keep their identity across dimensions
	complex: bool,
	/// Gliding travellers keep their momentum on arrival
	flying: bool,
	/// Current movement
	velocity: Vec3,
	/// Whether the traveller stands on a block
	on_ground: bool,
	/// Entity this traveller is riding
	riding: Option<Entity>,
}

impl Traveller {
	/// A player-like traveller
	pub fn complex() -> Self {
		Traveller {
			complex: true,
			..Default::default()
		}
	}
	/// A traveller that may be rebuilt when changing dimension
	pub fn simple() -> Self {
		Traveller::default()
	}
	/// Whether the traveller keeps its identity across dimensions
	pub fn is_complex(&self) -> bool {
		self.complex
	}
	/// Whether the traveller is gliding
	pub fn is_flying(&self) -> bool {
		self.flying
	}
	/// Start or stop gliding
	pub fn set_flying(&mut self, flying: bool) {
		self.flying = flying;
	}
	/// Get the current movement
	pub fn get_velocity(&self) -> Vec3 {
		self.velocity
	}
	/// Set the current movement
	pub fn set_velocity(&mut self, velocity: Vec3) {
		self.velocity = velocity;
	}
	/// Whether the traveller stands on a block
	pub fn is_on_ground(&self) -> bool {
		self.on_ground
	}
	/// Get the entity being ridden
	pub fn get_riding(&self) -> Option<Entity> {
		self.riding
	}
	/// Start riding `vehicle`
	pub fn mount(&mut self, vehicle: Entity) {
		self.riding = Some(vehicle);
	}
	/// Settle after arriving: stop and stand on the ground unless gliding
	pub fn settle(&mut self) {
		if !self.flying {
			self.velocity = Vec3::ZERO;
			self.on_ground = true;
		}
	}
}

/// Tick of the last teleport of a traveller
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub struct TeleportCooldown {
	/// [None] until the first teleport
	last_teleport_tick: Option<i64>,
}

impl TeleportCooldown {
	/// Get the tick of the last teleport, if any
	pub fn get_last_teleport_tick(&self) -> Option<i64> {
		self.last_teleport_tick
	}
	/// Record a teleport at `tick`
	pub fn stamp(&mut self, tick: i64) {
		self.last_teleport_tick = Some(tick);
	}
	/// Whether a teleport at `now` is allowed given a cooldown of `window` ticks
	pub fn allows(&self, now: i64, window: i64) -> bool {
		cooldown_allows(self.last_teleport_tick, now, window)
	}
}

/// A teleport is allowed with no previous stamp, with a stamp in the future
/// (the tick counter was reset) or once more than `window` ticks have passed
pub fn cooldown_allows(stamp: Option<i64>, now: i64, window: i64) -> bool {
	match stamp {
		None => true,
		Some(stamp) => {
			let elapsed = now - stamp;
			elapsed < 0 || elapsed > window
		}
	}
}

/// A traveller waiting to be sent to a target
#[derive(Clone, Debug, PartialEq)]
pub struct TeleportRequest {
	/// Entity to move
	traveller: Entity,
	/// Where it goes
	target: PortalTarget,
}

impl TeleportRequest {
	/// Create a new instance of [TeleportRequest]
	pub fn new(traveller: Entity, target: PortalTarget) -> Self {
		TeleportRequest { traveller, target }
	}
	/// Get the entity to move
	pub fn get_traveller(&self) -> Entity {
		self.traveller
	}
	/// Get where the traveller goes
	pub fn get_target(&self) -> &PortalTarget {
		&self.target
	}
}

/// Requests queued during a tick, drained after the structure pass
#[derive(Resource, Default, Debug)]
pub struct DeferredTeleports {
	/// Requests in arrival order, at most one per traveller
	queue: VecDeque<TeleportRequest>,
}

impl DeferredTeleports {
	/// Queue a request, a traveller already queued keeps its first request
	pub fn push(&mut self, request: TeleportRequest) -> bool {
		if self
			.queue
			.iter()
			.any(|queued| queued.traveller == request.traveller)
		{
			return false;
		}
		self.queue.push_back(request);
		true
	}
	/// Take every queued request in arrival order
	pub fn drain(&mut self) -> Vec<TeleportRequest> {
		self.queue.drain(..).collect()
	}
	/// Number of queued requests
	pub fn len(&self) -> usize {
		self.queue.len()
	}
	/// Whether nothing is queued
	pub fn is_empty(&self) -> bool {
		self.queue.is_empty()
	}
}

/// How a traveller gets to its target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKind {
	/// Same dimension, reposition
	InPlace,
	/// Other dimension, the same entity moves over
	Relocate,
	/// Other dimension, a copy is spawned and the original removed
	Rebuild,
}

impl MoveKind {
	/// Pick the kind of move for a traveller at `location` heading to `target`
	pub fn plan(location: &Location, traveller: &Traveller, target: &PortalTarget) -> Self {
		if location.get_dimension() == target.get_dimension() {
			MoveKind::InPlace
		} else if traveller.is_complex() {
			MoveKind::Relocate
		} else {
			MoveKind::Rebuild
		}
	}
}

/// Put a traveller at the target: centre of the target block, facing its
/// yaw, off any mount and settled
pub fn arrive(location: &mut Location, traveller: &mut Traveller, target: &PortalTarget) {
	traveller.riding = None;
	location.dimension = target.get_dimension().clone();
	location.position = target.get_destination();
	location.yaw = target.get_yaw();
	traveller.settle();
}

#[cfg(test)]
mod tests {
	use super::*;

	fn target(dimension: DimensionId) -> PortalTarget {
		PortalTarget::new(dimension, BlockPos::new(10, 64, -4), 270.0, "t", None)
	}

	#[test]
	fn cooldown_window() {
		assert!(cooldown_allows(None, 0, 40));
		assert!(!cooldown_allows(Some(100), 100, 40));
		assert!(!cooldown_allows(Some(100), 140, 40));
		assert!(cooldown_allows(Some(100), 141, 40));
		// counter went backwards
		assert!(cooldown_allows(Some(100), 20, 40));
	}
	#[test]
	fn deferred_queue_keeps_first_request() {
		let mut deferred = DeferredTeleports::default();
		let entity = Entity::from_raw(3);
		assert!(deferred.push(TeleportRequest::new(entity, target(DimensionId::overworld()))));
		assert!(!deferred.push(TeleportRequest::new(entity, target(DimensionId::the_end()))));
		let result = deferred.drain();
		assert_eq!(1, result.len());
		assert_eq!(&DimensionId::overworld(), result[0].get_target().get_dimension());
		assert!(deferred.is_empty());
	}
	#[test]
	fn plan_moves() {
		let here = Location::new(DimensionId::overworld(), Vec3::ZERO, 0.0);
		let player = Traveller::complex();
		let item = Traveller::simple();
		let same = target(DimensionId::overworld());
		let other = target(DimensionId::the_nether());
		assert_eq!(MoveKind::InPlace, MoveKind::plan(&here, &item, &same));
		assert_eq!(MoveKind::Relocate, MoveKind::plan(&here, &player, &other));
		assert_eq!(MoveKind::Rebuild, MoveKind::plan(&here, &item, &other));
	}
	#[test]
	fn arrive_settles() {
		let mut location = Location::new(DimensionId::overworld(), Vec3::ZERO, 0.0);
		let mut traveller = Traveller::complex();
		traveller.set_velocity(Vec3::new(1.0, -3.0, 0.5));
		traveller.mount(Entity::from_raw(9));
		let target = target(DimensionId::the_nether());
		arrive(&mut location, &mut traveller, &target);
		assert_eq!(&DimensionId::the_nether(), location.get_dimension());
		assert_eq!(Vec3::new(10.5, 64.0, -3.5), location.get_position());
		assert_eq!(270.0, location.get_yaw());
		assert_eq!(Vec3::ZERO, traveller.get_velocity());
		assert!(traveller.is_on_ground());
		assert_eq!(None, traveller.get_riding());
	}
	#[test]
	fn flying_keeps_momentum() {
		let mut location = Location::new(DimensionId::overworld(), Vec3::ZERO, 0.0);
		let mut traveller = Traveller::complex();
		traveller.set_flying(true);
		traveller.set_velocity(Vec3::X);
		arrive(&mut location, &mut traveller, &target(DimensionId::overworld()));
		assert_eq!(Vec3::X, traveller.get_velocity());
		assert!(!traveller.is_on_ground());
	}
}
