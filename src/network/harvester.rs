//! A [Harvester] collects energy and hands it out to whatever can use it in
//! the cube of `range` blocks around itself. It never scans the whole cube
//! at once, each tick a cursor steps over [HARVEST_CELLS_PER_TICK] cells and
//! sorts what it finds into two sets:
//!
//! - portal members (hubs and relay cells) which charge a [PortalGroup]
//! - generic energy storage such as an [EnergyBuffer]
//!
//! The sets are soft caches. A position is checked again whenever energy is
//! offered to it and dropped if it no longer takes energy.
//!
//! The cursor walks `x` fastest, then `z`, then `y`:
//!
//! ```text
//! (-r,-r,-r) (-r+1,-r,-r) .. (r,-r,-r) (-r,-r,-r+1) .. (r,-r,r) (-r,-r+1,-r) ..
//! ```
//!

use bevy::prelude::*;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// What a cell around a harvester turned out to be
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConsumerKind {
	/// Hub or relay cell of a group, charging it charges the group
	PortalMember,
	/// Anything else exposing [EnergyStorage] that can receive
	EnergyStorage,
	/// Nothing to charge
	Inert,
}

/// The world as seen by a harvester during its tick
pub trait HarvestContext {
	/// Classify the cell at `pos`, a portal member wins over energy storage
	fn classify(&self, pos: BlockPos) -> ConsumerKind;
	/// Offer `amount` to the portal member at `pos`. Returns the accepted
	/// amount or [None] when the position no longer is a portal member
	fn supply_portal_member(&mut self, pos: BlockPos, amount: i32) -> Option<i32>;
	/// Offer `amount` to the energy storage at `pos`. Returns the accepted
	/// amount or [None] when the position no longer takes energy
	fn supply_energy_storage(&mut self, pos: BlockPos, amount: i32) -> Option<i32>;
}

/// Energy producer that charges portal groups and storage blocks around it
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Harvester {
	/// Energy buffered for handing out
	energy: i32,
	/// Most energy the buffer holds
	energy_capacity: i32,
	/// Most energy handed out in one tick
	transfer_limit: i32,
	/// Half-width of the scanned cube
	range: i32,
	/// Energy produced each tick without fuel
	generation_per_tick: i32,
	/// Offset from the harvester of the next cell to classify
	cursor: (i32, i32, i32),
	/// Portal members found so far, visited first
	portal_consumers: IndexSet<BlockPos>,
	/// Energy storage found so far
	energy_consumers: IndexSet<BlockPos>,
}

impl Harvester {
	/// Create a new instance of [Harvester], empty with its cursor in the
	/// lowest corner of the cube
	pub fn new(config: &PortalConfig) -> Self {
		let r = config.harvester_range;
		Harvester {
			energy: 0,
			energy_capacity: config.harvester_energy_capacity,
			transfer_limit: config.harvester_transfer_limit,
			range: r,
			generation_per_tick: config.harvester_generation_per_tick,
			cursor: (-r, -r, -r),
			portal_consumers: IndexSet::new(),
			energy_consumers: IndexSet::new(),
		}
	}
	/// Get the offset of the next cell to classify
	pub fn get_cursor(&self) -> (i32, i32, i32) {
		self.cursor
	}
	/// Get the half-width of the scanned cube
	pub fn get_range(&self) -> i32 {
		self.range
	}
	/// Positions of the portal members currently being charged
	pub fn get_charging_portal_blocks(&self) -> &IndexSet<BlockPos> {
		&self.portal_consumers
	}
	/// Positions of the energy storage currently being charged
	pub fn get_charging_energy_blocks(&self) -> &IndexSet<BlockPos> {
		&self.energy_consumers
	}
	/// Add produced energy, e.g. from burnt fuel. Returns what fit
	pub fn generate(&mut self, amount: i32) -> i32 {
		let accepted = amount.max(0).min(self.energy_capacity - self.energy);
		self.energy += accepted;
		accepted
	}
	/// Run one simulation tick for a harvester at `origin`: produce passive
	/// energy, classify the next cells and hand out energy
	pub fn tick(&mut self, origin: BlockPos, ctx: &mut impl HarvestContext) {
		self.generate(self.generation_per_tick);
		self.discover(origin, &*ctx);
		self.transfer(ctx);
	}
	/// Classify the next [HARVEST_CELLS_PER_TICK] cells under the cursor
	fn discover(&mut self, origin: BlockPos, ctx: &impl HarvestContext) {
		for _ in 0..HARVEST_CELLS_PER_TICK {
			let (x, y, z) = self.cursor;
			self.advance_cursor();
			if (x, y, z) == (0, 0, 0) {
				continue;
			}
			let pos = origin.offset(x, y, z);
			match ctx.classify(pos) {
				ConsumerKind::PortalMember => {
					self.portal_consumers.insert(pos);
					self.energy_consumers.shift_remove(&pos);
				}
				ConsumerKind::EnergyStorage => {
					self.energy_consumers.insert(pos);
					self.portal_consumers.shift_remove(&pos);
				}
				ConsumerKind::Inert => {
					self.portal_consumers.shift_remove(&pos);
					self.energy_consumers.shift_remove(&pos);
				}
			}
		}
	}
	/// Step the cursor, `x` fastest then `z` then `y`, wrapping at the edges of the cube
	fn advance_cursor(&mut self) {
		let r = self.range;
		let (mut x, mut y, mut z) = self.cursor;
		x += 1;
		if x > r {
			x = -r;
			z += 1;
			if z > r {
				z = -r;
				y += 1;
				if y > r {
					y = -r;
				}
			}
		}
		self.cursor = (x, y, z);
	}
	/// Offer energy to portal members then to energy storage, each in the
	/// order they were found, until the budget or the buffer runs out
	fn transfer(&mut self, ctx: &mut impl HarvestContext) {
		if self.energy <= 0 {
			return;
		}
		let mut remaining = self.transfer_limit.min(self.energy);
		let mut stale = Vec::new();
		for pos in self.portal_consumers.iter() {
			if self.energy == 0 {
				break;
			}
			match ctx.supply_portal_member(*pos, remaining) {
				Some(accepted) => {
					let accepted = accepted.clamp(0, remaining);
					remaining -= accepted;
					self.energy -= accepted;
				}
				None => stale.push(*pos),
			}
		}
		for pos in stale.drain(..) {
			trace!("Harvester dropped stale portal member at {:?}", pos);
			self.portal_consumers.shift_remove(&pos);
		}
		for pos in self.energy_consumers.iter() {
			if self.energy == 0 {
				break;
			}
			match ctx.supply_energy_storage(*pos, remaining) {
				Some(accepted) => {
					let accepted = accepted.clamp(0, remaining);
					remaining -= accepted;
					self.energy -= accepted;
				}
				None => stale.push(*pos),
			}
		}
		for pos in stale {
			trace!("Harvester dropped stale energy storage at {:?}", pos);
			self.energy_consumers.shift_remove(&pos);
		}
	}
	/// Persist the harvester, consumers are rediscovered after loading
	pub fn write(&self) -> HarvesterRecord {
		let (x, y, z) = self.cursor;
		HarvesterRecord {
			energy: self.energy,
			search_x: Some(x),
			search_y: Some(y),
			search_z: Some(z),
		}
	}
	/// Restore a harvester, a missing cursor coordinate is `0` and the cursor
	/// is clamped into the configured range
	pub fn read(record: &HarvesterRecord, config: &PortalConfig) -> Self {
		let mut harvester = Harvester::new(config);
		let r = harvester.range;
		let clamp = |v: Option<i32>| v.unwrap_or(0).clamp(-r, r);
		harvester.cursor = (
			clamp(record.search_x),
			clamp(record.search_y),
			clamp(record.search_z),
		);
		harvester.energy = record.energy.clamp(0, harvester.energy_capacity);
		harvester
	}
}

/// A harvester only gives energy away, pulling is limited to the per tick transfer limit
impl EnergyStorage for Harvester {
	fn receive_energy(&mut self, _amount: i32, _simulate: bool) -> i32 {
		0
	}
	fn extract_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		if amount <= 0 {
			return 0;
		}
		let extracted = amount.min(self.energy).min(self.transfer_limit);
		if !simulate {
			self.energy -= extracted;
		}
		extracted
	}
	fn get_energy_stored(&self) -> i32 {
		self.energy
	}
	fn get_max_energy_stored(&self) -> i32 {
		self.energy_capacity
	}
	fn can_receive(&self) -> bool {
		false
	}
	fn can_extract(&self) -> bool {
		true
	}
}

/// Persisted form of a [Harvester]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvesterRecord {
	/// Buffered energy
	pub energy: i32,
	/// Cursor `x` offset
	pub search_x: Option<i32>,
	/// Cursor `y` offset
	pub search_y: Option<i32>,
	/// Cursor `z` offset
	pub search_z: Option<i32>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::{BTreeSet, HashMap};

	/// Cells with a kind and how much more energy each can take
	#[derive(Default)]
	struct MockWorld {
		kinds: HashMap<BlockPos, ConsumerKind>,
		space: HashMap<BlockPos, i32>,
		classified: Vec<BlockPos>,
		offers: Vec<(BlockPos, i32)>,
	}

	impl MockWorld {
		fn place(&mut self, pos: BlockPos, kind: ConsumerKind, space: i32) {
			self.kinds.insert(pos, kind);
			self.space.insert(pos, space);
		}
		fn supply(&mut self, pos: BlockPos, amount: i32, kind: ConsumerKind) -> Option<i32> {
			if self.kinds.get(&pos) != Some(&kind) {
				return None;
			}
			self.offers.push((pos, amount));
			let space = self.space.entry(pos).or_default();
			let accepted = amount.min(*space);
			*space -= accepted;
			Some(accepted)
		}
	}

	impl HarvestContext for MockWorld {
		fn classify(&self, pos: BlockPos) -> ConsumerKind {
			self.kinds.get(&pos).copied().unwrap_or(ConsumerKind::Inert)
		}
		fn supply_portal_member(&mut self, pos: BlockPos, amount: i32) -> Option<i32> {
			self.supply(pos, amount, ConsumerKind::PortalMember)
		}
		fn supply_energy_storage(&mut self, pos: BlockPos, amount: i32) -> Option<i32> {
			self.supply(pos, amount, ConsumerKind::EnergyStorage)
		}
	}

	/// Wraps [MockWorld] to record every classified cell
	struct Recorder<'a>(&'a mut MockWorld, std::cell::RefCell<Vec<BlockPos>>);

	impl HarvestContext for Recorder<'_> {
		fn classify(&self, pos: BlockPos) -> ConsumerKind {
			self.1.borrow_mut().push(pos);
			self.0.classify(pos)
		}
		fn supply_portal_member(&mut self, pos: BlockPos, amount: i32) -> Option<i32> {
			self.0.supply_portal_member(pos, amount)
		}
		fn supply_energy_storage(&mut self, pos: BlockPos, amount: i32) -> Option<i32> {
			self.0.supply_energy_storage(pos, amount)
		}
	}

	fn config(range: i32) -> PortalConfig {
		PortalConfig {
			harvester_range: range,
			..Default::default()
		}
	}

	#[test]
	fn cursor_order() {
		let mut harvester = Harvester::new(&config(1));
		let mut visited = Vec::new();
		for _ in 0..4 {
			visited.push(harvester.get_cursor());
			harvester.advance_cursor();
		}
		let actual = vec![(-1, -1, -1), (0, -1, -1), (1, -1, -1), (-1, -1, 0)];
		assert_eq!(actual, visited);
	}
	#[test]
	fn cursor_wraps_to_start() {
		let mut harvester = Harvester::new(&config(2));
		for _ in 0..125 {
			harvester.advance_cursor();
		}
		assert_eq!((-2, -2, -2), harvester.get_cursor());
	}
	#[test]
	fn full_cycle_covers_cube() {
		let mut world = MockWorld::default();
		let mut harvester = Harvester::new(&config(2));
		let origin = BlockPos::new(10, 10, 10);
		let mut recorder = Recorder(&mut world, std::cell::RefCell::new(Vec::new()));
		// 125 cells at 5 per tick is exactly one cycle
		for _ in 0..25 {
			harvester.tick(origin, &mut recorder);
		}
		let classified = recorder.1.take();
		assert_eq!(124, classified.len());
		let unique: BTreeSet<BlockPos> = classified.iter().copied().collect();
		assert_eq!(124, unique.len());
		assert!(!unique.contains(&origin));
		assert!(unique.contains(&origin.offset(-2, -2, -2)));
		assert!(unique.contains(&origin.offset(2, 2, 2)));
		assert_eq!((-2, -2, -2), harvester.get_cursor());
	}
	#[test]
	fn smallest_cycle_skips_origin_once() {
		let mut harvester = Harvester::new(&config(1));
		let mut visited = Vec::new();
		for _ in 0..27 {
			let cursor = harvester.get_cursor();
			if cursor != (0, 0, 0) {
				visited.push(cursor);
			}
			harvester.advance_cursor();
		}
		assert_eq!(26, visited.len());
		let unique: BTreeSet<(i32, i32, i32)> = visited.into_iter().collect();
		assert_eq!(26, unique.len());
		assert_eq!((-1, -1, -1), harvester.get_cursor());
	}
	#[test]
	fn five_cells_per_tick() {
		let mut world = MockWorld::default();
		let mut harvester = Harvester::new(&config(5));
		let mut recorder = Recorder(&mut world, std::cell::RefCell::new(Vec::new()));
		harvester.tick(BlockPos::new(0, 0, 0), &mut recorder);
		assert_eq!(5, recorder.1.borrow().len());
		assert_eq!((0, -5, -5), harvester.get_cursor());
	}
	#[test]
	fn portal_members_charged_first() {
		let mut world = MockWorld::default();
		let origin = BlockPos::new(0, 0, 0);
		let storage = origin.offset(-1, -1, -1);
		let member = origin.offset(0, -1, -1);
		world.place(storage, ConsumerKind::EnergyStorage, 1000);
		world.place(member, ConsumerKind::PortalMember, 60);
		let mut harvester = Harvester::new(&config(1));
		harvester.generate(500);
		harvester.tick(origin, &mut world);
		assert_eq!(vec![(member, 100), (storage, 40)], world.offers);
		assert_eq!(400, harvester.get_energy_stored());
	}
	#[test]
	fn stops_when_empty() {
		let mut world = MockWorld::default();
		let origin = BlockPos::new(0, 0, 0);
		let first = origin.offset(-1, -1, -1);
		let second = origin.offset(0, -1, -1);
		world.place(first, ConsumerKind::EnergyStorage, 1000);
		world.place(second, ConsumerKind::EnergyStorage, 1000);
		let mut harvester = Harvester::new(&config(1));
		harvester.generate(30);
		harvester.tick(origin, &mut world);
		assert_eq!(vec![(first, 30)], world.offers);
		assert_eq!(0, harvester.get_energy_stored());
	}
	#[test]
	fn stale_consumer_pruned_without_cost() {
		let mut world = MockWorld::default();
		let origin = BlockPos::new(0, 0, 0);
		let gone = origin.offset(-1, -1, -1);
		let kept = origin.offset(0, -1, -1);
		world.place(gone, ConsumerKind::EnergyStorage, 1000);
		world.place(kept, ConsumerKind::EnergyStorage, 1000);
		let mut harvester = Harvester::new(&config(1));
		// discover both without any energy to give
		harvester.tick(origin, &mut world);
		assert_eq!(2, harvester.get_charging_energy_blocks().len());
		world.kinds.remove(&gone);
		harvester.generate(50);
		harvester.tick(origin, &mut world);
		assert_eq!(vec![(kept, 50)], world.offers);
		assert_eq!(1, harvester.get_charging_energy_blocks().len());
	}
	#[test]
	fn reclassified_cell_moves_between_sets() {
		let mut world = MockWorld::default();
		let origin = BlockPos::new(0, 0, 0);
		let cell = origin.offset(-1, -1, -1);
		world.place(cell, ConsumerKind::EnergyStorage, 0);
		let mut harvester = Harvester::new(&config(1));
		harvester.tick(origin, &mut world);
		assert!(harvester.get_charging_energy_blocks().contains(&cell));
		world.place(cell, ConsumerKind::PortalMember, 0);
		// walk the cursor back around to the cell
		for _ in 0..6 {
			harvester.tick(origin, &mut world);
		}
		assert!(harvester.get_charging_portal_blocks().contains(&cell));
		assert!(!harvester.get_charging_energy_blocks().contains(&cell));
	}
	#[test]
	fn passive_generation() {
		let mut world = MockWorld::default();
		let config = PortalConfig {
			harvester_generation_per_tick: 40,
			harvester_energy_capacity: 100,
			..Default::default()
		};
		let mut harvester = Harvester::new(&config);
		for _ in 0..3 {
			harvester.tick(BlockPos::new(0, 0, 0), &mut world);
		}
		assert_eq!(100, harvester.get_energy_stored());
	}
	#[test]
	fn extract_drains_up_to_limit() {
		let mut harvester = Harvester::new(&PortalConfig::default());
		harvester.generate(500);
		assert_eq!(100, harvester.extract_energy(1000, true));
		assert_eq!(500, harvester.get_energy_stored());
		assert_eq!(100, harvester.extract_energy(1000, false));
		assert_eq!(400, harvester.get_energy_stored());
		assert_eq!(0, harvester.receive_energy(50, false));
	}
	#[test]
	fn record_cursor_clamped() {
		let record = HarvesterRecord {
			energy: 20,
			search_x: Some(99),
			search_y: None,
			search_z: Some(-7),
		};
		let result = Harvester::read(&record, &config(5));
		assert_eq!((5, 0, -5), result.get_cursor());
		assert_eq!(20, result.get_energy_stored());
	}
	#[test]
	fn write_read() {
		let mut world = MockWorld::default();
		let mut harvester = Harvester::new(&config(3));
		harvester.generate(12);
		harvester.tick(BlockPos::new(0, 0, 0), &mut world);
		let result = Harvester::read(&harvester.write(), &config(3));
		assert_eq!(harvester.get_cursor(), result.get_cursor());
		assert_eq!(harvester.get_energy_stored(), result.get_energy_stored());
	}
}
