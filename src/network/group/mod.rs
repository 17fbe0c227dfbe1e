//! A [PortalGroup] pools energy and targets across every structure of one
//! portal: the hubs (stabilizers) in its frame and the relay cells of its
//! interior. Structures never hold a reference to their group, they look it
//! up by position through the [PortalGroups] registry.
//!
//! ```text
//!  F H F F
//!  F r r F      H - hub, a member
//!  F r r F      r - relay cell, a member
//!  H r r F      F - frame block, tracked but not a member
//!  F F F F
//! ```
//!
//! Target slots are fixed in number. Using a slot index outside of the
//! capacity is a bookkeeping bug and panics
//!

use std::collections::BTreeSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub mod registry;

/// Unique identifier of a [PortalGroup], ids are handed out in creation order
#[derive(
	Clone,
	Copy,
	PartialEq,
	Eq,
	PartialOrd,
	Ord,
	Debug,
	Hash,
	Reflect,
	Serialize,
	Deserialize,
)]
/// Identifier of a [PortalGroup], ids are handed out in creation order
pub struct GroupId(u64);

impl GroupId {
	/// Create a new instance of [GroupId]
	pub fn new(id: u64) -> Self {
		GroupId(id)
	}
	/// Get the raw id
	pub fn get(&self) -> u64 {
		self.0
	}
}

/// Part a position plays in a group
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Reflect, Serialize, Deserialize)]
pub enum MemberRole {
	/// A stabilizer in the frame
	Hub,
	/// An interior cell
	Relay,
	/// A plain frame block, not a member but watched for removal
	Frame,
}

/// Shared state of one portal
#[derive(Clone, Debug, PartialEq)]
pub struct PortalGroup {
	/// Unique id, lower ids are older
	id: GroupId,
	/// Dimension the frame is built in
	dimension: DimensionId,
	/// Frame and interior found by shape detection
	shape: PortalShape,
	/// Stabilizers of the frame
	hubs: BTreeSet<BlockPos>,
	/// Interior cells
	relays: BTreeSet<BlockPos>,
	/// Frame blocks which are not stabilizers
	frame: BTreeSet<BlockPos>,
	/// Pooled energy
	energy: i32,
	/// Most energy the pool holds
	energy_capacity: i32,
	/// Target slots shared by every hub
	targets: Vec<Option<PortalTarget>>,
	/// Slot travellers are sent to
	active_target: Option<usize>,
	/// Paint applied to the portal blocks
	color: Option<DyeColor>,
	/// Targets, active target, colour or members changed since the last sync
	dirty: bool,
	/// Energy reported by the last sync
	last_synced_energy: i32,
	/// Relay cells no longer match the active target and need refilling
	fill_stale: bool,
}

impl PortalGroup {
	/// Create a new instance of [PortalGroup] from a detected shape. Frame
	/// cells holding a stabilizer become hubs, the interior becomes relays
	pub fn new(
		id: GroupId,
		dimension: DimensionId,
		shape: PortalShape,
		level: &impl BlockReader,
		target_capacity: usize,
		energy_capacity: i32,
	) -> Self {
		let mut hubs = BTreeSet::new();
		let mut frame = BTreeSet::new();
		for pos in shape.get_frame() {
			if level.get_block(*pos) == BlockKind::Stabilizer {
				hubs.insert(*pos);
			} else {
				frame.insert(*pos);
			}
		}
		let relays = shape.get_area().iter().copied().collect();
		PortalGroup {
			id,
			dimension,
			shape,
			hubs,
			relays,
			frame,
			energy: 0,
			energy_capacity,
			targets: vec![None; target_capacity],
			active_target: None,
			color: None,
			dirty: true,
			last_synced_energy: 0,
			fill_stale: true,
		}
	}
	/// Get the id
	pub fn get_id(&self) -> GroupId {
		self.id
	}
	/// Get the dimension the frame is built in
	pub fn get_dimension(&self) -> &DimensionId {
		&self.dimension
	}
	/// Get the frame and interior
	pub fn get_shape(&self) -> &PortalShape {
		&self.shape
	}
	/// Get the positions of the stabilizers
	pub fn get_hubs(&self) -> &BTreeSet<BlockPos> {
		&self.hubs
	}
	/// Get the positions of the interior cells
	pub fn get_relays(&self) -> &BTreeSet<BlockPos> {
		&self.relays
	}
	/// Get the plain frame blocks
	pub fn get_frame(&self) -> &BTreeSet<BlockPos> {
		&self.frame
	}
	/// Every position the group tracks along with its role
	pub fn iter_positions(&self) -> impl Iterator<Item = (BlockPos, MemberRole)> + '_ {
		self.hubs
			.iter()
			.map(|p| (*p, MemberRole::Hub))
			.chain(self.relays.iter().map(|p| (*p, MemberRole::Relay)))
			.chain(self.frame.iter().map(|p| (*p, MemberRole::Frame)))
	}
	/// Track a position under `role`
	pub fn add(&mut self, pos: BlockPos, role: MemberRole) {
		let inserted = match role {
			MemberRole::Hub => self.hubs.insert(pos),
			MemberRole::Relay => self.relays.insert(pos),
			MemberRole::Frame => self.frame.insert(pos),
		};
		if inserted {
			self.dirty = true;
		}
	}
	/// Stop tracking a position. Returns `true` when no member is left, at
	/// which point the group must be destroyed
	pub fn remove(&mut self, pos: &BlockPos) -> bool {
		if self.hubs.remove(pos) || self.relays.remove(pos) || self.frame.remove(pos) {
			self.dirty = true;
		}
		self.hubs.is_empty() && self.relays.is_empty()
	}
	/// Fold `other` into this group. Members are joined, energy is summed up
	/// to the capacity and the targets of `other` fill the empty slots in
	/// order, targets that don't fit are dropped. The larger shape is kept
	pub fn absorb(&mut self, other: PortalGroup) {
		self.hubs.extend(other.hubs);
		self.relays.extend(other.relays);
		self.frame.extend(other.frame);
		// a frame block of one shape may be a hub of the other
		self.frame.retain(|pos| !self.hubs.contains(pos));
		self.energy = self
			.energy
			.saturating_add(other.energy)
			.min(self.energy_capacity);
		let mut incoming = other.targets.into_iter().flatten();
		for slot in self.targets.iter_mut().filter(|slot| slot.is_none()) {
			match incoming.next() {
				Some(target) => *slot = Some(target),
				None => break,
			}
		}
		if other.shape.get_area_size() > self.shape.get_area_size() {
			self.shape = other.shape;
		}
		if self.color.is_none() {
			self.color = other.color;
		}
		self.dirty = true;
		self.fill_stale = true;
	}
	/// Panics when `index` is not a slot of this group
	fn check_index(&self, index: usize) {
		if index >= self.targets.len() {
			panic!(
				"Target index {} is outside of the {} slots of group {:?}",
				index,
				self.targets.len(),
				self.id
			);
		}
	}
	/// Put `target` in slot `index`, clearing the slot of the active target
	/// deactivates the group
	pub fn set_target(&mut self, index: usize, target: Option<PortalTarget>) {
		self.check_index(index);
		if target.is_none() && self.active_target == Some(index) {
			self.remove_target();
		}
		self.targets[index] = target;
		self.dirty = true;
	}
	/// Put `target` in the first empty slot and return its index, [None]
	/// when every slot is taken
	pub fn add_target(&mut self, target: PortalTarget) -> Option<usize> {
		let index = self.targets.iter().position(|slot| slot.is_none())?;
		self.set_target(index, Some(target));
		Some(index)
	}
	/// Get the target in slot `index`. Panics when `index` is not a slot
	pub fn get_target(&self, index: usize) -> Option<&PortalTarget> {
		self.check_index(index);
		self.targets[index].as_ref()
	}
	/// Get every slot
	pub fn get_targets(&self) -> &[Option<PortalTarget>] {
		&self.targets
	}
	/// Number of slots holding a target
	pub fn get_non_null_target_count(&self) -> usize {
		self.targets.iter().filter(|slot| slot.is_some()).count()
	}
	/// Number of slots
	pub fn get_target_capacity(&self) -> usize {
		self.targets.len()
	}
	/// Rename the target in slot `index`, returns `false` for an empty slot
	pub fn rename_target(&mut self, index: usize, name: &str) -> bool {
		self.check_index(index);
		match self.targets[index].as_mut() {
			Some(target) => {
				target.set_name(name);
				self.dirty = true;
				true
			}
			None => false,
		}
	}
	/// Recolour the target in slot `index`, returns `false` for an empty slot
	pub fn set_target_color(&mut self, index: usize, color: Option<DyeColor>) -> bool {
		self.check_index(index);
		match self.targets[index].as_mut() {
			Some(target) => {
				target.set_color(color);
				self.dirty = true;
				self.fill_stale |= self.active_target == Some(index);
				true
			}
			None => false,
		}
	}
	/// Select the slot travellers are sent to. Selecting an empty slot is
	/// refused and returns `false`, [None] deactivates the group
	pub fn set_active_target(&mut self, index: Option<usize>) -> bool {
		if let Some(i) = index {
			self.check_index(i);
			if self.targets[i].is_none() {
				return false;
			}
		}
		if self.active_target != index {
			self.active_target = index;
			self.dirty = true;
			self.fill_stale = true;
		}
		true
	}
	/// Get the slot travellers are sent to
	pub fn get_active_target_index(&self) -> Option<usize> {
		self.active_target
	}
	/// Get the target travellers are sent to
	pub fn get_active_target(&self) -> Option<&PortalTarget> {
		self.active_target.and_then(|i| self.targets[i].as_ref())
	}
	/// Deactivate the group, travellers are no longer sent anywhere
	pub fn remove_target(&mut self) {
		self.set_active_target(None);
	}
	/// Paint the portal. Only an active portal can be painted, returns
	/// `false` when there is nothing to paint
	pub fn set_color(&mut self, color: DyeColor) -> bool {
		if self.active_target.is_none() {
			return false;
		}
		if self.color != Some(color) {
			self.color = Some(color);
			self.dirty = true;
			self.fill_stale = true;
		}
		true
	}
	/// Get the paint colour of the portal
	pub fn get_color(&self) -> Option<DyeColor> {
		self.color
	}
	/// Block every relay cell should hold. An active portal is filled with
	/// portal blocks painted in the group colour, falling back to the colour
	/// of the active target, an inactive portal is open air
	pub fn get_portal_block(&self) -> BlockKind {
		match self.get_active_target() {
			Some(target) => BlockKind::Portal(self.color.or(target.get_color())),
			None => BlockKind::Air,
		}
	}
	/// Whether the relay cells need refilling with [PortalGroup::get_portal_block]
	pub fn is_fill_stale(&self) -> bool {
		self.fill_stale
	}
	/// Relay cells hold [PortalGroup::get_portal_block]
	pub(crate) fn mark_filled(&mut self) {
		self.fill_stale = false;
	}
	/// Get the most energy the pool holds
	pub fn get_energy_capacity(&self) -> i32 {
		self.energy_capacity
	}
	/// Whether clients should be told about this group. Energy alone only
	/// counts once it has moved by `threshold` or reached empty or full
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
	/// Persist the group
	pub fn write(&self) -> GroupRecord {
		GroupRecord {
			id: self.id.get(),
			dimension: self.dimension.get().to_string(),
			shape: self.shape.clone(),
			hubs: self.hubs.iter().copied().collect(),
			energy: self.energy,
			targets: self
				.targets
				.iter()
				.map(|slot| slot.as_ref().map(PortalTarget::write))
				.collect(),
			active_target: self.active_target,
			color: self.color.map(|c| c.get_id() as i32),
		}
	}
	/// Restore a group. The slot count and energy capacity come from the
	/// current config, extra slots are dropped and energy is clamped
	pub fn read(record: &GroupRecord, target_capacity: usize, energy_capacity: i32) -> Self {
		let hubs: BTreeSet<BlockPos> = record.hubs.iter().copied().collect();
		let frame = record
			.shape
			.get_frame()
			.iter()
			.filter(|pos| !hubs.contains(pos))
			.copied()
			.collect();
		let mut targets: Vec<Option<PortalTarget>> = record
			.targets
			.iter()
			.map(|slot| slot.as_ref().map(PortalTarget::read))
			.collect();
		targets.resize(target_capacity, None);
		let active_target = record
			.active_target
			.filter(|i| targets.get(*i).is_some_and(|slot| slot.is_some()));
		let energy = record.energy.clamp(0, energy_capacity);
		PortalGroup {
			id: GroupId::new(record.id),
			dimension: DimensionId::new(record.dimension.as_str()),
			shape: record.shape.clone(),
			hubs,
			relays: record.shape.get_area().iter().copied().collect(),
			frame,
			energy,
			energy_capacity,
			targets,
			active_target,
			color: record.color.and_then(DyeColor::from_id),
			dirty: true,
			last_synced_energy: energy,
			fill_stale: true,
		}
	}
}

/// Whether a change from `synced` to `energy` is worth reporting
pub(crate) fn energy_report_due(energy: i32, synced: i32, capacity: i32, threshold: i32) -> bool {
	if energy == synced {
		return false;
	}
	(energy - synced).abs() >= threshold || energy == 0 || energy == capacity
}

impl EnergyStorage for PortalGroup {
	fn receive_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		if amount < 0 {
			return -self.extract_energy(amount.saturating_neg(), simulate);
		}
		let accepted = amount.min(self.energy_capacity - self.energy);
		if !simulate && accepted != 0 {
			self.energy += accepted;
		}
		accepted
	}
	fn extract_energy(&mut self, amount: i32, simulate: bool) -> i32 {
		if amount < 0 {
			return -self.receive_energy(amount.saturating_neg(), simulate);
		}
		let extracted = amount.min(self.energy);
		if !simulate && extracted != 0 {
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
		true
	}
	fn can_extract(&self) -> bool {
		true
	}
}

/// Persisted form of a [PortalGroup]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
	/// Group id
	pub id: u64,
	/// Symbolic dimension id
	pub dimension: String,
	/// Frame and interior
	pub shape: PortalShape,
	/// Stabilizer positions
	pub hubs: Vec<BlockPos>,
	/// Pooled energy
	#[serde(default)]
	pub energy: i32,
	/// Target slots
	#[serde(default)]
	pub targets: Vec<Option<TargetRecord>>,
	/// Active slot
	#[serde(default)]
	pub active_target: Option<usize>,
	/// Paint colour as a dye index
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<i32>,
}
