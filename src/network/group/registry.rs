//! The registry owns every [PortalGroup] and answers which group a position
//! belongs to. Member positions (hubs and relays) map to exactly one group,
//! frame positions are watched by every group whose frame they are part of,
//! neighbouring portals may share a frame column
//!

use std::collections::{BTreeMap, BTreeSet, HashMap};

use bevy::prelude::*;

use crate::prelude::*;

/// What a block change did to the groups watching that position
#[derive(Debug, Clone, PartialEq)]
pub enum BlockChangeOutcome {
	/// No group cares about the position
	Untracked,
	/// The new block still fits the role of the position
	Unchanged,
	/// A portal block was broken, the group lost its active target
	Deactivated(GroupId),
	/// The structure of one or more groups was broken, they no longer exist
	Destroyed(Vec<PortalGroup>),
}

/// Every [PortalGroup] along with the position index used to find them
#[derive(Resource, Debug)]
pub struct PortalGroups {
	/// Id handed to the next group created
	next_id: u64,
	/// Groups keyed by id, iterating yields them in creation order
	groups: BTreeMap<GroupId, PortalGroup>,
	/// Hubs and relays of each dimension
	members: HashMap<DimensionId, HashMap<BlockPos, (GroupId, MemberRole)>>,
	/// Plain frame blocks of each dimension and the groups they border
	watchers: HashMap<DimensionId, HashMap<BlockPos, Vec<GroupId>>>,
	/// Slot count of new groups
	target_capacity: usize,
	/// Energy capacity of new groups
	energy_capacity: i32,
}

impl PortalGroups {
	/// Create a new empty instance of [PortalGroups]
	pub fn new(config: &PortalConfig) -> Self {
		PortalGroups {
			next_id: 0,
			groups: BTreeMap::new(),
			members: HashMap::new(),
			watchers: HashMap::new(),
			target_capacity: config.target_capacity,
			energy_capacity: config.group_energy_capacity,
		}
	}
	/// Register a freshly detected shape. When its interior overlaps the
	/// interior of existing groups they are all merged into the earliest
	/// created of them, otherwise a new group is created. Returns the id of
	/// the group now owning the shape
	pub fn add(&mut self, level: &Level, shape: PortalShape) -> GroupId {
		let dimension = level.get_dimension().clone();
		let overlapping: BTreeSet<GroupId> = match self.members.get(&dimension) {
			Some(members) => shape
				.get_area()
				.iter()
				.filter_map(|pos| members.get(pos))
				.filter(|(_, role)| *role == MemberRole::Relay)
				.map(|(id, _)| *id)
				.collect(),
			None => BTreeSet::new(),
		};
		let id = match overlapping.first() {
			Some(id) => *id,
			None => {
				let id = GroupId::new(self.next_id);
				self.next_id += 1;
				id
			}
		};
		let mut group = PortalGroup::new(
			id,
			dimension.clone(),
			shape,
			level,
			self.target_capacity,
			self.energy_capacity,
		);
		// a stabilizer already serving a separate portal stays with it
		let owned_hubs: Vec<BlockPos> = group
			.get_hubs()
			.iter()
			.filter(|pos| {
				self.role_of(&dimension, pos)
					.is_some_and(|(other, role)| role == MemberRole::Hub && !overlapping.contains(&other))
			})
			.copied()
			.collect();
		for pos in owned_hubs {
			group.remove(&pos);
			group.add(pos, MemberRole::Frame);
		}
		if !overlapping.is_empty() {
			let mut ids = overlapping.into_iter();
			let mut survivor = ids
				.next()
				.and_then(|first| self.destroy(first))
				.unwrap_or_else(|| panic!("Overlapping group {:?} is missing from the registry", id));
			for other in ids {
				match self.destroy(other) {
					Some(absorbed) => {
						debug!("Merging group {:?} into {:?}", other, id);
						survivor.absorb(absorbed);
					}
					None => panic!("Overlapping group {:?} is missing from the registry", other),
				}
			}
			survivor.absorb(group);
			group = survivor;
		} else {
			debug!("Created portal group {:?} in {}", id, dimension);
		}
		self.insert(group);
		id
	}
	/// Index and store a group
	fn insert(&mut self, group: PortalGroup) {
		let id = group.get_id();
		let dimension = group.get_dimension().clone();
		let members = self.members.entry(dimension.clone()).or_default();
		let watchers = self.watchers.entry(dimension).or_default();
		for (pos, role) in group.iter_positions() {
			match role {
				MemberRole::Hub | MemberRole::Relay => {
					members.insert(pos, (id, role));
				}
				MemberRole::Frame => {
					let ids = watchers.entry(pos).or_default();
					if !ids.contains(&id) {
						ids.push(id);
					}
				}
			}
		}
		self.groups.insert(id, group);
	}
	/// Remove a group and every index entry pointing at it
	pub fn destroy(&mut self, id: GroupId) -> Option<PortalGroup> {
		let group = self.groups.remove(&id)?;
		let dimension = group.get_dimension();
		if let Some(members) = self.members.get_mut(dimension) {
			for pos in group.get_hubs().iter().chain(group.get_relays().iter()) {
				if members.get(pos).is_some_and(|(owner, _)| *owner == id) {
					members.remove(pos);
				}
			}
		}
		if let Some(watchers) = self.watchers.get_mut(dimension) {
			for pos in group.get_frame() {
				if let Some(ids) = watchers.get_mut(pos) {
					ids.retain(|other| *other != id);
					if ids.is_empty() {
						watchers.remove(pos);
					}
				}
			}
		}
		Some(group)
	}
	/// Group the hub or relay at `pos` belongs to
	pub fn group_of(&self, dimension: &DimensionId, pos: &BlockPos) -> Option<GroupId> {
		self.members
			.get(dimension)
			.and_then(|members| members.get(pos))
			.map(|(id, _)| *id)
	}
	/// Group and role of a tracked position, a frame block shared by several
	/// groups reports the earliest created one
	pub fn role_of(&self, dimension: &DimensionId, pos: &BlockPos) -> Option<(GroupId, MemberRole)> {
		if let Some(member) = self.members.get(dimension).and_then(|m| m.get(pos)) {
			return Some(*member);
		}
		self.watchers
			.get(dimension)
			.and_then(|w| w.get(pos))
			.and_then(|ids| ids.iter().min())
			.map(|id| (*id, MemberRole::Frame))
	}
	/// Get a group by id
	pub fn get(&self, id: GroupId) -> Option<&PortalGroup> {
		self.groups.get(&id)
	}
	/// Get a mutable reference to a group by id
	pub fn get_mut(&mut self, id: GroupId) -> Option<&mut PortalGroup> {
		self.groups.get_mut(&id)
	}
	/// Get the group the hub or relay at `pos` belongs to
	pub fn group_at(&self, dimension: &DimensionId, pos: &BlockPos) -> Option<&PortalGroup> {
		self.group_of(dimension, pos).and_then(|id| self.groups.get(&id))
	}
	/// Get a mutable reference to the group the hub or relay at `pos` belongs to
	pub fn group_at_mut(
		&mut self,
		dimension: &DimensionId,
		pos: &BlockPos,
	) -> Option<&mut PortalGroup> {
		let id = self.group_of(dimension, pos)?;
		self.groups.get_mut(&id)
	}
	/// Iterate over the groups in creation order
	pub fn iter(&self) -> impl Iterator<Item = &PortalGroup> {
		self.groups.values()
	}
	/// Iterate mutably over the groups in creation order
	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PortalGroup> {
		self.groups.values_mut()
	}
	/// Number of live groups
	pub fn len(&self) -> usize {
		self.groups.len()
	}
	/// Whether there are no groups
	pub fn is_empty(&self) -> bool {
		self.groups.is_empty()
	}
	/// React to the block at `pos` becoming `block`.
	///
	/// - a hub stays a hub only while it is a stabilizer
	/// - a relay cell turning into air deactivates the group, a portal block
	///   is fine, anything else breaks the portal
	/// - a frame block stays valid while it is frame material
	///
	/// A stabilizer may be the hub of one group and a plain frame block of
	/// its neighbour, both roles are checked
	pub fn on_block_changed(
		&mut self,
		dimension: &DimensionId,
		pos: &BlockPos,
		block: BlockKind,
	) -> BlockChangeOutcome {
		let member = self.members.get(dimension).and_then(|m| m.get(pos)).copied();
		let watching = self
			.watchers
			.get(dimension)
			.and_then(|w| w.get(pos))
			.cloned()
			.unwrap_or_default();
		if member.is_none() && watching.is_empty() {
			return BlockChangeOutcome::Untracked;
		}
		let mut destroyed = Vec::new();
		let mut deactivated = None;
		if let Some((id, role)) = member {
			match (role, block) {
				(MemberRole::Hub, BlockKind::Stabilizer) => {}
				(MemberRole::Relay, BlockKind::Portal(_)) => {}
				(MemberRole::Relay, BlockKind::Air) => {
					if let Some(group) = self.groups.get_mut(&id) {
						group.remove_target();
					}
					deactivated = Some(id);
				}
				_ => destroyed.extend(self.destroy(id)),
			}
		}
		if !block.is_frame_material() {
			destroyed.extend(watching.into_iter().filter_map(|id| self.destroy(id)));
		}
		if !destroyed.is_empty() {
			BlockChangeOutcome::Destroyed(destroyed)
		} else if let Some(id) = deactivated {
			BlockChangeOutcome::Deactivated(id)
		} else {
			BlockChangeOutcome::Unchanged
		}
	}
	/// Deactivate the group owning the hub or relay at `pos`
	pub fn remove_target(&mut self, dimension: &DimensionId, pos: &BlockPos) -> Option<GroupId> {
		let group = self.group_at_mut(dimension, pos)?;
		group.remove_target();
		Some(group.get_id())
	}
	/// Drop a single hub or relay from its group. When it was the last member
	/// the group is destroyed and returned
	pub fn remove_member(&mut self, dimension: &DimensionId, pos: &BlockPos) -> Option<PortalGroup> {
		let id = self.group_of(dimension, pos)?;
		if let Some(members) = self.members.get_mut(dimension) {
			members.remove(pos);
		}
		let now_empty = self
			.groups
			.get_mut(&id)
			.map(|group| group.remove(pos))
			.unwrap_or_else(|| panic!("Indexed group {:?} is missing from the registry", id));
		if now_empty {
			self.destroy(id)
		} else {
			None
		}
	}
	/// Persist every group in creation order
	pub fn write(&self) -> Vec<GroupRecord> {
		self.groups.values().map(PortalGroup::write).collect()
	}
	/// Restore a registry, ids are kept so the creation order survives
	pub fn read(records: &[GroupRecord], config: &PortalConfig) -> Self {
		let mut registry = PortalGroups::new(config);
		for record in records {
			let group = PortalGroup::read(record, config.target_capacity, config.group_energy_capacity);
			registry.next_id = registry.next_id.max(group.get_id().get() + 1);
			registry.insert(group);
		}
		registry
	}
}
