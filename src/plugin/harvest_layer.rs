//! Runs every [Harvester] once per tick against the blocks and structures
//! of its level
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The level of a harvester along with the structures it may charge. Each
/// query keeps its own world and state lifetimes
struct LevelHarvestContext<'a, 'w, 's, 'w2, 's2> {
	/// Dimension the harvester sits in
	dimension: &'a DimensionId,
	/// Blocks and structures of that dimension
	level: &'a Level,
	/// Groups charged through their members
	groups: &'a mut PortalGroups,
	/// Hubs, charged as plain storage while they have no group
	hubs: &'a mut Query<'w, 's, &'static mut Hub, Without<Harvester>>,
	/// Generic storage blocks
	buffers: &'a mut Query<'w2, 's2, &'static mut EnergyBuffer, Without<Harvester>>,
}

impl HarvestContext for LevelHarvestContext<'_, '_, '_, '_, '_> {
	fn classify(&self, pos: BlockPos) -> ConsumerKind {
		if self.groups.group_of(self.dimension, &pos).is_some() {
			return ConsumerKind::PortalMember;
		}
		let Some(entity) = self.level.get_structure(pos) else {
			return ConsumerKind::Inert;
		};
		// an ungrouped hub only offers its local storage
		if self.hubs.contains(entity)
			|| self.buffers.get(entity).is_ok_and(|buffer| buffer.can_receive())
		{
			ConsumerKind::EnergyStorage
		} else {
			ConsumerKind::Inert
		}
	}
	fn supply_portal_member(&mut self, pos: BlockPos, amount: i32) -> Option<i32> {
		let group = self.groups.group_at_mut(self.dimension, &pos)?;
		Some(group.receive_energy(amount, false))
	}
	fn supply_energy_storage(&mut self, pos: BlockPos, amount: i32) -> Option<i32> {
		if self.groups.group_of(self.dimension, &pos).is_some() {
			// joined a group since discovery, picked up again as a portal member
			return None;
		}
		let entity = self.level.get_structure(pos)?;
		if let Ok(mut hub) = self.hubs.get_mut(entity) {
			let mut view = HubView::new(&mut hub, None);
			return Some(EnergyStorage::receive_energy(&mut view, amount, false));
		}
		let mut buffer = self.buffers.get_mut(entity).ok()?;
		if !buffer.can_receive() {
			return None;
		}
		Some(buffer.receive_energy(amount, false))
	}
}

/// Tick each harvester in a loaded level
#[cfg(not(tarpaulin_include))]
pub fn tick_harvesters(
	mut harvesters: Query<(&mut Harvester, &Structure)>,
	dimensions: Res<Dimensions>,
	mut groups: ResMut<PortalGroups>,
	mut hubs: Query<&'static mut Hub, Without<Harvester>>,
	mut buffers: Query<&'static mut EnergyBuffer, Without<Harvester>>,
) {
	for (mut harvester, structure) in harvesters.iter_mut() {
		let Some(level) = dimensions.get_level(structure.get_dimension()) else {
			continue;
		};
		if level.get_block(structure.get_pos()) != BlockKind::Harvester {
			error!(
				"Harvester at {:?} in {} has lost its block",
				structure.get_pos(),
				structure.get_dimension()
			);
			continue;
		}
		let mut ctx = LevelHarvestContext {
			dimension: structure.get_dimension(),
			level,
			groups: &mut *groups,
			hubs: &mut hubs,
			buffers: &mut buffers,
		};
		harvester.tick(structure.get_pos(), &mut ctx);
		trace!(
			"Harvester at {:?} holds {} after charging {} portal members and {} storage blocks",
			structure.get_pos(),
			harvester.get_energy_stored(),
			harvester.get_charging_portal_blocks().len(),
			harvester.get_charging_energy_blocks().len()
		);
	}
}
