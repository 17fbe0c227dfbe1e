//! Bundles for the entities of the portal network. Structures are spawned
//! together with their block in a [Level] through [spawn_structure] so that
//! the block and the entity never drift apart
//!

use crate::prelude::*;
use bevy::prelude::*;

/// A bundle of a structure that lives on a block
pub trait PlacedStructure {
	/// Where the structure sits
	fn get_structure(&self) -> &Structure;
	/// The block hosting the structure
	fn get_block(&self) -> BlockKind;
}

/// A stabilizer, the [Hub] of a portal frame
#[derive(Bundle)]
pub struct HubBundle {
	/// Local hub state
	hub: Hub,
	/// Position of the stabilizer
	structure: Structure,
}

impl HubBundle {
	/// Create a new instance of [HubBundle] with empty slots
	pub fn new(dimension: DimensionId, pos: BlockPos, config: &PortalConfig) -> Self {
		HubBundle {
			hub: Hub::new(config),
			structure: Structure::new(dimension, pos),
		}
	}
	/// Create a new instance of [HubBundle] from a persisted hub
	pub fn from_record(
		dimension: DimensionId,
		pos: BlockPos,
		record: HubRecord,
		config: &PortalConfig,
	) -> Self {
		HubBundle {
			hub: Hub::read(record, config),
			structure: Structure::new(dimension, pos),
		}
	}
}

impl PlacedStructure for HubBundle {
	fn get_structure(&self) -> &Structure {
		&self.structure
	}
	fn get_block(&self) -> BlockKind {
		BlockKind::Stabilizer
	}
}

/// An energy [Harvester]
#[derive(Bundle)]
pub struct HarvesterBundle {
	/// Buffer and scan cursor
	harvester: Harvester,
	/// Position of the harvester
	structure: Structure,
}

impl HarvesterBundle {
	/// Create a new instance of [HarvesterBundle]
	pub fn new(dimension: DimensionId, pos: BlockPos, config: &PortalConfig) -> Self {
		HarvesterBundle {
			harvester: Harvester::new(config),
			structure: Structure::new(dimension, pos),
		}
	}
	/// Create a new instance of [HarvesterBundle] from a persisted harvester
	pub fn from_record(
		dimension: DimensionId,
		pos: BlockPos,
		record: &HarvesterRecord,
		config: &PortalConfig,
	) -> Self {
		HarvesterBundle {
			harvester: Harvester::read(record, config),
			structure: Structure::new(dimension, pos),
		}
	}
}

impl PlacedStructure for HarvesterBundle {
	fn get_structure(&self) -> &Structure {
		&self.structure
	}
	fn get_block(&self) -> BlockKind {
		BlockKind::Harvester
	}
}

/// A block storing energy with no other purpose
#[derive(Bundle)]
pub struct EnergyCellBundle {
	/// Stored energy
	buffer: EnergyBuffer,
	/// Position of the cell
	structure: Structure,
}

impl EnergyCellBundle {
	/// Create a new instance of [EnergyCellBundle]
	pub fn new(dimension: DimensionId, pos: BlockPos, capacity: i32) -> Self {
		EnergyCellBundle {
			buffer: EnergyBuffer::new(capacity),
			structure: Structure::new(dimension, pos),
		}
	}
}

impl PlacedStructure for EnergyCellBundle {
	fn get_structure(&self) -> &Structure {
		&self.structure
	}
	fn get_block(&self) -> BlockKind {
		BlockKind::EnergyCell
	}
}

/// Anything that can walk into a portal
#[derive(Bundle)]
pub struct TravellerBundle {
	/// Where the traveller is
	location: Location,
	/// Movement state
	traveller: Traveller,
	/// Last teleport
	cooldown: TeleportCooldown,
}

impl TravellerBundle {
	/// Create a new instance of [TravellerBundle]
	pub fn new(location: Location, traveller: Traveller) -> Self {
		TravellerBundle {
			location,
			traveller,
			cooldown: TeleportCooldown::default(),
		}
	}
}

/// Spawn a structure entity and place its block, loading an empty level for
/// the dimension if needed
pub fn spawn_structure<B: Bundle + PlacedStructure>(world: &mut World, bundle: B) -> Entity {
	let structure = bundle.get_structure().clone();
	let block = bundle.get_block();
	let entity = world.spawn(bundle).id();
	let mut dimensions = world.get_resource_or_insert_with(Dimensions::default);
	dimensions
		.get_or_insert(structure.get_dimension())
		.place_structure(structure.get_pos(), block, entity);
	entity
}

/// Break the structure at `pos` leaving air behind, despawning its entity.
/// Returns whether there was a structure to break
pub fn break_structure(world: &mut World, dimension: &DimensionId, pos: BlockPos) -> bool {
	let entity = world
		.get_resource_mut::<Dimensions>()
		.and_then(|mut dimensions| {
			dimensions
				.get_level_mut(dimension)
				.and_then(|level| level.remove_structure(pos))
		});
	match entity {
		Some(entity) => world.despawn(entity),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn spawned_structure_is_placed() {
		let mut world = World::new();
		let config = PortalConfig::default();
		let pos = BlockPos::new(3, 4, 5);
		let entity = spawn_structure(
			&mut world,
			HubBundle::new(DimensionId::overworld(), pos, &config),
		);
		let dimensions = world.resource::<Dimensions>();
		let level = dimensions.get_level(&DimensionId::overworld()).unwrap();
		assert_eq!(BlockKind::Stabilizer, level.get_block(pos));
		assert_eq!(Some(entity), level.get_structure(pos));
		assert!(world.get::<Hub>(entity).is_some());
	}
	#[test]
	fn broken_structure_is_despawned() {
		let mut world = World::new();
		let pos = BlockPos::new(0, 0, 0);
		let entity = spawn_structure(
			&mut world,
			EnergyCellBundle::new(DimensionId::the_end(), pos, 100),
		);
		assert!(break_structure(&mut world, &DimensionId::the_end(), pos));
		assert!(world.get_entity(entity).is_err());
		assert!(!break_structure(&mut world, &DimensionId::the_end(), pos));
	}
}
