//! Defines the Bevy [Plugin] for the portal network
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod group_layer;
pub mod harvest_layer;
pub mod sync_layer;
pub mod teleport_layer;

/// One `Update` is one simulation tick, the sets run in declaration order
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Advance the tick counter
	Tick,
	/// Block changes, hub activation, target edits and portal fill
	Structures,
	/// Harvesters discover consumers and hand out energy
	Harvest,
	/// Travellers touching active portals are queued
	Contacts,
	/// Queued teleports are carried out
	Deferred,
	/// Dirty groups and hubs are published
	Sync,
}

/// Adds the portal network to an [App]
#[derive(Default)]
pub struct PortalNetworkPlugin {
	/// Limits handed to every structure
	config: PortalConfig,
}

impl PortalNetworkPlugin {
	/// Create a new instance of [PortalNetworkPlugin] with custom limits
	pub fn new(config: PortalConfig) -> Self {
		PortalNetworkPlugin { config }
	}
	/// Create a new instance of [PortalNetworkPlugin] with limits read from a `ron` file
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> Result<Self, PortalError> {
		Ok(PortalNetworkPlugin {
			config: PortalConfig::from_ron(path)?,
		})
	}
}

impl Plugin for PortalNetworkPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<BlockPos>()
			.register_type::<PlaneAxis>()
			.register_type::<DimensionId>()
			.register_type::<DyeColor>()
			.register_type::<BlockKind>()
			.register_type::<GroupId>()
			.register_type::<PortalTarget>()
			.register_type::<EnergyBuffer>()
			.register_type::<Location>()
			.register_type::<Traveller>()
			.register_type::<TeleportCooldown>()
			.register_type::<SimulationTick>()
			.insert_resource(self.config.clone())
			.insert_resource(PortalGroups::new(&self.config))
			.init_resource::<Dimensions>()
			.init_resource::<SimulationTick>()
			.init_resource::<DeferredTeleports>()
			.add_event::<group_layer::EventActivateHub>()
			.add_event::<group_layer::EventHubActivated>()
			.add_event::<group_layer::EventSetTarget>()
			.add_event::<group_layer::EventSelectTarget>()
			.add_event::<group_layer::EventEditTarget>()
			.add_event::<group_layer::EventUsePortal>()
			.add_event::<teleport_layer::EventPortalContact>()
			.add_event::<teleport_layer::EventTeleported>()
			.add_event::<teleport_layer::EventTravellerRebuilt>()
			.add_event::<sync_layer::EventGroupUpdate>()
			.add_event::<sync_layer::EventHubUpdate>()
			.add_event::<sync_layer::EventGroupRemoved>()
			.configure_sets(
				Update,
				(
					OrderingSet::Tick,
					OrderingSet::Structures,
					OrderingSet::Harvest,
					OrderingSet::Contacts,
					OrderingSet::Deferred,
					OrderingSet::Sync,
				)
					.chain(),
			)
			.add_systems(
				Update,
				(
					teleport_layer::advance_simulation_tick.in_set(OrderingSet::Tick),
					(
						group_layer::process_block_changes,
						group_layer::activate_hubs,
						group_layer::edit_targets,
						group_layer::use_portal,
						group_layer::refresh_portal_blocks,
					)
						.chain()
						.in_set(OrderingSet::Structures),
					harvest_layer::tick_harvesters.in_set(OrderingSet::Harvest),
					teleport_layer::detect_portal_contacts.in_set(OrderingSet::Contacts),
					teleport_layer::process_deferred_teleports.in_set(OrderingSet::Deferred),
					(
						sync_layer::publish_hub_updates,
						sync_layer::publish_group_updates,
						sync_layer::mirror_group_updates,
					)
						.chain()
						.in_set(OrderingSet::Sync),
				),
			);
	}
}
