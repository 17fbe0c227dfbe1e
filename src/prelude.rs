//! `use bevy_portal_network_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::network::{
	config::*,
	dimension::*,
	dye::*,
	energy::*,
	error::*,
	group::{registry::*, *},
	harvester::*,
	level::*,
	member::*,
	shape::*,
	sync::*,
	target::*,
	teleport::*,
	utilities::*,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{group_layer::*, harvest_layer::*, sync_layer::*, teleport_layer::*, *},
};
