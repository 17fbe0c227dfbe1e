//! This is a plugin for Bevy game engine to setup and handle the logic of a portal network: validating portal frames, pooling energy and targets across portal groups, charging them from harvesters and teleporting travellers
//!

pub mod bundle;
pub mod network;
pub mod plugin;

pub mod prelude;
