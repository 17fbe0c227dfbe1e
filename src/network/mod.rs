//! The portal network is made of three mechanisms working together:
//!
//! - shape recognition, validating a multi-block portal frame and finding
//!   the cells it encloses ([PortalShape])
//! - portal groups pooling energy and targets across every structure of a
//!   portal ([PortalGroup], indexed by [PortalGroups])
//! - harvesters discovering nearby consumers a few cells per tick and
//!   sharing out a bounded amount of energy between them ([Harvester])
//!
//! Travellers touching an active portal are queued and moved once the tick's
//! structure pass is over ([DeferredTeleports]).
//!
//! Data flows as follows:
//!
//! ```text
//!  shape detection --> registry --> group <-- hubs and relays
//!                                     ^
//!                                     |
//!                                 harvester
//!                                     |
//!                       active target v
//!                               teleport --> traveller moved
//! ```
//!
//! Every type here works without an `App`, the systems in [crate::plugin]
//! only drive them once per tick
//!

pub mod config;
pub mod dimension;
pub mod dye;
pub mod energy;
pub mod error;
pub mod group;
pub mod harvester;
pub mod level;
pub mod member;
pub mod shape;
pub mod sync;
pub mod target;
pub mod teleport;
pub mod utilities;
