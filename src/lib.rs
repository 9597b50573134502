//! Flow field navigation for the Bevy game engine. A map is split into
//! chunks of tiles and fields guiding crowds of agents are generated one
//! chunk at a time
//!

pub mod bundle;
pub mod navigation;
pub mod plugin;

pub mod prelude;
