//! The fields generated for a chunk, or a window of tiles, to steer agents
//! towards a target:
//!
//! * [integration_field] - cumulative cost of reaching the target from every tile
//! * [flow_field] - per chunk direction to move in, read from an integration field
//! * [cell_arrival_field] - packed directions onto one exact tile over a window
//! * [los_field] - which tiles have an unobstructed line to the target
//! * [target] - what a field leads towards and the key it is cached under
//!

pub mod cell_arrival_field;
pub mod flow_field;
pub mod integration_field;
pub mod los_field;
pub mod target;
