//! `use bevy_flowfield_nav::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::navigation::{
	error::*,
	fallback::*,
	fields::{
		cell_arrival_field::*, flow_field::*, integration_field::*, los_field::*, target::*,
	},
	frontier::*,
	grid::{map_resolution::*, nav_chunk::*, nav_grid::*, portals::*, *},
	query::*,
	utilities::*,
	workspace::*,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{field_layer::*, grid_layer::*, *},
};
