//! Defines the Bevy [Plugin] for flow field navigation
//!
//! Each frame stale fields are purged, then tile cost changes are written to
//! the grid and queued field requests are built:
//!
//! ```text
//! Tidy:       cleanup_old_fields
//! Calculate:  process_tile_cost_updates -> process_dirty_chunks
//!             -> event_insert_field_queue -> process_field_queue
//! ```
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod field_layer;
pub mod grid_layer;

/// Order the systems of the plugin run in each update
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Purge expired fields
	Tidy,
	/// Apply grid changes then build requested fields
	Calculate,
}

/// Registers the navigation types, events and systems
pub struct FlowFieldNavPlugin;

impl Plugin for FlowFieldNavPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Ordinal>()
			.register_type::<FieldCell>()
			.register_type::<ChunkCoord>()
			.register_type::<TileDesc>()
			.register_type::<NavLayer>()
			.register_type::<MapResolution>()
			.register_type::<FieldCacheSettings>()
			.init_resource::<FieldCacheSettings>()
			.add_event::<field_layer::EventFieldRequest>()
			.add_event::<grid_layer::EventUpdateTileCost>()
			.add_event::<grid_layer::EventChunkDirty>()
			.configure_sets(Update, (OrderingSet::Tidy, OrderingSet::Calculate).chain())
			.add_systems(
				Update,
				(
					field_layer::cleanup_old_fields.in_set(OrderingSet::Tidy),
					(
						grid_layer::process_tile_cost_updates,
						grid_layer::process_dirty_chunks,
						field_layer::event_insert_field_queue,
						field_layer::process_field_queue,
					)
						.chain()
						.in_set(OrderingSet::Calculate),
				),
			);
	}
}
