//! Logic for handling changes to the [NavGrid], any cached [FlowField] of a
//! chunk whose tiles have changed is purged so that it gets rebuilt on the
//! next request
//!

use std::sync::Arc;

use crate::prelude::*;
use bevy::prelude::*;

/// Shared, read-only view of the [NavGrid] used by field generation tasks.
/// Edits go through [Arc::make_mut] so tasks holding an older snapshot are
/// never disturbed
#[derive(Component, Clone, Debug)]
pub struct NavGridSnapshot(Arc<NavGrid>);

impl NavGridSnapshot {
	/// Create a new instance of [NavGridSnapshot]
	pub fn new(grid: NavGrid) -> Self {
		NavGridSnapshot(Arc::new(grid))
	}
	pub fn get(&self) -> &NavGrid {
		&self.0
	}
	/// Mutable access to the grid, cloning it first if a snapshot is shared
	pub fn get_mut(&mut self) -> &mut NavGrid {
		Arc::make_mut(&mut self.0)
	}
	/// Cheap handle onto the current snapshot
	pub fn share(&self) -> Arc<NavGrid> {
		Arc::clone(&self.0)
	}
}

/// Used to update the cost of a tile within a layer of the [NavGrid]
#[derive(Event)]
pub struct EventUpdateTileCost {
	/// Layer the tile belongs to
	layer: NavLayer,
	/// Tile to update
	tile: TileDesc,
	/// The cost the tile should be assigned
	cost: u8,
}

impl EventUpdateTileCost {
	/// Create a new instance of [EventUpdateTileCost]
	#[cfg(not(tarpaulin_include))]
	pub fn new(layer: NavLayer, tile: TileDesc, cost: u8) -> Self {
		EventUpdateTileCost { layer, tile, cost }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_layer(&self) -> NavLayer {
		self.layer
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_tile(&self) -> TileDesc {
		self.tile
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_cost(&self) -> u8 {
		self.cost
	}
}

/// Marks every cached field of a chunk as stale without touching the grid,
/// for changes made to blockers or islands outside of the plugin
#[derive(Event)]
pub struct EventChunkDirty {
	/// Layer of the chunk
	layer: NavLayer,
	/// Chunk whose fields are stale
	chunk: ChunkCoord,
}

impl EventChunkDirty {
	/// Create a new instance of [EventChunkDirty]
	#[cfg(not(tarpaulin_include))]
	pub fn new(layer: NavLayer, chunk: ChunkCoord) -> Self {
		EventChunkDirty { layer, chunk }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_layer(&self) -> NavLayer {
		self.layer
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
}

/// Read [EventUpdateTileCost] and write the new costs into the [NavGrid],
/// then invalidate the cached fields each edited tile feeds into
#[cfg(not(tarpaulin_include))]
pub fn process_tile_cost_updates(
	mut events: EventReader<EventUpdateTileCost>,
	mut query: Query<(&mut NavGridSnapshot, &mut FieldCache)>,
) {
	// coalesce events so each tile is only invalidated once
	let mut coalesced: Vec<(NavLayer, TileDesc)> = Vec::new();
	let updates: Vec<&EventUpdateTileCost> = events.read().collect();
	if updates.is_empty() {
		return;
	}
	for (mut snapshot, mut cache) in query.iter_mut() {
		let grid = snapshot.get_mut();
		for event in updates.iter() {
			let tile = event.get_tile();
			let res = grid.get_resolution();
			if !res.contains_chunk(tile.get_chunk()) || !res.contains_cell(tile.get_cell()) {
				warn!("Ignoring cost update of {:?}, it lies outside of the map", tile);
				continue;
			}
			grid.set_cost(event.get_layer(), &tile, event.get_cost());
			let key = (event.get_layer(), tile);
			if !coalesced.contains(&key) {
				coalesced.push(key);
			}
		}
		let res = snapshot.get().get_resolution();
		for (layer, tile) in coalesced.iter() {
			debug!("Invalidating fields around {:?} on {:?}", tile, layer);
			cache.invalidate_tile(res, *layer, tile);
		}
		coalesced.clear();
	}
}

/// Read [EventChunkDirty] and invalidate the cached fields of each chunk and
/// the fields of its neighbours which overlap it
#[cfg(not(tarpaulin_include))]
pub fn process_dirty_chunks(
	mut events: EventReader<EventChunkDirty>,
	mut query: Query<&mut FieldCache>,
) {
	let mut coalesced: Vec<(NavLayer, ChunkCoord)> = Vec::new();
	for event in events.read() {
		let key = (event.get_layer(), event.get_chunk());
		if !coalesced.contains(&key) {
			coalesced.push(key);
		}
	}
	if coalesced.is_empty() {
		return;
	}
	for mut cache in query.iter_mut() {
		for (layer, chunk) in coalesced.iter() {
			debug!("Invalidating fields of {:?} on {:?}", chunk, layer);
			cache.invalidate(*layer, *chunk);
		}
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn edits_do_not_disturb_shared_snapshots() {
		let mut snapshot = NavGridSnapshot::new(NavGrid::new(MapResolution::new(1, 1, 4, 4)));
		let held = snapshot.share();
		let tile = TileDesc::from_parts(0, 0, 1, 1);
		snapshot.get_mut().set_cost(NavLayer::Ground1x1, &tile, COST_IMPASSABLE);
		assert_eq!(COST_IMPASSABLE, snapshot.get().cost(NavLayer::Ground1x1, &tile));
		assert_eq!(1, held.cost(NavLayer::Ground1x1, &tile));
	}
}
