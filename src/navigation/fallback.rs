//! Searches used when the literal target of a field cannot be reached.
//!
//! An agent standing on an island of a chunk which the target frontier
//! doesn't touch is guided towards the tiles of its own island closest to
//! the frontier instead. An agent standing inside an obstacle is guided out
//! to the nearest tiles it can stand on.
//!
//! Both searches expand in rings of equal Manhattan distance:
//!
//! ```text
//!  _____________________
//! |   |   | 2 |   |   |
//! |___|___|___|___|___|
//! |   | 2 | 1 | 2 |   |
//! |___|___|___|___|___|
//! | 2 | 1 | S | 1 | 2 |
//! |___|___|___|___|___|
//! |   | 2 | 1 | 2 |   |
//! |___|___|___|___|___|
//! ```
//!

use crate::prelude::*;

/// Breadth-first search of a chunk from `start` for the closest passable
/// tiles whose global island is `global_iid` and local island is
/// `local_iid` ([ISLAND_NONE] matches any id). Every match in the first ring
/// containing one is appended to `out` and the ring's distance is returned,
/// `None` when the chunk holds no match
pub fn closest_tiles_local(
	chunk_data: &NavChunk,
	chunk: ChunkCoord,
	start: FieldCell,
	local_iid: u16,
	global_iid: u16,
	scratch: &mut SearchScratch,
	out: &mut Vec<TileDesc>,
) -> Option<usize> {
	let region = Region::new((0, 0), chunk_data.get_rows(), chunk_data.get_columns());
	let Some(start_index) = region.index_of(start.as_signed()) else {
		panic!(
			"Cannot search from {:?}, it is outside of a chunk of {} rows and {} columns",
			start,
			region.get_rows(),
			region.get_columns()
		);
	};
	let matches = |cell: FieldCell| {
		chunk_data.is_passable(cell)
			&& (global_iid == ISLAND_NONE || chunk_data.get_island(cell) == global_iid)
			&& (local_iid == ISLAND_NONE || chunk_data.get_local_island(cell) == local_iid)
	};
	scratch.reset(region.len());
	scratch.visit(start_index);
	scratch.push(start.as_signed(), 0);
	let mut found: Option<usize> = None;
	while let Some(((r, c), distance)) = scratch.pop() {
		if found.is_some_and(|d| distance > d) {
			break;
		}
		let cell = FieldCell::new(r as usize, c as usize);
		if matches(cell) {
			found = Some(distance);
			out.push(TileDesc::new(chunk, cell));
			continue;
		}
		// no need to look further once the ring holding a match is being drained
		if found.is_some() {
			continue;
		}
		for ordinal in Ordinal::CARDINALS {
			let (dr, dc) = ordinal.offset();
			let n = (r + dr, c + dc);
			if let Some(i) = region.index_of(n) {
				if scratch.visit(i) {
					scratch.push(n, distance + 1);
				}
			}
		}
	}
	found
}

/// Breadth-first search within `region` from `start` recording the first
/// tile passable for a faction with `enemies` along every branch. A
/// passable `start` is its own frontier. Uses `scratch` when given and
/// allocates otherwise
pub fn passable_frontier(
	grid: &NavGrid,
	layer: NavLayer,
	start: &TileDesc,
	enemies: u16,
	region: &Region,
	out: &mut Vec<TileDesc>,
	scratch: Option<&mut SearchScratch>,
) {
	if grid.is_passable_for(layer, start, enemies) {
		out.push(*start);
		return;
	}
	let res = grid.get_resolution();
	let start_abs = res.abs_of(start);
	let Some(start_index) = region.index_of(start_abs) else {
		panic!(
			"Cannot search from {:?}, it is outside of the window {:?}",
			start, region
		);
	};
	let mut owned;
	let scratch = match scratch {
		Some(s) => s,
		None => {
			owned = SearchScratch::new(region.len());
			&mut owned
		}
	};
	scratch.reset(region.len());
	scratch.visit(start_index);
	scratch.push(start_abs, 0);
	while let Some((abs, distance)) = scratch.pop() {
		for ordinal in Ordinal::CARDINALS {
			let (dr, dc) = ordinal.offset();
			let n_abs = (abs.0 + dr, abs.1 + dc);
			let Some(i) = region.index_of(n_abs) else {
				continue;
			};
			let Some(tile) = res.desc_of_abs(n_abs) else {
				continue;
			};
			if !scratch.visit(i) {
				continue;
			}
			if grid.is_passable_for(layer, &tile, enemies) {
				out.push(tile);
			} else {
				scratch.push(n_abs, distance + 1);
			}
		}
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn closest_across_wall() {
		let mut chunk = NavChunk::new(5, 5);
		// column 2 is a wall splitting local island 0 (west) from 1 (east)
		for r in 0..5 {
			chunk.set_cost(FieldCell::new(r, 2), COST_IMPASSABLE);
			for c in 3..5 {
				chunk.set_islands(FieldCell::new(r, c), 0, 1);
			}
		}
		let mut scratch = SearchScratch::new(25);
		let mut out = Vec::new();
		let d = closest_tiles_local(&chunk, ChunkCoord::new(0, 0), FieldCell::new(2, 4), 0, 0, &mut scratch, &mut out);
		assert_eq!(Some(3), d);
		assert_eq!(vec![TileDesc::from_parts(0, 0, 2, 1)], out);
	}
	#[test]
	fn closest_keeps_ties() {
		let mut chunk = NavChunk::new(3, 5);
		for r in 0..3 {
			for c in 0..5 {
				chunk.set_islands(FieldCell::new(r, c), 0, 1);
			}
		}
		chunk.set_islands(FieldCell::new(0, 0), 0, 0);
		chunk.set_islands(FieldCell::new(2, 0), 0, 0);
		let mut scratch = SearchScratch::new(15);
		let mut out = Vec::new();
		let d = closest_tiles_local(&chunk, ChunkCoord::new(0, 0), FieldCell::new(1, 4), 0, ISLAND_NONE, &mut scratch, &mut out);
		assert_eq!(Some(5), d);
		assert_eq!(2, out.len());
		assert!(out.contains(&TileDesc::from_parts(0, 0, 0, 0)));
		assert!(out.contains(&TileDesc::from_parts(0, 0, 2, 0)));
	}
	#[test]
	fn closest_without_match() {
		let chunk = NavChunk::new(3, 3);
		let mut scratch = SearchScratch::new(9);
		let mut out = Vec::new();
		let d = closest_tiles_local(&chunk, ChunkCoord::new(0, 0), FieldCell::new(0, 0), 4, ISLAND_NONE, &mut scratch, &mut out);
		assert_eq!(None, d);
		assert!(out.is_empty());
	}
	#[test]
	fn passable_start_is_its_own_frontier() {
		let grid = NavGrid::new(MapResolution::new(1, 1, 4, 4));
		let start = TileDesc::from_parts(0, 0, 1, 1);
		let mut out = Vec::new();
		passable_frontier(&grid, NavLayer::Ground1x1, &start, 0, &grid.get_resolution().chunk_region(ChunkCoord::new(0, 0)), &mut out, None);
		assert_eq!(vec![start], out);
	}
	#[test]
	fn frontier_around_obstacle() {
		let mut grid = NavGrid::new(MapResolution::new(1, 1, 5, 5));
		// a 3x3 block of rock in the middle
		for r in 1..4 {
			for c in 1..4 {
				grid.set_cost(NavLayer::Ground1x1, &TileDesc::from_parts(0, 0, r, c), COST_IMPASSABLE);
			}
		}
		let start = TileDesc::from_parts(0, 0, 2, 2);
		let region = grid.get_resolution().chunk_region(ChunkCoord::new(0, 0));
		let mut scratch = SearchScratch::new(region.len());
		let mut out = Vec::new();
		passable_frontier(&grid, NavLayer::Ground1x1, &start, 0, &region, &mut out, Some(&mut scratch));
		// the 12 tiles of the outer ring that share an edge with the block
		assert_eq!(12, out.len());
		assert!(out.contains(&TileDesc::from_parts(0, 0, 0, 2)));
		assert!(!out.contains(&TileDesc::from_parts(0, 0, 0, 0)));
	}
	#[test]
	fn frontier_enters_enemy_tiles() {
		let mut grid = NavGrid::new(MapResolution::new(1, 1, 3, 1));
		grid.set_cost(NavLayer::Ground1x1, &TileDesc::from_parts(0, 0, 0, 0), COST_IMPASSABLE);
		grid.set_blockers(NavLayer::Ground1x1, &TileDesc::from_parts(0, 0, 0, 1), 1, 0b100);
		let region = grid.get_resolution().chunk_region(ChunkCoord::new(0, 0));
		let mut out = Vec::new();
		passable_frontier(&grid, NavLayer::Ground1x1, &TileDesc::from_parts(0, 0, 0, 0), 0b100, &region, &mut out, None);
		assert_eq!(vec![TileDesc::from_parts(0, 0, 0, 1)], out);
		out.clear();
		passable_frontier(&grid, NavLayer::Ground1x1, &TileDesc::from_parts(0, 0, 0, 0), 0, &region, &mut out, None);
		assert_eq!(vec![TileDesc::from_parts(0, 0, 0, 2)], out);
	}
}
