//! Every field builder writes its intermediate state into a caller owned
//! [Workspace]. Allocate one per worker thread up front and reuse it for
//! every build, nothing is allocated while a field is generated provided the
//! workspace was sized for the largest window that will be requested.
//!

use std::collections::VecDeque;

use crate::prelude::*;

/// Visited flags and a breadth-first queue over a window of tiles
#[derive(Debug, Default)]
pub struct SearchScratch {
	/// Visited flag of each flat index of the current window
	visited: Vec<bool>,
	/// Pending `(row, column)` coordinates and their distance from the start
	queue: VecDeque<((isize, isize), usize)>,
}

impl SearchScratch {
	/// Create a new instance of [SearchScratch] for windows of up to `cells` tiles
	pub fn new(cells: usize) -> Self {
		SearchScratch {
			visited: Vec::with_capacity(cells),
			queue: VecDeque::with_capacity(cells),
		}
	}
	/// Clear every flag and the queue for a window of `cells` tiles
	pub fn reset(&mut self, cells: usize) {
		self.visited.clear();
		self.visited.resize(cells, false);
		self.queue.clear();
	}
	/// Mark a flat index as visited, returns `false` if it already was
	pub fn visit(&mut self, index: usize) -> bool {
		!std::mem::replace(&mut self.visited[index], true)
	}
	/// Queue a coordinate with its distance from the start
	pub fn push(&mut self, coord: (isize, isize), distance: usize) {
		self.queue.push_back((coord, distance));
	}
	/// Take the oldest queued coordinate
	pub fn pop(&mut self) -> Option<((isize, isize), usize)> {
		self.queue.pop_front()
	}
}

/// Reusable buffers shared by the field builders
#[derive(Debug)]
pub struct Workspace {
	/// Largest number of tiles a window may contain
	max_cells: usize,
	/// Costs of the window being integrated
	pub(crate) integration: IntegrationField,
	/// Wavefront priority queue
	pub(crate) queue: WavefrontQueue,
	/// Breadth-first searches of the fallback resolvers
	pub(crate) search: SearchScratch,
	/// Seed tiles of the next integration
	pub(crate) seeds: Vec<TileDesc>,
	/// Frontier tiles examined by the island fallback
	pub(crate) candidates: Vec<TileDesc>,
	/// Closest island tiles of a single frontier tile
	pub(crate) found: Vec<TileDesc>,
	/// Closest island tiles across every frontier tile
	pub(crate) closest: Vec<TileDesc>,
	/// Entities returned by world queries
	pub(crate) entities: Vec<EntityId>,
	/// Tiles occupied by target entities
	pub(crate) footprint: Vec<TileDesc>,
	/// Window indices of the contour ring being grown around the footprint
	pub(crate) ring: Vec<usize>,
	/// Membership flag of each flat index of the window
	pub(crate) marks: Vec<bool>,
}

impl Workspace {
	/// Create a new instance of [Workspace] able to hold windows of up to
	/// `max_rows` by `max_columns` tiles
	pub fn new(max_rows: usize, max_columns: usize) -> Self {
		let max_cells = max_rows * max_columns;
		// footprints are marked on a window widened by the contour rings
		let ringed_cells = (max_rows + 2 * NavLayer::MAX_CONTOUR_RINGS) * (max_columns + 2 * NavLayer::MAX_CONTOUR_RINGS);
		Workspace {
			max_cells,
			integration: IntegrationField::new(Region::new((0, 0), max_rows, max_columns)),
			queue: WavefrontQueue::with_capacity(max_cells),
			search: SearchScratch::new(max_cells),
			seeds: Vec::with_capacity(max_cells),
			candidates: Vec::with_capacity(max_cells),
			found: Vec::with_capacity(max_cells),
			closest: Vec::with_capacity(max_cells),
			entities: Vec::new(),
			footprint: Vec::with_capacity(max_cells),
			ring: Vec::with_capacity(ringed_cells),
			marks: Vec::with_capacity(ringed_cells),
		}
	}
	/// Create a [Workspace] large enough for every chunk sized and padded
	/// window of a map
	pub fn for_resolution(res: &MapResolution) -> Self {
		let region = padded_chunk_region(res, ChunkCoord::new(0, 0));
		Workspace::new(region.get_rows(), region.get_columns())
	}
	/// Largest number of tiles a window may contain
	pub fn get_max_cells(&self) -> usize {
		self.max_cells
	}
	/// Check the workspace can hold `region`, panics when it cannot
	pub fn claim(&self, region: &Region) {
		if region.len() > self.max_cells {
			panic!(
				"Workspace holds at most {} cells, a window of {} rows and {} columns was requested",
				self.max_cells,
				region.get_rows(),
				region.get_columns()
			);
		}
	}
	/// The integration costs of the most recent build
	pub fn get_integration(&self) -> &IntegrationField {
		&self.integration
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn sized_for_padded_window() {
		let res = MapResolution::new(4, 4, 5, 5);
		let ws = Workspace::for_resolution(&res);
		// 2 * 5 + 1 along each axis
		assert_eq!(121, ws.get_max_cells());
		ws.claim(&Region::new((0, 0), 11, 11));
	}
	#[test]
	fn single_chunk_map_is_not_padded() {
		let res = MapResolution::new(1, 1, 8, 6);
		let ws = Workspace::for_resolution(&res);
		assert_eq!(48, ws.get_max_cells());
	}
	#[test]
	#[should_panic]
	fn undersized() {
		let ws = Workspace::new(4, 4);
		ws.claim(&Region::new((0, 0), 5, 4));
	}
	#[test]
	fn scratch_visits_once() {
		let mut scratch = SearchScratch::new(4);
		scratch.reset(4);
		assert!(scratch.visit(2));
		assert!(!scratch.visit(2));
		scratch.reset(4);
		assert!(scratch.visit(2));
	}
}
