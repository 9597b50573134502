//! The IntegrationField is a dense array of `f32` costs covering a [Region]
//! of tiles. It holds the cumulative cost of reaching the closest seed
//! (a target tile) from every tile of the region.
//!
//! Every cell starts at `f32::INFINITY`, seeds are set to `0` and a
//! wavefront expands from the cheapest known cell:
//!
//! 1. Pop the cell with the lowest cost from the priority queue
//! 2. Look up its North, East, South and West neighbours, diagonals are never used
//! 3. A neighbour's new cost is the current cost plus the neighbour's own `cost_base`
//! 4. If that improves the neighbour then record it and push it onto the queue
//!    (unless it is already queued)
//!
//! With every tile costing `1` and a seed in the middle the wave produces a
//! diamond:
//!
//! ```text
//!  _____________________________
//! |     |     |     |     |     |
//! |  4  |  3  |  2  |  3  |  4  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  3  |  2  |  1  |  2  |  3  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  2  |  1  |  0  |  1  |  2  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  3  |  2  |  1  |  2  |  3  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  4  |  3  |  2  |  3  |  4  |
//! |_____|_____|_____|_____|_____|
//! ```
//!
//! Which neighbours may join the wave is decided by a [Passability] rule.
//! [Passability::Normal] routes around impassable and blocked tiles while
//! [Passability::UntilObstacle] only spreads *through* them, which is used to
//! lead an agent standing inside an obstacle out to its nearest open edge.
//!
//! A region may straddle chunk boundaries and may start off the map,
//! neighbours that fall outside the region or the map are ignored.
//!

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::prelude::*;

/// Decides which neighbours the wavefront may expand into
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Passability {
	/// Only passable tiles, a tile occupied solely by `enemies` ignores its blockers
	Normal {
		/// Bitmask of the factions hostile to the requester
		enemies: u16,
	},
	/// Only impassable or blocked tiles
	UntilObstacle,
}

impl Passability {
	/// Whether the wavefront may enter `cell` of `chunk`
	fn allows(&self, chunk: &NavChunk, cell: FieldCell) -> bool {
		match self {
			Passability::Normal { enemies } => chunk.is_passable_for(cell, *enemies),
			Passability::UntilObstacle => !chunk.is_passable(cell),
		}
	}
}

/// Entry of the [WavefrontQueue], ordered so the cheapest entry is popped first
#[derive(Clone, Copy, Debug)]
struct WavefrontEntry {
	/// Cost of the cell when it was pushed
	cost: f32,
	/// Flat index of the cell within the region
	index: usize,
}

impl PartialEq for WavefrontEntry {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for WavefrontEntry {}

impl PartialOrd for WavefrontEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for WavefrontEntry {
	fn cmp(&self, other: &Self) -> Ordering {
		match other.cost.total_cmp(&self.cost) {
			Ordering::Equal => other.index.cmp(&self.index),
			s => s,
		}
	}
}

/// Min-priority queue of region cells that also tracks which cells are queued
#[derive(Default, Debug)]
pub struct WavefrontQueue {
	/// Cells waiting to be expanded
	heap: BinaryHeap<WavefrontEntry>,
	/// Whether the cell of each flat index is currently in `heap`
	queued: Vec<bool>,
}

impl WavefrontQueue {
	/// Create a new instance of [WavefrontQueue] able to track `cells` cells without reallocating
	pub fn with_capacity(cells: usize) -> Self {
		WavefrontQueue {
			heap: BinaryHeap::with_capacity(cells),
			queued: Vec::with_capacity(cells),
		}
	}
	/// Empty the queue and size it for a region of `cells` cells
	pub fn reset(&mut self, cells: usize) {
		self.heap.clear();
		self.queued.clear();
		self.queued.resize(cells, false);
	}
	/// Queue a cell unless it is already queued
	pub fn push(&mut self, cost: f32, index: usize) {
		if !self.queued[index] {
			self.queued[index] = true;
			self.heap.push(WavefrontEntry { cost, index });
		}
	}
	/// Take the cheapest cell
	pub fn pop(&mut self) -> Option<usize> {
		let entry = self.heap.pop()?;
		self.queued[entry.index] = false;
		Some(entry.index)
	}
	/// Whether nothing is queued
	pub fn is_empty(&self) -> bool {
		self.heap.is_empty()
	}
}

/// Cumulative cost of reaching the nearest seed for every tile of a [Region]
#[derive(Clone, Debug, PartialEq)]
pub struct IntegrationField {
	/// Tiles covered by the field
	region: Region,
	/// Row-major costs
	costs: Vec<f32>,
}

impl Default for IntegrationField {
	fn default() -> Self {
		IntegrationField::new(Region::new((0, 0), 0, 0))
	}
}

impl IntegrationField {
	/// Creates a new [IntegrationField] where every cell is unreached
	pub fn new(region: Region) -> Self {
		IntegrationField {
			region,
			costs: vec![f32::INFINITY; region.len()],
		}
	}
	/// Cover a new region and mark every cell unreached, reusing the allocation
	pub fn reset(&mut self, region: Region) {
		self.region = region;
		self.costs.clear();
		self.costs.resize(region.len(), f32::INFINITY);
	}
	/// Tiles covered by the field
	pub fn get_region(&self) -> &Region {
		&self.region
	}
	/// Number of rows
	pub fn get_rows(&self) -> usize {
		self.region.get_rows()
	}
	/// Number of columns
	pub fn get_columns(&self) -> usize {
		self.region.get_columns()
	}
	/// Row-major costs
	pub fn get_costs(&self) -> &[f32] {
		&self.costs
	}
	/// Cost of a cell by its position within the region
	pub fn get_field_cell_value(&self, row: usize, column: usize) -> f32 {
		if row >= self.get_rows() || column >= self.get_columns() {
			panic!(
				"Cannot get an IntegrationField value, index out of bounds. Asked for row {}, column {}, field has {} rows and {} columns",
				row,
				column,
				self.get_rows(),
				self.get_columns()
			);
		}
		self.costs[row * self.get_columns() + column]
	}
	/// Cost of a tile, `None` when it lies outside the region
	pub fn cost_of(&self, res: &MapResolution, tile: &TileDesc) -> Option<f32> {
		self.region
			.index_of(res.abs_of(tile))
			.map(|i| self.costs[i])
	}
	/// Set a tile to `0` and queue it. Tiles outside the region are ignored,
	/// returns whether the tile was seeded
	pub fn seed(&mut self, res: &MapResolution, tile: &TileDesc, queue: &mut WavefrontQueue) -> bool {
		match self.region.index_of(res.abs_of(tile)) {
			Some(i) => {
				self.costs[i] = 0.0;
				queue.push(0.0, i);
				true
			}
			None => false,
		}
	}
	/// Lower the cost of a cell by flat index and queue it, returns whether the cost improved
	pub fn relax(&mut self, index: usize, cost: f32, queue: &mut WavefrontQueue) -> bool {
		if cost < self.costs[index] {
			self.costs[index] = cost;
			queue.push(cost, index);
			true
		} else {
			false
		}
	}
	/// Expand the wavefront from every queued cell until the queue is empty
	pub fn calculate(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		rule: Passability,
		queue: &mut WavefrontQueue,
	) {
		let res = grid.get_resolution();
		while let Some(index) = queue.pop() {
			let abs = self.region.abs_of_index(index);
			let current = self.costs[index];
			for ordinal in Ordinal::CARDINALS {
				let (dr, dc) = ordinal.offset();
				let n_abs = (abs.0 + dr, abs.1 + dc);
				let Some(n_index) = self.region.index_of(n_abs) else {
					continue;
				};
				let Some(tile) = res.desc_of_abs(n_abs) else {
					continue;
				};
				let chunk = grid.chunk(layer, tile.get_chunk());
				if !rule.allows(chunk, tile.get_cell()) {
					continue;
				}
				let total = current + chunk.get_cost(tile.get_cell()) as f32;
				self.relax(n_index, total, queue);
			}
		}
	}
	/// Reset the field to `region`, seed it with `seeds` and expand the wavefront
	pub fn calculate_region(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		region: Region,
		seeds: &[TileDesc],
		rule: Passability,
		queue: &mut WavefrontQueue,
	) {
		self.reset(region);
		queue.reset(region.len());
		for seed in seeds.iter() {
			self.seed(grid.get_resolution(), seed, queue);
		}
		self.calculate(grid, layer, rule, queue);
	}
	/// Reset the field to cover a single chunk, seed it and expand the wavefront
	pub fn calculate_chunk(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		chunk: ChunkCoord,
		seeds: &[TileDesc],
		rule: Passability,
		queue: &mut WavefrontQueue,
	) {
		for seed in seeds.iter() {
			if seed.get_chunk() != chunk {
				panic!("Seed {:?} does not belong to chunk {:?}", seed, chunk);
			}
		}
		let region = grid.get_resolution().chunk_region(chunk);
		self.calculate_region(grid, layer, region, seeds, rule, queue);
	}
}
