//! A [NavChunk] holds the per-tile navigation data of a single chunk on a
//! single [NavLayer]:
//!
//! * `cost_base` - 8-bit cost of stepping onto a tile, `255` is impassable
//! * `blockers` - number of stationary entities currently standing on the tile
//! * `factions` - bitmask of which factions have blockers on the tile
//! * `islands` - id of the connected region of the whole map the tile belongs to
//! * `local_islands` - id of the connected region within the chunk
//!
//! plus the [Portal]s along its boundaries.
//!

use crate::prelude::*;

/// Navigation data of one chunk on one layer
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NavChunk {
	/// Number of tile rows
	rows: usize,
	/// Number of tile columns
	columns: usize,
	/// Cost of stepping onto each tile
	cost_base: Vec<u8>,
	/// Count of blocking entities on each tile
	blockers: Vec<u16>,
	/// Bitmask of factions with blocking entities on each tile
	factions: Vec<u16>,
	/// Global island id of each tile
	islands: Vec<u16>,
	/// Chunk-local island id of each tile
	local_islands: Vec<u16>,
	/// Portals along the edges of the chunk
	portals: Vec<Portal>,
}

impl NavChunk {
	/// Create a new instance of [NavChunk] where every tile costs `1`, has
	/// no blockers and belongs to island `0`
	pub fn new(rows: usize, columns: usize) -> Self {
		let len = rows * columns;
		NavChunk {
			rows,
			columns,
			cost_base: vec![1; len],
			blockers: vec![0; len],
			factions: vec![0; len],
			islands: vec![0; len],
			local_islands: vec![0; len],
			portals: Vec::new(),
		}
	}
	/// Number of tile rows
	pub fn get_rows(&self) -> usize {
		self.rows
	}
	/// Number of tile columns
	pub fn get_columns(&self) -> usize {
		self.columns
	}
	/// Flat index of a cell, panics when out of bounds
	fn index(&self, cell: FieldCell) -> usize {
		if cell.get_row() >= self.rows || cell.get_column() >= self.columns {
			panic!(
				"Cannot access NavChunk cell, index out of bounds. Asked for row {}, column {}, chunk has {} rows and {} columns",
				cell.get_row(),
				cell.get_column(),
				self.rows,
				self.columns
			)
		}
		cell.get_row() * self.columns + cell.get_column()
	}
	/// Cost of stepping onto a cell
	pub fn get_cost(&self, cell: FieldCell) -> u8 {
		self.cost_base[self.index(cell)]
	}
	/// Set the cost of a cell
	pub fn set_cost(&mut self, cell: FieldCell, cost: u8) {
		let i = self.index(cell);
		self.cost_base[i] = cost;
	}
	/// Number of blockers on a cell
	pub fn get_blockers(&self, cell: FieldCell) -> u16 {
		self.blockers[self.index(cell)]
	}
	/// Set the number of blockers on a cell
	pub fn set_blockers(&mut self, cell: FieldCell, blockers: u16) {
		let i = self.index(cell);
		self.blockers[i] = blockers;
	}
	/// Bitmask of factions present on a cell
	pub fn get_factions(&self, cell: FieldCell) -> u16 {
		self.factions[self.index(cell)]
	}
	/// Set the bitmask of factions present on a cell
	pub fn set_factions(&mut self, cell: FieldCell, factions: u16) {
		let i = self.index(cell);
		self.factions[i] = factions;
	}
	/// Global island id of a cell
	pub fn get_island(&self, cell: FieldCell) -> u16 {
		self.islands[self.index(cell)]
	}
	/// Chunk-local island id of a cell
	pub fn get_local_island(&self, cell: FieldCell) -> u16 {
		self.local_islands[self.index(cell)]
	}
	/// Set the global and chunk-local island ids of a cell
	pub fn set_islands(&mut self, cell: FieldCell, island: u16, local_island: u16) {
		let i = self.index(cell);
		self.islands[i] = island;
		self.local_islands[i] = local_island;
	}
	/// Portals of the chunk
	pub fn get_portals(&self) -> &[Portal] {
		&self.portals
	}
	/// Add a portal to the chunk
	pub fn add_portal(&mut self, portal: Portal) {
		self.portals.push(portal);
	}
	/// Remove every portal of the chunk
	pub fn clear_portals(&mut self) {
		self.portals.clear();
	}
	/// Whether a cell can be entered, ignoring which factions occupy it
	pub fn is_passable(&self, cell: FieldCell) -> bool {
		let i = self.index(cell);
		self.cost_base[i] != COST_IMPASSABLE && self.blockers[i] == 0
	}
	/// Whether a cell can be entered by a faction whose enemies are `enemies`.
	///
	/// A cell occupied only by enemy factions ignores its blockers, so an
	/// enemy seeking agent can walk into them. A cell with no faction
	/// markers at all uses the normal blocker check
	pub fn is_passable_for(&self, cell: FieldCell, enemies: u16) -> bool {
		let i = self.index(cell);
		if self.cost_base[i] == COST_IMPASSABLE {
			return false;
		}
		let present = self.factions[i];
		if enemies != 0 && present != 0 && present & !enemies == 0 {
			return true;
		}
		self.blockers[i] == 0
	}
	/// Overwrite every cost of the chunk from a row-major slice
	pub fn set_costs(&mut self, costs: &[u8]) {
		if costs.len() != self.cost_base.len() {
			panic!(
				"Expected {} costs for a chunk of {}x{} tiles, found {}",
				self.cost_base.len(),
				self.rows,
				self.columns,
				costs.len()
			);
		}
		self.cost_base.copy_from_slice(costs);
	}
}
