//! A CellArrivalField steers an agent onto one exact tile. Unlike a
//! [FlowField] it is not tied to a chunk, it covers a window of tiles centred
//! on the agent which may straddle chunk boundaries.
//!
//! Directions are packed as 4 bit [Ordinal] codes, two cells to a byte:
//!
//! ```text
//!  byte:   7   6   5   4   3   2   1   0
//!        | even column   |  odd column   |
//! ```
//!
//! Each row of the window occupies `columns / 2` bytes, which is why both
//! dimensions of the window must be even.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Store the code of `ordinal` for the cell at `row`, `column` of a packed
/// grid `columns` cells wide
pub fn pack_cell(cells: &mut [u8], columns: usize, row: usize, column: usize, ordinal: Ordinal) {
	let i = row * (columns / 2) + column / 2;
	let bits = ordinal.to_bits();
	cells[i] = if column % 2 == 0 {
		(cells[i] & 0x0f) | (bits << 4)
	} else {
		(cells[i] & 0xf0) | bits
	};
}

/// Read the [Ordinal] of the cell at `row`, `column` of a packed grid
/// `columns` cells wide
pub fn unpack_cell(cells: &[u8], columns: usize, row: usize, column: usize) -> Ordinal {
	let byte = cells[row * (columns / 2) + column / 2];
	let bits = if column % 2 == 0 { byte >> 4 } else { byte & 0x0f };
	Ordinal::from_bits(bits)
}

/// Packed directions onto a single target tile over a window of tiles
#[derive(Clone, Debug, PartialEq)]
pub struct CellArrivalField {
	/// Number of rows in the window
	rows: usize,
	/// Number of columns in the window
	columns: usize,
	/// Absolute `(row, column)` of the window's top-left tile
	base: (isize, isize),
	/// Packed directions, `columns / 2` bytes per row
	cells: Vec<u8>,
}

impl CellArrivalField {
	/// Create a new instance of [CellArrivalField] covering `rows` by
	/// `columns` tiles, both must be even and non-zero
	pub fn new(rows: usize, columns: usize) -> Self {
		if rows == 0 || columns == 0 || rows % 2 != 0 || columns % 2 != 0 {
			panic!(
				"CellArrivalField dimensions must be even and non-zero, found {} rows and {} columns",
				rows, columns
			);
		}
		CellArrivalField {
			rows,
			columns,
			base: (0, 0),
			cells: vec![0; rows * columns / 2],
		}
	}
	pub fn get_rows(&self) -> usize {
		self.rows
	}
	pub fn get_columns(&self) -> usize {
		self.columns
	}
	/// Absolute `(row, column)` of the window's top-left tile
	pub fn get_base(&self) -> (isize, isize) {
		self.base
	}
	/// The window covered by the field
	pub fn get_region(&self) -> Region {
		Region::new(self.base, self.rows, self.columns)
	}
	/// Packed bytes
	pub fn get_cells(&self) -> &[u8] {
		&self.cells
	}
	/// Direction of a cell by its position in the window
	pub fn get_field_cell_value(&self, row: usize, column: usize) -> Ordinal {
		if row >= self.rows || column >= self.columns {
			panic!(
				"Cannot get a CellArrivalField value, index out of bounds. Asked for row {}, column {}, field has {} rows and {} columns",
				row, column, self.rows, self.columns
			);
		}
		unpack_cell(&self.cells, self.columns, row, column)
	}
	/// Unit vector an agent standing on `tile` should move along, zero when
	/// the tile lies outside of the window
	pub fn direction(&self, res: &MapResolution, tile: &TileDesc) -> Vec2 {
		match self.get_region().local_of(res.abs_of(tile)) {
			Some((r, c)) => unpack_cell(&self.cells, self.columns, r, c).to_vec2(),
			None => Vec2::ZERO,
		}
	}
	/// Build the field towards `target` over a window centred on `center`,
	/// shifted where needed so that the target lies inside it.
	///
	/// Every cell is overwritten, cells the target cannot be reached from
	/// point nowhere
	pub fn create(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		enemies: u16,
		target: &TileDesc,
		center: &TileDesc,
		ws: &mut Workspace,
	) {
		let res = grid.get_resolution();
		let t = res.abs_of(target);
		let c = res.abs_of(center);
		let (rows, columns) = (self.rows as isize, self.columns as isize);
		self.base = (
			(c.0 - rows / 2).clamp(t.0 - rows + 1, t.0),
			(c.1 - columns / 2).clamp(t.1 - columns + 1, t.1),
		);
		let region = self.get_region();
		ws.claim(&region);
		self.cells.fill(0);
		ws.seeds.clear();
		ws.seeds.push(*target);
		ws.integration.calculate_region(
			grid,
			layer,
			region,
			&ws.seeds,
			Passability::Normal { enemies },
			&mut ws.queue,
		);
		let costs = ws.integration.get_costs();
		for r in 0..self.rows {
			for c in 0..self.columns {
				let cost = costs[r * self.columns + c];
				if cost.is_finite() && cost != 0.0 {
					let ordinal = flow_dir(costs, self.rows, self.columns, r, c);
					pack_cell(&mut self.cells, self.columns, r, c, ordinal);
				}
			}
		}
		trace!("Cell arrival field towards {:?} based at {:?}", target, self.base);
	}
	/// Lead an agent standing on an obstacle at `start` out to the nearest
	/// tiles it can stand on, over a window centred on `center`. Only the
	/// obstacle tiles crossed on the way are written
	pub fn update_to_nearest_pathable(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		enemies: u16,
		start: &TileDesc,
		center: &TileDesc,
		ws: &mut Workspace,
	) {
		let res = grid.get_resolution();
		let c = res.abs_of(center);
		self.base = (
			c.0 - self.rows as isize / 2,
			c.1 - self.columns as isize / 2,
		);
		let window = self.get_region();
		ws.claim(&window);
		// the window clipped to the map
		let r0 = window.get_base().0.max(0);
		let c0 = window.get_base().1.max(0);
		let r1 = (window.get_base().0 + self.rows as isize).min(res.map_rows() as isize);
		let c1 = (window.get_base().1 + self.columns as isize).min(res.map_columns() as isize);
		if r0 >= r1 || c0 >= c1 {
			warn!("Cell arrival window at {:?} lies entirely off the map", window.get_base());
			return;
		}
		let clipped = Region::new((r0, c0), (r1 - r0) as usize, (c1 - c0) as usize);
		if !clipped.contains(res.abs_of(start)) {
			warn!("Tile {:?} is outside of the cell arrival window at {:?}", start, window.get_base());
			return;
		}
		ws.seeds.clear();
		passable_frontier(
			grid,
			layer,
			start,
			enemies,
			&clipped,
			&mut ws.seeds,
			Some(&mut ws.search),
		);
		ws.integration.calculate_region(
			grid,
			layer,
			clipped,
			&ws.seeds,
			Passability::UntilObstacle,
			&mut ws.queue,
		);
		let costs = ws.integration.get_costs();
		for (i, cost) in costs.iter().enumerate() {
			if cost.is_infinite() || *cost == 0.0 {
				continue;
			}
			let Some((r, c)) = window.local_of(clipped.abs_of_index(i)) else {
				continue;
			};
			let (lr, lc) = (i / clipped.get_columns(), i % clipped.get_columns());
			let ordinal = flow_dir(costs, clipped.get_rows(), clipped.get_columns(), lr, lc);
			pack_cell(&mut self.cells, self.columns, r, c, ordinal);
		}
	}
}
