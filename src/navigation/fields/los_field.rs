//! The line of sight (LOS) field marks which tiles of a chunk can see the
//! target in a straight line. An agent on a visible tile can head straight
//! for the target instead of following the flow field.
//!
//! Visibility spreads out from the target much like an integration
//! wavefront. When the wave runs into the end of a wall, a corner, a ray is
//! cast from that corner directly away from the target and every tile along
//! it is marked as `wavefront_blocked`, the wave never crosses the ray so the
//! tiles in the wall's shadow stay hidden:
//!
//! ```text
//!  _______________________________
//! |   |   |   |   |   | x | x |   |
//! |___|___|___|___|___|___|___|___|
//! |   |   |   | # | x |   |   |   |
//! |___|___|___|___|___|___|___|___|
//! | T |   |   | # | . | . | . | . |
//! |___|___|___|___|___|___|___|___|
//! |   |   |   | # | x |   |   |   |
//! |___|___|___|___|___|___|___|___|
//! |   |   |   |   |   | x | x |   |
//! |___|___|___|___|___|___|___|___|
//!
//! T target, # wall, x ray, . shadow
//! ```
//!
//! Chunks further from the target carry on from the edge they share with the
//! previously computed chunk, visible edge tiles seed the wave and blocked
//! edge tiles cast their ray again so shadows continue across chunks.
//!
//! Lastly every tile next to a blocked tile is made invisible so agents
//! don't clip corners when moving in a straight line.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Visibility state of a single tile
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct LosCell {
	/// The target can be seen from the tile
	visible: bool,
	/// The tile lies in the shadow of a corner and stops the wavefront
	wavefront_blocked: bool,
}

impl LosCell {
	/// The target can be seen from the tile
	pub fn is_visible(&self) -> bool {
		self.visible
	}
	/// The tile lies in the shadow of a corner
	pub fn is_wavefront_blocked(&self) -> bool {
		self.wavefront_blocked
	}
}

/// Line of sight to a target across the tiles of one chunk
#[derive(Clone, Debug, PartialEq)]
pub struct LosField {
	chunk: ChunkCoord,
	rows: usize,
	columns: usize,
	field: Vec<LosCell>,
}

impl LosField {
	/// Create a new instance of [LosField] where nothing is visible
	pub fn new(chunk: ChunkCoord, res: &MapResolution) -> Self {
		LosField {
			chunk,
			rows: res.get_tile_h(),
			columns: res.get_tile_w(),
			field: vec![LosCell::default(); res.get_tile_h() * res.get_tile_w()],
		}
	}
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
	pub fn get_rows(&self) -> usize {
		self.rows
	}
	pub fn get_columns(&self) -> usize {
		self.columns
	}
	fn index(&self, cell: FieldCell) -> usize {
		if cell.get_row() >= self.rows || cell.get_column() >= self.columns {
			panic!(
				"Cannot access LosField cell, index out of bounds. Asked for row {}, column {}, field has {} rows and {} columns",
				cell.get_row(),
				cell.get_column(),
				self.rows,
				self.columns
			);
		}
		cell.get_row() * self.columns + cell.get_column()
	}
	/// State of a cell
	pub fn get_field_cell_value(&self, cell: FieldCell) -> LosCell {
		self.field[self.index(cell)]
	}
	/// Whether the target can be seen from a cell
	pub fn is_visible(&self, cell: FieldCell) -> bool {
		self.get_field_cell_value(cell).visible
	}
	/// Whether a cell lies in the shadow of a corner
	pub fn is_wavefront_blocked(&self, cell: FieldCell) -> bool {
		self.get_field_cell_value(cell).wavefront_blocked
	}
	/// Compute visibility of `target` for an agent whose hostile factions are
	/// `enemies`.
	///
	/// When the target lies in another chunk `prev` must be the field of the
	/// adjacent chunk one step closer to the target along the route
	pub fn create(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		enemies: u16,
		target: &TileDesc,
		prev: Option<&LosField>,
		ws: &mut Workspace,
	) {
		let res = grid.get_resolution();
		let region = res.chunk_region(self.chunk);
		ws.claim(&region);
		self.field.fill(LosCell::default());
		ws.integration.reset(region);
		ws.queue.reset(region.len());
		let target_abs = res.abs_of(target);
		if target.get_chunk() == self.chunk {
			let i = self.index(target.get_cell());
			self.field[i].visible = true;
			ws.integration.seed(res, target, &mut ws.queue);
		} else {
			let Some(prev) = prev else {
				warn!(
					"LOS of chunk {:?} needs the field of its neighbour towards {:?}",
					self.chunk, target
				);
				return;
			};
			self.inherit_edge(prev, &region, target_abs, ws);
		}
		self.spread(grid, layer, enemies, &region, target_abs, ws);
		self.pad();
	}
	/// Continue from the edge shared with `prev`
	fn inherit_edge(
		&mut self,
		prev: &LosField,
		region: &Region,
		target_abs: (isize, isize),
		ws: &mut Workspace,
	) {
		let (rows, columns) = (self.rows, self.columns);
		let ordinal = self.chunk.ordinal_to(&prev.chunk);
		let len = match ordinal {
			Ordinal::North | Ordinal::South => columns,
			_ => rows,
		};
		// the cell of this field and the cell of `prev` facing it across the boundary
		let edge = |k: usize| match ordinal {
			Ordinal::North => (FieldCell::new(0, k), FieldCell::new(rows - 1, k)),
			Ordinal::South => (FieldCell::new(rows - 1, k), FieldCell::new(0, k)),
			Ordinal::West => (FieldCell::new(k, 0), FieldCell::new(k, columns - 1)),
			_ => (FieldCell::new(k, columns - 1), FieldCell::new(k, 0)),
		};
		// rays first so that no seed is placed in a shadow
		for k in 0..len {
			let (here, there) = edge(k);
			if prev.is_wavefront_blocked(there) {
				self.blocked_line(region, target_abs, here);
			}
		}
		for k in 0..len {
			let (here, there) = edge(k);
			let i = self.index(here);
			if prev.is_visible(there) && !self.field[i].wavefront_blocked {
				self.field[i].visible = true;
				ws.integration.relax(i, 0.0, &mut ws.queue);
			}
		}
	}
	/// Expand visibility from the queued cells
	fn spread(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		enemies: u16,
		region: &Region,
		target_abs: (isize, isize),
		ws: &mut Workspace,
	) {
		let chunk = grid.chunk(layer, self.chunk);
		while let Some(i) = ws.queue.pop() {
			if self.field[i].wavefront_blocked {
				continue;
			}
			let abs = region.abs_of_index(i);
			let current = ws.integration.get_costs()[i];
			for ordinal in Ordinal::CARDINALS {
				let (dr, dc) = ordinal.offset();
				let Some((r, c)) = region.local_of((abs.0 + dr, abs.1 + dc)) else {
					continue;
				};
				let n = r * self.columns + c;
				if self.field[n].wavefront_blocked {
					continue;
				}
				let cell = FieldCell::new(r, c);
				let cost = if chunk.is_passable_for(cell, enemies) {
					chunk.get_cost(cell)
				} else {
					COST_IMPASSABLE
				};
				if cost > 1 {
					if is_los_corner(chunk, cell) {
						self.blocked_line(region, target_abs, cell);
					}
					continue;
				}
				self.field[n].visible = true;
				ws.integration.relax(n, current + 1.0, &mut ws.queue);
			}
		}
	}
	/// Mark the tiles along a ray from `corner` directly away from the target
	/// until the ray leaves the chunk
	fn blocked_line(&mut self, region: &Region, target_abs: (isize, isize), corner: FieldCell) {
		let base = region.get_base();
		let (cr, cc) = corner.as_signed();
		let d = (base.0 + cr - target_abs.0, base.1 + cc - target_abs.1);
		if d == (0, 0) {
			let i = self.index(corner);
			self.field[i].wavefront_blocked = true;
			self.field[i].visible = false;
			return;
		}
		let len = ((d.0 * d.0 + d.1 * d.1) as f32).sqrt();
		let dx = (d.1 as f32 / len * 1000.0).abs() as isize;
		let dy = -((d.0 as f32 / len * 1000.0).abs() as isize);
		let sx = if d.1 > 0 { 1 } else { -1 };
		let sy = if d.0 > 0 { 1 } else { -1 };
		let mut err = dx + dy;
		let (mut r, mut c) = (cr, cc);
		while r >= 0 && c >= 0 && (r as usize) < self.rows && (c as usize) < self.columns {
			let i = r as usize * self.columns + c as usize;
			self.field[i].wavefront_blocked = true;
			self.field[i].visible = false;
			let e2 = 2 * err;
			if e2 >= dy {
				err += dy;
				c += sx;
			}
			if e2 <= dx {
				err += dx;
				r += sy;
			}
		}
	}
	/// Hide every tile sharing an edge or corner with a blocked tile
	fn pad(&mut self) {
		let rows = self.rows as isize;
		let columns = self.columns as isize;
		for i in 0..self.field.len() {
			if !self.field[i].wavefront_blocked {
				continue;
			}
			let (r, c) = ((i / self.columns) as isize, (i % self.columns) as isize);
			for nr in (r - 1).max(0)..=(r + 1).min(rows - 1) {
				for nc in (c - 1).max(0)..=(c + 1).min(columns - 1) {
					self.field[nr as usize * self.columns + nc as usize].visible = false;
				}
			}
		}
	}
}

/// Whether a tile ends a wall, the tiles either side of it along a column or
/// along a row differ in whether they can be entered. Each axis is only
/// checked when the tile has a neighbour on both sides of it within the chunk
fn is_los_corner(chunk: &NavChunk, cell: FieldCell) -> bool {
	let (r, c) = (cell.get_row(), cell.get_column());
	let blocked = |r: usize, c: usize| !chunk.is_passable(FieldCell::new(r, c));
	if r > 0 && r + 1 < chunk.get_rows() && blocked(r - 1, c) != blocked(r + 1, c) {
		return true;
	}
	c > 0 && c + 1 < chunk.get_columns() && blocked(r, c - 1) != blocked(r, c + 1)
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// A 7x7 chunk with a wall of three tiles in column 3
	fn walled(chunks: usize) -> NavGrid {
		let mut grid = NavGrid::new(MapResolution::new(chunks, 1, 7, 7));
		for r in 1..4 {
			grid.set_cost(NavLayer::Ground1x1, &TileDesc::from_parts(0, 0, r, 3), COST_IMPASSABLE);
		}
		grid
	}
	#[test]
	fn open_chunk_is_visible() {
		let grid = NavGrid::new(MapResolution::new(1, 1, 5, 5));
		let mut ws = Workspace::for_resolution(grid.get_resolution());
		let mut los = LosField::new(ChunkCoord::new(0, 0), grid.get_resolution());
		los.create(&grid, NavLayer::Ground1x1, 0, &TileDesc::from_parts(0, 0, 2, 2), None, &mut ws);
		for r in 0..5 {
			for c in 0..5 {
				assert!(los.is_visible(FieldCell::new(r, c)));
			}
		}
	}
	#[test]
	fn wall_casts_shadow() {
		let grid = walled(1);
		let mut ws = Workspace::for_resolution(grid.get_resolution());
		let mut los = LosField::new(ChunkCoord::new(0, 0), grid.get_resolution());
		los.create(&grid, NavLayer::Ground1x1, 0, &TileDesc::from_parts(0, 0, 2, 0), None, &mut ws);
		assert!(los.is_visible(FieldCell::new(2, 0)));
		assert!(los.is_visible(FieldCell::new(2, 1)));
		assert!(los.is_visible(FieldCell::new(6, 6)));
		// both ends of the wall are corners and their rays reach the edge
		for (r, c) in [(1, 3), (1, 4), (0, 5), (0, 6), (3, 3), (3, 4), (4, 5), (4, 6)] {
			assert!(los.is_wavefront_blocked(FieldCell::new(r, c)));
		}
		for (r, c) in [(2, 4), (2, 5), (2, 6), (1, 5), (3, 6)] {
			assert!(!los.is_visible(FieldCell::new(r, c)));
			assert!(!los.is_wavefront_blocked(FieldCell::new(r, c)));
		}
	}
	#[test]
	fn corner_tests() {
		let grid = walled(1);
		let chunk = grid.chunk(NavLayer::Ground1x1, ChunkCoord::new(0, 0));
		assert!(is_los_corner(chunk, FieldCell::new(1, 3)));
		assert!(is_los_corner(chunk, FieldCell::new(3, 3)));
		assert!(!is_los_corner(chunk, FieldCell::new(2, 3)));
		assert!(!is_los_corner(chunk, FieldCell::new(0, 3)));
	}
	/// A 7x7 pair of chunks where the second has a wall down its west edge
	fn edge_walled() -> NavGrid {
		let mut grid = NavGrid::new(MapResolution::new(2, 1, 7, 7));
		for r in 0..3 {
			grid.set_cost(NavLayer::Ground1x1, &TileDesc::from_parts(0, 1, r, 0), COST_IMPASSABLE);
		}
		grid
	}
	#[test]
	fn corner_on_chunk_edge() {
		let grid = edge_walled();
		let chunk = grid.chunk(NavLayer::Ground1x1, ChunkCoord::new(0, 1));
		// only the column is checked along the west edge
		assert!(is_los_corner(chunk, FieldCell::new(2, 0)));
		assert!(!is_los_corner(chunk, FieldCell::new(1, 0)));
		assert!(!is_los_corner(chunk, FieldCell::new(0, 0)));
		assert!(!is_los_corner(chunk, FieldCell::new(3, 0)));
	}
	#[test]
	fn wall_on_chunk_edge_casts_shadow() {
		let grid = edge_walled();
		let mut ws = Workspace::for_resolution(grid.get_resolution());
		let target = TileDesc::from_parts(0, 0, 5, 5);
		let mut first = LosField::new(ChunkCoord::new(0, 0), grid.get_resolution());
		first.create(&grid, NavLayer::Ground1x1, 0, &target, None, &mut ws);
		let mut second = LosField::new(ChunkCoord::new(0, 1), grid.get_resolution());
		second.create(&grid, NavLayer::Ground1x1, 0, &target, Some(&first), &mut ws);
		// the ray leaves the end of the wall away from the target
		for (r, c) in [(2, 0), (1, 1), (0, 1)] {
			assert!(second.is_wavefront_blocked(FieldCell::new(r, c)));
			assert!(!second.is_visible(FieldCell::new(r, c)));
		}
		assert!(second.is_visible(FieldCell::new(6, 6)));
		assert!(second.is_visible(FieldCell::new(5, 0)));
	}
	#[test]
	fn degenerate_ray_marks_corner() {
		let res = MapResolution::new(1, 1, 5, 5);
		let mut los = LosField::new(ChunkCoord::new(0, 0), &res);
		let region = res.chunk_region(ChunkCoord::new(0, 0));
		los.blocked_line(&region, (2, 2), FieldCell::new(2, 2));
		assert!(los.is_wavefront_blocked(FieldCell::new(2, 2)));
		assert!(!los.is_wavefront_blocked(FieldCell::new(2, 3)));
	}
	#[test]
	fn straight_ray() {
		let res = MapResolution::new(1, 1, 5, 5);
		let mut los = LosField::new(ChunkCoord::new(0, 0), &res);
		let region = res.chunk_region(ChunkCoord::new(0, 0));
		los.blocked_line(&region, (2, 0), FieldCell::new(2, 2));
		for c in 2..5 {
			assert!(los.is_wavefront_blocked(FieldCell::new(2, c)));
		}
		assert!(!los.is_wavefront_blocked(FieldCell::new(2, 1)));
	}
	#[test]
	fn continues_from_previous_chunk() {
		let grid = walled(2);
		let mut ws = Workspace::for_resolution(grid.get_resolution());
		let target = TileDesc::from_parts(0, 0, 2, 0);
		let mut first = LosField::new(ChunkCoord::new(0, 0), grid.get_resolution());
		first.create(&grid, NavLayer::Ground1x1, 0, &target, None, &mut ws);
		let mut second = LosField::new(ChunkCoord::new(0, 1), grid.get_resolution());
		second.create(&grid, NavLayer::Ground1x1, 0, &target, Some(&first), &mut ws);
		// the shadow carries on and the rays are cast again
		assert!(!second.is_visible(FieldCell::new(2, 0)));
		assert!(second.is_wavefront_blocked(FieldCell::new(0, 0)));
		assert!(second.is_wavefront_blocked(FieldCell::new(4, 0)));
		assert!(second.is_visible(FieldCell::new(6, 0)));
	}
	#[test]
	fn missing_previous_chunk() {
		let grid = walled(2);
		let mut ws = Workspace::for_resolution(grid.get_resolution());
		let mut los = LosField::new(ChunkCoord::new(0, 1), grid.get_resolution());
		los.create(&grid, NavLayer::Ground1x1, 0, &TileDesc::from_parts(0, 0, 2, 0), None, &mut ws);
		assert!(!los.is_visible(FieldCell::new(3, 3)));
	}
}
