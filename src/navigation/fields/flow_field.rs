//! A FlowField is a grid of [Ordinal]s covering one chunk, each cell points
//! an agent towards the neighbour which leads most cheaply to the target.
//!
//! Directions are read from an [IntegrationField]. Every reached tile with a
//! non-zero cost looks at its eight neighbours and picks the cheapest:
//!
//! ```text
//!  ___________________            ___________________
//! |     |     |     |             |     |     |     |
//! |  3  |  2  |  3  |             |  ↘  |  ↓  |  ↙  |
//! |_____|_____|_____|             |_____|_____|_____|
//! |     |     |     |             |     |     |     |
//! |  2  |  1  |  2  |     =>      |  ↘  |  ↓  |  ↙  |
//! |_____|_____|_____|             |_____|_____|_____|
//! |     |     |     |             |     |     |     |
//! |  1  |  0  |  1  |             |  →  |  ·  |  ←  |
//! |_____|_____|_____|             |_____|_____|_____|
//! ```
//!
//! A diagonal is only taken when both of the cardinals flanking it were
//! reached, an agent never cuts the corner of an obstacle. Equal costs are
//! settled in the order North, South, East, West, North-West, North-East,
//! South-West, South-East. Seeds point nowhere ([Ordinal::Zero]) and tiles
//! that were never reached are left untouched so that several passes over
//! different islands of a chunk can be layered onto one field.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The direction of the cheapest finite neighbour of the cell at `row`,
/// `column` of a row-major grid of integration costs
pub fn flow_dir(costs: &[f32], rows: usize, columns: usize, row: usize, column: usize) -> Ordinal {
	let at = |ordinal: Ordinal| -> Option<f32> {
		let (dr, dc) = ordinal.offset();
		let r = row as isize + dr;
		let c = column as isize + dc;
		if r < 0 || c < 0 || r as usize >= rows || c as usize >= columns {
			return None;
		}
		let cost = costs[r as usize * columns + c as usize];
		cost.is_finite().then_some(cost)
	};
	let mut best: Option<(f32, Ordinal)> = None;
	for ordinal in Ordinal::PRIORITY {
		let Some(cost) = at(ordinal) else {
			continue;
		};
		if let Some((a, b)) = ordinal.flanking() {
			if at(a).is_none() || at(b).is_none() {
				continue;
			}
		}
		if best.is_none_or(|(lowest, _)| cost < lowest) {
			best = Some((cost, ordinal));
		}
	}
	debug_assert!(
		best.is_some(),
		"Cell at row {}, column {} has no reachable neighbour",
		row,
		column
	);
	best.map_or(Ordinal::Zero, |(_, ordinal)| ordinal)
}

/// Directions towards a target for every tile of a chunk
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
	/// Chunk the field covers
	chunk: ChunkCoord,
	/// What the field leads towards
	target: FieldTarget,
	/// Number of rows
	rows: usize,
	/// Number of columns
	columns: usize,
	/// Row-major directions
	field: Vec<Ordinal>,
}

impl FlowField {
	/// Create a new instance of [FlowField] where every cell points nowhere
	pub fn new(chunk: ChunkCoord, target: FieldTarget, res: &MapResolution) -> Self {
		FlowField {
			chunk,
			target,
			rows: res.get_tile_h(),
			columns: res.get_tile_w(),
			field: vec![Ordinal::Zero; res.get_tile_h() * res.get_tile_w()],
		}
	}
	/// Chunk the field covers
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
	/// What the field leads towards
	pub fn get_target(&self) -> &FieldTarget {
		&self.target
	}
	pub fn get_rows(&self) -> usize {
		self.rows
	}
	pub fn get_columns(&self) -> usize {
		self.columns
	}
	/// Row-major directions
	pub fn get(&self) -> &[Ordinal] {
		&self.field
	}
	/// Flat index of a cell, panics when out of bounds
	fn index(&self, cell: FieldCell) -> usize {
		if cell.get_row() >= self.rows || cell.get_column() >= self.columns {
			panic!(
				"Cannot access FlowField cell, index out of bounds. Asked for row {}, column {}, field has {} rows and {} columns",
				cell.get_row(),
				cell.get_column(),
				self.rows,
				self.columns
			);
		}
		cell.get_row() * self.columns + cell.get_column()
	}
	/// Direction stored in a cell
	pub fn get_field_cell_value(&self, cell: FieldCell) -> Ordinal {
		self.field[self.index(cell)]
	}
	/// Overwrite the direction of a cell
	pub fn set_field_cell_value(&mut self, value: Ordinal, cell: FieldCell) {
		let i = self.index(cell);
		self.field[i] = value;
	}
	/// Unit vector an agent standing on `cell` should move along in the `x-z` plane
	pub fn direction(&self, cell: FieldCell) -> Vec2 {
		self.get_field_cell_value(cell).to_vec2()
	}
	/// Derive directions from an integration field whose cell
	/// `(offset.0, offset.1)` lines up with this field's top-left cell
	fn build_from(&mut self, integration: &IntegrationField, offset: (usize, usize)) {
		let rows = integration.get_rows();
		let columns = integration.get_columns();
		let costs = integration.get_costs();
		for r in 0..self.rows {
			for c in 0..self.columns {
				let (ir, ic) = (r + offset.0, c + offset.1);
				let cost = costs[ir * columns + ic];
				if cost.is_infinite() {
					continue;
				}
				self.field[r * self.columns + c] = if cost == 0.0 {
					Ordinal::Zero
				} else {
					flow_dir(costs, rows, columns, ir, ic)
				};
			}
		}
	}
	/// Point the seeds lying on the target's portals across their boundary
	/// so agents arriving on them step into the next chunk
	fn point_through_portals(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		integration: &IntegrationField,
	) {
		let res = grid.get_resolution();
		let fix = |field: &mut FlowField, port: &Portal| {
			let crossing = port.crossing();
			for cell in port.cells() {
				let tile = TileDesc::new(field.chunk, cell);
				if integration.cost_of(res, &tile) == Some(0.0) {
					field.set_field_cell_value(crossing, cell);
				}
			}
		};
		match self.target {
			FieldTarget::Portal(pd) => fix(self, pd.get_port()),
			FieldTarget::PortalMask(mask) => {
				for port in masked_portals(mask, grid, layer, self.chunk) {
					fix(self, port);
				}
			}
			_ => {}
		}
	}
	/// Rebuild the field towards its target for an agent of `faction`.
	///
	/// Every cell is reset before building, cells the target cannot be
	/// reached from point nowhere
	pub fn update(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		faction: Option<usize>,
		ctx: &impl QueryContext,
		ws: &mut Workspace,
	) {
		let res = grid.get_resolution();
		let enemies = ctx.enemies_of(faction);
		let (scope, rule) = match self.target {
			FieldTarget::Enemies(_) | FieldTarget::Entity(_) => (
				FrontierScope::padded(res, self.chunk, enemies),
				Passability::Normal { enemies: 0 },
			),
			_ => (
				FrontierScope::chunk(res, self.chunk, enemies),
				Passability::Normal { enemies },
			),
		};
		resolve_frontier(&self.target, grid, layer, &scope, ctx, ws);
		ws.integration.calculate_region(
			grid,
			layer,
			*scope.get_region(),
			&ws.seeds,
			rule,
			&mut ws.queue,
		);
		self.field.fill(Ordinal::Zero);
		self.build_from(&ws.integration, scope.offset(res));
		self.point_through_portals(grid, layer, &ws.integration);
	}
	/// Lead an agent standing on an obstacle at `start` out to the nearest
	/// tiles it can stand on. Only the obstacle tiles crossed on the way are
	/// written, the rest of the field is left as it was
	pub fn update_to_nearest_pathable(
		&mut self,
		grid: &NavGrid,
		layer: NavLayer,
		start: FieldCell,
		ws: &mut Workspace,
	) {
		let region = grid.get_resolution().chunk_region(self.chunk);
		ws.claim(&region);
		ws.seeds.clear();
		passable_frontier(
			grid,
			layer,
			&TileDesc::new(self.chunk, start),
			0,
			&region,
			&mut ws.seeds,
			Some(&mut ws.search),
		);
		if ws.seeds.is_empty() {
			debug!("No tile of chunk {:?} can be reached from {:?}", self.chunk, start);
			return;
		}
		ws.integration.calculate_region(
			grid,
			layer,
			region,
			&ws.seeds,
			Passability::UntilObstacle,
			&mut ws.queue,
		);
		let costs = ws.integration.get_costs();
		for r in 0..self.rows {
			for c in 0..self.columns {
				let cost = costs[r * self.columns + c];
				if cost.is_finite() && cost != 0.0 {
					self.field[r * self.columns + c] =
						flow_dir(costs, self.rows, self.columns, r, c);
				}
			}
		}
	}
	/// Guide agents on local island `local_iid` of the chunk towards the
	/// tiles of that island closest to the target.
	///
	/// Used when the target frontier lies on a different island than the
	/// agent. Directions of other islands are left as they were
	pub fn update_island_to_nearest(
		&mut self,
		local_iid: u16,
		grid: &NavGrid,
		layer: NavLayer,
		faction: Option<usize>,
		ctx: &impl QueryContext,
		ws: &mut Workspace,
	) {
		let res = grid.get_resolution();
		let enemies = ctx.enemies_of(faction);
		let scope = FrontierScope::chunk(res, self.chunk, enemies);
		resolve_frontier(&self.target, grid, layer, &scope, ctx, ws);
		if ws.seeds.is_empty() {
			debug!(
				"Target {:?} of chunk {:?} has no enterable tiles, retrying regardless of blockers",
				self.target.kind(),
				self.chunk
			);
			resolve_frontier(&self.target, grid, layer, &scope.with_ignore_block(), ctx, ws);
		}
		std::mem::swap(&mut ws.candidates, &mut ws.seeds);
		let chunk_data = grid.chunk(layer, self.chunk);
		ws.closest.clear();
		let mut best: Option<usize> = None;
		for candidate in ws.candidates.iter() {
			let cell = candidate.get_cell();
			ws.found.clear();
			let distance = if chunk_data.get_local_island(cell) == local_iid {
				ws.found.push(*candidate);
				Some(0)
			} else {
				closest_tiles_local(
					chunk_data,
					self.chunk,
					cell,
					local_iid,
					chunk_data.get_island(cell),
					&mut ws.search,
					&mut ws.found,
				)
			};
			let Some(distance) = distance else {
				continue;
			};
			match best {
				Some(lowest) if distance > lowest => {}
				Some(lowest) if distance == lowest => ws.closest.extend_from_slice(&ws.found),
				_ => {
					best = Some(distance);
					ws.closest.clear();
					ws.closest.extend_from_slice(&ws.found);
				}
			}
		}
		let Some(distance) = best else {
			debug!(
				"Island {} of chunk {:?} cannot get any closer to {:?}",
				local_iid,
				self.chunk,
				self.target.kind()
			);
			return;
		};
		trace!(
			"Island {} of chunk {:?} is {} tiles from the target over {} tiles",
			local_iid,
			self.chunk,
			distance,
			ws.closest.len()
		);
		ws.integration.calculate_region(
			grid,
			layer,
			*scope.get_region(),
			&ws.closest,
			Passability::Normal { enemies },
			&mut ws.queue,
		);
		self.build_from(&ws.integration, (0, 0));
		self.point_through_portals(grid, layer, &ws.integration);
	}
}
