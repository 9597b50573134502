//! Resolution of a [FieldTarget] into the seed tiles an integration starts
//! from.
//!
//! Static targets (tiles and portals) only ever seed tiles of the chunk being
//! built. Enemies and entities move around and may sit just outside of the
//! chunk, so their fields are integrated over a padded window centred on the
//! chunk and the chunk's own window is cut out of the result afterwards:
//!
//! ```text
//!  _______________________
//! |     :           :     |
//! |.....:...........:.....|
//! |     |  chunk    |     |
//! |     |           |     |
//! |.....|___________|.....|
//! |     :           :     |
//! |_____:___________:_____|
//! ```
//!
//! Along an axis with a single chunk there is nothing to pad against and the
//! window matches the chunk.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The window of tiles a frontier is resolved over and the rules applied to it
#[derive(Clone, Copy, Debug)]
pub struct FrontierScope {
	/// Chunk the field is being built for
	chunk: ChunkCoord,
	/// Window of tiles seeds may be emitted in
	region: Region,
	/// Factions hostile to the requester
	enemies: u16,
	/// Seed tile and portal targets regardless of passability
	ignore_block: bool,
}

impl FrontierScope {
	/// A scope covering exactly one chunk
	pub fn chunk(res: &MapResolution, chunk: ChunkCoord, enemies: u16) -> Self {
		FrontierScope {
			chunk,
			region: res.chunk_region(chunk),
			enemies,
			ignore_block: false,
		}
	}
	/// A scope covering the padded window around a chunk
	pub fn padded(res: &MapResolution, chunk: ChunkCoord, enemies: u16) -> Self {
		FrontierScope {
			chunk,
			region: padded_chunk_region(res, chunk),
			enemies,
			ignore_block: false,
		}
	}
	/// The same scope seeding targets whether or not they can be entered
	pub fn with_ignore_block(mut self) -> Self {
		self.ignore_block = true;
		self
	}
	/// Chunk the field is being built for
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
	/// Window of tiles seeds may be emitted in
	pub fn get_region(&self) -> &Region {
		&self.region
	}
	/// Position of the chunk's top-left tile within the window
	pub fn offset(&self, res: &MapResolution) -> (usize, usize) {
		let chunk_base = res.chunk_region(self.chunk).get_base();
		let base = self.region.get_base();
		((chunk_base.0 - base.0) as usize, (chunk_base.1 - base.1) as usize)
	}
}

/// The window an enemies or entity field of `chunk` is integrated over
pub fn padded_chunk_region(res: &MapResolution, chunk: ChunkCoord) -> Region {
	let (base_row, rows) = padded_axis(res.get_chunk_h(), res.get_tile_h(), chunk.get_row());
	let (base_column, columns) =
		padded_axis(res.get_chunk_w(), res.get_tile_w(), chunk.get_column());
	Region::new((base_row, base_column), rows, columns)
}

/// Base and length of a padded window along one axis
fn padded_axis(chunks: usize, tiles: usize, index: usize) -> (isize, usize) {
	if chunks <= 1 {
		return (0, tiles);
	}
	let len = 2 * tiles + tiles % 2;
	let base = if index > 0 {
		(index - 1) * tiles + tiles / 2 + tiles % 2
	} else {
		0
	};
	(base as isize, len)
}

/// Write the seed tiles of `target` within `scope` to the workspace's seed buffer
pub fn resolve_frontier(
	target: &FieldTarget,
	grid: &NavGrid,
	layer: NavLayer,
	scope: &FrontierScope,
	ctx: &impl QueryContext,
	ws: &mut Workspace,
) {
	ws.claim(scope.get_region());
	ws.seeds.clear();
	match target {
		FieldTarget::Tile(cell) => tile_frontier(*cell, grid, layer, scope, &mut ws.seeds),
		FieldTarget::Portal(pd) => portal_frontier(pd, grid, layer, scope, &mut ws.seeds),
		FieldTarget::PortalMask(mask) => {
			portal_mask_frontier(*mask, grid, layer, scope, &mut ws.seeds)
		}
		FieldTarget::Enemies(desc) => enemies_frontier(desc, grid, layer, scope, ctx, ws),
		FieldTarget::Entity(desc) => entity_frontier(desc, grid, layer, scope, ctx, ws),
	}
	trace!(
		"Resolved {} seeds for {:?} in chunk {:?}",
		ws.seeds.len(),
		target.kind(),
		scope.get_chunk()
	);
}

/// Whether a cell of the scope's chunk may be seeded
fn seedable(grid: &NavGrid, layer: NavLayer, scope: &FrontierScope, cell: FieldCell) -> bool {
	scope.ignore_block || grid.chunk(layer, scope.chunk).is_passable_for(cell, scope.enemies)
}

/// The target tile when it can be entered
fn tile_frontier(
	cell: FieldCell,
	grid: &NavGrid,
	layer: NavLayer,
	scope: &FrontierScope,
	out: &mut Vec<TileDesc>,
) {
	if seedable(grid, layer, scope, cell) {
		out.push(TileDesc::new(scope.chunk, cell));
	}
}

/// Tiles of the portal segment on the expected island that face a tile of
/// the next portal on its expected island.
///
/// An island id of [ISLAND_NONE] in the [PortalDesc] matches any island on
/// that side. Only impassable tiles carry [ISLAND_NONE] themselves and those
/// are never seeded, so a literal comparison would leave the field empty
fn portal_frontier(
	pd: &PortalDesc,
	grid: &NavGrid,
	layer: NavLayer,
	scope: &FrontierScope,
	out: &mut Vec<TileDesc>,
) {
	let res = grid.get_resolution();
	let port = pd.get_port();
	if port.get_chunk() != scope.chunk {
		panic!(
			"Portal of chunk {:?} cannot seed a field of chunk {:?}",
			port.get_chunk(),
			scope.chunk
		);
	}
	let next = pd.next();
	let (dr, dc) = port.crossing().offset();
	let here = grid.chunk(layer, scope.chunk);
	let there = grid.chunk(layer, next.get_chunk());
	for cell in port.cells() {
		if !seedable(grid, layer, scope, cell) {
			continue;
		}
		if pd.get_port_iid() != ISLAND_NONE && here.get_local_island(cell) != pd.get_port_iid() {
			continue;
		}
		let tile = TileDesc::new(scope.chunk, cell);
		let Some(across) = res.relative_desc(&tile, dr, dc) else {
			continue;
		};
		if across.get_chunk() != next.get_chunk() || !next.contains(across.get_cell()) {
			continue;
		}
		if pd.get_next_iid() != ISLAND_NONE
			&& there.get_local_island(across.get_cell()) != pd.get_next_iid()
		{
			continue;
		}
		out.push(tile);
	}
}

/// Enterable tiles of every portal of the chunk whose index bit is set in `mask`
fn portal_mask_frontier(
	mask: u64,
	grid: &NavGrid,
	layer: NavLayer,
	scope: &FrontierScope,
	out: &mut Vec<TileDesc>,
) {
	for port in masked_portals(mask, grid, layer, scope.chunk) {
		for cell in port.cells() {
			if seedable(grid, layer, scope, cell) {
				out.push(TileDesc::new(scope.chunk, cell));
			}
		}
	}
}

/// The portals of a chunk selected by the bits of `mask`
pub fn masked_portals(
	mask: u64,
	grid: &NavGrid,
	layer: NavLayer,
	chunk: ChunkCoord,
) -> impl Iterator<Item = &Portal> {
	grid.portals_of(layer, chunk)
		.iter()
		.take(64)
		.enumerate()
		.filter(move |(i, _)| mask & (1u64 << i) != 0)
		.map(|(_, p)| p)
}

/// Tiles occupied by living, visible enemies of a faction around the chunk
fn enemies_frontier(
	desc: &EnemiesDesc,
	grid: &NavGrid,
	layer: NavLayer,
	scope: &FrontierScope,
	ctx: &impl QueryContext,
	ws: &mut Workspace,
) {
	let res = grid.get_resolution();
	let bounds = res.chunk_bounds(desc.get_chunk());
	let pad = Vec2::new(res.get_tile_w() as f32, res.get_tile_h() as f32) * res.get_tile_size()
		/ 2.0 + Vec2::splat(SEARCH_BUFFER);
	ws.entities.clear();
	ctx.ents_in_rect(bounds.min - pad, bounds.max + pad, &mut ws.entities);
	ws.footprint.clear();
	for &ent in ws.entities.iter() {
		if ctx.is_enemy_entity(desc.get_faction_id(), ent) && !ctx.is_dying(ent) {
			rasterise(res, ctx, ent, &mut ws.footprint);
		}
	}
	emit_footprint(res, layer, scope.get_region(), ws);
}

/// Tiles occupied by a single entity
fn entity_frontier(
	desc: &EntityDesc,
	grid: &NavGrid,
	layer: NavLayer,
	scope: &FrontierScope,
	ctx: &impl QueryContext,
	ws: &mut Workspace,
) {
	let res = grid.get_resolution();
	ws.footprint.clear();
	if ctx.faction_id(desc.get_target()).is_some() {
		rasterise(res, ctx, desc.get_target(), &mut ws.footprint);
	} else {
		debug!("Entity {} is unknown, its field has no seeds", desc.get_target());
	}
	emit_footprint(res, layer, scope.get_region(), ws);
}

/// Append the tiles covered by an entity, buildings by their bounding box
/// and everything else by their selection circle
fn rasterise(res: &MapResolution, ctx: &impl QueryContext, ent: EntityId, out: &mut Vec<TileDesc>) {
	if ctx.flags(ent).contains(EntityFlags::BUILDING) {
		if let Some(obb) = ctx.obb(ent) {
			res.tiles_under_obb(&obb, out);
			return;
		}
	}
	res.tiles_under_circle(ctx.position(ent), ctx.selection_radius(ent), out);
}

/// Grow the footprint by the layer's contour rings and write the tiles that
/// fall inside `region` to the seed buffer in row-major order.
///
/// The footprint is marked on a window widened by the number of rings, tiles
/// further out than that can never grow into `region`
fn emit_footprint(res: &MapResolution, layer: NavLayer, region: &Region, ws: &mut Workspace) {
	let rings = layer.contour_rings();
	let window = region.grown(rings);
	ws.marks.clear();
	ws.marks.resize(window.len(), false);
	for tile in ws.footprint.iter() {
		if let Some(i) = window.index_of(res.abs_of(tile)) {
			ws.marks[i] = true;
		}
	}
	for _ in 0..rings {
		grow_ring(res, &window, &mut ws.marks, &mut ws.ring);
	}
	for (i, marked) in ws.marks.iter().enumerate() {
		if !*marked {
			continue;
		}
		let abs = window.abs_of_index(i);
		if !region.contains(abs) {
			continue;
		}
		if let Some(tile) = res.desc_of_abs(abs) {
			ws.seeds.push(tile);
		}
	}
}

/// Mark every tile of `window` that lies on the map and touches a marked
/// tile (8-connected). `ring` collects the newly marked indices
pub fn grow_ring(res: &MapResolution, window: &Region, marks: &mut [bool], ring: &mut Vec<usize>) {
	ring.clear();
	for (i, marked) in marks.iter().enumerate() {
		if *marked {
			continue;
		}
		let (r, c) = window.abs_of_index(i);
		if res.desc_of_abs((r, c)).is_none() {
			continue;
		}
		let touches = (-1..=1).any(|dr| {
			(-1..=1).any(|dc| {
				window
					.index_of((r + dr, c + dc))
					.is_some_and(|j| marks[j])
			})
		});
		if touches {
			ring.push(i);
		}
	}
	for i in ring.iter() {
		marks[*i] = true;
	}
}
