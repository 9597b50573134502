//! Dimensions of the map and conversions between tile descriptors, absolute
//! tile coordinates and world space
//!


use crate::prelude::*;
use bevy::prelude::*;

/// Largest number of tiles along either side of a chunk, cell coordinates
/// are packed into 6 bits of a [FieldId]
pub const MAX_TILES_PER_CHUNK_SIDE: usize = 64;
/// Largest number of chunks along either side of the map, chunk coordinates
/// are packed into 8 bits of a [FieldId]
pub const MAX_CHUNKS_PER_MAP_SIDE: usize = 256;

/// How the map is divided into chunks and tiles, and where it sits in the world
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Debug, Reflect)]
pub struct MapResolution {
	/// Number of chunk columns
	chunk_w: usize,
	/// Number of chunk rows
	chunk_h: usize,
	/// Number of tile columns in each chunk
	tile_w: usize,
	/// Number of tile rows in each chunk
	tile_h: usize,
	/// World units spanned by the edge of a tile
	tile_size: f32,
	/// World `x-z` position of the top-left corner of the map
	origin: Vec2,
}

impl MapResolution {
	/// Create a new instance of [MapResolution] with unit sized tiles whose
	/// top-left corner sits at the world origin
	pub fn new(chunk_w: usize, chunk_h: usize, tile_w: usize, tile_h: usize) -> Self {
		if chunk_w == 0 || chunk_h == 0 || tile_w == 0 || tile_h == 0 {
			panic!(
				"Map resolution of `{}x{}` chunks of `{}x{}` tiles cannot contain a zero dimension",
				chunk_w, chunk_h, tile_w, tile_h
			);
		}
		if tile_w > MAX_TILES_PER_CHUNK_SIDE || tile_h > MAX_TILES_PER_CHUNK_SIDE {
			panic!(
				"Chunks of `{}x{}` tiles are too large, at most {} tiles per side are supported",
				tile_w, tile_h, MAX_TILES_PER_CHUNK_SIDE
			);
		}
		if chunk_w > MAX_CHUNKS_PER_MAP_SIDE || chunk_h > MAX_CHUNKS_PER_MAP_SIDE {
			panic!(
				"Map of `{}x{}` chunks is too large, at most {} chunks per side are supported",
				chunk_w, chunk_h, MAX_CHUNKS_PER_MAP_SIDE
			);
		}
		MapResolution {
			chunk_w,
			chunk_h,
			tile_w,
			tile_h,
			tile_size: 1.0,
			origin: Vec2::ZERO,
		}
	}
	/// Set the world size of a tile edge
	pub fn with_tile_size(mut self, tile_size: f32) -> Self {
		if tile_size <= 0.0 {
			panic!("Tile size must be positive, found {}", tile_size);
		}
		self.tile_size = tile_size;
		self
	}
	/// Set the world position of the top-left corner of the map
	pub fn with_origin(mut self, origin: Vec2) -> Self {
		self.origin = origin;
		self
	}
	/// Number of chunk columns
	pub fn get_chunk_w(&self) -> usize {
		self.chunk_w
	}
	/// Number of chunk rows
	pub fn get_chunk_h(&self) -> usize {
		self.chunk_h
	}
	/// Number of tile columns per chunk
	pub fn get_tile_w(&self) -> usize {
		self.tile_w
	}
	/// Number of tile rows per chunk
	pub fn get_tile_h(&self) -> usize {
		self.tile_h
	}
	/// World size of a tile edge
	pub fn get_tile_size(&self) -> f32 {
		self.tile_size
	}
	/// World position of the top-left corner of the map
	pub fn get_origin(&self) -> Vec2 {
		self.origin
	}
	/// Total number of tile rows across the map
	pub fn map_rows(&self) -> usize {
		self.chunk_h * self.tile_h
	}
	/// Total number of tile columns across the map
	pub fn map_columns(&self) -> usize {
		self.chunk_w * self.tile_w
	}
	/// Number of chunks in the map
	pub fn chunk_count(&self) -> usize {
		self.chunk_w * self.chunk_h
	}
	/// Whether the chunk exists in the map
	pub fn contains_chunk(&self, chunk: ChunkCoord) -> bool {
		chunk.get_row() < self.chunk_h && chunk.get_column() < self.chunk_w
	}
	/// Row-major index of a chunk
	pub fn chunk_index(&self, chunk: ChunkCoord) -> usize {
		if !self.contains_chunk(chunk) {
			panic!(
				"Chunk {:?} is outside of a map of {} rows and {} columns of chunks",
				chunk, self.chunk_h, self.chunk_w
			);
		}
		chunk.get_row() * self.chunk_w + chunk.get_column()
	}
	/// Chunk of a row-major index
	pub fn chunk_of_index(&self, index: usize) -> ChunkCoord {
		if index >= self.chunk_count() {
			panic!("Chunk index {} is outside of the map", index);
		}
		ChunkCoord::new(index / self.chunk_w, index % self.chunk_w)
	}
	/// Whether the cell exists within a chunk
	pub fn contains_cell(&self, cell: FieldCell) -> bool {
		cell.get_row() < self.tile_h && cell.get_column() < self.tile_w
	}
	/// Absolute `(row, column)` of a tile across the whole map
	pub fn abs_of(&self, desc: &TileDesc) -> (isize, isize) {
		let chunk = desc.get_chunk();
		let cell = desc.get_cell();
		(
			(chunk.get_row() * self.tile_h + cell.get_row()) as isize,
			(chunk.get_column() * self.tile_w + cell.get_column()) as isize,
		)
	}
	/// The tile at an absolute coordinate, `None` if it lies off the map
	pub fn desc_of_abs(&self, abs: (isize, isize)) -> Option<TileDesc> {
		if abs.0 < 0 || abs.1 < 0 {
			return None;
		}
		let (r, c) = (abs.0 as usize, abs.1 as usize);
		if r >= self.map_rows() || c >= self.map_columns() {
			return None;
		}
		Some(TileDesc::from_parts(
			r / self.tile_h,
			c / self.tile_w,
			r % self.tile_h,
			c % self.tile_w,
		))
	}
	/// Signed `(rows, columns)` that must be travelled to get from `a` to `b`
	pub fn tile_distance(&self, a: &TileDesc, b: &TileDesc) -> (isize, isize) {
		let a = self.abs_of(a);
		let b = self.abs_of(b);
		(b.0 - a.0, b.1 - a.1)
	}
	/// The tile `dr` rows and `dc` columns away from `desc`, `None` if it lies off the map
	pub fn relative_desc(&self, desc: &TileDesc, dr: isize, dc: isize) -> Option<TileDesc> {
		let abs = self.abs_of(desc);
		self.desc_of_abs((abs.0 + dr, abs.1 + dc))
	}
	/// A [Region] covering exactly one chunk
	pub fn chunk_region(&self, chunk: ChunkCoord) -> Region {
		let base = self.abs_of(&TileDesc::new(chunk, FieldCell::new(0, 0)));
		Region::new(base, self.tile_h, self.tile_w)
	}
	/// World space `x-z` bounds of a tile
	pub fn tile_bounds(&self, desc: &TileDesc) -> Rect {
		let (r, c) = self.abs_of(desc);
		let min = self.origin + Vec2::new(c as f32, r as f32) * self.tile_size;
		Rect::from_corners(min, min + Vec2::splat(self.tile_size))
	}
	/// World space `x-z` bounds of a chunk
	pub fn chunk_bounds(&self, chunk: ChunkCoord) -> Rect {
		let min = self.origin
			+ Vec2::new(
				(chunk.get_column() * self.tile_w) as f32,
				(chunk.get_row() * self.tile_h) as f32,
			) * self.tile_size;
		let size = Vec2::new(self.tile_w as f32, self.tile_h as f32) * self.tile_size;
		Rect::from_corners(min, min + size)
	}
	/// World space centre of a tile
	pub fn tile_center(&self, desc: &TileDesc) -> Vec2 {
		self.tile_bounds(desc).center()
	}
	/// Absolute coordinate of the tile containing a world position, which
	/// may be off the map
	fn abs_for_point(&self, point: Vec2) -> (isize, isize) {
		let local = (point - self.origin) / self.tile_size;
		(local.y.floor() as isize, local.x.floor() as isize)
	}
	/// The tile containing a world position, `None` if it lies off the map
	pub fn desc_for_point(&self, point: Vec2) -> Option<TileDesc> {
		self.desc_of_abs(self.abs_for_point(point))
	}
	/// Absolute row and column ranges of tiles overlapping a world rectangle,
	/// clamped to the map
	fn abs_range_for_rect(&self, min: Vec2, max: Vec2) -> Option<((isize, isize), (isize, isize))> {
		let lo = self.abs_for_point(min);
		let hi = self.abs_for_point(max);
		let r0 = lo.0.max(0);
		let c0 = lo.1.max(0);
		let r1 = hi.0.min(self.map_rows() as isize - 1);
		let c1 = hi.1.min(self.map_columns() as isize - 1);
		if r0 > r1 || c0 > c1 {
			None
		} else {
			Some(((r0, r1), (c0, c1)))
		}
	}
	/// Append every tile overlapped by a circle in world space to `out`
	pub fn tiles_under_circle(&self, center: Vec2, radius: f32, out: &mut Vec<TileDesc>) {
		let reach = Vec2::splat(radius.max(0.0));
		let Some(((r0, r1), (c0, c1))) = self.abs_range_for_rect(center - reach, center + reach)
		else {
			return;
		};
		for r in r0..=r1 {
			for c in c0..=c1 {
				if let Some(desc) = self.desc_of_abs((r, c)) {
					let bounds = self.tile_bounds(&desc);
					let closest = center.clamp(bounds.min, bounds.max);
					if closest.distance_squared(center) <= radius * radius {
						out.push(desc);
					}
				}
			}
		}
	}
	/// Append every tile overlapped by an oriented bounding box in world space to `out`
	pub fn tiles_under_obb(&self, obb: &Obb, out: &mut Vec<TileDesc>) {
		let corners = obb.corners();
		let mut min = corners[0];
		let mut max = corners[0];
		for corner in corners.iter().skip(1) {
			min = min.min(*corner);
			max = max.max(*corner);
		}
		let Some(((r0, r1), (c0, c1))) = self.abs_range_for_rect(min, max) else {
			return;
		};
		for r in r0..=r1 {
			for c in c0..=c1 {
				if let Some(desc) = self.desc_of_abs((r, c)) {
					if obb.overlaps_rect(&self.tile_bounds(&desc)) {
						out.push(desc);
					}
				}
			}
		}
	}
}
