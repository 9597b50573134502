//! Addressing of the tiles that make up the navigation grid.
//!
//! The map is split into `chunk_h` rows by `chunk_w` columns of chunks and
//! each chunk is made up of `tile_h` rows by `tile_w` columns of tiles. A tile
//! is addressed by a [TileDesc], the chunk it belongs to plus its [FieldCell]
//! within that chunk. Everything is indexed from the top-left corner of the
//! map, rows grow along world `z` and columns grow along world `x`.
//!
//! ```text
//!   chunk (0,0)        chunk (0,1)
//!  _______________    _______________
//! |__|__|__|__|__|   |__|__|__|__|__|
//! |__|__|__|__|__|   |__|__|__|__|__|
//! |__|__|__|__|__|   |__|__|__|__|__|
//!
//! tile (0,1) of chunk (0,1) has the absolute coordinate (0, tile_w + 1)
//! ```
//!

pub mod map_resolution;
pub mod nav_chunk;
pub mod nav_grid;
pub mod portals;

use crate::prelude::*;
use bevy::prelude::*;

/// ID of a chunk within the map, `(row, column)`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct ChunkCoord((usize, usize));

impl ChunkCoord {
	/// Create a new instance of [ChunkCoord]
	pub fn new(row: usize, column: usize) -> Self {
		ChunkCoord((row, column))
	}
	/// Get the chunk row
	pub fn get_row(&self) -> usize {
		self.0 .0
	}
	/// Get the chunk column
	pub fn get_column(&self) -> usize {
		self.0 .1
	}
	/// The cardinal [Ordinal] pointing from this chunk to an adjacent one,
	/// panics if `other` doesn't share an edge with `self`
	pub fn ordinal_to(&self, other: &ChunkCoord) -> Ordinal {
		let up = other.get_row() < self.get_row();
		let down = other.get_row() > self.get_row();
		let left = other.get_column() < self.get_column();
		let right = other.get_column() > self.get_column();
		match (up, down, left, right) {
			(true, false, false, false) => Ordinal::North,
			(false, true, false, false) => Ordinal::South,
			(false, false, true, false) => Ordinal::West,
			(false, false, false, true) => Ordinal::East,
			_ => panic!("Chunks {:?} and {:?} are not orthogonally adjacent", self, other),
		}
	}
}

/// ID of a cell within a chunk or a field, `(row, column)`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct FieldCell((usize, usize));

impl FieldCell {
	/// Create a new instance of [FieldCell]
	pub fn new(row: usize, column: usize) -> Self {
		FieldCell((row, column))
	}
	/// Get the cell row
	pub fn get_row(&self) -> usize {
		self.0 .0
	}
	/// Get the cell column
	pub fn get_column(&self) -> usize {
		self.0 .1
	}
	/// The `(row, column)` as signed values for distance calculations
	pub fn as_signed(&self) -> (isize, isize) {
		(self.get_row() as isize, self.get_column() as isize)
	}
}

/// Fully qualified tile, the chunk and the cell inside that chunk
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct TileDesc {
	/// Chunk containing the tile
	chunk: ChunkCoord,
	/// Position of the tile within the chunk
	cell: FieldCell,
}

impl TileDesc {
	/// Create a new instance of [TileDesc]
	pub fn new(chunk: ChunkCoord, cell: FieldCell) -> Self {
		TileDesc { chunk, cell }
	}
	/// Create a [TileDesc] from raw chunk and tile coordinates
	pub fn from_parts(chunk_row: usize, chunk_column: usize, row: usize, column: usize) -> Self {
		TileDesc {
			chunk: ChunkCoord::new(chunk_row, chunk_column),
			cell: FieldCell::new(row, column),
		}
	}
	/// Get the chunk of the tile
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
	/// Get the cell of the tile within its chunk
	pub fn get_cell(&self) -> FieldCell {
		self.cell
	}
}

/// A rectangular window of tiles which may straddle chunk boundaries and may
/// start outside of the map (its base is an absolute, signed, coordinate)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Region {
	/// Absolute `(row, column)` of the top-left tile of the window
	base: (isize, isize),
	/// Number of rows in the window
	rows: usize,
	/// Number of columns in the window
	columns: usize,
}

impl Region {
	/// Create a new instance of [Region]
	pub fn new(base: (isize, isize), rows: usize, columns: usize) -> Self {
		Region {
			base,
			rows,
			columns,
		}
	}
	/// Get the absolute base coordinate
	pub fn get_base(&self) -> (isize, isize) {
		self.base
	}
	/// Get the number of rows
	pub fn get_rows(&self) -> usize {
		self.rows
	}
	/// Get the number of columns
	pub fn get_columns(&self) -> usize {
		self.columns
	}
	/// Number of tiles in the window
	pub fn len(&self) -> usize {
		self.rows * self.columns
	}
	/// Whether the window holds no tiles
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
	/// `(row, column)` of an absolute coordinate relative to the base, `None` when outside
	pub fn local_of(&self, abs: (isize, isize)) -> Option<(usize, usize)> {
		let dr = abs.0 - self.base.0;
		let dc = abs.1 - self.base.1;
		if dr < 0 || dc < 0 || dr as usize >= self.rows || dc as usize >= self.columns {
			None
		} else {
			Some((dr as usize, dc as usize))
		}
	}
	/// Flat row-major index of an absolute coordinate, `None` when outside
	pub fn index_of(&self, abs: (isize, isize)) -> Option<usize> {
		self.local_of(abs).map(|(r, c)| r * self.columns + c)
	}
	/// Absolute coordinate of a flat row-major index
	pub fn abs_of_index(&self, index: usize) -> (isize, isize) {
		if index >= self.len() {
			panic!(
				"Index {} is outside of a region of {} rows and {} columns",
				index, self.rows, self.columns
			);
		}
		(
			self.base.0 + (index / self.columns) as isize,
			self.base.1 + (index % self.columns) as isize,
		)
	}
	/// Whether the absolute coordinate lies inside the window
	pub fn contains(&self, abs: (isize, isize)) -> bool {
		self.local_of(abs).is_some()
	}
	/// The window widened by `by` tiles on every side
	pub fn grown(&self, by: usize) -> Region {
		Region::new(
			(self.base.0 - by as isize, self.base.1 - by as isize),
			self.rows + 2 * by,
			self.columns + 2 * by,
		)
	}
}

/// The layers of navigation data, each has its own copy of every chunk
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub enum NavLayer {
	/// Ground units occupying a single tile
	#[default]
	Ground1x1,
	/// Ground units occupying a 3x3 block of tiles
	Ground3x3,
	/// Ground units occupying a 5x5 block of tiles
	Ground5x5,
	/// Ground units occupying a 7x7 block of tiles
	Ground7x7,
	/// Naval units
	Water,
	/// Flying units
	Air,
}

impl NavLayer {
	/// Every layer in index order
	pub const ALL: [NavLayer; 6] = [
		NavLayer::Ground1x1,
		NavLayer::Ground3x3,
		NavLayer::Ground5x5,
		NavLayer::Ground7x7,
		NavLayer::Water,
		NavLayer::Air,
	];
	/// Position of the layer in [NavLayer::ALL]
	pub fn index(self) -> usize {
		self as usize
	}
	/// Layer from its index, panics when out of range
	pub fn from_index(index: usize) -> Self {
		match NavLayer::ALL.get(index) {
			Some(layer) => *layer,
			None => panic!("No navigation layer has index {}", index),
		}
	}
	/// Most contour rings any layer grows a footprint by
	pub const MAX_CONTOUR_RINGS: usize = 3;
	/// How many contour rings an entity footprint is grown by on this layer
	pub fn contour_rings(self) -> usize {
		match self {
			NavLayer::Ground1x1 => 0,
			NavLayer::Ground3x3 => 1,
			NavLayer::Ground5x5 => 2,
			NavLayer::Ground7x7 => 3,
			NavLayer::Water | NavLayer::Air => 0,
		}
	}
}
