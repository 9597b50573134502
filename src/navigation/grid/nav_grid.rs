//! The [NavGrid] is the read-only snapshot of navigation data every field
//! builder works from. It holds a [NavChunk] for every chunk of the map on
//! every [NavLayer].
//!
//! Builders only ever borrow it immutably so a single snapshot can be
//! shared across worker threads while fields are generated, updates are
//! applied to a fresh copy between generations.
//!

use crate::prelude::*;

/// Navigation data of the whole map on every layer
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NavGrid {
	/// Dimensions of the map
	resolution: MapResolution,
	/// Chunks of each layer in row-major order, indexed by [NavLayer::index]
	layers: Vec<Vec<NavChunk>>,
}

impl NavGrid {
	/// Create a new instance of [NavGrid] where every tile of every layer is open ground of cost `1`
	pub fn new(resolution: MapResolution) -> Self {
		let chunk = NavChunk::new(resolution.get_tile_h(), resolution.get_tile_w());
		let layers = NavLayer::ALL
			.iter()
			.map(|_| vec![chunk.clone(); resolution.chunk_count()])
			.collect();
		NavGrid { resolution, layers }
	}
	/// Dimensions of the map
	pub fn get_resolution(&self) -> &MapResolution {
		&self.resolution
	}
	/// The data of a chunk on a layer
	pub fn chunk(&self, layer: NavLayer, chunk: ChunkCoord) -> &NavChunk {
		&self.layers[layer.index()][self.resolution.chunk_index(chunk)]
	}
	/// Mutable access to the data of a chunk on a layer
	pub fn chunk_mut(&mut self, layer: NavLayer, chunk: ChunkCoord) -> &mut NavChunk {
		let i = self.resolution.chunk_index(chunk);
		&mut self.layers[layer.index()][i]
	}
	/// Cost of stepping onto a tile
	pub fn cost(&self, layer: NavLayer, tile: &TileDesc) -> u8 {
		self.chunk(layer, tile.get_chunk()).get_cost(tile.get_cell())
	}
	/// Number of blocking entities on a tile
	pub fn blocker_count(&self, layer: NavLayer, tile: &TileDesc) -> u16 {
		self.chunk(layer, tile.get_chunk())
			.get_blockers(tile.get_cell())
	}
	/// Bitmask of the factions with blockers on a tile
	pub fn factions_present(&self, layer: NavLayer, tile: &TileDesc) -> u16 {
		self.chunk(layer, tile.get_chunk())
			.get_factions(tile.get_cell())
	}
	/// Map-wide island id of a tile
	pub fn global_island_id(&self, layer: NavLayer, tile: &TileDesc) -> u16 {
		self.chunk(layer, tile.get_chunk()).get_island(tile.get_cell())
	}
	/// Chunk-local island id of a tile
	pub fn local_island_id(&self, layer: NavLayer, tile: &TileDesc) -> u16 {
		self.chunk(layer, tile.get_chunk())
			.get_local_island(tile.get_cell())
	}
	/// Portals along the edges of a chunk
	pub fn portals_of(&self, layer: NavLayer, chunk: ChunkCoord) -> &[Portal] {
		self.chunk(layer, chunk).get_portals()
	}
	/// Whether a tile can be entered, ignoring factions
	pub fn is_passable(&self, layer: NavLayer, tile: &TileDesc) -> bool {
		self.chunk(layer, tile.get_chunk())
			.is_passable(tile.get_cell())
	}
	/// Whether a tile can be entered by a faction whose enemies are `enemies`,
	/// see [NavChunk::is_passable_for]
	pub fn is_passable_for(&self, layer: NavLayer, tile: &TileDesc, enemies: u16) -> bool {
		self.chunk(layer, tile.get_chunk())
			.is_passable_for(tile.get_cell(), enemies)
	}
	/// Set the cost of a tile
	pub fn set_cost(&mut self, layer: NavLayer, tile: &TileDesc, cost: u8) {
		self.chunk_mut(layer, tile.get_chunk())
			.set_cost(tile.get_cell(), cost);
	}
	/// Set the number of blockers and the factions they belong to on a tile
	pub fn set_blockers(&mut self, layer: NavLayer, tile: &TileDesc, blockers: u16, factions: u16) {
		let chunk = self.chunk_mut(layer, tile.get_chunk());
		chunk.set_blockers(tile.get_cell(), blockers);
		chunk.set_factions(tile.get_cell(), factions);
	}
	/// Set the global and local island ids of a tile
	pub fn set_islands(&mut self, layer: NavLayer, tile: &TileDesc, island: u16, local_island: u16) {
		self.chunk_mut(layer, tile.get_chunk())
			.set_islands(tile.get_cell(), island, local_island);
	}
	/// Register a portal with its own chunk and its connected side with the neighbouring chunk
	pub fn connect_portal(&mut self, layer: NavLayer, portal: Portal) {
		self.chunk_mut(layer, portal.get_chunk()).add_portal(portal);
		let connected = portal.connected();
		self.chunk_mut(layer, connected.get_chunk())
			.add_portal(connected);
	}
	/// Ensure deserialised data matches the map resolution
	#[cfg(feature = "ron")]
	fn validate(&self) -> Result<(), NavError> {
		if self.layers.len() != NavLayer::ALL.len() {
			return Err(NavError::Dimensions {
				what: "layers",
				expected: NavLayer::ALL.len(),
				found: self.layers.len(),
			});
		}
		for layer in self.layers.iter() {
			if layer.len() != self.resolution.chunk_count() {
				return Err(NavError::Dimensions {
					what: "chunks",
					expected: self.resolution.chunk_count(),
					found: layer.len(),
				});
			}
			for chunk in layer.iter() {
				if chunk.get_rows() != self.resolution.get_tile_h() {
					return Err(NavError::Dimensions {
						what: "tile rows per chunk",
						expected: self.resolution.get_tile_h(),
						found: chunk.get_rows(),
					});
				}
				if chunk.get_columns() != self.resolution.get_tile_w() {
					return Err(NavError::Dimensions {
						what: "tile columns per chunk",
						expected: self.resolution.get_tile_w(),
						found: chunk.get_columns(),
					});
				}
			}
		}
		Ok(())
	}
	/// From a `ron` file generate the [NavGrid]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> Result<Self, NavError> {
		let file = std::fs::File::open(path)?;
		let grid: NavGrid = ron::de::from_reader(file)?;
		grid.validate()?;
		Ok(grid)
	}
	/// From a `ron` string generate the [NavGrid]
	#[cfg(feature = "ron")]
	pub fn from_ron_str(data: &str) -> Result<Self, NavError> {
		let grid: NavGrid = ron::de::from_str(data)?;
		grid.validate()?;
		Ok(grid)
	}
	/// Overwrite the costs of one layer from a CSV file describing the whole
	/// map, one record per tile row and one value per tile column
	#[cfg(feature = "csv")]
	pub fn costs_from_csv(
		&mut self,
		layer: NavLayer,
		path: impl AsRef<std::path::Path>,
	) -> Result<(), NavError> {
		let file = std::fs::File::open(path)?;
		let mut rdr = csv::ReaderBuilder::new()
			.has_headers(false)
			.from_reader(file);
		let mut rows = 0;
		for (row, record) in rdr.records().enumerate() {
			let record = record?;
			if record.len() != self.resolution.map_columns() {
				return Err(NavError::Dimensions {
					what: "tile columns",
					expected: self.resolution.map_columns(),
					found: record.len(),
				});
			}
			if row >= self.resolution.map_rows() {
				return Err(NavError::Dimensions {
					what: "tile rows",
					expected: self.resolution.map_rows(),
					found: row + 1,
				});
			}
			for (column, value) in record.iter().enumerate() {
				let cost: u8 = value.trim().parse().map_err(|_| NavError::InvalidCost {
					value: value.to_string(),
					row,
					column,
				})?;
				if let Some(tile) = self
					.resolution
					.desc_of_abs((row as isize, column as isize))
				{
					self.set_cost(layer, &tile, cost);
				}
			}
			rows += 1;
		}
		if rows != self.resolution.map_rows() {
			return Err(NavError::Dimensions {
				what: "tile rows",
				expected: self.resolution.map_rows(),
				found: rows,
			});
		}
		Ok(())
	}
}
