//! Defines the components an entity needs for the [FlowFieldNavPlugin] to
//! generate fields for it
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The navigation grid of a map, the world state field targets are resolved
/// against and the cache of generated fields
#[derive(Bundle)]
pub struct NavigationBundle {
	grid: NavGridSnapshot,
	world: WorldSnapshot,
	cache: FieldCache,
}

impl NavigationBundle {
	/// Create a new instance of [NavigationBundle] from a prepared [NavGrid]
	pub fn new(grid: NavGrid) -> Self {
		NavigationBundle {
			grid: NavGridSnapshot::new(grid),
			world: WorldSnapshot::default(),
			cache: FieldCache::default(),
		}
	}
	/// Create a new instance of [NavigationBundle] with an initial [WorldSnapshot]
	pub fn with_world(grid: NavGrid, world: WorldSnapshot) -> Self {
		NavigationBundle {
			grid: NavGridSnapshot::new(grid),
			world,
			cache: FieldCache::default(),
		}
	}
	/// Create a new instance of [NavigationBundle] where the [NavGrid] is read
	/// from a `ron` file
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> Result<Self, NavError> {
		Ok(NavigationBundle::new(NavGrid::from_ron(path)?))
	}
	pub fn get_grid(&self) -> &NavGrid {
		self.grid.get()
	}
}
