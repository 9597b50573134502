//! What a field guides agents towards and the identity used to cache it.
//!
//! A [FieldId] packs the layer, the kind of target, the target payload and
//! the chunk into a `u64`:
//!
//! ```text
//!  63   60 59   56 55                              16 15     8 7      0
//! | layer | kind  |          target payload          | chunk r | chunk c |
//! ```
//!
//! | kind       | payload                                                          |
//! |------------|------------------------------------------------------------------|
//! | Portal     | next iid (4 bits @48), port iid (4 @40), endpoints r/c (6 each @34/28/22/16) |
//! | Tile       | row @24, column @16                                              |
//! | Enemies    | faction @24                                                      |
//! | Entity     | entity id @24 (low 32 bits)                                      |
//! | PortalMask | low 40 bits of the mask @16                                      |
//!

use crate::prelude::*;

/// Nearest living enemy of a faction around a chunk
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct EnemiesDesc {
	/// Faction whose enemies are sought
	faction_id: usize,
	/// Chunk the search is centred on
	chunk: ChunkCoord,
}

impl EnemiesDesc {
	/// Create a new instance of [EnemiesDesc]
	pub fn new(faction_id: usize, chunk: ChunkCoord) -> Self {
		EnemiesDesc { faction_id, chunk }
	}
	/// Faction whose enemies are sought
	pub fn get_faction_id(&self) -> usize {
		self.faction_id
	}
	/// Chunk the search is centred on
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
}

/// The tiles occupied by a single entity
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct EntityDesc {
	/// The entity to move towards
	target: EntityId,
}

impl EntityDesc {
	/// Create a new instance of [EntityDesc]
	pub fn new(target: EntityId) -> Self {
		EntityDesc { target }
	}
	/// The entity to move towards
	pub fn get_target(&self) -> EntityId {
		self.target
	}
}

/// What a field guides agents towards
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum FieldTarget {
	/// A single tile of the chunk
	Tile(FieldCell),
	/// A portal leading towards the next chunk of a route
	Portal(PortalDesc),
	/// Any of the chunk's portals whose index bit is set
	PortalMask(u64),
	/// The nearest enemy of a faction
	Enemies(EnemiesDesc),
	/// A specific entity
	Entity(EntityDesc),
}

impl FieldTarget {
	/// The kind of the target, stored in bits 56..59 of a [FieldId]
	pub fn kind(&self) -> FieldTargetKind {
		match self {
			FieldTarget::Portal(_) => FieldTargetKind::Portal,
			FieldTarget::Tile(_) => FieldTargetKind::Tile,
			FieldTarget::Enemies(_) => FieldTargetKind::Enemies,
			FieldTarget::PortalMask(_) => FieldTargetKind::PortalMask,
			FieldTarget::Entity(_) => FieldTargetKind::Entity,
		}
	}
}

/// Discriminant of a [FieldTarget]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum FieldTargetKind {
	Portal = 0,
	Tile = 1,
	Enemies = 2,
	PortalMask = 3,
	Entity = 4,
}

impl FieldTargetKind {
	/// Decode the kind from its 4 bit code
	pub fn from_bits(bits: u64) -> Self {
		match bits {
			0 => FieldTargetKind::Portal,
			1 => FieldTargetKind::Tile,
			2 => FieldTargetKind::Enemies,
			3 => FieldTargetKind::PortalMask,
			4 => FieldTargetKind::Entity,
			_ => panic!("Target kind code {} is not valid", bits),
		}
	}
}

/// Cache key of a field, derived from the layer, target and chunk
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct FieldId(u64);

impl FieldId {
	/// Create the [FieldId] of a field for `target` in `chunk` on `layer`
	pub fn new(chunk: ChunkCoord, target: &FieldTarget, layer: NavLayer) -> Self {
		let payload = match target {
			FieldTarget::Portal(pd) => {
				let [a, b] = pd.get_port().get_endpoints();
				((pd.get_next_iid() as u64 & 0xf) << 48)
					| ((pd.get_port_iid() as u64 & 0xf) << 40)
					| ((a.get_row() as u64 & 0x3f) << 34)
					| ((a.get_column() as u64 & 0x3f) << 28)
					| ((b.get_row() as u64 & 0x3f) << 22)
					| ((b.get_column() as u64 & 0x3f) << 16)
			}
			FieldTarget::Tile(cell) => {
				((cell.get_row() as u64 & 0xff) << 24) | ((cell.get_column() as u64 & 0xff) << 16)
			}
			FieldTarget::Enemies(enemies) => (enemies.get_faction_id() as u64 & 0xffff_ffff) << 24,
			FieldTarget::Entity(ent) => (ent.get_target() as u64) << 24,
			FieldTarget::PortalMask(mask) => (mask & 0xff_ffff_ffff) << 16,
		};
		FieldId(
			((layer.index() as u64) << 60)
				| ((target.kind() as u64) << 56)
				| (payload & 0x00ff_ffff_ffff_0000)
				| ((chunk.get_row() as u64 & 0xff) << 8)
				| (chunk.get_column() as u64 & 0xff),
		)
	}
	/// The raw id
	pub fn get(&self) -> u64 {
		self.0
	}
	/// Layer the field was built on
	pub fn layer(&self) -> NavLayer {
		NavLayer::from_index((self.0 >> 60) as usize)
	}
	/// Kind of target the field guides towards
	pub fn target_kind(&self) -> FieldTargetKind {
		FieldTargetKind::from_bits((self.0 >> 56) & 0xf)
	}
	/// Chunk the field covers
	pub fn chunk(&self) -> ChunkCoord {
		ChunkCoord::new(((self.0 >> 8) & 0xff) as usize, (self.0 & 0xff) as usize)
	}
}
