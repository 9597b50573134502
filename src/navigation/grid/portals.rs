//! A [Portal] is a pathable window along the shared edge of two adjacent
//! chunks. Each side of the window is stored in its own chunk, the
//! `connected_*` fields describe the far side.
//!
//! ```text
//!  chunk (0,0)        chunk (0,1)
//!  ___________        ___________
//! |__|__|__|_P|  <->  |Q_|__|__|__|
//! |__|__|__|_P|  <->  |Q_|__|__|__|
//! |__|__|__|__|       |__|__|__|__|
//! ```
//!
//! `P` is the portal segment of chunk `(0,0)` and `Q` is its connected portal.
//!

use crate::prelude::*;

/// One side of a window between two adjacent chunks
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Portal {
	/// Chunk owning this side of the portal
	chunk: ChunkCoord,
	/// Inclusive first and last cell of the segment, along one row or column
	endpoints: [FieldCell; 2],
	/// Chunk on the other side of the boundary
	connected_chunk: ChunkCoord,
	/// Segment on the other side of the boundary
	connected_endpoints: [FieldCell; 2],
}

impl Portal {
	/// Create a new instance of [Portal], endpoints are sorted so the first
	/// is the top-left most cell. Panics if a segment is not straight
	pub fn new(
		chunk: ChunkCoord,
		endpoints: [FieldCell; 2],
		connected_chunk: ChunkCoord,
		connected_endpoints: [FieldCell; 2],
	) -> Self {
		// validates adjacency
		chunk.ordinal_to(&connected_chunk);
		Portal {
			chunk,
			endpoints: sorted_segment(endpoints),
			connected_chunk,
			connected_endpoints: sorted_segment(connected_endpoints),
		}
	}
	/// Chunk owning this side
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
	/// First and last cell of this side's segment
	pub fn get_endpoints(&self) -> [FieldCell; 2] {
		self.endpoints
	}
	/// Chunk on the far side
	pub fn get_connected_chunk(&self) -> ChunkCoord {
		self.connected_chunk
	}
	/// The portal as seen from the far side
	pub fn connected(&self) -> Portal {
		Portal {
			chunk: self.connected_chunk,
			endpoints: self.connected_endpoints,
			connected_chunk: self.chunk,
			connected_endpoints: self.endpoints,
		}
	}
	/// Direction to step to cross the boundary into the connected chunk
	pub fn crossing(&self) -> Ordinal {
		self.chunk.ordinal_to(&self.connected_chunk)
	}
	/// Every cell of this side's segment, from the first endpoint to the last
	pub fn cells(&self) -> impl Iterator<Item = FieldCell> + '_ {
		let [a, b] = self.endpoints;
		(a.get_row()..=b.get_row()).flat_map(move |r| {
			(a.get_column()..=b.get_column()).map(move |c| FieldCell::new(r, c))
		})
	}
	/// Whether a cell lies on this side's segment
	pub fn contains(&self, cell: FieldCell) -> bool {
		let [a, b] = self.endpoints;
		(a.get_row()..=b.get_row()).contains(&cell.get_row())
			&& (a.get_column()..=b.get_column()).contains(&cell.get_column())
	}
}

/// Order the endpoints of a segment and ensure it lies along a single row or column
fn sorted_segment(endpoints: [FieldCell; 2]) -> [FieldCell; 2] {
	let [a, b] = endpoints;
	if a.get_row() != b.get_row() && a.get_column() != b.get_column() {
		panic!("Portal endpoints {:?} and {:?} are not on a straight edge", a, b);
	}
	if a <= b {
		[a, b]
	} else {
		[b, a]
	}
}

/// A portal target, the island ids expected either side of the boundary
/// restrict seeding to tiles on the intended route
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct PortalDesc {
	/// Portal within the chunk being built
	port: Portal,
	/// Local island id expected on this side, [ISLAND_NONE] matches any
	port_iid: u16,
	/// Local island id expected on the far side
	next_iid: u16,
}

impl PortalDesc {
	/// Create a new instance of [PortalDesc]
	pub fn new(port: Portal, port_iid: u16, next_iid: u16) -> Self {
		PortalDesc {
			port,
			port_iid,
			next_iid,
		}
	}
	/// Portal within the chunk being built
	pub fn get_port(&self) -> &Portal {
		&self.port
	}
	/// The portal on the far side of the boundary
	pub fn next(&self) -> Portal {
		self.port.connected()
	}
	/// Local island id expected on this side
	pub fn get_port_iid(&self) -> u16 {
		self.port_iid
	}
	/// Local island id expected on the far side
	pub fn get_next_iid(&self) -> u16 {
		self.next_iid
	}
}
