//! Useful structures and tools used by the fields
//!

use std::f32::consts::FRAC_1_SQRT_2;

use bevy::prelude::*;

/// A tile cost of this value can never be traversed
pub const COST_IMPASSABLE: u8 = 255;
/// Island id used as a wildcard when matching islands
pub const ISLAND_NONE: u16 = u16::MAX;
/// Number of factions that can be tracked per tile, one bit each in a `u16`
pub const MAX_FACTIONS: usize = 16;
/// Extra world-space padding applied on each side of an enemy search rectangle
pub const SEARCH_BUFFER: f32 = 16.0;

/// Directions of movement stored in a [crate::prelude::FlowField] and
/// [crate::prelude::CellArrivalField].
///
/// The discriminants are the stable 4-bit codes used by the packed cell
/// arrival encoding, [Ordinal::Zero] is `0` so a zeroed buffer means "no
/// direction"
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash, Reflect)]
pub enum Ordinal {
	/// No direction, either the cell is a goal or it cannot reach one
	#[default]
	Zero = 0,
	/// Up a row and left a column
	NorthWest = 1,
	/// Up a row
	North = 2,
	/// Up a row and right a column
	NorthEast = 3,
	/// Left a column
	West = 4,
	/// Right a column
	East = 5,
	/// Down a row and left a column
	SouthWest = 6,
	/// Down a row
	South = 7,
	/// Down a row and right a column
	SouthEast = 8,
}

impl Ordinal {
	/// Order in which equally cheap neighbours are chosen, cardinals win over diagonals
	pub const PRIORITY: [Ordinal; 8] = [
		Ordinal::North,
		Ordinal::South,
		Ordinal::East,
		Ordinal::West,
		Ordinal::NorthWest,
		Ordinal::NorthEast,
		Ordinal::SouthWest,
		Ordinal::SouthEast,
	];
	/// The four cardinal directions
	pub const CARDINALS: [Ordinal; 4] = [
		Ordinal::North,
		Ordinal::East,
		Ordinal::South,
		Ordinal::West,
	];
	/// The 4-bit code of the direction
	pub fn to_bits(self) -> u8 {
		self as u8
	}
	/// Decode a 4-bit direction code
	pub fn from_bits(bits: u8) -> Self {
		match bits {
			0 => Ordinal::Zero,
			1 => Ordinal::NorthWest,
			2 => Ordinal::North,
			3 => Ordinal::NorthEast,
			4 => Ordinal::West,
			5 => Ordinal::East,
			6 => Ordinal::SouthWest,
			7 => Ordinal::South,
			8 => Ordinal::SouthEast,
			_ => panic!("Direction code {} is not a valid Ordinal", bits),
		}
	}
	/// Offset `(row, column)` of the neighbouring cell in this direction
	pub fn offset(self) -> (isize, isize) {
		match self {
			Ordinal::Zero => (0, 0),
			Ordinal::NorthWest => (-1, -1),
			Ordinal::North => (-1, 0),
			Ordinal::NorthEast => (-1, 1),
			Ordinal::West => (0, -1),
			Ordinal::East => (0, 1),
			Ordinal::SouthWest => (1, -1),
			Ordinal::South => (1, 0),
			Ordinal::SouthEast => (1, 1),
		}
	}
	/// For a diagonal the two cardinals that share an edge with it
	pub fn flanking(self) -> Option<(Ordinal, Ordinal)> {
		match self {
			Ordinal::NorthWest => Some((Ordinal::North, Ordinal::West)),
			Ordinal::NorthEast => Some((Ordinal::North, Ordinal::East)),
			Ordinal::SouthWest => Some((Ordinal::South, Ordinal::West)),
			Ordinal::SouthEast => Some((Ordinal::South, Ordinal::East)),
			_ => None,
		}
	}
	/// Unit vector of the direction in the `x-z` plane stored as a [Vec2],
	/// `x` grows with columns and `y` (world `z`) grows with rows so
	/// [Ordinal::North] is `(0, -1)`
	pub fn to_vec2(self) -> Vec2 {
		match self {
			Ordinal::Zero => Vec2::ZERO,
			Ordinal::NorthWest => Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
			Ordinal::North => Vec2::new(0.0, -1.0),
			Ordinal::NorthEast => Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
			Ordinal::West => Vec2::new(-1.0, 0.0),
			Ordinal::East => Vec2::new(1.0, 0.0),
			Ordinal::SouthWest => Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
			Ordinal::South => Vec2::new(0.0, 1.0),
			Ordinal::SouthEast => Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
		}
	}
}

/// Manhattan distance between two `(row, column)` coordinates
pub fn manhattan_distance(a: (isize, isize), b: (isize, isize)) -> usize {
	a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn bits_are_stable() {
		let expected = [
			(Ordinal::Zero, 0), (Ordinal::NorthWest, 1), (Ordinal::North, 2),
			(Ordinal::NorthEast, 3), (Ordinal::West, 4), (Ordinal::East, 5),
			(Ordinal::SouthWest, 6), (Ordinal::South, 7), (Ordinal::SouthEast, 8),
		];
		for (ordinal, bits) in expected {
			assert_eq!(bits, ordinal.to_bits());
			assert_eq!(ordinal, Ordinal::from_bits(bits));
		}
	}
	#[test]
	#[should_panic]
	fn invalid_bits() {
		Ordinal::from_bits(9);
	}
	#[test]
	fn vectors_point_along_offsets() {
		for ordinal in Ordinal::PRIORITY {
			let (dr, dc) = ordinal.offset();
			let expected = Vec2::new(dc as f32, dr as f32).normalize();
			assert!((ordinal.to_vec2() - expected).length() < 1e-6);
		}
		assert_eq!(Vec2::ZERO, Ordinal::Zero.to_vec2());
	}
	#[test]
	fn flanks_of_diagonals() {
		assert_eq!(Some((Ordinal::South, Ordinal::East)), Ordinal::SouthEast.flanking());
		assert_eq!(None, Ordinal::North.flanking());
	}
	#[test]
	fn manhattan() {
		assert_eq!(7, manhattan_distance((0, 0), (3, -4)));
	}
}
