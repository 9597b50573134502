//! Try building each field
//!

use bevy::prelude::*;
use bevy_flowfield_nav::prelude::*;

/// Follow the directions of `field` from `start`, returns the cell the walk
/// stops on and the number of steps taken. Panics if a step leaves the chunk,
/// enters an impassable tile or cuts the corner of one
fn follow(field: &FlowField, chunk: &NavChunk, start: FieldCell, max_steps: usize) -> (FieldCell, usize) {
	let mut cell = start;
	for step in 0..=max_steps {
		let ordinal = field.get_field_cell_value(cell);
		if ordinal == Ordinal::Zero {
			return (cell, step);
		}
		let step_to = |cell: FieldCell, ordinal: Ordinal| -> FieldCell {
			let (dr, dc) = ordinal.offset();
			let (r, c) = (cell.get_row() as isize + dr, cell.get_column() as isize + dc);
			assert!(r >= 0 && c >= 0 && (r as usize) < field.get_rows() && (c as usize) < field.get_columns(), "{:?} leaves the chunk from {:?}", ordinal, cell);
			FieldCell::new(r as usize, c as usize)
		};
		if let Some((a, b)) = ordinal.flanking() {
			assert!(chunk.is_passable(step_to(cell, a)), "{:?} cuts a corner from {:?}", ordinal, cell);
			assert!(chunk.is_passable(step_to(cell, b)), "{:?} cuts a corner from {:?}", ordinal, cell);
		}
		cell = step_to(cell, ordinal);
		assert!(chunk.is_passable(cell), "stepped onto impassable {:?}", cell);
	}
	panic!("walk from {:?} did not settle within {} steps", start, max_steps);
}

fn all_cells(rows: usize, columns: usize) -> impl Iterator<Item = FieldCell> {
	(0..rows).flat_map(move |r| (0..columns).map(move |c| FieldCell::new(r, c)))
}

#[test]
fn tile_field_on_open_chunk() {
	let grid = NavGrid::new(MapResolution::new(1, 1, 5, 5));
	let world = WorldSnapshot::default();
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let chunk = ChunkCoord::new(0, 0);
	let goal = FieldCell::new(2, 2);
	let mut field = FlowField::new(chunk, FieldTarget::Tile(goal), grid.get_resolution());
	field.update(&grid, NavLayer::Ground1x1, None, &world, &mut ws);
	let chunk_data = grid.chunk(NavLayer::Ground1x1, chunk);
	for cell in all_cells(5, 5) {
		let (end, steps) = follow(&field, chunk_data, cell, 10);
		assert_eq!(goal, end);
		assert!(steps <= 4);
	}
	let expected = [
		((0, 2), Ordinal::South),
		((2, 0), Ordinal::East),
		((4, 2), Ordinal::North),
		((2, 4), Ordinal::West),
		((0, 0), Ordinal::SouthEast),
		((4, 4), Ordinal::NorthWest),
		((0, 4), Ordinal::SouthWest),
		((4, 0), Ordinal::NorthEast),
		((2, 2), Ordinal::Zero),
	];
	for ((r, c), ordinal) in expected {
		assert_eq!(ordinal, field.get_field_cell_value(FieldCell::new(r, c)), "direction of ({}, {})", r, c);
	}
}

#[test]
fn tile_field_beside_obstacle_next_to_target() {
	let mut grid = NavGrid::new(MapResolution::new(1, 1, 5, 5));
	let layer = NavLayer::Ground1x1;
	grid.set_cost(layer, &TileDesc::from_parts(0, 0, 2, 1), COST_IMPASSABLE);
	let world = WorldSnapshot::default();
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let chunk = ChunkCoord::new(0, 0);
	let goal = FieldCell::new(2, 2);
	let mut field = FlowField::new(chunk, FieldTarget::Tile(goal), grid.get_resolution());
	field.update(&grid, layer, None, &world, &mut ws);
	let chunk_data = grid.chunk(layer, chunk);
	// heading east would walk straight into the obstacle and either diagonal
	// east would cut its corner
	let west_edge = field.get_field_cell_value(FieldCell::new(2, 0));
	assert!(west_edge == Ordinal::North || west_edge == Ordinal::South, "(2, 0) points {:?}", west_edge);
	assert_eq!(Ordinal::Zero, field.get_field_cell_value(FieldCell::new(2, 1)));
	for cell in all_cells(5, 5) {
		if !chunk_data.is_passable(cell) {
			continue;
		}
		let (end, _) = follow(&field, chunk_data, cell, 25);
		assert_eq!(goal, end);
	}
}

#[test]
fn tile_field_around_obstacle() {
	let mut grid = NavGrid::new(MapResolution::new(1, 1, 5, 5));
	let layer = NavLayer::Ground1x1;
	grid.set_cost(layer, &TileDesc::from_parts(0, 0, 2, 1), COST_IMPASSABLE);
	let world = WorldSnapshot::default();
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let chunk = ChunkCoord::new(0, 0);
	let goal = FieldCell::new(2, 0);
	let mut field = FlowField::new(chunk, FieldTarget::Tile(goal), grid.get_resolution());
	field.update(&grid, layer, None, &world, &mut ws);
	let chunk_data = grid.chunk(layer, chunk);
	for cell in all_cells(5, 5) {
		if !chunk_data.is_passable(cell) {
			assert_eq!(Ordinal::Zero, field.get_field_cell_value(cell));
			continue;
		}
		if cell != goal {
			// every passable tile can reach the goal so none are dead ends
			assert_ne!(Ordinal::Zero, field.get_field_cell_value(cell));
		}
		let (end, _) = follow(&field, chunk_data, cell, 25);
		assert_eq!(goal, end);
	}
	// the diagonal past the obstacle would cut its corner
	assert_eq!(Ordinal::North, field.get_field_cell_value(FieldCell::new(2, 2)));
	assert_eq!(Ordinal::West, field.get_field_cell_value(FieldCell::new(1, 1)));
}

#[test]
fn island_fallback_leads_to_closest_tiles() {
	let mut grid = NavGrid::new(MapResolution::new(1, 1, 5, 5));
	let layer = NavLayer::Ground1x1;
	// column 2 is a wall, the east side is local island 1
	for r in 0..5 {
		grid.set_cost(layer, &TileDesc::from_parts(0, 0, r, 2), COST_IMPASSABLE);
		for c in 3..5 {
			grid.set_islands(layer, &TileDesc::from_parts(0, 0, r, c), 0, 1);
		}
	}
	let world = WorldSnapshot::default();
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let chunk = ChunkCoord::new(0, 0);
	let mut field = FlowField::new(chunk, FieldTarget::Tile(FieldCell::new(2, 0)), grid.get_resolution());
	field.update(&grid, layer, None, &world, &mut ws);
	assert_eq!(Ordinal::Zero, field.get_field_cell_value(FieldCell::new(2, 4)));
	field.update_island_to_nearest(1, &grid, layer, None, &world, &mut ws);
	// the east island settles on the tile nearest the target
	assert_eq!(Ordinal::Zero, field.get_field_cell_value(FieldCell::new(2, 3)));
	assert_eq!(Ordinal::West, field.get_field_cell_value(FieldCell::new(2, 4)));
	assert_eq!(Ordinal::SouthWest, field.get_field_cell_value(FieldCell::new(0, 4)));
	// the west island is untouched
	assert_eq!(Ordinal::West, field.get_field_cell_value(FieldCell::new(2, 1)));
}

#[test]
fn out_of_obstacle_field() {
	let mut grid = NavGrid::new(MapResolution::new(1, 1, 5, 5));
	let layer = NavLayer::Ground1x1;
	for r in 1..4 {
		for c in 1..4 {
			grid.set_cost(layer, &TileDesc::from_parts(0, 0, r, c), COST_IMPASSABLE);
		}
	}
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let mut field = FlowField::new(ChunkCoord::new(0, 0), FieldTarget::Tile(FieldCell::new(0, 0)), grid.get_resolution());
	field.update_to_nearest_pathable(&grid, layer, FieldCell::new(2, 2), &mut ws);
	// the centre of the block heads for the nearest edge
	assert_eq!(Ordinal::North, field.get_field_cell_value(FieldCell::new(2, 2)));
	assert_eq!(Ordinal::North, field.get_field_cell_value(FieldCell::new(1, 2)));
}

/// Two 5x5 chunks side by side joined by a portal over rows 1 to 3
fn portal_grid() -> (NavGrid, Portal) {
	let port = Portal::new(
		ChunkCoord::new(0, 0),
		[FieldCell::new(1, 4), FieldCell::new(3, 4)],
		ChunkCoord::new(0, 1),
		[FieldCell::new(1, 0), FieldCell::new(3, 0)],
	);
	let mut grid = NavGrid::new(MapResolution::new(2, 1, 5, 5));
	grid.connect_portal(NavLayer::Ground1x1, port);
	(grid, port)
}

#[test]
fn portal_field_crosses_boundary() {
	let (grid, port) = portal_grid();
	let world = WorldSnapshot::default();
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let target = FieldTarget::Portal(PortalDesc::new(port, ISLAND_NONE, ISLAND_NONE));
	let mut field = FlowField::new(ChunkCoord::new(0, 0), target, grid.get_resolution());
	field.update(&grid, NavLayer::Ground1x1, None, &world, &mut ws);
	for r in 1..4 {
		assert_eq!(Ordinal::East, field.get_field_cell_value(FieldCell::new(r, 4)));
	}
	assert_eq!(Ordinal::South, field.get_field_cell_value(FieldCell::new(0, 4)));
	assert_eq!(Ordinal::East, field.get_field_cell_value(FieldCell::new(2, 0)));
}

#[test]
fn portal_mask_field_crosses_boundary() {
	let (grid, _) = portal_grid();
	let world = WorldSnapshot::default();
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let mut field = FlowField::new(ChunkCoord::new(0, 0), FieldTarget::PortalMask(0b1), grid.get_resolution());
	field.update(&grid, NavLayer::Ground1x1, None, &world, &mut ws);
	for r in 1..4 {
		assert_eq!(Ordinal::East, field.get_field_cell_value(FieldCell::new(r, 4)));
	}
	// no portal selected, nothing to head for
	let mut none = FlowField::new(ChunkCoord::new(0, 0), FieldTarget::PortalMask(0b10), grid.get_resolution());
	none.update(&grid, NavLayer::Ground1x1, None, &world, &mut ws);
	assert!(none.get().iter().all(|o| *o == Ordinal::Zero));
}

#[test]
fn enemies_field_reaches_into_neighbour_chunk() {
	let grid = NavGrid::new(MapResolution::new(2, 1, 8, 8));
	let mut world = WorldSnapshot::default();
	world.set_diplomacy(0, 1, DiplomacyState::War);
	// an enemy on tile (2, 1) of chunk (0, 1)
	world.insert_entity(1, EntityRecord::unit(1, Vec2::new(9.5, 2.5), 0.25));
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let chunk = ChunkCoord::new(0, 0);
	let target = FieldTarget::Enemies(EnemiesDesc::new(0, chunk));
	let mut field = FlowField::new(chunk, target, grid.get_resolution());
	field.update(&grid, NavLayer::Ground1x1, Some(0), &world, &mut ws);
	assert_eq!(Ordinal::East, field.get_field_cell_value(FieldCell::new(2, 7)));
	assert_eq!(Ordinal::East, field.get_field_cell_value(FieldCell::new(2, 0)));
	// at peace there is nothing to attack
	world.set_diplomacy(0, 1, DiplomacyState::Peace);
	field.update(&grid, NavLayer::Ground1x1, Some(0), &world, &mut ws);
	assert!(field.get().iter().all(|o| *o == Ordinal::Zero));
}

#[test]
fn entity_field_surrounds_building() {
	let grid = NavGrid::new(MapResolution::new(1, 1, 8, 8));
	let mut world = WorldSnapshot::default();
	world.insert_entity(3, EntityRecord::building(2, Obb::new(Vec2::new(4.0, 4.0), Vec2::new(1.0, 1.0), 0.0)));
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let chunk = ChunkCoord::new(0, 0);
	let mut field = FlowField::new(chunk, FieldTarget::Entity(EntityDesc::new(3)), grid.get_resolution());
	field.update(&grid, NavLayer::Ground1x1, None, &world, &mut ws);
	for (r, c) in [(3, 3), (3, 4), (4, 3), (4, 4)] {
		assert_eq!(Ordinal::Zero, field.get_field_cell_value(FieldCell::new(r, c)));
	}
	assert_eq!(Ordinal::SouthEast, field.get_field_cell_value(FieldCell::new(0, 0)));
	assert_eq!(Ordinal::NorthWest, field.get_field_cell_value(FieldCell::new(7, 7)));
	assert_eq!(Vec2::new(0.0, 1.0), field.direction(FieldCell::new(0, 3)));
}

#[test]
fn los_over_two_open_chunks() {
	let grid = NavGrid::new(MapResolution::new(2, 1, 6, 6));
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let target = TileDesc::from_parts(0, 0, 3, 1);
	let mut first = LosField::new(ChunkCoord::new(0, 0), grid.get_resolution());
	first.create(&grid, NavLayer::Ground1x1, 0, &target, None, &mut ws);
	let mut second = LosField::new(ChunkCoord::new(0, 1), grid.get_resolution());
	second.create(&grid, NavLayer::Ground1x1, 0, &target, Some(&first), &mut ws);
	for cell in all_cells(6, 6) {
		assert!(first.is_visible(cell));
		assert!(second.is_visible(cell));
		assert!(!second.is_wavefront_blocked(cell));
	}
}

#[test]
fn cell_arrival_across_chunks() {
	let grid = NavGrid::new(MapResolution::new(2, 2, 4, 4));
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	let mut field = CellArrivalField::new(4, 4);
	let target = TileDesc::from_parts(1, 1, 0, 0);
	let center = TileDesc::from_parts(0, 0, 3, 3);
	field.create(&grid, NavLayer::Ground1x1, 0, &target, &center, &mut ws);
	assert_eq!((1, 1), field.get_base());
	let res = grid.get_resolution();
	assert_eq!(Vec2::ZERO, field.direction(res, &target));
	assert_eq!(Ordinal::SouthEast, field.get_field_cell_value(0, 0));
	// chunk (0, 1) sits directly above the target
	assert_eq!(Vec2::new(0.0, 1.0), field.direction(res, &TileDesc::from_parts(0, 1, 3, 0)));
}
