//! Measure line of sight generation along a row of chunks scattered with walls
//!
//! World is 8 chunks by 1 chunk of 32x32 tiles
//!

use bevy_flowfield_nav::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Create the grid with short vertical walls dotted around
fn prepare_grid() -> NavGrid {
	let mut grid = NavGrid::new(MapResolution::new(8, 1, 32, 32));
	let mut rng = StdRng::seed_from_u64(11);
	let res = *grid.get_resolution();
	for _ in 0..64 {
		let r = rng.random_range(2..res.map_rows() - 6);
		let c = rng.random_range(2..res.map_columns() - 2);
		for dr in 0..4 {
			if let Some(tile) = res.desc_of_abs(((r + dr) as isize, c as isize)) {
				grid.set_cost(NavLayer::Ground1x1, &tile, COST_IMPASSABLE);
			}
		}
	}
	grid
}

/// Continue line of sight from the target chunk through every other chunk
fn los_row(grid: &NavGrid, target: &TileDesc, ws: &mut Workspace) {
	let res = grid.get_resolution();
	let mut prev = LosField::new(target.get_chunk(), res);
	prev.create(grid, NavLayer::Ground1x1, 0, target, None, ws);
	for column in 1..res.get_chunk_w() {
		let mut los = LosField::new(ChunkCoord::new(0, column), res);
		los.create(grid, NavLayer::Ground1x1, 0, target, Some(&prev), ws);
		prev = los;
	}
	black_box(&prev);
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let mut grid = prepare_grid();
	let target = TileDesc::from_parts(0, 0, 16, 4);
	grid.set_cost(NavLayer::Ground1x1, &target, 1);
	let mut ws = Workspace::for_resolution(grid.get_resolution());
	group.bench_function("calc_los", |b| {
		b.iter(|| los_row(black_box(&grid), black_box(&target), &mut ws))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
