//! Measure detecting the shape of portal frames
//!

use bevy_portal_network_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Create a level holding one upright frame around an interior of `width` by `height`
fn prepare_level(width: i32, height: i32) -> (Level, BlockPos) {
	let mut level = Level::new(DimensionId::overworld());
	let origin = BlockPos::new(0, 64, 0);
	for x in -1..=width {
		for y in -1..=height {
			if x == -1 || x == width || y == -1 || y == height {
				level.set_block(origin.offset(x, y, 0), BlockKind::Frame);
			}
		}
	}
	(level, origin.offset(0, -1, 0))
}

/// Detect the frame from a block of its bottom edge
fn detect_shape(level: &Level, seed: BlockPos, config: &PortalConfig) {
	let _ = PortalShape::find(level, seed, config.max_portal_area, config.max_portal_size);
}

/// Detect frames of growing size
pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("shape_detection");
	group.significance_level(0.05).sample_size(100);
	let config = PortalConfig::default();
	let (small, small_seed) = prepare_level(2, 3);
	group.bench_function("detect_shape_small", |b| {
		b.iter(|| detect_shape(black_box(&small), black_box(small_seed), &config))
	});
	let (large, large_seed) = prepare_level(20, 20);
	group.bench_function("detect_shape_large", |b| {
		b.iter(|| detect_shape(black_box(&large), black_box(large_seed), &config))
	});
	// a lone block, every fill runs into open air
	let mut open = Level::new(DimensionId::overworld());
	open.set_block(BlockPos::new(0, 64, 0), BlockKind::Frame);
	group.bench_function("detect_shape_open", |b| {
		b.iter(|| detect_shape(black_box(&open), black_box(BlockPos::new(0, 64, 0)), &config))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
