//! Measure a harvester sweeping a cube scattered with energy cells
//!

use std::collections::HashMap;

use bevy_portal_network_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;

/// Energy cells around the harvester keyed by position
struct Cells(HashMap<BlockPos, EnergyBuffer>);

impl HarvestContext for Cells {
	fn classify(&self, pos: BlockPos) -> ConsumerKind {
		match self.0.get(&pos) {
			Some(cell) if cell.can_receive() => ConsumerKind::EnergyStorage,
			_ => ConsumerKind::Inert,
		}
	}
	fn supply_portal_member(&mut self, _pos: BlockPos, _amount: i32) -> Option<i32> {
		None
	}
	fn supply_energy_storage(&mut self, pos: BlockPos, amount: i32) -> Option<i32> {
		self.0
			.get_mut(&pos)
			.map(|cell| cell.receive_energy(amount, false))
	}
}

/// Scatter `count` cells randomly in the cube of `range` around the origin
fn prepare_cells(range: i32, count: usize) -> Cells {
	let mut rng = rand::rng();
	let mut cells = HashMap::new();
	while cells.len() < count {
		let pos = BlockPos::new(
			rng.random_range(-range..=range),
			rng.random_range(-range..=range),
			rng.random_range(-range..=range),
		);
		if pos != BlockPos::new(0, 0, 0) {
			cells.insert(pos, EnergyBuffer::new(1_000_000));
		}
	}
	Cells(cells)
}

/// Tick a harvester until its cursor has covered the whole cube once
fn sweep(mut harvester: Harvester, mut cells: Cells, ticks: usize) {
	for _ in 0..ticks {
		harvester.tick(BlockPos::new(0, 0, 0), &mut cells);
	}
}

/// Sweep the whole cube of a harvester
pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("harvester");
	group.significance_level(0.05).sample_size(100);
	let config = PortalConfig {
		harvester_generation_per_tick: 100,
		..Default::default()
	};
	let side = (2 * config.harvester_range + 1) as usize;
	let ticks = side.pow(3).div_ceil(HARVEST_CELLS_PER_TICK);
	let cells = prepare_cells(config.harvester_range, 200);
	let harvester = Harvester::new(&config);
	group.bench_function("harvester_sweep", |b| {
		b.iter(|| {
			let cells = Cells(cells.0.clone());
			sweep(black_box(harvester.clone()), black_box(cells), ticks)
		})
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
