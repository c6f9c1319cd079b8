use boreas_tile::{MemoryBudget, TileScheduler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_exact_cover(s: &TileScheduler) {
    let (rows, cols) = s.grid_shape();
    let mut hits = vec![0u32; rows * cols];
    for tile in s.tiles() {
        assert!(tile.n_cells() > 0, "empty tile {}", tile.id());
        for r in tile.rows() {
            for c in tile.cols() {
                hits[r * cols + c] += 1;
            }
        }
    }
    assert!(
        hits.iter().all(|&h| h == 1),
        "grid {rows}x{cols} with tile {:?} not covered exactly once",
        s.tile_shape()
    );
}

#[test]
fn random_grids_are_covered_exactly_once() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let rows = rng.random_range(1..60);
        let cols = rng.random_range(1..60);
        let bytes_per_cell = rng.random_range(1..64u64);
        let budget = match rng.random_range(0..3) {
            0 => MemoryBudget::Bytes(rng.random_range(0..5000)),
            1 => MemoryBudget::TransferLimitMb(rng.random_range(0.0001..0.01)),
            _ => MemoryBudget::Unlimited,
        };
        let s = TileScheduler::new(rows, cols, budget, bytes_per_cell).unwrap();
        assert_exact_cover(&s);
    }
}

#[test]
fn tile_never_exceeds_budget_when_cells_fit() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let rows = rng.random_range(1..50);
        let cols = rng.random_range(1..50);
        let bytes_per_cell = 16u64;
        let cells = rng.random_range(1..400u64);
        let s = TileScheduler::new(rows, cols, MemoryBudget::Bytes(cells * bytes_per_cell), bytes_per_cell)
            .unwrap();
        let (tr, tc) = s.tile_shape();
        if ((rows * cols) as u64) > cells {
            assert!((tr * tc) as u64 <= cells, "{tr}x{tc} > {cells} cells");
        }
    }
}

#[test]
fn clamped_tiles_use_the_budget() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let rows = rng.random_range(1..400);
        let cols = rng.random_range(2..4);
        let cells = rng.random_range(1..(rows * cols));
        let s = TileScheduler::new(rows, cols, MemoryBudget::Bytes(cells as u64), 1).unwrap();
        let (tr, tc) = s.tile_shape();
        assert!(tr * tc <= cells, "{tr}x{tc} > {cells} cells");
        // One more row would not fit, or the grid has no more rows.
        assert!(tr == rows || (tr + 1) * tc > cells, "{tr}x{tc} wastes a {cells}-cell budget");
    }
}

#[test]
fn iteration_is_deterministic() {
    let a = TileScheduler::new(33, 17, MemoryBudget::Bytes(100), 1).unwrap();
    let b = TileScheduler::new(33, 17, MemoryBudget::Bytes(100), 1).unwrap();
    let ta: Vec<_> = a.tiles().collect();
    let tb: Vec<_> = b.tiles().collect();
    assert_eq!(ta, tb);
    assert!(ta.iter().enumerate().all(|(i, t)| t.id() == i));
}
