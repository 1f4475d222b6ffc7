use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::dataset::Dataset;

/// 各成分を `[0, grid_size)` の一様乱数で埋める
pub fn generate_points<R: Rng>(rng: &mut R, values: &mut [i32], grid_size: i32) {
    for v in values.iter_mut() {
        *v = rng.gen_range(0..grid_size);
    }
}

/// 点 → 初期重心の順に同じ乱数列から生成する（同じ seed なら同じ結果）
pub fn populate(dataset: &mut Dataset, grid_size: i32, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_points(&mut rng, &mut dataset.points, grid_size);
    generate_points(&mut rng, &mut dataset.means, grid_size);
    dataset.reset_assignments();
}
