use std::time::Instant;

use crate::dataset::Dataset;
use crate::lloyd::{assign_point, MeanAccumulator};
use crate::report::RunSummary;

/// 割り当てフェーズ（逐次）。1点でも所属が変わったら true。
pub fn assignment_step(dataset: &mut Dataset) -> bool {
    let Dataset { dim, points, means, clusters } = dataset;
    let dim = *dim;
    let mut modified = false;
    for (point, slot) in points.chunks_exact(dim).zip(clusters.iter_mut()) {
        modified |= assign_point(point, means, dim, slot);
    }
    modified
}

/// 更新フェーズ（逐次）。メンバーのいない重心はそのまま。
pub fn update_step(dataset: &mut Dataset, acc: &mut MeanAccumulator) {
    let Dataset { dim, points, means, clusters } = dataset;
    for (k, mean) in means.chunks_exact_mut(*dim).enumerate() {
        acc.update_mean(k as u32, points, clusters, mean);
    }
}

/// シングルスレッド版（並列版の正解データ）
pub fn lloyd_single(dataset: &mut Dataset) -> RunSummary {
    let start = Instant::now();
    let mut iter_start = start;
    let mut acc = MeanAccumulator::new(dataset.dim);
    let mut summary = RunSummary::default();

    let mut modified = true;
    while modified {
        let now = Instant::now();
        summary.iteration_times.push(now - iter_start);
        iter_start = now;

        modified = assignment_step(dataset);
        update_step(dataset, &mut acc);
        summary.iterations += 1;
    }

    summary.total = start.elapsed();
    summary
}
