use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::lloyd::{assign_point, MeanAccumulator};
use crate::report::RunSummary;

/*
  Rayon版: 専用スレッドプール上でフェーズごとにデータ並列

  - 割り当て: 割り当て表を要素ごとに分割（書き込み先が重ならないのでロック不要）、
    変更の有無は reduce(||) で合成
  - 更新: 重心配列を D 要素ごとに分割、作業領域はワーカーごとに for_each_init で確保
  - par_iter の完了がフェーズ間のバリアになる
*/

pub fn rayon_parallel(dataset: &mut Dataset, threads: usize) -> Result<RunSummary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("kmeans-rayon-{}", i))
        .build()?;

    let Dataset { dim, points, means, clusters } = dataset;
    let dim = *dim;

    let start = Instant::now();
    let mut iter_start = start;
    let mut summary = RunSummary::default();

    pool.install(|| {
        let mut modified = true;
        while modified {
            let now = Instant::now();
            let elapsed = now - iter_start;
            iter_start = now;
            info!(iteration = summary.iterations, elapsed_secs = elapsed.as_secs_f64(), "iteration");
            summary.iteration_times.push(elapsed);

            // any() は途中で打ち切るので使わない（全点を必ず再割り当てする）
            let current_means: &[i32] = &means[..];
            modified = clusters
                .par_iter_mut()
                .zip(points.par_chunks_exact(dim))
                .map(|(slot, point)| assign_point(point, current_means, dim, slot))
                .reduce(|| false, |a, b| a || b);

            let assignments: &[u32] = &clusters[..];
            let points: &[i32] = &points[..];
            means
                .par_chunks_exact_mut(dim)
                .enumerate()
                .for_each_init(
                    || MeanAccumulator::new(dim),
                    |acc, (k, mean)| {
                        if acc.update_mean(k as u32, points, assignments, mean) == 0 {
                            debug!(mean = k, "empty cluster left unchanged");
                        }
                    },
                );

            summary.iterations += 1;
        }
    });

    summary.total = start.elapsed();
    Ok(summary)
}
