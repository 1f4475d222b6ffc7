use crate::distance::sq_dist;

/// 最も近い重心の番号を返す
///
/// 同距離の場合は番号の小さい方が残る（厳密に小さいときだけ更新）。
#[inline]
pub fn nearest_mean(point: &[i32], means: &[i32], dim: usize) -> u32 {
    let mut chunks = means.chunks_exact(dim);
    let mut min_dist = match chunks.next() {
        Some(first) => sq_dist(point, first),
        None => return 0,
    };
    let mut min_idx = 0u32;
    for (j, mean) in chunks.enumerate() {
        let cur_dist = sq_dist(point, mean);
        if cur_dist < min_dist {
            min_dist = cur_dist;
            min_idx = (j + 1) as u32;
        }
    }
    min_idx
}

/// 点 i を再割り当てし、変化したら true を返す
#[inline]
pub fn assign_point(point: &[i32], means: &[i32], dim: usize, slot: &mut u32) -> bool {
    let min_idx = nearest_mean(point, means, dim);
    if *slot != min_idx {
        *slot = min_idx;
        true
    } else {
        false
    }
}

/// 重心更新用のワーカー専用作業領域（長さ D の合計 + メンバー数）
#[derive(Debug)]
pub struct MeanAccumulator {
    sum: Vec<i64>,
    count: u64,
}

impl MeanAccumulator {
    pub fn new(dim: usize) -> Self {
        MeanAccumulator { sum: vec![0; dim], count: 0 }
    }

    pub fn clear(&mut self) {
        self.sum.fill(0);
        self.count = 0;
    }

    #[inline]
    pub fn add(&mut self, point: &[i32]) {
        for (s, &v) in self.sum.iter_mut().zip(point) {
            *s += i64::from(v);
        }
        self.count += 1;
    }

    /// 整数平均（0方向への切り捨て）を書き込む。メンバーがいなければ何もしない。
    pub fn write_centroid(&self, mean: &mut [i32]) {
        if self.count == 0 {
            return;
        }
        let count = self.count as i64;
        for (m, &s) in mean.iter_mut().zip(&self.sum) {
            *m = (s / count) as i32;
        }
    }

    /// 割り当て表全体を走査して重心 `k` を再計算する
    ///
    /// 戻り値はメンバー数。0 の場合 `mean` は前の値のまま。
    pub fn update_mean(&mut self, k: u32, points: &[i32], clusters: &[u32], mean: &mut [i32]) -> u64 {
        let dim = mean.len();
        self.clear();
        for (i, &c) in clusters.iter().enumerate() {
            if c == k {
                self.add(&points[i * dim..(i + 1) * dim]);
            }
        }
        self.write_centroid(mean);
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_go_to_lowest_index() {
        // (5,0) は (0,0) と (10,0) から等距離
        let means = [0, 0, 10, 0];
        assert_eq!(nearest_mean(&[5, 0], &means, 2), 0);
        let means = [10, 0, 0, 0, 10, 0];
        assert_eq!(nearest_mean(&[5, 0], &means, 2), 0);
        assert_eq!(nearest_mean(&[9, 0], &means, 2), 0);
        assert_eq!(nearest_mean(&[1, 0], &means, 2), 1);
    }

    #[test]
    fn assign_reports_changes() {
        let means = [0, 0, 10, 10];
        let mut slot = crate::dataset::UNASSIGNED;
        assert!(assign_point(&[9, 9], &means, 2, &mut slot));
        assert_eq!(slot, 1);
        assert!(!assign_point(&[9, 9], &means, 2, &mut slot));
    }

    #[test]
    fn centroid_truncates_toward_zero() {
        let points = [1, -1, 2, -2, 2, -2];
        let clusters = [0, 0, 0];
        let mut mean = [0; 2];
        let mut acc = MeanAccumulator::new(2);
        assert_eq!(acc.update_mean(0, &points, &clusters, &mut mean), 3);
        // 5/3 = 1, -5/3 = -1
        assert_eq!(mean, [1, -1]);
    }

    #[test]
    fn empty_cluster_keeps_previous_value() {
        let points = [1, 1, 2, 2];
        let clusters = [0, 0];
        let mut mean = [123, -456];
        let mut acc = MeanAccumulator::new(2);
        assert_eq!(acc.update_mean(1, &points, &clusters, &mut mean), 0);
        assert_eq!(mean, [123, -456]);
    }

    #[test]
    fn accumulator_is_cleared_between_means() {
        let points = [4, 4, 8, 8];
        let clusters = [0, 1];
        let mut acc = MeanAccumulator::new(2);
        let mut m0 = [0; 2];
        let mut m1 = [0; 2];
        acc.update_mean(0, &points, &clusters, &mut m0);
        acc.update_mean(1, &points, &clusters, &mut m1);
        assert_eq!(m0, [4, 4]);
        assert_eq!(m1, [8, 8]);
    }
}
