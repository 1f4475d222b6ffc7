use crate::config::Config;
use crate::error::{KMeansError, Result};

/// 未割り当て（どのクラスタにも属していない）を表す番兵値
pub const UNASSIGNED: u32 = u32::MAX;

/// 1回の実行コンテキスト
///
/// 点・重心は D 要素ずつ平坦な配列に並べる (`points[i * dim + j]`)。
/// `clusters[i]` は点 i が割り当てられている重心の番号。
#[derive(Clone, Debug)]
pub struct Dataset {
    pub dim: usize,
    pub points: Vec<i32>,
    pub means: Vec<i32>,
    pub clusters: Vec<u32>,
}

impl Dataset {
    /// 設定に合わせてゼロ初期化したバッファを確保する
    pub fn allocate(config: &Config) -> Result<Self> {
        config.validate()?;
        let dim = config.dim;
        let point_len = checked_len(config.points, dim, "points")?;
        let mean_len = checked_len(config.clusters, dim, "means")?;

        Ok(Dataset {
            dim,
            points: try_filled(point_len, 0, "points")?,
            means: try_filled(mean_len, 0, "means")?,
            clusters: try_filled(config.points, UNASSIGNED, "clusters")?,
        })
    }

    /// 既存の点と初期重心から作る（テスト・ライブラリ利用向け）
    pub fn from_parts(dim: usize, points: Vec<i32>, means: Vec<i32>) -> Result<Self> {
        if dim == 0 {
            return Err(KMeansError::InvalidConfig("dimension must be greater than 0".into()));
        }
        if points.is_empty() || points.len() % dim != 0 {
            return Err(KMeansError::InvalidConfig(format!(
                "points length {} is not a positive multiple of dimension {}",
                points.len(),
                dim
            )));
        }
        if means.is_empty() || means.len() % dim != 0 {
            return Err(KMeansError::InvalidConfig(format!(
                "means length {} is not a positive multiple of dimension {}",
                means.len(),
                dim
            )));
        }
        if means.len() / dim >= UNASSIGNED as usize {
            return Err(KMeansError::InvalidConfig("too many clusters".into()));
        }
        let clusters = try_filled(points.len() / dim, UNASSIGNED, "clusters")?;
        Ok(Dataset { dim, points, means, clusters })
    }

    pub fn num_points(&self) -> usize {
        self.clusters.len()
    }

    pub fn num_means(&self) -> usize {
        self.means.len() / self.dim
    }

    pub fn point(&self, i: usize) -> &[i32] {
        &self.points[i * self.dim..(i + 1) * self.dim]
    }

    pub fn mean(&self, i: usize) -> &[i32] {
        &self.means[i * self.dim..(i + 1) * self.dim]
    }

    /// 割り当て表を番兵値に戻す（次の最初の割り当てで必ず変更が検出される）
    pub fn reset_assignments(&mut self) {
        self.clusters.fill(UNASSIGNED);
    }
}

fn checked_len(count: usize, dim: usize, what: &'static str) -> Result<usize> {
    count
        .checked_mul(dim)
        .ok_or_else(|| KMeansError::InvalidConfig(format!("{} buffer size overflows", what)))
}

fn try_filled<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|source| KMeansError::Allocation { what, source })?;
    buf.resize(len, value);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_uses_sentinel_for_assignments() {
        let config = Config { dim: 2, clusters: 3, points: 5, ..Config::default() };
        let data = Dataset::allocate(&config).unwrap();
        assert_eq!(data.points.len(), 10);
        assert_eq!(data.means.len(), 6);
        assert_eq!(data.num_points(), 5);
        assert_eq!(data.num_means(), 3);
        assert!(data.clusters.iter().all(|&c| c == UNASSIGNED));
    }

    #[test]
    fn from_parts_rejects_ragged_buffers() {
        assert!(Dataset::from_parts(2, vec![1, 2, 3], vec![0, 0]).is_err());
        assert!(Dataset::from_parts(2, vec![1, 2], vec![0]).is_err());
        assert!(Dataset::from_parts(0, vec![1, 2], vec![0, 0]).is_err());

        let data = Dataset::from_parts(2, vec![1, 2, 3, 4], vec![0, 0]).unwrap();
        assert_eq!(data.point(1), &[3, 4]);
        assert_eq!(data.mean(0), &[0, 0]);
    }
}
