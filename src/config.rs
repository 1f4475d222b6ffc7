use crate::error::{KMeansError, Result};
use crate::partition::Schedule;

pub const DEFAULT_DIM: usize = 3;
pub const DEFAULT_CLUSTERS: usize = 100;
pub const DEFAULT_POINTS: usize = 5_000_000;
pub const DEFAULT_GRID_SIZE: i32 = 1000;
pub const DEFAULT_THREADS: usize = 8;

/// 反復ループを実行する実装
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Engine {
    /// 固定ワーカー + バリア同期
    #[default]
    Barrier,
    Rayon,
    /// 逐次実行（参照実装）
    Single,
}

/// 実行全体で不変の設定値 (D, K, N など)
#[derive(Clone, Debug)]
pub struct Config {
    pub dim: usize,
    pub clusters: usize,
    pub points: usize,
    pub grid_size: i32,
    pub threads: usize,
    pub schedule: Schedule,
    pub seed: u64,
    pub engine: Engine,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dim: DEFAULT_DIM,
            clusters: DEFAULT_CLUSTERS,
            points: DEFAULT_POINTS,
            grid_size: DEFAULT_GRID_SIZE,
            threads: DEFAULT_THREADS,
            schedule: Schedule::Static,
            seed: 0,
            engine: Engine::Barrier,
        }
    }
}

impl Config {
    /// すべての数値は 0 より大きくなければならない
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("dimension", self.dim > 0),
            ("clusters", self.clusters > 0),
            ("points", self.points > 0),
            ("grid size", self.grid_size > 0),
            ("threads", self.threads > 0),
            ("chunk size", self.schedule.chunk() > 0),
        ];
        for (name, ok) in checks {
            if !ok {
                return Err(KMeansError::InvalidConfig(format!(
                    "{} must be numeric and greater than 0",
                    name
                )));
            }
        }
        // AssignmentTable は u32 でクラスタ番号を持つ（u32::MAX は未割り当て）
        if self.clusters >= u32::MAX as usize {
            return Err(KMeansError::InvalidConfig(format!(
                "too many clusters: {}",
                self.clusters
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_values_are_rejected() {
        let zero_dim = Config { dim: 0, ..Config::default() };
        assert!(matches!(zero_dim.validate(), Err(KMeansError::InvalidConfig(_))));

        let zero_threads = Config { threads: 0, ..Config::default() };
        assert!(zero_threads.validate().is_err());

        let negative_grid = Config { grid_size: -5, ..Config::default() };
        assert!(negative_grid.validate().is_err());

        let zero_chunk = Config { schedule: Schedule::Dynamic { chunk: 0 }, ..Config::default() };
        assert!(zero_chunk.validate().is_err());
    }
}
