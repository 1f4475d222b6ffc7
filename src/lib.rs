pub mod config;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod generate;
pub mod implementations;
pub mod lloyd;
pub mod partition;
pub mod reduction;
pub mod report;

pub use config::{Config, Engine};
pub use dataset::{Dataset, UNASSIGNED};
pub use error::{KMeansError, Result};
pub use partition::Schedule;
pub use report::RunSummary;

/// 設定されたエンジンでクラスタリングを収束まで実行する
pub fn run(config: &Config, dataset: &mut Dataset) -> Result<RunSummary> {
    config.validate()?;
    match config.engine {
        Engine::Single => Ok(implementations::single::lloyd_single(dataset)),
        Engine::Barrier => implementations::barrier::barrier_parallel(dataset, config.threads, config.schedule),
        Engine::Rayon => implementations::rayon::rayon_parallel(dataset, config.threads),
    }
}
