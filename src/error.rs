use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KMeansError {
    #[error("Illegal argument value: {0}")]
    InvalidConfig(String),

    /// バッファ確保の失敗（致命的、リトライしない）
    #[error("could not allocate {what}")]
    Allocation {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// ワーカーの起動失敗（起動済みのワーカーはバリアに入らずに終わる）
    #[error("failed to spawn worker thread")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, KMeansError>;
