use std::fmt::Write;
use std::time::Duration;

use crate::dataset::Dataset;

/// 1回の実行結果
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// 実行した反復回数（割り当て + 更新の組）
    pub iterations: usize,
    /// 各反復の開始時点で計測した、前回の開始からの経過時間
    pub iteration_times: Vec<Duration>,
    pub total: Duration,
}

impl RunSummary {
    /// `<i>: <secs> seconds` 形式の行
    pub fn iteration_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.iteration_times
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}: {:.6} seconds", i, t.as_secs_f64()))
    }
}

/// 重心を1行に D 個ずつ出力する
pub fn format_means(dataset: &Dataset) -> String {
    let mut out = String::new();
    for mean in dataset.means.chunks_exact(dataset.dim) {
        for v in mean {
            let _ = write!(out, "{:5} ", v);
        }
        out.push('\n');
    }
    out
}
