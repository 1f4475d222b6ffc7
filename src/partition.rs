use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 作業分割（負荷分散）の方式
///
/// どの方式でも各インデックスはちょうど1つのワーカーに割り当てられるので、
/// 結果は方式やスレッド数に依存しない。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Schedule {
    /// ワーカー数で等分した連続ブロック
    #[default]
    Static,
    /// `chunk` 個ずつ早い者勝ちで取得
    Dynamic { chunk: usize },
    /// 残り / ワーカー数 ずつ取得（最小 `min_chunk`）
    Guided { min_chunk: usize },
}

impl Schedule {
    pub fn chunk(&self) -> usize {
        match *self {
            Schedule::Static => 1,
            Schedule::Dynamic { chunk } => chunk,
            Schedule::Guided { min_chunk } => min_chunk,
        }
    }
}

/// `0..len` をワーカーに分配する。フェーズごとに1つ用意する。
#[derive(Debug)]
pub struct Partitioner {
    len: usize,
    workers: usize,
    schedule: Schedule,
    // Dynamic / Guided 用の次の未取得インデックス（len を超えない）
    cursor: AtomicUsize,
}

impl Partitioner {
    pub fn new(len: usize, workers: usize, schedule: Schedule) -> Self {
        Partitioner {
            len,
            workers: workers.max(1),
            schedule,
            cursor: AtomicUsize::new(0),
        }
    }

    /// 次の反復に備えてカーソルを戻す
    ///
    /// 代表ワーカーだけが呼び、バリアで他のワーカーに公開すること。
    pub fn reset(&self) {
        self.cursor.store(0, Ordering::Relaxed);
    }

    /// `worker` 番のワーカーが担当する範囲
    pub fn static_range(&self, worker: usize) -> Range<usize> {
        let base = self.len / self.workers;
        let extra = self.len % self.workers;
        let start = worker * base + worker.min(extra);
        let size = base + usize::from(worker < extra);
        start..start + size
    }

    /// 担当する範囲ごとに `f` を呼ぶ
    pub fn for_each_chunk<F>(&self, worker: usize, mut f: F)
    where
        F: FnMut(Range<usize>),
    {
        match self.schedule {
            Schedule::Static => {
                let range = self.static_range(worker);
                if !range.is_empty() {
                    f(range);
                }
            }
            Schedule::Dynamic { chunk } => {
                let chunk = chunk.max(1);
                // 巨大な chunk でも折り返さないよう len で頭打ちにする
                while let Ok(start) = self.cursor.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                    (cur < self.len).then(|| cur.saturating_add(chunk).min(self.len))
                }) {
                    f(start..start.saturating_add(chunk).min(self.len));
                }
            }
            Schedule::Guided { min_chunk } => {
                let min_chunk = min_chunk.max(1);
                let mut cur = self.cursor.load(Ordering::Relaxed);
                while cur < self.len {
                    let remaining = self.len - cur;
                    let size = (remaining / self.workers).max(min_chunk).min(remaining);
                    match self.cursor.compare_exchange_weak(
                        cur,
                        cur + size,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            f(cur..cur + size);
                            cur += size;
                        }
                        Err(actual) => cur = actual,
                    }
                }
            }
        }
    }
}
