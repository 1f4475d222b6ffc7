use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::dataset::Dataset;
use crate::error::{KMeansError, Result};
use crate::lloyd::{assign_point, MeanAccumulator};
use crate::partition::{Partitioner, Schedule};
use crate::reduction::OrReduction;
use crate::report::RunSummary;

/*
  バリア同期版: 固定数のワーカーが各反復のフェーズを足並みを揃えて実行する

  各反復（全ワーカー共通）:
  1. バリア（前の反復の更新フェーズ完了を保証）
  2. ワーカー0のみ: 経過時間の記録、収束フラグと分割カーソルのリセット
  3. バリア（リセットを全員に公開）
  4. 割り当てフェーズ: 点インデックスを分割、変更の有無を OR リダクション
  5. バリア（割り当て表の書き込みとリダクションの確定）
  6. 更新フェーズ: 重心インデックスを分割（nowait、次の 1 のバリアが閉じる）
  7. 収束フラグが false なら終了

  書き込み先はフェーズごとに分割されていて重ならないのでロックは不要。
  読み取り側の構造体にはそのフェーズ中に書き込むワーカーがいない。

  失敗時:
  - 起動: 全ワーカーの spawn が成功するまで誰もバリアに入らない（StartGate）。
    途中で失敗したらゲートを閉じたまま捨て、起動済みのワーカーは何もせず終わる。
  - 実行中の panic: 残りのワーカーはバリアで待ち続けるので、プロセスごと abort する。
*/

// 生ポインタのラッパー（共有バッファへの分割書き込み用）
struct SharedBuf<T> {
    data: *mut T,
    len: usize,
}

impl<T> Clone for SharedBuf<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SharedBuf<T> {}

// 各ワーカーは重ならない範囲にしか書き込まない（下記 SAFETY 参照）
unsafe impl<T: Send> Send for SharedBuf<T> {}
unsafe impl<T: Send> Sync for SharedBuf<T> {}

impl<T> SharedBuf<T> {
    fn new(slice: &mut [T]) -> Self {
        SharedBuf { data: slice.as_mut_ptr(), len: slice.len() }
    }

    /// # Safety
    /// 返したスライスを使っている間、どのワーカーもこのバッファに書き込まないこと
    unsafe fn as_slice<'a>(self) -> &'a [T] {
        unsafe { std::slice::from_raw_parts(self.data, self.len) }
    }

    /// # Safety
    /// `range` は他のワーカーの範囲と重ならず、同時に `as_slice` で読まれていないこと
    unsafe fn slice_mut<'a>(self, range: Range<usize>) -> &'a mut [T] {
        assert!(range.start <= range.end && range.end <= self.len);
        unsafe { std::slice::from_raw_parts_mut(self.data.add(range.start), range.len()) }
    }
}

/// 全ワーカーで共有する実行コンテキスト
struct Team<'a> {
    dim: usize,
    points: &'a [i32],
    means: SharedBuf<i32>,
    clusters: SharedBuf<u32>,
    barrier: Barrier,
    modified: OrReduction,
    point_part: Partitioner,
    mean_part: Partitioner,
    start: Instant,
}

/// 起動ゲート: 全ワーカーの起動が確定してから一斉に開ける
///
/// 開かずに drop すると、待っているワーカーには拒否として伝わる。
struct StartGate {
    tickets: Vec<Sender<()>>,
}

impl StartGate {
    fn new() -> Self {
        StartGate { tickets: Vec::new() }
    }

    /// ワーカー1人分の受け取り口
    fn ticket(&mut self) -> Receiver<()> {
        let (tx, rx) = mpsc::channel();
        self.tickets.push(tx);
        rx
    }

    fn open(self) {
        for tx in &self.tickets {
            // 受け取り側が既に終わっていても問題ない
            let _ = tx.send(());
        }
    }
}

/// ゲートが開くまで待つ。閉じたまま捨てられたら false。
fn admitted(ticket: &Receiver<()>) -> bool {
    ticket.recv().is_ok()
}

/// ワーカーごとの結果。時間はワーカー0だけが記録する。
struct WorkerOutcome {
    iterations: usize,
    times: Vec<Duration>,
}

pub fn barrier_parallel(dataset: &mut Dataset, threads: usize, schedule: Schedule) -> Result<RunSummary> {
    let threads = threads.max(1);
    let num_points = dataset.num_points();
    let num_means = dataset.num_means();
    let Dataset { dim, points, means, clusters } = dataset;

    let team = Team {
        dim: *dim,
        points: points.as_slice(),
        means: SharedBuf::new(means),
        clusters: SharedBuf::new(clusters),
        barrier: Barrier::new(threads),
        modified: OrReduction::default(),
        point_part: Partitioner::new(num_points, threads, schedule),
        mean_part: Partitioner::new(num_means, threads, schedule),
        start: Instant::now(),
    };
    debug!(threads, ?schedule, num_points, num_means, "starting worker team");

    let outcomes = thread::scope(|scope| {
        let mut gate = StartGate::new();
        let mut handles = Vec::with_capacity(threads);
        for id in 0..threads {
            let team = &team;
            let ticket = gate.ticket();
            let spawned = thread::Builder::new()
                .name(format!("kmeans-worker-{}", id))
                .spawn_scoped(scope, move || {
                    if !admitted(&ticket) {
                        return None;
                    }
                    Some(run_worker(id, team))
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    error!(worker = id, %source, "failed to spawn worker");
                    // gate はここで drop され、起動済みのワーカーはバリアに入らずに終わる
                    return Err(KMeansError::WorkerSpawn(source));
                }
            }
        }
        gate.open();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(Some(outcome)) => Ok(outcome),
                Ok(None) | Err(_) => Err(KMeansError::WorkerPanicked),
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let total = team.start.elapsed();
    let mut outcomes = outcomes.into_iter();
    let leader = outcomes.next().ok_or(KMeansError::WorkerPanicked)?;
    debug_assert!(outcomes.all(|o| o.iterations == leader.iterations));

    Ok(RunSummary {
        iterations: leader.iterations,
        iteration_times: leader.times,
        total,
    })
}

/// 1人でも途中で panic すると残りはバリアから抜けられないので、プロセスを止める
fn run_worker(id: usize, team: &Team<'_>) -> WorkerOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| worker(id, team))) {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(worker = id, "worker panicked, aborting");
            process::abort();
        }
    }
}

fn worker(id: usize, team: &Team<'_>) -> WorkerOutcome {
    let dim = team.dim;
    let mut acc = MeanAccumulator::new(dim);
    let mut outcome = WorkerOutcome { iterations: 0, times: Vec::new() };
    let mut iter_start = team.start;

    loop {
        // 全員が前の反復を終えてから入る
        team.barrier.wait();

        if id == 0 {
            let now = Instant::now();
            let elapsed = now - iter_start;
            iter_start = now;
            info!(iteration = outcome.iterations, elapsed_secs = elapsed.as_secs_f64(), "iteration");
            outcome.times.push(elapsed);

            team.modified.reset();
            team.point_part.reset();
            team.mean_part.reset();
        }

        team.barrier.wait();

        // 割り当てフェーズ
        let mut changed = false;
        {
            // SAFETY: 重心への書き込みは更新フェーズのみ。前の反復の更新は最初のバリアで完了済み。
            let means = unsafe { team.means.as_slice() };
            team.point_part.for_each_chunk(id, |range| {
                // SAFETY: 点インデックスの範囲はワーカー間で重ならない。
                // 割り当て表の全体読み取りは次のバリアの後（更新フェーズ）だけ。
                let slots = unsafe { team.clusters.slice_mut(range.clone()) };
                for (i, slot) in range.zip(slots.iter_mut()) {
                    let point = &team.points[i * dim..(i + 1) * dim];
                    changed |= assign_point(point, means, dim, slot);
                }
            });
        }
        team.modified.contribute(changed);

        // 割り当て表とリダクションの確定
        team.barrier.wait();

        // 更新フェーズ（nowait）
        {
            // SAFETY: 割り当て表への書き込みは割り当てフェーズのみで、直前のバリアで完了済み。
            // 次の割り当ては次の反復の最初のバリアを越えるまで始まらない。
            let clusters = unsafe { team.clusters.as_slice() };
            team.mean_part.for_each_chunk(id, |range| {
                for k in range {
                    // SAFETY: 重心インデックスの範囲はワーカー間で重ならない。
                    // このフェーズ中に重心を読むワーカーはいない。
                    let mean = unsafe { team.means.slice_mut(k * dim..(k + 1) * dim) };
                    if acc.update_mean(k as u32, team.points, clusters, mean) == 0 {
                        debug!(mean = k, "empty cluster left unchanged");
                    }
                }
            });
        }

        outcome.iterations += 1;

        // フラグは次の反復の2つ目のバリアの前までリセットされない
        if !team.modified.get() {
            break;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_gate_keeps_workers_out_of_the_barrier() {
        // 3人分のバリアに2人しか来ない状況でも、ゲートを閉じたまま捨てればデッドロックしない
        let barrier = Barrier::new(3);
        let mut gate = StartGate::new();
        let results: Vec<bool> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let ticket = gate.ticket();
                    let barrier = &barrier;
                    scope.spawn(move || {
                        if !admitted(&ticket) {
                            return false;
                        }
                        barrier.wait();
                        true
                    })
                })
                .collect();
            drop(gate);
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results, vec![false, false]);
    }

    #[test]
    fn open_gate_admits_every_worker() {
        let barrier = Barrier::new(3);
        let mut gate = StartGate::new();
        let passed: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|_| {
                    let ticket = gate.ticket();
                    let barrier = &barrier;
                    scope.spawn(move || {
                        if !admitted(&ticket) {
                            return 0;
                        }
                        barrier.wait();
                        1
                    })
                })
                .collect();
            gate.open();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(passed, 3);
    }
}
