use std::sync::atomic::{AtomicBool, Ordering};

/// 論理和リダクション（収束フラグ）
///
/// 各ワーカーは自分の担当分の結果を `contribute` で1回だけ合成する。
/// OR は結合的・可換・冪等なので、書き込み順序は結果に影響しない。
/// `reset` と `get` の可視性はバリアで保証する前提（Relaxed で十分）。
#[derive(Debug)]
pub struct OrReduction {
    value: AtomicBool,
}

impl OrReduction {
    pub fn new(initial: bool) -> Self {
        OrReduction { value: AtomicBool::new(initial) }
    }

    pub fn reset(&self) {
        self.value.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn contribute(&self, local: bool) {
        if local {
            self.value.fetch_or(true, Ordering::Relaxed);
        }
    }

    pub fn get(&self) -> bool {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for OrReduction {
    // 最初の反復を必ず実行させるため true から始める
    fn default() -> Self {
        OrReduction::new(true)
    }
}
