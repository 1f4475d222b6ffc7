/// 2つの D 次元ベクトル間の二乗距離
///
/// 差は i64 で計算し、合計は u64 で飽和加算する（巨大なグリッドでも折り返さない）。
#[inline(always)]
pub fn sq_dist(v1: &[i32], v2: &[i32]) -> u64 {
    debug_assert_eq!(v1.len(), v2.len());
    v1.iter().zip(v2).fold(0u64, |sum, (&a, &b)| {
        let diff = (i64::from(a) - i64::from(b)).unsigned_abs();
        sum.saturating_add(diff * diff)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_distance() {
        assert_eq!(sq_dist(&[0, 0], &[3, 4]), 25);
        assert_eq!(sq_dist(&[3, 4], &[0, 0]), 25);
        assert_eq!(sq_dist(&[7, -2, 5], &[7, -2, 5]), 0);
        assert_eq!(sq_dist(&[-1], &[1]), 4);
    }

    #[test]
    fn extreme_coordinates_do_not_wrap() {
        let d = sq_dist(&[i32::MIN], &[i32::MAX]);
        assert_eq!(d, (u32::MAX as u64) * (u32::MAX as u64));
    }
}
