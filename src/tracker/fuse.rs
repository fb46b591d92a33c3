use std::cmp::Ordering;

use super::bbox::BBox;

/// 他の候補に完全に含まれる候補を除去し、極大な枠だけを残す
///
/// マルチスケール検出器が出す入れ子の重複検出を落とす。再適用しても
/// 結果は変わらない（冪等）。
pub fn filter_nested(candidates: &[BBox]) -> Vec<BBox> {
    candidates
        .iter()
        .enumerate()
        .filter(|(i, r)| {
            !candidates
                .iter()
                .enumerate()
                .any(|(j, other)| j != *i && other.contains(r))
        })
        .map(|(_, r)| *r)
        .collect()
}

/// 中心が point にユークリッド距離で最も近い候補を選ぶ
///
/// 検出器の見た目ベースの候補を運動重心と突き合わせる融合規則。
/// シーン内の他の場所に出た誤検出を抑える。
pub fn closest_to(candidates: &[BBox], point: (f64, f64)) -> Option<BBox> {
    candidates.iter().copied().min_by(|a, b| {
        distance_sq(a.center(), point)
            .partial_cmp(&distance_sq(b.center(), point))
            .unwrap_or(Ordering::Equal)
    })
}

// 大小比較だけなので平方根は取らない
fn distance_sq(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}
