use std::cmp::Ordering;

use super::blob::Blob;

/// blob重心の重み付き平均としてシーンの運動重心を求める
///
/// 最大面積のblob（実際の被写体である可能性が高い）の重心を weight 倍で
/// 数え、残りは1倍で数える:
/// `(W·dominant + Σ others) / (N − 1 + W)`
/// 小さなblobは影やノイズの断片であることが多く、推定を乱すだけに留める。
/// blobがひとつもなければ None（そのティックの重心は未定義）。
pub fn motion_centroid(blobs: &[Blob], dominant_weight: u32) -> Option<(f64, f64)> {
    if blobs.is_empty() {
        return None;
    }

    let dominant = blobs
        .iter()
        .max_by(|a, b| a.area.partial_cmp(&b.area).unwrap_or(Ordering::Equal))?;

    let weight = dominant_weight.max(1) as f64;
    let mut sum_x = (weight - 1.0) * dominant.centroid.0;
    let mut sum_y = (weight - 1.0) * dominant.centroid.1;
    for blob in blobs {
        sum_x += blob.centroid.0;
        sum_y += blob.centroid.1;
    }
    let denom = blobs.len() as f64 + weight - 1.0;
    Some((sum_x / denom, sum_y / denom))
}
