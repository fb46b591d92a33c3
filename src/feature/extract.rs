use image::GrayImage;

use super::histogram::{quantize, round_to_ten, sum_to_one};
use crate::tracker::BBox;

/// 追跡枠まわりのシルエットを固定長の形状記述子へ縮約する
///
/// `hist_pi[i]`    = マスク行 `yOffset + i` の前景画素数（枠の縦範囲を走査）
/// `hist_theta[j]` = マスク列 `xOffset + j` の前景画素数（枠の横範囲を走査）
///
/// 走査長は枠の高さ・幅を10の倍数へ丸めたもの。各ヒストグラムを合計1に
/// 正規化して bins/2 ビンへ量子化し、連結したものを返す（長さ 2·(bins/2)）。
/// ティックをまたぐ状態は持たない。
pub fn compute_feature_vector(mask: &GrayImage, bbox: &BBox, bins: usize) -> Vec<f64> {
    let half_bins = bins / 2;

    let pi_len = round_to_ten(bbox.height.max(0) as u32);
    let theta_len = round_to_ten(bbox.width.max(0) as u32);
    let y_offset = bbox.y.max(0) as u32;
    let x_offset = bbox.x.max(0) as u32;

    let mut hist_pi: Vec<f64> = (0..pi_len)
        .map(|i| row_foreground_count(mask, y_offset + i))
        .collect();
    let mut hist_theta: Vec<f64> = (0..theta_len)
        .map(|j| col_foreground_count(mask, x_offset + j))
        .collect();

    sum_to_one(&mut hist_pi);
    sum_to_one(&mut hist_theta);

    let mut features = quantize(&hist_pi, half_bins);
    features.extend(quantize(&hist_theta, half_bins));
    features
}

// マスク外にはみ出した行・列は前景0として数える
fn row_foreground_count(mask: &GrayImage, y: u32) -> f64 {
    let (width, height) = mask.dimensions();
    if y >= height {
        return 0.0;
    }
    (0..width).filter(|&x| mask.get_pixel(x, y).0[0] != 0).count() as f64
}

fn col_foreground_count(mask: &GrayImage, x: u32) -> f64 {
    let (width, height) = mask.dimensions();
    if x >= width {
        return 0.0;
    }
    (0..height).filter(|&y| mask.get_pixel(x, y).0[0] != 0).count() as f64
}
