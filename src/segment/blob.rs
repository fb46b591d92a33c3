use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::filter::median_filter;
use imageproc::point::Point;

/// 1ティック分の前景連結領域
///
/// 輪郭の点列・重心・面積を持つ。ティックをまたいだ同一性は持たない。
#[derive(Debug, Clone)]
pub struct Blob {
    pub contour: Vec<Point<i32>>,
    pub centroid: (f64, f64),
    pub area: f64,
}

/// メディアンフィルタでスペックルノイズを除去した前景マスクを返す
///
/// blob抽出と特徴抽出は同じ平滑化済みマスクを見る必要があるため、
/// 平滑化は輪郭抽出から分離してティックの先頭で一度だけ行う。
pub fn smooth_mask(mask: &GrayImage, median_kernel: u32) -> GrayImage {
    let radius = median_kernel / 2;
    if radius > 0 {
        median_filter(mask, radius, radius)
    } else {
        mask.clone()
    }
}

/// 平滑化済みマスクから、重心がフレーム内に収まるblobだけを抽出する
///
/// 各輪郭の面積重み付き重心を計算する。面積ゼロの退化輪郭は重心が
/// NaNになり、範囲チェックでここで弾かれる。
pub fn extract_blobs(mask: &GrayImage) -> Vec<Blob> {
    let (width, height) = mask.dimensions();
    let mut blobs = Vec::new();
    for contour in find_contours::<i32>(mask) {
        if contour.border_type != BorderType::Outer {
            continue;
        }
        let (area, cx, cy) = polygon_moments(&contour.points);
        if !in_bounds(cx, 0.0, width as f64) || !in_bounds(cy, 0.0, height as f64) {
            continue;
        }
        blobs.push(Blob {
            contour: contour.points,
            centroid: (cx, cy),
            area,
        });
    }
    blobs
}

fn in_bounds(value: f64, low: f64, high: f64) -> bool {
    value >= low && value <= high
}

/// シューレース公式による多角形の面積（絶対値）と重心
///
/// 面積ゼロのとき重心はNaNになる。呼び出し側の範囲チェックで除外される。
fn polygon_moments(points: &[Point<i32>]) -> (f64, f64, f64) {
    let n = points.len();
    let mut double_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let cross = p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
        double_area += cross;
        cx += (p.x + q.x) as f64 * cross;
        cy += (p.y + q.y) as f64 * cross;
    }
    let area = (double_area / 2.0).abs();
    (area, cx / (3.0 * double_area), cy / (3.0 * double_area))
}
