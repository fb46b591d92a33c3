/// 検出器に渡す水平方向の探索窓
///
/// left はフレーム座標でのクロップ左端。検出器が返すクロップローカル座標を
/// フレーム座標へ戻すときに使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiWindow {
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl RoiWindow {
    /// クロップ矩形 (left, 0, width, height)
    pub fn rect(&self) -> (u32, u32, u32, u32) {
        (self.left, 0, self.width, self.height)
    }
}

/// 運動重心のx座標を中心に、フレーム幅へクランプした固定半幅の窓を選ぶ
///
/// 静止背景からの誤検出を減らしつつ検出コストを抑える。1ティックで窓の外へ
/// 大きく跳ぶ被写体は取り逃すが、検出は間引き実行でありデッドレコニングが
/// 隙間を埋めるため許容する。
pub fn select_roi(
    centroid_x: f64,
    half_width: u32,
    frame_width: u32,
    frame_height: u32,
) -> RoiWindow {
    let cx = centroid_x.round() as i64;
    let left = (cx - half_width as i64).clamp(0, frame_width as i64) as u32;
    let right = (cx + half_width as i64).clamp(0, frame_width as i64) as u32;
    RoiWindow {
        left,
        width: right.saturating_sub(left),
        height: frame_height,
    }
}
