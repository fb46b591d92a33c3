use log::trace;

use super::bbox::BBox;

/// 追跡の状態。初期状態は枠を持たない NoTrack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    NoTrack,
    Tracking,
}

/// 単一被写体のトラッカー
///
/// ティックをまたぐ状態は追跡枠と予測ベクトルのみ。どちらも融合ステップの
/// 中だけで更新される。新しい検出が無いティックは予測ベクトルによる
/// デッドレコニングで枠を進め、追跡を途切れさせない。
#[derive(Debug, Clone)]
pub struct SubjectTracker {
    state: TrackState,
    bbox: BBox,
    prediction: (i32, i32),
}

impl SubjectTracker {
    pub fn new() -> Self {
        Self {
            state: TrackState::NoTrack,
            bbox: BBox::default(),
            prediction: (0, 0),
        }
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    /// 保持中の生の融合枠。縮小は消費側が `BBox::shrunk` で行う
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// 単位ステップの予測ベクトル (dx, dy) ∈ {-1, 0, 1}²
    pub fn prediction(&self) -> (i32, i32) {
        self.prediction
    }

    /// 新しい融合結果で追跡枠を置き換える
    ///
    /// 予測ベクトルは直近2枠の変位の符号。新しい検出があったときだけ更新される。
    pub fn observe(&mut self, new_box: BBox) {
        self.prediction = (
            (new_box.x - self.bbox.x).signum(),
            (new_box.y - self.bbox.y).signum(),
        );
        trace!(
            "track observed at ({}, {}), prediction {:?}",
            new_box.x,
            new_box.y,
            self.prediction
        );
        self.bbox = new_box;
        self.state = TrackState::Tracking;
    }

    /// デッドレコニング: 予測ベクトルが非ゼロなら枠を1ステップ進め、
    /// ゼロならその場に保持する
    pub fn advance(&mut self) {
        if self.prediction != (0, 0) {
            self.bbox.x += self.prediction.0;
            self.bbox.y += self.prediction.1;
        }
    }
}

impl Default for SubjectTracker {
    fn default() -> Self {
        Self::new()
    }
}
