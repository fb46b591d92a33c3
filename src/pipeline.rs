use anyhow::{Context, Result};
use image::{imageops, GrayImage, RgbImage};
use log::{debug, trace};

use crate::config::Config;
use crate::feature::compute_feature_vector;
use crate::roi::{select_roi, RoiWindow};
use crate::segment::{extract_blobs, motion_centroid, smooth_mask};
use crate::tracker::{closest_to, filter_nested, BBox, SubjectTracker};

/// フレーム供給元。None はストリーム終端（エラーではない正常な終了条件）
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// 背景差分。フレームと同サイズの前景マスク（非ゼロ=前景）を返す
pub trait ForegroundSegmenter {
    fn segment(&mut self, frame: &RgbImage) -> Result<GrayImage>;
}

/// 人物検出器。渡されたROIクロップに対しクロップローカル座標の候補枠を返す
pub trait SubjectDetector {
    fn detect(&mut self, region: &RgbImage) -> Result<Vec<BBox>>;
}

/// 分類器が返す現時点の最良マッチ
#[derive(Debug, Clone, PartialEq)]
pub struct ActionMatch {
    pub label: String,
    pub score: f64,
}

/// 特徴ベクトル列を消費する不透明な分類器アダプタ
///
/// ティックごとに observe で特徴ベクトルを受け取り、best_match で
/// それまでの最良ラベルとスコアを返す。
pub trait ActionClassifier {
    fn observe(&mut self, features: &[f64]);
    fn best_match(&self) -> Option<ActionMatch>;
}

/// 1ティック分の読み取り専用スナップショット（可視化などの外部協力者向け）
#[derive(Debug, Clone)]
pub struct TickSnapshot {
    pub motion_centroid: Option<(f64, f64)>,
    /// 保持中の生の融合枠
    pub tracked_box: BBox,
    /// 消費向けに縮小した枠。特徴抽出もこちらを使う
    pub display_box: BBox,
    pub features: Option<Vec<f64>>,
    /// 平滑化済みの前景マスク。blob抽出と特徴抽出が見たものと同一
    pub mask: GrayImage,
}

/// フレーム単位の単一被写体追跡パイプライン
///
/// 1ティック = 1フレーム。処理順は固定:
/// 背景差分 → blob抽出 → 運動重心 → ROI → （検出ティックなら）検出と融合 →
/// 特徴抽出 → 分類器へ受け渡し。
pub struct Pipeline<S, D, C> {
    config: Config,
    segmenter: S,
    detector: D,
    classifier: C,
    tracker: SubjectTracker,
    frame_pos: u64,
}

impl<S, D, C> Pipeline<S, D, C>
where
    S: ForegroundSegmenter,
    D: SubjectDetector,
    C: ActionClassifier,
{
    /// 設定を検証してパイプラインを組み立てる。不正な設定はここで失敗する
    pub fn new(config: Config, segmenter: S, detector: D, classifier: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            segmenter,
            detector,
            classifier,
            tracker: SubjectTracker::new(),
            frame_pos: 0,
        })
    }

    /// 処理済みフレーム数
    pub fn frame_pos(&self) -> u64 {
        self.frame_pos
    }

    pub fn tracker(&self) -> &SubjectTracker {
        &self.tracker
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    // 検出コストを均すため、検出器は detect_interval ティックに1回だけ走る
    fn is_detection_tick(&self) -> bool {
        self.frame_pos % self.config.tracker.detect_interval == 0
    }

    /// 1フレーム処理してスナップショットを返す
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<TickSnapshot> {
        let (frame_width, frame_height) = frame.dimensions();
        let raw_mask = self
            .segmenter
            .segment(frame)
            .context("foreground segmentation failed")?;

        // スペックル除去後のマスクを blob 抽出と特徴抽出の両方で使う
        let mask = smooth_mask(&raw_mask, self.config.blob.median_kernel);
        let blobs = extract_blobs(&mask);
        let centroid = motion_centroid(&blobs, self.config.blob.dominant_weight);
        trace!(
            "tick {}: {} blobs, centroid {:?}",
            self.frame_pos,
            blobs.len(),
            centroid
        );

        match centroid {
            Some(c) if self.is_detection_tick() => {
                let roi = select_roi(c.0, self.config.roi.half_width, frame_width, frame_height);
                self.detect_and_fuse(frame, &roi, c)?;
            }
            // 重心なし、または検出ティック以外 → デッドレコニングのみ
            _ => self.tracker.advance(),
        }

        let tracked_box = self.tracker.bbox();
        let display_box = tracked_box.shrunk();
        let features = if tracked_box.area() > 0 {
            let vector = compute_feature_vector(&mask, &display_box, self.config.feature.bins);
            self.classifier.observe(&vector);
            Some(vector)
        } else {
            None
        };

        self.frame_pos += 1;
        Ok(TickSnapshot {
            motion_centroid: centroid,
            tracked_box,
            display_box,
            features,
            mask,
        })
    }

    fn detect_and_fuse(
        &mut self,
        frame: &RgbImage,
        roi: &RoiWindow,
        centroid: (f64, f64),
    ) -> Result<()> {
        if roi.width == 0 {
            self.tracker.advance();
            return Ok(());
        }

        let crop = imageops::crop_imm(frame, roi.left, 0, roi.width, roi.height).to_image();
        let candidates = self
            .detector
            .detect(&crop)
            .context("subject detection failed")?;

        // 入れ子の重複検出を落とし、生き残りをフレーム座標へ戻す
        let survivors: Vec<BBox> = filter_nested(&candidates)
            .iter()
            .map(|b| b.offset_x(roi.left as i32))
            .collect();

        match closest_to(&survivors, centroid) {
            Some(fused) => {
                debug!(
                    "tick {}: fused {} candidate(s) into {:?}",
                    self.frame_pos,
                    survivors.len(),
                    fused
                );
                self.tracker.observe(fused);
            }
            // 検出なしのティックも予測ベクトルで橋渡しする
            None => self.tracker.advance(),
        }
        Ok(())
    }

    /// ストリーム終端までフレームを処理し、分類器の最終的な最良マッチを返す
    pub fn run(&mut self, source: &mut impl FrameSource) -> Result<Option<ActionMatch>> {
        while let Some(frame) = source.next_frame().context("frame source failed")? {
            self.process_frame(&frame)?;
        }
        debug!("stream exhausted after {} frames", self.frame_pos);
        Ok(self.classifier.best_match())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::collections::VecDeque;

    /// フレーム内容に関係なく固定マスクを返す背景差分スタブ
    struct MaskSegmenter {
        mask: GrayImage,
    }

    impl ForegroundSegmenter for MaskSegmenter {
        fn segment(&mut self, _frame: &RgbImage) -> Result<GrayImage> {
            Ok(self.mask.clone())
        }
    }

    /// 呼び出しごとに台本どおりの候補を返す検出器スタブ
    struct ScriptedDetector {
        responses: VecDeque<Vec<BBox>>,
        calls: usize,
    }

    impl ScriptedDetector {
        fn new(responses: Vec<Vec<BBox>>) -> Self {
            Self {
                responses: responses.into(),
                calls: 0,
            }
        }
    }

    impl SubjectDetector for ScriptedDetector {
        fn detect(&mut self, _region: &RgbImage) -> Result<Vec<BBox>> {
            self.calls += 1;
            Ok(self.responses.pop_front().unwrap_or_default())
        }
    }

    /// 呼ばれたら失敗する検出器スタブ
    struct UnreachableDetector;

    impl SubjectDetector for UnreachableDetector {
        fn detect(&mut self, _region: &RgbImage) -> Result<Vec<BBox>> {
            panic!("detector must not run without a motion centroid");
        }
    }

    /// 受け取った特徴ベクトルを記録する分類器スタブ
    struct RecordingClassifier {
        observed: Vec<Vec<f64>>,
    }

    impl RecordingClassifier {
        fn new() -> Self {
            Self {
                observed: Vec::new(),
            }
        }
    }

    impl ActionClassifier for RecordingClassifier {
        fn observe(&mut self, features: &[f64]) {
            self.observed.push(features.to_vec());
        }

        fn best_match(&self) -> Option<ActionMatch> {
            if self.observed.is_empty() {
                None
            } else {
                Some(ActionMatch {
                    label: "wave".to_string(),
                    score: self.observed.len() as f64,
                })
            }
        }
    }

    struct VecSource {
        frames: VecDeque<RgbImage>,
    }

    impl FrameSource for VecSource {
        fn next_frame(&mut self) -> Result<Option<RgbImage>> {
            Ok(self.frames.pop_front())
        }
    }

    fn mask_with_square(cx: u32, cy: u32, side: u32) -> GrayImage {
        let mut mask = GrayImage::new(640, 480);
        let half = side / 2;
        for y in (cy - half)..(cy + half) {
            for x in (cx - half)..(cx + half) {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    fn test_config(detect_interval: u64) -> Config {
        let mut config = Config::default();
        // keep blob extraction exact for synthetic masks
        config.blob.median_kernel = 1;
        config.tracker.detect_interval = detect_interval;
        config
    }

    fn frame() -> RgbImage {
        RgbImage::new(640, 480)
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = Config::default();
        config.feature.bins = 1;
        let result = Pipeline::new(
            config,
            MaskSegmenter {
                mask: GrayImage::new(640, 480),
            },
            ScriptedDetector::new(vec![]),
            RecordingClassifier::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_fusion_prefers_box_closest_to_centroid() {
        // blob centered at (320, 240) -> ROI left edge at 195
        let segmenter = MaskSegmenter {
            mask: mask_with_square(320, 240, 30),
        };
        // crop-local candidates: far one centered at (10, 100) in the crop,
        // near one centered at (125, 240) = frame (320, 240)
        let far = BBox::new(0, 60, 20, 80);
        let near = BBox::new(105, 200, 40, 80);
        let detector = ScriptedDetector::new(vec![vec![far, near]]);

        let mut pipeline = Pipeline::new(
            test_config(1),
            segmenter,
            detector,
            RecordingClassifier::new(),
        )
        .unwrap();

        let snapshot = pipeline.process_frame(&frame()).unwrap();
        assert_eq!(snapshot.tracked_box, near.offset_x(195));
        let (cx, cy) = snapshot.motion_centroid.unwrap();
        assert!((cx - 320.0).abs() < 1.0);
        assert!((cy - 240.0).abs() < 1.0);
    }

    #[test]
    fn test_dead_reckoning_bridges_missing_detections() {
        let segmenter = MaskSegmenter {
            mask: mask_with_square(320, 240, 30),
        };
        // one detection, then the detector goes quiet
        let detector = ScriptedDetector::new(vec![vec![BBox::new(105, 200, 40, 80)]]);
        let mut pipeline = Pipeline::new(
            test_config(1),
            segmenter,
            detector,
            RecordingClassifier::new(),
        )
        .unwrap();

        pipeline.process_frame(&frame()).unwrap();
        let origin = pipeline.tracker().bbox();
        // first observation from the zero box gives prediction (1, 1)
        assert_eq!(pipeline.tracker().prediction(), (1, 1));

        for _ in 0..3 {
            pipeline.process_frame(&frame()).unwrap();
        }
        let advanced = pipeline.tracker().bbox();
        assert_eq!(advanced.x, origin.x + 3);
        assert_eq!(advanced.y, origin.y + 3);
    }

    #[test]
    fn test_detector_runs_on_cadence_only() {
        let segmenter = MaskSegmenter {
            mask: mask_with_square(320, 240, 30),
        };
        let detector = ScriptedDetector::new(vec![]);
        let mut pipeline = Pipeline::new(
            test_config(4),
            segmenter,
            detector,
            RecordingClassifier::new(),
        )
        .unwrap();

        for _ in 0..8 {
            pipeline.process_frame(&frame()).unwrap();
        }
        // ticks 0 and 4 only
        assert_eq!(pipeline.detector.calls, 2);
    }

    #[test]
    fn test_no_centroid_skips_detection() {
        let segmenter = MaskSegmenter {
            mask: GrayImage::new(640, 480),
        };
        let mut pipeline = Pipeline::new(
            test_config(1),
            segmenter,
            UnreachableDetector,
            RecordingClassifier::new(),
        )
        .unwrap();

        let snapshot = pipeline.process_frame(&frame()).unwrap();
        assert!(snapshot.motion_centroid.is_none());
        assert_eq!(snapshot.tracked_box.area(), 0);
        assert!(snapshot.features.is_none());
    }

    #[test]
    fn test_features_flow_to_classifier() {
        let segmenter = MaskSegmenter {
            mask: mask_with_square(320, 240, 30),
        };
        let detector = ScriptedDetector::new(vec![vec![BBox::new(105, 200, 40, 80)]]);
        let mut pipeline = Pipeline::new(
            test_config(1),
            segmenter,
            detector,
            RecordingClassifier::new(),
        )
        .unwrap();

        let snapshot = pipeline.process_frame(&frame()).unwrap();
        let features = snapshot.features.unwrap();
        assert_eq!(features.len(), 10);
        let pi_sum: f64 = features[..5].iter().sum();
        assert!((pi_sum - 1.0).abs() < 1e-9);
        assert_eq!(pipeline.classifier().observed.len(), 1);
        // display box is the shrunk copy, stored track keeps the raw box
        assert_eq!(snapshot.display_box, snapshot.tracked_box.shrunk());
    }

    #[test]
    fn test_speckle_noise_does_not_perturb_features() {
        let clean = mask_with_square(320, 240, 30);
        let mut noisy = clean.clone();
        // lone foreground pixel far from the subject; a 15px median
        // filter removes it before both blob and feature extraction
        noisy.put_pixel(50, 230, Luma([255]));

        let mut config = Config::default();
        config.tracker.detect_interval = 1;
        let script = vec![vec![BBox::new(105, 200, 40, 80)]];

        let run = |mask: GrayImage| {
            let mut pipeline = Pipeline::new(
                config.clone(),
                MaskSegmenter { mask },
                ScriptedDetector::new(script.clone()),
                RecordingClassifier::new(),
            )
            .unwrap();
            pipeline.process_frame(&frame()).unwrap()
        };

        let clean_snapshot = run(clean);
        let noisy_snapshot = run(noisy);

        assert!(clean_snapshot.features.is_some());
        assert_eq!(noisy_snapshot.features, clean_snapshot.features);
        assert_eq!(noisy_snapshot.tracked_box, clean_snapshot.tracked_box);
        // the snapshot carries the smoothed mask, so the speckle is gone
        assert_eq!(noisy_snapshot.mask.get_pixel(50, 230).0[0], 0);
    }

    #[test]
    fn test_run_until_stream_exhausted() {
        let segmenter = MaskSegmenter {
            mask: mask_with_square(320, 240, 30),
        };
        let detector = ScriptedDetector::new(vec![vec![BBox::new(105, 200, 40, 80)]]);
        let mut pipeline = Pipeline::new(
            test_config(1),
            segmenter,
            detector,
            RecordingClassifier::new(),
        )
        .unwrap();

        let mut source = VecSource {
            frames: (0..5).map(|_| frame()).collect(),
        };
        let result = pipeline.run(&mut source).unwrap();
        assert_eq!(pipeline.frame_pos(), 5);
        let matched = result.unwrap();
        assert_eq!(matched.label, "wave");
        assert_eq!(matched.score, 5.0);
    }
}
