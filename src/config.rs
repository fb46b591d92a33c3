use anyhow::{bail, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub blob: BlobConfig,
    #[serde(default)]
    pub roi: RoiConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub feature: FeatureConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlobConfig {
    /// マスク平滑化のメディアンフィルタ核サイズ（奇数、640x480基準で15px程度）
    #[serde(default = "default_median_kernel")]
    pub median_kernel: u32,
    /// 運動重心の計算で最大面積blobに与える重み
    #[serde(default = "default_dominant_weight")]
    pub dominant_weight: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoiConfig {
    /// 運動重心を中心とした探索窓の半幅（ピクセル）
    #[serde(default = "default_roi_half_width")]
    pub half_width: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    /// 検出器を実行するティック間隔（Nティックに1回）
    #[serde(default = "default_detect_interval")]
    pub detect_interval: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureConfig {
    /// 特徴ベクトルのビン数。各ヒストグラムは bins/2 ビンへ量子化される
    #[serde(default = "default_bins")]
    pub bins: usize,
}

fn default_median_kernel() -> u32 { 15 }
fn default_dominant_weight() -> u32 { 3 }
fn default_roi_half_width() -> u32 { 125 }
fn default_detect_interval() -> u64 { 4 }
fn default_bins() -> usize { 10 }

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            median_kernel: default_median_kernel(),
            dominant_weight: default_dominant_weight(),
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            half_width: default_roi_half_width(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            detect_interval: default_detect_interval(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            bins: default_bins(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blob: BlobConfig::default(),
            roi: RoiConfig::default(),
            tracker: TrackerConfig::default(),
            feature: FeatureConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// ティックループ開始前に不正な設定を弾く
    pub fn validate(&self) -> Result<()> {
        if self.blob.median_kernel == 0 || self.blob.median_kernel % 2 == 0 {
            bail!(
                "blob.median_kernel must be a positive odd number, got {}",
                self.blob.median_kernel
            );
        }
        if self.blob.dominant_weight == 0 {
            bail!("blob.dominant_weight must be at least 1");
        }
        if self.roi.half_width == 0 {
            bail!("roi.half_width must be positive");
        }
        if self.tracker.detect_interval == 0 {
            bail!("tracker.detect_interval must be at least 1");
        }
        if self.feature.bins < 2 {
            bail!("feature.bins must be at least 2, got {}", self.feature.bins);
        }
        Ok(())
    }
}
