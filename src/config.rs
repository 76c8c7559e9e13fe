use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub penalties: PenaltyConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// 設定値の検証エラー
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("min_confidence must be in [0, 1), got {0}")]
    MinConfidence(f32),

    #[error("{name} window must be at least 1")]
    ZeroWindow { name: &'static str },

    #[error("held_threshold must be in [0, 100], got {0}")]
    HeldThreshold(f32),

    #[error("stance ratios must satisfy 0 < min < max, got min={min}, max={max}")]
    StanceRatio { min: f32, max: f32 },

    #[error("max_corrections must be at least 1")]
    MaxCorrections,

    #[error("replay fps must be positive, got {0}")]
    ReplayFps(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// キーポイントを可視とみなす最小信頼度 (この値を超える必要あり)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// 表示する修正の最大数
    #[serde(default = "default_max_corrections")]
    pub max_corrections: usize,
    /// 腕の伸展チェックを有効にする
    #[serde(default)]
    pub check_arms: bool,
}

fn default_min_confidence() -> f32 { 0.35 }
fn default_max_corrections() -> usize { 3 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            max_corrections: default_max_corrections(),
            check_arms: false,
        }
    }
}

/// ルールの閾値 (距離はピクセル、角度は度)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// 足首間距離 / 腰幅 の下限
    #[serde(default = "default_stance_min_ratio")]
    pub stance_min_ratio: f32,
    /// 足首間距離 / 腰幅 の上限
    #[serde(default = "default_stance_max_ratio")]
    pub stance_max_ratio: f32,
    /// 左右足首の高さの差
    #[serde(default = "default_ankle_level_px")]
    pub ankle_level_px: f32,
    /// 膝角度の下限
    #[serde(default = "default_knee_min_angle")]
    pub knee_min_angle: f32,
    /// 左右腰の高さの差
    #[serde(default = "default_hip_level_px")]
    pub hip_level_px: f32,
    /// 肩中点と腰中点の水平ずれ
    #[serde(default = "default_spine_offset_px")]
    pub spine_offset_px: f32,
    /// 左右肩の高さの差
    #[serde(default = "default_shoulder_level_px")]
    pub shoulder_level_px: f32,
    /// 鼻と肩中点の水平ずれ
    #[serde(default = "default_head_offset_px")]
    pub head_offset_px: f32,
    /// 肘角度の下限
    #[serde(default = "default_arm_min_angle")]
    pub arm_min_angle: f32,
}

fn default_stance_min_ratio() -> f32 { 0.7 }
fn default_stance_max_ratio() -> f32 { 1.8 }
fn default_ankle_level_px() -> f32 { 15.0 }
fn default_knee_min_angle() -> f32 { 165.0 }
fn default_hip_level_px() -> f32 { 25.0 }
fn default_spine_offset_px() -> f32 { 30.0 }
fn default_shoulder_level_px() -> f32 { 20.0 }
fn default_head_offset_px() -> f32 { 25.0 }
fn default_arm_min_angle() -> f32 { 160.0 }

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            stance_min_ratio: default_stance_min_ratio(),
            stance_max_ratio: default_stance_max_ratio(),
            ankle_level_px: default_ankle_level_px(),
            knee_min_angle: default_knee_min_angle(),
            hip_level_px: default_hip_level_px(),
            spine_offset_px: default_spine_offset_px(),
            shoulder_level_px: default_shoulder_level_px(),
            head_offset_px: default_head_offset_px(),
            arm_min_angle: default_arm_min_angle(),
        }
    }
}

/// 重大度ごとの減点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    #[serde(default = "default_critical_penalty")]
    pub critical: u8,
    #[serde(default = "default_major_penalty")]
    pub major: u8,
    #[serde(default = "default_minor_penalty")]
    pub minor: u8,
}

fn default_critical_penalty() -> u8 { 15 }
fn default_major_penalty() -> u8 { 10 }
fn default_minor_penalty() -> u8 { 7 }

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            critical: default_critical_penalty(),
            major: default_major_penalty(),
            minor: default_minor_penalty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// スコア平均に使うフレーム数
    #[serde(default = "default_smoothing_window")]
    pub window: usize,
}

fn default_smoothing_window() -> usize { 20 }

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { window: default_smoothing_window() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// 提案を更新するまでのフレーム数
    #[serde(default = "default_stabilizer_window")]
    pub window: u32,
}

fn default_stabilizer_window() -> u32 { 15 }

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self { window: default_stabilizer_window() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// ホールドタイマーを進める平滑化スコアの下限
    #[serde(default = "default_held_threshold")]
    pub held_threshold: f32,
}

fn default_held_threshold() -> f32 { 70.0 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self { held_threshold: default_held_threshold() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// 起動時に音声ガイドを有効にする
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// タイムスタンプのないフレームの想定FPS
    #[serde(default = "default_replay_fps")]
    pub fps: f32,
}

fn default_replay_fps() -> f32 { 30.0 }

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { fps: default_replay_fps() }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// 読み込みに失敗したらデフォルト設定を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("{} not found, using default config", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}; using default config", e);
                Self::default()
            }
        }
    }

    /// 明示されたパスは厳密に読み込む。指定がなければ `fallback` を
    /// `load_or_default` で読む
    pub fn resolve<P: AsRef<Path>>(explicit: Option<&Path>, fallback: P) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default(fallback)),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_conf = self.engine.min_confidence;
        if !(0.0..1.0).contains(&min_conf) {
            return Err(ConfigError::MinConfidence(min_conf));
        }
        if self.engine.max_corrections == 0 {
            return Err(ConfigError::MaxCorrections);
        }
        if self.smoothing.window == 0 {
            return Err(ConfigError::ZeroWindow { name: "smoothing" });
        }
        if self.stabilizer.window == 0 {
            return Err(ConfigError::ZeroWindow { name: "stabilizer" });
        }
        let held = self.session.held_threshold;
        if !(0.0..=100.0).contains(&held) {
            return Err(ConfigError::HeldThreshold(held));
        }
        let (min, max) = (self.thresholds.stance_min_ratio, self.thresholds.stance_max_ratio);
        if !(min > 0.0 && min < max) {
            return Err(ConfigError::StanceRatio { min, max });
        }
        if !(self.replay.fps > 0.0) {
            return Err(ConfigError::ReplayFps(self.replay.fps));
        }
        Ok(())
    }
}
