use serde::Serialize;

use super::rules::CorrectionCandidate;
use crate::config::StabilizerConfig;

pub const ANALYZING_MESSAGE: &str = "Analyzing...";
pub const HOLD_MESSAGE: &str = "Focus on deep breaths. You're stable.";

/// ユーザーに現在伝えている提案
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// まだチェックポイントに達していない
    Analyzing,
    /// 修正なし
    Hold,
    Correct(CorrectionCandidate),
}

impl Suggestion {
    pub fn message(&self) -> &'static str {
        match self {
            Suggestion::Analyzing => ANALYZING_MESSAGE,
            Suggestion::Hold => HOLD_MESSAGE,
            Suggestion::Correct(c) => c.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilizedSuggestion {
    /// メッセージが変わったティックでのみ true
    pub changed: bool,
    pub suggestion: Suggestion,
}

/// 表示する提案を `window` ティックの間固定する
///
/// ティックごとにカウンタを進め、`window` に達したらそのティックの最優先候補
/// (なければ [`Suggestion::Hold`]) を安定した提案とし、カウンタを戻す。
pub struct SuggestionStabilizer {
    window: u32,
    counter: u32,
    stable: Suggestion,
}

impl SuggestionStabilizer {
    /// `window` が 0 なら 1 として扱う
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            counter: 0,
            stable: Suggestion::Analyzing,
        }
    }

    pub fn from_config(config: &StabilizerConfig) -> Self {
        Self::new(config.window)
    }

    pub fn tick(&mut self, top: Option<&CorrectionCandidate>) -> StabilizedSuggestion {
        self.counter += 1;
        if self.counter < self.window {
            return self.unchanged();
        }
        self.counter = 0;

        let next = match top {
            Some(c) => Suggestion::Correct(c.clone()),
            None => Suggestion::Hold,
        };
        let changed = next.message() != self.stable.message();
        if changed {
            tracing::debug!(from = self.stable.message(), to = next.message(), "suggestion changed");
        }
        self.stable = next;

        StabilizedSuggestion {
            changed,
            suggestion: self.stable.clone(),
        }
    }

    /// カウンタを進めずに現在の提案を返す
    pub fn unchanged(&self) -> StabilizedSuggestion {
        StabilizedSuggestion {
            changed: false,
            suggestion: self.stable.clone(),
        }
    }

    pub fn stable(&self) -> &Suggestion {
        &self.stable
    }

    pub fn reset(&mut self) {
        self.counter = 0;
        self.stable = Suggestion::Analyzing;
    }
}
