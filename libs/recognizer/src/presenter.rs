//! Per-model bar indicators for the latest probability vector

use crate::config::ModelConfig;
use crate::normalize::{ProbabilityVector, NUM_CLASSES};
use serde::{Deserialize, Serialize};

/// Which bars are marked as the top prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HighlightPolicy {
    /// Only the lowest index holding the maximum wins
    #[default]
    FirstIndex,
    /// Every class exactly equal to the maximum wins
    AllMaxima,
}

/// Display state of one class bar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bar {
    /// Fill height as a percentage of the bar's full height
    pub magnitude: f32,
    pub is_top: bool,
}

/// Bars for one model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDisplay {
    key: String,
    title: String,
    bars: [Bar; NUM_CLASSES],
}

impl ModelDisplay {
    pub fn new(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            bars: [Bar::default(); NUM_CLASSES],
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn bars(&self) -> &[Bar; NUM_CLASSES] {
        &self.bars
    }

    /// Classes currently marked as winning
    pub fn winners(&self) -> Vec<usize> {
        self.bars
            .iter()
            .enumerate()
            .filter(|(_, bar)| bar.is_top)
            .map(|(class, _)| class)
            .collect()
    }

    /// Overwrite every bar from `probs`
    pub fn present(&mut self, probs: &ProbabilityVector, policy: HighlightPolicy) {
        let top = probs.top();
        let first = probs.argmax();
        for (class, bar) in self.bars.iter_mut().enumerate() {
            let p = probs.get(class);
            bar.magnitude = p * 100.0;
            bar.is_top = match policy {
                HighlightPolicy::FirstIndex => class == first,
                HighlightPolicy::AllMaxima => p == top,
            };
        }
    }

    pub fn clear(&mut self) {
        self.bars = [Bar::default(); NUM_CLASSES];
    }

    pub fn is_cleared(&self) -> bool {
        self.bars.iter().all(|bar| *bar == Bar::default())
    }
}

/// Display state for every configured model, in configuration order
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBoard {
    displays: Vec<ModelDisplay>,
    policy: HighlightPolicy,
}

impl PredictionBoard {
    pub fn new(models: &[ModelConfig], policy: HighlightPolicy) -> Self {
        Self {
            displays: models.iter().map(|m| ModelDisplay::new(&m.key, &m.title)).collect(),
            policy,
        }
    }

    pub fn displays(&self) -> &[ModelDisplay] {
        &self.displays
    }

    pub fn display(&self, key: &str) -> Option<&ModelDisplay> {
        self.displays.iter().find(|d| d.key == key)
    }

    /// Replace the bars of model `key`; returns false for an unknown key
    pub fn present(&mut self, key: &str, probs: &ProbabilityVector) -> bool {
        let policy = self.policy;
        match self.displays.iter_mut().find(|d| d.key == key) {
            Some(display) => {
                display.present(probs, policy);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for display in &mut self.displays {
            display.clear();
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.displays.iter().all(ModelDisplay::is_cleared)
    }
}
