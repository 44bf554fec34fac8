//  Copyright 2026 Robert Zavalczki
//  Copyright 2013 Google Inc. All Rights Reserved.
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use crate::error::{Error, Result};

/// Selects the update rule applied by the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    Cbow,
    SkipGram,
}

impl ModelType {
    fn default_learning_rate(self) -> f32 {
        match self {
            ModelType::Cbow => 0.05,
            ModelType::SkipGram => 0.025,
        }
    }
}

/// Training configuration. See SPEC_FULL.md §6 for the option table this
/// struct mirrors.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub min_frequency: u64,
    pub threads: usize,
    pub window_size: usize,
    pub model_type: ModelType,
    pub use_hierarchical_softmax: bool,
    pub layer_size: usize,
    pub negative_samples: usize,
    pub down_sample_rate: f64,
    pub iterations: u64,
    pub initial_learning_rate: Option<f32>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            min_frequency: 5,
            threads: 1,
            window_size: 5,
            model_type: ModelType::Cbow,
            use_hierarchical_softmax: true,
            layer_size: 100,
            negative_samples: 0,
            down_sample_rate: 1e-3,
            iterations: 1,
            initial_learning_rate: None,
        }
    }
}

impl TrainingConfig {
    /// The learning rate to start training with: the configured override,
    /// or the type-specific default from SPEC_FULL.md §6.
    pub fn starting_alpha(&self) -> f32 {
        self.initial_learning_rate
            .unwrap_or_else(|| self.model_type.default_learning_rate())
    }

    /// Rejects configurations that the trainer cannot run at all. Internal
    /// invariant violations (e.g. a degenerate Huffman tree) are a separate
    /// concern handled where they occur; this only validates the options a
    /// caller controls directly.
    pub fn validate(&self) -> Result<()> {
        if !self.use_hierarchical_softmax && self.negative_samples == 0 {
            return Err(Error::InvalidConfig(
                "at least one of hierarchical softmax or negative sampling must be enabled"
                    .to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(Error::InvalidConfig(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.layer_size == 0 {
            return Err(Error::InvalidConfig(
                "layer_size must be positive".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(Error::InvalidConfig(
                "window_size must be positive".to_string(),
            ));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_neither_hs_nor_negative_sampling() {
        let config = TrainingConfig {
            use_hierarchical_softmax: false,
            negative_samples: 0,
            ..TrainingConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn accepts_negative_sampling_alone() {
        let config = TrainingConfig {
            use_hierarchical_softmax: false,
            negative_samples: 5,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_iterations_and_zero_dims() {
        assert!(
            TrainingConfig {
                iterations: 0,
                ..TrainingConfig::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            TrainingConfig {
                layer_size: 0,
                ..TrainingConfig::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            TrainingConfig {
                window_size: 0,
                ..TrainingConfig::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            TrainingConfig {
                threads: 0,
                ..TrainingConfig::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn default_learning_rate_matches_model_type() {
        let cbow = TrainingConfig::default();
        assert_eq!(cbow.starting_alpha(), 0.05);
        let skip_gram = TrainingConfig {
            model_type: ModelType::SkipGram,
            ..TrainingConfig::default()
        };
        assert_eq!(skip_gram.starting_alpha(), 0.025);
    }

    #[test]
    fn explicit_learning_rate_overrides_default() {
        let config = TrainingConfig {
            initial_learning_rate: Some(0.1),
            ..TrainingConfig::default()
        };
        assert_eq!(config.starting_alpha(), 0.1);
    }
}
