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

//! Coarse-grained training stage reporting, consumed by optional caller
//! listeners and mirrored as `tracing` events.

/// The four stages a training run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStage {
    AcquireVocab,
    FilterSortVocab,
    CreateHuffmanEncoding,
    TrainNeuralNetwork,
}

impl TrainingStage {
    fn label(self) -> &'static str {
        match self {
            TrainingStage::AcquireVocab => "acquire_vocab",
            TrainingStage::FilterSortVocab => "filter_sort_vocab",
            TrainingStage::CreateHuffmanEncoding => "create_huffman_encoding",
            TrainingStage::TrainNeuralNetwork => "train_neural_network",
        }
    }
}

/// Callback invoked at each stage boundary with a progress fraction in
/// `[0, 1]`. Implementations should return quickly; the trainer calls this
/// from worker-adjacent code paths.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, stage: TrainingStage, fraction: f64);
}

/// A listener that drops every update. Used when the caller has no
/// observer to attach.
pub struct NoopListener;

impl ProgressListener for NoopListener {
    fn on_progress(&self, _stage: TrainingStage, _fraction: f64) {}
}

pub(crate) fn report(listener: &dyn ProgressListener, stage: TrainingStage, fraction: f64) {
    tracing::info!(stage = stage.label(), fraction, "training stage progress");
    listener.on_progress(stage, fraction);
}
