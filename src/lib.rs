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

//! Trains word2vec-family embeddings (CBOW / skip-gram, hierarchical
//! softmax and/or negative sampling) from a stream of sentences, and
//! serves nearest-neighbor and analogy queries over the result.
//!
//! Data flow: sentences -> [`token_source`] -> [`vocab`] (counts) ->
//! [`huffman`] (codes) -> [`trainer`] (weights) -> [`model::WordVectors`]
//! -> [`searcher`] (queries). [`trainer::train`] is the single entry point
//! that drives the whole pipeline.

pub mod config;
pub mod error;
pub mod huffman;
pub mod model;
pub mod progress;
pub mod searcher;
pub mod token_source;
pub mod trainer;
pub mod vocab;

pub use config::{ModelType, TrainingConfig};
pub use error::{Error, Result};
pub use model::WordVectors;
pub use progress::{NoopListener, ProgressListener, TrainingStage};
pub use searcher::Searcher;
pub use token_source::{FileSentenceSource, InMemorySentenceSource, SentenceSource};
pub use trainer::train;
