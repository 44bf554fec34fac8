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

//! Shared embedding matrices and the parallel CBOW/skip-gram trainer.
//!
//! The three weight matrices are shared read-write across worker threads
//! without per-row locking, per the concurrency model: races land as small
//! numerical noise, never a broken invariant, and a lock per row would
//! dominate the run time.

use std::cell::UnsafeCell;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::config::{ModelType, TrainingConfig};
use crate::error::{Error, Result};
use crate::huffman;
use crate::model::WordVectors;
use crate::progress::{self, ProgressListener, TrainingStage};
use crate::token_source::{SentenceSource, TokenStream};
use crate::vocab::Vocabulary;

const EXP_TABLE_SIZE: usize = 1000;
const MAX_EXP: f32 = 6.0;
const MAX_SENTENCE_LENGTH: usize = 1000;
const UNIGRAM_TABLE_SIZE: usize = 100_000_000;
const UNIGRAM_POWER: f64 = 0.75;

/// Reference linear-congruential generator. Every stochastic draw in the
/// trainer (window offsets, subsampling, negative-sample targets) comes
/// from this one sequence per worker.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(25214903917).wrapping_add(11);
        self.0
    }
}

fn build_exp_table() -> Vec<f32> {
    (0..EXP_TABLE_SIZE)
        .map(|i| {
            let x = (i as f32 / EXP_TABLE_SIZE as f32 * 2.0 - 1.0) * MAX_EXP;
            let e = x.exp();
            e / (e + 1.0)
        })
        .collect()
}

/// `None` means `|f| >= MAX_EXP`: the caller must skip this update entirely
/// rather than clamp, per the HS branch's saturation rule.
fn hs_sigmoid(f: f32, exp_table: &[f32]) -> Option<f32> {
    if f <= -MAX_EXP || f >= MAX_EXP {
        return None;
    }
    let idx = ((f + MAX_EXP) * (EXP_TABLE_SIZE as f32 / MAX_EXP / 2.0)) as usize;
    Some(exp_table[idx.min(EXP_TABLE_SIZE - 1)])
}

/// Negative-sampling branch clamps instead of skipping.
fn ns_gradient(f: f32, label: f32, alpha: f32, exp_table: &[f32]) -> f32 {
    if f > MAX_EXP {
        (label - 1.0) * alpha
    } else if f < -MAX_EXP {
        label * alpha
    } else {
        let idx = ((f + MAX_EXP) * (EXP_TABLE_SIZE as f32 / MAX_EXP / 2.0)) as usize;
        (label - exp_table[idx.min(EXP_TABLE_SIZE - 1)]) * alpha
    }
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(0.0, |acc, (x, y)| acc + x * y)
}

/// A flat `vocab_size * layer_size` matrix shared read-write across worker
/// threads. Access is through raw pointers instead of per-row locks: the
/// trainer relies on the concurrency model's guarantee that colliding
/// writes only produce numerical noise, never a torn allocation.
struct WeightMatrix {
    data: UnsafeCell<Vec<f32>>,
}

unsafe impl Sync for WeightMatrix {}

impl WeightMatrix {
    fn zeros(len: usize) -> Self {
        WeightMatrix {
            data: UnsafeCell::new(vec![0.0; len]),
        }
    }

    fn from_vec(v: Vec<f32>) -> Self {
        WeightMatrix {
            data: UnsafeCell::new(v),
        }
    }

    fn row(&self, start: usize, len: usize) -> &[f32] {
        unsafe {
            let ptr = (*self.data.get()).as_ptr().add(start);
            std::slice::from_raw_parts(ptr, len)
        }
    }

    /// # Safety
    /// The caller must not rely on exclusivity: concurrent callers may
    /// observe or overwrite each other's writes. That race is accepted by
    /// design (see module docs) rather than guarded against.
    #[allow(clippy::mut_from_ref)]
    unsafe fn row_mut(&self, start: usize, len: usize) -> &mut [f32] {
        unsafe {
            let ptr = (*self.data.get()).as_mut_ptr().add(start);
            std::slice::from_raw_parts_mut(ptr, len)
        }
    }

    fn into_inner(self) -> Vec<f32> {
        self.data.into_inner()
    }
}

struct NeuralNet {
    vocab_size: usize,
    layer_size: usize,
    syn0: WeightMatrix,
    syn1: Option<WeightMatrix>,
    syn1neg: Option<WeightMatrix>,
}

impl NeuralNet {
    fn new(vocab_size: usize, layer_size: usize, use_hs: bool, use_negative: bool) -> Self {
        let size = vocab_size * layer_size;
        let mut lc_rand = Lcg::new(1);
        let syn0: Vec<f32> = (0..size)
            .map(|_| ((lc_rand.next() & 0xffff) as f32 / 65536.0 - 0.5) / layer_size as f32)
            .collect();

        NeuralNet {
            vocab_size,
            layer_size,
            syn0: WeightMatrix::from_vec(syn0),
            syn1: use_hs.then(|| WeightMatrix::zeros(size)),
            syn1neg: use_negative.then(|| WeightMatrix::zeros(size)),
        }
    }
}

fn build_unigram_table_sized(vocab: &Vocabulary, table_size: usize) -> Vec<i32> {
    let vocab_size = vocab.len();
    let train_words_pow: f64 = (0..vocab_size)
        .map(|i| (vocab.count(i) as f64).powf(UNIGRAM_POWER))
        .sum();

    let mut table = vec![0i32; table_size];
    let mut word_idx = 0usize;
    let mut frac = (vocab.count(0) as f64).powf(UNIGRAM_POWER) / train_words_pow;
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = word_idx as i32;
        if i as f64 / table_size as f64 > frac {
            word_idx += 1;
            if word_idx >= vocab_size {
                word_idx = vocab_size - 1;
            }
            frac += (vocab.count(word_idx) as f64).powf(UNIGRAM_POWER) / train_words_pow;
        }
    }
    table
}

fn build_unigram_table(vocab: &Vocabulary) -> Vec<i32> {
    build_unigram_table_sized(vocab, UNIGRAM_TABLE_SIZE)
}

#[derive(Default)]
struct TrainingProgress {
    word_count_actual: AtomicU64,
}

/// Runs hierarchical softmax against `input`, accumulating the gradient
/// into `input_accum` and updating `syn1` in place.
#[allow(clippy::too_many_arguments)]
fn hs_update(
    input: &[f32],
    input_accum: &mut [f32],
    syn1: &WeightMatrix,
    code: &[u8],
    point: &[i32],
    layer_size: usize,
    alpha: f32,
    exp_table: &[f32],
) {
    for d in 0..code.len() {
        let l2 = point[d] as usize * layer_size;
        let syn1_row = unsafe { syn1.row_mut(l2, layer_size) };
        let f = dot_product(input, syn1_row);
        let Some(sigma) = hs_sigmoid(f, exp_table) else {
            continue;
        };
        let g = (1.0 - code[d] as f32 - sigma) * alpha;
        for i in 0..layer_size {
            input_accum[i] += g * syn1_row[i];
        }
        for i in 0..layer_size {
            syn1_row[i] += g * input[i];
        }
    }
}

/// Runs `negative` rounds of negative sampling plus the positive pass
/// against `input`, accumulating the gradient into `input_accum` and
/// updating `syn1neg` in place.
#[allow(clippy::too_many_arguments)]
fn ns_update(
    input: &[f32],
    input_accum: &mut [f32],
    syn1neg: &WeightMatrix,
    target_word: usize,
    vocab_size: usize,
    negative: usize,
    unigram_table: &[i32],
    rng: &mut Lcg,
    layer_size: usize,
    alpha: f32,
    exp_table: &[f32],
) {
    for d in 0..=negative {
        let (target, label) = if d == 0 {
            (target_word, 1.0f32)
        } else {
            let r = rng.next();
            let mut candidate = unigram_table[((r >> 16) as usize) % unigram_table.len()];
            if candidate == 0 {
                candidate = (r % vocab_size as u64) as i32;
            }
            let candidate = candidate as usize;
            if candidate == target_word {
                continue;
            }
            (candidate, 0.0f32)
        };

        let l2 = target * layer_size;
        let syn1_row = unsafe { syn1neg.row_mut(l2, layer_size) };
        let f = dot_product(input, syn1_row);
        let g = ns_gradient(f, label, alpha, exp_table);
        for i in 0..layer_size {
            input_accum[i] += g * syn1_row[i];
        }
        for i in 0..layer_size {
            syn1_row[i] += g * input[i];
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn train_worker(
    net: &NeuralNet,
    vocab: &Vocabulary,
    exp_table: &[f32],
    unigram_table: Option<&[i32]>,
    worker_id: usize,
    num_threads: usize,
    config: &TrainingConfig,
    progress: &TrainingProgress,
    source: &dyn SentenceSource,
) -> Result<()> {
    let layer_size = net.layer_size;
    let window = config.window_size;
    let starting_alpha = config.starting_alpha();
    let mut alpha = starting_alpha;
    let train_words = vocab.train_words().max(1);
    let total_words_target = config.iterations * train_words + 1;

    let mut rng = Lcg::new(worker_id as u64);
    let mut neu1 = vec![0f32; layer_size];
    let mut neu1e = vec![0f32; layer_size];

    let mut local_iter = config.iterations;
    let mut word_count: u64 = 0;
    let mut last_word_count: u64 = 0;
    let mut sen: Vec<usize> = Vec::with_capacity(MAX_SENTENCE_LENGTH);
    let mut sentence_position: usize = 0;
    let mut eof = false;

    let mut reader = source.open()?;
    let mut stream = TokenStream::new(reader);

    loop {
        if word_count - last_word_count > 10_000 {
            let delta = word_count - last_word_count;
            last_word_count = word_count;
            let total = progress.word_count_actual.fetch_add(delta, Ordering::Relaxed) + delta;
            alpha = (starting_alpha * (1.0 - total as f32 / total_words_target as f32))
                .max(starting_alpha * 0.0001);
        }

        if sen.is_empty() {
            loop {
                let token = match stream.next() {
                    None => {
                        eof = true;
                        break;
                    }
                    Some(Err(e)) => return Err(Error::Io(e)),
                    Some(Ok(tok)) => tok,
                };

                let Some(idx) = vocab.search(&token) else {
                    continue;
                };
                word_count += 1;

                if idx == 0 {
                    if sen.is_empty() {
                        continue;
                    }
                    break;
                }

                if config.down_sample_rate > 0.0 {
                    let count = vocab.count(idx) as f32;
                    let sample = config.down_sample_rate as f32;
                    let ran = ((count / (sample * train_words as f32)).sqrt() + 1.0)
                        * (sample * train_words as f32)
                        / count;
                    let r = rng.next();
                    let threshold = (r & 0xFFFF) as f32 / 65536.0;
                    if ran < threshold {
                        continue;
                    }
                }

                sen.push(idx);
                if sen.len() >= MAX_SENTENCE_LENGTH {
                    break;
                }
            }
            sentence_position = 0;
        }

        if (sen.is_empty() && eof) || (word_count > train_words / num_threads as u64) {
            local_iter -= 1;
            if local_iter == 0 {
                break;
            }
            word_count = 0;
            last_word_count = 0;
            sen.clear();
            reader = source.open()?;
            stream = TokenStream::new(reader);
            eof = false;
            continue;
        }

        let w = sen[sentence_position];
        let entry = vocab.entry(w);
        let b = (rng.next() % window as u64) as usize;

        match config.model_type {
            ModelType::Cbow => {
                neu1.fill(0.0);
                let mut cw = 0usize;
                for a in b..2 * window + 1 - b {
                    if a == window {
                        continue;
                    }
                    let c = sentence_position as isize - window as isize + a as isize;
                    if c < 0 || c >= sen.len() as isize {
                        continue;
                    }
                    let context_word = sen[c as usize];
                    let row = net.syn0.row(context_word * layer_size, layer_size);
                    for i in 0..layer_size {
                        neu1[i] += row[i];
                    }
                    cw += 1;
                }

                if cw > 0 {
                    for v in neu1.iter_mut() {
                        *v /= cw as f32;
                    }
                    neu1e.fill(0.0);

                    if let Some(syn1) = &net.syn1 {
                        hs_update(
                            &neu1, &mut neu1e, syn1, &entry.code, &entry.point, layer_size, alpha,
                            exp_table,
                        );
                    }
                    if let (Some(syn1neg), Some(table)) = (&net.syn1neg, unigram_table) {
                        ns_update(
                            &neu1,
                            &mut neu1e,
                            syn1neg,
                            w,
                            net.vocab_size,
                            config.negative_samples,
                            table,
                            &mut rng,
                            layer_size,
                            alpha,
                            exp_table,
                        );
                    }

                    for a in b..2 * window + 1 - b {
                        if a == window {
                            continue;
                        }
                        let c = sentence_position as isize - window as isize + a as isize;
                        if c < 0 || c >= sen.len() as isize {
                            continue;
                        }
                        let context_word = sen[c as usize];
                        let row = unsafe { net.syn0.row_mut(context_word * layer_size, layer_size) };
                        for i in 0..layer_size {
                            row[i] += neu1e[i];
                        }
                    }
                }
            }
            ModelType::SkipGram => {
                for a in b..2 * window + 1 - b {
                    if a == window {
                        continue;
                    }
                    let c = sentence_position as isize - window as isize + a as isize;
                    if c < 0 || c >= sen.len() as isize {
                        continue;
                    }
                    let context_word = sen[c as usize];
                    let l1 = context_word * layer_size;
                    neu1e.fill(0.0);
                    let input_row = net.syn0.row(l1, layer_size);

                    if let Some(syn1) = &net.syn1 {
                        hs_update(
                            input_row, &mut neu1e, syn1, &entry.code, &entry.point, layer_size,
                            alpha, exp_table,
                        );
                    }
                    if let (Some(syn1neg), Some(table)) = (&net.syn1neg, unigram_table) {
                        ns_update(
                            input_row,
                            &mut neu1e,
                            syn1neg,
                            w,
                            net.vocab_size,
                            config.negative_samples,
                            table,
                            &mut rng,
                            layer_size,
                            alpha,
                            exp_table,
                        );
                    }

                    let row = unsafe { net.syn0.row_mut(l1, layer_size) };
                    for i in 0..layer_size {
                        row[i] += neu1e[i];
                    }
                }
            }
        }

        sentence_position += 1;
        if sentence_position >= sen.len() {
            sen.clear();
        }
    }

    Ok(())
}

/// Runs the full pipeline — vocabulary, Huffman codes, parallel training —
/// over `source` and returns the trained model.
pub fn train(
    source: &dyn SentenceSource,
    config: &TrainingConfig,
    listener: &dyn ProgressListener,
) -> Result<WordVectors> {
    config.validate()?;

    progress::report(listener, TrainingStage::AcquireVocab, 0.0);
    let reader = source.open()?;
    let tokens = TokenStream::new(reader);
    let mut vocab = Vocabulary::build_from_corpus(tokens, config.min_frequency)?;
    progress::report(listener, TrainingStage::AcquireVocab, 1.0);
    progress::report(listener, TrainingStage::FilterSortVocab, 1.0);

    progress::report(listener, TrainingStage::CreateHuffmanEncoding, 0.0);
    if config.use_hierarchical_softmax {
        huffman::build(&mut vocab)?;
    }
    progress::report(listener, TrainingStage::CreateHuffmanEncoding, 1.0);

    progress::report(listener, TrainingStage::TrainNeuralNetwork, 0.0);
    let net = NeuralNet::new(
        vocab.len(),
        config.layer_size,
        config.use_hierarchical_softmax,
        config.negative_samples > 0,
    );
    let unigram_table = (config.negative_samples > 0).then(|| build_unigram_table(&vocab));
    let exp_table = build_exp_table();
    let progress_counter = TrainingProgress::default();

    let num_threads = config
        .threads
        .min(thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .max(1);

    let net_ref = &net;
    let vocab_ref = &vocab;
    let exp_table_ref = &exp_table;
    let unigram_ref = unigram_table.as_deref();
    let progress_ref = &progress_counter;

    let results: Vec<Result<()>> = thread::scope(|scope| {
        (0..num_threads)
            .map(|worker_id| {
                scope.spawn(move || {
                    train_worker(
                        net_ref,
                        vocab_ref,
                        exp_table_ref,
                        unigram_ref,
                        worker_id,
                        num_threads,
                        config,
                        progress_ref,
                        source,
                    )
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(Error::Io(io::Error::other("worker thread panicked"))))
            })
            .collect()
    });

    for r in results {
        r.map_err(Error::training)?;
    }
    progress::report(listener, TrainingStage::TrainNeuralNetwork, 1.0);

    let words: Vec<String> = vocab.iter().map(|e| e.word.clone()).collect();
    Ok(WordVectors::new(config.layer_size, words, net.syn0.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopListener;
    use crate::token_source::InMemorySentenceSource;

    fn corpus() -> InMemorySentenceSource {
        let sentence: Vec<String> = "the quick brown fox jumps over the lazy dog the fox runs"
            .split_whitespace()
            .map(String::from)
            .collect();
        InMemorySentenceSource::new(vec![sentence; 50])
    }

    #[test]
    fn cbow_hierarchical_softmax_trains_a_full_vector_per_word() {
        let config = TrainingConfig {
            min_frequency: 1,
            layer_size: 8,
            ..TrainingConfig::default()
        };
        let model = train(&corpus(), &config, &NoopListener).unwrap();
        assert_eq!(model.layer_size, 8);
        assert!(model.words.contains(&"fox".to_string()));
        assert_eq!(model.vectors.len(), model.words.len() * 8);
    }

    #[test]
    fn cbow_negative_sampling_trains_without_hs() {
        let config = TrainingConfig {
            min_frequency: 1,
            layer_size: 8,
            use_hierarchical_softmax: false,
            negative_samples: 5,
            ..TrainingConfig::default()
        };
        let model = train(&corpus(), &config, &NoopListener).unwrap();
        assert_eq!(model.vectors.len(), model.words.len() * 8);
    }

    #[test]
    fn skip_gram_trains_successfully() {
        let config = TrainingConfig {
            min_frequency: 1,
            layer_size: 8,
            model_type: ModelType::SkipGram,
            negative_samples: 5,
            ..TrainingConfig::default()
        };
        let model = train(&corpus(), &config, &NoopListener).unwrap();
        assert_eq!(model.vectors.len(), model.words.len() * 8);
    }

    #[test]
    fn multi_iteration_training_completes() {
        let config = TrainingConfig {
            min_frequency: 1,
            layer_size: 4,
            iterations: 3,
            ..TrainingConfig::default()
        };
        let model = train(&corpus(), &config, &NoopListener).unwrap();
        assert_eq!(model.vectors.len(), model.words.len() * 4);
    }

    #[test]
    fn single_thread_training_is_deterministic() {
        let config = TrainingConfig {
            min_frequency: 1,
            layer_size: 6,
            threads: 1,
            ..TrainingConfig::default()
        };
        let a = train(&corpus(), &config, &NoopListener).unwrap();
        let b = train(&corpus(), &config, &NoopListener).unwrap();
        assert_eq!(a.vectors, b.vectors);
        assert_eq!(a.words, b.words);
    }

    #[test]
    fn unigram_table_samples_proportionally_to_count_power() {
        let vocab = Vocabulary::build_from_override(
            vec![("frequent".to_string(), 1000), ("rare".to_string(), 1)],
            1,
        );
        let table = build_unigram_table_sized(&vocab, 10_000);
        let frequent_idx = vocab.search("frequent").unwrap();
        let rare_idx = vocab.search("rare").unwrap();
        let frequent_count = table.iter().filter(|&&t| t as usize == frequent_idx).count();
        let rare_count = table.iter().filter(|&&t| t as usize == rare_idx).count();
        assert!(frequent_count > rare_count);
    }
}
