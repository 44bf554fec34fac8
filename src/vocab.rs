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

//! Open-addressed word/frequency table, self-reducing and sorted by
//! descending count. Index 0 is always the sentence-end sentinel `</s>`.

use std::io;

use crate::token_source::END_OF_SENTENCE;

/// Number of slots in the open-addressed hash table. Load-bearing: the
/// `ReduceVocab` contract is defined in terms of this exact modulus, not a
/// general hash map's growth policy.
pub const VOCAB_HASH_SIZE: usize = 30_000_000;

const MAX_LOAD_FACTOR: f64 = 0.7;

fn hash_word(word: &str) -> usize {
    let mut h: u64 = 0;
    for &b in word.as_bytes() {
        h = h.wrapping_mul(257).wrapping_add(b as u64);
    }
    (h % VOCAB_HASH_SIZE as u64) as usize
}

/// A single vocabulary entry. `code`/`point` are populated by the Huffman
/// coder and are empty until then.
#[derive(Debug, Clone)]
pub struct WordEntry {
    pub word: String,
    pub count: u64,
    pub code: Vec<u8>,
    pub point: Vec<i32>,
}

impl WordEntry {
    fn new(word: String, count: u64) -> Self {
        WordEntry {
            word,
            count,
            code: Vec::new(),
            point: Vec::new(),
        }
    }
}

pub struct Vocabulary {
    entries: Vec<WordEntry>,
    hash_table: Vec<i32>,
    train_words: u64,
    min_reduce: u64,
}

impl Vocabulary {
    fn empty() -> Self {
        let mut vocab = Vocabulary {
            entries: Vec::new(),
            hash_table: vec![-1; VOCAB_HASH_SIZE],
            train_words: 0,
            min_reduce: 1,
        };
        vocab.insert_new(END_OF_SENTENCE.to_string(), 0);
        vocab
    }

    /// Scans `tokens` once, building the vocabulary by counting occurrences.
    /// `min_count` is applied at [`finalize`](Self::finalize) time.
    pub fn build_from_corpus<I>(tokens: I, min_count: u64) -> io::Result<Vocabulary>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut vocab = Vocabulary::empty();
        for token in tokens {
            vocab.add_word(token?);
        }
        vocab.finalize(min_count);
        Ok(vocab)
    }

    /// Builds a vocabulary directly from a word → count multiset, skipping
    /// corpus scanning entirely. An empty `counts` yields an empty
    /// non-sentinel vocabulary (only `</s>` survives).
    pub fn build_from_override<I>(counts: I, min_count: u64) -> Vocabulary
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let mut vocab = Vocabulary::empty();
        for (word, count) in counts {
            vocab.add_word_with_count(word, count);
        }
        vocab.finalize(min_count);
        vocab
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn train_words(&self) -> u64 {
        self.train_words
    }

    pub fn entry(&self, index: usize) -> &WordEntry {
        &self.entries[index]
    }

    pub fn count(&self, index: usize) -> u64 {
        self.entries[index].count
    }

    pub fn word(&self, index: usize) -> &str {
        &self.entries[index].word
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordEntry> {
        self.entries.iter()
    }

    /// Returns the word's index, or `None` if it is not in the vocabulary.
    pub fn search(&self, word: &str) -> Option<usize> {
        let mut hash_idx = hash_word(word);
        loop {
            let word_idx = self.hash_table[hash_idx];
            if word_idx == -1 {
                return None;
            }
            if self.entries[word_idx as usize].word == word {
                return Some(word_idx as usize);
            }
            hash_idx = (hash_idx + 1) % VOCAB_HASH_SIZE;
        }
    }

    /// Sets the Huffman code/path for `index`. Called once by the coder.
    pub(crate) fn set_code(&mut self, index: usize, code: Vec<u8>, point: Vec<i32>) {
        self.entries[index].code = code;
        self.entries[index].point = point;
    }

    fn probe_slot(&self, word: &str) -> (usize, i32) {
        let mut hash_idx = hash_word(word);
        loop {
            let word_idx = self.hash_table[hash_idx];
            if word_idx == -1 {
                return (hash_idx, -1);
            }
            if self.entries[word_idx as usize].word == word {
                return (hash_idx, word_idx);
            }
            hash_idx = (hash_idx + 1) % VOCAB_HASH_SIZE;
        }
    }

    fn insert_new(&mut self, word: String, count: u64) -> usize {
        let (hash_idx, existing) = self.probe_slot(&word);
        debug_assert_eq!(existing, -1);
        let idx = self.entries.len();
        self.entries.push(WordEntry::new(word, count));
        self.hash_table[hash_idx] = idx as i32;
        idx
    }

    fn add_word(&mut self, word: String) {
        let (hash_idx, existing) = self.probe_slot(&word);
        if existing == -1 {
            let idx = self.entries.len() as i32;
            self.entries.push(WordEntry::new(word, 1));
            self.hash_table[hash_idx] = idx;
        } else {
            self.entries[existing as usize].count += 1;
        }
        self.train_words += 1;

        if self.entries.len() as f64 > MAX_LOAD_FACTOR * VOCAB_HASH_SIZE as f64 {
            self.reduce();
        }
    }

    fn add_word_with_count(&mut self, word: String, count: u64) {
        let (hash_idx, existing) = self.probe_slot(&word);
        if existing == -1 {
            let idx = self.entries.len() as i32;
            self.entries.push(WordEntry::new(word, count));
            self.hash_table[hash_idx] = idx;
        } else {
            self.entries[existing as usize].count += count;
        }
        self.train_words += count;
    }

    /// Drops every non-sentinel entry whose count is `<= min_reduce`,
    /// compacts survivors, rebuilds the hash table and bumps `min_reduce`.
    fn reduce(&mut self) {
        let min_reduce = self.min_reduce;
        self.entries = std::iter::once(self.entries[0].clone())
            .chain(
                self.entries[1..]
                    .iter()
                    .filter(|e| e.count > min_reduce)
                    .cloned(),
            )
            .collect();
        self.min_reduce += 1;
        self.rebuild_hash_table();
    }

    fn rebuild_hash_table(&mut self) {
        self.hash_table.fill(-1);
        for (idx, entry) in self.entries.iter().enumerate() {
            let mut hash_idx = hash_word(&entry.word);
            while self.hash_table[hash_idx] != -1 {
                hash_idx = (hash_idx + 1) % VOCAB_HASH_SIZE;
            }
            self.hash_table[hash_idx] = idx as i32;
        }
    }

    /// Sorts by descending count (sentinel pinned at index 0), drops
    /// entries below `min_count`, and rebuilds the hash table.
    fn finalize(&mut self, min_count: u64) {
        let sentinel = self.entries.remove(0);
        self.entries.sort_by_key(|e| std::cmp::Reverse(e.count));
        self.entries.retain(|e| e.count >= min_count);
        self.entries.insert(0, sentinel);
        self.train_words = self.entries.iter().map(|e| e.count).sum();
        self.rebuild_hash_table();
    }
}

impl<'a> IntoIterator for &'a Vocabulary {
    type Item = &'a WordEntry;
    type IntoIter = std::slice::Iter<'a, WordEntry>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
