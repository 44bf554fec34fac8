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

//! Cosine-similarity search over an L2-normalized snapshot of a trained
//! embedding: nearest neighbors and vector analogies.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::model::WordVectors;

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).fold(0.0, |acc, (x, y)| acc + x * y)
}

/// An immutable, L2-normalized copy of a [`WordVectors`] embedding.
pub struct Searcher {
    layer_size: usize,
    words: Vec<String>,
    index: HashMap<String, usize>,
    normalized: Vec<f32>,
}

impl Searcher {
    pub fn new(model: &WordVectors) -> Self {
        let layer_size = model.layer_size;
        let mut normalized = model.vectors.clone();
        for row in normalized.chunks_mut(layer_size) {
            let norm = dot(row, row).sqrt();
            for v in row.iter_mut() {
                *v /= norm;
            }
        }
        let index = model
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();

        Searcher {
            layer_size,
            words: model.words.clone(),
            index,
            normalized,
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    fn row(&self, index: usize) -> &[f32] {
        &self.normalized[index * self.layer_size..(index + 1) * self.layer_size]
    }

    pub fn raw_vector(&self, word: &str) -> Result<&[f32]> {
        let idx = self
            .index
            .get(word)
            .copied()
            .ok_or_else(|| Error::UnknownWord(word.to_string()))?;
        Ok(self.row(idx))
    }

    pub fn top_matches(&self, word: &str, k: usize) -> Result<Vec<(String, f32)>> {
        let vector = self.raw_vector(word)?.to_vec();
        let mut ignore = HashSet::new();
        ignore.insert(word.to_string());
        Ok(self.top_matches_from_vector(&vector, k, &ignore))
    }

    pub fn top_matches_from_vector(
        &self,
        vector: &[f32],
        k: usize,
        ignore: &HashSet<String>,
    ) -> Vec<(String, f32)> {
        let mut scored: Vec<(String, f32)> = self
            .words
            .iter()
            .enumerate()
            .filter(|(_, w)| !ignore.contains(*w))
            .map(|(i, w)| (w.clone(), dot(vector, self.row(i))))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }

    pub fn cosine_distance(&self, word1: &str, word2: &str) -> Result<f32> {
        let a = self.raw_vector(word1)?;
        let b = self.raw_vector(word2)?;
        Ok(dot(a, b))
    }

    /// Returns the top `k` matches to `normalized(w3) - (normalized(w1) -
    /// normalized(w2))`, excluding `w3` itself.
    pub fn analogy(&self, word1: &str, word2: &str, word3: &str, k: usize) -> Result<Vec<(String, f32)>> {
        let v1 = self.raw_vector(word1)?.to_vec();
        let v2 = self.raw_vector(word2)?.to_vec();
        let v3 = self.raw_vector(word3)?.to_vec();
        let query: Vec<f32> = v3
            .iter()
            .zip(v1.iter().zip(v2.iter()))
            .map(|(a, (b, c))| a - (b - c))
            .collect();

        let mut ignore = HashSet::new();
        ignore.insert(word3.to_string());
        Ok(self.top_matches_from_vector(&query, k, &ignore))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> WordVectors {
        WordVectors::new(
            2,
            vec![
                "</s>".to_string(),
                "cat".to_string(),
                "dog".to_string(),
                "car".to_string(),
            ],
            vec![1.0, 0.0, 3.0, 4.0, 4.0, 3.0, 0.0, 5.0],
        )
    }

    #[test]
    fn normalized_rows_have_unit_norm() {
        let searcher = Searcher::new(&sample_model());
        for word in ["</s>", "cat", "dog", "car"] {
            let v = searcher.raw_vector(word).unwrap();
            let norm = dot(v, v).sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "{word} has norm {norm}");
        }
    }

    #[test]
    fn unknown_word_is_an_error() {
        let searcher = Searcher::new(&sample_model());
        assert!(matches!(
            searcher.raw_vector("nonexistent"),
            Err(Error::UnknownWord(_))
        ));
    }

    #[test]
    fn top_1_self_match_returns_the_query_word() {
        let searcher = Searcher::new(&sample_model());
        let vector = searcher.raw_vector("cat").unwrap().to_vec();
        let top = searcher.top_matches_from_vector(&vector, 1, &HashSet::new());
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, "cat");
        assert!((top[0].1 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn analogy_of_a_word_with_itself_matches_top_matches() {
        let searcher = Searcher::new(&sample_model());
        let analogy = searcher.analogy("cat", "cat", "dog", 2).unwrap();
        let direct = searcher.top_matches("dog", 2).unwrap();
        assert_eq!(analogy, direct);
    }

    #[test]
    fn top_matches_excludes_the_query_word_and_is_sorted_descending() {
        let searcher = Searcher::new(&sample_model());
        let matches = searcher.top_matches("cat", 3).unwrap();
        assert!(matches.iter().all(|(w, _)| w != "cat"));
        for pair in matches.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }
}
