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

//! The trained model record and its two persistence formats: the legacy
//! plain-text word2vec format, and `serde_json` for language-neutral
//! round-tripping. Both are consumers of the core, not part of it.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn invalid_data(msg: impl Into<String>) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
}

/// A trained embedding: `layer_size` dimensions per word, words in the
/// vocabulary's index order (index 0 is always `</s>`), and `syn0` stored
/// row-major as a flat array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordVectors {
    pub layer_size: usize,
    pub words: Vec<String>,
    pub vectors: Vec<f32>,
}

impl WordVectors {
    pub fn new(layer_size: usize, words: Vec<String>, vectors: Vec<f32>) -> Self {
        WordVectors {
            layer_size,
            words,
            vectors,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.words.len()
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.vectors[index * self.layer_size..(index + 1) * self.layer_size]
    }

    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        let idx = self.words.iter().position(|w| w == word)?;
        Some(self.row(idx))
    }

    /// Writes the legacy `word2vec` plain-text format: a `vocab_size
    /// layer_size` header, then one `word f1 f2 ... fn` line per entry.
    pub fn save_text<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{} {}", self.words.len(), self.layer_size)?;
        for (idx, word) in self.words.iter().enumerate() {
            write!(out, "{word} ")?;
            for f in self.row(idx) {
                write!(out, "{f:.06} ")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn load_text<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut lines = BufReader::new(File::open(path)?).lines();
        let header = lines
            .next()
            .ok_or_else(|| invalid_data("missing header line"))??;
        let mut header_fields = header.split_whitespace();
        let vocab_size: usize = header_fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| invalid_data("malformed vocab_size in header"))?;
        let layer_size: usize = header_fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| invalid_data("malformed layer_size in header"))?;

        let mut words = Vec::with_capacity(vocab_size);
        let mut vectors = Vec::with_capacity(vocab_size * layer_size);
        for line in lines {
            let line = line?;
            let mut fields = line.split_whitespace();
            let word = fields
                .next()
                .ok_or_else(|| invalid_data("missing word on data line"))?
                .to_string();
            words.push(word);
            for _ in 0..layer_size {
                let value: f32 = fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| invalid_data("missing or malformed vector component"))?;
                vectors.push(value);
            }
        }

        Ok(WordVectors {
            layer_size,
            words,
            vectors,
        })
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let out = BufWriter::new(File::create(path)?);
        serde_json::to_writer(out, self).map_err(|e| invalid_data(e.to_string()))
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let input = BufReader::new(File::open(path)?);
        serde_json::from_reader(input).map_err(|e| invalid_data(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WordVectors {
        WordVectors::new(
            3,
            vec!["</s>".to_string(), "cat".to_string(), "dog".to_string()],
            vec![0.0, 0.0, 0.0, 0.1, 0.2, 0.3, -0.1, -0.2, -0.3],
        )
    }

    #[test]
    fn text_round_trip_preserves_words_and_vectors() {
        let model = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.txt");
        model.save_text(&path).unwrap();
        let loaded = WordVectors::load_text(&path).unwrap();
        assert_eq!(model, loaded);
    }

    #[test]
    fn json_round_trip_preserves_words_and_vectors() {
        let model = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.json");
        model.save_json(&path).unwrap();
        let loaded = WordVectors::load_json(&path).unwrap();
        assert_eq!(model, loaded);
    }

    #[test]
    fn vector_looks_up_by_word() {
        let model = sample();
        assert_eq!(model.vector("cat"), Some(&[0.1, 0.2, 0.3][..]));
        assert_eq!(model.vector("nonexistent"), None);
    }
}
