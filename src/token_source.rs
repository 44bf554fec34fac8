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

//! Lazy word sequence built from a sequence of sentences.
//!
//! A [`SentenceSource`] is a restartable factory for a one-shot
//! [`SentenceReader`]; the trainer (`src/trainer.rs`) opens a fresh reader at
//! the start of every iteration, per the restartability requirement in the
//! spec's "sentence stream restartability" design note.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// The sentence-end sentinel inserted once per sentence boundary.
pub const END_OF_SENTENCE: &str = "</s>";

/// Words longer than this many bytes are truncated to their first
/// `MAX_WORD_LEN` bytes.
pub const MAX_WORD_LEN: usize = 100;

/// An ordered sequence of words, already split on whitespace by the caller.
pub type Sentence = Vec<String>;

/// One pass over an underlying corpus. Not restartable on its own; callers
/// get a fresh reader from [`SentenceSource::open`] for each pass.
pub trait SentenceReader {
    /// Returns the next sentence, or `None` at end of stream.
    fn next_sentence(&mut self) -> io::Result<Option<Sentence>>;
}

/// A finite, restartable source of sentences. The trainer calls [`open`]
/// once per worker per iteration.
///
/// [`open`]: SentenceSource::open
pub trait SentenceSource: Send + Sync {
    fn open(&self) -> io::Result<Box<dyn SentenceReader + '_>>;
}

fn truncate_word(word: &str) -> String {
    if word.len() <= MAX_WORD_LEN {
        return word.to_string();
    }
    let mut end = MAX_WORD_LEN;
    while !word.is_char_boundary(end) {
        end -= 1;
    }
    word[..end].to_string()
}

/// Turns a [`SentenceReader`] into a flat word stream, truncating
/// overlong words and inserting [`END_OF_SENTENCE`] once per sentence
/// boundary.
pub struct TokenStream<'a> {
    reader: Box<dyn SentenceReader + 'a>,
    pending: std::vec::IntoIter<String>,
    finished: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(reader: Box<dyn SentenceReader + 'a>) -> Self {
        TokenStream {
            reader,
            pending: Vec::new().into_iter(),
            finished: false,
        }
    }
}

impl Iterator for TokenStream<'_> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(word) = self.pending.next() {
                return Some(Ok(word));
            }
            if self.finished {
                return None;
            }
            match self.reader.next_sentence() {
                Ok(Some(sentence)) => {
                    let mut words: Vec<String> = sentence
                        .iter()
                        .filter(|w| !w.is_empty())
                        .map(|w| truncate_word(w))
                        .collect();
                    words.push(END_OF_SENTENCE.to_string());
                    self.pending = words.into_iter();
                }
                Ok(None) => {
                    self.finished = true;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// An in-memory sentence source, mainly useful for tests and small corpora
/// that already fit in memory.
pub struct InMemorySentenceSource {
    sentences: Vec<Sentence>,
}

impl InMemorySentenceSource {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        InMemorySentenceSource { sentences }
    }
}

struct InMemoryReader<'a> {
    sentences: &'a [Sentence],
    pos: usize,
}

impl SentenceReader for InMemoryReader<'_> {
    fn next_sentence(&mut self) -> io::Result<Option<Sentence>> {
        if self.pos >= self.sentences.len() {
            return Ok(None);
        }
        let sentence = self.sentences[self.pos].clone();
        self.pos += 1;
        Ok(Some(sentence))
    }
}

impl SentenceSource for InMemorySentenceSource {
    fn open(&self) -> io::Result<Box<dyn SentenceReader + '_>> {
        Ok(Box::new(InMemoryReader {
            sentences: &self.sentences,
            pos: 0,
        }))
    }
}

/// A plain-text file source: each line is one sentence, words are separated
/// by ASCII whitespace. Restartable by re-opening the file.
pub struct FileSentenceSource {
    path: PathBuf,
}

impl FileSentenceSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSentenceSource {
            path: path.as_ref().to_path_buf(),
        }
    }
}

struct FileReader {
    lines: std::io::Lines<BufReader<File>>,
}

impl SentenceReader for FileReader {
    fn next_sentence(&mut self) -> io::Result<Option<Sentence>> {
        match self.lines.next() {
            None => Ok(None),
            Some(line) => {
                let line = line?;
                Ok(Some(
                    line.split_ascii_whitespace().map(str::to_string).collect(),
                ))
            }
        }
    }
}

impl SentenceSource for FileSentenceSource {
    fn open(&self) -> io::Result<Box<dyn SentenceReader + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(FileReader {
            lines: BufReader::new(file).lines(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_words_then_sentinel() {
        let src = InMemorySentenceSource::new(vec![
            vec!["the".to_string(), "cat".to_string()],
            vec!["sat".to_string()],
        ]);
        let reader = src.open().unwrap();
        let tokens: Vec<String> = TokenStream::new(reader)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            tokens,
            vec!["the", "cat", "</s>", "sat", "</s>"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn empty_sentence_still_emits_sentinel() {
        let src = InMemorySentenceSource::new(vec![vec![]]);
        let reader = src.open().unwrap();
        let tokens: Vec<String> = TokenStream::new(reader)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(tokens, vec!["</s>".to_string()]);
    }

    #[test]
    fn truncates_overlong_words() {
        let long = "a".repeat(150);
        let src = InMemorySentenceSource::new(vec![vec![long.clone()]]);
        let reader = src.open().unwrap();
        let tokens: Vec<String> = TokenStream::new(reader)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(tokens[0].len(), MAX_WORD_LEN);
        assert_eq!(tokens[0], long[..MAX_WORD_LEN]);
    }

    #[test]
    fn source_is_restartable() {
        let src = InMemorySentenceSource::new(vec![vec!["a".to_string()]]);
        for _ in 0..3 {
            let reader = src.open().unwrap();
            let tokens: Vec<String> = TokenStream::new(reader)
                .collect::<io::Result<_>>()
                .unwrap();
            assert_eq!(tokens, vec!["a".to_string(), "</s>".to_string()]);
        }
    }

    #[test]
    fn file_source_splits_lines_into_sentences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        std::fs::write(&path, "the cat sat\nthe dog ran\n").unwrap();

        let src = FileSentenceSource::new(&path);
        let reader = src.open().unwrap();
        let tokens: Vec<String> = TokenStream::new(reader)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            tokens,
            vec!["the", "cat", "sat", "</s>", "the", "dog", "ran", "</s>"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }
}
