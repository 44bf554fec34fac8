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

//! Binary Huffman tree over vocabulary counts, producing per-word codes and
//! output-layer addressing paths for hierarchical softmax.

use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

/// Reference sentinel value standing in for infinity on internal nodes that
/// have not been assigned a count yet.
const INFINITE_COUNT: u64 = 1_000_000_000_000_000;

/// Codes/paths longer than this are rejected rather than silently truncated.
pub const MAX_CODE_LENGTH: usize = 40;

fn pick_min(pos1: &mut isize, pos2: &mut isize, count: &[u64]) -> usize {
    if *pos1 >= 0 && count[*pos1 as usize] < count[*pos2 as usize] {
        let picked = *pos1 as usize;
        *pos1 -= 1;
        picked
    } else {
        let picked = *pos2 as usize;
        *pos2 += 1;
        picked
    }
}

/// Builds the Huffman tree over `vocab`'s (already descending-sorted)
/// counts and writes a code/path into every entry.
pub fn build(vocab: &mut Vocabulary) -> Result<()> {
    let vocab_size = vocab.len();

    if vocab_size < 2 {
        // Degenerate case: zero or one surviving word means there is
        // nothing to merge. Assign a trivial single-bit code so downstream
        // code never has to special-case an empty tree.
        if vocab_size == 1 {
            vocab.set_code(0, vec![0], vec![0]);
        }
        return Ok(());
    }

    let total_nodes = 2 * vocab_size - 1;
    let mut count = vec![0u64; total_nodes];
    let mut binary = vec![0u8; total_nodes];
    let mut parent = vec![0usize; total_nodes];

    for (i, slot) in count.iter_mut().enumerate().take(vocab_size) {
        *slot = vocab.count(i);
    }
    for slot in count.iter_mut().skip(vocab_size) {
        *slot = INFINITE_COUNT;
    }

    let mut pos1: isize = vocab_size as isize - 1;
    let mut pos2: isize = vocab_size as isize;

    for a in 0..vocab_size - 1 {
        let min1i = pick_min(&mut pos1, &mut pos2, &count);
        let min2i = pick_min(&mut pos1, &mut pos2, &count);

        count[vocab_size + a] = count[min1i] + count[min2i];
        parent[min1i] = vocab_size + a;
        parent[min2i] = vocab_size + a;
        binary[min2i] = 1;
    }

    let root = total_nodes - 1;

    for leaf in 0..vocab_size {
        let mut path: Vec<(u8, usize)> = Vec::new();
        let mut b = leaf;
        loop {
            path.push((binary[b], b));
            b = parent[b];
            if b == root {
                break;
            }
        }

        let len = path.len();
        if len > MAX_CODE_LENGTH {
            return Err(Error::InvalidConfig(format!(
                "Huffman code for {:?} exceeds the {MAX_CODE_LENGTH}-bit bound",
                vocab.word(leaf)
            )));
        }

        let mut code = vec![0u8; len];
        let mut point = vec![0i32; len];
        point[0] = vocab_size as i32 - 2;

        for (step, &(bit, node)) in path.iter().enumerate() {
            code[len - step - 1] = bit;
            if step > 0 {
                point[len - step] = node as i32 - vocab_size as i32;
            }
        }

        vocab.set_code(leaf, code, point);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_source::{InMemorySentenceSource, SentenceSource, TokenStream};
    use std::collections::HashSet;
    use std::io;

    fn build_vocab(words: &[(&str, usize)]) -> Vocabulary {
        let mut sentence: Vec<String> = Vec::new();
        for (word, count) in words {
            for _ in 0..*count {
                sentence.push(word.to_string());
            }
        }
        let src = InMemorySentenceSource::new(vec![sentence]);
        let reader = src.open().unwrap();
        let tokens: Vec<io::Result<String>> = TokenStream::new(reader).collect();
        Vocabulary::build_from_corpus(tokens, 1).unwrap()
    }

    #[test]
    fn codes_are_prefix_free_and_within_bound() {
        let mut vocab = build_vocab(&[("a", 10), ("b", 5), ("c", 3), ("d", 1), ("e", 1)]);
        build(&mut vocab).unwrap();

        let codes: Vec<Vec<u8>> = vocab.iter().map(|e| e.code.clone()).collect();
        for (i, code_i) in codes.iter().enumerate() {
            assert!(!code_i.is_empty());
            assert!(code_i.len() <= MAX_CODE_LENGTH);
            for (j, code_j) in codes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let min_len = code_i.len().min(code_j.len());
                assert_ne!(
                    &code_i[..min_len],
                    &code_j[..min_len],
                    "codes must be prefix-free"
                );
            }
        }
    }

    #[test]
    fn path_first_slot_is_root_quirk() {
        let mut vocab = build_vocab(&[("a", 10), ("b", 5), ("c", 3)]);
        let vocab_size = vocab.len();
        build(&mut vocab).unwrap();
        for entry in vocab.iter() {
            assert_eq!(entry.point[0], vocab_size as i32 - 2);
        }
    }

    #[test]
    fn frequent_words_get_codes_no_longer_than_rare_words() {
        let mut vocab = build_vocab(&[("a", 100), ("b", 50), ("c", 1), ("d", 1), ("e", 1), ("f", 1)]);
        build(&mut vocab).unwrap();
        let len_a = vocab.entry(vocab.search("a").unwrap()).code.len();
        let len_c = vocab.entry(vocab.search("c").unwrap()).code.len();
        assert!(len_a <= len_c);
    }

    #[test]
    fn single_surviving_word_gets_trivial_code() {
        let mut vocab = Vocabulary::build_from_override(std::iter::empty(), 1);
        assert_eq!(vocab.len(), 1);
        build(&mut vocab).unwrap();
        assert_eq!(vocab.entry(0).code, vec![0]);
    }

    #[test]
    fn path_indices_address_distinct_internal_nodes_per_depth() {
        let mut vocab = build_vocab(&[("a", 10), ("b", 5), ("c", 3), ("d", 2), ("e", 1), ("f", 1)]);
        let vocab_size = vocab.len();
        build(&mut vocab).unwrap();
        for entry in vocab.iter() {
            let seen: HashSet<i32> = entry.point.iter().copied().collect();
            assert_eq!(seen.len(), entry.point.len(), "path visits no node twice");
            for &p in &entry.point {
                assert!(p >= 0 && (p as usize) < vocab_size - 1);
            }
        }
    }
}
