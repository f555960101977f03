// src/matcher/index.rs

//! Deletion-variant index for exact bounded edit-distance lookup.
//!
//! If `lev(a, b) <= k`, deleting at most `k` characters from each of `a` and
//! `b` yields a common string: drop the substituted and deleted positions
//! from `a`, the substituted and inserted positions from `b`. Indexing every
//! corpus term under all of its `<= k` deletion variants therefore finds
//! every true match by probing with the query's own variants. Collisions
//! admit some false candidates, which are removed by verifying the real
//! distance.

use ahash::{AHashMap, AHashSet};
use indicatif::ProgressBar;
use log::{debug, info};
use rayon::prelude::*;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::types::TermId;
use super::algorithms::bounded_levenshtein_chars;

/// Terms whose variants are generated in parallel before being merged.
const BUILD_CHUNK: usize = 1 << 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub terms: usize,
    pub variant_keys: usize,
    pub postings: usize,
}

pub struct FuzzyIndex {
    max_distance: usize,
    deletes: AHashMap<String, Vec<TermId>>,
    terms: Vec<Box<[char]>>,
}

impl FuzzyIndex {
    pub fn build(corpus: &Corpus, max_distance: usize) -> Self {
        Self::build_with_progress(corpus, max_distance, &ProgressBar::hidden())
    }

    /// Builds the index, ticking `progress` once per indexed term. Variant
    /// generation runs on the current rayon pool; postings are merged in
    /// term order so every posting list is ascending.
    pub fn build_with_progress(corpus: &Corpus, max_distance: usize, progress: &ProgressBar) -> Self {
        info!("Building deletion index over {} terms (max distance {})", corpus.len(), max_distance);

        let mut deletes: AHashMap<String, Vec<TermId>> = AHashMap::with_capacity(corpus.len());
        let terms: Vec<Box<[char]>> = corpus.terms()
            .iter()
            .map(|t| t.chars().collect::<Vec<_>>().into_boxed_slice())
            .collect();

        for (chunk_index, chunk) in corpus.terms().chunks(BUILD_CHUNK).enumerate() {
            let base = chunk_index * BUILD_CHUNK;
            let variants: Vec<AHashSet<String>> = chunk
                .par_iter()
                .map(|term| deletion_variants(term, max_distance))
                .collect();

            for (offset, term_variants) in variants.into_iter().enumerate() {
                let id = (base + offset) as TermId;
                for variant in term_variants {
                    deletes.entry(variant).or_default().push(id);
                }
            }
            progress.inc(chunk.len() as u64);
        }

        let index = Self { max_distance, deletes, terms };
        let stats = index.stats();
        debug!("Deletion index: {} variant keys, {} postings", stats.variant_keys, stats.postings);
        index
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            terms: self.terms.len(),
            variant_keys: self.deletes.len(),
            postings: self.deletes.values().map(Vec::len).sum(),
        }
    }

    /// Ids of all indexed terms within `max_distance` edits of `term`, in
    /// ascending order. Includes `term` itself when it is indexed.
    pub fn query(&self, term: &str, max_distance: usize) -> Result<Vec<TermId>> {
        if max_distance > self.max_distance {
            return Err(Error::parameter(
                "max_distance",
                format!("query distance {} exceeds the index build distance {}", max_distance, self.max_distance),
            ));
        }

        let query_chars: Vec<char> = term.chars().collect();
        let mut candidates: Vec<TermId> = Vec::new();
        for variant in deletion_variants(term, max_distance) {
            if let Some(postings) = self.deletes.get(&variant) {
                candidates.extend_from_slice(postings);
            }
        }
        candidates.sort_unstable();
        candidates.dedup();

        candidates.retain(|&id| {
            bounded_levenshtein_chars(&query_chars, &self.terms[id as usize], max_distance).is_some()
        });
        Ok(candidates)
    }
}

/// All distinct strings reachable from `term` by deleting at most
/// `max_distance` characters, `term` included. Generated one deletion level
/// at a time; at most `sum(C(len, k))` for `k <= max_distance`.
pub fn deletion_variants(term: &str, max_distance: usize) -> AHashSet<String> {
    let mut variants = AHashSet::new();
    variants.insert(term.to_string());

    let mut frontier: Vec<Vec<char>> = vec![term.chars().collect()];
    for _ in 0..max_distance {
        let mut next = Vec::new();
        for chars in &frontier {
            for position in 0..chars.len() {
                let mut variant = chars.clone();
                variant.remove(position);
                if variants.insert(variant.iter().collect()) {
                    next.push(variant);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::algorithms::levenshtein_distance;

    fn names(corpus: &Corpus, ids: &[TermId]) -> Vec<String> {
        ids.iter().map(|&id| corpus.term(id).to_string()).collect()
    }

    #[test]
    fn variants_of_short_terms() {
        let v = deletion_variants("abc", 1);
        let mut v: Vec<_> = v.into_iter().collect();
        v.sort();
        assert_eq!(v, vec!["ab", "abc", "ac", "bc"]);

        assert_eq!(deletion_variants("abc", 5).len(), 8);
        assert_eq!(deletion_variants("aaa", 2).len(), 3);
        assert_eq!(deletion_variants("xyz", 0).len(), 1);
    }

    #[test]
    fn finds_scenario_neighborhoods() {
        let corpus = Corpus::from_terms(["cat", "bat", "hat", "dog"]).unwrap();
        let index = FuzzyIndex::build(&corpus, 1);
        assert_eq!(names(&corpus, &index.query("cat", 1).unwrap()), ["cat", "bat", "hat"]);
        assert_eq!(names(&corpus, &index.query("dog", 1).unwrap()), ["dog"]);
        assert_eq!(names(&corpus, &index.query("at", 1).unwrap()), ["cat", "bat", "hat"]);
    }

    #[test]
    fn collisions_are_verified_away() {
        // "ab" and "ba" share the variants "a" and "b" but are 2 edits apart.
        let corpus = Corpus::from_terms(["ab", "ba"]).unwrap();
        let index = FuzzyIndex::build(&corpus, 1);
        assert_eq!(index.query("ab", 1).unwrap(), vec![0]);
    }

    #[test]
    fn smaller_query_distance_is_allowed() {
        let corpus = Corpus::from_terms(["color", "colour", "colors"]).unwrap();
        let index = FuzzyIndex::build(&corpus, 2);
        assert_eq!(index.query("colour", 2).unwrap(), vec![0, 1, 2]);
        assert_eq!(index.query("colour", 1).unwrap(), vec![0, 1]);
        assert!(index.query("colour", 3).is_err());
    }

    #[test]
    fn matches_brute_force() {
        let words = [
            "password", "passw0rd", "pass", "passwords", "Password1", "123456",
            "1234567", "12345", "qwerty", "qwert", "dragon", "drag0n", "a", "", "ab",
        ];
        let corpus = Corpus::from_terms(words).unwrap();
        for k in 0..=2 {
            let index = FuzzyIndex::build(&corpus, k);
            for term in corpus.terms() {
                let expected: Vec<TermId> = corpus.ids()
                    .filter(|&id| levenshtein_distance(term, corpus.term(id)) <= k)
                    .collect();
                assert_eq!(index.query(term, k).unwrap(), expected, "term {:?} k={}", term, k);
            }
        }
    }

    #[test]
    fn stats_count_keys_and_postings() {
        let corpus = Corpus::from_terms(["ab", "ba"]).unwrap();
        let index = FuzzyIndex::build(&corpus, 1);
        let stats = index.stats();
        assert_eq!(stats.terms, 2);
        // ab, ba, a, b
        assert_eq!(stats.variant_keys, 4);
        assert_eq!(stats.postings, 6);
    }
}
