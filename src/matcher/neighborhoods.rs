// src/matcher/neighborhoods.rs

use std::time::Instant;
use dashmap::DashMap;
use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{debug, info};
use rayon::prelude::*;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::types::TermId;
use super::index::FuzzyIndex;

/// Per-term eps1 neighborhoods, indexed by [`TermId`]. Each list is
/// ascending and contains the term itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhoods {
    lists: Vec<Vec<TermId>>,
}

impl Neighborhoods {
    /// Wraps raw lists after normalizing order and checking that every id
    /// is in range and every list contains its own term.
    pub fn from_lists(mut lists: Vec<Vec<TermId>>) -> Result<Self> {
        let n = lists.len();
        for (id, list) in lists.iter_mut().enumerate() {
            list.sort_unstable();
            list.dedup();
            if let Some(&bad) = list.iter().find(|&&neighbor| neighbor as usize >= n) {
                return Err(Error::cache(format!(
                    "neighborhood of term {} references unknown term {}", id, bad
                )));
            }
            if list.binary_search(&(id as TermId)).is_err() {
                return Err(Error::cache(format!(
                    "neighborhood of term {} does not contain the term itself", id
                )));
            }
        }
        Ok(Self { lists })
    }

    /// Computes every term's neighborhood through `index`, in parallel on
    /// the current rayon pool.
    ///
    /// Workers write disjoint keys of a shared concurrent map; the map is
    /// only read back after the parallel iterator has joined, so the result
    /// does not depend on scheduling.
    pub fn build(index: &FuzzyIndex, corpus: &Corpus, progress: &ProgressBar) -> Result<Self> {
        let start = Instant::now();
        let max_distance = index.max_distance();
        let shared: DashMap<TermId, Vec<TermId>> = DashMap::with_capacity(corpus.len());

        corpus.terms()
            .par_iter()
            .enumerate()
            .progress_with(progress.clone())
            .try_for_each(|(id, term)| -> Result<()> {
                let neighbors = index.query(term, max_distance)?;
                shared.insert(id as TermId, neighbors);
                Ok(())
            })?;

        let mut lists = Vec::with_capacity(corpus.len());
        for id in corpus.ids() {
            let (_, neighbors) = shared.remove(&id).ok_or_else(|| {
                Error::cache(format!("no neighborhood computed for term {:?}", corpus.term(id)))
            })?;
            lists.push(neighbors);
        }

        let neighborhoods = Self::from_lists(lists)?;
        info!(
            "Built {} neighborhoods in {:.2?} (mean size {:.2})",
            neighborhoods.len(),
            start.elapsed(),
            neighborhoods.mean_size()
        );
        Ok(neighborhoods)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    #[inline]
    pub fn get(&self, id: TermId) -> &[TermId] {
        &self.lists[id as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &[TermId])> {
        self.lists.iter().enumerate().map(|(id, list)| (id as TermId, list.as_slice()))
    }

    pub fn mean_size(&self) -> f64 {
        if self.lists.is_empty() {
            return 0.0;
        }
        let total: usize = self.lists.iter().map(Vec::len).sum();
        total as f64 / self.lists.len() as f64
    }

    /// Number of terms whose neighborhood reaches `min_count`.
    pub fn core_count(&self, min_count: usize) -> usize {
        let count = self.lists.iter().filter(|list| list.len() >= min_count).count();
        debug!("{} of {} terms are core points at min_count={}", count, self.lists.len(), min_count);
        count
    }

    /// Neighborhoods as term strings, in corpus order.
    pub fn to_term_lists<'a>(&'a self, corpus: &'a Corpus) -> impl Iterator<Item = (&'a str, Vec<&'a str>)> + 'a {
        self.iter().map(move |(id, list)| {
            (corpus.term(id), list.iter().map(|&n| corpus.term(n)).collect())
        })
    }
}
