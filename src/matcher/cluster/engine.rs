// src/matcher/cluster/engine.rs

//! Stack-based density region growing over precomputed neighborhoods.
//!
//! Terms are visited in corpus order. A term whose neighborhood holds at
//! least `min_count` terms (itself included) and that is still unassigned
//! seeds a new cluster. The cluster grows by popping terms off a stack,
//! assigning them, and, for core terms, pushing their unassigned
//! neighbors. In MDBSCAN mode a neighbor is pushed only when its secondary
//! distance to the cluster's seed is below `eps2`; the check is against
//! the seed, never against the term being expanded.
//!
//! Single-threaded: cluster ids and boundaries depend on visit order.

use std::time::Instant;
use log::debug;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::matcher::algorithms::{JaroWinkler, SecondaryMetric};
use crate::matcher::neighborhoods::Neighborhoods;
use crate::types::{ClusterMode, Label, TermId};

pub struct ClusterEngine<M: SecondaryMetric = JaroWinkler> {
    min_count: usize,
    mode: ClusterMode,
    metric: M,
}

impl ClusterEngine<JaroWinkler> {
    pub fn new(min_count: usize, mode: ClusterMode) -> Self {
        Self::with_metric(min_count, mode, JaroWinkler::new())
    }
}

impl<M: SecondaryMetric> ClusterEngine<M> {
    pub fn with_metric(min_count: usize, mode: ClusterMode, metric: M) -> Self {
        Self { min_count, mode, metric }
    }

    pub fn run(&self, corpus: &Corpus, neighborhoods: &Neighborhoods) -> Result<Clustering> {
        if self.min_count == 0 {
            return Err(Error::parameter("min_count", "must be at least 1"));
        }
        if neighborhoods.len() != corpus.len() {
            return Err(Error::cache(format!(
                "{} neighborhoods for a corpus of {} terms",
                neighborhoods.len(),
                corpus.len()
            )));
        }

        let start = Instant::now();
        let mut labels = vec![Label::Unassigned; corpus.len()];
        let mut seeds: Vec<TermId> = Vec::new();
        let mut stack: Vec<TermId> = Vec::new();

        for initial in corpus.ids() {
            if labels[initial as usize].is_assigned() {
                continue;
            }
            if neighborhoods.get(initial).len() < self.min_count {
                continue;
            }

            let cluster_id = seeds.len() as u32;
            seeds.push(initial);
            let seed_term = corpus.term(initial);
            stack.push(initial);

            while let Some(current) = stack.pop() {
                let label = &mut labels[current as usize];
                if label.is_assigned() {
                    continue;
                }
                *label = Label::Assigned(cluster_id);

                let neighborhood = neighborhoods.get(current);
                if neighborhood.len() < self.min_count {
                    continue;
                }
                for &neighbor in neighborhood {
                    if labels[neighbor as usize].is_assigned() {
                        continue;
                    }
                    if self.admits(seed_term, corpus.term(neighbor)) {
                        stack.push(neighbor);
                    }
                }
            }

            debug!("Cluster {} seeded by {:?}", cluster_id, seed_term);
        }

        let clustering = Clustering { labels, seeds };
        debug!(
            "{} clustering: {} clusters, {} noise terms in {:.2?}",
            self.mode,
            clustering.cluster_count(),
            clustering.noise_count(),
            start.elapsed()
        );
        Ok(clustering)
    }

    #[inline]
    fn admits(&self, seed: &str, candidate: &str) -> bool {
        match self.mode {
            ClusterMode::Dbscan => true,
            ClusterMode::Mdbscan { eps2 } => self.metric.distance(seed, candidate) < eps2,
        }
    }
}

/// Final labels of one clustering run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    labels: Vec<Label>,
    seeds: Vec<TermId>,
}

impl Clustering {
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[inline]
    pub fn label(&self, id: TermId) -> Label {
        self.labels[id as usize]
    }

    /// Seed term of each cluster, indexed by cluster id.
    pub fn seeds(&self) -> &[TermId] {
        &self.seeds
    }

    pub fn cluster_count(&self) -> usize {
        self.seeds.len()
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| !l.is_assigned()).count()
    }
}
