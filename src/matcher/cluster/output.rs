// src/matcher/cluster/output.rs

use std::collections::BTreeMap;
use std::io::Write;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::types::{Label, NOISE_ID};
use super::engine::Clustering;

/// Cluster members grouped by label, in corpus order within each group.
///
/// Serializes to a JSON object keyed by cluster id as a string: `"-1"` for
/// noise (only when there is any) followed by `"0"`, `"1"`, ... in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<String>>")]
pub struct ClusterOutput {
    noise: Vec<String>,
    clusters: Vec<Vec<String>>,
}

impl ClusterOutput {
    pub fn from_clustering(corpus: &Corpus, clustering: &Clustering) -> Self {
        let mut noise = Vec::new();
        let mut clusters = vec![Vec::new(); clustering.cluster_count()];

        for id in corpus.ids() {
            let term = corpus.term(id).to_string();
            match clustering.label(id) {
                Label::Unassigned => noise.push(term),
                Label::Assigned(cluster) => clusters[cluster as usize].push(term),
            }
        }

        Self { noise, clusters }
    }

    pub fn noise(&self) -> &[String] {
        &self.noise
    }

    pub fn clusters(&self) -> &[Vec<String>] {
        &self.clusters
    }

    pub fn cluster(&self, id: usize) -> Option<&[String]> {
        self.clusters.get(id).map(Vec::as_slice)
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Label of `term`, if it was part of the clustered corpus.
    pub fn label_of(&self, term: &str) -> Option<i64> {
        if self.noise.iter().any(|t| t == term) {
            return Some(NOISE_ID);
        }
        self.clusters
            .iter()
            .position(|members| members.iter().any(|t| t == term))
            .map(|id| id as i64)
    }

    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for ClusterOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let noise_entry = usize::from(!self.noise.is_empty());
        let mut map = serializer.serialize_map(Some(self.clusters.len() + noise_entry))?;
        if !self.noise.is_empty() {
            map.serialize_entry(&NOISE_ID.to_string(), &self.noise)?;
        }
        for (id, members) in self.clusters.iter().enumerate() {
            map.serialize_entry(&id.to_string(), members)?;
        }
        map.end()
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for ClusterOutput {
    type Error = String;

    fn try_from(raw: BTreeMap<String, Vec<String>>) -> std::result::Result<Self, Self::Error> {
        let mut noise = Vec::new();
        let mut numbered: BTreeMap<usize, Vec<String>> = BTreeMap::new();

        for (key, members) in raw {
            let id: i64 = key.parse().map_err(|_| format!("cluster key {:?} is not an integer", key))?;
            if id == NOISE_ID {
                noise = members;
            } else if id >= 0 {
                numbered.insert(id as usize, members);
            } else {
                return Err(format!("cluster key {} is negative", id));
            }
        }

        let mut clusters = Vec::with_capacity(numbered.len());
        for (expected, (id, members)) in numbered.into_iter().enumerate() {
            if id != expected {
                return Err(format!("cluster ids are not dense: missing {}", expected));
            }
            clusters.push(members);
        }

        Ok(Self { noise, clusters })
    }
}
