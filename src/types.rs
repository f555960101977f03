use std::fmt;
use std::path::PathBuf;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};

/// Dense index of a term in corpus order.
pub type TermId = u32;

/// Identifier reported for terms that end up in no cluster.
pub const NOISE_ID: i64 = -1;

/// Per-term cluster assignment. Write-once: `Assigned` never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Unassigned,
    Assigned(u32),
}

impl Label {
    #[inline]
    pub fn is_assigned(&self) -> bool {
        matches!(self, Label::Assigned(_))
    }

    /// Numeric form used in output: the cluster id, or -1 for noise.
    #[inline]
    pub fn as_id(&self) -> i64 {
        match self {
            Label::Unassigned => NOISE_ID,
            Label::Assigned(id) => *id as i64,
        }
    }
}

impl Default for Label {
    fn default() -> Self {
        Label::Unassigned
    }
}

/// Which membership test the region growing applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClusterMode {
    /// Classic density reachability over the eps1 neighborhoods.
    Dbscan,
    /// Density reachability gated by the secondary distance to the seed.
    Mdbscan { eps2: f64 },
}

impl ClusterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterMode::Dbscan => "dbscan",
            ClusterMode::Mdbscan { .. } => "mdbscan",
        }
    }
}

impl fmt::Display for ClusterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterMode::Dbscan => write!(f, "{}", self.as_str().to_uppercase()),
            ClusterMode::Mdbscan { eps2 } => write!(f, "{} (eps2={})", self.as_str().to_uppercase(), eps2),
        }
    }
}

/// Clustering parameters as given on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    pub eps1: usize,
    pub eps2: Option<f64>,
    pub min_count: usize,
}

impl ClusterParams {
    pub fn new(eps1: usize, eps2: Option<f64>, min_count: usize) -> Result<Self> {
        let params = Self { eps1, eps2, min_count };
        params.validate()?;
        Ok(params)
    }

    /// Parses `eps1 [eps2] min_count corpus_path`.
    pub fn from_positional<S: AsRef<str>>(args: &[S]) -> Result<(Self, PathBuf)> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        let (eps1, eps2, min_count, path) = match args.as_slice() {
            [eps1, min_count, path] => (*eps1, None, *min_count, *path),
            [eps1, eps2, min_count, path] => (*eps1, Some(*eps2), *min_count, *path),
            _ => {
                return Err(Error::input(format!(
                    "Bad number of arguments: expected `eps1 [eps2] min_count corpus`, got {}",
                    args.len()
                )))
            }
        };

        let eps1 = eps1.trim().parse::<usize>()
            .map_err(|_| Error::input(format!("eps1 must be a non-negative integer: {:?}", eps1)))?;
        let eps2 = match eps2 {
            Some(value) => Some(value.trim().parse::<f64>()
                .map_err(|_| Error::input(format!("eps2 must be a number: {:?}", value)))?),
            None => None,
        };
        let min_count = min_count.trim().parse::<usize>()
            .map_err(|_| Error::input(format!("min_count must be a positive integer: {:?}", min_count)))?;

        Ok((Self::new(eps1, eps2, min_count)?, PathBuf::from(path)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_count == 0 {
            return Err(Error::parameter("min_count", "must be at least 1"));
        }
        if let Some(eps2) = self.eps2 {
            if !(0.0..1.0).contains(&eps2) {
                return Err(Error::parameter("eps2", format!("must be in [0, 1), got {}", eps2)));
            }
        }
        Ok(())
    }

    pub fn mode(&self) -> ClusterMode {
        match self.eps2 {
            Some(eps2) => ClusterMode::Mdbscan { eps2 },
            None => ClusterMode::Dbscan,
        }
    }
}
