// storage/file.rs

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde::ser::{SerializeMap, Serializer};

use crate::config::subsystems::CacheFormat;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::matcher::neighborhoods::Neighborhoods;
use crate::types::TermId;
use super::{CacheKey, NeighborhoodStore};

const CACHE_MAGIC: [u8; 8] = *b"MDBSCNB\0";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheHeader {
    magic: [u8; 8],
    version: u32,
    eps1: u64,
    term_count: u64,
}

/// Term table plus, per term, the positions of its neighbors in that table.
#[derive(Debug, Serialize, Deserialize)]
struct CacheBody {
    terms: Vec<String>,
    neighbors: Vec<Vec<TermId>>,
}

/// Neighborhood cache stored as one file per key, in the configured format.
#[derive(Debug, Clone)]
pub struct FileCache {
    format: CacheFormat,
}

impl FileCache {
    pub fn new(format: CacheFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> CacheFormat {
        self.format
    }

    fn read_bincode(&self, path: &Path, key: &CacheKey, corpus: &Corpus) -> Result<Neighborhoods> {
        let mut reader = BufReader::new(File::open(path)?);

        let header: CacheHeader = bincode::deserialize_from(&mut reader)
            .map_err(|e| Error::cache(format!("unreadable header in {:?}: {}", path, e)))?;
        if header.magic != CACHE_MAGIC {
            return Err(Error::cache(format!("{:?} is not a neighborhood cache", path)));
        }
        if header.version != CACHE_VERSION {
            return Err(Error::cache(format!(
                "{:?} has format version {}, expected {}", path, header.version, CACHE_VERSION
            )));
        }
        if header.eps1 != key.eps1() as u64 {
            return Err(Error::cache(format!(
                "{:?} was built with eps1={}, expected {}", path, header.eps1, key.eps1()
            )));
        }
        if header.term_count != corpus.len() as u64 {
            return Err(Error::cache(format!(
                "{:?} holds {} terms, corpus has {}", path, header.term_count, corpus.len()
            )));
        }

        let body: CacheBody = bincode::deserialize_from(&mut reader)
            .map_err(|e| Error::cache(format!("unreadable body in {:?}: {}", path, e)))?;
        if body.terms.len() != body.neighbors.len() {
            return Err(Error::cache(format!(
                "{:?} has {} terms but {} neighbor lists", path, body.terms.len(), body.neighbors.len()
            )));
        }

        let mapping = map_terms(body.terms.iter().map(String::as_str), corpus)?;
        let mut lists = vec![Vec::new(); corpus.len()];
        for (cached_id, neighbors) in body.neighbors.into_iter().enumerate() {
            let resolved = neighbors
                .into_iter()
                .map(|n| mapping.get(n as usize).copied().ok_or_else(|| {
                    Error::cache(format!("neighbor index {} out of range", n))
                }))
                .collect::<Result<Vec<TermId>>>()?;
            lists[mapping[cached_id] as usize] = resolved;
        }
        Neighborhoods::from_lists(lists)
    }

    fn write_bincode(&self, path: &Path, key: &CacheKey, corpus: &Corpus, neighborhoods: &Neighborhoods) -> Result<()> {
        let header = CacheHeader {
            magic: CACHE_MAGIC,
            version: CACHE_VERSION,
            eps1: key.eps1() as u64,
            term_count: corpus.len() as u64,
        };
        let body = CacheBody {
            terms: corpus.terms().to_vec(),
            neighbors: neighborhoods.iter().map(|(_, list)| list.to_vec()).collect(),
        };

        write_atomically(path, |writer| {
            bincode::serialize_into(&mut *writer, &header)?;
            bincode::serialize_into(&mut *writer, &body)?;
            Ok(())
        })
    }

    fn read_json(&self, path: &Path, corpus: &Corpus) -> Result<Neighborhoods> {
        let reader = BufReader::new(File::open(path)?);
        let raw: HashMap<String, Vec<String>> = serde_json::from_reader(reader)
            .map_err(|e| Error::cache(format!("unreadable JSON cache {:?}: {}", path, e)))?;
        if raw.len() != corpus.len() {
            return Err(Error::cache(format!(
                "{:?} holds {} terms, corpus has {}", path, raw.len(), corpus.len()
            )));
        }

        let mut lists: Vec<Option<Vec<TermId>>> = vec![None; corpus.len()];
        for (term, neighbors) in raw {
            let id = corpus.id_of(&term).ok_or_else(|| {
                Error::cache(format!("cached term {:?} is not in the corpus", term))
            })?;
            let resolved = neighbors
                .iter()
                .map(|n| corpus.id_of(n).ok_or_else(|| {
                    Error::cache(format!("cached neighbor {:?} is not in the corpus", n))
                }))
                .collect::<Result<Vec<TermId>>>()?;
            lists[id as usize] = Some(resolved);
        }

        let lists = lists
            .into_iter()
            .enumerate()
            .map(|(id, list)| list.ok_or_else(|| {
                Error::cache(format!("no cached neighborhood for {:?}", corpus.term(id as TermId)))
            }))
            .collect::<Result<Vec<_>>>()?;
        Neighborhoods::from_lists(lists)
    }

    fn write_json(&self, path: &Path, corpus: &Corpus, neighborhoods: &Neighborhoods) -> Result<()> {
        let view = JsonView { corpus, neighborhoods };
        write_atomically(path, |writer| {
            serde_json::to_writer(&mut *writer, &view)?;
            Ok(())
        })
    }
}

impl NeighborhoodStore for FileCache {
    fn load(&self, key: &CacheKey, corpus: &Corpus) -> Result<Option<Neighborhoods>> {
        let path = key.path(self.format);
        if !path.is_file() {
            debug!("No neighborhood cache at {:?}", path);
            return Ok(None);
        }

        let start = Instant::now();
        let neighborhoods = match self.format {
            CacheFormat::Bincode => self.read_bincode(&path, key, corpus)?,
            CacheFormat::Json => self.read_json(&path, corpus)?,
        };
        info!("Loaded {} cached neighborhoods ({}) from {:?} in {:.2?}", neighborhoods.len(), self.format.as_str(), path, start.elapsed());
        Ok(Some(neighborhoods))
    }

    fn store(&self, key: &CacheKey, corpus: &Corpus, neighborhoods: &Neighborhoods) -> Result<()> {
        if neighborhoods.len() != corpus.len() {
            return Err(Error::cache(format!(
                "refusing to cache {} neighborhoods for {} terms", neighborhoods.len(), corpus.len()
            )));
        }

        let path = key.path(self.format);
        let start = Instant::now();
        match self.format {
            CacheFormat::Bincode => self.write_bincode(&path, key, corpus, neighborhoods)?,
            CacheFormat::Json => self.write_json(&path, corpus, neighborhoods)?,
        }
        info!("Cached neighborhoods ({}) to {:?} in {:.2?}", self.format.as_str(), path, start.elapsed());
        Ok(())
    }

    fn invalidate(&self, key: &CacheKey) -> Result<()> {
        let path = key.path(self.format);
        if path.exists() {
            fs::remove_file(&path)?;
            debug!("Removed neighborhood cache {:?}", path);
        }
        Ok(())
    }
}

/// Maps each cached term to its corpus id, requiring the cached term set
/// to be exactly the corpus term set.
fn map_terms<'a, I>(terms: I, corpus: &Corpus) -> Result<Vec<TermId>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = vec![false; corpus.len()];
    let mut mapping = Vec::with_capacity(corpus.len());
    for term in terms {
        let id = corpus.id_of(term).ok_or_else(|| {
            Error::cache(format!("cached term {:?} is not in the corpus", term))
        })?;
        if std::mem::replace(&mut seen[id as usize], true) {
            return Err(Error::cache(format!("cached term {:?} appears twice", term)));
        }
        mapping.push(id);
    }
    if mapping.len() != corpus.len() {
        return Err(Error::cache(format!(
            "cache covers {} of {} corpus terms", mapping.len(), corpus.len()
        )));
    }
    Ok(mapping)
}

/// Writes through a temporary sibling and renames it over `path`, so a
/// crash never leaves a half-written cache behind.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let temp_path = temp_path_for(path);
    let result = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        write(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            fs::rename(&temp_path, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

struct JsonView<'a> {
    corpus: &'a Corpus,
    neighborhoods: &'a Neighborhoods,
}

impl Serialize for JsonView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.neighborhoods.len()))?;
        for (term, neighbors) in self.neighborhoods.to_term_lists(self.corpus) {
            map.serialize_entry(term, &neighbors)?;
        }
        map.end()
    }
}
