// src/matrix/mod.rs

pub mod npy;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{debug, info};
use rayon::prelude::*;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::matcher::algorithms::levenshtein_chars;
use crate::matcher::neighborhoods::Neighborhoods;
use crate::types::TermId;
use crate::utils::MmapFileHandler;

/// Dense pairwise Levenshtein distances, row-major, one signed byte each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<i8>,
}

impl DistanceMatrix {
    /// Brute-force computation over every pair, one row per rayon task.
    ///
    /// Fails with a representation error if any distance exceeds 127.
    pub fn compute(corpus: &Corpus, progress: &ProgressBar) -> Result<Self> {
        let start = Instant::now();
        let size = corpus.len();
        let chars: Vec<Vec<char>> = corpus.terms().iter().map(|t| t.chars().collect()).collect();
        let mut cells = vec![0i8; npy::square_len(size)?];

        if size > 0 {
            cells
                .par_chunks_mut(size)
                .enumerate()
                .progress_with(progress.clone())
                .try_for_each(|(row, out)| -> Result<()> {
                    for (col, cell) in out.iter_mut().enumerate() {
                        if row == col {
                            continue;
                        }
                        let distance = levenshtein_chars(&chars[row], &chars[col]);
                        *cell = i8::try_from(distance).map_err(|_| Error::Representation {
                            distance,
                            left: corpus.term(row as TermId).to_string(),
                            right: corpus.term(col as TermId).to_string(),
                        })?;
                    }
                    Ok(())
                })?;
        }
        progress.finish_and_clear();

        info!("Computed {}x{} distance matrix in {:.2?}", size, size, start.elapsed());
        Ok(Self { size, cells })
    }

    /// Wraps raw cells, checking shape and that the diagonal is zero and no
    /// entry is negative.
    pub fn from_cells(size: usize, cells: Vec<i8>) -> Result<Self> {
        if cells.len() != npy::square_len(size)? {
            return Err(Error::matrix(format!("{} cells do not form a {}x{} matrix", cells.len(), size, size)));
        }
        if let Some(pos) = cells.iter().position(|&d| d < 0) {
            return Err(Error::matrix(format!("negative distance at ({}, {})", pos / size, pos % size)));
        }
        if let Some(i) = (0..size).find(|&i| cells[i * size + i] != 0) {
            return Err(Error::matrix(format!("non-zero diagonal at row {}", i)));
        }
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> i8 {
        self.cells[row * self.size + col]
    }

    pub fn row(&self, row: usize) -> &[i8] {
        &self.cells[row * self.size..(row + 1) * self.size]
    }

    pub fn write_npy<W: std::io::Write>(&self, writer: W) -> Result<()> {
        npy::write_square_i8(writer, self.size, &self.cells)
    }

    pub fn read_npy(bytes: &[u8]) -> Result<Self> {
        let (size, cells) = npy::read_square_i8(bytes)?;
        Self::from_cells(size, cells)
    }

    /// Writes through a temporary sibling, then renames into place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        if let Err(e) = self.write_npy(BufWriter::new(File::create(&temp_path)?)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        fs::rename(&temp_path, path)?;
        debug!("Saved distance matrix to {:?}", path);
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let handler = MmapFileHandler::new(path)?;
        let matrix = Self::read_npy(handler.get_content())?;
        info!("Loaded {}x{} distance matrix from {:?}", matrix.size, matrix.size, path);
        Ok(matrix)
    }

    /// Neighborhoods at `eps1` read off the rows of the matrix. Row `i` must
    /// describe corpus term `i`.
    pub fn neighborhoods(&self, corpus: &Corpus, eps1: usize) -> Result<Neighborhoods> {
        if self.size != corpus.len() {
            return Err(Error::input(format!(
                "distance matrix is {}x{} but the corpus has {} terms", self.size, self.size, corpus.len()
            )));
        }
        let lists = (0..self.size)
            .into_par_iter()
            .map(|row| {
                self.row(row)
                    .iter()
                    .enumerate()
                    .filter(|(_, &d)| (d as usize) <= eps1)
                    .map(|(col, _)| col as TermId)
                    .collect()
            })
            .collect();
        Neighborhoods::from_lists(lists)
    }
}

/// Path the generator writes for `corpus_path`: `<stem>_distance_matrix.npy`
/// in the same directory.
pub fn matrix_path_for(corpus_path: &Path) -> PathBuf {
    let stem = corpus_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    corpus_path.with_file_name(format!("{}_distance_matrix.npy", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::index::FuzzyIndex;

    fn corpus() -> Corpus {
        Corpus::from_terms(["cat", "bat", "hat", "dog", "color", "colour"]).unwrap()
    }

    #[test]
    fn computes_symmetric_distances() {
        let m = DistanceMatrix::compute(&corpus(), &ProgressBar::hidden()).unwrap();
        assert_eq!(m.size(), 6);
        assert_eq!(m.get(0, 1), 1);
        assert_eq!(m.get(0, 3), 3);
        assert_eq!(m.get(4, 5), 1);
        for i in 0..6 {
            assert_eq!(m.get(i, i), 0);
            for j in 0..6 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
    }

    #[test]
    fn overflow_is_an_error() {
        let long = "a".repeat(130);
        let c = Corpus::from_terms(["b", long.as_str()]).unwrap();
        let err = DistanceMatrix::compute(&c, &ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, Error::Representation { distance: 130, .. }));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.npy");
        let m = DistanceMatrix::compute(&corpus(), &ProgressBar::hidden()).unwrap();
        m.save(&path).unwrap();
        assert_eq!(DistanceMatrix::load(&path).unwrap(), m);
    }

    #[test]
    fn neighborhoods_match_the_index() {
        let c = corpus();
        let m = DistanceMatrix::compute(&c, &ProgressBar::hidden()).unwrap();
        for eps1 in 0..3 {
            let index = FuzzyIndex::build(&c, eps1);
            let expected = Neighborhoods::build(&index, &c, &ProgressBar::hidden()).unwrap();
            assert_eq!(m.neighborhoods(&c, eps1).unwrap(), expected);
        }
    }

    #[test]
    fn shape_mismatch_is_an_input_error() {
        let m = DistanceMatrix::from_cells(2, vec![0, 1, 1, 0]).unwrap();
        let err = m.neighborhoods(&corpus(), 1).unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn rejects_bad_cells() {
        assert!(DistanceMatrix::from_cells(2, vec![0, 1, 1]).is_err());
        assert!(DistanceMatrix::from_cells(2, vec![1, 1, 1, 0]).is_err());
        assert!(DistanceMatrix::from_cells(2, vec![0, -1, 1, 0]).is_err());
        assert!(matches!(DistanceMatrix::from_cells(1 << 32, Vec::new()), Err(Error::MatrixFormat(_))));
    }

    #[test]
    fn huge_header_without_data_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.npy");
        let header = npy::header_for(1 << 32);
        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&header);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(DistanceMatrix::load(&path), Err(Error::MatrixFormat(_))));
    }

    #[test]
    fn output_path_uses_stem() {
        assert_eq!(
            matrix_path_for(Path::new("/lists/rockyou.txt")),
            PathBuf::from("/lists/rockyou_distance_matrix.npy")
        );
    }
}
