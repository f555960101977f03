//! Input corpus: one term per line, distinct, in file order.

use std::path::{Path, PathBuf};
use ahash::AHashMap;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::types::TermId;
use crate::utils::mmap::MmapFileHandler;

/// The terms being clustered. Each term gets a dense [`TermId`] equal to its
/// position among the non-empty lines of the input.
#[derive(Debug, Clone)]
pub struct Corpus {
    path: Option<PathBuf>,
    terms: Vec<String>,
    lookup: AHashMap<String, TermId>,
}

impl Corpus {
    /// Loads a newline-delimited corpus. Empty lines are skipped; a repeated
    /// non-empty line is an input error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }

        let handler = MmapFileHandler::new(path)?;
        // Passwords average around eight bytes.
        let estimate = handler.get_size() / 8;
        let mut builder = CorpusBuilder::with_capacity(estimate);
        let mut lossy_lines = 0usize;

        for (line_number, bytes) in handler.lines() {
            if bytes.is_empty() {
                continue;
            }
            let term = match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    lossy_lines += 1;
                    String::from_utf8_lossy(bytes).into_owned()
                }
            };
            builder.push(term, line_number)?;
        }

        if lossy_lines > 0 {
            warn!("{} lines of {:?} were not valid UTF-8 and were decoded lossily", lossy_lines, handler.get_path());
        }

        let mut corpus = builder.finish();
        corpus.path = Some(path.to_path_buf());
        info!("Loaded {} terms from {:?}", corpus.len(), path);
        Ok(corpus)
    }

    /// Builds a corpus from in-memory terms, with the same rules as
    /// [`Corpus::from_path`]. Line numbers in errors are 1-based positions
    /// in `terms`.
    pub fn from_terms<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = CorpusBuilder::with_capacity(0);
        for (index, term) in terms.into_iter().enumerate() {
            let term = term.into();
            if term.is_empty() {
                continue;
            }
            builder.push(term, index + 1)?;
        }
        Ok(builder.finish())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[inline]
    pub fn term(&self, id: TermId) -> &str {
        &self.terms[id as usize]
    }

    #[inline]
    pub fn id_of(&self, term: &str) -> Option<TermId> {
        self.lookup.get(term).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = TermId> + ExactSizeIterator {
        0..self.terms.len() as TermId
    }
}

struct CorpusBuilder {
    terms: Vec<String>,
    lookup: AHashMap<String, TermId>,
    lines: Vec<usize>,
}

impl CorpusBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
            lookup: AHashMap::with_capacity(capacity),
            lines: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, term: String, line: usize) -> Result<()> {
        if let Some(&existing) = self.lookup.get(&term) {
            return Err(Error::DuplicateTerm {
                term,
                first_line: self.lines[existing as usize],
                line,
            });
        }
        let id = TermId::try_from(self.terms.len())
            .map_err(|_| Error::input("corpus has more terms than fit in a 32-bit id"))?;
        self.lookup.insert(term.clone(), id);
        self.terms.push(term);
        self.lines.push(line);
        Ok(())
    }

    fn finish(self) -> Corpus {
        Corpus {
            path: None,
            terms: self.terms,
            lookup: self.lookup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_corpus(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn keeps_file_order_and_skips_empty_lines() {
        let file = write_corpus(b"cat\n\nbat\r\nhat\n\n");
        let corpus = Corpus::from_path(file.path()).unwrap();
        assert_eq!(corpus.terms(), &["cat", "bat", "hat"]);
        assert_eq!(corpus.id_of("bat"), Some(1));
        assert_eq!(corpus.term(2), "hat");
        assert_eq!(corpus.path(), Some(file.path()));
    }

    #[test]
    fn whitespace_lines_are_terms() {
        let corpus = Corpus::from_terms(["a", " ", "  "]).unwrap();
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn duplicate_line_is_fatal() {
        let file = write_corpus(b"cat\nbat\n\ncat\n");
        match Corpus::from_path(file.path()) {
            Err(Error::DuplicateTerm { term, first_line, line }) => {
                assert_eq!(term, "cat");
                assert_eq!(first_line, 1);
                assert_eq!(line, 4);
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = Corpus::from_path("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
        assert!(err.is_input());
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let file = write_corpus(b"ok\npass\xffword\n");
        let corpus = Corpus::from_path(file.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert!(corpus.term(1).contains('\u{FFFD}'));
    }
}
