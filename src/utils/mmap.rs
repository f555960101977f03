use std::fs::File;
use std::path::{Path, PathBuf};
use memmap2::Mmap;
use log::debug;
use crate::error::Result;

/// Read-only memory mapping of an input file.
pub struct MmapFileHandler {
    // Empty files cannot be mapped.
    mapped_file: Option<Mmap>,
    file_size: usize,
    file_path: PathBuf,
}

impl MmapFileHandler {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let file = File::open(&file_path)?;
        let file_size = file.metadata()?.len() as usize;

        let mapped_file = if file_size == 0 {
            None
        } else {
            // The corpus is opened read-only and not modified while mapped.
            Some(unsafe { Mmap::map(&file)? })
        };

        debug!("Created memory-mapped file handler for {:?} ({} bytes)", file_path, file_size);

        Ok(Self {
            mapped_file,
            file_size,
            file_path,
        })
    }

    /// Get a reference to the entire file content
    pub fn get_content(&self) -> &[u8] {
        self.mapped_file.as_deref().unwrap_or(&[])
    }

    pub fn get_size(&self) -> usize {
        self.file_size
    }

    pub fn get_path(&self) -> &Path {
        &self.file_path
    }

    /// Lines of the file with their 1-based line numbers. `\n`, `\r\n` and
    /// a lone `\r` each end a line and are stripped.
    pub fn lines(&self) -> LineIterator<'_> {
        LineIterator {
            data: self.get_content(),
            position: 0,
            line_number: 0,
        }
    }
}

pub struct LineIterator<'a> {
    data: &'a [u8],
    position: usize,
    line_number: usize,
}

impl<'a> Iterator for LineIterator<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.data.len() {
            return None;
        }

        let rest = &self.data[self.position..];
        let (line, advance) = match memchr::memchr2(b'\n', b'\r', rest) {
            Some(end) if rest[end] == b'\r' && rest.get(end + 1) == Some(&b'\n') => (&rest[..end], end + 2),
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };

        self.position += advance;
        self.line_number += 1;
        Some((self.line_number, line))
    }
}
