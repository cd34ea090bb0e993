/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! The two collaborator traits the core is driven through (§1, §6): a
//! reader for source text, and a writer factory keyed by output suffix.
//! Production implementations talk to the filesystem; mocks back the
//! integration tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub trait SourceReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// A factory for output files keyed by (base name, suffix) — e.g.
/// `("prog", "ob")` for `prog.ob`.
pub trait OutputSink {
    fn create(&self, base_name: &str, suffix: &str) -> io::Result<Box<dyn Write>>;
}

// --- production implementations ---

pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Writes each output file next to the source, in `dir`.
pub struct FsOutputSink {
    pub dir: PathBuf,
}

impl FsOutputSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl OutputSink for FsOutputSink {
    fn create(&self, base_name: &str, suffix: &str) -> io::Result<Box<dyn Write>> {
        let path = self.dir.join(format!("{base_name}.{suffix}"));
        Ok(Box::new(fs::File::create(path)?))
    }
}

// --- mocks for testing ---

#[derive(Default)]
pub struct MockSourceReader {
    files: HashMap<PathBuf, String>,
}

impl MockSourceReader {
    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(PathBuf::from(path), content.to_string());
    }
}

impl SourceReader for MockSourceReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock file not found: {}", path.display()),
            )
        })
    }
}

/// Captures everything written through it, keyed by `"base.suffix"`, so
/// tests can assert on produced output without touching the filesystem.
#[derive(Default, Clone)]
pub struct MockOutputSink {
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MockOutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, base_name: &str, suffix: &str) -> Option<String> {
        let key = format!("{base_name}.{suffix}");
        self.files
            .borrow()
            .get(&key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn has_file(&self, base_name: &str, suffix: &str) -> bool {
        self.files
            .borrow()
            .contains_key(&format!("{base_name}.{suffix}"))
    }
}

impl OutputSink for MockOutputSink {
    fn create(&self, base_name: &str, suffix: &str) -> io::Result<Box<dyn Write>> {
        let key = format!("{base_name}.{suffix}");
        self.files.borrow_mut().insert(key.clone(), Vec::new());
        Ok(Box::new(MockWriter { key, shared: self.files.clone() }))
    }
}

struct MockWriter {
    key: String,
    shared: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self.shared.borrow_mut();
        let entry = files.entry(self.key.clone()).or_default();
        entry.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_source_reader_serves_added_files() {
        let mut reader = MockSourceReader::default();
        reader.add_file("prog.as", "stop\n");
        assert_eq!(
            reader.read_to_string(Path::new("prog.as")).unwrap(),
            "stop\n"
        );
        assert!(reader.read_to_string(Path::new("missing.as")).is_err());
    }

    #[test]
    fn mock_output_sink_captures_writes_by_suffix() {
        let sink = MockOutputSink::new();
        {
            let mut w = sink.create("prog", "ob").unwrap();
            write!(w, "hello").unwrap();
        }
        assert_eq!(sink.contents("prog", "ob"), Some("hello".to_string()));
        assert!(!sink.has_file("prog", "ent"));
    }

    #[test]
    fn fs_source_reader_reads_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.as");
        fs::write(&path, "stop\n").unwrap();

        let reader = FsSourceReader;
        assert_eq!(reader.read_to_string(&path).unwrap(), "stop\n");
    }

    #[test]
    fn fs_output_sink_writes_a_real_file_next_to_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsOutputSink::new(dir.path());
        {
            let mut w = sink.create("prog", "ob").unwrap();
            write!(w, "c a\n").unwrap();
        }

        let written = fs::read_to_string(dir.path().join("prog.ob")).unwrap();
        assert_eq!(written, "c a\n");
    }
}
