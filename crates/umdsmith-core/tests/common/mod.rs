#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use umdsmith_core::{
    BundleError, CompileOptions, Compiler, FileSystem, MockFileSystem, PackageBundler,
};

pub const CORE: &str = "function BT() {}\n";

/// Bundler double that records every invocation
pub struct RecordingBundler {
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    outcome: Result<String, String>,
}

impl RecordingBundler {
    pub fn returning(text: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Ok(text.to_string()),
        }
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Err(stderr.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl PackageBundler for RecordingBundler {
    fn bundle(&self, basedir: &Path, packages: &[String]) -> Result<String, BundleError> {
        self.calls
            .lock()
            .unwrap()
            .push((basedir.to_path_buf(), packages.to_vec()));

        self.outcome.clone().map_err(|stderr| BundleError::Failed {
            program: "fake-bundler".to_string(),
            status: "exit status: 1".to_string(),
            stderr,
        })
    }
}

/// File system double that counts reads
#[derive(Default)]
pub struct CountingFileSystem {
    inner: MockFileSystem,
    reads: AtomicUsize,
}

impl CountingFileSystem {
    pub fn with_core() -> Self {
        let fs = Self::default();
        fs.inner.add_file("core.js", CORE);
        fs
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FileSystem for CountingFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_file(path)
    }
}

pub fn compiler(fs: Arc<CountingFileSystem>, bundler: Arc<RecordingBundler>) -> Compiler {
    Compiler::new(fs, bundler)
}

/// Compiler over the stock core library with a bundler that must not run
pub fn default_compiler() -> Compiler {
    compiler(
        Arc::new(CountingFileSystem::with_core()),
        Arc::new(RecordingBundler::failing("bundler should not run")),
    )
}

pub fn options() -> CompileOptions {
    let mut options = CompileOptions::new("out.js", "core.js");
    options.dirname = Some(PathBuf::from("."));
    options
}
