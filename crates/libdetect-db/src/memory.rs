//! The in-memory backend, with file-backed dump/load (spec.md §6 "In-memory
//! backend file format").

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use libdetect_core::Fingerprint;

use crate::database::PackageDatabase;
use crate::error::{Error, Result};
use crate::types::{LibInfo, PkgInfo};

const PKGS_FILE: &str = "db_pkgs.txt";
const LIBS_FILE: &str = "db_libs.txt";
const WEIGHTS_FILE: &str = "db_weights.txt";

/// An in-process database, optionally persisted as three flat text files
/// under [`InMemoryDatabase::dir`].
///
/// Mirrors the reference implementation's `memdb.py`: `packages` counts are
/// signed so that interleaved `add_pkgs`/`remove_pkgs` batches behave
/// exactly like the original's `defaultdict(int)` (a removal with no prior
/// add goes negative rather than panicking or saturating).
pub struct InMemoryDatabase {
    dir: PathBuf,
    api_allowlist: HashSet<String>,
    lib_set: HashSet<String>,
    // hash -> name -> count
    pkgs: HashMap<Fingerprint, HashMap<String, i64>>,
    // hash -> weight (the weight of the last-observed package with that hash)
    weights: HashMap<Fingerprint, u32>,
    // hash -> sorted candidate names
    libs: HashMap<Fingerprint, BTreeSet<String>>,
}

impl InMemoryDatabase {
    /// Construct an empty database rooted at `dir` for dump/load, seeded
    /// with the given API allowlist (spec.md §6 `apis.txt`) and an optional
    /// pre-seeded canonical library name set (`libs.txt`).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, api_allowlist: HashSet<String>, lib_set: HashSet<String>) -> Self {
        Self {
            dir: dir.into(),
            api_allowlist,
            lib_set,
            pkgs: HashMap::new(),
            weights: HashMap::new(),
            libs: HashMap::new(),
        }
    }

    fn pkgs_path(&self) -> PathBuf {
        self.dir.join(PKGS_FILE)
    }
    fn libs_path(&self) -> PathBuf {
        self.dir.join(LIBS_FILE)
    }
    fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_FILE)
    }
}

impl PackageDatabase for InMemoryDatabase {
    fn api_allowlist(&self) -> &HashSet<String> {
        &self.api_allowlist
    }

    fn lib_set(&self) -> &HashSet<String> {
        &self.lib_set
    }

    fn match_libs(&self, hashes: &[Fingerprint]) -> Result<HashMap<Fingerprint, Vec<String>>> {
        let mut out = HashMap::new();
        for hash in hashes {
            if let Some(names) = self.libs.get(hash) {
                if !names.is_empty() {
                    out.insert(*hash, names.iter().cloned().collect());
                }
            }
        }
        Ok(out)
    }

    fn add_pkgs(&mut self, pkgs: &[PkgInfo]) -> Result<()> {
        for pkg in pkgs {
            *self
                .pkgs
                .entry(pkg.hash)
                .or_default()
                .entry(pkg.name.clone())
                .or_insert(0) += 1;
            self.weights.insert(pkg.hash, pkg.weight);
        }
        Ok(())
    }

    fn remove_pkgs(&mut self, pkgs: &[PkgInfo]) -> Result<()> {
        for pkg in pkgs {
            *self
                .pkgs
                .entry(pkg.hash)
                .or_default()
                .entry(pkg.name.clone())
                .or_insert(0) -= 1;
        }
        Ok(())
    }

    fn get_pkgs(&self, threshold: u32) -> Result<Vec<PkgInfo>> {
        let mut out = Vec::new();
        for (hash, names) in &self.pkgs {
            let weight = self.weights.get(hash).copied().unwrap_or(0);
            for (name, count) in names {
                if *count >= i64::from(threshold) {
                    out.push(PkgInfo {
                        hash: *hash,
                        name: name.clone(),
                        weight,
                    });
                }
            }
        }
        Ok(out)
    }

    fn add_libs(&mut self, libs: &[LibInfo]) -> Result<()> {
        for lib in libs {
            self.libs.entry(lib.hash).or_default().insert(lib.name.clone());
            self.lib_set.insert(lib.name.clone());
        }
        Ok(())
    }

    fn preload(&mut self) -> Result<()> {
        // Already resident; nothing to do.
        Ok(())
    }

    fn dump(&self) -> Result<()> {
        let mut pkgs_buf = String::new();
        for (hash, names) in &self.pkgs {
            for (name, count) in names {
                pkgs_buf.push_str(&format!("{} {name} {count}\n", hash.to_hex()));
            }
        }
        write_file(&self.pkgs_path(), &pkgs_buf)?;

        let mut libs_buf = String::new();
        for (hash, names) in &self.libs {
            for name in names {
                libs_buf.push_str(&format!("{} {name}\n", hash.to_hex()));
            }
        }
        write_file(&self.libs_path(), &libs_buf)?;

        let mut weights_buf = String::new();
        for (hash, weight) in &self.weights {
            weights_buf.push_str(&format!("{} {weight}\n", hash.to_hex()));
        }
        write_file(&self.weights_path(), &weights_buf)?;

        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        self.pkgs.clear();
        self.weights.clear();
        self.libs.clear();

        load_lines(&self.pkgs_path(), |path, line_no, line| {
            let (hash_str, rest) = split_once_ws(line)
                .ok_or_else(|| malformed(path, line_no, line))?;
            let (name, count_str) = rest
                .rsplit_once(' ')
                .ok_or_else(|| malformed(path, line_no, line))?;
            let hash = parse_hash(path, line_no, hash_str)?;
            let count: i64 = count_str
                .parse()
                .map_err(|_| malformed(path, line_no, line))?;
            *self.pkgs.entry(hash).or_default().entry(name.to_string()).or_insert(0) += count;
            Ok(())
        })?;

        load_lines(&self.libs_path(), |path, line_no, line| {
            let (hash_str, name) =
                split_once_ws(line).ok_or_else(|| malformed(path, line_no, line))?;
            let hash = parse_hash(path, line_no, hash_str)?;
            self.libs.entry(hash).or_default().insert(name.to_string());
            self.lib_set.insert(name.to_string());
            Ok(())
        })?;

        load_lines(&self.weights_path(), |path, line_no, line| {
            let (hash_str, weight_str) =
                split_once_ws(line).ok_or_else(|| malformed(path, line_no, line))?;
            let hash = parse_hash(path, line_no, hash_str)?;
            let weight: u32 = weight_str
                .parse()
                .map_err(|_| malformed(path, line_no, line))?;
            self.weights.insert(hash, weight);
            Ok(())
        })?;

        Ok(())
    }
}

fn split_once_ws(line: &str) -> Option<(&str, &str)> {
    line.split_once(' ')
}

fn malformed(path: &Path, line_no: usize, content: &str) -> Error {
    Error::MalformedLine {
        path: path.to_path_buf(),
        line_no,
        content: content.to_string(),
    }
}

fn parse_hash(path: &Path, line_no: usize, s: &str) -> Result<Fingerprint> {
    Fingerprint::from_hex(s).map_err(|source| Error::InvalidHash {
        path: path.to_path_buf(),
        line_no,
        source,
    })
}

/// Read `path` line by line, tolerating a missing file as empty (spec.md §7
/// "File-not-found on load ... recoverable; treated as empty database").
fn load_lines(path: &Path, mut f: impl FnMut(&Path, usize, &str) -> Result<()>) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(target = "libdetect.db", path = %path.display(), "database file not found, treating as empty");
            return Ok(());
        }
        Err(source) => {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    for (idx, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        f(path, idx + 1, line)?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let tmp_path = path.with_extension(format!("tmp.{}", std::process::id()));
    let mut file = fs::File::create(&tmp_path).map_err(|source| Error::Io {
        path: tmp_path.clone(),
        source,
    })?;
    file.write_all(contents.as_bytes()).map_err(|source| Error::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
