//! Asset sources that the unit loader reads from
//!
//! Unit files ship inside the binary (a `rust-embed` bundle) but the same base
//! path must also resolve against a directory tree on disk. `LayeredSource`
//! stacks the two: embedded bundle, explicit directory, working directory.

use crate::error::{CoreError, CoreResult};
use rust_embed::Embed;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A read-only tree of named files.
///
/// Paths are `/`-separated. `list` returns paths relative to `base`.
pub trait AssetSource: Send + Sync {
    /// All file paths under `base`, relative to it, sorted.
    fn list(&self, base: &str) -> CoreResult<Vec<String>>;

    /// Contents of `base/relpath`, or `None` if this source lacks it.
    fn read(&self, base: &str, relpath: &str) -> CoreResult<Option<Cow<'static, [u8]>>>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Normalize a base path into a `prefix/` form (or `""` for the root).
fn base_prefix(base: &str) -> String {
    let trimmed = base.trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Files compiled into the binary with `#[derive(Embed)]`.
pub struct EmbeddedSource<E: Embed> {
    _bundle: PhantomData<fn() -> E>,
}

impl<E: Embed> EmbeddedSource<E> {
    pub fn new() -> Self {
        Self {
            _bundle: PhantomData,
        }
    }
}

impl<E: Embed> Default for EmbeddedSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Embed> AssetSource for EmbeddedSource<E> {
    fn list(&self, base: &str) -> CoreResult<Vec<String>> {
        let prefix = base_prefix(base);
        let mut files: Vec<String> = E::iter()
            .filter_map(|path| path.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect();
        files.sort();
        Ok(files)
    }

    fn read(&self, base: &str, relpath: &str) -> CoreResult<Option<Cow<'static, [u8]>>> {
        let path = format!("{}{}", base_prefix(base), relpath);
        Ok(E::get(&path).map(|file| file.data))
    }

    fn describe(&self) -> String {
        "embedded bundle".to_string()
    }
}

/// Files under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// A source rooted at the current working directory.
    pub fn current_dir() -> CoreResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| CoreError::IoWithPath {
            path: ".".to_string(),
            source: e,
        })?;
        Ok(Self::new(cwd))
    }

    fn base_dir(&self, base: &str) -> PathBuf {
        let prefix = base_prefix(base);
        if prefix.is_empty() {
            self.root.clone()
        } else {
            self.root.join(prefix.trim_end_matches('/'))
        }
    }
}

/// Recursively collect files under `dir`, recording paths relative to `root`.
fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) -> CoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        if file_type.is_dir() {
            collect_files(root, &path, files)?;
            continue;
        }
        if file_type.is_symlink() && path.is_dir() {
            log::warn!("Skipping symlinked directory {}", path.display());
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let rel: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        files.push(rel.join("/"));
    }
    Ok(())
}

impl AssetSource for DirSource {
    fn list(&self, base: &str) -> CoreResult<Vec<String>> {
        let dir = self.base_dir(base);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        collect_files(&dir, &dir, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn read(&self, base: &str, relpath: &str) -> CoreResult<Option<Cow<'static, [u8]>>> {
        let path = self.base_dir(base).join(relpath);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(Cow::Owned(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Ordered stack of sources.
///
/// Listing uses the first layer that has any file under `base`; reads fall
/// through the layers in order.
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn AssetSource>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a layer with lower priority than the existing ones.
    pub fn push(mut self, layer: impl AssetSource + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// The standard resolution order: embedded bundle `E`, then `dir` if
    /// given, then the current working directory.
    pub fn standard<E: Embed + 'static>(dir: Option<PathBuf>) -> CoreResult<Self> {
        let mut layered = Self::new().push(EmbeddedSource::<E>::new());
        if let Some(dir) = dir {
            layered = layered.push(DirSource::new(dir));
        }
        Ok(layered.push(DirSource::current_dir()?))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl AssetSource for LayeredSource {
    fn list(&self, base: &str) -> CoreResult<Vec<String>> {
        for layer in &self.layers {
            let files = layer.list(base)?;
            if !files.is_empty() {
                log::debug!("Resolved '{}' from {}", base, layer.describe());
                return Ok(files);
            }
        }
        Ok(Vec::new())
    }

    fn read(&self, base: &str, relpath: &str) -> CoreResult<Option<Cow<'static, [u8]>>> {
        for layer in &self.layers {
            if let Some(data) = layer.read(base, relpath)? {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.layers.iter().map(|l| l.describe()).collect();
        format!("layers [{}]", names.join(", "))
    }
}

#[cfg(test)]
#[path = "assets_test.rs"]
mod tests;
