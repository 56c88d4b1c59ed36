//! Asset download cache for incremental builds.
//!
//! Downloading image variants is the slow part of the build pipeline: every
//! project photo is fetched at several widths through the CMS image API, and
//! the bytes rarely change between builds. This module lets the process stage
//! skip a download when the same upstream file at the same transform
//! parameters is already on disk.
//!
//! # Design
//!
//! The cache is **content-addressed**: lookups are by the combination of
//! `url_hash` and `params_hash`, not by output file path. Assets keep their
//! upstream URL across publishes unless the underlying file changes, so
//! retitling projects or reordering galleries never invalidates the cache;
//! only a re-uploaded file or changed transform settings do.
//!
//! - **`url_hash`**: SHA-256 of the normalized upstream URL. The CMS embeds
//!   a content token in asset URLs, so a changed file means a changed URL.
//! - **`params_hash`**: SHA-256 of the transform parameters. For variants
//!   this covers (width, format, quality); originals hash a fixed marker.
//!   Any config change re-downloads at the new settings.
//!
//! A cache hit requires:
//! 1. An entry with matching `url_hash` and `params_hash` exists
//! 2. The previously-written file still exists on disk
//!
//! ## Storage
//!
//! The cache manifest is a JSON file at `<assets_dir>/.cache-manifest.json`.
//! It lives alongside the downloaded files so it travels with the temp
//! directory when cached in CI (e.g. `actions/cache` on the temp dir).
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to the `build` or `process` command to force a full
//! re-download. This loads an empty manifest, so every asset is fetched
//! again. Old files are overwritten naturally.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the assets directory.
const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// A single cached download.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub url_hash: String,
    pub params_hash: String,
}

/// On-disk cache manifest mapping asset filenames to their cache entries.
///
/// Lookups go through a runtime `content_index` that maps
/// `"{url_hash}:{params_hash}"` to the stored filename. Built at load time,
/// maintained on insert, never serialized.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or first build).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the assets directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(assets_dir: &Path) -> Self {
        let path = manifest_path(assets_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(_) => return Self::empty(),
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.content_index = build_content_index(&manifest.entries);
        manifest
    }

    /// Save to the assets directory.
    pub fn save(&self, assets_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(assets_dir), json)
    }

    /// Look up a cached download by content hashes.
    ///
    /// Returns `Some(filename)` if an entry with matching `url_hash` and
    /// `params_hash` exists **and** the file is still on disk under
    /// `assets_dir`.
    pub fn find_cached(
        &self,
        url_hash: &str,
        params_hash: &str,
        assets_dir: &Path,
    ) -> Option<String> {
        let content_key = format!("{}:{}", url_hash, params_hash);
        let stored = self.content_index.get(&content_key)?;
        if assets_dir.join(stored).exists() {
            Some(stored.clone())
        } else {
            None
        }
    }

    /// Record a cache entry for a downloaded file.
    ///
    /// If an entry with the same content (url_hash + params_hash) already
    /// exists under a different filename, the old entry is removed so the
    /// manifest stays clean when naming settings change.
    pub fn insert(&mut self, filename: String, url_hash: String, params_hash: String) {
        let content_key = format!("{}:{}", url_hash, params_hash);

        if let Some(old) = self.content_index.get(&content_key)
            && *old != filename
        {
            self.entries.remove(old.as_str());
        }

        self.content_index.insert(content_key, filename.clone());
        self.entries.insert(
            filename,
            CacheEntry {
                url_hash,
                params_hash,
            },
        );
    }
}

/// Build the content_index reverse map from the entries map.
fn build_content_index(entries: &HashMap<String, CacheEntry>) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(filename, entry)| {
            let content_key = format!("{}:{}", entry.url_hash, entry.params_hash);
            (content_key, filename.clone())
        })
        .collect()
}

/// SHA-256 hash of an upstream URL, returned as a hex string.
pub fn hash_url(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{:x}", digest)
}

/// SHA-256 hash of transform parameters for an image variant.
///
/// Inputs: target width, output format, and quality. If any of these
/// change, the previously cached download is invalid.
pub fn hash_variant_params(width: u32, format: &str, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"variant\0");
    hasher.update(width.to_le_bytes());
    hasher.update(format.as_bytes());
    hasher.update(b"\0");
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Params hash for an untransformed download (resume attachment).
pub fn hash_original_params() -> String {
    let digest = Sha256::digest(b"original\0");
    format!("{:x}", digest)
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} downloaded ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} downloaded", self.misses)
        }
    }
}

/// Resolve the cache manifest path for an assets directory.
pub fn manifest_path(assets_dir: &Path) -> PathBuf {
    assets_dir.join(MANIFEST_FILENAME)
}
