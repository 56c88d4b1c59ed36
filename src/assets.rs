//! Asset downloading and responsive variant generation.
//!
//! Stage 2 of the build pipeline. Takes the manifest from the fetch stage
//! and downloads every referenced asset: images at each configured width
//! through the CMS image API, plain files (the resume attachment) as-is.
//!
//! ## Transforms
//!
//! Image resizing happens server-side. Each variant is requested with the
//! image API's query parameters:
//!
//! ```text
//! {asset_url}?w={width}&fm={format}&q={quality}&fit=scale
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! assets/
//! ├── .cache-manifest.json       # Download cache bookkeeping
//! ├── content.json               # Updated manifest with local file paths
//! ├── 5FjmZl7VGUyQm2qo-400.webp  # One file per asset per width
//! ├── 5FjmZl7VGUyQm2qo-800.webp
//! ├── 5FjmZl7VGUyQm2qo-1200.webp
//! └── 2xKpQsTn0cWHk3I1.pdf       # Resume attachment, original bytes
//! ```
//!
//! Filenames are deterministic: the asset id (or a URL hash when the id is
//! unusable) plus the width and format. Re-running the stage overwrites in
//! place.
//!
//! ## Caching and parallelism
//!
//! Downloads run in parallel using [rayon](https://docs.rs/rayon). The
//! [cache](crate::cache) skips any download whose upstream URL and transform
//! parameters are unchanged since the last build.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::ImagesConfig;
use crate::content::{AssetRef, SiteContent};
use crate::fetch::{FetchError, HttpTransport, Transport};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Progress events emitted while the stage runs, consumed by the CLI's
/// printer thread.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// File was fetched from the CMS.
    Downloaded { filename: String },
    /// File was reused from the download cache.
    Cached { filename: String },
}

/// Result of the process stage: the manifest with local paths filled in,
/// plus cache accounting for the run.
pub struct ProcessResult {
    pub content: SiteContent,
    pub cache_stats: CacheStats,
}

/// One pending download.
#[derive(Debug, Clone)]
struct WorkItem {
    filename: String,
    request_url: String,
    url_hash: String,
    params_hash: String,
}

pub fn process(
    manifest_path: &Path,
    assets_dir: &Path,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let transport = HttpTransport::new();
    process_with_transport(&transport, manifest_path, assets_dir, use_cache, events)
}

/// Download assets through the given transport (allows testing with a mock).
pub fn process_with_transport(
    transport: &impl Transport,
    manifest_path: &Path,
    assets_dir: &Path,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let manifest_content = std::fs::read_to_string(manifest_path)?;
    let mut content: SiteContent = serde_json::from_str(&manifest_content)?;

    std::fs::create_dir_all(assets_dir)?;

    let mut manifest = if use_cache {
        CacheManifest::load(assets_dir)
    } else {
        CacheManifest::empty()
    };

    let work = collect_work(&content);
    let mut stats = CacheStats::default();
    let mut pending = Vec::new();

    for item in work {
        match manifest.find_cached(&item.url_hash, &item.params_hash, assets_dir) {
            Some(cached) if cached == item.filename => {
                stats.hit();
                emit(
                    &events,
                    ProcessEvent::Cached {
                        filename: item.filename,
                    },
                );
            }
            Some(cached) => {
                // Same upstream bytes already on disk under another name
                // (two assets sharing a URL). Copy instead of re-fetching.
                std::fs::copy(assets_dir.join(&cached), assets_dir.join(&item.filename))?;
                manifest.insert(item.filename.clone(), item.url_hash, item.params_hash);
                stats.hit();
                emit(
                    &events,
                    ProcessEvent::Cached {
                        filename: item.filename,
                    },
                );
            }
            None => pending.push(item),
        }
    }

    pending.par_iter().try_for_each(|item| {
        let bytes = transport.get_bytes(&item.request_url)?;
        std::fs::write(assets_dir.join(&item.filename), &bytes)?;
        emit(
            &events,
            ProcessEvent::Downloaded {
                filename: item.filename.clone(),
            },
        );
        Ok::<(), ProcessError>(())
    })?;

    for item in pending {
        manifest.insert(item.filename, item.url_hash, item.params_hash);
        stats.miss();
    }
    manifest.save(assets_dir)?;

    apply_local_paths(&mut content);

    Ok(ProcessResult {
        content,
        cache_stats: stats,
    })
}

fn emit(events: &Option<Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}

/// Collect every download the manifest calls for, deduplicated by output
/// filename. The same asset linked from several places downloads once.
fn collect_work(content: &SiteContent) -> Vec<WorkItem> {
    let images = &content.config.images;
    let mut work: BTreeMap<String, WorkItem> = BTreeMap::new();

    for asset in content.image_assets() {
        let Some(url) = asset.url.as_deref() else {
            continue;
        };
        let Some(stem) = asset_stem(asset) else {
            continue;
        };
        let url_hash = cache::hash_url(url);
        for &width in &images.widths {
            let filename = variant_filename(&stem, width, &images.format);
            work.entry(filename.clone()).or_insert_with(|| WorkItem {
                filename,
                request_url: variant_url(url, width, images),
                url_hash: url_hash.clone(),
                params_hash: cache::hash_variant_params(width, &images.format, images.quality),
            });
        }
    }

    let attachment = content.resume.as_ref().and_then(|r| r.attachment.as_ref());
    if let Some(asset) = attachment
        && let Some(url) = asset.url.as_deref()
        && let Some(filename) = original_filename(asset)
    {
        work.entry(filename.clone()).or_insert_with(|| WorkItem {
            filename,
            request_url: url.to_string(),
            url_hash: cache::hash_url(url),
            params_hash: cache::hash_original_params(),
        });
    }

    work.into_values().collect()
}

/// Record the downloaded files on the manifest so the generate stage can
/// link to them.
fn apply_local_paths(content: &mut SiteContent) {
    let widths = content.config.images.widths.clone();
    let format = content.config.images.format.clone();

    for asset in content.image_assets_mut() {
        let Some(stem) = asset_stem(asset) else {
            continue;
        };
        for &width in &widths {
            asset
                .variants
                .insert(width, variant_filename(&stem, width, &format));
        }
    }

    let attachment = content.resume.as_mut().and_then(|r| r.attachment.as_mut());
    if let Some(asset) = attachment {
        asset.local_path = original_filename(asset);
    }
}

/// Local filename stem for an asset: the CMS id when it is filesystem-safe,
/// otherwise a short hash of the URL. `None` when the asset has no URL to
/// download from.
fn asset_stem(asset: &AssetRef) -> Option<String> {
    let url = asset.url.as_deref()?;
    asset
        .id
        .as_deref()
        .filter(|id| is_safe_stem(id))
        .map(str::to_string)
        .or_else(|| Some(cache::hash_url(url)[..12].to_string()))
}

fn is_safe_stem(stem: &str) -> bool {
    !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn variant_filename(stem: &str, width: u32, format: &str) -> String {
    format!("{stem}-{width}.{format}")
}

/// Image API request URL for one variant.
fn variant_url(base: &str, width: u32, images: &ImagesConfig) -> String {
    format!(
        "{base}?w={width}&fm={format}&q={quality}&fit=scale",
        format = images.format,
        quality = images.quality,
    )
}

/// Filename for an untransformed download, keeping the upstream extension.
fn original_filename(asset: &AssetRef) -> Option<String> {
    let url = asset.url.as_deref()?;
    let stem = asset_stem(asset)?;
    let without_query = match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    };
    match Path::new(without_query).extension().and_then(|e| e.to_str()) {
        Some(ext) => Some(format!("{stem}.{ext}")),
        None => Some(stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::{LandingLayout, Project, ResumeLayout};
    use crate::fetch::tests::{MockTransport, RecordedRequest};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn image(id: &str, file: &str) -> AssetRef {
        AssetRef {
            id: Some(id.to_string()),
            url: Some(format!("https://images.ctfassets.net/s/{file}")),
            title: Some(id.to_string()),
            ..Default::default()
        }
    }

    /// Two projects sharing one photo, plus a resume attachment.
    /// Widths trimmed to two so expected download counts stay small.
    fn test_content() -> SiteContent {
        let mut config = SiteConfig::default();
        config.images.widths = vec![400, 800];

        SiteContent {
            landing: Some(LandingLayout {
                statement: None,
                projects: vec![
                    Project {
                        title: Some("One".into()),
                        slug: Some("one".into()),
                        preview: Some(image("prev1", "one.jpg")),
                        images: vec![image("photo1", "photo1.jpg")],
                        ..Default::default()
                    },
                    Project {
                        title: Some("Two".into()),
                        slug: Some("two".into()),
                        preview: Some(image("prev2", "two.jpg")),
                        // Same asset as project one's photo
                        images: vec![image("photo1", "photo1.jpg")],
                        ..Default::default()
                    },
                ],
            }),
            resume: Some(ResumeLayout {
                attachment: Some(AssetRef {
                    id: Some("cv1".into()),
                    url: Some("https://assets.ctfassets.net/s/resume.pdf?token=abc".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            config,
            ..Default::default()
        }
    }

    fn write_manifest(tmp: &Path, content: &SiteContent) -> PathBuf {
        let path = tmp.join("content.json");
        fs::write(&path, serde_json::to_string_pretty(content).unwrap()).unwrap();
        path
    }

    fn route_all_images(transport: &MockTransport) {
        transport.route_bytes("one.jpg", b"one".to_vec());
        transport.route_bytes("two.jpg", b"two".to_vec());
        transport.route_bytes("photo1.jpg", b"photo".to_vec());
        transport.route_bytes("resume.pdf", b"%PDF".to_vec());
    }

    // =========================================================================
    // Work collection
    // =========================================================================

    #[test]
    fn collect_work_dedupes_shared_assets() {
        let content = test_content();
        let work = collect_work(&content);

        // 3 unique images x 2 widths + 1 attachment; the shared photo
        // appears once.
        assert_eq!(work.len(), 7);
        let filenames: Vec<&str> = work.iter().map(|w| w.filename.as_str()).collect();
        assert!(filenames.contains(&"prev1-400.webp"));
        assert!(filenames.contains(&"photo1-800.webp"));
        assert!(filenames.contains(&"cv1.pdf"));
    }

    #[test]
    fn collect_work_skips_assets_without_url() {
        let mut content = test_content();
        content.landing.as_mut().unwrap().projects[0]
            .preview
            .as_mut()
            .unwrap()
            .url = None;

        let work = collect_work(&content);
        assert!(work.iter().all(|w| !w.filename.starts_with("prev1")));
    }

    #[test]
    fn variant_requests_use_transform_params() {
        let content = test_content();
        let work = collect_work(&content);
        let item = work.iter().find(|w| w.filename == "prev1-400.webp").unwrap();
        assert_eq!(
            item.request_url,
            "https://images.ctfassets.net/s/one.jpg?w=400&fm=webp&q=80&fit=scale"
        );
    }

    #[test]
    fn attachment_downloads_original_url() {
        let content = test_content();
        let work = collect_work(&content);
        let item = work.iter().find(|w| w.filename == "cv1.pdf").unwrap();
        assert_eq!(
            item.request_url,
            "https://assets.ctfassets.net/s/resume.pdf?token=abc"
        );
    }

    // =========================================================================
    // Filename derivation
    // =========================================================================

    #[test]
    fn stem_prefers_asset_id() {
        let asset = image("5FjmZl7VGUyQ", "x.jpg");
        assert_eq!(asset_stem(&asset).as_deref(), Some("5FjmZl7VGUyQ"));
    }

    #[test]
    fn stem_falls_back_to_url_hash_for_unsafe_id() {
        let mut asset = image("has/slash", "x.jpg");
        let stem = asset_stem(&asset).unwrap();
        assert_eq!(stem.len(), 12);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));

        asset.id = None;
        assert_eq!(asset_stem(&asset).unwrap(), stem);
    }

    #[test]
    fn stem_requires_url() {
        let asset = AssetRef {
            id: Some("a1".into()),
            ..Default::default()
        };
        assert_eq!(asset_stem(&asset), None);
    }

    #[test]
    fn original_filename_keeps_extension_and_strips_query() {
        let asset = AssetRef {
            id: Some("cv1".into()),
            url: Some("https://assets.example.com/doc.pdf?token=xyz".into()),
            ..Default::default()
        };
        assert_eq!(original_filename(&asset).as_deref(), Some("cv1.pdf"));
    }

    #[test]
    fn original_filename_without_extension_is_bare_stem() {
        let asset = AssetRef {
            id: Some("cv1".into()),
            url: Some("https://assets.example.com/download".into()),
            ..Default::default()
        };
        assert_eq!(original_filename(&asset).as_deref(), Some("cv1"));
    }

    // =========================================================================
    // Process with mock transport
    // =========================================================================

    #[test]
    fn process_downloads_and_fills_manifest() {
        let tmp = TempDir::new().unwrap();
        let assets_dir = tmp.path().join("assets");
        let manifest_path = write_manifest(tmp.path(), &test_content());

        let transport = MockTransport::new();
        route_all_images(&transport);

        let result =
            process_with_transport(&transport, &manifest_path, &assets_dir, true, None).unwrap();

        assert_eq!(result.cache_stats.misses, 7);
        assert_eq!(result.cache_stats.hits, 0);
        assert!(assets_dir.join("prev1-400.webp").exists());
        assert!(assets_dir.join("photo1-800.webp").exists());
        assert_eq!(fs::read(assets_dir.join("cv1.pdf")).unwrap(), b"%PDF");

        let preview = result.content.projects()[0].preview.as_ref().unwrap();
        assert_eq!(preview.variants.get(&400).unwrap(), "prev1-400.webp");
        assert_eq!(preview.largest_variant(), Some("prev1-800.webp"));

        let attachment = result.content.resume.as_ref().unwrap().attachment.as_ref();
        assert_eq!(attachment.unwrap().local_path.as_deref(), Some("cv1.pdf"));
    }

    #[test]
    fn second_run_hits_cache_without_any_requests() {
        let tmp = TempDir::new().unwrap();
        let assets_dir = tmp.path().join("assets");
        let manifest_path = write_manifest(tmp.path(), &test_content());

        let transport = MockTransport::new();
        route_all_images(&transport);
        process_with_transport(&transport, &manifest_path, &assets_dir, true, None).unwrap();

        let rerun = MockTransport::new();
        let result =
            process_with_transport(&rerun, &manifest_path, &assets_dir, true, None).unwrap();

        assert_eq!(result.cache_stats.hits, 7);
        assert_eq!(result.cache_stats.misses, 0);
        assert!(rerun.recorded().is_empty());
    }

    #[test]
    fn changed_url_invalidates_only_that_asset() {
        let tmp = TempDir::new().unwrap();
        let assets_dir = tmp.path().join("assets");
        let content = test_content();
        let manifest_path = write_manifest(tmp.path(), &content);

        let transport = MockTransport::new();
        route_all_images(&transport);
        process_with_transport(&transport, &manifest_path, &assets_dir, true, None).unwrap();

        // Re-uploaded preview: same asset id, new upstream URL.
        let mut changed = content.clone();
        changed.landing.as_mut().unwrap().projects[0]
            .preview
            .as_mut()
            .unwrap()
            .url = Some("https://images.ctfassets.net/s/one-v2.jpg".into());
        let manifest_path = write_manifest(tmp.path(), &changed);

        let rerun = MockTransport::new();
        rerun.route_bytes("one-v2.jpg", b"fresh".to_vec());
        let result =
            process_with_transport(&rerun, &manifest_path, &assets_dir, true, None).unwrap();

        assert_eq!(result.cache_stats.misses, 2);
        assert_eq!(result.cache_stats.hits, 5);
        assert_eq!(fs::read(assets_dir.join("prev1-400.webp")).unwrap(), b"fresh");
    }

    #[test]
    fn no_cache_forces_full_redownload() {
        let tmp = TempDir::new().unwrap();
        let assets_dir = tmp.path().join("assets");
        let manifest_path = write_manifest(tmp.path(), &test_content());

        let transport = MockTransport::new();
        route_all_images(&transport);
        process_with_transport(&transport, &manifest_path, &assets_dir, true, None).unwrap();

        let rerun = MockTransport::new();
        route_all_images(&rerun);
        let result =
            process_with_transport(&rerun, &manifest_path, &assets_dir, false, None).unwrap();

        assert_eq!(result.cache_stats.misses, 7);
        assert_eq!(result.cache_stats.hits, 0);
        assert!(!rerun.recorded().is_empty());
    }

    #[test]
    fn failed_download_aborts_the_stage() {
        let tmp = TempDir::new().unwrap();
        let assets_dir = tmp.path().join("assets");
        let manifest_path = write_manifest(tmp.path(), &test_content());

        let transport = MockTransport::new();
        route_all_images(&transport);
        transport.route_status("photo1.jpg", 404);

        let result = process_with_transport(&transport, &manifest_path, &assets_dir, true, None);
        assert!(matches!(result, Err(ProcessError::Fetch(_))));
    }

    #[test]
    fn events_report_downloads_and_cache_hits() {
        let tmp = TempDir::new().unwrap();
        let assets_dir = tmp.path().join("assets");
        let manifest_path = write_manifest(tmp.path(), &test_content());

        let transport = MockTransport::new();
        route_all_images(&transport);

        let (tx, rx) = std::sync::mpsc::channel();
        process_with_transport(&transport, &manifest_path, &assets_dir, true, Some(tx)).unwrap();
        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(events.len(), 7);
        assert!(events.iter().all(|e| matches!(e, ProcessEvent::Downloaded { .. })));

        let (tx, rx) = std::sync::mpsc::channel();
        let rerun = MockTransport::new();
        process_with_transport(&rerun, &manifest_path, &assets_dir, true, Some(tx)).unwrap();
        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(events.len(), 7);
        assert!(events.iter().all(|e| matches!(e, ProcessEvent::Cached { .. })));
    }

    #[test]
    fn downloads_only_request_bytes() {
        let tmp = TempDir::new().unwrap();
        let assets_dir = tmp.path().join("assets");
        let manifest_path = write_manifest(tmp.path(), &test_content());

        let transport = MockTransport::new();
        route_all_images(&transport);
        process_with_transport(&transport, &manifest_path, &assets_dir, true, None).unwrap();

        for request in transport.recorded() {
            assert!(matches!(request, RecordedRequest::Bytes { .. }));
        }
    }
}
