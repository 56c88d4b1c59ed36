//! Content model shared across all pipeline stages.
//!
//! These types are serialized to JSON between stages (fetch → process →
//! generate) and must be identical across all three modules.
//!
//! Everything that comes from the CMS is optional at every level of nesting:
//! a layout, any nested record, or any leaf value may be absent. The model
//! mirrors that directly: every remote field is an `Option` (or a
//! default-empty collection) and accessors substitute neutral defaults, so
//! rendering always proceeds no matter how sparse the payload is. Build
//! failures are reserved for transport and I/O problems; missing content is
//! never one.

use crate::config::SiteConfig;
use crate::nav;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fallback site title, used whenever the remote header title is absent or
/// not a plain string.
pub const DEFAULT_TITLE: &str = "My Portfolio";

/// Manifest output from the fetch stage.
///
/// Carries the fetched content, where it came from (for display), and the
/// site config snapshot so later stages don't re-read `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteContent {
    /// API host the content was fetched from.
    pub source_host: String,
    /// Space the content belongs to.
    pub space_id: String,
    /// Environment that was queried.
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SiteMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing: Option<LandingLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<AboutLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ResumeLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactLayout>,
    pub config: SiteConfig,
}

impl SiteContent {
    /// Site title: the remote header title when it is a plain string, the
    /// fallback otherwise.
    pub fn site_title(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.header_page_title.as_ref())
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TITLE)
    }

    /// Projects on the landing layout, empty when the layout is absent.
    pub fn projects(&self) -> &[Project] {
        self.landing
            .as_ref()
            .map(|l| l.projects.as_slice())
            .unwrap_or(&[])
    }

    /// All image assets referenced by the content, in render order.
    /// Previews first, then project photos, then the about portrait.
    pub fn image_assets(&self) -> Vec<&AssetRef> {
        let mut assets = Vec::new();
        for project in self.projects() {
            if let Some(preview) = &project.preview {
                assets.push(preview);
            }
        }
        for project in self.projects() {
            assets.extend(project.images.iter());
        }
        if let Some(portrait) = self.about.as_ref().and_then(|a| a.portrait.as_ref()) {
            assets.push(portrait);
        }
        assets
    }

    /// Mutable view of the same assets in the same order, for the process
    /// stage to fill in downloaded variants.
    pub fn image_assets_mut(&mut self) -> Vec<&mut AssetRef> {
        let mut assets = Vec::new();
        if let Some(landing) = self.landing.as_mut() {
            let (mut previews, mut photos) = (Vec::new(), Vec::new());
            for project in landing.projects.iter_mut() {
                if let Some(preview) = project.preview.as_mut() {
                    previews.push(preview);
                }
                photos.extend(project.images.iter_mut());
            }
            assets.append(&mut previews);
            assets.append(&mut photos);
        }
        if let Some(portrait) = self.about.as_mut().and_then(|a| a.portrait.as_mut()) {
            assets.push(portrait);
        }
        assets
    }
}

/// Site-wide metadata record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteMetadata {
    /// Raw remote value. May be missing or any JSON type; only a plain
    /// string is usable as a title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_page_title: Option<Value>,
}

/// Landing page layout: statement plus the project listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
}

/// About page layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    /// Markdown body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<AssetRef>,
}

/// Resume page layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    /// Markdown body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Downloadable resume file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AssetRef>,
}

/// Contact page layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    /// External profile URL opened in a new browsing context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_in_url: Option<String>,
    /// Markdown body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A portfolio project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Route segment of the detail page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Square preview shown in the landing grid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<AssetRef>,
    /// Markdown body for the detail page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Gallery photos for the detail page.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<AssetRef>,
}

impl Project {
    /// Slug usable as a route segment and output directory name.
    ///
    /// Rejects empty slugs and anything that would escape the output
    /// directory. A project without a usable slug gets no detail page and no
    /// grid link.
    pub fn usable_slug(&self) -> Option<&str> {
        let slug = self.slug.as_deref()?.trim();
        if slug.is_empty() || slug == "." || slug == ".." {
            return None;
        }
        if slug.contains('/') || slug.contains('\\') {
            return None;
        }
        Some(slug)
    }

    /// Route of this project's detail page, when it has a usable slug.
    pub fn route(&self) -> Option<String> {
        self.usable_slug()
            .map(|slug| format!("{}/{}/", nav::SPOTLIGHT_PREFIX, slug))
    }

    /// Caption shown in the landing grid. Empty when the title is absent.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// An asset resolved from the CMS: an image or a plain file.
///
/// The fetch stage fills `id`, `url` and `title`; the process stage adds the
/// local files (`variants` for images, `local_path` for plain downloads).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetRef {
    /// CMS asset id, also the stem for local filenames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Upstream URL, normalized to https.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Asset title, used as alt text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Downloaded variant files keyed by pixel width, relative to the assets
    /// directory. Empty until the process stage runs.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<u32, String>,
    /// Downloaded original file, relative to the assets directory. Used for
    /// non-image assets (resume attachment).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl AssetRef {
    /// Alt text for this asset. Empty when no title is set.
    pub fn alt_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// The largest downloaded variant, if any.
    pub fn largest_variant(&self) -> Option<&str> {
        self.variants.values().next_back().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Title fallback =====

    #[test]
    fn site_title_uses_remote_string() {
        let content = SiteContent {
            metadata: Some(SiteMetadata {
                header_page_title: Some(Value::String("Jane Doe".into())),
            }),
            ..Default::default()
        };
        assert_eq!(content.site_title(), "Jane Doe");
    }

    #[test]
    fn site_title_falls_back_when_metadata_missing() {
        let content = SiteContent::default();
        assert_eq!(content.site_title(), "My Portfolio");
    }

    #[test]
    fn site_title_falls_back_when_title_missing() {
        let content = SiteContent {
            metadata: Some(SiteMetadata {
                header_page_title: None,
            }),
            ..Default::default()
        };
        assert_eq!(content.site_title(), DEFAULT_TITLE);
    }

    #[test]
    fn site_title_falls_back_when_title_not_a_string() {
        for odd in [
            Value::Number(7.into()),
            Value::Bool(true),
            Value::Array(vec![Value::String("x".into())]),
            Value::Null,
        ] {
            let content = SiteContent {
                metadata: Some(SiteMetadata {
                    header_page_title: Some(odd),
                }),
                ..Default::default()
            };
            assert_eq!(content.site_title(), DEFAULT_TITLE);
        }
    }

    // ===== Defensive access =====

    #[test]
    fn projects_empty_when_landing_missing() {
        let content = SiteContent::default();
        assert!(content.projects().is_empty());
    }

    #[test]
    fn empty_manifest_deserializes_to_defaults() {
        let content: SiteContent = serde_json::from_str("{}").unwrap();
        assert_eq!(content.site_title(), DEFAULT_TITLE);
        assert!(content.projects().is_empty());
        assert!(content.contact.is_none());
    }

    #[test]
    fn image_assets_collects_previews_photos_and_portrait() {
        let asset = |id: &str| AssetRef {
            id: Some(id.into()),
            url: Some(format!("https://images.example.com/{id}")),
            ..Default::default()
        };
        let content = SiteContent {
            landing: Some(LandingLayout {
                statement: None,
                projects: vec![Project {
                    preview: Some(asset("prev")),
                    images: vec![asset("a"), asset("b")],
                    ..Default::default()
                }],
            }),
            about: Some(AboutLayout {
                portrait: Some(asset("me")),
                ..Default::default()
            }),
            ..Default::default()
        };
        let ids: Vec<&str> = content
            .image_assets()
            .iter()
            .filter_map(|a| a.id.as_deref())
            .collect();
        assert_eq!(ids, ["prev", "a", "b", "me"]);
    }

    #[test]
    fn mutable_asset_view_matches_render_order() {
        let asset = |id: &str| AssetRef {
            id: Some(id.into()),
            ..Default::default()
        };
        let mut content = SiteContent {
            landing: Some(LandingLayout {
                statement: None,
                projects: vec![
                    Project {
                        preview: Some(asset("p1")),
                        images: vec![asset("a")],
                        ..Default::default()
                    },
                    Project {
                        preview: Some(asset("p2")),
                        ..Default::default()
                    },
                ],
            }),
            about: Some(AboutLayout {
                portrait: Some(asset("me")),
                ..Default::default()
            }),
            ..Default::default()
        };

        for a in content.image_assets_mut() {
            a.variants.insert(400, "x.webp".into());
        }

        let ids: Vec<&str> = content
            .image_assets()
            .iter()
            .filter_map(|a| a.id.as_deref())
            .collect();
        assert_eq!(ids, ["p1", "p2", "a", "me"]);
        assert!(content.image_assets().iter().all(|a| !a.variants.is_empty()));
    }

    // ===== Slugs and routes =====

    #[test]
    fn route_formats_spotlight_path() {
        let project = Project {
            slug: Some("dawn-series".into()),
            ..Default::default()
        };
        assert_eq!(project.route().as_deref(), Some("/spotlight/dawn-series/"));
    }

    #[test]
    fn missing_slug_has_no_route() {
        let project = Project::default();
        assert_eq!(project.route(), None);
    }

    #[test]
    fn unusable_slugs_rejected() {
        for bad in ["", "  ", ".", "..", "a/b", "a\\b"] {
            let project = Project {
                slug: Some(bad.into()),
                ..Default::default()
            };
            assert_eq!(project.usable_slug(), None, "slug {bad:?} should be rejected");
        }
    }

    #[test]
    fn display_title_empty_when_absent() {
        assert_eq!(Project::default().display_title(), "");
    }

    // ===== Assets =====

    #[test]
    fn largest_variant_picks_widest() {
        let mut asset = AssetRef::default();
        asset.variants.insert(400, "small.webp".into());
        asset.variants.insert(1200, "large.webp".into());
        asset.variants.insert(800, "mid.webp".into());
        assert_eq!(asset.largest_variant(), Some("large.webp"));
    }

    #[test]
    fn no_variants_no_largest() {
        assert_eq!(AssetRef::default().largest_variant(), None);
    }

    // ===== Manifest round trip =====

    #[test]
    fn manifest_survives_json_round_trip() {
        let content = SiteContent {
            source_host: "cdn.contentful.com".into(),
            space_id: "space1".into(),
            environment: "master".into(),
            metadata: Some(SiteMetadata {
                header_page_title: Some(Value::String("Jane".into())),
            }),
            contact: Some(ContactLayout {
                statement: Some("Say hello".into()),
                linked_in_url: Some("https://linkedin.com/in/jane".into()),
                description: None,
            }),
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&content).unwrap();
        let back: SiteContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.site_title(), "Jane");
        assert_eq!(
            back.contact.unwrap().linked_in_url.as_deref(),
            Some("https://linkedin.com/in/jane")
        );
        // Absent sections stay absent in the JSON
        assert!(!json.contains("\"resume\""));
    }
}
