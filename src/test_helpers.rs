//! Shared fixtures for the unit test suite.
//!
//! Builders for manifest content in the state it has after the process
//! stage (variants downloaded, attachment on disk), so rendering and
//! output tests don't each assemble their own `SiteContent` by hand.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = sample_site();
//! let project = find_project(&site, "dawn-series");
//! assert_eq!(project.display_title(), "Dawn Series");
//! ```

use crate::config::SiteConfig;
use crate::content::{
    AboutLayout, AssetRef, ContactLayout, LandingLayout, Project, ResumeLayout, SiteContent,
    SiteMetadata,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// An image asset with downloaded variants named `{stem}-{width}.webp`.
pub fn variant_asset(stem: &str, widths: &[u32]) -> AssetRef {
    let mut variants = BTreeMap::new();
    for &width in widths {
        variants.insert(width, format!("{stem}-{width}.webp"));
    }
    AssetRef {
        id: Some(stem.to_string()),
        url: Some(format!("https://images.ctfassets.net/s/{stem}.jpg")),
        title: Some(stem.to_string()),
        variants,
        local_path: None,
    }
}

/// A manifest with nothing in it: every layout absent, stock config.
pub fn minimal_site() -> SiteContent {
    SiteContent::default()
}

/// A fully populated manifest.
///
/// Three projects cover the grid edge cases: one complete, one without a
/// slug (gets no page), one without a preview. All layouts are present and
/// the resume attachment is downloaded.
pub fn sample_site() -> SiteContent {
    SiteContent {
        source_host: "cdn.contentful.com".to_string(),
        space_id: "space1".to_string(),
        environment: "master".to_string(),
        metadata: Some(SiteMetadata {
            header_page_title: Some(Value::String("Jane Doe".to_string())),
        }),
        landing: Some(LandingLayout {
            statement: Some("Photographs of quiet places.".to_string()),
            projects: vec![
                Project {
                    title: Some("Dawn Series".to_string()),
                    slug: Some("dawn-series".to_string()),
                    preview: Some(variant_asset("prev1", &[400, 800, 1200])),
                    body: Some("Shot over **three** winters.".to_string()),
                    images: vec![
                        variant_asset("photo1", &[400, 800, 1200]),
                        variant_asset("photo2", &[400, 800, 1200]),
                    ],
                },
                Project {
                    title: Some("Untitled Set".to_string()),
                    slug: None,
                    preview: Some(variant_asset("prev2", &[400, 800, 1200])),
                    body: None,
                    images: vec![],
                },
                Project {
                    title: Some("Bare".to_string()),
                    slug: Some("bare".to_string()),
                    preview: None,
                    body: None,
                    images: vec![],
                },
            ],
        }),
        about: Some(AboutLayout {
            statement: Some("About me".to_string()),
            description: Some("I take **pictures**.".to_string()),
            portrait: Some(variant_asset("me1", &[400, 800])),
        }),
        resume: Some(ResumeLayout {
            statement: Some("Ten years of seeing.".to_string()),
            description: Some("Worked with *light* since 2014.".to_string()),
            attachment: Some(AssetRef {
                id: Some("cv1".to_string()),
                url: Some("https://assets.ctfassets.net/s/resume.pdf".to_string()),
                title: Some("Resume".to_string()),
                variants: BTreeMap::new(),
                local_path: Some("cv1.pdf".to_string()),
            }),
        }),
        contact: Some(ContactLayout {
            statement: Some("Say hello".to_string()),
            linked_in_url: Some("https://linkedin.com/in/jane".to_string()),
            description: Some("Reach me *any* time.".to_string()),
        }),
        config: SiteConfig::default(),
    }
}

/// Find a project by slug. Panics with the available slugs on a miss.
pub fn find_project<'a>(site: &'a SiteContent, slug: &str) -> &'a Project {
    site.projects()
        .iter()
        .find(|p| p.slug.as_deref() == Some(slug))
        .unwrap_or_else(|| {
            let slugs: Vec<Option<&str>> =
                site.projects().iter().map(|p| p.slug.as_deref()).collect();
            panic!("project '{slug}' not found. Available: {slugs:?}")
        })
}
