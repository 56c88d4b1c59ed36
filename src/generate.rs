//! HTML site generation.
//!
//! Stage 3 of the build pipeline. Takes the processed manifest and produces
//! the final static site.
//!
//! ## Generated Pages
//!
//! - **Home** (`/index.html`): introductory statement and the project grid
//! - **Resume** (`/resume/index.html`): markdown body plus the download link
//! - **About** (`/about/index.html`): portrait and markdown body
//! - **Contact** (`/contact/index.html`): markdown body and the profile link
//! - **Spotlight** (`/spotlight/{slug}/index.html`): one detail page per
//!   project with a usable slug
//!
//! Every page carries the same header: the split navigation with the site
//! title in the middle on wide screens, and the menu toggle plus overlay on
//! narrow ones. The overlay is rendered closed; `nav.js` only swaps it
//! between the two states the markup already encodes.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── resume/index.html
//! ├── about/index.html
//! ├── contact/index.html
//! ├── spotlight/
//! │   └── dawn-series/index.html
//! └── assets/                    # Downloaded files (copied from stage 2)
//!     ├── 5FjmZl7VGUyQm2qo-400.webp
//!     └── ...
//! ```
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: base styles (color and theme variables injected
//!   from config)
//! - `static/nav.js`: the menu overlay toggle
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping; the only
//! unescaped injection points are the embedded script and the HTML produced
//! from markdown bodies.

use crate::config::{self, SiteConfig};
use crate::content::{AssetRef, Project, SiteContent};
use crate::nav::{self, MenuState};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/nav.js");

pub fn generate(
    manifest_path: &Path,
    assets_dir: &Path,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let content: SiteContent = serde_json::from_str(&manifest_content)?;
    generate_site(&content, assets_dir, output_dir)
}

/// Render and write every page of the site.
pub fn generate_site(
    content: &SiteContent,
    assets_dir: &Path,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    let css = site_css(&content.config);

    fs::create_dir_all(output_dir)?;
    copy_assets(assets_dir, &output_dir.join("assets"))?;

    fs::write(
        output_dir.join("index.html"),
        render_home(content, &css).into_string(),
    )?;
    println!("Generated index.html");

    write_page(output_dir, "resume", render_resume(content, &css))?;
    write_page(output_dir, "about", render_about(content, &css))?;
    write_page(output_dir, "contact", render_contact(content, &css))?;

    for project in content.projects() {
        let Some(slug) = project.usable_slug() else {
            continue;
        };
        let page = render_spotlight(content, project, &css);
        let dir = output_dir.join("spotlight").join(slug);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("index.html"), page.into_string())?;
        println!("Generated spotlight/{slug}/index.html");
    }

    println!("Site generated at {}", output_dir.display());
    Ok(())
}

/// Write a page at `{output_dir}/{route}/index.html`.
fn write_page(output_dir: &Path, route: &str, page: Markup) -> Result<(), GenerateError> {
    let dir = output_dir.join(route);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("index.html"), page.into_string())?;
    println!("Generated {route}/index.html");
    Ok(())
}

/// Copy downloaded asset files into the output. Stage bookkeeping (the
/// content manifest, the cache manifest) stays behind.
fn copy_assets(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !src.exists() {
        // Generate can run without the process stage; pages then fall back
        // to remote asset URLs.
        return Ok(());
    }
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if name_str.starts_with('.') || name_str.ends_with(".json") {
            continue;
        }
        fs::copy(&path, dst.join(&name))?;
    }
    Ok(())
}

fn site_css(config: &SiteConfig) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        config::generate_color_css(&config.colors),
        config::generate_theme_css(&config.theme),
        CSS_STATIC
    )
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (css) }
            }
            body {
                (content)
                script { (PreEscaped(JS)) }
            }
        }
    }
}

/// Title of a subpage, qualified with the site title.
fn page_title(section: &str, site_title: &str) -> String {
    format!("{section} — {site_title}")
}

/// Renders the site header: split navigation around the centered title, the
/// menu toggle, and the mobile overlay in the given state.
///
/// Generated pages always pass `MenuState::Closed`; the open form exists so
/// the state machine and the markup it produces stay in one place.
pub fn render_nav(site_title: &str, current_path: &str, menu: MenuState) -> Markup {
    let overlay_class = match menu.overlay_class() {
        Some(open) => format!("nav-overlay {open}"),
        None => "nav-overlay".to_string(),
    };

    html! {
        header.site-header {
            nav.site-nav aria-label="Site" {
                ul.nav-links.nav-left {
                    @for page in nav::left_pages() {
                        (nav_link(page, current_path))
                    }
                }
                a.site-title href="/" { (site_title) }
                ul.nav-links.nav-right {
                    @for page in nav::right_pages() {
                        (nav_link(page, current_path))
                    }
                }
                button.menu-toggle
                    type="button"
                    aria-haspopup="true"
                    aria-expanded=(menu.aria_expanded())
                    aria-label="Open navigation"
                {
                    span.menu-line {}
                    span.menu-line {}
                    span.menu-line {}
                }
            }
            div class=(overlay_class) {
                ul.nav-links {
                    @for page in &nav::SITE_PAGES {
                        (nav_link(page, current_path))
                    }
                }
            }
        }
    }
}

/// Renders a single navigation entry, marked active on its own page.
fn nav_link(page: &nav::SitePage, current_path: &str) -> Markup {
    let is_active = nav::is_active(page, current_path);
    html! {
        li {
            a href=(page.route) class=[is_active.then_some("active")] {
                (page.label)
            }
        }
    }
}

/// Renders the introductory statement block when one is set.
fn statement_block(statement: Option<&str>) -> Markup {
    html! {
        @if let Some(statement) = statement {
            p.statement { (statement) }
        }
    }
}

/// Converts a markdown body to HTML.
fn markdown_block(markdown: &str) -> Markup {
    let parser = Parser::new(markdown);
    let mut body_html = String::new();
    md_html::push_html(&mut body_html, parser);
    PreEscaped(body_html)
}

/// Renders an image element for a downloaded asset.
///
/// With variants: srcset over every downloaded width, middle size as the
/// default source. Without variants (process stage skipped): the remote URL
/// directly. Without either: nothing.
fn asset_img(asset: &AssetRef, sizes: &str) -> Markup {
    match variant_srcset(asset) {
        Some(srcset) => {
            let src = middle_variant(asset).map(asset_href).unwrap_or_default();
            html! {
                img src=(src) srcset=(srcset) sizes=(sizes) alt=(asset.alt_text()) loading="lazy";
            }
        }
        None => match asset.url.as_deref() {
            Some(url) => html! {
                img src=(url) alt=(asset.alt_text()) loading="lazy";
            },
            None => html! {},
        },
    }
}

fn variant_srcset(asset: &AssetRef) -> Option<String> {
    if asset.variants.is_empty() {
        return None;
    }
    Some(
        asset
            .variants
            .iter()
            .map(|(width, filename)| format!("{} {}w", asset_href(filename), width))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Middle variant by width, used as the plain `src`.
fn middle_variant(asset: &AssetRef) -> Option<&str> {
    asset
        .variants
        .values()
        .nth(asset.variants.len() / 2)
        .map(String::as_str)
}

fn asset_href(filename: &str) -> String {
    format!("/assets/{filename}")
}

/// `sizes` attribute for grid previews.
fn grid_sizes(config: &SiteConfig) -> String {
    format!("(max-width: 600px) 50vw, {}px", config.images.preview_size)
}

/// `sizes` attribute for full-width photos.
fn full_sizes(config: &SiteConfig) -> String {
    format!(
        "(max-width: {max_width}) 100vw, {max_width}",
        max_width = config.theme.max_width
    )
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the home page: statement plus the project grid.
fn render_home(content: &SiteContent, css: &str) -> Markup {
    let title = content.site_title();
    let sizes = grid_sizes(&content.config);

    let body = html! {
        (render_nav(title, "/", MenuState::default()))
        main.home-page {
            (statement_block(content.landing.as_ref().and_then(|l| l.statement.as_deref())))
            div.project-grid {
                @for project in content.projects() {
                    // A project without a usable slug has no page to link to.
                    @if let Some(route) = project.route() {
                        a.project-card href=(route) {
                            @if let Some(preview) = &project.preview {
                                (asset_img(preview, &sizes))
                            }
                            span.project-title { (project.display_title()) }
                        }
                    }
                }
            }
        }
    };

    base_document(title, css, body)
}

/// Renders the resume page.
fn render_resume(content: &SiteContent, css: &str) -> Markup {
    let site = content.site_title();
    let resume = content.resume.as_ref();

    let attachment_href = resume.and_then(|r| r.attachment.as_ref()).and_then(|a| {
        a.local_path
            .as_deref()
            .map(asset_href)
            .or_else(|| a.url.clone())
    });

    let body = html! {
        (render_nav(site, "/resume", MenuState::default()))
        main.resume-page {
            (statement_block(resume.and_then(|r| r.statement.as_deref())))
            @if let Some(description) = resume.and_then(|r| r.description.as_deref()) {
                article.page-body { (markdown_block(description)) }
            }
            @if let Some(href) = attachment_href {
                p.attachment {
                    a.attachment-link href=(href) download { "Download resume" }
                }
            }
        }
    };

    base_document(&page_title("Resume", site), css, body)
}

/// Renders the about page.
fn render_about(content: &SiteContent, css: &str) -> Markup {
    let site = content.site_title();
    let about = content.about.as_ref();
    let sizes = grid_sizes(&content.config);

    let body = html! {
        (render_nav(site, "/about", MenuState::default()))
        main.about-page {
            @if let Some(portrait) = about.and_then(|a| a.portrait.as_ref()) {
                figure.portrait { (asset_img(portrait, &sizes)) }
            }
            (statement_block(about.and_then(|a| a.statement.as_deref())))
            @if let Some(description) = about.and_then(|a| a.description.as_deref()) {
                article.page-body { (markdown_block(description)) }
            }
        }
    };

    base_document(&page_title("About", site), css, body)
}

/// Renders the contact page.
fn render_contact(content: &SiteContent, css: &str) -> Markup {
    let site = content.site_title();
    let contact = content.contact.as_ref();

    // The profile link renders even without a URL so the page keeps its
    // shape; "#" makes the dead link harmless.
    let profile_href = contact
        .and_then(|c| c.linked_in_url.as_deref())
        .unwrap_or("#");

    let body = html! {
        (render_nav(site, "/contact", MenuState::default()))
        main.contact-page {
            (statement_block(contact.and_then(|c| c.statement.as_deref())))
            @if let Some(description) = contact.and_then(|c| c.description.as_deref()) {
                article.page-body { (markdown_block(description)) }
            }
            p.contact-action {
                a.profile-link href=(profile_href) target="_blank" rel="noopener" {
                    "LinkedIn"
                }
            }
        }
    };

    base_document(&page_title("Contact", site), css, body)
}

/// Renders a project detail page.
fn render_spotlight(content: &SiteContent, project: &Project, css: &str) -> Markup {
    let site = content.site_title();
    let current_path = project.route().unwrap_or_else(|| "/".to_string());
    let sizes = full_sizes(&content.config);

    let body = html! {
        (render_nav(site, &current_path, MenuState::default()))
        main.spotlight-page {
            h1.project-heading { (project.display_title()) }
            @if let Some(markdown) = project.body.as_deref() {
                article.page-body { (markdown_block(markdown)) }
            }
            div.photo-column {
                @for image in &project.images {
                    figure.photo { (asset_img(image, &sizes)) }
                }
            }
            p.back-link { a href="/" { "Back to all work" } }
        }
    };

    let title = match project.title.as_deref() {
        Some(section) => page_title(section, site),
        None => site.to_string(),
    };
    base_document(&title, css, body)
}

// ============================================================================
// Tests
// ============================================================================
