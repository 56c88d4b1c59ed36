//! # Folio Gen
//!
//! A static site generator for personal portfolio sites backed by a headless
//! CMS. Content lives in Contentful: one metadata entry, one layout entry per
//! page, and a list of projects with image galleries. Folio Gen pulls it all
//! down, mirrors the images locally, and renders a plain HTML site.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Content moves through three independent stages, each producing a JSON
//! manifest that the next stage consumes:
//!
//! ```text
//! 1. Fetch     CMS API   →  temp/content.json   (delivery API → structured data)
//! 2. Process   manifest  →  temp/assets/        (image variants, cached downloads)
//! 3. Generate  manifest  →  dist/               (final HTML site)
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Debuggability**: each manifest is human-readable JSON you can inspect.
//! - **Offline iteration**: once content is fetched, the generate stage can be
//!   re-run endlessly without touching the network.
//! - **Testability**: each stage is a function from manifest to manifest, so
//!   unit tests can exercise pipeline logic against a mock transport instead
//!   of a live CMS.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | Stage 1: queries the content delivery API, resolves links, produces the content manifest |
//! | [`assets`] | Stage 2: downloads responsive image variants and attachments with a content-addressed cache |
//! | [`generate`] | Stage 3: renders the final HTML site from the processed manifest using Maud |
//! | [`content`] | Shared content model serialized between stages (`SiteContent`, `Project`, `AssetRef`) |
//! | [`config`] | `config.toml` loading, validation, and CSS custom property generation |
//! | [`cache`] | Download cache manifest keyed by URL and transform parameters |
//! | [`nav`] | Site page table, route matching, and the mobile menu state machine |
//! | [`output`] | CLI output formatting: per-stage summaries and progress lines |
//!
//! # Design Decisions
//!
//! ## CDN-Side Image Transforms
//!
//! Responsive image sizes come from the CMS image API (`?w=...&fm=webp`), not
//! from local encoding. The crate never decodes a single pixel, which keeps it
//! free of imaging dependencies and makes the process stage pure I/O. Each
//! configured width becomes one download, and the download cache makes
//! repeated builds nearly free.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system, rather than Handlebars or Tera. Advantages:
//!
//! - **Compile-time checking**: malformed HTML is a build error, not a runtime surprise.
//! - **Type-safe**: template variables are Rust expressions, not stringly-typed lookups.
//! - **XSS-safe by default**: all interpolation is auto-escaped.
//! - **Zero runtime files**: no template directory to ship or get out of sync.
//!
//! ## Absent Layouts Are Not Errors
//!
//! Each page layout is a separate content type, and a space is free to define
//! only some of them. A query that the API rejects as an undefined content
//! type leaves that layout out of the manifest, and the corresponding page
//! still renders with its navigation and title. Only authentication and
//! server failures abort a fetch.
//!
//! # Output
//!
//! The generated site is plain HTML, one CSS file inlined per page, and a
//! small vanilla JavaScript snippet for the mobile menu. It can be dropped on
//! any static file server.

pub mod assets;
pub mod cache;
pub mod config;
pub mod content;
pub mod fetch;
pub mod generate;
pub mod nav;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
