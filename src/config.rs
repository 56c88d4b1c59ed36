//! Site configuration module.
//!
//! Two concerns live here, kept deliberately separate:
//!
//! 1. **Content-source credentials**: resolved from environment variables
//!    only, never from a file on disk. [`ContentSource::from_env`] picks the
//!    production or preview token, applies the host override, and fails fast
//!    when the space id or the selected token is missing.
//! 2. **Site settings**: loaded from an optional `config.toml`, merged over
//!    stock defaults, validated, and carried through the pipeline manifests.
//!
//! ## Environment Variables
//!
//! | Variable | Role |
//! |----------|------|
//! | `CONTENTFUL_SPACE_ID` | Space to query (required) |
//! | `CONTENTFUL_ACCESS_TOKEN` | Delivery API token (required unless preview) |
//! | `CONTENTFUL_ACCESS_PREVIEW_TOKEN` | Preview API token (required in preview mode) |
//! | `CONTENTFUL_PREVIEW_ENABLED` | Set to any non-empty value to build from drafts |
//! | `CONTENTFUL_HOST` | Explicit API host, overrides both modes |
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [content]
//! environment = "master"    # CMS environment to query
//! platform = "main"         # fields.platform filter applied to every entry query
//! include_depth = 2         # linked-entry resolution depth requested from the API
//!
//! [images]
//! widths = [400, 800, 1200] # Responsive variant widths for project photos
//! preview_size = 350        # Square bounding box for grid previews
//! format = "webp"           # Server-side transform format (jpg/png/webp/avif)
//! quality = 80              # Transform quality (1-100)
//!
//! [theme]
//! max_width = "1100px"      # Page content measure
//! nav_gap = "1em"           # Spacing between navigation links
//! grid_gap = "1.5rem"       # Gap between project previews
//! statement_size = "1.5rem" # Introductory statement font size
//! overlay_fade_ms = 225     # Mobile menu overlay fade duration
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#666666"    # Captions, statement
//! border = "#e0e0e0"
//! link = "#333333"
//! link_hover = "#9e9e9e"
//! accent = "#b71c1c"        # Active navigation link
//!
//! [colors.dark]
//! background = "#0a0a0a"
//! text = "#eeeeee"
//! text_muted = "#999999"
//! border = "#333333"
//! link = "#cccccc"
//! link_hover = "#757575"
//! accent = "#ef5350"
//!
//! [processing]
//! max_processes = 4         # Max parallel asset downloads (omit for auto = CPU cores)
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Contentful space id and access token must be provided")]
    MissingCredentials,
}

// =============================================================================
// Content source resolution (environment)
// =============================================================================

/// Production Content Delivery API host.
pub const DELIVERY_HOST: &str = "cdn.contentful.com";
/// Content Preview API host, selected when preview mode is enabled.
pub const PREVIEW_HOST: &str = "preview.contentful.com";

pub const ENV_SPACE_ID: &str = "CONTENTFUL_SPACE_ID";
pub const ENV_ACCESS_TOKEN: &str = "CONTENTFUL_ACCESS_TOKEN";
pub const ENV_PREVIEW_TOKEN: &str = "CONTENTFUL_ACCESS_PREVIEW_TOKEN";
pub const ENV_PREVIEW_ENABLED: &str = "CONTENTFUL_PREVIEW_ENABLED";
pub const ENV_HOST: &str = "CONTENTFUL_HOST";

/// Resolved content-source credentials and endpoint.
///
/// `host` is `None` for the production delivery endpoint; preview mode and
/// the explicit override both set it. Credentials are validated non-empty at
/// construction, so a `ContentSource` in hand is always usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    pub space_id: String,
    pub access_token: String,
    pub host: Option<String>,
}

impl ContentSource {
    /// Resolve credentials from the process environment.
    ///
    /// Preview mode is enabled when `CONTENTFUL_PREVIEW_ENABLED` is set to
    /// any non-empty value (including `"false"`, matching the deployed
    /// truthiness rule).
    pub fn from_env() -> Result<ContentSource, ConfigError> {
        let preview_enabled = env_non_empty(ENV_PREVIEW_ENABLED).is_some();
        resolve_content_source(
            env_non_empty(ENV_SPACE_ID),
            env_non_empty(ENV_ACCESS_TOKEN),
            env_non_empty(ENV_PREVIEW_TOKEN),
            preview_enabled,
            env_non_empty(ENV_HOST),
        )
    }

    /// The API host to connect to, defaulting to the production endpoint.
    pub fn effective_host(&self) -> &str {
        self.host.as_deref().unwrap_or(DELIVERY_HOST)
    }
}

/// Select credentials and endpoint from raw environment inputs.
///
/// 1. Preview mode selects the preview token and the preview host.
/// 2. Production mode selects the delivery token and leaves the host unset.
/// 3. An explicit host override wins over both modes.
/// 4. A missing or empty space id or selected token is a fatal error.
///
/// Empty strings count as absent throughout.
pub fn resolve_content_source(
    space_id: Option<String>,
    access_token: Option<String>,
    preview_token: Option<String>,
    preview_enabled: bool,
    host_override: Option<String>,
) -> Result<ContentSource, ConfigError> {
    let token = if preview_enabled {
        preview_token
    } else {
        access_token
    };

    let host = match host_override.filter(|h| !h.is_empty()) {
        Some(explicit) => Some(explicit),
        None if preview_enabled => Some(PREVIEW_HOST.to_string()),
        None => None,
    };

    let space_id = space_id.filter(|s| !s.is_empty());
    let token = token.filter(|t| !t.is_empty());
    match (space_id, token) {
        (Some(space_id), Some(access_token)) => Ok(ContentSource {
            space_id,
            access_token,
            host,
        }),
        _ => Err(ConfigError::MissingCredentials),
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// =============================================================================
// Site settings (config.toml)
// =============================================================================

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Content query settings (environment, platform filter, link depth).
    pub content: ContentConfig,
    /// Image variant settings (widths, preview box, format, quality).
    pub images: ImagesConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
    /// Theme/layout settings (measure, gaps, overlay fade).
    pub theme: ThemeConfig,
    /// Parallel download settings.
    pub processing: ProcessingConfig,
}

/// Transform formats the image API accepts for the `fm` parameter.
const IMAGE_FORMATS: [&str; 4] = ["jpg", "png", "webp", "avif"];

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.platform.is_empty() {
            return Err(ConfigError::Validation(
                "content.platform must not be empty".into(),
            ));
        }
        if self.content.environment.is_empty() {
            return Err(ConfigError::Validation(
                "content.environment must not be empty".into(),
            ));
        }
        if self.content.include_depth > 10 {
            return Err(ConfigError::Validation(
                "content.include_depth must be 0-10".into(),
            ));
        }
        if self.images.widths.is_empty() {
            return Err(ConfigError::Validation(
                "images.widths must not be empty".into(),
            ));
        }
        if self.images.preview_size == 0 {
            return Err(ConfigError::Validation(
                "images.preview_size must be non-zero".into(),
            ));
        }
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if !IMAGE_FORMATS.contains(&self.images.format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "images.format must be one of {}",
                IMAGE_FORMATS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Content query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// CMS environment to query.
    pub environment: String,
    /// `fields.platform` filter applied to every entry query. Lets one space
    /// serve several sites.
    pub platform: String,
    /// Linked-entry resolution depth requested from the API (`include` param).
    pub include_depth: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            environment: "master".to_string(),
            platform: "main".to_string(),
            include_depth: 2,
        }
    }
}

/// Image variant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Pixel widths to download for responsive `srcset` on project photos.
    pub widths: Vec<u32>,
    /// Square bounding box (width = height) for grid preview images.
    pub preview_size: u32,
    /// Server-side transform format (`fm` param: jpg, png, webp, avif).
    pub format: String,
    /// Transform quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            widths: vec![400, 800, 1200],
            preview_size: 350,
            format: "webp".to_string(),
            quality: 80,
        }
    }
}

/// Theme/layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Page content measure (CSS value).
    pub max_width: String,
    /// Spacing between navigation links (CSS value).
    pub nav_gap: String,
    /// Gap between project previews in the grid (CSS value).
    pub grid_gap: String,
    /// Introductory statement font size (CSS value).
    pub statement_size: String,
    /// Mobile menu overlay fade duration in milliseconds.
    pub overlay_fade_ms: u32,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            max_width: "1100px".to_string(),
            nav_gap: "1em".to_string(),
            grid_gap: "1.5rem".to_string(),
            statement_size: "1.5rem".to_string(),
            overlay_fade_ms: 225,
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Background color.
    pub background: String,
    /// Primary text color.
    pub text: String,
    /// Muted/secondary text color (captions, statement).
    pub text_muted: String,
    /// Border color.
    pub border: String,
    /// Link color.
    pub link: String,
    /// Link hover color.
    pub link_hover: String,
    /// Active navigation link color.
    pub accent: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#333333".to_string(),
            link_hover: "#9e9e9e".to_string(),
            accent: "#b71c1c".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#333333".to_string(),
            link: "#cccccc".to_string(),
            link_hover: "#757575".to_string(),
            accent: "#ef5350".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

/// Parallel download settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel asset downloads.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist; the site builds fine on
/// stock defaults. Returns `Err` if it exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given `config.toml` path.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Gen Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Credentials are NOT configured here: the space id and access tokens are
# read from CONTENTFUL_SPACE_ID, CONTENTFUL_ACCESS_TOKEN and friends at
# build time. See `folio-gen --help`.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content queries
# ---------------------------------------------------------------------------
[content]
# CMS environment to query.
environment = "master"

# fields.platform filter applied to every entry query. Lets one space serve
# several sites; entries tagged with a different platform are ignored.
platform = "main"

# Linked-entry resolution depth requested from the API (include parameter).
include_depth = 2

# ---------------------------------------------------------------------------
# Image variants
# ---------------------------------------------------------------------------
[images]
# Pixel widths to download for responsive srcset on project photos.
widths = [400, 800, 1200]

# Square bounding box (width = height, aspect preserved) for grid previews.
preview_size = 350

# Server-side transform format: jpg, png, webp or avif.
format = "webp"

# Transform quality (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Theme / layout
# ---------------------------------------------------------------------------
[theme]
# Page content measure (CSS value).
max_width = "1100px"

# Spacing between navigation links (CSS value).
nav_gap = "1em"

# Gap between project previews in the grid (CSS value).
grid_gap = "1.5rem"

# Introductory statement font size (CSS value).
statement_size = "1.5rem"

# Mobile menu overlay fade duration in milliseconds.
overlay_fade_ms = 225

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"    # Captions, statement
border = "#e0e0e0"
link = "#333333"
link_hover = "#9e9e9e"
accent = "#b71c1c"        # Active navigation link

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
text_muted = "#999999"
border = "#333333"
link = "#cccccc"
link_hover = "#757575"
accent = "#ef5350"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel asset downloads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-link-hover: {light_link_hover};
    --color-accent: {light_accent};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-link-hover: {dark_link_hover};
        --color-accent: {dark_accent};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_link = colors.light.link,
        light_link_hover = colors.light.link_hover,
        light_accent = colors.light.accent,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_link = colors.dark.link,
        dark_link_hover = colors.dark.link_hover,
        dark_accent = colors.dark.accent,
    )
}

/// Generate CSS custom properties from theme config.
pub fn generate_theme_css(theme: &ThemeConfig) -> String {
    format!(
        r#":root {{
    --page-max-width: {max_width};
    --nav-gap: {nav_gap};
    --grid-gap: {grid_gap};
    --statement-size: {statement_size};
    --overlay-fade: {overlay_fade_ms}ms;
}}"#,
        max_width = theme.max_width,
        nav_gap = theme.nav_gap,
        grid_gap = theme.grid_gap,
        statement_size = theme.statement_size,
        overlay_fade_ms = theme.overlay_fade_ms,
    )
}
