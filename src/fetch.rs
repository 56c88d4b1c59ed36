//! Content fetching from the CMS Delivery API.
//!
//! Stage 1 of the build pipeline. Queries the Contentful Content Delivery
//! API (or the Preview API, depending on the resolved [`ContentSource`])
//! for each content type the site uses, resolves entry and asset links, and
//! produces the [`SiteContent`] manifest that subsequent stages consume.
//!
//! ## Wire format
//!
//! Each content type is fetched with one collection query:
//!
//! ```text
//! GET https://{host}/spaces/{space}/environments/{env}/entries
//!     ?content_type={type}&fields.platform={platform}&include={depth}
//! Authorization: Bearer {token}
//! ```
//!
//! The response carries the matched entries under `items` and every linked
//! entry and asset under `includes.Entry` / `includes.Asset`. Fields that
//! reference other records hold link stubs
//! (`{"sys": {"type": "Link", "linkType": "Asset", "id": "..."}}`) which are
//! resolved against the includes here, so later stages never see links.
//!
//! Collection queries are single-page: a portfolio is far below the API's
//! page size.
//!
//! ## Failure policy
//!
//! Transport errors and auth failures abort the build. Content problems
//! never do: a content type the space doesn't define (HTTP 400/404), an
//! empty result set, an unresolvable link, or a missing field all degrade to
//! the model's neutral defaults. Asset URLs arrive protocol-relative and are
//! normalized to https.

use crate::config::{ContentConfig, ContentSource, SiteConfig};
use crate::content::{
    AboutLayout, AssetRef, ContactLayout, LandingLayout, Project, ResumeLayout, SiteContent,
    SiteMetadata,
};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use ureq::Agent;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] ureq::Error),
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

/// Content type ids queried from the space.
const CT_SITE_METADATA: &str = "siteMetadata";
const CT_LANDING: &str = "landingLayout";
const CT_ABOUT: &str = "aboutLayout";
const CT_RESUME: &str = "resumeLayout";
const CT_CONTACT: &str = "contactLayout";

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Blocking HTTP seam used by the fetch and process stages.
///
/// The production implementation is [`HttpTransport`]; tests substitute a
/// recording mock so pipeline logic runs without a network.
pub trait Transport: Sync {
    /// GET a JSON document with bearer auth.
    fn get_json(&self, url: &str, token: &str) -> Result<Value, FetchError>;

    /// GET raw bytes. Asset URLs carry their own access token in the path,
    /// so no auth header is sent.
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// `ureq`-backed transport with a global timeout. Non-2xx statuses are
/// reported as [`FetchError::Api`] rather than transport errors.
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str, token: &str) -> Result<Value, FetchError> {
        let response = self
            .agent
            .get(url)
            .header("Authorization", &format!("Bearer {token}"))
            .header("Accept", "application/json")
            .call()?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_string());
            return Err(FetchError::Api {
                status,
                body: error_body,
            });
        }

        Ok(body.read_json()?)
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.agent.get(url).call()?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_string());
            return Err(FetchError::Api {
                status,
                body: error_body,
            });
        }

        Ok(body.read_to_vec()?)
    }
}

/// Fetch all site content over HTTP.
pub fn fetch(source: &ContentSource, config: &SiteConfig) -> Result<SiteContent, FetchError> {
    let transport = HttpTransport::new();
    fetch_with_transport(&transport, source, config)
}

/// Fetch all site content through the given transport.
///
/// One collection query per content type. A type the space doesn't define
/// or that matches no entries leaves its layout `None`; everything else in
/// the payload is parsed defensively.
pub fn fetch_with_transport(
    transport: &impl Transport,
    source: &ContentSource,
    config: &SiteConfig,
) -> Result<SiteContent, FetchError> {
    let content = &config.content;

    let metadata = query_entries(transport, source, content, CT_SITE_METADATA)?
        .as_ref()
        .and_then(parse_metadata);
    let landing = query_entries(transport, source, content, CT_LANDING)?
        .as_ref()
        .and_then(parse_landing);
    let about = query_entries(transport, source, content, CT_ABOUT)?
        .as_ref()
        .and_then(parse_about);
    let resume = query_entries(transport, source, content, CT_RESUME)?
        .as_ref()
        .and_then(parse_resume);
    let contact = query_entries(transport, source, content, CT_CONTACT)?
        .as_ref()
        .and_then(parse_contact);

    Ok(SiteContent {
        source_host: source.effective_host().to_string(),
        space_id: source.space_id.clone(),
        environment: content.environment.clone(),
        metadata,
        landing,
        about,
        resume,
        contact,
        config: config.clone(),
    })
}

/// Collection query URL for one content type.
fn entries_url(source: &ContentSource, content: &ContentConfig, content_type: &str) -> String {
    format!(
        "https://{host}/spaces/{space}/environments/{env}/entries?content_type={ct}&fields.platform={platform}&include={depth}",
        host = source.effective_host(),
        space = urlencoding::encode(&source.space_id),
        env = urlencoding::encode(&content.environment),
        ct = urlencoding::encode(content_type),
        platform = urlencoding::encode(&content.platform),
        depth = content.include_depth,
    )
}

/// Run one collection query.
///
/// HTTP 400/404 mean the space doesn't define this content type; the layout
/// degrades to absent. Auth failures and server errors propagate.
fn query_entries(
    transport: &impl Transport,
    source: &ContentSource,
    content: &ContentConfig,
    content_type: &str,
) -> Result<Option<Value>, FetchError> {
    let url = entries_url(source, content, content_type);
    match transport.get_json(&url, &source.access_token) {
        Ok(response) => Ok(Some(response)),
        Err(FetchError::Api {
            status: 400 | 404, ..
        }) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Normalize a protocol-relative asset URL to https.
pub fn normalize_asset_url(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

// =============================================================================
// Response parsing
// =============================================================================

/// Linked records of a collection response, indexed by id.
///
/// Top-level items are indexed alongside `includes.Entry` so a link to an
/// entry that also matched the query still resolves.
struct Includes<'a> {
    entries: HashMap<&'a str, &'a Value>,
    assets: HashMap<&'a str, &'a Value>,
}

impl<'a> Includes<'a> {
    fn from_response(response: &'a Value) -> Self {
        let mut entries = HashMap::new();
        let mut assets = HashMap::new();

        for item in array_at(response, &["items"]) {
            if let Some(id) = sys_id(item) {
                entries.insert(id, item);
            }
        }
        for entry in array_at(response, &["includes", "Entry"]) {
            if let Some(id) = sys_id(entry) {
                entries.insert(id, entry);
            }
        }
        for asset in array_at(response, &["includes", "Asset"]) {
            if let Some(id) = sys_id(asset) {
                assets.insert(id, asset);
            }
        }

        Self { entries, assets }
    }

    fn entry(&self, link: &Value) -> Option<&'a Value> {
        self.entries.get(link_id(link, "Entry")?).copied()
    }

    fn asset(&self, link: &Value) -> Option<&'a Value> {
        self.assets.get(link_id(link, "Asset")?).copied()
    }
}

/// Iterate an array at a nested path, empty when anything is missing.
fn array_at<'a>(value: &'a Value, path: &[&str]) -> impl Iterator<Item = &'a Value> {
    let mut current = Some(value);
    for key in path {
        current = current.and_then(|v| v.get(key));
    }
    current
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}

/// Id of a link stub, checked against the expected link type.
fn link_id<'a>(link: &'a Value, link_type: &str) -> Option<&'a str> {
    let sys = link.get("sys")?;
    if sys.get("type")?.as_str()? != "Link" {
        return None;
    }
    if sys.get("linkType")?.as_str()? != link_type {
        return None;
    }
    sys.get("id")?.as_str()
}

fn sys_id(record: &Value) -> Option<&str> {
    record.get("sys")?.get("id")?.as_str()
}

/// First matched entry of a collection response.
fn first_item(response: &Value) -> Option<&Value> {
    response.get("items")?.as_array()?.first()
}

fn string_field(entry: &Value, name: &str) -> Option<String> {
    entry
        .get("fields")?
        .get(name)?
        .as_str()
        .map(str::to_string)
}

fn linked_asset(entry: &Value, name: &str, includes: &Includes) -> Option<AssetRef> {
    let link = entry.get("fields")?.get(name)?;
    includes.asset(link).map(parse_asset)
}

fn parse_asset(asset: &Value) -> AssetRef {
    let fields = asset.get("fields");
    AssetRef {
        id: sys_id(asset).map(str::to_string),
        url: fields
            .and_then(|f| f.get("file"))
            .and_then(|f| f.get("url"))
            .and_then(Value::as_str)
            .map(normalize_asset_url),
        title: fields
            .and_then(|f| f.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string),
        ..Default::default()
    }
}

fn parse_metadata(response: &Value) -> Option<SiteMetadata> {
    let entry = first_item(response)?;
    Some(SiteMetadata {
        // Kept as a raw value on purpose: only a plain string may be used
        // as the title, and that decision belongs to the accessor.
        header_page_title: entry
            .get("fields")
            .and_then(|f| f.get("headerPageTitle"))
            .cloned(),
    })
}

fn parse_landing(response: &Value) -> Option<LandingLayout> {
    let entry = first_item(response)?;
    let includes = Includes::from_response(response);

    let projects = entry
        .get("fields")
        .and_then(|f| f.get("projects"))
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .filter_map(|link| includes.entry(link))
                .map(|project| parse_project(project, &includes))
                .collect()
        })
        .unwrap_or_default();

    Some(LandingLayout {
        statement: string_field(entry, "statement"),
        projects,
    })
}

fn parse_project(entry: &Value, includes: &Includes) -> Project {
    let images = entry
        .get("fields")
        .and_then(|f| f.get("images"))
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .filter_map(|link| includes.asset(link))
                .map(parse_asset)
                .collect()
        })
        .unwrap_or_default();

    Project {
        title: string_field(entry, "title"),
        slug: string_field(entry, "slug"),
        preview: linked_asset(entry, "preview", includes),
        body: string_field(entry, "body"),
        images,
    }
}

fn parse_about(response: &Value) -> Option<AboutLayout> {
    let entry = first_item(response)?;
    let includes = Includes::from_response(response);
    Some(AboutLayout {
        statement: string_field(entry, "statement"),
        description: string_field(entry, "description"),
        portrait: linked_asset(entry, "portrait", &includes),
    })
}

fn parse_resume(response: &Value) -> Option<ResumeLayout> {
    let entry = first_item(response)?;
    let includes = Includes::from_response(response);
    Some(ResumeLayout {
        statement: string_field(entry, "statement"),
        description: string_field(entry, "description"),
        attachment: linked_asset(entry, "attachment", &includes),
    })
}

fn parse_contact(response: &Value) -> Option<ContactLayout> {
    let entry = first_item(response)?;
    Some(ContactLayout {
        statement: string_field(entry, "statement"),
        linked_in_url: string_field(entry, "linkedInUrl"),
        description: string_field(entry, "description"),
    })
}
