//! Server configuration, loaded from the environment.
//!
//! Everything the host needs is passed around explicitly from here; nothing
//! reads the environment after startup.

use crate::memento::ProtocolMode;
use crate::models::{OriginalResource, Title, MAIN_NAMESPACE};

const DEFAULT_HOST: &str = "127.0.0.1";

/// Builds the absolute URIs of pages, Mementos, TimeGates and TimeMaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlScheme {
    base_url: String,
}

impl UrlScheme {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Live URI of a page.
    pub fn page_uri(&self, title: &Title) -> String {
        format!("{}/wiki/{}", self.base_url, encode_title(title))
    }

    /// URI of one specific revision of a page.
    pub fn memento_uri(&self, title: &Title, revision_id: i64) -> String {
        format!("{}?oldid={}", self.page_uri(title), revision_id)
    }

    pub fn timegate_uri(&self, title: &Title) -> String {
        format!("{}/timegate/{}", self.base_url, encode_title(title))
    }

    pub fn timemap_uri(&self, title: &Title) -> String {
        format!("{}/timemap/{}", self.base_url, encode_title(title))
    }

    pub fn original(&self, title: &Title) -> OriginalResource {
        OriginalResource::new(
            self.page_uri(title),
            self.timegate_uri(title),
            self.timemap_uri(title),
        )
    }
}

/// Percent-encode a title for use as a path segment. The namespace colon is
/// left readable.
fn encode_title(title: &Title) -> String {
    urlencoding::encode(&title.key()).replace("%3A", ":")
}

/// Which namespaces take part in Memento negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePolicy {
    included: Vec<String>,
}

impl NamespacePolicy {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let included = namespaces
            .into_iter()
            .map(|ns| ns.as_ref().trim().replace(' ', "_"))
            .filter(|ns| !ns.is_empty())
            .collect();
        Self { included }
    }

    /// Only the unprefixed namespace.
    pub fn main_only() -> Self {
        Self::new([MAIN_NAMESPACE])
    }

    pub fn allows(&self, title: &Title) -> bool {
        self.included
            .iter()
            .any(|ns| ns.eq_ignore_ascii_case(title.namespace_label()))
    }
}

impl Default for NamespacePolicy {
    fn default() -> Self {
        Self::main_only()
    }
}

/// Runtime configuration of the Memento server.
#[derive(Debug, Clone)]
pub struct MementoConfig {
    /// URI scheme (from MEMENTO_BASE_URL, defaults to the listen address)
    pub urls: UrlScheme,
    /// Namespaces served by TimeGate and TimeMap (from MEMENTO_INCLUDE_NAMESPACES, comma-separated)
    pub namespaces: NamespacePolicy,
    /// 302 or 200-style negotiation (from MEMENTO_MODE)
    pub mode: ProtocolMode,
    /// Bearer token required on write endpoints (from MEMENTO_API_KEY)
    pub api_key: Option<String>,
}

impl MementoConfig {
    /// Load configuration from environment variables. `port` is only used to
    /// derive the default base URL.
    pub fn from_env(port: u16) -> Self {
        let base_url = std::env::var("MEMENTO_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", DEFAULT_HOST, port));

        let namespaces = std::env::var("MEMENTO_INCLUDE_NAMESPACES")
            .ok()
            .map(|s| NamespacePolicy::new(s.split(',')))
            .unwrap_or_default();

        let mode = match std::env::var("MEMENTO_MODE") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to 302 negotiation", e);
                ProtocolMode::Redirect
            }),
            Err(_) => ProtocolMode::Redirect,
        };

        let api_key = std::env::var("MEMENTO_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Self {
            urls: UrlScheme::new(base_url),
            namespaces,
            mode,
            api_key,
        }
    }

    /// Main namespace only, 302 negotiation, no authentication.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            urls: UrlScheme::new(base_url),
            namespaces: NamespacePolicy::default(),
            mode: ProtocolMode::Redirect,
            api_key: None,
        }
    }

    pub fn with_mode(mut self, mode: ProtocolMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_namespaces(mut self, namespaces: NamespacePolicy) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}
