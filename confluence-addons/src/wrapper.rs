//! Base upstream wrapper behavior shared by every addon family.
//!
//! One `AddonWrapper` is constructed per upstream instance and holds
//! everything resolved before the fetch: endpoint, headers, clamped
//! timeout, and the variant tag that selects parse specializations.
//! Instances are stateless beyond this constructor-bound configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::addons::AddonKind;
use crate::errors::FetchError;
use crate::parse::{self, HostOverride};
use crate::transport::{Transport, TransportError};
use crate::types::{
    AggregateResult, ParseResult, ParsedStream, RawStreamEntry, StreamRequest, StreamsResponse,
};

/// One upstream addon instance, bound to a resolved endpoint.
#[derive(Debug)]
pub struct AddonWrapper {
    kind: AddonKind,
    name: String,
    addon_id: String,
    base_url: String,
    headers: Vec<(String, String)>,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    host_override: HostOverride,
}

impl AddonWrapper {
    /// Binds a wrapper to an endpoint. The base URL is normalized to end
    /// with a slash so the request path can be appended directly.
    pub fn new(
        kind: AddonKind,
        name: String,
        addon_id: String,
        base_url: String,
        headers: Vec<(String, String)>,
        timeout: Duration,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url
        } else {
            format!("{base_url}/")
        };

        Self {
            kind,
            name,
            addon_id,
            base_url,
            headers,
            timeout,
            transport,
            host_override: HostOverride::default(),
        }
    }

    /// Attaches stream URL rewrite directives applied after parsing.
    pub fn with_host_override(mut self, host_override: HostOverride) -> Self {
        self.host_override = host_override;
        self
    }

    /// Display name used for log and error attribution.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, request: &StreamRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }

    /// Fetches and decodes the upstream stream list.
    ///
    /// # Errors
    /// - `FetchError::Timeout` - No response within the effective timeout
    /// - `FetchError::Request` - Connection or protocol failure
    /// - `FetchError::BadStatus` - Upstream answered outside the 2xx range
    /// - `FetchError::MalformedResponse` - Body did not decode as a stream list
    pub async fn fetch_raw(
        &self,
        request: &StreamRequest,
    ) -> Result<Vec<RawStreamEntry>, FetchError> {
        let url = self.endpoint(request);
        // The endpoint may embed an encoded credential token, so logs get
        // the relative path only.
        tracing::debug!("[{}] {} fetching {}", self.addon_id, self.name, request.path());

        let response = self
            .transport
            .fetch(&url, &self.headers, self.timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => FetchError::Timeout {
                    addon: self.name.clone(),
                },
                TransportError::Request { reason } => FetchError::Request {
                    addon: self.name.clone(),
                    reason,
                },
            })?;

        if !response.is_success() {
            return Err(FetchError::BadStatus {
                addon: self.name.clone(),
                status: response.status,
            });
        }

        let decoded: StreamsResponse =
            serde_json::from_str(&response.body).map_err(|e| FetchError::MalformedResponse {
                addon: self.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(decoded.streams)
    }

    /// Normalizes one raw entry.
    ///
    /// Base extraction never fails; missing fields degrade to absent.
    /// Variant hooks layer on top: MediaFusion rejects moderated entries
    /// and extracts folder names, Jackettio rewrites stream URL hosts.
    pub fn parse_stream(&self, entry: &RawStreamEntry) -> ParseResult {
        match self.kind {
            AddonKind::MediaFusion => self.parse_mediafusion(entry),
            AddonKind::Jackettio => self.parse_jackettio(entry),
        }
    }

    fn parse_base(&self, entry: &RawStreamEntry) -> ParsedStream {
        let text = entry.descriptive_text().unwrap_or("");
        let hints = entry.behavior_hints.as_ref();

        // The name line usually carries the resolution and cached markers,
        // the description the rest.
        let combined = match entry.name.as_deref() {
            Some(name) => format!("{name}\n{text}"),
            None => text.to_string(),
        };

        ParsedStream {
            url: entry.url.clone().unwrap_or_default(),
            filename: hints
                .and_then(|hints| hints.filename.clone())
                .or_else(|| parse::extract_filename(text)),
            folder_name: None,
            size: hints
                .and_then(|hints| hints.video_size)
                .or_else(|| parse::extract_size(text)),
            quality: parse::extract_resolution(&combined),
            seeders: parse::extract_seeders(&combined),
            languages: parse::extract_languages(&combined),
            cached: parse::detect_cached(&combined),
        }
    }

    fn parse_mediafusion(&self, entry: &RawStreamEntry) -> ParseResult {
        if let Some(text) = entry.descriptive_text() {
            if parse::moderation_flagged(text) {
                return ParseResult::Error {
                    message: text.to_string(),
                };
            }
        }

        let mut stream = self.parse_base(entry);

        if let Some(text) = entry.descriptive_text() {
            if let Some((folder, file)) = parse::split_folder_text(text) {
                let matches_filename =
                    stream.filename.as_deref().map(str::trim) == Some(folder.as_str());
                if !matches_filename {
                    stream.folder_name = Some(folder);
                    if let Some(file) = file {
                        stream.filename = Some(file);
                    }
                }
            }
        }

        ParseResult::Stream(stream)
    }

    fn parse_jackettio(&self, entry: &RawStreamEntry) -> ParseResult {
        let mut stream = self.parse_base(entry);

        if entry.url.is_some() && self.host_override.is_active() {
            stream.url = parse::apply_host_override(&stream.url, &self.host_override);
        }

        ParseResult::Stream(stream)
    }

    /// Fetches and normalizes every entry, preserving upstream order.
    ///
    /// Entries rejected by a variant hook land in `addon_errors`; nothing
    /// is silently dropped.
    ///
    /// # Errors
    /// - `FetchError` - The fetch itself failed; see [`Self::fetch_raw`]
    pub async fn get_parsed_streams(
        &self,
        request: &StreamRequest,
    ) -> Result<AggregateResult, FetchError> {
        let entries = self.fetch_raw(request).await?;

        let mut result = AggregateResult::default();
        for entry in &entries {
            match self.parse_stream(entry) {
                ParseResult::Stream(stream) => result.addon_streams.push(stream),
                ParseResult::Error { message } => {
                    tracing::warn!("[{}] {} rejected an entry: {}", self.addon_id, self.name, message);
                    result.addon_errors.push(message);
                }
            }
        }

        tracing::debug!(
            "[{}] {} returned {} streams, {} errors",
            self.addon_id,
            self.name,
            result.addon_streams.len(),
            result.addon_errors.len()
        );

        Ok(result)
    }
}
