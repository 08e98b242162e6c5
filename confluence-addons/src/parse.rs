//! Stream normalization utilities.
//!
//! Stateless helpers that squeeze structured fields out of the
//! loosely-formatted names and descriptions upstream addons return. All
//! extraction is best-effort: a field that cannot be recovered is absent,
//! never an error.

use url::Url;

/// Marker upstreams place in descriptive text of entries rejected by
/// content moderation.
const MODERATION_MARKER: &str = "Content Warning";

/// Glyph separating a folder name from the file inside it.
const FOLDER_FILE_SEPARATOR: &str = "┈➤";

/// Stream URL rewrite directives, each field independently optional.
#[derive(Debug, Clone, Default)]
pub struct HostOverride {
    /// Replacement scheme (`"https"`)
    pub protocol: Option<String>,
    /// Replacement host (`"proxy.example.com"`)
    pub hostname: Option<String>,
    /// Replacement port
    pub port: Option<u16>,
}

impl HostOverride {
    /// Whether any rewrite directive is set.
    pub fn is_active(&self) -> bool {
        self.protocol.is_some() || self.hostname.is_some() || self.port.is_some()
    }
}

/// Finds the first line of descriptive text that names a video file.
pub fn extract_filename(text: &str) -> Option<String> {
    let re = regex::Regex::new(r"(?i)\.(mkv|mp4|avi|m2ts|ts|webm)\b").ok()?;
    text.lines()
        .find(|line| re.is_match(line))
        .map(|line| line.trim().to_string())
}

/// Extracts a size in bytes from descriptive text.
///
/// Prefers the `💾` marker convention, falling back to the first bare
/// `<number> <unit>` occurrence. Decimal values are allowed.
pub fn extract_size(text: &str) -> Option<u64> {
    if let Ok(re) = regex::Regex::new(r"💾\s*([\d.]+)\s*([KMGT]i?B)") {
        if let Some(captures) = re.captures(text) {
            if let Ok(value) = captures[1].parse::<f64>() {
                return Some(size_to_bytes(value, &captures[2]));
            }
        }
    }

    if let Ok(re) = regex::Regex::new(r"(?i)\b([\d.]+)\s*([KMGT]B)\b") {
        if let Some(captures) = re.captures(text) {
            if let Ok(value) = captures[1].parse::<f64>() {
                return Some(size_to_bytes(value, &captures[2]));
            }
        }
    }

    None
}

fn size_to_bytes(value: f64, unit: &str) -> u64 {
    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "TB" | "TIB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "GB" | "GIB" => 1024.0 * 1024.0 * 1024.0,
        "MB" | "MIB" => 1024.0 * 1024.0,
        _ => 1024.0,
    };
    (value * multiplier) as u64
}

/// Extracts a resolution hint from descriptive text.
pub fn extract_resolution(text: &str) -> Option<String> {
    let text_lower = text.to_lowercase();

    let resolution = if text_lower.contains("2160p")
        || text_lower.contains("4k")
        || text_lower.contains("uhd")
    {
        "2160p"
    } else if text_lower.contains("1440p") {
        "1440p"
    } else if text_lower.contains("1080p") {
        "1080p"
    } else if text_lower.contains("720p") {
        "720p"
    } else if text_lower.contains("576p") {
        "576p"
    } else if text_lower.contains("480p") {
        "480p"
    } else {
        return None;
    };

    Some(resolution.to_string())
}

/// Extracts the seeder count from the `👤` marker convention.
pub fn extract_seeders(text: &str) -> Option<u32> {
    let re = regex::Regex::new(r"👤\s*(\d+)").ok()?;
    let captures = re.captures(text)?;
    captures[1].parse().ok()
}

/// Language markers recognized in descriptive text: flag emoji plus the
/// spelled-out language word.
const LANGUAGE_MARKERS: &[(&str, &str)] = &[
    ("🇬🇧", "English"),
    ("🇺🇸", "English"),
    ("english", "English"),
    ("🇫🇷", "French"),
    ("french", "French"),
    ("🇩🇪", "German"),
    ("german", "German"),
    ("🇪🇸", "Spanish"),
    ("spanish", "Spanish"),
    ("🇮🇹", "Italian"),
    ("italian", "Italian"),
    ("🇵🇹", "Portuguese"),
    ("🇧🇷", "Portuguese"),
    ("portuguese", "Portuguese"),
    ("🇷🇺", "Russian"),
    ("russian", "Russian"),
    ("🇯🇵", "Japanese"),
    ("japanese", "Japanese"),
    ("🇰🇷", "Korean"),
    ("korean", "Korean"),
    ("🇮🇳", "Hindi"),
    ("hindi", "Hindi"),
    ("🇨🇳", "Chinese"),
    ("chinese", "Chinese"),
];

/// Extracts languages in order of first appearance, without duplicates.
pub fn extract_languages(text: &str) -> Vec<String> {
    let text_lower = text.to_lowercase();

    let mut found: Vec<(usize, &str)> = Vec::new();
    for (marker, language) in LANGUAGE_MARKERS {
        if let Some(position) = text_lower.find(marker) {
            match found.iter_mut().find(|(_, name)| name == language) {
                Some(existing) => existing.0 = existing.0.min(position),
                None => found.push((position, language)),
            }
        }
    }

    found.sort_by_key(|(position, _)| *position);
    found
        .into_iter()
        .map(|(_, language)| language.to_string())
        .collect()
}

/// Reads the cached marker glyphs: `⚡` cached, `⏳` uncached.
pub fn detect_cached(text: &str) -> Option<bool> {
    if text.contains('⚡') {
        Some(true)
    } else if text.contains('⏳') {
        Some(false)
    } else {
        None
    }
}

/// Whether descriptive text carries the content moderation marker.
pub fn moderation_flagged(text: &str) -> bool {
    text.contains(MODERATION_MARKER)
}

/// Splits the `📂` folder convention out of descriptive text.
///
/// Returns the full text after the glyph, plus the file name after the
/// `┈➤` separator when one is present.
pub fn split_folder_text(text: &str) -> Option<(String, Option<String>)> {
    let re = regex::Regex::new(r"📂\s*(.+)").ok()?;
    let captures = re.captures(text)?;
    let folder = captures[1].trim().to_string();

    let file = folder
        .split_once(FOLDER_FILE_SEPARATOR)
        .map(|(_, file)| file.trim().to_string())
        .filter(|file| !file.is_empty());

    Some((folder, file))
}

/// Rewrites the host parts of a stream URL.
///
/// Directives apply protocol, then port, then hostname; unset fields are
/// left untouched. An input that does not parse as a URL is returned
/// unchanged.
pub fn apply_host_override(url: &str, host_override: &HostOverride) -> String {
    if !host_override.is_active() {
        return url.to_string();
    }

    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if let Some(protocol) = &host_override.protocol {
        parsed.set_scheme(protocol).ok();
    }
    if let Some(port) = host_override.port {
        parsed.set_port(Some(port)).ok();
    }
    if let Some(hostname) = &host_override.hostname {
        parsed.set_host(Some(hostname)).ok();
    }

    parsed.to_string()
}
