use crate::registry::model::Evidence;
use idna::domain_to_ascii;
use url::{Host, Url};

/// Key shared by every piece of evidence that carries no usable provenance.
pub const UNSOURCED: &str = "unsourced";

/// Source-domain key used to judge independence.
///
/// `url` wins over `source_uri`. A parseable URL with a host yields the host
/// (IDNA ASCII, lowercase, no trailing dot, one leading `www.` removed).
/// Subdomains stay distinct. Without a host the key falls back to
/// `connector:<name>`, then to [`UNSOURCED`].
pub fn domain_key(evidence: &Evidence) -> String {
    for candidate in [evidence.url.as_deref(), evidence.source_uri.as_deref()]
        .into_iter()
        .flatten()
    {
        if let Some(host) = canonical_host(candidate) {
            return host;
        }
    }
    match evidence.connector.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => format!("connector:{}", c.to_ascii_lowercase()),
        _ => UNSOURCED.to_string(),
    }
}

pub fn canonical_host(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = match url.host()? {
        Host::Domain(d) => d.to_string(),
        Host::Ipv4(ip) => return Some(ip.to_string()),
        Host::Ipv6(ip) => return Some(ip.to_string()),
    };
    let ascii = domain_to_ascii(&host).ok()?.to_ascii_lowercase();
    let ascii = ascii.trim_end_matches('.');
    let ascii = ascii.strip_prefix("www.").unwrap_or(ascii);
    if ascii.is_empty() {
        return None;
    }
    Some(ascii.to_string())
}
