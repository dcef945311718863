//! Gateway URL construction

/// Gateway API version
pub const GATEWAY_VERSION: u8 = 9;

/// Append the encoding, version and (optionally) compression parameters
#[must_use]
pub fn gateway_url(base: &str, compress: bool) -> String {
    let base = base.trim_end_matches('/');
    let separator = if base.contains('?') { '&' } else { '?' };
    let path = if base.contains('?') { "" } else { "/" };

    let mut url = format!("{base}{path}{separator}encoding=json&v={GATEWAY_VERSION}");
    if compress {
        url.push_str("&compress=zlib-stream");
    }
    url
}
