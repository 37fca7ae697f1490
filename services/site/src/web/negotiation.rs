//! services/site/src/web/negotiation.rs
//!
//! Decides whether a caller wants a machine-readable reply or a browser page.

use axum::http::{header, HeaderMap};

const JSON: &str = "application/json";
const HTML: &str = "text/html";

struct MediaRange<'a> {
    kind: &'a str,
    subtype: &'a str,
    quality: f32,
}

impl MediaRange<'_> {
    /// How specifically this range matches `offered`, if at all.
    fn specificity(&self, offered: &str) -> Option<u8> {
        let (kind, subtype) = offered.split_once('/')?;
        match (self.kind, self.subtype) {
            ("*", "*") => Some(0),
            (k, "*") if k.eq_ignore_ascii_case(kind) => Some(1),
            (k, s) if k.eq_ignore_ascii_case(kind) && s.eq_ignore_ascii_case(subtype) => Some(2),
            _ => None,
        }
    }
}

fn parse_accept(accept: &str) -> Vec<MediaRange<'_>> {
    accept
        .split(',')
        .filter_map(|part| {
            let mut params = part.split(';');
            let (kind, subtype) = params.next()?.trim().split_once('/')?;
            let quality = params
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some(MediaRange {
                kind: kind.trim(),
                subtype: subtype.trim(),
                quality,
            })
        })
        .collect()
}

/// Picks the best of `offered` for the given `Accept` header value.
///
/// The quality of an offer is that of the most specific range matching it.
/// Ties go to the earlier offer; with no `Accept` header the first offer wins.
pub fn preferred<'o>(accept: Option<&str>, offered: &[&'o str]) -> Option<&'o str> {
    let accept = match accept.map(str::trim) {
        None | Some("") => return offered.first().copied(),
        Some(accept) => accept,
    };
    let ranges = parse_accept(accept);

    let mut best: Option<(&'o str, f32)> = None;
    for &offer in offered {
        let quality = ranges
            .iter()
            .filter_map(|range| range.specificity(offer).map(|s| (s, range.quality)))
            .max_by_key(|(specificity, _)| *specificity)
            .map_or(0.0, |(_, quality)| quality);
        if quality > 0.0 && best.map_or(true, |(_, q)| quality > q) {
            best = Some((offer, quality));
        }
    }
    best.map(|(offer, _)| offer)
}

/// True for AJAX calls and clients that prefer JSON over HTML.
pub fn is_machine_readable(headers: &HeaderMap) -> bool {
    let xhr = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    if xhr {
        return true;
    }
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    preferred(accept, &[JSON, HTML]) == Some(JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn browsers_prefer_html() {
        let accept = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
        assert_eq!(preferred(Some(accept), &[JSON, HTML]), Some(HTML));
        assert!(!is_machine_readable(&headers(&[("accept", accept)])));
    }

    #[test]
    fn json_clients_are_machine_readable() {
        assert!(is_machine_readable(&headers(&[("accept", "application/json")])));
        assert!(is_machine_readable(&headers(&[(
            "accept",
            "text/html;q=0.5, application/json"
        )])));
    }

    #[test]
    fn xhr_marker_wins_over_accept() {
        assert!(is_machine_readable(&headers(&[
            ("accept", "text/html"),
            ("x-requested-with", "XMLHttpRequest"),
        ])));
    }

    #[test]
    fn wildcards_and_missing_headers_favour_the_first_offer() {
        assert_eq!(preferred(Some("*/*"), &[JSON, HTML]), Some(JSON));
        assert_eq!(preferred(None, &[JSON, HTML]), Some(JSON));
        assert!(is_machine_readable(&HeaderMap::new()));
    }

    #[test]
    fn unacceptable_offers_are_skipped() {
        assert_eq!(preferred(Some("image/png"), &[JSON, HTML]), None);
        assert_eq!(preferred(Some("application/json;q=0"), &[JSON, HTML]), None);
        assert_eq!(preferred(Some("text/*"), &[JSON, HTML]), Some(HTML));
    }
}
