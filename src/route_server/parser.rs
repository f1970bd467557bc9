use ipnetwork::IpNetwork;
use regex::Regex;

use crate::shared::ASN;

/// Lines that are table chrome rather than routes
const HEADER_PREFIXES: [&str; 10] = [
    "BGP routing table",
    "Status codes",
    "Origin codes",
    "Network",
    "Path",
    "Total number",
    "Displayed",
    "route-server",
    "show ",
    "%",
];

const PREFIX_SCAN_LIMIT: usize = 15;
const NEXT_HOP_WINDOW: usize = 6;
const MAX_SKIPPED_METRIC_COLUMNS: usize = 3;
const ORIGIN_CODES: [&str; 3] = ["i", "e", "?"];

lazy_static::lazy_static! {
    // Loose next-hop shape: dotted quad, or hex digits and colons
    static ref NEXT_HOP_RE: Regex =
        Regex::new(r"^(?:\d{1,3}(?:\.\d{1,3}){3}|[0-9A-Fa-f:]+)$").unwrap();
}

/// One route scraped from a `show bgp` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRoute {
    pub prefix: String,
    pub as_path: Vec<ASN>,
}

impl ParsedRoute {
    pub fn origin(&self) -> Option<ASN> {
        self.as_path.last().copied()
    }

    /// The prefix as a network, when it is well-formed CIDR
    pub fn network(&self) -> Option<IpNetwork> {
        self.prefix.parse().ok()
    }
}

/// Strip the route status marker glued to a prefix, e.g. `*>1.2.3.0/24`
fn clean_prefix(token: &str) -> &str {
    token
        .trim()
        .trim_start_matches(|c: char| c == '*' || c == '>')
        .trim()
}

fn looks_like_prefix(token: &str) -> bool {
    let t = clean_prefix(token);
    t.contains('/') && (t.contains('.') || t.contains(':'))
}

fn looks_like_next_hop(token: &str) -> bool {
    let t = token.trim();
    NEXT_HOP_RE.is_match(t) && !t.contains('/') && (t.contains('.') || t.contains(':'))
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Parse one line of `show bgp` output into a route.
///
/// Best-effort: anything that does not look like a route line is dropped
/// rather than guessed at.
pub fn parse_line(line: &str) -> Option<ParsedRoute> {
    let s = line.trim();
    if s.is_empty() {
        return None;
    }
    if HEADER_PREFIXES.iter().any(|h| s.starts_with(h)) {
        return None;
    }

    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }

    let prefix_idx = parts
        .iter()
        .take(PREFIX_SCAN_LIMIT)
        .position(|t| looks_like_prefix(t))?;
    let prefix = clean_prefix(parts[prefix_idx]);
    if !prefix.contains('/') {
        return None;
    }

    let window_end = (prefix_idx + 1 + NEXT_HOP_WINDOW).min(parts.len());
    let next_hop_idx = (prefix_idx + 1..window_end).find(|&j| looks_like_next_hop(parts[j]))?;

    let mut tail = &parts[next_hop_idx + 1..];
    if let Some(last) = tail.last() {
        if ORIGIN_CODES.contains(last) {
            tail = &tail[..tail.len() - 1];
        }
    }

    // Metric, local-pref and weight columns come before the path
    let skipped = tail
        .iter()
        .take(MAX_SKIPPED_METRIC_COLUMNS)
        .take_while(|t| is_digits(t))
        .count();

    // A digit run too wide for an ASN still fills a metric slot above, but
    // cannot be a hop and is left out of the path
    let as_path: Vec<ASN> = tail[skipped..]
        .iter()
        .filter(|t| is_digits(t))
        .filter_map(|t| t.parse::<ASN>().ok())
        .filter(|&asn| asn != 0)
        .collect();

    if as_path.is_empty() {
        return None;
    }

    Some(ParsedRoute {
        prefix: prefix.to_string(),
        as_path,
    })
}

/// Run every line through [`parse_line`], keeping the accepted routes
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<ParsedRoute> {
    lines.iter().filter_map(|l| parse_line(l.as_ref())).collect()
}
