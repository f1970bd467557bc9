use regex::Regex;
use serde_json::Value;

use super::{build_client, get_checked};
use crate::config::HttpConfig;
use crate::retry::with_retry;
use crate::shared::{Result, ASN};

const PATH_KEYS: [&str; 4] = ["as_path", "aspath", "path", "as-path"];

lazy_static::lazy_static! {
    static ref DIGITS_RE: Regex = Regex::new(r"\d+").unwrap();
}

/// AS paths towards an origin as seen by RIPE RIS peers (RIPEstat
/// `ris-peerings`)
pub struct RisPathCollector {
    http: HttpConfig,
}

impl RisPathCollector {
    pub fn new(http: HttpConfig) -> Self {
        RisPathCollector { http }
    }

    pub fn fetch_aspaths_for_origin(&self, asn: ASN) -> Result<Vec<Vec<ASN>>> {
        let url = format!("{}ris-peerings/data.json?resource=AS{}", self.http.ripestat_url, asn);
        let body: Value = with_retry(&self.http.retry_policy(), "RIS peerings download", |_| {
            let client = build_client(&self.http, self.http.timeout())?;
            let response = get_checked(&client, &url)?;
            parse_body(&response.bytes()?)
        })?;

        let paths = extract_origin_paths(&body, asn);
        log::info!("RIS returned {} paths ending at AS{}", paths.len(), asn);
        Ok(paths)
    }
}

/// Decode a RIPEstat reply; a malformed body is a JSON error
pub fn parse_body(body: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(body)?)
}

fn digit_runs(text: &str) -> Option<Vec<ASN>> {
    let nums: Vec<ASN> = DIGITS_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<ASN>().ok())
        .collect();
    if nums.is_empty() {
        None
    } else {
        Some(nums)
    }
}

/// Read an AS path out of one `routes` element, whatever shape it has:
/// a list of numbers, a string, or an object holding one of those.
pub fn to_as_path(value: &Value) -> Option<Vec<ASN>> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let path: Vec<ASN> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Number(n) => n.as_u64().and_then(|n| ASN::try_from(n).ok()),
                    Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                        s.parse::<ASN>().ok()
                    }
                    _ => None,
                })
                .collect();
            if path.is_empty() {
                None
            } else {
                Some(path)
            }
        }
        Value::String(s) => digit_runs(s),
        Value::Object(map) => match PATH_KEYS.iter().find_map(|k| map.get(*k)) {
            Some(inner) => to_as_path(inner),
            None => digit_runs(&value.to_string()),
        },
        other => digit_runs(&other.to_string()),
    }
}

/// Walk `data.peerings[].peers[].routes[]`, keeping paths that end at `asn`
pub fn extract_origin_paths(body: &Value, asn: ASN) -> Vec<Vec<ASN>> {
    let empty = Vec::new();
    let list = |v: &Value, key: &str| -> Vec<Value> {
        v.get(key).and_then(Value::as_array).cloned().unwrap_or_default()
    };

    let mut out = Vec::new();
    let data = body.get("data").unwrap_or(&Value::Null);
    for probe in data.get("peerings").and_then(Value::as_array).unwrap_or(&empty) {
        for peer in list(probe, "peers") {
            for route in list(&peer, "routes") {
                if let Some(path) = to_as_path(&route) {
                    if path.last() == Some(&asn) {
                        out.push(path);
                    }
                }
            }
        }
    }
    out
}
