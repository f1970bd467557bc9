use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};

use ipnetwork::IpNetwork;

use super::{build_client, get_checked};
use crate::config::HttpConfig;
use crate::retry::with_retry;
use crate::shared::{Result, ASN};

/// Prefixes announced by an ASN, from the bgp.tools `table.txt` dump
pub struct PrefixTableCollector {
    http: HttpConfig,
}

impl PrefixTableCollector {
    pub fn new(http: HttpConfig) -> Self {
        PrefixTableCollector { http }
    }

    pub fn fetch_prefixes(&self, asn: ASN) -> Result<Vec<IpNetwork>> {
        log::info!("Streaming {} for AS{}", self.http.table_url, asn);
        with_retry(&self.http.retry_policy(), "Prefix table download", |_| {
            let client = build_client(&self.http, self.http.table_timeout())?;
            let response = get_checked(&client, &self.http.table_url)?;
            prefixes_for_origin(response, asn)
        })
    }
}

/// Prefixes of the `<prefix> <asn>` lines ending in `asn`, first-seen order,
/// without duplicates
pub fn prefixes_for_origin<R: Read>(reader: R, asn: ASN) -> Result<Vec<IpNetwork>> {
    let suffix = format!(" {}", asn);
    let mut seen = HashSet::new();
    let mut prefixes = Vec::new();

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || !line.ends_with(&suffix) {
            continue;
        }
        let Some(token) = line.split_whitespace().next() else {
            continue;
        };
        match token.parse::<IpNetwork>() {
            Ok(prefix) => {
                if seen.insert(prefix) {
                    prefixes.push(prefix);
                }
            }
            Err(_) => log::debug!("Skipping malformed table line: {}", line),
        }
    }
    Ok(prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_for_origin() {
        let table = "1.2.3.0/24 56040\n\
                     1.2.4.0/24 156040\n\
                     2409:8000::/20 56040\n\
                     \n\
                     1.2.3.0/24 56040\n\
                     garbage 56040\n\
                     5.6.7.0/24 1299\n";
        let prefixes = prefixes_for_origin(table.as_bytes(), 56040).unwrap();

        let expected: Vec<IpNetwork> = vec!["1.2.3.0/24".parse().unwrap(), "2409:8000::/20".parse().unwrap()];
        assert_eq!(prefixes, expected);
    }
}
