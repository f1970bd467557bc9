use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::{build_client, get_checked};
use crate::config::HttpConfig;
use crate::retry::with_retry;
use crate::shared::{Error, Result, ASN};

/// Downloads the bgp.tools ASN name table, keeping one copy per UTC day
pub struct AsnNameCollector {
    http: HttpConfig,
    cache_dir: PathBuf,
}

impl AsnNameCollector {
    pub fn new(http: HttpConfig, cache_dir: &Path) -> Self {
        AsnNameCollector {
            http,
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    pub fn run(&self) -> Result<HashMap<ASN, String>> {
        fs::create_dir_all(&self.cache_dir)?;

        let cached_path = self.get_cached_path();
        if cached_path.exists() {
            log::info!("Using cached ASN names from {:?}", cached_path);
            return parse_asn_csv(File::open(&cached_path)?);
        }

        log::info!("Downloading ASN names from {}", self.http.asns_csv_url);
        let body = with_retry(&self.http.retry_policy(), "ASN name download", |_| self.download())?;
        let names = parse_asn_csv(body.as_slice())?;

        // Only cache what parsed
        fs::write(&cached_path, &body)?;
        log::info!("Loaded {} ASN names, saved to {:?}", names.len(), cached_path);
        Ok(names)
    }

    fn get_cached_path(&self) -> PathBuf {
        let filename = format!("asns_{}.csv", Utc::now().format("%Y%m%d"));
        self.cache_dir.join(filename)
    }

    fn download(&self) -> Result<Vec<u8>> {
        let client = build_client(&self.http, self.http.timeout())?;
        let response = get_checked(&client, &self.http.asns_csv_url)?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Parse the `asn,name,...` CSV. Rows whose `asn` is not `AS<number>` are
/// skipped.
pub fn parse_asn_csv<R: Read>(reader: R) -> Result<HashMap<ASN, String>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let (asn_col, name_col) = match (column("asn"), column("name")) {
        (Some(a), Some(n)) => (a, n),
        _ => {
            return Err(Error::Format(format!(
                "ASN table lacks asn/name columns: {:?}",
                headers
            )))
        }
    };

    let mut names = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let asn_field = record.get(asn_col).unwrap_or("").trim().to_uppercase();
        let name = record.get(name_col).unwrap_or("").trim();
        if let Some(number) = asn_field.strip_prefix("AS") {
            if let Ok(asn) = number.parse::<ASN>() {
                names.insert(asn, name.to_string());
            }
        }
    }
    Ok(names)
}
