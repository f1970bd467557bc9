use std::collections::HashMap;
use std::sync::Arc;

use crate::analysis::{Report, SpecializedProfile, Summarizer};
use crate::as_path::labeled_paths;
use crate::cache::TtlCache;
use crate::collectors::{AsnNameCollector, RisPathCollector};
use crate::config::Config;
use crate::labels::LabelRules;
use crate::route_server::RouteServerClient;
use crate::shared::{AddressFamily, PathSource, Result, ASN};

const NAMES_KEY: &str = "asn-names";

/// Runs the whole pipeline for one origin ASN: collect AS paths, label
/// them and summarize.
///
/// Name tables and finished reports are kept for the configured TTL.
pub struct RouteAnalyzer {
    config: Config,
    rules: LabelRules,
    summarizer: Summarizer,
    names: TtlCache<Arc<HashMap<ASN, String>>>,
    reports: TtlCache<String>,
}

impl RouteAnalyzer {
    pub fn new(config: Config) -> Self {
        let ttl = config.cache.ttl();
        let capacity = config.cache.capacity;
        let summarizer = Summarizer::new(config.analysis.max_samples, SpecializedProfile::default());
        RouteAnalyzer {
            config,
            rules: LabelRules::default_rules().clone(),
            summarizer,
            names: TtlCache::with_capacity(ttl, 1),
            reports: TtlCache::with_capacity(ttl, capacity),
        }
    }

    pub fn with_label_rules(mut self, rules: LabelRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_profile(mut self, profile: SpecializedProfile) -> Self {
        self.summarizer.profile = profile;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn asn_names(&self) -> Result<Arc<HashMap<ASN, String>>> {
        if let Some(names) = self.names.get(NAMES_KEY) {
            return Ok(names);
        }
        let collector = AsnNameCollector::new(self.config.http.clone(), &self.config.cache.cache_dir());
        let names = Arc::new(collector.run()?);
        self.names.set(NAMES_KEY, Arc::clone(&names));
        Ok(names)
    }

    /// Raw AS paths towards `asn` from `source`
    pub fn collect_paths(&self, asn: ASN, family: AddressFamily, source: PathSource) -> Result<Vec<Vec<ASN>>> {
        match source {
            PathSource::RouteServer => {
                let client = RouteServerClient::new(self.config.route_server.clone());
                let (routes, raw_lines) = client.fetch_prefix_aspaths_by_origin_asn(asn, family)?;
                log::info!("{} routes from {} route server lines", routes.len(), raw_lines);
                Ok(routes.into_iter().map(|r| r.as_path).collect())
            }
            PathSource::Ris => {
                if family == AddressFamily::Ipv6 {
                    log::debug!("RIS peerings mix address families, ignoring {}", family);
                }
                RisPathCollector::new(self.config.http.clone()).fetch_aspaths_for_origin(asn)
            }
        }
    }

    /// Label `paths` with `names` and build the report for `asn`
    pub fn summarize_paths(&self, asn: ASN, paths: &[Vec<ASN>], names: &HashMap<ASN, String>) -> Report {
        let labeled = labeled_paths(paths, names, &self.rules);
        log::debug!("{} of {} paths survived cleaning", labeled.len(), paths.len());
        self.summarizer.for_asn(&labeled, asn)
    }

    pub fn analyze(&self, asn: ASN, family: AddressFamily, source: PathSource) -> Result<String> {
        let key = format!("{}:{}:{}", source, family, asn);
        if let Some(report) = self.reports.get(&key) {
            log::info!("Using cached report for {}", key);
            return Ok(report);
        }

        let names = self.asn_names()?;
        let paths = self.collect_paths(asn, family, source)?;
        let report = self.summarize_paths(asn, &paths, &names).to_string();

        self.reports.set(&key, report.clone());
        Ok(report)
    }
}
