use std::collections::HashSet;
use std::fmt;

use crate::analysis::frequency::FrequencyTable;
use crate::as_path::dedup_labels;
use crate::shared::{CommonASNs, Label, ASN};

pub const REPORT_HEADER: &str = "路由分析:";
pub const NO_DATA: &str = "(无数据)";

/// Default cap on paths counted per summary
pub const MAX_SAMPLES: usize = 60_000;

const TOP_ORIGINS: usize = 10;
const TOP_PAIRS: usize = 20;
const TOP_TRIPLES: usize = 20;

/// Lines of a finished summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    fn new() -> Self {
        Report {
            lines: vec![REPORT_HEADER.to_string()],
        }
    }

    fn no_data() -> Self {
        let mut report = Report::new();
        report.push(NO_DATA.to_string());
        report
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// Every `stride`-th item from index 0, `stride = n / max_samples`, when
/// there are more than `max_samples` items; all of them otherwise.
pub fn sample_paths<T>(items: &[T], max_samples: usize) -> Vec<&T> {
    let n = items.len();
    if max_samples == 0 || n <= max_samples {
        return items.iter().collect();
    }
    let stride = (n / max_samples).max(1);
    items.iter().step_by(stride).collect()
}

/// Access and upstream allow-lists for the operator-specialized summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecializedProfile {
    pub asn: ASN,
    pub target: Label,
    pub access: HashSet<Label>,
    pub upstream: HashSet<Label>,
}

impl SpecializedProfile {
    pub fn new(asn: ASN, target: &str, access: &[&str], upstream: &[&str]) -> Self {
        SpecializedProfile {
            asn,
            target: target.to_string(),
            access: access.iter().map(|s| s.to_string()).collect(),
            upstream: upstream.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn china_mobile() -> Self {
        SpecializedProfile::new(
            CommonASNs::CHINA_MOBILE,
            "CM",
            &["CMI", "China Unicom", "China Telecom", "CMIN2"],
            &["Telia", "Lumen", "Cogent", "HE", "TATA Communications"],
        )
    }
}

impl Default for SpecializedProfile {
    fn default() -> Self {
        SpecializedProfile::china_mobile()
    }
}

type Pair = (Label, Label);
type Triple = (Label, Label, Label);

fn percent(count: usize, total: usize) -> String {
    format!("{:.1}", count as f64 * 100.0 / total as f64)
}

/// Builds ranked tail-frequency reports from labeled AS paths
#[derive(Debug, Clone)]
pub struct Summarizer {
    pub max_samples: usize,
    pub profile: SpecializedProfile,
}

impl Summarizer {
    pub fn new(max_samples: usize, profile: SpecializedProfile) -> Self {
        Summarizer {
            max_samples,
            profile,
        }
    }

    fn start(&self, paths: &[Vec<Label>]) -> (Report, Vec<Vec<Label>>) {
        let sampled: Vec<Vec<Label>> = sample_paths(paths, self.max_samples)
            .into_iter()
            .map(|labels| dedup_labels(labels.as_slice()))
            .collect();

        let mut report = Report::new();
        if sampled.len() < paths.len() {
            log::debug!("Sampled {} of {} paths", sampled.len(), paths.len());
            report.push(format!("(统计抽样：{}/{} 条路径)", sampled.len(), paths.len()));
        }
        (report, sampled)
    }

    fn push_pairs(report: &mut Report, pairs: &FrequencyTable<Pair>, total: usize) {
        for ((a, o), count) in pairs.most_common(TOP_PAIRS) {
            report.push(format!("{}% [T2] {} -> {} -> END", percent(count, total), a, o));
        }
    }

    fn push_triples(report: &mut Report, triples: &FrequencyTable<Triple>, total: usize) {
        for ((u, a, o), count) in triples.most_common(TOP_TRIPLES) {
            report.push(format!(
                "{}% [T3] {} -> {} -> {} -> END",
                percent(count, total),
                u,
                a,
                o
            ));
        }
    }

    /// Origin, last-hop and last-two-hop frequencies over all paths
    pub fn generic(&self, paths: &[Vec<Label>]) -> Report {
        if paths.is_empty() {
            return Report::no_data();
        }
        let (mut report, sampled) = self.start(paths);
        let total = sampled.len();

        let mut origins: FrequencyTable<Label> = FrequencyTable::new();
        let mut pairs: FrequencyTable<Pair> = FrequencyTable::new();
        let mut triples: FrequencyTable<Triple> = FrequencyTable::new();

        for labels in &sampled {
            let n = labels.len();
            if n == 0 {
                continue;
            }
            let origin = &labels[n - 1];
            origins.add(origin.clone());
            if n >= 2 {
                pairs.add((labels[n - 2].clone(), origin.clone()));
            }
            if n >= 3 {
                triples.add((labels[n - 3].clone(), labels[n - 2].clone(), origin.clone()));
            }
        }

        for (origin, count) in origins.most_common(TOP_ORIGINS) {
            report.push(format!("{}% [T1] {}", percent(count, total), origin));
        }
        Self::push_pairs(&mut report, &pairs, total);
        Self::push_triples(&mut report, &triples, total);
        report
    }

    /// Only paths ending at the profile's target, restricted to the
    /// access/upstream allow-lists
    pub fn specialized(&self, paths: &[Vec<Label>]) -> Report {
        if paths.is_empty() {
            return Report::no_data();
        }
        let (mut report, sampled) = self.start(paths);
        let total = sampled.len();
        let target = &self.profile.target;

        let mut pairs: FrequencyTable<Pair> = FrequencyTable::new();
        let mut triples: FrequencyTable<Triple> = FrequencyTable::new();

        for labels in &sampled {
            let n = labels.len();
            if n == 0 || &labels[n - 1] != target {
                continue;
            }
            if n >= 2 && self.profile.access.contains(&labels[n - 2]) {
                pairs.add((labels[n - 2].clone(), target.clone()));
            }
            if n >= 3 {
                let (upstream, access) = (&labels[n - 3], &labels[n - 2]);
                if self.profile.access.contains(access) && self.profile.upstream.contains(upstream) {
                    triples.add((upstream.clone(), access.clone(), target.clone()));
                }
            }
        }

        report.push(format!("{:.1}% [T1] {}", 100.0, target));
        Self::push_pairs(&mut report, &pairs, total);
        Self::push_triples(&mut report, &triples, total);
        report
    }

    /// The specialized summary for the profile's ASN, the generic one otherwise
    pub fn for_asn(&self, paths: &[Vec<Label>], target_asn: ASN) -> Report {
        if target_asn == self.profile.asn {
            self.specialized(paths)
        } else {
            self.generic(paths)
        }
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Summarizer::new(MAX_SAMPLES, SpecializedProfile::default())
    }
}

pub fn summarize_generic(paths: &[Vec<Label>]) -> Report {
    Summarizer::default().generic(paths)
}

pub fn summarize_specialized(paths: &[Vec<Label>]) -> Report {
    Summarizer::default().specialized(paths)
}

pub fn summarize_for_asn(paths: &[Vec<Label>], target_asn: ASN) -> Report {
    Summarizer::default().for_asn(paths, target_asn)
}
