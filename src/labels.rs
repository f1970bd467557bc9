use std::collections::HashMap;

use crate::shared::{CommonASNs, Label, ASN};

/// Longest fallback label taken from a registry name
pub const MAX_NAME_LABEL_CHARS: usize = 60;

/// Maps a name to `label` when any keyword occurs in it (case-insensitive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub label: Label,
}

impl KeywordRule {
    pub fn new(keywords: &[&str], label: &str) -> Self {
        KeywordRule {
            keywords: keywords.iter().map(|k| k.to_uppercase()).collect(),
            label: label.to_string(),
        }
    }

    fn matches(&self, upper_name: &str) -> bool {
        self.keywords.iter().any(|k| upper_name.contains(k.as_str()))
    }
}

/// Lookup data for turning `(asn, name)` pairs into short labels.
///
/// Exact ASN entries always win over keyword rules, and keyword rules are
/// tried in insertion order, so operator-specific keywords must be added
/// before generic ones.
#[derive(Debug, Clone, Default)]
pub struct LabelRules {
    exact: HashMap<ASN, Label>,
    keyword_rules: Vec<KeywordRule>,
}

lazy_static::lazy_static! {
    static ref DEFAULT_RULES: LabelRules = LabelRules::builtin();
}

impl LabelRules {
    pub fn new() -> Self {
        LabelRules::default()
    }

    pub fn with_exact(mut self, asn: ASN, label: &str) -> Self {
        self.exact.insert(asn, label.to_string());
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str], label: &str) -> Self {
        self.keyword_rules.push(KeywordRule::new(keywords, label));
        self
    }

    /// Shared instance of the built-in operator tables
    pub fn default_rules() -> &'static LabelRules {
        &DEFAULT_RULES
    }

    fn builtin() -> Self {
        LabelRules::new()
            .with_exact(CommonASNs::CHINA_MOBILE, "CM")
            .with_exact(CommonASNs::CMI, "CMI")
            .with_exact(CommonASNs::TELIA, "Telia")
            .with_exact(CommonASNs::LUMEN, "Lumen")
            .with_exact(CommonASNs::COGENT, "Cogent")
            .with_exact(CommonASNs::HURRICANE_ELECTRIC, "HE")
            .with_exact(CommonASNs::TATA, "TATA Communications")
            // Access networks
            .with_keywords(&["CHINA MOBILE", "CMNET"], "CM")
            .with_keywords(&["CHINA UNICOM", "UNICOM"], "China Unicom")
            .with_keywords(&["CHINA TELECOM"], "China Telecom")
            .with_keywords(&["CMIN2"], "CMIN2")
            // Upstreams
            .with_keywords(&["TELIA"], "Telia")
            .with_keywords(&["LUMEN", "LEVEL 3", "CENTURYLINK"], "Lumen")
            .with_keywords(&["COGENT"], "Cogent")
            .with_keywords(&["HURRICANE", "HE.NET"], "HE")
            .with_keywords(&["TATA"], "TATA Communications")
    }

    /// Resolve the canonical label for `asn`. Total for every input.
    pub fn normalize(&self, asn: ASN, name: Option<&str>) -> Label {
        if let Some(label) = self.exact.get(&asn) {
            return label.clone();
        }

        let name = name.map(str::trim).unwrap_or("");
        let upper = name.to_uppercase();
        if let Some(rule) = self.keyword_rules.iter().find(|r| r.matches(&upper)) {
            return rule.label.clone();
        }

        if name.is_empty() {
            format!("AS{}", asn)
        } else {
            name.chars().take(MAX_NAME_LABEL_CHARS).collect()
        }
    }
}

/// Normalize with the built-in tables
pub fn normalize(asn: ASN, name: Option<&str>) -> Label {
    LabelRules::default_rules().normalize(asn, name)
}
