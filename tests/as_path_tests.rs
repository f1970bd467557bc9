use std::collections::HashMap;

use bgp_route_bot::as_path::{clean_as_path, dedup_labels, labeled_path, labeled_paths};
use bgp_route_bot::labels::{normalize, LabelRules};
use bgp_route_bot::shared::CommonASNs;

#[test]
fn test_clean_as_path() {
    let cleaned = clean_as_path(&[56040, 56040, 0, 1299, 1299, 1299]);
    assert_eq!(cleaned, vec![56040, 1299]);

    // Idempotent
    assert_eq!(clean_as_path(&cleaned), cleaned);
}

#[test]
fn test_clean_as_path_collapses_across_dropped_zero() {
    assert_eq!(clean_as_path(&[1299, 0, 1299, 58453]), vec![1299, 58453]);
    assert_eq!(clean_as_path(&[0, 0]), Vec::<u32>::new());
    assert_eq!(clean_as_path(&[]), Vec::<u32>::new());
    // Non-adjacent repeats are kept
    assert_eq!(clean_as_path(&[1, 2, 1]), vec![1, 2, 1]);
}

#[test]
fn test_dedup_labels() {
    assert_eq!(dedup_labels(&["CM", "CM", "Telia"]), vec!["CM", "Telia"]);
    assert_eq!(dedup_labels::<&str>(&[]), Vec::<String>::new());
    assert_eq!(dedup_labels(&["HE", "CMI", "HE"]), vec!["HE", "CMI", "HE"]);
}

#[test]
fn test_exact_asn_outranks_name() {
    assert_eq!(normalize(CommonASNs::CHINA_MOBILE, Some("Telia Company")), "CM");
    assert_eq!(normalize(CommonASNs::CHINA_MOBILE, None), "CM");
    assert_eq!(normalize(CommonASNs::CMI, Some("whatever")), "CMI");
    assert_eq!(normalize(CommonASNs::TATA, None), "TATA Communications");
}

#[test]
fn test_keyword_rules() {
    assert_eq!(normalize(9808, Some("China Mobile Communications Group")), "CM");
    assert_eq!(normalize(4837, Some("CHINA UNICOM China169 Backbone")), "China Unicom");
    assert_eq!(normalize(4134, Some("Chinanet / China Telecom")), "China Telecom");
    assert_eq!(normalize(3491, Some("PCCW Global, formerly level 3 peer")), "Lumen");
    assert_eq!(normalize(64512, Some("he.net customer")), "HE");
}

#[test]
fn test_keyword_priority_follows_rule_order() {
    // Access network keywords are checked before upstream ones
    assert_eq!(normalize(64512, Some("Telia China Unicom JV")), "China Unicom");
}

#[test]
fn test_fallback_labels() {
    assert_eq!(normalize(99999, Some("Some Random Telecom Co")), "Some Random Telecom Co");
    assert_eq!(normalize(99999, Some("   padded name  ")), "padded name");
    assert_eq!(normalize(99999, None), "AS99999");
    assert_eq!(normalize(99999, Some("   ")), "AS99999");
    assert_eq!(normalize(0, None), "AS0");

    let long = "X".repeat(80);
    assert_eq!(normalize(99999, Some(&long)), "X".repeat(60));

    // Truncation counts characters, not bytes
    let wide = "网".repeat(70);
    assert_eq!(normalize(99999, Some(&wide)).chars().count(), 60);
}

#[test]
fn test_substituted_rules() {
    let rules = LabelRules::new()
        .with_exact(64500, "Lab Core")
        .with_keywords(&["example"], "Example Net");

    assert_eq!(rules.normalize(64500, None), "Lab Core");
    assert_eq!(rules.normalize(64501, Some("An EXAMPLE network")), "Example Net");
    // Built-in tables are not consulted
    assert_eq!(rules.normalize(CommonASNs::CHINA_MOBILE, None), "AS56040");
}

#[test]
fn test_labeled_path_collapses_sibling_asns() {
    let names = HashMap::from([
        (9808, "China Mobile Guangdong".to_string()),
        (64496, "Arelion (Telia)".to_string()),
    ]);
    let rules = LabelRules::default_rules();

    let labels = labeled_path(&[64496, 1299, 1299, 0, 9808, 56040], &names, rules);
    assert_eq!(labels, vec!["Telia", "CM"]);

    let paths = vec![vec![0, 0], vec![174, 56040]];
    let labeled = labeled_paths(&paths, &names, rules);
    assert_eq!(labeled, vec![vec!["Cogent".to_string(), "CM".to_string()]]);
}
