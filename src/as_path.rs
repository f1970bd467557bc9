use std::collections::HashMap;

use crate::labels::LabelRules;
use crate::shared::{Label, ASN};

/// Drop AS 0 and collapse prepending in a single left-to-right pass.
pub fn clean_as_path(as_path: &[ASN]) -> Vec<ASN> {
    let mut out: Vec<ASN> = Vec::with_capacity(as_path.len());
    for &asn in as_path {
        if asn == 0 {
            continue;
        }
        if out.last() == Some(&asn) {
            continue;
        }
        out.push(asn);
    }
    out
}

/// Collapse immediate repeats of a label.
///
/// Runs after normalization, where sibling ASNs of one operator end up
/// with the same label.
pub fn dedup_labels<S: AsRef<str>>(labels: &[S]) -> Vec<Label> {
    let mut out: Vec<Label> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.as_ref();
        if out.last().map(String::as_str) != Some(label) {
            out.push(label.to_string());
        }
    }
    out
}

/// Clean `as_path` and map every ASN through `rules`, collapsing labels that
/// repeat after normalization. Empty when nothing survives cleaning.
pub fn labeled_path(
    as_path: &[ASN],
    asn_names: &HashMap<ASN, String>,
    rules: &LabelRules,
) -> Vec<Label> {
    let labels: Vec<Label> = clean_as_path(as_path)
        .into_iter()
        .map(|asn| rules.normalize(asn, asn_names.get(&asn).map(String::as_str)))
        .collect();
    dedup_labels(&labels)
}

/// Label every path, discarding the ones that clean down to nothing.
pub fn labeled_paths<'a, I>(
    as_paths: I,
    asn_names: &HashMap<ASN, String>,
    rules: &LabelRules,
) -> Vec<Vec<Label>>
where
    I: IntoIterator<Item = &'a Vec<ASN>>,
{
    as_paths
        .into_iter()
        .map(|path| labeled_path(path, asn_names, rules))
        .filter(|labels| !labels.is_empty())
        .collect()
}
