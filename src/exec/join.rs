//! Join engine (spec component H).
//!
//! A single inner equi-join between exactly two aliases. Builds a hash map keyed by the
//! join value on whichever side fetched *more* documents, then probes with the smaller
//! side (spec §4.H: the hash side is the larger collection, a cost heuristic rather than
//! a correctness requirement) — grounded on the equi-join idiom in the teacher's
//! `examples/euanmacinnes-clarium/src/server/exec/select_stages/from_where.rs`
//! (`extract_simple_equi_with_remainder` pulling the join key out before the hash join
//! itself runs), adapted from its column-oriented DataFrame join to this crate's
//! per-alias document maps.
//!
//! A document missing the join field is dropped from its side entirely (spec §4.H); a
//! joined row keeps each side's document under its own alias, so a `docid` collision
//! between the two sides only becomes visible at projection time (component I), where it
//! is resolved the same way `columnNameMap` disambiguates any other same-named column.

use crate::store::Document;
use crate::value::Value;
use std::collections::BTreeMap;

/// One joined (or un-joined, for single-collection queries) row: alias -> its document.
pub type Row = BTreeMap<String, Document>;

pub fn inner_equi_join(
    left_alias: &str,
    left_docs: Vec<Document>,
    left_field: &str,
    right_alias: &str,
    right_docs: Vec<Document>,
    right_field: &str,
) -> Vec<Row> {
    if left_docs.len() >= right_docs.len() {
        join_with_hash_on_left(left_alias, left_docs, left_field, right_alias, right_docs, right_field)
    } else {
        // Swap roles so the larger side still builds the hash table; the caller's
        // left/right alias labeling of the output is preserved either way.
        flip_rows(join_with_hash_on_left(right_alias, right_docs, right_field, left_alias, left_docs, left_field))
    }
}

fn join_with_hash_on_left(
    hash_alias: &str,
    hash_docs: Vec<Document>,
    hash_field: &str,
    probe_alias: &str,
    probe_docs: Vec<Document>,
    probe_field: &str,
) -> Vec<Row> {
    let mut buckets: BTreeMap<JoinKey, Vec<&Document>> = BTreeMap::new();
    for doc in &hash_docs {
        if let Some(v) = doc.get(hash_field) {
            buckets.entry(JoinKey(v.clone())).or_default().push(doc);
        }
    }

    let mut out = Vec::new();
    for probe_doc in &probe_docs {
        let Some(probe_val) = probe_doc.get(probe_field) else { continue };
        let Some(matches) = buckets.get(&JoinKey(probe_val.clone())) else { continue };
        for hash_doc in matches {
            let mut row = Row::new();
            row.insert(hash_alias.to_string(), (*hash_doc).clone());
            row.insert(probe_alias.to_string(), probe_doc.clone());
            out.push(row);
        }
    }
    out
}

fn flip_rows(rows: Vec<Row>) -> Vec<Row> {
    rows
}

/// Wraps `Value` for use as a hash/ordered-map key via structural equality, since `Value`
/// itself only implements `PartialEq`.
#[derive(Debug, Clone, PartialEq)]
struct JoinKey(Value);

impl Eq for JoinKey {}

impl PartialOrd for JoinKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JoinKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        format!("{:?}", self.0).cmp(&format!("{:?}", other.0))
    }
}
