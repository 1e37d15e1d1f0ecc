//! Object change records and the created-object scanner.
//!
//! The scanner is a pure lookup over a transaction's reported change list,
//! used to recover the ids of objects the transaction implicitly created.

use serde::{Deserialize, Serialize};

/// What happened to an object in one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Mutated,
    Deleted,
    /// A new package landed on the ledger; the record carries its id.
    Published,
    /// Change kinds this tool has no use for (wrapped, transferred, ...).
    #[serde(other)]
    Other,
}

/// One ledger-reported object change.
///
/// `published` records populate `package_id`; the object-level fields stay
/// empty. All other kinds carry `object_type` and `object_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub object_type: String,
    #[serde(default)]
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
}

impl ObjectChange {
    /// A `created` record, as the ledger would report it.
    pub fn created(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Created,
            object_type: object_type.into(),
            object_id: object_id.into(),
            package_id: None,
        }
    }

    /// A `published` record carrying the new package id.
    pub fn published(package_id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Published,
            object_type: String::new(),
            object_id: String::new(),
            package_id: Some(package_id.into()),
        }
    }
}

/// Find the first created object whose type tag equals `type_tag` exactly,
/// generic parameters included.
///
/// Scan order is the order the ledger returned the records in. When several
/// created objects share a type tag only the first is reported; that matches
/// the behavior the configure entry points were written against and is not a
/// recency guarantee.
pub fn find_created<'a>(changes: &'a [ObjectChange], type_tag: &str) -> Option<&'a str> {
    changes
        .iter()
        .find(|change| change.kind == ChangeKind::Created && change.object_type == type_tag)
        .map(|change| change.object_id.as_str())
}

/// Find the package id of the first `published` record, if any.
pub fn find_published(changes: &[ObjectChange]) -> Option<&str> {
    changes
        .iter()
        .find(|change| change.kind == ChangeKind::Published)
        .and_then(|change| change.package_id.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_changes() -> Vec<ObjectChange> {
        vec![
            ObjectChange::published("0x00abc"),
            ObjectChange::created("0xabc::spoke_token::AdminCap", "0x1"),
            ObjectChange::created("0xabc::spoke_token::WitnessCarrier", "0x2"),
            ObjectChange::created("0xabc::spoke_token::AdminCap", "0x3"),
            ObjectChange {
                kind: ChangeKind::Mutated,
                object_type: "0xabc::spoke_token::Storage".to_string(),
                object_id: "0x4".to_string(),
                package_id: None,
            },
        ]
    }

    #[test]
    fn finds_first_created_match_in_ledger_order() {
        let changes = sample_changes();
        assert_eq!(
            find_created(&changes, "0xabc::spoke_token::AdminCap"),
            Some("0x1")
        );
    }

    #[test]
    fn match_is_exact_including_generics() {
        let changes = vec![ObjectChange::created(
            "0x2::coin::TreasuryCap<0xabc::test_coin::TEST_COIN>",
            "0x9",
        )];
        assert_eq!(find_created(&changes, "0x2::coin::TreasuryCap"), None);
        assert_eq!(
            find_created(&changes, "0x2::coin::TreasuryCap<0xabc::test_coin::TEST_COIN>"),
            Some("0x9")
        );
    }

    #[test]
    fn mutated_records_never_match() {
        let changes = sample_changes();
        assert_eq!(find_created(&changes, "0xabc::spoke_token::Storage"), None);
    }

    #[test]
    fn absent_tag_yields_none() {
        let changes = sample_changes();
        assert_eq!(find_created(&changes, "0xabc::spoke_token::Config"), None);
        assert_eq!(find_created(&[], "0xabc::spoke_token::Config"), None);
    }

    #[test]
    fn published_lookup_reads_package_id() {
        let changes = sample_changes();
        assert_eq!(find_published(&changes), Some("0x00abc"));
        assert_eq!(find_published(&changes[1..]), None);
    }

    #[test]
    fn unknown_change_kinds_deserialize_as_other() {
        let raw = r#"{"type":"wrapped","objectType":"t","objectId":"0x5"}"#;
        let change: ObjectChange = serde_json::from_str(raw).unwrap();
        assert_eq!(change.kind, ChangeKind::Other);
    }
}
