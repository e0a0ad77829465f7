//! Result normalization.
//!
//! Reshapes the transport's raw search entries into flat records:
//! single-valued attributes become scalars, multi-valued attributes stay
//! ordered lists, and entries missing any required field are dropped. Pure,
//! no I/O; a malformed attribute contributes nothing rather than failing.

use std::collections::HashMap;

use ldap3::SearchEntry;
use serde::Serialize;

/// A normalized attribute value.
///
/// Serializes untagged: a single value as a scalar, multiple values as a
/// list, mirroring the shape of the cleaned record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// The directory reported exactly one value.
    Single(String),
    /// The directory reported more than one value; order is preserved.
    Many(Vec<String>),
}

impl AttrValue {
    /// Returns the value when single-valued.
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Many(_) => None,
        }
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    /// Returns true when there are no values.
    ///
    /// Always false for values produced by [`normalize`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A normalized directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanEntry {
    /// Distinguished Name of the entry.
    pub dn: String,

    /// Normalized attributes.
    pub attrs: HashMap<String, AttrValue>,
}

impl CleanEntry {
    /// Gets an attribute by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Checks for an attribute by case-insensitive name.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.keys().any(|k| k.eq_ignore_ascii_case(name))
    }
}

/// Normalizes raw search entries into [`CleanEntry`] records.
///
/// An entry is kept only if every name in `required_fields` is present among
/// its attribute keys, compared case-insensitively; an empty `required_fields`
/// keeps every entry. Input order is preserved. Binary attributes are not
/// projected.
#[must_use]
pub fn normalize(entries: Vec<SearchEntry>, required_fields: &[String]) -> Vec<CleanEntry> {
    entries
        .into_iter()
        .filter_map(|entry| clean_entry(entry, required_fields))
        .collect()
}

fn clean_entry(entry: SearchEntry, required_fields: &[String]) -> Option<CleanEntry> {
    let complete = required_fields.iter().all(|field| {
        entry
            .attrs
            .keys()
            .any(|key| key.eq_ignore_ascii_case(field))
    });
    if !complete {
        return None;
    }

    let mut attrs = HashMap::with_capacity(entry.attrs.len());
    for (name, mut values) in entry.attrs {
        match values.len() {
            0 => continue,
            1 => {
                attrs.insert(name, AttrValue::Single(values.remove(0)));
            }
            _ => {
                attrs.insert(name, AttrValue::Many(values));
            }
        }
    }

    Some(CleanEntry {
        dn: entry.dn,
        attrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dn: &str, attrs: &[(&str, &[&str])]) -> SearchEntry {
        SearchEntry {
            dn: dn.to_string(),
            attrs: attrs
                .iter()
                .map(|(name, values)| {
                    (
                        (*name).to_string(),
                        values.iter().map(|v| (*v).to_string()).collect(),
                    )
                })
                .collect(),
            bin_attrs: HashMap::new(),
        }
    }

    fn required(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| (*f).to_string()).collect()
    }

    #[test]
    fn single_valued_attributes_flatten_to_scalars() {
        let raw = vec![entry(
            "uid=einstein,dc=example,dc=com",
            &[("mail", &["einstein@ldap.forumsys.com"]), ("sn", &["Einstein"])],
        )];

        let cleaned = normalize(raw, &[]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(
            cleaned[0].get("mail").unwrap().as_single(),
            Some("einstein@ldap.forumsys.com")
        );
        assert_eq!(cleaned[0].get("sn").unwrap().as_single(), Some("Einstein"));
    }

    #[test]
    fn multi_valued_attributes_keep_order() {
        let raw = vec![entry(
            "uid=training,dc=example,dc=com",
            &[("objectClass", &["inetOrgPerson", "organizationalPerson", "person"])],
        )];

        let cleaned = normalize(raw, &[]);
        assert_eq!(
            cleaned[0].get("objectClass"),
            Some(&AttrValue::Many(vec![
                "inetOrgPerson".to_string(),
                "organizationalPerson".to_string(),
                "person".to_string(),
            ]))
        );
    }

    #[test]
    fn entries_missing_a_required_field_are_dropped() {
        let raw = vec![
            entry(
                "uid=complete,dc=example,dc=com",
                &[("mail", &["a@b.c"]), ("sn", &["A"]), ("cn", &["A B"])],
            ),
            entry(
                "uid=partial,dc=example,dc=com",
                &[("sn", &["B"]), ("cn", &["B C"])],
            ),
        ];

        let cleaned = normalize(raw, &required(&["mail", "sn", "cn"]));
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].dn, "uid=complete,dc=example,dc=com");
    }

    #[test]
    fn required_field_match_is_case_insensitive() {
        let raw = vec![entry(
            "uid=case,dc=example,dc=com",
            &[("Mail", &["a@b.c"]), ("SN", &["A"])],
        )];

        let cleaned = normalize(raw, &required(&["mail", "sn"]));
        assert_eq!(cleaned.len(), 1);
        assert!(cleaned[0].has_attr("mAiL"));
    }

    #[test]
    fn empty_required_fields_keep_every_entry() {
        let raw = vec![
            entry("uid=a,dc=example,dc=com", &[("uid", &["a"])]),
            entry("uid=b,dc=example,dc=com", &[("cn", &["b"])]),
        ];

        let cleaned = normalize(raw, &[]);
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn input_order_is_preserved() {
        let raw = vec![
            entry("uid=first,dc=example,dc=com", &[("uid", &["first"])]),
            entry("uid=second,dc=example,dc=com", &[("uid", &["second"])]),
            entry("uid=third,dc=example,dc=com", &[("uid", &["third"])]),
        ];

        let cleaned = normalize(raw, &[]);
        let dns: Vec<&str> = cleaned.iter().map(|e| e.dn.as_str()).collect();
        assert_eq!(
            dns,
            [
                "uid=first,dc=example,dc=com",
                "uid=second,dc=example,dc=com",
                "uid=third,dc=example,dc=com",
            ]
        );
    }

    #[test]
    fn zero_valued_attributes_are_dropped() {
        let raw = vec![entry(
            "uid=odd,dc=example,dc=com",
            &[("uid", &["odd"]), ("empty", &[])],
        )];

        let cleaned = normalize(raw, &[]);
        assert_eq!(cleaned[0].get("empty"), None);
        assert!(cleaned[0].get("uid").is_some());
    }

    #[test]
    fn serializes_scalars_and_lists_untagged() {
        let raw = vec![entry(
            "uid=shape,dc=example,dc=com",
            &[("mail", &["a@b.c"]), ("memberOf", &["g1", "g2"])],
        )];

        let cleaned = normalize(raw, &[]);
        let json = serde_json::to_value(&cleaned[0]).unwrap();
        assert_eq!(json["attrs"]["mail"], serde_json::json!("a@b.c"));
        assert_eq!(json["attrs"]["memberOf"], serde_json::json!(["g1", "g2"]));
    }
}
