//! Attribute translation table.

use crate::types::AttributeConfig;
use std::collections::{BTreeMap, BTreeSet};
use vgen_ir::AttrValue;

/// Maps attribute keys attached to signals and specials to the vendor
/// attributes that end up in `(* ... *)` annotations.
///
/// Lookup order: dropped keys, then the explicit table, then passthrough.
/// A key that falls through all three is not emitted.
#[derive(Debug, Clone, Default)]
pub struct AttrTranslate {
    table: BTreeMap<String, (String, AttrValue)>,
    dropped: BTreeSet<String>,
    passthrough: bool,
}

impl AttrTranslate {
    /// A table that emits every key as `key = "true"`.
    pub fn passthrough() -> Self {
        Self {
            passthrough: true,
            ..Self::default()
        }
    }

    /// A table that emits nothing until entries are added.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the table from the `[attributes]` section.
    pub fn from_config(config: &AttributeConfig) -> Self {
        let mut t = Self {
            passthrough: config.passthrough,
            ..Self::default()
        };
        for (key, rule) in &config.translate {
            t.insert(key, &rule.name, rule.value.clone());
        }
        for key in &config.drop {
            t.drop_key(key);
        }
        t
    }

    /// Maps `key` to `name = value`.
    pub fn insert(&mut self, key: &str, name: &str, value: AttrValue) {
        self.table
            .insert(key.to_string(), (name.to_string(), value));
    }

    /// Never emits `key`.
    pub fn drop_key(&mut self, key: &str) {
        self.dropped.insert(key.to_string());
    }

    /// Resolves `key`, or `None` if it must not be emitted.
    pub fn resolve(&self, key: &str) -> Option<(String, AttrValue)> {
        if self.dropped.contains(key) {
            return None;
        }
        if let Some(entry) = self.table.get(key) {
            return Some(entry.clone());
        }
        self.passthrough
            .then(|| (key.to_string(), AttrValue::Str("true".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttrRule;

    #[test]
    fn passthrough_emits_true() {
        let t = AttrTranslate::passthrough();
        assert_eq!(
            t.resolve("keep"),
            Some(("keep".to_string(), AttrValue::Str("true".into())))
        );
    }

    #[test]
    fn empty_table_drops_unknown_keys() {
        let mut t = AttrTranslate::empty();
        assert_eq!(t.resolve("keep"), None);
        t.insert("keep", "KEEP", AttrValue::Str("TRUE".into()));
        assert_eq!(
            t.resolve("keep"),
            Some(("KEEP".to_string(), AttrValue::Str("TRUE".into())))
        );
    }

    #[test]
    fn drop_wins_over_table_and_passthrough() {
        let mut config = AttributeConfig::default();
        config.translate.insert(
            "no_retiming".into(),
            AttrRule {
                name: "DONT_TOUCH".into(),
                value: AttrValue::Int(1),
            },
        );
        config.drop.push("no_retiming".into());
        let t = AttrTranslate::from_config(&config);
        assert_eq!(t.resolve("no_retiming"), None);
        assert!(t.resolve("keep").is_some());
    }
}
