//! `(* ... *)` attribute annotations.

use std::collections::BTreeSet;
use vgen_config::AttrTranslate;
use vgen_ir::Attribute;

/// Renders `attrs` as one annotation line, or `""` when nothing survives
/// translation.
///
/// Bare keys come first and go through `translate`; platform pairs follow
/// verbatim.
pub fn render_attributes(attrs: &BTreeSet<Attribute>, translate: &AttrTranslate) -> String {
    let items: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match attr {
            Attribute::Key(key) => translate.resolve(key),
            Attribute::Pair { name, value } => Some((name.clone(), value.clone())),
        })
        .map(|(name, value)| format!("{name} = {value}"))
        .collect();
    if items.is_empty() {
        String::new()
    } else {
        format!("(* {} *)\n", items.join(", "))
    }
}
