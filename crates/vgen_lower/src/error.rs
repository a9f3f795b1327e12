//! Error types for the lowering passes.

use vgen_ir::{SignalId, SpecialId};

/// Errors that abort lowering. No partial fragment is usable after one.
#[derive(Debug, thiserror::Error)]
pub enum LowerError {
    /// A domain name is used but never declared.
    #[error("unresolved clock domain '{name}', available: {}", list_or_none(.available))]
    UnresolvedClockDomain {
        /// The missing domain.
        name: String,
        /// Declared domains, sorted.
        available: Vec<String>,
    },

    /// A signal ID does not exist in the fragment.
    #[error("signal {0} is referenced but not declared")]
    UnresolvedSignal(SignalId),

    /// A signal was declared with zero width.
    #[error("signal {0} has zero width")]
    ZeroWidthSignal(SignalId),

    /// A node the passes cannot lower.
    #[error("unsupported construct: {node}")]
    UnsupportedConstruct {
        /// Debug rendering of the offending node.
        node: String,
    },

    /// A platform is present but has no lowering for the special.
    #[error("special {special} ('{tag}') is not implemented by the platform")]
    UnimplementedSpecial {
        /// The special.
        special: SpecialId,
        /// Its dispatch tag.
        tag: String,
    },

    /// The special can only be lowered by a platform and none was given.
    #[error("special {special} ('{tag}') requires a platform")]
    MissingPlatform {
        /// The special.
        special: SpecialId,
        /// Its dispatch tag.
        tag: String,
    },
}

impl LowerError {
    /// Builds an [`LowerError::UnsupportedConstruct`] from any debuggable node.
    pub fn unsupported(node: &impl std::fmt::Debug) -> Self {
        LowerError::UnsupportedConstruct {
            node: format!("{node:?}"),
        }
    }
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
