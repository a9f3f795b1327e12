//! Error types for Verilog conversion.

use std::path::PathBuf;
use vgen_ir::{SignalId, SpecialId};
use vgen_lower::LowerError;

/// Errors that abort a conversion. No output is produced after one.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Clock domain verification or a lowering pass failed.
    #[error(transparent)]
    Lower(#[from] LowerError),

    /// A node that has no Verilog rendering reached an emitter.
    #[error("unsupported construct: {node}")]
    UnsupportedConstruct {
        /// Debug rendering of the offending node.
        node: String,
    },

    /// No lowerer absorbed the special and no emitter handles its tag.
    #[error("special {special} ('{tag}') has no Verilog emitter")]
    UnimplementedSpecial {
        /// The special.
        special: SpecialId,
        /// Its dispatch tag.
        tag: String,
    },

    /// Neither the explicit port list nor the platform supplied any port.
    #[error("no I/O signals given and no platform to take them from")]
    MissingIoSignals,

    /// An emitter asked for a signal the namespace does not know.
    #[error("signal {0} has no name in the namespace")]
    UnnamedSignal(SignalId),

    /// An emitter asked for a special the namespace does not know.
    #[error("special {0} has no name in the namespace")]
    UnnamedSpecial(SpecialId),

    /// A clocked block names a domain that does not exist.
    #[error("clock domain '{0}' is not declared")]
    UnknownClockDomain(String),

    /// Writing an output file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file or directory being written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Builds an [`ConvertError::UnsupportedConstruct`] from any debuggable node.
    pub fn unsupported(node: &impl std::fmt::Debug) -> Self {
        ConvertError::UnsupportedConstruct {
            node: format!("{node:?}"),
        }
    }
}
