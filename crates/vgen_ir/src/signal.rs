//! Signal definitions.
//!
//! A [`Signal`] is a named, fixed-width value. Whether it is emitted as a
//! `wire` or a `reg`, and under which identifier, is decided by the emitter;
//! none of that is stored here.

use crate::attribute::Attribute;
use crate::expr::{Const, Shape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A signal in a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Width in bits. Always at least 1.
    pub width: u32,
    /// Whether arithmetic on this signal is two's complement.
    #[serde(default)]
    pub signed: bool,
    /// Reset value, used for declaration initializers and comb defaults.
    #[serde(default)]
    pub reset: i128,
    /// Explicit identifier requested by the designer.
    #[serde(default)]
    pub name_override: Option<String>,
    /// Hierarchical source path (outermost first) used to derive a default name.
    #[serde(default)]
    pub backtrace: Vec<String>,
    /// Attribute annotations.
    #[serde(default)]
    pub attrs: BTreeSet<Attribute>,
    /// Variables update immediately (`=`) inside clocked blocks.
    #[serde(default)]
    pub variable: bool,
}

impl Signal {
    /// Creates an unsigned signal of the given width with reset value zero.
    pub fn new(width: u32) -> Self {
        Self {
            width: width.max(1),
            signed: false,
            reset: 0,
            name_override: None,
            backtrace: Vec::new(),
            attrs: BTreeSet::new(),
            variable: false,
        }
    }

    /// Creates an unnamed signal with the given shape.
    pub fn with_shape(shape: Shape) -> Self {
        Self {
            signed: shape.signed,
            ..Self::new(shape.width)
        }
    }

    /// Creates a signal with the same shape and reset value as `other`.
    pub fn like(other: &Signal) -> Self {
        Self {
            signed: other.signed,
            reset: other.reset,
            ..Self::new(other.width)
        }
    }

    /// Sets the explicit identifier.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    /// Sets the hierarchical source path.
    pub fn at(mut self, path: &[&str]) -> Self {
        self.backtrace = path.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Sets the reset value.
    pub fn reset(mut self, value: i128) -> Self {
        self.reset = value;
        self
    }

    /// Marks the signal signed.
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Marks the signal as a variable.
    pub fn variable(mut self) -> Self {
        self.variable = true;
        self
    }

    /// Adds an attribute.
    pub fn attr(mut self, attr: Attribute) -> Self {
        self.attrs.insert(attr);
        self
    }

    /// Width and signedness.
    pub fn shape(&self) -> Shape {
        Shape {
            width: self.width,
            signed: self.signed,
        }
    }

    /// The reset value as a constant of this signal's shape.
    pub fn reset_const(&self) -> Const {
        Const {
            value: self.reset,
            width: self.width,
            signed: self.signed,
        }
    }
}
