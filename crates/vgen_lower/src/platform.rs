//! The target platform seen by lowering and emission.

use crate::specials::{LowererRegistry, SpecialLowerer};
use std::collections::{BTreeMap, BTreeSet};
use vgen_ir::{Fragment, SignalId};

/// A target device: its name, its default port list, and the specials it
/// knows how to lower.
pub trait Platform {
    /// Device name printed in the file banner.
    fn device(&self) -> &str;

    /// Signals forming the module ports when the caller gives none.
    fn io_signals(&self, fragment: &Fragment) -> BTreeSet<SignalId>;

    /// Platform lowerer for a special tag.
    fn lowerer(&self, tag: &str) -> Option<&dyn SpecialLowerer> {
        let _ = tag;
        None
    }
}

/// A platform assembled at run time, for configuration files and tests.
pub struct GenericPlatform {
    device: String,
    io: BTreeSet<SignalId>,
    lowerers: BTreeMap<String, Box<dyn SpecialLowerer>>,
}

impl GenericPlatform {
    /// A platform with no ports and no lowerers.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            io: BTreeSet::new(),
            lowerers: BTreeMap::new(),
        }
    }

    /// Sets the default port list.
    pub fn with_io(mut self, io: impl IntoIterator<Item = SignalId>) -> Self {
        self.io = io.into_iter().collect();
        self
    }

    /// Registers a lowerer for `tag`.
    pub fn add_lowerer(&mut self, tag: impl Into<String>, lowerer: Box<dyn SpecialLowerer>) {
        self.lowerers.insert(tag.into(), lowerer);
    }
}

impl Platform for GenericPlatform {
    fn device(&self) -> &str {
        &self.device
    }

    fn io_signals(&self, _fragment: &Fragment) -> BTreeSet<SignalId> {
        self.io.clone()
    }

    fn lowerer(&self, tag: &str) -> Option<&dyn SpecialLowerer> {
        self.lowerers.lowerer(tag)
    }
}
