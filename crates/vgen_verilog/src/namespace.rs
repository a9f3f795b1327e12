//! Identifier assignment for signals and specials.
//!
//! Every signal that appears in the output, every remaining special and every
//! helper register a special declares gets exactly one identifier. The
//! mapping is injective, avoids the reserved keyword set, and depends only on
//! the fragment, so repeated conversions name things identically.

use crate::error::ConvertError;
use std::collections::{BTreeMap, BTreeSet};
use vgen_ir::{Arena, ClockDomain, Signal, SignalId, Special, SpecialId};

/// What an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NameKey {
    /// A signal.
    Signal(SignalId),
    /// A special's own object (memory array, instance).
    Special(SpecialId),
    /// The n-th helper register of a special, see [`Special::aux_names`].
    SpecialAux(SpecialId, usize),
}

/// The identifier table of one conversion.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    names: BTreeMap<NameKey, String>,
    clock_domains: BTreeMap<String, ClockDomain>,
}

impl Namespace {
    /// Assigns identifiers to `used` signals and to `specials`.
    ///
    /// Candidates are processed in (base name, key) order; a base that is
    /// already taken, or reserved, gets the first free `_<n>` suffix.
    pub fn build(
        signals: &Arena<SignalId, Signal>,
        used: &BTreeSet<SignalId>,
        specials: &[Special],
        clock_domains: &BTreeMap<String, ClockDomain>,
        reserved: &BTreeSet<String>,
    ) -> Result<Self, ConvertError> {
        let mut candidates = Vec::with_capacity(used.len() + specials.len());
        for &id in used {
            let signal = signals.try_get(id).ok_or(ConvertError::UnnamedSignal(id))?;
            candidates.push((signal_base(signal), NameKey::Signal(id)));
        }
        for special in specials {
            let base = special_base(special);
            for (n, aux) in special.aux_names(&base).iter().enumerate() {
                candidates.push((sanitize(aux, "aux"), NameKey::SpecialAux(special.id, n)));
            }
            candidates.push((base, NameKey::Special(special.id)));
        }
        candidates.sort();

        let mut taken = reserved.clone();
        let mut names = BTreeMap::new();
        for (base, key) in candidates {
            let mut name = base.clone();
            let mut n = 0u32;
            while taken.contains(&name) {
                n += 1;
                name = format!("{base}_{n}");
            }
            taken.insert(name.clone());
            names.insert(key, name);
        }
        log::debug!("namespace: {} identifiers", names.len());

        Ok(Self {
            names,
            clock_domains: clock_domains.clone(),
        })
    }

    /// Identifier of a signal.
    pub fn signal(&self, id: SignalId) -> Result<&str, ConvertError> {
        self.get(NameKey::Signal(id))
            .ok_or(ConvertError::UnnamedSignal(id))
    }

    /// Identifier of a special.
    pub fn special(&self, id: SpecialId) -> Result<&str, ConvertError> {
        self.get(NameKey::Special(id))
            .ok_or(ConvertError::UnnamedSpecial(id))
    }

    /// Identifier of the n-th helper register of a special.
    pub fn special_aux(&self, id: SpecialId, n: usize) -> Result<&str, ConvertError> {
        self.get(NameKey::SpecialAux(id, n))
            .ok_or(ConvertError::UnnamedSpecial(id))
    }

    /// Raw lookup.
    pub fn get(&self, key: NameKey) -> Option<&str> {
        self.names.get(&key).map(String::as_str)
    }

    /// Descriptor of a clock domain.
    pub fn clock_domain(&self, name: &str) -> Option<&ClockDomain> {
        self.clock_domains.get(name)
    }

    /// Identifier of a domain's clock signal.
    pub fn clock(&self, domain: &str) -> Result<&str, ConvertError> {
        let cd = self
            .clock_domain(domain)
            .ok_or_else(|| ConvertError::UnknownClockDomain(domain.to_string()))?;
        self.signal(cd.clk)
    }

    /// All clock domains.
    pub fn clock_domains(&self) -> &BTreeMap<String, ClockDomain> {
        &self.clock_domains
    }

    /// All assignments, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (NameKey, &str)> {
        self.names.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Number of identifiers.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the namespace is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn signal_base(signal: &Signal) -> String {
    let raw = match &signal.name_override {
        Some(name) => name.clone(),
        None => signal.backtrace.join("_"),
    };
    sanitize(&raw, "sig")
}

fn special_base(special: &Special) -> String {
    let raw = match &special.name_override {
        Some(name) => name.clone(),
        None if !special.backtrace.is_empty() => special.backtrace.join("_"),
        None => special.default_name().to_string(),
    };
    sanitize(&raw, special.tag())
}

/// Maps `raw` onto `[A-Za-z0-9_]` and keeps it from starting with a digit.
fn sanitize(raw: &str, fallback: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        out = sanitize_fallback(fallback);
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn sanitize_fallback(fallback: &str) -> String {
    let out: String = fallback
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if out.is_empty() {
        "sig".to_string()
    } else {
        out
    }
}
