//! The fragment: one flat circuit ready for lowering and emission.

use crate::arena::Arena;
use crate::ids::{SignalId, SpecialId};
use crate::signal::Signal;
use crate::special::{Special, SpecialKind};
use crate::stmt::Statement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named clock domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockDomain {
    /// Domain name.
    pub name: String,
    /// Clock signal; its rising edge triggers the domain's statements.
    pub clk: SignalId,
}

/// A flat circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Every signal, indexed by [`SignalId`].
    #[serde(default)]
    pub signals: Arena<SignalId, Signal>,
    /// Combinational statements.
    #[serde(default)]
    pub comb: Vec<Statement>,
    /// Clocked statements per domain name.
    #[serde(default)]
    pub sync: BTreeMap<String, Vec<Statement>>,
    /// Special primitives in declaration order.
    #[serde(default)]
    pub specials: Vec<Special>,
    /// Known clock domains by name.
    #[serde(default)]
    pub clock_domains: BTreeMap<String, ClockDomain>,
}

/// Anything that can be turned into a [`Fragment`], such as a user module.
pub trait IntoFragment {
    /// Materializes the fragment.
    fn into_fragment(self) -> Fragment;
}

impl IntoFragment for Fragment {
    fn into_fragment(self) -> Fragment {
        self
    }
}

impl Fragment {
    /// Creates an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signal and returns its ID.
    pub fn add_signal(&mut self, signal: Signal) -> SignalId {
        self.signals.alloc(signal)
    }

    /// Appends a combinational statement.
    pub fn add_comb(&mut self, stmt: Statement) {
        self.comb.push(stmt);
    }

    /// Appends a clocked statement to `domain`.
    pub fn add_sync(&mut self, domain: &str, stmt: Statement) {
        self.sync.entry(domain.to_string()).or_default().push(stmt);
    }

    /// Declares a clock domain driven by `clk`.
    pub fn add_clock_domain(&mut self, name: &str, clk: SignalId) {
        self.clock_domains.insert(
            name.to_string(),
            ClockDomain {
                name: name.to_string(),
                clk,
            },
        );
    }

    /// Returns an ID larger than any special currently in the fragment.
    pub fn alloc_special_id(&self) -> SpecialId {
        let next = self
            .specials
            .iter()
            .map(|s| s.id.as_raw() + 1)
            .max()
            .unwrap_or(0);
        SpecialId::from_raw(next)
    }

    /// Adds a special with a freshly allocated ID and returns the ID.
    pub fn add_special(&mut self, kind: SpecialKind) -> SpecialId {
        let id = self.alloc_special_id();
        self.specials.push(Special::new(id, kind));
        id
    }

    /// Adds an already built special, renumbering it after the existing ones.
    pub fn push_special(&mut self, mut special: Special) -> SpecialId {
        special.id = self.alloc_special_id();
        let id = special.id;
        self.specials.push(special);
        id
    }

    /// Returns the special with the given ID.
    pub fn special(&self, id: SpecialId) -> Option<&Special> {
        self.specials.iter().find(|s| s.id == id)
    }

    /// Checks that every signal ID referenced by statements, specials and
    /// clock domains exists. Returns the first dangling ID.
    pub fn check_signal_refs(&self) -> Result<(), SignalId> {
        let mut refs = Vec::new();
        let stmts = self.comb.iter().chain(self.sync.values().flatten());
        for stmt in stmts {
            stmt.for_each_expr(&mut |e| e.collect_signals(&mut refs));
        }
        for special in &self.specials {
            for io in special.ios() {
                io.expr.collect_signals(&mut refs);
            }
        }
        refs.extend(self.clock_domains.values().map(|cd| cd.clk));
        match refs.into_iter().find(|id| !self.signals.contains(*id)) {
            Some(id) => Err(id),
            None => Ok(()),
        }
    }

    /// Returns the first signal declared with zero width. [`Signal::new`]
    /// never builds one, deserialized fragments can.
    pub fn check_signal_widths(&self) -> Result<(), SignalId> {
        match self.signals.iter().find(|(_, s)| s.width == 0) {
            Some((id, _)) => Err(id),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::special::Tristate;

    #[test]
    fn special_ids_grow_past_existing() {
        let mut f = Fragment::new();
        let a = f.add_signal(Signal::new(1));
        let t = || {
            SpecialKind::Tristate(Tristate {
                target: Expr::signal(a),
                o: Expr::signal(a),
                oe: Expr::signal(a),
                i: None,
            })
        };
        let first = f.add_special(t());
        let second = f.add_special(t());
        assert_eq!(first.as_raw(), 0);
        assert_eq!(second.as_raw(), 1);
        f.specials.remove(0);
        assert_eq!(f.alloc_special_id().as_raw(), 2);
    }

    #[test]
    fn dangling_reference_is_reported() {
        let mut f = Fragment::new();
        let a = f.add_signal(Signal::new(1));
        f.add_comb(Statement::assign(
            Expr::signal(a),
            Expr::signal(SignalId::from_raw(7)),
        ));
        assert_eq!(f.check_signal_refs(), Err(SignalId::from_raw(7)));
    }

    #[test]
    fn dangling_clock_is_reported() {
        let mut f = Fragment::new();
        f.add_clock_domain("sys", SignalId::from_raw(0));
        assert!(f.check_signal_refs().is_err());
        f.add_signal(Signal::new(1));
        assert!(f.check_signal_refs().is_ok());
    }

    #[test]
    fn json_fragment() {
        let f: Fragment = serde_json::from_str(
            r#"{
                "signals": [{"width": 1, "name_override": "clk"}, {"width": 4}],
                "sync": {"sys": [{"assign": {"target": {"signal": 1}, "value": {"const": {"value": 3, "width": 4}}}}]},
                "clock_domains": {"sys": {"name": "sys", "clk": 0}}
            }"#,
        )
        .unwrap();
        assert_eq!(f.signals.len(), 2);
        assert_eq!(f.sync["sys"].len(), 1);
        assert!(f.check_signal_refs().is_ok());
    }

    #[test]
    fn zero_width_from_json_is_reported() {
        let f: Fragment =
            serde_json::from_str(r#"{"signals": [{"width": 1}, {"width": 0}]}"#).unwrap();
        assert_eq!(f.check_signal_widths(), Err(SignalId::from_raw(1)));
    }
}
