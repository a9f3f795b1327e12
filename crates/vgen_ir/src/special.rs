//! Special primitives.
//!
//! Specials are opaque to the statement emitters. Each one carries a dispatch
//! tag and a list of I/O expressions with directions, which is all the
//! lowering passes look at. The Verilog emitter or a special lowerer gives it
//! meaning.

use crate::attribute::Attribute;
use crate::expr::{Const, Expr};
use crate::ids::SpecialId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Direction of a special I/O as seen from the special.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoDirection {
    /// Read by the special.
    In,
    /// Driven by the special.
    Out,
    /// Both.
    InOut,
}

/// A borrowed view of one special I/O.
#[derive(Debug, Clone, Copy)]
pub struct SpecialIo<'a> {
    /// Port or role name.
    pub name: &'a str,
    /// Direction.
    pub direction: IoDirection,
    /// Connected expression.
    pub expr: &'a Expr,
}

impl<'a> SpecialIo<'a> {
    fn new(name: &'a str, direction: IoDirection, expr: &'a Expr) -> Self {
        Self {
            name,
            direction,
            expr,
        }
    }
}

/// Read behavior of a synchronous memory port on a simultaneous write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortMode {
    /// The read returns the newly written data.
    #[default]
    WriteFirst,
    /// The read returns the old data.
    ReadFirst,
    /// The read output holds its value while writing.
    NoChange,
}

/// One port of a [`Memory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPort {
    /// Address.
    pub adr: Expr,
    /// Read data.
    pub dat_r: Expr,
    /// Write enable. Absent on read-only ports.
    #[serde(default)]
    pub we: Option<Expr>,
    /// Write data.
    #[serde(default)]
    pub dat_w: Option<Expr>,
    /// Read enable.
    #[serde(default)]
    pub re: Option<Expr>,
    /// Bits per write-enable line; 0 means one enable for the whole word.
    #[serde(default)]
    pub we_granularity: u32,
    /// Combinational read.
    #[serde(default)]
    pub async_read: bool,
    /// Read-during-write behavior.
    #[serde(default)]
    pub mode: PortMode,
    /// Clock domain of the port.
    pub domain: String,
}

/// An inferred RAM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Word width.
    pub width: u32,
    /// Number of words.
    pub depth: u32,
    /// Initial contents, zero-filled up to `depth`.
    #[serde(default)]
    pub init: Vec<i128>,
    /// Ports.
    #[serde(default)]
    pub ports: Vec<MemoryPort>,
}

impl Memory {
    /// Ports that read through a clocked buffer register.
    pub fn sync_read_ports(&self) -> impl Iterator<Item = (usize, &MemoryPort)> {
        self.ports.iter().enumerate().filter(|(_, p)| !p.async_read)
    }
}

/// A parameter value of an [`Instance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    /// A sized constant.
    Const(Const),
    /// A real number.
    Float(f64),
    /// A string, emitted quoted.
    Str(String),
    /// Text emitted verbatim.
    Preformatted(String),
}

/// A named parameter of an [`Instance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceParam {
    /// Parameter name.
    pub name: String,
    /// Value.
    pub value: ParamValue,
}

/// A named port connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancePort {
    /// Port name.
    pub name: String,
    /// Direction as seen from the instantiated module.
    pub direction: IoDirection,
    /// Connected expression.
    pub expr: Expr,
}

/// Instantiation of an external module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Module type name.
    pub of: String,
    /// Parameters, emitted in order.
    #[serde(default)]
    pub params: Vec<InstanceParam>,
    /// Port connections, emitted in order.
    #[serde(default)]
    pub ports: Vec<InstancePort>,
}

/// A tristate pad driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tristate {
    /// The pad.
    pub target: Expr,
    /// Driven value.
    pub o: Expr,
    /// Output enable.
    pub oe: Expr,
    /// Optional read-back of the pad.
    #[serde(default)]
    pub i: Option<Expr>,
}

/// A clock-domain-crossing synchronizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiReg {
    /// Input from the source domain.
    pub i: Expr,
    /// Synchronized output.
    pub o: Expr,
    /// Destination clock domain.
    pub odomain: String,
    /// Number of register stages.
    #[serde(default = "default_stages")]
    pub n: u32,
    /// Reset value of every stage.
    #[serde(default)]
    pub reset: i128,
}

fn default_stages() -> u32 {
    2
}

/// A double data rate output register. Needs a platform lowerer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdrOutput {
    /// Data on the rising edge.
    pub i1: Expr,
    /// Data on the falling edge.
    pub i2: Expr,
    /// Output pin.
    pub o: Expr,
    /// Clock domain.
    pub domain: String,
}

/// A special with a user-chosen class, handled by overrides or a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSpecial {
    /// Dispatch tag.
    pub class: String,
    /// I/O connections.
    #[serde(default)]
    pub ios: Vec<InstancePort>,
    /// Free-form parameters.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

/// The variant part of a [`Special`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    /// See [`Memory`].
    Memory(Memory),
    /// See [`Instance`].
    Instance(Instance),
    /// See [`Tristate`].
    Tristate(Tristate),
    /// See [`MultiReg`].
    MultiReg(MultiReg),
    /// See [`DdrOutput`].
    DdrOutput(DdrOutput),
    /// See [`CustomSpecial`].
    Custom(CustomSpecial),
}

/// A special primitive in a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Special {
    /// Declaration order identity.
    pub id: SpecialId,
    /// Explicit identifier for the emitted object (memory array, instance).
    #[serde(default)]
    pub name_override: Option<String>,
    /// Hierarchical source path used to derive a default name.
    #[serde(default)]
    pub backtrace: Vec<String>,
    /// Attribute annotations.
    #[serde(default)]
    pub attrs: BTreeSet<Attribute>,
    /// What the special is.
    pub kind: SpecialKind,
}

impl Special {
    /// Creates an unnamed special. The ID is normally replaced by
    /// [`Fragment::add_special`](crate::Fragment::add_special).
    pub fn new(id: SpecialId, kind: SpecialKind) -> Self {
        Self {
            id,
            name_override: None,
            backtrace: Vec::new(),
            attrs: BTreeSet::new(),
            kind,
        }
    }

    /// Sets the explicit identifier.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    /// Adds an attribute.
    pub fn attr(mut self, attr: Attribute) -> Self {
        self.attrs.insert(attr);
        self
    }

    /// Dispatch tag used to find a lowerer or emitter.
    pub fn tag(&self) -> &str {
        match &self.kind {
            SpecialKind::Memory(_) => "memory",
            SpecialKind::Instance(_) => "instance",
            SpecialKind::Tristate(_) => "tristate",
            SpecialKind::MultiReg(_) => "multireg",
            SpecialKind::DdrOutput(_) => "ddr_output",
            SpecialKind::Custom(c) => &c.class,
        }
    }

    /// Name used by the namespace when neither an override nor a backtrace is set.
    pub fn default_name(&self) -> &str {
        match &self.kind {
            SpecialKind::Memory(_) => "mem",
            SpecialKind::Instance(i) => &i.of,
            _ => self.tag(),
        }
    }

    /// Base names of the helper registers the emitter declares for this
    /// special, given the special's own base name.
    pub fn aux_names(&self, base: &str) -> Vec<String> {
        match &self.kind {
            SpecialKind::Memory(m) => m
                .sync_read_ports()
                .map(|(i, p)| match p.mode {
                    PortMode::WriteFirst => format!("{base}_adr{i}"),
                    PortMode::ReadFirst | PortMode::NoChange => format!("{base}_dat{i}"),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// I/O expressions in a stable order.
    pub fn ios(&self) -> Vec<SpecialIo<'_>> {
        let io = SpecialIo::new;
        match &self.kind {
            SpecialKind::Memory(m) => {
                let mut out = Vec::new();
                for p in &m.ports {
                    out.push(io("adr", IoDirection::In, &p.adr));
                    out.push(io("dat_r", IoDirection::Out, &p.dat_r));
                    for (name, e) in [("we", &p.we), ("dat_w", &p.dat_w), ("re", &p.re)] {
                        if let Some(e) = e {
                            out.push(io(name, IoDirection::In, e));
                        }
                    }
                }
                out
            }
            SpecialKind::Instance(inst) => inst
                .ports
                .iter()
                .map(|p| io(&p.name, p.direction, &p.expr))
                .collect(),
            SpecialKind::Tristate(t) => {
                let mut out = vec![
                    io("target", IoDirection::InOut, &t.target),
                    io("o", IoDirection::In, &t.o),
                    io("oe", IoDirection::In, &t.oe),
                ];
                if let Some(i) = &t.i {
                    out.push(io("i", IoDirection::Out, i));
                }
                out
            }
            SpecialKind::MultiReg(r) => vec![
                io("i", IoDirection::In, &r.i),
                io("o", IoDirection::Out, &r.o),
            ],
            SpecialKind::DdrOutput(d) => vec![
                io("i1", IoDirection::In, &d.i1),
                io("i2", IoDirection::In, &d.i2),
                io("o", IoDirection::Out, &d.o),
            ],
            SpecialKind::Custom(c) => c
                .ios
                .iter()
                .map(|p| io(&p.name, p.direction, &p.expr))
                .collect(),
        }
    }

    /// Mutable I/O expressions, in the same order as [`Special::ios`].
    pub fn ios_mut(&mut self) -> Vec<(IoDirection, &mut Expr)> {
        match &mut self.kind {
            SpecialKind::Memory(m) => {
                let mut out = Vec::new();
                for p in &mut m.ports {
                    out.push((IoDirection::In, &mut p.adr));
                    out.push((IoDirection::Out, &mut p.dat_r));
                    for e in [&mut p.we, &mut p.dat_w, &mut p.re].into_iter().flatten() {
                        out.push((IoDirection::In, e));
                    }
                }
                out
            }
            SpecialKind::Instance(inst) => inst
                .ports
                .iter_mut()
                .map(|p| (p.direction, &mut p.expr))
                .collect(),
            SpecialKind::Tristate(t) => {
                let mut out = vec![
                    (IoDirection::InOut, &mut t.target),
                    (IoDirection::In, &mut t.o),
                    (IoDirection::In, &mut t.oe),
                ];
                if let Some(i) = &mut t.i {
                    out.push((IoDirection::Out, i));
                }
                out
            }
            SpecialKind::MultiReg(r) => vec![(IoDirection::In, &mut r.i), (IoDirection::Out, &mut r.o)],
            SpecialKind::DdrOutput(d) => vec![
                (IoDirection::In, &mut d.i1),
                (IoDirection::In, &mut d.i2),
                (IoDirection::Out, &mut d.o),
            ],
            SpecialKind::Custom(c) => c
                .ios
                .iter_mut()
                .map(|p| (p.direction, &mut p.expr))
                .collect(),
        }
    }

    /// Clock domains the special is bound to by name.
    pub fn clock_domains(&self) -> Vec<&str> {
        match &self.kind {
            SpecialKind::Memory(m) => m.ports.iter().map(|p| p.domain.as_str()).collect(),
            SpecialKind::MultiReg(r) => vec![r.odomain.as_str()],
            SpecialKind::DdrOutput(d) => vec![d.domain.as_str()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SignalId;

    fn sig(i: u32) -> Expr {
        Expr::signal(SignalId::from_raw(i))
    }

    fn memory() -> Special {
        let port = |mode, async_read| MemoryPort {
            adr: sig(0),
            dat_r: sig(1),
            we: Some(sig(2)),
            dat_w: None,
            re: None,
            we_granularity: 0,
            async_read,
            mode,
            domain: "sys".into(),
        };
        Special::new(
            SpecialId::from_raw(0),
            SpecialKind::Memory(Memory {
                width: 8,
                depth: 16,
                init: vec![],
                ports: vec![
                    port(PortMode::WriteFirst, false),
                    port(PortMode::ReadFirst, true),
                    port(PortMode::NoChange, false),
                ],
            }),
        )
    }

    #[test]
    fn tags() {
        assert_eq!(memory().tag(), "memory");
        let custom = Special::new(
            SpecialId::from_raw(1),
            SpecialKind::Custom(CustomSpecial {
                class: "pll".into(),
                ios: vec![],
                params: BTreeMap::new(),
            }),
        );
        assert_eq!(custom.tag(), "pll");
        assert_eq!(custom.default_name(), "pll");
    }

    #[test]
    fn memory_aux_names_follow_sync_ports() {
        assert_eq!(memory().aux_names("ram"), vec!["ram_adr0", "ram_dat2"]);
    }

    #[test]
    fn ios_and_ios_mut_agree() {
        let mut m = memory();
        let dirs: Vec<IoDirection> = m.ios().iter().map(|io| io.direction).collect();
        let dirs_mut: Vec<IoDirection> = m.ios_mut().into_iter().map(|(d, _)| d).collect();
        assert_eq!(dirs, dirs_mut);
        assert_eq!(dirs.len(), 9);
    }

    #[test]
    fn tristate_readback_is_output() {
        let t = Special::new(
            SpecialId::from_raw(0),
            SpecialKind::Tristate(Tristate {
                target: sig(0),
                o: sig(1),
                oe: sig(2),
                i: Some(sig(3)),
            }),
        );
        let ios = t.ios();
        assert_eq!(ios[0].direction, IoDirection::InOut);
        assert_eq!(ios[3].name, "i");
        assert_eq!(ios[3].direction, IoDirection::Out);
    }

    #[test]
    fn multireg_json_defaults() {
        let r: MultiReg = serde_json::from_str(
            r#"{"i": {"signal": 0}, "o": {"signal": 1}, "odomain": "sys"}"#,
        )
        .unwrap();
        assert_eq!(r.n, 2);
        assert_eq!(r.reset, 0);
    }
}
