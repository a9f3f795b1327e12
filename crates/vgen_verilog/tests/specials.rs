//! Special primitives through the full conversion: built-in emitters,
//! built-in lowerers, overrides and platforms.

use chrono::NaiveDate;
use std::fs;
use vgen_config::AttrTranslate;
use vgen_ir::{
    CustomSpecial, DdrOutput, Expr, Fragment, Instance, InstanceParam, InstancePort, IoDirection,
    Memory, MemoryPort, MultiReg, ParamValue, PortMode, Signal, SignalId, Special, SpecialId,
    SpecialKind, Statement, Tristate,
};
use vgen_lower::{GenericPlatform, LowerCx, LowerError, Lowered, SpecialLowerer};
use vgen_verilog::{
    ConvOutput, ConvertError, ConvertOptions, Converter, EmitCx, NetKind, PortDirection,
    SpecialEmitter, SpecialOverrides,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn options() -> ConvertOptions {
    ConvertOptions {
        timestamp: NaiveDate::from_ymd_opt(2024, 6, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        ..ConvertOptions::default()
    }
}

fn section<'a>(text: &'a str, title: &str) -> &'a str {
    let rule = format!("//{}", "-".repeat(78));
    let head = format!("\n{rule}\n// {title}\n{rule}\n\n");
    let start = text.find(&head).expect("section present") + head.len();
    let rest = &text[start..];
    let end = rest
        .find(&format!("\n{rule}\n// "))
        .or_else(|| rest.find("endmodule\n"))
        .expect("section end");
    &rest[..end]
}

fn sig(id: SignalId) -> Expr {
    Expr::signal(id)
}

struct Ram {
    f: Fragment,
    ios: Vec<SignalId>,
}

fn ram(init: Vec<i128>) -> Ram {
    let mut f = Fragment::new();
    let clk = f.add_signal(Signal::new(1).named("clk"));
    let adr = f.add_signal(Signal::new(4).named("adr"));
    let dat_r = f.add_signal(Signal::new(8).named("dat_r"));
    let we = f.add_signal(Signal::new(1).named("we"));
    let dat_w = f.add_signal(Signal::new(8).named("dat_w"));
    f.add_clock_domain("sys", clk);
    f.add_special(SpecialKind::Memory(Memory {
        width: 8,
        depth: 16,
        init,
        ports: vec![MemoryPort {
            adr: sig(adr),
            dat_r: sig(dat_r),
            we: Some(sig(we)),
            dat_w: Some(sig(dat_w)),
            re: None,
            we_granularity: 0,
            async_read: false,
            mode: PortMode::WriteFirst,
            domain: "sys".into(),
        }],
    }));
    Ram {
        f,
        ios: vec![clk, adr, dat_r, we, dat_w],
    }
}

// ---------------------------------------------------------------------------
// Built-in emitters
// ---------------------------------------------------------------------------

#[test]
fn memory_with_init_file() {
    let r = ram(vec![1, 2, 3]);
    let out = Converter::new(options()).ios(r.ios).convert(r.f).unwrap();
    assert_eq!(
        section(&out.main_source, "Specialized Logic"),
        "reg [7:0] mem[0:15];\nreg [3:0] mem_adr0;\n\n\
         always @(posedge clk) begin\n    if (we) mem[adr] <= dat_w;\n    mem_adr0 <= adr;\nend\n\n\
         assign dat_r = mem[mem_adr0];\n\n\
         initial begin\n    $readmemh(\"top_mem.init\", mem);\nend\n\n"
    );
    let dat_r = out.ports.iter().find(|p| p.name == "dat_r").unwrap();
    assert_eq!((dat_r.direction, dat_r.kind), (PortDirection::Output, NetKind::Wire));

    let mut expected = String::from("01\n02\n03\n");
    expected.push_str(&"00\n".repeat(13));
    assert_eq!(out.data_files["top_mem.init"], expected);
}

#[test]
fn written_output_includes_data_files() {
    let r = ram(vec![0xaa]);
    let out = Converter::new(options()).ios(r.ios).convert(r.f).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let written = out.write(dir.path()).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(fs::read_to_string(dir.path().join("top.v")).unwrap(), out.main_source);
    assert!(fs::read_to_string(dir.path().join("top_mem.init"))
        .unwrap()
        .starts_with("aa\n00\n"));
}

#[test]
fn instance_outputs_are_wires() {
    let mut f = Fragment::new();
    let clk = f.add_signal(Signal::new(1).named("clk"));
    let locked = f.add_signal(Signal::new(1).named("locked"));
    let pll = Instance {
        of: "PLL".into(),
        params: vec![InstanceParam {
            name: "MULT".into(),
            value: ParamValue::Str("X4".into()),
        }],
        ports: vec![
            InstancePort {
                name: "CLKI".into(),
                direction: IoDirection::In,
                expr: sig(clk),
            },
            InstancePort {
                name: "LOCK".into(),
                direction: IoDirection::Out,
                expr: sig(locked),
            },
        ],
    };
    let pll = Special::new(SpecialId::from_raw(0), SpecialKind::Instance(pll)).named("pll0");
    f.push_special(pll);
    let out = Converter::new(options()).ios([clk, locked]).convert(f).unwrap();
    let v = &out.main_source;
    assert!(section(v, "Module").contains("    output wire locked\n"));
    assert_eq!(
        section(v, "Specialized Logic"),
        "PLL #(\n    .MULT(\"X4\")\n) pll0 (\n    .CLKI(clk),\n    .LOCK(locked)\n);\n\n"
    );
}

#[test]
fn tristate_pad_is_inout() {
    let mut f = Fragment::new();
    let pad = f.add_signal(Signal::new(1).named("pad"));
    let o = f.add_signal(Signal::new(1).named("o"));
    let oe = f.add_signal(Signal::new(1).named("oe"));
    let i = f.add_signal(Signal::new(1).named("i"));
    f.add_special(SpecialKind::Tristate(Tristate {
        target: sig(pad),
        o: sig(o),
        oe: sig(oe),
        i: Some(sig(i)),
    }));
    let out = Converter::new(options()).ios([pad, o, oe, i]).convert(f).unwrap();
    let v = &out.main_source;
    assert_eq!(
        section(v, "Module"),
        "module top (\n    output wire i,\n    input  wire o,\n    input  wire oe,\n    \
         inout  wire pad\n);\n\n"
    );
    assert_eq!(
        section(v, "Specialized Logic"),
        "assign pad = oe ? o : 1'bz;\nassign i = pad;\n\n"
    );
}

// ---------------------------------------------------------------------------
// Built-in lowerers
// ---------------------------------------------------------------------------

fn synchronizer() -> (Fragment, Vec<SignalId>) {
    let mut f = Fragment::new();
    let clk = f.add_signal(Signal::new(1).named("clk"));
    let i = f.add_signal(Signal::new(1).named("i"));
    let o = f.add_signal(Signal::new(1).named("o"));
    f.add_clock_domain("sys", clk);
    f.add_special(SpecialKind::MultiReg(MultiReg {
        i: sig(i),
        o: sig(o),
        odomain: "sys".into(),
        n: 2,
        reset: 0,
    }));
    (f, vec![clk, i, o])
}

#[test]
fn multireg_becomes_register_chain() {
    let (f, ios) = synchronizer();
    let out = Converter::new(options()).ios(ios).convert(f).unwrap();
    let v = &out.main_source;
    assert_eq!(
        section(v, "Signals"),
        "(* no_retiming = \"true\" *)\nreg  multireg_regs0 = 1'd0;\n\
         (* no_retiming = \"true\" *)\nreg  multireg_regs1 = 1'd0;\n"
    );
    assert_eq!(
        section(v, "Synchronous Logic"),
        "always @(posedge clk) begin\n    multireg_regs0 <= i;\n    \
         multireg_regs1 <= multireg_regs0;\nend\n\n"
    );
    assert_eq!(section(v, "Combinatorial Logic"), "assign o = multireg_regs1;\n\n");
    assert_eq!(section(v, "Specialized Logic"), "");
}

#[test]
fn dropped_attribute_keys_are_not_emitted() {
    let (f, ios) = synchronizer();
    let out = Converter::new(ConvertOptions {
        attr_translate: AttrTranslate::empty(),
        ..options()
    })
    .ios(ios)
    .convert(f)
    .unwrap();
    assert!(!out.main_source.contains("(*"));
}

fn ddr() -> (Fragment, Vec<SignalId>) {
    let mut f = Fragment::new();
    let clk = f.add_signal(Signal::new(1).named("clk"));
    let a = f.add_signal(Signal::new(1).named("a"));
    let b = f.add_signal(Signal::new(1).named("b"));
    let pin = f.add_signal(Signal::new(1).named("pin"));
    f.add_clock_domain("sys", clk);
    f.add_special(SpecialKind::DdrOutput(DdrOutput {
        i1: sig(a),
        i2: sig(b),
        o: sig(pin),
        domain: "sys".into(),
    }));
    (f, vec![clk, a, b, pin])
}

#[test]
fn ddr_output_needs_a_platform() {
    let (f, ios) = ddr();
    let err = Converter::new(options()).ios(ios).convert(f).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Lower(LowerError::MissingPlatform { .. })
    ));

    let (f, ios) = ddr();
    let platform = GenericPlatform::new("generic");
    let err = Converter::new(options())
        .ios(ios)
        .platform(&platform)
        .convert(f)
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Lower(LowerError::UnimplementedSpecial { .. })
    ));
}

/// Stands in for a vendor DDR primitive.
struct OddrLowerer;

impl SpecialLowerer for OddrLowerer {
    fn lower(&self, special: &Special, _cx: &mut LowerCx) -> Result<Option<Lowered>, LowerError> {
        let SpecialKind::DdrOutput(d) = &special.kind else {
            return Ok(None);
        };
        let port = |name: &str, direction, expr: &Expr| InstancePort {
            name: name.into(),
            direction,
            expr: expr.clone(),
        };
        let inst = Instance {
            of: "ODDR".into(),
            params: vec![],
            ports: vec![
                port("C", IoDirection::In, &Expr::clock(d.domain.clone())),
                port("D1", IoDirection::In, &d.i1),
                port("D2", IoDirection::In, &d.i2),
                port("Q", IoDirection::Out, &d.o),
            ],
        };
        Ok(Some(Lowered {
            specials: vec![Special::new(SpecialId::from_raw(0), SpecialKind::Instance(inst))],
            ..Lowered::default()
        }))
    }
}

#[test]
fn platform_lowerer_and_platform_ios() {
    let (f, ios) = ddr();
    let mut platform = GenericPlatform::new("xc7a35t").with_io(ios);
    platform.add_lowerer("ddr_output", Box::new(OddrLowerer));
    let out = Converter::new(options()).platform(&platform).convert(f).unwrap();
    let v = &out.main_source;
    assert!(v.contains("// Device     : xc7a35t\n"));
    assert_eq!(out.ports.len(), 4);
    assert_eq!(
        section(v, "Specialized Logic"),
        "ODDR ODDR (\n    .C(clk),\n    .D1(a),\n    .D2(b),\n    .Q(pin)\n);\n\n"
    );
    assert!(section(v, "Module").contains("    output wire pin"));
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Emits a memory as an external black box.
struct BlackBoxRam;

impl SpecialEmitter for BlackBoxRam {
    fn emit(&self, special: &Special, cx: &mut EmitCx<'_>) -> Result<String, ConvertError> {
        let SpecialKind::Memory(m) = &special.kind else {
            return Err(ConvertError::unsupported(special));
        };
        let name = cx.namespace().special(special.id)?;
        let port = &m.ports[0];
        Ok(format!(
            "bram_{}x{} {name} (.a({}), .q({}));\n",
            m.depth,
            m.width,
            cx.expr(&port.adr)?,
            cx.expr(&port.dat_r)?
        ))
    }
}

#[test]
fn override_emitter_replaces_builtin() {
    let r = ram(vec![]);
    let mut overrides = SpecialOverrides::new();
    overrides.add_emitter("memory", Box::new(BlackBoxRam));
    let out = Converter::new(options())
        .ios(r.ios)
        .overrides(&overrides)
        .convert(r.f)
        .unwrap();
    assert_eq!(
        section(&out.main_source, "Specialized Logic"),
        "bram_16x8 mem (.a(adr), .q(dat_r));\n"
    );
    assert!(out.data_files.is_empty());
}

/// Lowers a `clkdiv` custom special to a toggle register in the given domain.
struct ClkDiv(&'static str);

impl SpecialLowerer for ClkDiv {
    fn lower(&self, special: &Special, cx: &mut LowerCx) -> Result<Option<Lowered>, LowerError> {
        let SpecialKind::Custom(c) = &special.kind else {
            return Ok(None);
        };
        let o = c.ios[0].expr.clone();
        let t = Expr::signal(cx.new_signal(Signal::new(1).at(&["clkdiv", "toggle"])));
        let mut out = Lowered::default();
        out.sync.push((
            self.0.into(),
            Statement::assign(t.clone(), Expr::not(t.clone())),
        ));
        out.comb.push(Statement::assign(o, t));
        Ok(Some(out))
    }
}

#[test]
fn override_lowerer_wins_over_unimplemented() {
    let mut f = Fragment::new();
    let clk = f.add_signal(Signal::new(1).named("clk"));
    let o = f.add_signal(Signal::new(1).named("half"));
    f.add_clock_domain("sys", clk);
    f.add_special(SpecialKind::Custom(CustomSpecial {
        class: "clkdiv".into(),
        ios: vec![InstancePort {
            name: "o".into(),
            direction: IoDirection::Out,
            expr: sig(o),
        }],
        params: Default::default(),
    }));
    let mut overrides = SpecialOverrides::new();
    overrides.add_lowerer("clkdiv", Box::new(ClkDiv("sys")));
    let out: ConvOutput = Converter::new(options())
        .ios([clk, o])
        .overrides(&overrides)
        .convert(f.clone())
        .unwrap();
    let v = &out.main_source;
    assert_eq!(
        section(v, "Synchronous Logic"),
        "always @(posedge clk) begin\n    clkdiv_toggle <= (~clkdiv_toggle);\nend\n\n"
    );
    assert_eq!(section(v, "Combinatorial Logic"), "assign half = clkdiv_toggle;\n\n");

    let err = Converter::new(options()).ios([clk, o]).convert(f).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::UnimplementedSpecial { tag, .. } if tag == "clkdiv"
    ));
}

#[test]
fn lowerer_into_undeclared_domain_lists_available() {
    let mut f = Fragment::new();
    let clk = f.add_signal(Signal::new(1).named("clk"));
    let o = f.add_signal(Signal::new(1).named("half"));
    f.add_clock_domain("sys", clk);
    f.add_special(SpecialKind::Custom(CustomSpecial {
        class: "clkdiv".into(),
        ios: vec![InstancePort {
            name: "o".into(),
            direction: IoDirection::Out,
            expr: sig(o),
        }],
        params: Default::default(),
    }));
    let mut overrides = SpecialOverrides::new();
    overrides.add_lowerer("clkdiv", Box::new(ClkDiv("pix")));
    let err = Converter::new(options())
        .ios([clk, o])
        .overrides(&overrides)
        .convert(f)
        .unwrap_err();
    assert!(matches!(
        &err,
        ConvertError::Lower(LowerError::UnresolvedClockDomain { name, available })
            if name == "pix" && available == &["sys".to_string()]
    ));
    assert_eq!(err.to_string(), "unresolved clock domain 'pix', available: sys");
}
