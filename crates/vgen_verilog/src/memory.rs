//! Inferred RAM emission.

use crate::error::ConvertError;
use crate::node::TAB;
use crate::specials::{EmitCx, SpecialEmitter};
use vgen_ir::{bits_for, Expr, Memory, MemoryPort, PortMode, Special, SpecialKind};

/// Emits a `memory` special as a register array with one clocked block per
/// port and an optional `$readmemh` initializer.
pub struct MemoryEmitter;

impl SpecialEmitter for MemoryEmitter {
    fn emit(&self, special: &Special, cx: &mut EmitCx<'_>) -> Result<String, ConvertError> {
        let SpecialKind::Memory(memory) = &special.kind else {
            return Err(ConvertError::unsupported(special));
        };
        if memory.width == 0 || memory.depth == 0 {
            return Err(ConvertError::unsupported(special));
        }
        let ns = cx.namespace();
        let mem = ns.special(special.id)?;

        let mut r = format!(
            "reg [{}:0] {mem}[0:{}];\n",
            memory.width - 1,
            memory.depth - 1
        );
        // buffer registers, indexed like `Special::aux_names`
        let mut buffers = vec![None; memory.ports.len()];
        for (n, (i, port)) in memory.sync_read_ports().enumerate() {
            let name = ns.special_aux(special.id, n)?;
            let width = match port.mode {
                PortMode::WriteFirst => bits_for(i128::from(memory.depth) - 1, false),
                PortMode::ReadFirst | PortMode::NoChange => memory.width,
            };
            r.push_str(&format!("reg [{}:0] {name};\n", width.max(1) - 1));
            buffers[i] = Some(name);
        }
        r.push('\n');

        for (port, buffer) in memory.ports.iter().zip(&buffers) {
            if port.async_read && port.we.is_none() {
                continue;
            }
            let clk = ns.clock(&port.domain)?;
            r.push_str(&format!("always @(posedge {clk}) begin\n"));
            r.push_str(&render_write(memory, mem, port, cx)?);
            if let Some(buffer) = buffer {
                r.push_str(&render_read(mem, port, buffer, cx)?);
            }
            r.push_str("end\n\n");
        }

        for (port, buffer) in memory.ports.iter().zip(&buffers) {
            let dat_r = cx.expr(&port.dat_r)?;
            let source = match (buffer, port.mode) {
                (None, _) => format!("{mem}[{}]", cx.expr(&port.adr)?),
                (Some(adr), PortMode::WriteFirst) => format!("{mem}[{adr}]"),
                (Some(dat), _) => dat.to_string(),
            };
            r.push_str(&format!("assign {dat_r} = {source};\n"));
        }
        r.push('\n');

        if !memory.init.is_empty() {
            let base = format!("{}_{mem}.init", cx.module_name());
            let file = cx.add_data_file(&base, init_contents(memory));
            r.push_str(&format!(
                "initial begin\n{TAB}$readmemh(\"{file}\", {mem});\nend\n\n"
            ));
        }
        Ok(r)
    }
}

fn render_write(
    memory: &Memory,
    mem: &str,
    port: &MemoryPort,
    cx: &EmitCx<'_>,
) -> Result<String, ConvertError> {
    let Some(we) = &port.we else {
        return Ok(String::new());
    };
    let Some(dat_w) = &port.dat_w else {
        return Err(ConvertError::unsupported(port));
    };
    let adr = cx.expr(&port.adr)?;
    let granularity = port.we_granularity;
    if granularity == 0 || granularity >= memory.width {
        return Ok(format!(
            "{TAB}if ({}) {mem}[{adr}] <= {};\n",
            cx.expr(we)?,
            cx.expr(dat_w)?
        ));
    }

    // per-lane enables index into the enable and data signals directly
    let (Expr::Signal(_), Expr::Signal(_)) = (we, dat_w) else {
        return Err(ConvertError::unsupported(port));
    };
    let (we, dat_w) = (cx.expr(we)?, cx.expr(dat_w)?);
    let mut r = String::new();
    for lane in 0..memory.width / granularity {
        let lo = lane * granularity;
        let hi = lo + granularity - 1;
        r.push_str(&format!(
            "{TAB}if ({we}[{lane}]) {mem}[{adr}][{hi}:{lo}] <= {dat_w}[{hi}:{lo}];\n"
        ));
    }
    Ok(r)
}

fn render_read(
    mem: &str,
    port: &MemoryPort,
    buffer: &str,
    cx: &EmitCx<'_>,
) -> Result<String, ConvertError> {
    let adr = cx.expr(&port.adr)?;
    let stmt = match (port.mode, &port.we) {
        (PortMode::WriteFirst, _) => format!("{buffer} <= {adr};"),
        (PortMode::NoChange, Some(we)) => {
            format!("if (!{}) {buffer} <= {mem}[{adr}];", cx.expr(we)?)
        }
        (PortMode::ReadFirst, _) | (PortMode::NoChange, None) => {
            format!("{buffer} <= {mem}[{adr}];")
        }
    };
    Ok(match &port.re {
        Some(re) => format!("{TAB}if ({}) {stmt}\n", cx.expr(re)?),
        None => format!("{TAB}{stmt}\n"),
    })
}

/// One hex word per line, zero-filled to the memory depth.
fn init_contents(memory: &Memory) -> String {
    let digits = memory.width.div_ceil(4) as usize;
    let mut out = String::with_capacity(memory.depth as usize * (digits + 1));
    for i in 0..memory.depth as usize {
        let word = memory.init.get(i).copied().unwrap_or(0) as u128;
        let word = if memory.width >= 128 {
            word
        } else {
            word & ((1u128 << memory.width) - 1)
        };
        out.push_str(&format!("{word:0digits$x}\n"));
    }
    out
}
