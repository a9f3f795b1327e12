//! Module instantiation.

use crate::error::ConvertError;
use crate::node::TAB;
use crate::specials::{EmitCx, SpecialEmitter};
use vgen_ir::{ParamValue, Special, SpecialKind};

/// Emits an `instance` special as a named-port instantiation.
pub struct InstanceEmitter;

impl SpecialEmitter for InstanceEmitter {
    fn emit(&self, special: &Special, cx: &mut EmitCx<'_>) -> Result<String, ConvertError> {
        let SpecialKind::Instance(inst) = &special.kind else {
            return Err(ConvertError::unsupported(special));
        };
        let name = cx.namespace().special(special.id)?;

        let mut r = inst.of.clone();
        if !inst.params.is_empty() {
            let params: Vec<String> = inst
                .params
                .iter()
                .map(|p| format!("{TAB}.{}({})", p.name, render_param(&p.value, cx)))
                .collect();
            r.push_str(&format!(" #(\n{}\n)", params.join(",\n")));
        }
        let ports = inst
            .ports
            .iter()
            .map(|p| Ok(format!("{TAB}.{}({})", p.name, cx.expr(&p.expr)?)))
            .collect::<Result<Vec<_>, ConvertError>>()?;
        r.push_str(&format!(" {name} (\n{}\n);\n\n", ports.join(",\n")));
        Ok(r)
    }
}

fn render_param(value: &ParamValue, cx: &EmitCx<'_>) -> String {
    match value {
        ParamValue::Const(c) => cx.constant(c),
        ParamValue::Float(v) => format!("{v:?}"),
        ParamValue::Str(s) => format!("\"{s}\""),
        ParamValue::Preformatted(s) => s.clone(),
    }
}
