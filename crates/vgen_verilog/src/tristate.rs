//! Tristate pad drivers.

use crate::error::ConvertError;
use crate::specials::{EmitCx, SpecialEmitter};
use vgen_ir::{Special, SpecialKind};

/// Emits a `tristate` special as a conditional continuous assignment.
pub struct TristateEmitter;

impl SpecialEmitter for TristateEmitter {
    fn emit(&self, special: &Special, cx: &mut EmitCx<'_>) -> Result<String, ConvertError> {
        let SpecialKind::Tristate(t) = &special.kind else {
            return Err(ConvertError::unsupported(special));
        };
        let target = cx.expr(&t.target)?;
        let mut r = format!(
            "assign {target} = {} ? {} : {}'bz;\n",
            cx.expr(&t.oe)?,
            cx.expr(&t.o)?,
            cx.width(&t.target)
        );
        if let Some(i) = &t.i {
            r.push_str(&format!("assign {} = {target};\n", cx.expr(i)?));
        }
        r.push('\n');
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprPrinter;
    use crate::namespace::Namespace;
    use crate::output::ConvOutput;
    use std::collections::{BTreeMap, BTreeSet};
    use vgen_ir::{Expr, Fragment, Signal, Tristate};

    #[test]
    fn drives_pad_and_reads_back() {
        let mut f = Fragment::new();
        let pad = f.add_signal(Signal::new(4).named("pad"));
        let o = f.add_signal(Signal::new(4).named("o"));
        let oe = f.add_signal(Signal::new(1).named("oe"));
        let i = f.add_signal(Signal::new(4).named("i"));
        let id = f.add_special(SpecialKind::Tristate(Tristate {
            target: Expr::signal(pad),
            o: Expr::signal(o),
            oe: Expr::signal(oe),
            i: Some(Expr::signal(i)),
        }));
        let used: BTreeSet<_> = f.signals.ids().collect();
        let ns = Namespace::build(&f.signals, &used, &[], &BTreeMap::new(), &BTreeSet::new())
            .unwrap();
        let mut out = ConvOutput::default();
        let mut cx = EmitCx::new(ExprPrinter::new(&ns, &f.signals), "top", &mut out);
        let text = TristateEmitter
            .emit(f.special(id).unwrap(), &mut cx)
            .unwrap();
        assert_eq!(text, "assign pad = oe ? o : 4'bz;\nassign i = pad;\n\n");
    }
}
