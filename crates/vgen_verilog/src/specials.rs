//! Special primitive emission.
//!
//! Each remaining special is rendered by the first emitter found for its tag:
//! a user override, then a built-in (`memory`, `instance`, `tristate`).
//! A special nobody handles aborts the conversion.

use crate::attr::render_attributes;
use crate::error::ConvertError;
use crate::expr::ExprPrinter;
use crate::instance::InstanceEmitter;
use crate::memory::MemoryEmitter;
use crate::namespace::Namespace;
use crate::output::ConvOutput;
use crate::tristate::TristateEmitter;
use std::collections::BTreeMap;
use vgen_config::AttrTranslate;
use vgen_ir::{Arena, Const, Expr, Signal, SignalId, Special};
use vgen_lower::{LowererRegistry, SpecialLowerer};

/// Renders one kind of special as Verilog text.
pub trait SpecialEmitter {
    /// Returns the text for `special`, attribute line excluded.
    fn emit(&self, special: &Special, cx: &mut EmitCx<'_>) -> Result<String, ConvertError>;
}

/// What an emitter can see and do.
pub struct EmitCx<'a> {
    printer: ExprPrinter<'a>,
    module_name: &'a str,
    output: &'a mut ConvOutput,
}

impl<'a> EmitCx<'a> {
    /// Creates a context writing data files into `output`.
    pub fn new(printer: ExprPrinter<'a>, module_name: &'a str, output: &'a mut ConvOutput) -> Self {
        Self {
            printer,
            module_name,
            output,
        }
    }

    /// The identifier table.
    pub fn namespace(&self) -> &'a Namespace {
        self.printer.namespace()
    }

    /// The signal table.
    pub fn signals(&self) -> &'a Arena<SignalId, Signal> {
        self.printer.signals()
    }

    /// Name of the module being emitted.
    pub fn module_name(&self) -> &str {
        self.module_name
    }

    /// Renders an expression.
    pub fn expr(&self, expr: &Expr) -> Result<String, ConvertError> {
        self.printer.render(expr)
    }

    /// Renders a constant.
    pub fn constant(&self, c: &Const) -> String {
        self.printer.constant(c)
    }

    /// Width of an expression.
    pub fn width(&self, expr: &Expr) -> u32 {
        expr.width(self.signals())
    }

    /// Stores a side file and returns the name it ended up with.
    pub fn add_data_file(&mut self, name: &str, content: String) -> String {
        self.output.add_data_file(name, content)
    }
}

/// Caller-supplied lowerers and emitters, keyed by special tag.
///
/// Overrides win over platform lowerers and over every built-in.
#[derive(Default)]
pub struct SpecialOverrides {
    lowerers: BTreeMap<String, Box<dyn SpecialLowerer>>,
    emitters: BTreeMap<String, Box<dyn SpecialEmitter>>,
}

impl SpecialOverrides {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lowerer for `tag`.
    pub fn add_lowerer(&mut self, tag: impl Into<String>, lowerer: Box<dyn SpecialLowerer>) {
        self.lowerers.insert(tag.into(), lowerer);
    }

    /// Registers an emitter for `tag`.
    pub fn add_emitter(&mut self, tag: impl Into<String>, emitter: Box<dyn SpecialEmitter>) {
        self.emitters.insert(tag.into(), emitter);
    }

    /// The override emitter for `tag`.
    pub fn emitter(&self, tag: &str) -> Option<&dyn SpecialEmitter> {
        self.emitters.get(tag).map(|e| e.as_ref())
    }
}

impl LowererRegistry for SpecialOverrides {
    fn lowerer(&self, tag: &str) -> Option<&dyn SpecialLowerer> {
        self.lowerers.lowerer(tag)
    }
}

fn builtin_emitter(tag: &str) -> Option<&'static dyn SpecialEmitter> {
    match tag {
        "memory" => Some(&MemoryEmitter),
        "instance" => Some(&InstanceEmitter),
        "tristate" => Some(&TristateEmitter),
        _ => None,
    }
}

/// Renders every special in ID order, each preceded by its attributes.
pub fn render_specials(
    specials: &[Special],
    overrides: &SpecialOverrides,
    translate: &AttrTranslate,
    cx: &mut EmitCx<'_>,
) -> Result<String, ConvertError> {
    let mut ordered: Vec<&Special> = specials.iter().collect();
    ordered.sort_by_key(|s| s.id);

    let mut r = String::new();
    for special in ordered {
        let tag = special.tag();
        let emitter = overrides
            .emitter(tag)
            .or_else(|| builtin_emitter(tag))
            .ok_or_else(|| ConvertError::UnimplementedSpecial {
                special: special.id,
                tag: tag.to_string(),
            })?;
        r.push_str(&render_attributes(&special.attrs, translate));
        r.push_str(&emitter.emit(special, cx)?);
        log::debug!("emitted special {} ('{tag}')", special.id);
    }
    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgen_ir::{Attribute, CustomSpecial, SpecialId, SpecialKind};

    struct Comment;

    impl SpecialEmitter for Comment {
        fn emit(&self, special: &Special, cx: &mut EmitCx<'_>) -> Result<String, ConvertError> {
            let file = cx.add_data_file("blob.bin", "x".into());
            Ok(format!("// {} in {} uses {file}\n", special.tag(), cx.module_name()))
        }
    }

    fn custom(id: u32, class: &str) -> Special {
        Special::new(
            SpecialId::from_raw(id),
            SpecialKind::Custom(CustomSpecial {
                class: class.into(),
                ios: vec![],
                params: BTreeMap::new(),
            }),
        )
    }

    #[test]
    fn overrides_emit_in_id_order_with_attributes() {
        let signals = Arena::new();
        let ns = Namespace::default();
        let mut out = ConvOutput::default();
        let mut cx = EmitCx::new(ExprPrinter::new(&ns, &signals), "top", &mut out);
        let mut overrides = SpecialOverrides::new();
        overrides.add_emitter("pll", Box::new(Comment));

        let specials = vec![
            custom(3, "pll"),
            custom(1, "pll").attr(Attribute::pair("LOC", "PLL0")),
        ];
        let r = render_specials(&specials, &overrides, &AttrTranslate::passthrough(), &mut cx)
            .unwrap();
        assert_eq!(
            r,
            "(* LOC = \"PLL0\" *)\n// pll in top uses blob.bin\n// pll in top uses blob_1.bin\n"
        );
        let files: Vec<&str> = out.data_files.keys().map(String::as_str).collect();
        assert_eq!(files, ["blob.bin", "blob_1.bin"]);
    }

    #[test]
    fn unhandled_tag_is_unimplemented() {
        let signals = Arena::new();
        let ns = Namespace::default();
        let mut out = ConvOutput::default();
        let mut cx = EmitCx::new(ExprPrinter::new(&ns, &signals), "top", &mut out);
        let err = render_specials(
            &[custom(0, "serdes")],
            &SpecialOverrides::new(),
            &AttrTranslate::passthrough(),
            &mut cx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnimplementedSpecial { tag, .. } if tag == "serdes"
        ));
    }
}
