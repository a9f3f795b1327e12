//! Verilog emission for vgen fragments.
//!
//! [`Converter`] runs the whole pipeline: clock domain checks, the lowering
//! passes of `vgen_lower`, port resolution, identifier assignment and text
//! emission. The result is a [`ConvOutput`] holding the module source, the
//! namespace, the port list and any side files such as memory initializers.
//!
//! # Layout of the emitted file
//!
//! banner, `` `timescale ``, then the `Module`, `Hierarchy`, `Signals`,
//! `Combinatorial Logic`, `Synchronous Logic` and `Specialized Logic`
//! sections, `endmodule`, and a trailer.
//!
//! # Usage
//!
//! ```ignore
//! use vgen_verilog::{ConvertOptions, Converter};
//! let out = Converter::new(ConvertOptions::default())
//!     .ios([clk, led])
//!     .convert(fragment)?;
//! println!("{}", out.main_source);
//! ```

#![warn(missing_docs)]

mod attr;
mod comb;
mod convert;
mod decl;
mod error;
mod expr;
mod hierarchy;
mod instance;
mod layout;
mod memory;
mod namespace;
mod node;
mod output;
mod specials;
mod sync;
mod tristate;

pub use attr::render_attributes;
pub use convert::{ConvertOptions, Converter};
pub use error::ConvertError;
pub use expr::ExprPrinter;
pub use hierarchy::{Hierarchy, ModuleTree};
pub use instance::InstanceEmitter;
pub use vgen_ir::{reserved_keywords, KEYWORDS};
pub use memory::MemoryEmitter;
pub use namespace::{NameKey, Namespace};
pub use output::{ConvOutput, NetKind, PortDecl, PortDirection};
pub use specials::{EmitCx, SpecialEmitter, SpecialOverrides};
pub use tristate::TristateEmitter;
