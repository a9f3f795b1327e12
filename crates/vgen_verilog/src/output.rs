//! The result of a conversion.

use crate::error::ConvertError;
use crate::namespace::Namespace;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use vgen_ir::SignalId;

/// Direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    /// `input`.
    Input,
    /// `output`.
    Output,
    /// `inout`.
    InOut,
}

/// Net type of a port or internal signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetKind {
    /// Driven by a continuous assignment, a special, or from outside.
    Wire,
    /// Driven from a procedural block.
    Reg,
}

/// How one I/O signal was declared in the module header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDecl {
    /// The signal.
    pub signal: SignalId,
    /// Its identifier.
    pub name: String,
    /// Port direction.
    pub direction: PortDirection,
    /// Net type.
    pub kind: NetKind,
}

/// Rendered Verilog plus everything a caller needs to use it.
#[derive(Debug, Clone, Default)]
pub struct ConvOutput {
    /// Module name; the main file is written as `<module_name>.v`.
    pub module_name: String,
    /// The Verilog source.
    pub main_source: String,
    /// Identifiers assigned during the conversion.
    pub ns: Namespace,
    /// Port declarations in header order.
    pub ports: Vec<PortDecl>,
    /// Side files referenced from the source, by file name.
    pub data_files: BTreeMap<String, String>,
}

impl ConvOutput {
    /// Registers a side file and returns the name it was stored under.
    ///
    /// A name already in use gets `_1`, `_2`, ... appended to its stem.
    pub fn add_data_file(&mut self, name: &str, content: String) -> String {
        let (stem, ext) = match name.split_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (name, None),
        };
        let mut file = name.to_string();
        let mut n = 0u32;
        while self.data_files.contains_key(&file) {
            n += 1;
            file = match ext {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
        }
        self.data_files.insert(file.clone(), content);
        file
    }

    /// File name of the main source.
    pub fn main_file_name(&self) -> String {
        format!("{}.v", self.module_name)
    }

    /// Writes the main source and every data file into `dir`.
    ///
    /// Each file goes through a temporary sibling that is renamed into place.
    /// If any file fails, the ones already written are removed again.
    /// Returns the written paths, main source first.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        fs::create_dir_all(dir).map_err(|e| ConvertError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let files = std::iter::once((self.main_file_name(), &self.main_source))
            .chain(self.data_files.iter().map(|(n, c)| (n.clone(), c)));
        let mut written = Vec::with_capacity(1 + self.data_files.len());
        for (name, content) in files {
            match write_file(&dir.join(name), content) {
                Ok(path) => written.push(path),
                Err(e) => {
                    for path in &written {
                        let _ = fs::remove_file(path);
                    }
                    log::warn!("write failed, removed {} earlier file(s)", written.len());
                    return Err(e);
                }
            }
        }
        log::info!("wrote {} file(s) to {}", written.len(), dir.display());
        Ok(written)
    }
}

fn write_file(path: &Path, content: &str) -> Result<PathBuf, ConvertError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let result = fs::write(&tmp, content)
        .map_err(|e| ConvertError::Io {
            path: tmp.clone(),
            source: e,
        })
        .and_then(|()| {
            fs::rename(&tmp, path).map_err(|e| ConvertError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map(|()| path.to_path_buf())
}
