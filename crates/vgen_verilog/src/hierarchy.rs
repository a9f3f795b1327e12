//! Design hierarchy comment.
//!
//! The converter never discovers the hierarchy itself; callers that track one
//! pass it in through [`Hierarchy`].

/// A source of the module tree printed in the `Hierarchy` section.
pub trait Hierarchy {
    /// One line per node, each terminated by `\n`.
    fn render(&self) -> String;
}

/// A plain named tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTree {
    /// Node label.
    pub name: String,
    /// Children, printed in order.
    pub children: Vec<ModuleTree>,
}

impl ModuleTree {
    /// A leaf.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Appends a child.
    pub fn child(mut self, child: ModuleTree) -> Self {
        self.children.push(child);
        self
    }

    fn render_children(&self, prefix: &str, out: &mut String) {
        let last = self.children.len().saturating_sub(1);
        for (i, child) in self.children.iter().enumerate() {
            let (branch, indent) = if i == last {
                ("└─── ", "     ")
            } else {
                ("├─── ", "│    ")
            };
            out.push_str(&format!("{prefix}{branch}{}\n", child.name));
            child.render_children(&format!("{prefix}{indent}"), out);
        }
    }
}

impl Hierarchy for ModuleTree {
    fn render(&self) -> String {
        let mut out = format!("{}\n", self.name);
        self.render_children("", &mut out);
        out
    }
}

/// Wraps the hierarchy in a block comment, or nothing without one.
pub(crate) fn render_hierarchy(hierarchy: Option<&dyn Hierarchy>) -> String {
    match hierarchy {
        Some(h) => format!("/*\n{}*/\n", h.render()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_drawing() {
        let tree = ModuleTree::new("top")
            .child(ModuleTree::new("crg").child(ModuleTree::new("pll")))
            .child(ModuleTree::new("uart"));
        assert_eq!(
            render_hierarchy(Some(&tree)),
            "/*\ntop\n├─── crg\n│    └─── pll\n└─── uart\n*/\n"
        );
        assert_eq!(render_hierarchy(None), "");
    }
}
