//! Block and interface entry model for the interfaces file

use std::collections::BTreeSet;

use indexmap::IndexMap;

/// True for stanza keys that may repeat within one stanza.
///
/// The `pre-*`/`post-*` hook directives keep every occurrence, in order;
/// all other keys are single-valued with last-write-wins.
pub fn is_repeatable(key: &str) -> bool {
    key.starts_with("pre-") || key.starts_with("post-")
}

/// Value of one stanza property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Single-valued property.
    Scalar(String),
    /// Repeatable property; repetition order is significant.
    List(Vec<String>),
}

/// Ordered map from property name to value, as it appears in a stanza.
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// Kind-specific payload of a physical block in the interfaces file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// `auto <iface>`
    Auto { name: String },
    /// `iface <iface> inet <method>` plus its indented property lines.
    Iface { name: String },
    /// `source <path>`
    Source { path: String },
    /// Trailing blank run at end of file, with no content of its own.
    Empty,
}

/// One physical unit of the interfaces file.
///
/// Concatenating `leading_blank + raw` for every block, in order,
/// reproduces the input byte for byte as long as no block was mutated.
#[derive(Debug, Clone)]
pub struct Block {
    /// Verbatim blank lines immediately preceding this block.
    pub leading_blank: String,
    pub kind: BlockKind,
    /// Exact serialized text of the non-blank content. Empty for
    /// `BlockKind::Empty`; regenerated only when the block is mutated.
    pub raw: String,
}

impl Block {
    pub fn auto(leading_blank: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            leading_blank: leading_blank.into(),
            raw: format!("auto {}\n", name),
            kind: BlockKind::Auto { name },
        }
    }

    pub fn iface(
        leading_blank: impl Into<String>,
        name: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            leading_blank: leading_blank.into(),
            kind: BlockKind::Iface { name: name.into() },
            raw: raw.into(),
        }
    }

    pub fn source(
        leading_blank: impl Into<String>,
        path: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            leading_blank: leading_blank.into(),
            kind: BlockKind::Source { path: path.into() },
            raw: raw.into(),
        }
    }

    /// Trailing blank run at end of file.
    pub fn empty(leading_blank: impl Into<String>) -> Self {
        Self {
            leading_blank: leading_blank.into(),
            kind: BlockKind::Empty,
            raw: String::new(),
        }
    }
}

/// Logical view of one interface, keyed by name, unique per file.
#[derive(Debug, Clone, Default)]
pub struct InterfaceEntry {
    /// Whether an `auto <name>` stanza exists for this interface.
    pub auto: bool,
    /// The stanza's property map, or `None` when the interface is named
    /// by `auto`/`source` but never defined by an `iface` line.
    pub data: Option<PropertyMap>,
}

/// Parsed interfaces file plus the change tracking for one
/// reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Physical blocks, in file order.
    pub blocks: Vec<Block>,
    /// Logical interface entries, in first-seen order.
    pub interfaces: IndexMap<String, InterfaceEntry>,
    /// Whether anything changed during this pass.
    pub changed: bool,
    /// Names of the interfaces whose stanza needed rewriting.
    pub changed_interfaces: BTreeSet<String>,
}

impl ParsedFile {
    /// Record that `name` needed rewriting during this pass.
    pub fn mark_changed(&mut self, name: &str) {
        self.changed = true;
        self.changed_interfaces.insert(name.to_string());
    }

    /// Index of the `Iface` block defining `name`, if any.
    pub fn iface_block_index(&self, name: &str) -> Option<usize> {
        self.blocks.iter().position(|b| {
            matches!(&b.kind, BlockKind::Iface { name: n } if n == name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeatable_keys() {
        assert!(is_repeatable("post-up"));
        assert!(is_repeatable("pre-down"));
        assert!(!is_repeatable("address"));
        assert!(!is_repeatable("mtu"));
    }

    #[test]
    fn auto_block_raw_text() {
        let block = Block::auto("\n", "eth0");
        assert_eq!(block.leading_blank, "\n");
        assert_eq!(block.raw, "auto eth0\n");
        assert_eq!(block.kind, BlockKind::Auto { name: "eth0".into() });
    }

    #[test]
    fn iface_block_lookup() {
        let mut file = ParsedFile::default();
        file.blocks.push(Block::auto("", "eth0"));
        file.blocks
            .push(Block::iface("", "eth0", "iface eth0 inet static\n"));
        assert_eq!(file.iface_block_index("eth0"), Some(1));
        assert_eq!(file.iface_block_index("eth1"), None);
    }
}
