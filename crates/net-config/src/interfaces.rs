//! /etc/network/interfaces parser and writer
//!
//! The parser keeps the file as an ordered sequence of blocks with their
//! verbatim text, so that writing an unmodified file back out reproduces
//! it byte for byte.

use log::debug;
use regex::Regex;

use stornet_core::error::ConfigError;
use stornet_core::{
    is_repeatable, Block, BlockKind, InterfaceEntry, ParsedFile, PropertyMap, PropertyValue, Result,
};

/// Parser for /etc/network/interfaces
pub struct InterfacesParser {
    re_auto: Regex,
    re_iface: Regex,
    re_source: Regex,
    re_prop: Regex,
}

/// Stanza being accumulated while the parser is inside an `iface` block.
struct PendingStanza {
    name: String,
    leading_blank: String,
    raw: String,
}

impl InterfacesParser {
    /// Create new parser
    pub fn new() -> Self {
        Self {
            re_auto: Regex::new(r"^\s*auto\s+(\S+)\s*$").unwrap(),
            re_iface: Regex::new(r"^\s*iface\s+(\S+)\s+inet\s+(\S+)$").unwrap(),
            re_source: Regex::new(r"^\s*source\s+(\S+)\s*$").unwrap(),
            re_prop: Regex::new(r"^\s*(\S+)\s+(.*)$").unwrap(),
        }
    }

    /// Parse interfaces file content.
    ///
    /// Runs a two-state line machine: outside any stanza, lines are
    /// classified as `auto`/`iface`/`source`/blank; inside an `iface`
    /// stanza, a blank line terminates it and anything else must be a
    /// property line. Blank lines accumulate into a pending run that is
    /// attached verbatim to the next block.
    pub fn parse(&self, content: &str) -> Result<ParsedFile> {
        let mut file = ParsedFile::default();
        let mut blank = String::new();
        let mut stanza: Option<PendingStanza> = None;
        let mut line_no = 0usize;

        for nline in content.split_inclusive('\n') {
            line_no += 1;
            let line = nline.trim_end();

            if stanza.is_some() {
                if line.trim().is_empty() {
                    let done = stanza.take().unwrap();
                    debug!("done with the definition of the {} iface", done.name);
                    file.blocks
                        .push(Block::iface(done.leading_blank, done.name, done.raw));
                    blank = nline.to_string();
                    continue;
                }
                let current = stanza.as_mut().unwrap();
                let caps = self.re_prop.captures(line).ok_or_else(|| {
                    ConfigError::InvalidProperty {
                        interface: current.name.clone(),
                        line: line_no,
                        text: line.to_string(),
                    }
                })?;
                let key = caps.get(1).unwrap().as_str();
                let value = caps.get(2).unwrap().as_str();
                debug!("got an interface property: {:?}: {:?}", key, value);
                // The entry's data map was created when the stanza opened.
                let data = file
                    .interfaces
                    .get_mut(&current.name)
                    .and_then(|e| e.data.as_mut())
                    .expect("open stanza always has a data map");
                if is_repeatable(key) {
                    match data
                        .entry(key.to_string())
                        .or_insert_with(|| PropertyValue::List(Vec::new()))
                    {
                        PropertyValue::List(items) => items.push(value.to_string()),
                        PropertyValue::Scalar(_) => unreachable!("repeatable keys are lists"),
                    }
                } else {
                    data.insert(key.to_string(), PropertyValue::Scalar(value.to_string()));
                }
                current.raw.push_str(nline);
                continue;
            }

            if line.trim().is_empty() {
                blank.push_str(nline);
            } else if let Some(caps) = self.re_auto.captures(line) {
                let name = caps.get(1).unwrap().as_str();
                file.interfaces
                    .entry(name.to_string())
                    .or_insert_with(InterfaceEntry::default)
                    .auto = true;
                file.blocks.push(Block {
                    leading_blank: std::mem::take(&mut blank),
                    kind: BlockKind::Auto {
                        name: name.to_string(),
                    },
                    raw: nline.to_string(),
                });
            } else if let Some(caps) = self.re_iface.captures(line) {
                let name = caps.get(1).unwrap().as_str();
                let entry = file
                    .interfaces
                    .entry(name.to_string())
                    .or_insert_with(InterfaceEntry::default);
                if entry.data.is_some() {
                    return Err(ConfigError::DuplicateInterface {
                        name: name.to_string(),
                    }
                    .into());
                }
                entry.data = Some(PropertyMap::new());
                stanza = Some(PendingStanza {
                    name: name.to_string(),
                    leading_blank: std::mem::take(&mut blank),
                    raw: nline.to_string(),
                });
            } else if let Some(caps) = self.re_source.captures(line) {
                file.blocks.push(Block {
                    leading_blank: std::mem::take(&mut blank),
                    kind: BlockKind::Source {
                        path: caps.get(1).unwrap().as_str().to_string(),
                    },
                    raw: nline.to_string(),
                });
            } else {
                return Err(ConfigError::UnrecognizedLine {
                    line: line_no,
                    text: line.to_string(),
                }
                .into());
            }
        }

        // No trailing blank line is required after the last stanza.
        if let Some(done) = stanza.take() {
            debug!(
                "fallen off EOF with the definition of the {} iface",
                done.name
            );
            file.blocks
                .push(Block::iface(done.leading_blank, done.name, done.raw));
        } else if !blank.is_empty() {
            file.blocks.push(Block::empty(blank));
        }

        debug!(
            "parsed {} blocks, {} interfaces",
            file.blocks.len(),
            file.interfaces.len()
        );
        Ok(file)
    }

    /// Serialize the block sequence back to file content.
    ///
    /// Emits each block's leading blank run followed by its raw text,
    /// with no extra separators.
    pub fn render(&self, file: &ParsedFile) -> String {
        let mut out = String::new();
        for block in &file.blocks {
            out.push_str(&block.leading_blank);
            out.push_str(&block.raw);
        }
        out
    }
}

impl Default for InterfacesParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Regenerate the full stanza text for one interface from its property
/// map: keys in sorted order, repeatable keys one line per stored entry
/// in list order.
pub fn render_iface_stanza(name: &str, data: &PropertyMap) -> String {
    let mut out = format!("iface {} inet static\n", name);
    let mut keys: Vec<&String> = data.keys().collect();
    keys.sort();
    for key in keys {
        match &data[key.as_str()] {
            PropertyValue::Scalar(value) => {
                out.push_str(&format!("  {} {}\n", key, value));
            }
            PropertyValue::List(items) => {
                for value in items {
                    out.push_str(&format!("  {} {}\n", key, value));
                }
            }
        }
    }
    out
}
