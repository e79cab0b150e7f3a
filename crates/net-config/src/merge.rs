//! Merge engine
//!
//! Merges the desired overlay for each requested interface into the
//! parsed block list, tracking exactly which stanzas changed. Both entry
//! points are idempotent: applying the same desired state twice produces
//! no further changes.

use indexmap::map::Entry;
use log::debug;

use stornet_core::error::ConfigError;
use stornet_core::{Block, InterfaceEntry, ParsedFile, PropertyMap, PropertyValue, Result};

use crate::interfaces::render_iface_stanza;
use crate::overlay::{build_overlay, parent_of};
use crate::resolver::AddressResolver;

/// Merges desired interface state into a parsed file.
pub struct Merger<'a> {
    resolver: &'a AddressResolver,
}

impl<'a> Merger<'a> {
    pub fn new(resolver: &'a AddressResolver) -> Self {
        Self { resolver }
    }

    /// Add `name` if it is unknown, otherwise update it in place.
    pub fn ensure(&self, file: &mut ParsedFile, name: &str) -> Result<()> {
        if file.interfaces.contains_key(name) {
            self.update_if_needed(file, name)
        } else {
            self.add_interface(file, name)
        }
    }

    /// Merge the parent of a VLAN name first, then build the overlay.
    ///
    /// The recursion is bounded by the dot count of the name: each step
    /// strips at least one `.<vlan-id>` suffix.
    fn desired_state(&self, file: &mut ParsedFile, name: &str) -> Result<PropertyMap> {
        if let Some(parent) = parent_of(name) {
            self.ensure(file, parent)?;
            debug!("back to the {} interface", name);
        }
        build_overlay(name, self.resolver)
    }

    /// Append a brand-new interface: an `auto` block and a full `iface`
    /// stanza at the end of the file.
    pub fn add_interface(&self, file: &mut ParsedFile, name: &str) -> Result<()> {
        debug!("adding interface {}", name);
        let data = self.desired_state(file, name)?;

        file.blocks.push(Block::auto("\n", name));
        file.blocks
            .push(Block::iface("", name, render_iface_stanza(name, &data)));
        file.interfaces.insert(
            name.to_string(),
            InterfaceEntry {
                auto: true,
                data: Some(data),
            },
        );
        file.mark_changed(name);
        Ok(())
    }

    /// Merge the overlay into an existing entry, rewriting its stanza
    /// only when something actually differs.
    ///
    /// An interface whose `auto` flag is off counts as changed even when
    /// every property already matches: a managed interface must become
    /// auto-started.
    pub fn update_if_needed(&self, file: &mut ParsedFile, name: &str) -> Result<()> {
        debug!("updating the {} interface if needed", name);
        let desired = self.desired_state(file, name)?;

        if !file.interfaces.contains_key(name) {
            return self.add_interface(file, name);
        }

        let entry = &mut file.interfaces[name];
        let had_def = entry.data.is_some();
        let data = entry.data.get_or_insert_with(PropertyMap::new);

        let mut changed = false;
        for (key, wanted) in &desired {
            match data.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(wanted.clone());
                    changed = true;
                }
                Entry::Occupied(mut slot) => match (slot.get_mut(), wanted) {
                    (PropertyValue::Scalar(current), PropertyValue::Scalar(wanted)) => {
                        if current != wanted {
                            *current = wanted.clone();
                            changed = true;
                        }
                    }
                    (PropertyValue::List(current), PropertyValue::List(wanted)) => {
                        // Append missing entries only; never remove or
                        // reorder what is already there.
                        for item in wanted {
                            if !current.contains(item) {
                                current.push(item.clone());
                                changed = true;
                            }
                        }
                    }
                    _ => unreachable!("the property kind is fixed by its key prefix"),
                },
            }
        }

        let flip_auto = !entry.auto;
        if flip_auto {
            changed = true;
        }

        if !changed {
            debug!("nothing seems to have changed for {}", name);
            return Ok(());
        }

        let stanza = render_iface_stanza(name, data);
        entry.auto = true;
        file.mark_changed(name);

        match file.iface_block_index(name) {
            Some(idx) => {
                file.blocks[idx].raw = stanza;
                if flip_auto {
                    // The auto declaration goes right before the
                    // definition, matching on-disk convention.
                    file.blocks.insert(idx, Block::auto("\n", name));
                }
            }
            None if !had_def => {
                // Named by auto/source only; there is no stanza to
                // rewrite, so append a fresh one.
                if flip_auto {
                    file.blocks.push(Block::auto("\n", name));
                    file.blocks.push(Block::iface("", name, stanza));
                } else {
                    file.blocks.push(Block::iface("\n", name, stanza));
                }
            }
            None => {
                return Err(ConfigError::MissingBlock {
                    name: name.to_string(),
                }
                .into())
            }
        }
        Ok(())
    }
}
