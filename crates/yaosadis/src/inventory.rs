//! ansible inventory built from resources
//!
//! Answers the two queries of the ansible dynamic inventory protocol:
//! - `--list`: [Inventory::list], all groups plus `_meta.hostvars`
//! - `--host <name>`: [Inventory::host], the variables of a single host
//!
//! Only the pipeline adds to an [Inventory]. Consumers get a read-only view.
use crate::value::Value;
use indexmap::{map::Entry, IndexMap};
use serde::ser::SerializeMap;
use std::borrow::Cow;

/// Reserved top level key of the `--list` response
pub const META_KEY: &str = "_meta";

/// Host variables of a single host
pub type HostVars = IndexMap<String, Value>;

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct Group {
    /// Inventory names in the order they were added, duplicates included
    pub hosts: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Inventory {
    groups: IndexMap<String, Group>,
    hosts: IndexMap<String, HostVars>,
}

impl Inventory {
    /// Appends a host to a group, creating the group on first use
    pub(crate) fn add_to_group(&mut self, group: &str, inventory_name: &str) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .hosts
            .push(inventory_name.to_string());
    }

    /// Registers the host variables of a host
    ///
    /// Returns the inventory name back when it is already taken.
    pub(crate) fn insert_host(
        &mut self,
        inventory_name: String,
        host_vars: HostVars,
    ) -> Result<(), String> {
        match self.hosts.entry(inventory_name) {
            Entry::Occupied(existing) => Err(existing.key().clone()),
            Entry::Vacant(vacant) => {
                vacant.insert(host_vars);
                Ok(())
            }
        }
    }

    pub fn groups(&self) -> &IndexMap<String, Group> {
        &self.groups
    }

    pub fn hosts(&self) -> &IndexMap<String, HostVars> {
        &self.hosts
    }

    /// Response to `--list`
    pub fn list(&self) -> List<'_> {
        List { inventory: self }
    }

    /// Response to `--host <name>`, empty for unknown hosts
    pub fn host(&self, inventory_name: &str) -> Cow<'_, HostVars> {
        match self.hosts.get(inventory_name) {
            Some(host_vars) => Cow::Borrowed(host_vars),
            None => Cow::Owned(HostVars::new()),
        }
    }
}

/// All groups and the `_meta` block
///
/// A group named `_meta` is replaced by the meta block in place.
pub struct List<'i> {
    inventory: &'i Inventory,
}

#[derive(serde::Serialize)]
struct Meta<'i> {
    hostvars: &'i IndexMap<String, HostVars>,
}

impl serde::Serialize for List<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let groups = &self.inventory.groups;
        let meta = Meta {
            hostvars: &self.inventory.hosts,
        };
        let shadowed = groups.contains_key(META_KEY);
        let len = groups.len() + usize::from(!shadowed);

        let mut ser = serializer.serialize_map(Some(len))?;
        for (name, group) in groups {
            if name == META_KEY {
                tracing::debug!("group '{META_KEY}' replaced by host variables");
                ser.serialize_entry(name, &meta)?;
            } else {
                ser.serialize_entry(name, group)?;
            }
        }
        if !shadowed {
            ser.serialize_entry(META_KEY, &meta)?;
        }
        ser.end()
    }
}
