//! resource to inventory transformation
//!
//! Every resource goes through the same steps, in the order of the info file:
//!
//! 1. the resource filter template must render `True` (keep) or `False` (skip)
//! 2. the inventory name template names the host
//! 3. the groups template lists the groups of the host, one per line
//! 4. the host vars template lists `key=value` host variables, one per line
//! 5. the host is registered, inventory names must be unique
//!
//! Lines are separated by a newline and any whitespace around it.
//!
//! Processing is a sequential fold into a single [Inventory]. The inventory is borrowed
//! mutably for the whole run and is not meant to be shared between threads while it is
//! being built; the first resource to claim an inventory name wins and later duplicates
//! are reported, which relies on the info file order.
use crate::inventory::{HostVars, Inventory};
use crate::literal::{self, LiteralError};
use crate::resource::{Binding, Resources};
use crate::template::{Render, RenderError, TemplateRole};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\n\s*").expect("line separator regex must compile"));

/// Splits rendered output into trimmed, non-empty lines
fn lines(rendered: &str) -> impl Iterator<Item = &str> {
    LINE_SEPARATOR
        .split(rendered)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

#[derive(derive_new::new)]
pub struct Pipeline<'r, R> {
    renderer: &'r R,
}

impl<R: Render> Pipeline<'_, R> {
    pub fn process(&self, resources: &Resources) -> Result<Inventory, PipelineError> {
        tracing::debug!(count = resources.len(), "processing resources");

        let mut inventory = Inventory::default();
        for binding in resources.iter() {
            self.process_resource(&binding, &mut inventory)?;
        }

        tracing::debug!(
            groups = inventory.groups().len(),
            hosts = inventory.hosts().len(),
            "inventory complete"
        );
        Ok(inventory)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(uuid = binding.uuid))]
    fn process_resource(
        &self,
        binding: &Binding<'_>,
        inventory: &mut Inventory,
    ) -> Result<(), PipelineError> {
        if !self.is_included(binding)? {
            tracing::debug!("excluded by resource filter");
            return Ok(());
        }

        let inventory_name = self.render(TemplateRole::InventoryName, binding)?;
        tracing::debug!(%inventory_name, "rendered inventory name");

        let groups = self.render(TemplateRole::Groups, binding)?;
        for group in lines(&groups) {
            tracing::debug!(%inventory_name, group, "added to group");
            inventory.add_to_group(group, &inventory_name);
        }

        let host_vars = self.host_vars(binding)?;

        inventory
            .insert_host(inventory_name, host_vars)
            .map_err(|inventory_name| PipelineError::DuplicateInventoryName {
                inventory_name,
                uuid: binding.uuid.to_string(),
            })
    }

    fn is_included(&self, binding: &Binding<'_>) -> Result<bool, PipelineError> {
        let value = self.render(TemplateRole::Filter, binding)?;
        match value.as_str() {
            "True" => Ok(true),
            "False" => Ok(false),
            _ => Err(PipelineError::UnexpectedFilterResult {
                uuid: binding.uuid.to_string(),
                value,
                template: self.renderer.source(TemplateRole::Filter).to_string(),
            }),
        }
    }

    fn host_vars(&self, binding: &Binding<'_>) -> Result<HostVars, PipelineError> {
        let rendered = self.render(TemplateRole::HostVars, binding)?;

        let mut host_vars = HostVars::new();
        for assignment in lines(&rendered) {
            let Some((key, fragment)) = assignment.split_once('=') else {
                tracing::warn!(
                    assignment,
                    template = self.renderer.source(TemplateRole::HostVars),
                    "no '=' in host vars assignment"
                );
                host_vars.insert(assignment.to_string(), Value::from(""));
                continue;
            };

            let key = key.trim();
            let fragment = fragment.trim();
            let value =
                literal::coerce(fragment).map_err(|source| PipelineError::MalformedLiteral {
                    uuid: binding.uuid.to_string(),
                    key: key.to_string(),
                    fragment: fragment.to_string(),
                    template: self.renderer.source(TemplateRole::HostVars).to_string(),
                    source,
                })?;

            tracing::debug!(key, ?value, "host var set");
            host_vars.insert(key.to_string(), value);
        }

        Ok(host_vars)
    }

    fn render(&self, role: TemplateRole, binding: &Binding<'_>) -> Result<String, PipelineError> {
        self.renderer
            .render(role, binding)
            .map_err(|source| PipelineError::Render {
                uuid: binding.uuid.to_string(),
                source,
            })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Failed to render templates for resource '{uuid}'")]
    Render { uuid: String, source: RenderError },
    #[error("Unexpected value returned from resource filter template for resource '{uuid}': '{value}' (template was '{template}')")]
    UnexpectedFilterResult {
        uuid: String,
        value: String,
        template: String,
    },
    #[error("Malformed literal '{fragment}' for host variable '{key}' of resource '{uuid}' (template was '{template}')")]
    MalformedLiteral {
        uuid: String,
        key: String,
        fragment: String,
        template: String,
        source: LiteralError,
    },
    #[error("Inventory name was not unique across resources: '{inventory_name}' of resource '{uuid}' was a duplicate")]
    DuplicateInventoryName { inventory_name: String, uuid: String },
}
