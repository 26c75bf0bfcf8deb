//! template rendering
//!
//! Four templates drive the inventory, each rendered once per resource against its
//! [Binding]. See [TemplateRole].
//!
//! Rendering is abstracted by [Render] so the pipeline does not depend on a specific
//! engine. [Renderer] implements it with [minijinja] and behaves close to Jinja2 as used
//! by Ansible users:
//! - booleans print as `True`/`False` and none prints as `None`
//! - python methods such as `resource.items()` are available
//! - `default(value, default_value, boolean)` supports the `boolean` flag
//! - undefined values print as empty strings, looking up an attribute of an undefined
//!   value is an error (unless [RenderOptions::strict_undefined] is set, which turns
//!   every use of an undefined value into an error)
use crate::resource::Binding;
use minijinja::{AutoEscape, Environment, ErrorKind, Output, State, UndefinedBehavior, Value};

/// names the inventory host after the (unique) resource identifier
pub const DEFAULT_INVENTORY_NAME_TEMPLATE: &str = "{{ uuid }}";

/// assigns every resource to the `all` group
pub const DEFAULT_GROUPS_TEMPLATE: &str = "all";

/// includes compute instances only
pub const DEFAULT_RESOURCE_FILTER_TEMPLATE: &str = r#"{{ resource.type == "instance" }}"#;

/// Sets `ansible_host` to the IPv6 address when available, then IPv4, then the generic
/// interface address. Every attribute is exposed as `os_<attribute>`.
pub const DEFAULT_HOST_VARS_TEMPLATE: &str = r#"ansible_host={{ resource.accessIPv6
    | default(resource.accessIPv4, true)
    | default(resource.interface_ip, true) }}
{% for attr, value in resource | items %}
os_{{ attr }}={{ value }}
{% endfor %}"#;

/// The purpose of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRole {
    /// Renders `True` to include a resource, `False` to skip it
    Filter,
    /// Renders the inventory name (ansible `host`)
    InventoryName,
    /// Renders newline separated group names
    Groups,
    /// Renders newline separated `key=value` host variables
    HostVars,
}

impl TemplateRole {
    pub const ALL: [TemplateRole; 4] = [
        TemplateRole::Filter,
        TemplateRole::InventoryName,
        TemplateRole::Groups,
        TemplateRole::HostVars,
    ];

    /// Template name inside the template environment
    fn name(self) -> &'static str {
        match self {
            TemplateRole::Filter => "resource_filter",
            TemplateRole::InventoryName => "inventory_name",
            TemplateRole::Groups => "groups",
            TemplateRole::HostVars => "host_vars",
        }
    }
}

impl std::fmt::Display for TemplateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateRole::Filter => f.write_str("resource filter"),
            TemplateRole::InventoryName => f.write_str("inventory name"),
            TemplateRole::Groups => f.write_str("groups"),
            TemplateRole::HostVars => f.write_str("host vars"),
        }
    }
}

/// Template sources, one per [TemplateRole]
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub filter: String,
    pub inventory_name: String,
    pub groups: String,
    pub host_vars: String,
}

impl TemplateSet {
    pub fn source(&self, role: TemplateRole) -> &str {
        match role {
            TemplateRole::Filter => &self.filter,
            TemplateRole::InventoryName => &self.inventory_name,
            TemplateRole::Groups => &self.groups,
            TemplateRole::HostVars => &self.host_vars,
        }
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            filter: DEFAULT_RESOURCE_FILTER_TEMPLATE.to_string(),
            inventory_name: DEFAULT_INVENTORY_NAME_TEMPLATE.to_string(),
            groups: DEFAULT_GROUPS_TEMPLATE.to_string(),
            host_vars: DEFAULT_HOST_VARS_TEMPLATE.to_string(),
        }
    }
}

/// Template engine settings, fixed for the lifetime of a [Renderer]
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Remove the first newline after a block tag
    pub trim_blocks: bool,
    /// Strip whitespace from the start of a line up to a block tag
    pub lstrip_blocks: bool,
    /// Any use of an undefined value fails
    pub strict_undefined: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            trim_blocks: true,
            lstrip_blocks: true,
            strict_undefined: false,
        }
    }
}

/// Renders a template for a resource
pub trait Render {
    fn render(&self, role: TemplateRole, binding: &Binding<'_>) -> Result<String, RenderError>;

    /// The template source, used to point users at the template in error messages
    fn source(&self, role: TemplateRole) -> &str;
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Invalid {role} template (template was '{template}')")]
    Syntax {
        role: TemplateRole,
        template: String,
        source: minijinja::Error,
    },
    #[error("Undefined value in {role} template at '{field}' (template was '{template}')")]
    Undefined {
        role: TemplateRole,
        /// Template text of the failing lookup, e.g. `.metadata.role`
        field: String,
        template: String,
        source: minijinja::Error,
    },
    #[error("Error rendering {role} template (template was '{template}')")]
    Failed {
        role: TemplateRole,
        template: String,
        source: minijinja::Error,
    },
}

impl RenderError {
    fn new(role: TemplateRole, template: &str, source: minijinja::Error) -> Self {
        match source.kind() {
            ErrorKind::UndefinedError => RenderError::Undefined {
                role,
                field: source
                    .range()
                    .and_then(|range| template.get(range))
                    .unwrap_or("?")
                    .to_string(),
                template: template.to_string(),
                source,
            },
            ErrorKind::SyntaxError => RenderError::Syntax {
                role,
                template: template.to_string(),
                source,
            },
            _ => RenderError::Failed {
                role,
                template: template.to_string(),
                source,
            },
        }
    }

    pub fn role(&self) -> TemplateRole {
        match self {
            RenderError::Syntax { role, .. }
            | RenderError::Undefined { role, .. }
            | RenderError::Failed { role, .. } => *role,
        }
    }
}

/// [Render] implementation backed by [minijinja]
///
/// All templates are compiled up front, so syntax errors are reported before any
/// resource is processed.
pub struct Renderer<'s> {
    env: Environment<'s>,
    templates: &'s TemplateSet,
}

impl<'s> Renderer<'s> {
    pub fn new(templates: &'s TemplateSet, options: RenderOptions) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_trim_blocks(options.trim_blocks);
        env.set_lstrip_blocks(options.lstrip_blocks);
        env.set_undefined_behavior(if options.strict_undefined {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });
        env.set_auto_escape_callback(|_name| AutoEscape::None);
        env.set_formatter(python_formatter);
        env.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);
        env.add_filter("default", default_filter);

        for role in TemplateRole::ALL {
            let source = templates.source(role);
            env.add_template(role.name(), source)
                .map_err(|err| RenderError::new(role, source, err))?;
        }

        tracing::trace!(?options, "template environment ready");
        Ok(Self { env, templates })
    }
}

impl Render for Renderer<'_> {
    fn render(&self, role: TemplateRole, binding: &Binding<'_>) -> Result<String, RenderError> {
        self.env
            .get_template(role.name())
            .and_then(|template| template.render(binding))
            .map_err(|err| RenderError::new(role, self.source(role), err))
    }

    fn source(&self, role: TemplateRole) -> &str {
        self.templates.source(role)
    }
}

/// Prints scalars the way python's `str()` does
fn python_formatter(out: &mut Output, state: &State, value: &Value) -> Result<(), minijinja::Error> {
    match value.kind() {
        minijinja::value::ValueKind::Bool if value.is_true() => out.write_str("True")?,
        minijinja::value::ValueKind::Bool => out.write_str("False")?,
        minijinja::value::ValueKind::None => out.write_str("None")?,
        _ => return minijinja::escape_formatter(out, state, value),
    }
    Ok(())
}

/// `default(value, default_value='', boolean=false)`
///
/// With `boolean` set, falsy values are replaced as well.
fn default_filter(value: Value, default_value: Option<Value>, boolean: Option<bool>) -> Value {
    if value.is_undefined() || (boolean.unwrap_or(false) && !value.is_true()) {
        default_value.unwrap_or_else(|| Value::from(""))
    } else {
        value
    }
}
