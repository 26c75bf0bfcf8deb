//! yaosadis cli interface

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use yaosadis::template::{
    RenderOptions, TemplateSet, DEFAULT_GROUPS_TEMPLATE, DEFAULT_HOST_VARS_TEMPLATE,
    DEFAULT_INVENTORY_NAME_TEMPLATE, DEFAULT_RESOURCE_FILTER_TEMPLATE,
};

/// OpenStack Ansible Inventory
///
/// Prints a single line of JSON to stdout. Exactly one of --list or --host is required.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("query").required(true).args(["list", "host"])))]
pub struct Cli {
    /// List inventory
    #[arg(long)]
    pub list: bool,

    /// Get host vars for a specific host
    #[arg(long, value_name = "INVENTORY_NAME")]
    pub host: Option<String>,

    /// Print additional debugging information to stderr
    #[arg(long)]
    pub debug: bool,

    /// Location of the resource info file
    #[arg(
        long = "info",
        value_name = "PATH",
        env = "OPENSTACK_INFO",
        default_value = "openstack.info"
    )]
    pub info: PathBuf,

    #[clap(flatten)]
    pub templates: TemplateArgs,

    #[clap(flatten)]
    pub render: RenderArgs,
}

pub enum Query {
    List,
    Host(String),
}

impl Cli {
    pub fn query(&self) -> Query {
        match &self.host {
            Some(host) if !self.list => Query::Host(host.clone()),
            _ => Query::List,
        }
    }
}

#[derive(Parser, Debug)]
pub struct TemplateArgs {
    /// Template used to generate the ansible `host` (i.e. the inventory name) from a resource
    #[arg(
        long = "ansible-inventory-name-template",
        value_name = "TEMPLATE",
        env = "OSI_ANSIBLE_INVENTORY_NAME_TEMPLATE",
        default_value = DEFAULT_INVENTORY_NAME_TEMPLATE
    )]
    pub inventory_name: String,

    /// Template used to generate newline separated `key=value` host vars from a resource
    ///
    /// Whitespace around each newline is stripped. The default maps all attributes to host
    /// vars prefixed by `os_` and sets `ansible_host` to the IP address.
    #[arg(
        long = "ansible-host-vars-template",
        value_name = "TEMPLATE",
        env = "OSI_ANSIBLE_HOST_VARS_TEMPLATE",
        default_value = DEFAULT_HOST_VARS_TEMPLATE,
        hide_default_value = true
    )]
    pub host_vars: String,

    /// Template used to generate newline separated group names for a resource
    ///
    /// Whitespace around each newline is stripped.
    #[arg(
        long = "ansible-groups-template",
        value_name = "TEMPLATE",
        env = "OSI_ANSIBLE_GROUPS_TEMPLATE",
        default_value = DEFAULT_GROUPS_TEMPLATE
    )]
    pub groups: String,

    /// Template used to filter resources, must render to either `True` or `False`
    #[arg(
        long = "ansible-resource-filter-template",
        value_name = "TEMPLATE",
        env = "OSI_ANSIBLE_RESOURCE_FILTER_TEMPLATE",
        default_value = DEFAULT_RESOURCE_FILTER_TEMPLATE
    )]
    pub filter: String,
}

impl From<TemplateArgs> for TemplateSet {
    fn from(args: TemplateArgs) -> Self {
        TemplateSet {
            filter: args.filter,
            inventory_name: args.inventory_name,
            groups: args.groups,
            host_vars: args.host_vars,
        }
    }
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Fail on any use of an undefined template variable
    #[arg(long)]
    pub strict_undefined: bool,
}

impl From<&RenderArgs> for RenderOptions {
    fn from(args: &RenderArgs) -> Self {
        RenderOptions {
            strict_undefined: args.strict_undefined,
            ..Default::default()
        }
    }
}
