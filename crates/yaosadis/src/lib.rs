//! # yaosadis - yet another openstack ansible dynamic inventory script
//!
//! Turns a static JSON description of cloud resources into an
//! [ansible dynamic inventory](https://docs.ansible.com/ansible/latest/dev_guide/developing_inventory.html).
//!
//! ## Introduction for developers
//!
//! Read this to understand how `yaosadis` works internally.
//!
//! ### Loading resources
//!
//! The info file is a JSON object where each key is a resource identifier ("uuid") and
//! each value holds the attributes of that resource. It is loaded into
//! [resource::Resources], keeping the order of the file.
//!
//! ### Templates
//!
//! Four templates decide what ends up in the inventory (see [template::TemplateRole]).
//! Each of them is rendered once per resource against a [resource::Binding]:
//!
//! | **variable** | **content**                                     |
//! |--------------|-------------------------------------------------|
//! | `uuid`       | the resource identifier                         |
//! | `resource`   | the resource attributes, as found in the file   |
//!
//! Rendering goes through the [template::Render] trait. [template::Renderer] implements
//! it with a Jinja2 compatible engine.
//!
//! ### Processing
//!
//! see [pipeline::Pipeline::process]
//!
//! Example with the default templates:
//!
//! ```text
//! {"r1": {"type": "instance", "name": "web1"}}
//! ```
//!
//! | **template**  | **rendered**                                     |
//! |---------------|--------------------------------------------------|
//! | filter        | `True`                                           |
//! | name          | `r1`                                             |
//! | groups        | `all`                                            |
//! | host vars     | `ansible_host=` `os_type=instance` `os_name=web1`|
//!
//! Host variable values that look like a list (`[...]`) or a mapping (`{...}`) are parsed
//! by [literal::coerce], everything else stays a string.
//!
//! ### Output
//!
//! The resulting [inventory::Inventory] answers `--list` and `--host <name>`. Both
//! responses are serialized via [serde] as a single line of JSON:
//!
//! ```json
//! {"all":{"hosts":["r1"]},"_meta":{"hostvars":{"r1":{"ansible_host":"","os_type":"instance","os_name":"web1"}}}}
//! ```
//!
pub mod inventory;
pub mod literal;
pub mod pipeline;
pub mod resource;
pub mod template;
pub mod value;
