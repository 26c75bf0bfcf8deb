//! Snapshot tests
//!
//! Runs the fixtures in /tests/fixtures/ through the pipeline with the real renderer
//! and compares the `--list` output.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use yaosadis::pipeline::{Pipeline, PipelineError};
use yaosadis::resource::Resources;
use yaosadis::template::{RenderError, RenderOptions, Renderer, TemplateRole, TemplateSet};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("YAOSADIS_LOG"))
        .with_writer(std::io::stderr)
        .try_init();
}

fn fixture(name: &str) -> Resources {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    Resources::load_file(&path).expect("fixture must load")
}

fn process(
    resources: &Resources,
    templates: &TemplateSet,
) -> Result<yaosadis::inventory::Inventory, PipelineError> {
    init_tracing();
    let renderer = Renderer::new(templates, RenderOptions::default()).expect("valid templates");
    Pipeline::new(&renderer).process(resources)
}

#[test]
fn default_templates() {
    let inventory = process(&fixture("single.info"), &TemplateSet::default()).unwrap();

    assert_eq!(
        serde_json::to_string(&inventory.list()).unwrap(),
        r#"{"all":{"hosts":["r1"]},"_meta":{"hostvars":{"r1":{"ansible_host":"","os_type":"instance","os_name":"web1"}}}}"#
    );
    assert_eq!(
        serde_json::to_value(inventory.host("r1")).unwrap(),
        json!({"ansible_host": "", "os_type": "instance", "os_name": "web1"})
    );
    assert!(inventory.host("r2").is_empty());
}

#[test]
fn groups_and_structured_host_vars() {
    let templates = TemplateSet {
        inventory_name: "{{ resource.name }}".to_string(),
        groups: "all\n{{ resource.metadata.role }}\n{% for g in resource.security_groups %}sg_{{ g }}\n{% endfor %}".to_string(),
        ..Default::default()
    };
    let inventory = process(&fixture("openstack.info"), &templates).unwrap();

    insta::assert_json_snapshot!(inventory.list(), @r###"
    {
      "all": {
        "hosts": [
          "web1",
          "db1"
        ]
      },
      "web": {
        "hosts": [
          "web1"
        ]
      },
      "sg_default": {
        "hosts": [
          "web1",
          "db1"
        ]
      },
      "sg_web": {
        "hosts": [
          "web1"
        ]
      },
      "db": {
        "hosts": [
          "db1"
        ]
      },
      "_meta": {
        "hostvars": {
          "web1": {
            "ansible_host": "10.0.0.5",
            "os_type": "instance",
            "os_name": "web1",
            "os_accessIPv4": "10.0.0.5",
            "os_metadata": {
              "role": "web"
            },
            "os_security_groups": [
              "default",
              "web"
            ]
          },
          "db1": {
            "ansible_host": "fd00::2",
            "os_type": "instance",
            "os_name": "db1",
            "os_accessIPv6": "fd00::2",
            "os_accessIPv4": "10.0.0.6",
            "os_metadata": {
              "role": "db"
            },
            "os_security_groups": [
              "default"
            ]
          }
        }
      }
    }
    "###);
}

#[test]
fn every_host_is_in_each_of_its_groups() {
    let templates = TemplateSet {
        groups: "{{ resource.metadata.role }}\nall".to_string(),
        ..Default::default()
    };
    let inventory = process(&fixture("openstack.info"), &templates).unwrap();

    for (inventory_name, _) in inventory.hosts() {
        let member_of: Vec<_> = inventory
            .groups()
            .iter()
            .filter(|(_, group)| group.hosts.contains(inventory_name))
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(member_of.len(), 2, "{inventory_name} in {member_of:?}");
        assert!(member_of.contains(&"all"));
    }
    assert_eq!(inventory.hosts().len(), 2);
}

#[test]
fn duplicate_inventory_names_abort() {
    let templates = TemplateSet {
        inventory_name: "dup".to_string(),
        ..Default::default()
    };
    let err = process(&fixture("openstack.info"), &templates).unwrap_err();

    assert!(matches!(
        &err,
        PipelineError::DuplicateInventoryName { inventory_name, uuid }
            if inventory_name == "dup" && uuid == "9e02a7f1-3c4b-4d8e-a6f0-5b7c8d9e0f32"
    ));
}

#[test]
fn unexpected_filter_result_aborts() {
    let templates = TemplateSet {
        filter: "maybe".to_string(),
        ..Default::default()
    };
    let err = process(&fixture("single.info"), &templates).unwrap_err();

    assert!(matches!(
        &err,
        PipelineError::UnexpectedFilterResult { value, .. } if value == "maybe"
    ));
}

#[test]
fn undefined_field_reports_template_role() {
    let templates = TemplateSet {
        groups: "{{ resource.metadata.role }}".to_string(),
        ..Default::default()
    };
    let err = process(&fixture("single.info"), &templates).unwrap_err();

    let PipelineError::Render { uuid, source } = &err else {
        panic!("expected render error, got {err:?}");
    };
    assert_eq!(uuid, "r1");
    assert_eq!(source.role(), TemplateRole::Groups);
    assert!(matches!(
        source,
        RenderError::Undefined { field, template, .. }
            if field.contains("metadata.role") && template == "{{ resource.metadata.role }}"
    ));
    assert!(source.to_string().contains("metadata.role"));
}

#[test]
fn malformed_input_is_rejected() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/malformed.info");
    let err = Resources::load_file(&path).unwrap_err();
    assert!(matches!(err, yaosadis::resource::LoadError::Json(_)));
}
