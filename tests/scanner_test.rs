//! Integration tests for unit discovery
//!
//! Scans mixed repositories laid out like a real monorepo:
//! - Each toolchain is recognised by its manifest
//! - Dependencies link within a kind only
//! - Config ignore and exclude lists are honoured

mod common;

use common::TestProject;
use geppetto::core::config::ProjectConfig;
use geppetto::core::resolver::DependencyGraph;
use geppetto::core::unit::UnitKind;
use geppetto::scanner::Scanner;

fn monorepo() -> TestProject {
    let project = TestProject::new();
    project.add_package("libraries/ui", "@org/ui", &[], false);
    project.add_package("services/web", "@org/web", &["@org/ui", "react"], true);
    project.add_chart("charts/database", "database", &[]);
    project.add_chart("charts/platform", "platform", &["database"]);
    project.add_module("libs/auth", "example.com/libs/auth", &[], false);
    project.add_module(
        "services/api",
        "example.com/services/api",
        &["example.com/libs/auth", "github.com/gin-gonic/gin"],
        true,
    );
    project
}

#[test]
fn test_scan_monorepo() {
    let project = monorepo();
    let units = Scanner::from_config(&ProjectConfig::default())
        .scan(&project.path())
        .unwrap();

    assert_eq!(units.len(), 6);
    let find = |name: &str| units.iter().find(|u| u.name == name).unwrap();

    let web = find("@org/web");
    assert_eq!(web.kind, UnitKind::Npm);
    assert!(web.application);
    assert_eq!(web.depends_on, vec!["@org/ui"]);

    let platform = find("platform");
    assert_eq!(platform.kind, UnitKind::Helm);
    assert_eq!(platform.depends_on, vec!["database"]);

    let api = find("example.com/services/api");
    assert_eq!(api.kind, UnitKind::Go);
    assert!(api.application);
    assert_eq!(api.depends_on, vec!["example.com/libs/auth"]);
    assert!(!find("example.com/libs/auth").application);

    assert!(DependencyGraph::from_units(&units).unwrap().validate().is_ok());
}

#[test]
fn test_scan_order_is_deterministic() {
    let project = monorepo();
    let scanner = Scanner::from_config(&ProjectConfig::default());
    let names = || -> Vec<String> {
        scanner
            .scan(&project.path())
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect()
    };
    let first = names();
    let second = names();
    assert_eq!(first, second);
    assert_eq!(first[0], "database");
}

#[test]
fn test_config_ignore_and_exclude() {
    let project = monorepo();
    project.create_file(
        ".geppetto.toml",
        r#"
[scan]
ignore = ["charts"]

[units]
exclude = ["@org/ui"]
"#,
    );
    let config = ProjectConfig::load(&project.path()).unwrap();

    let units = Scanner::from_config(&config).scan(&project.path()).unwrap();

    assert!(units.iter().all(|u| u.kind != UnitKind::Helm));
    let web = units.iter().find(|u| u.name == "@org/web").unwrap();
    assert!(web.depends_on.is_empty());
    assert!(!units.iter().any(|u| u.name == "@org/ui"));
}

#[test]
fn test_default_ignores_skip_dependencies_and_stamps() {
    let project = TestProject::new();
    project.add_package("app", "app", &["left-pad"], false);
    project.add_package("app/node_modules/left-pad", "left-pad", &[], false);
    project.add_package(".geppetto/cache", "cached", &[], false);

    let units = Scanner::from_config(&ProjectConfig::default())
        .scan(&project.path())
        .unwrap();

    assert_eq!(units.len(), 1);
    assert!(units[0].depends_on.is_empty());
}

#[test]
fn test_nested_manifest_belongs_to_parent() {
    use assert_fs::prelude::*;

    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("chart/Chart.yaml")
        .write_str("name: chart\nversion: 0.1.0\n")
        .unwrap();
    temp.child("chart/charts/sub/Chart.yaml")
        .write_str("name: sub\nversion: 0.1.0\n")
        .unwrap();
    temp.child("tool/go.mod")
        .write_str("module example.com/tool\n")
        .unwrap();

    let units = Scanner::from_config(&ProjectConfig::default())
        .scan(temp.path())
        .unwrap();

    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["chart", "example.com/tool"]);
    temp.child(".geppetto").assert(predicates::path::missing());
}
