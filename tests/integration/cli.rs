use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use viewscan::config::ViewConfig;
use viewscan::test_utils::TemplateTree;

fn viewscan(tree: &TemplateTree) -> Command {
    let mut cmd = Command::cargo_bin("viewscan").unwrap();
    cmd.current_dir(tree.root()).env("NO_COLOR", "1").env_remove("VIEWSCAN_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn project() -> TemplateTree {
    let tree = TemplateTree::new();
    tree.write("src/app/views/layout.html.tera", "<html>{{ content | safe }}</html>")
        .write("src/app/views/nav.html.tera", "<nav></nav>")
        .write(
            "src/pages/views/home.html.tera",
            r#"{{ template "app/views/nav.html.tera" . }}<h1>{{ title | default(value="Home") }}</h1>"#,
        );
    tree
}

#[test]
fn test_scan_lists_templates_as_text() {
    let tree = project();
    viewscan(&tree)
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("pages/views/home.html.tera [markup]"))
        .stdout(predicate::str::contains("  includes: app/views/nav.html.tera"))
        .stdout(predicate::str::contains("3 template(s)"));
}

#[test]
fn test_scan_json_output() {
    let tree = project();
    let output = viewscan(&tree).args(["scan", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2]["path"], "pages/views/home.html.tera");
    assert_eq!(entries[2]["dependencies"][0], "app/views/nav.html.tera");
    assert_eq!(entries[1]["cache_key"].as_str().unwrap().len(), 64);
}

#[test]
fn test_scan_empty_root() {
    let tree = TemplateTree::new();
    tree.write("templates/readme.md", "not a template");
    viewscan(&tree)
        .args(["scan", "templates"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No templates found."));
}

#[test]
fn test_scan_missing_root_fails() {
    let tree = TemplateTree::new();
    viewscan(&tree)
        .args(["scan", "does-not-exist"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_render_with_context_and_default_layout() {
    let tree = project();
    tree.write("context.json", r#"{ "title": "Hello & welcome" }"#);

    viewscan(&tree)
        .args(["render", "pages/views/home.html.tera", "--context", "context.json"])
        .assert()
        .success()
        .stdout("<html><nav></nav><h1>Hello &amp; welcome</h1></html>");
}

#[test]
fn test_render_without_layout() {
    let tree = project();
    viewscan(&tree)
        .args(["render", "pages/views/home.html.tera", "--no-layout"])
        .assert()
        .success()
        .stdout("<nav></nav><h1>Home</h1>");
}

#[test]
fn test_render_into_named_layout() {
    let tree = project();
    tree.write("src/admin/views/layout.html.tera", "<div>{{ content | safe }}</div>");

    viewscan(&tree)
        .args(["render", "app/views/nav.html.tera", "--layout", "admin/views/layout.html.tera"])
        .assert()
        .success()
        .stdout("<div><nav></nav></div>");
}

#[test]
fn test_render_layout_flags_conflict() {
    let tree = project();
    viewscan(&tree)
        .args(["render", "app/views/nav.html.tera", "--no-layout", "--layout", "x"])
        .assert()
        .failure();
}

#[test]
fn test_render_unknown_template_suggests_match() {
    let tree = project();
    viewscan(&tree)
        .args(["render", "pages/views/hom.html.tera"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Did you mean 'pages/views/home.html.tera'?"));
}

#[test]
fn test_render_rejects_non_object_context() {
    let tree = project();
    tree.write("context.json", "[1, 2]");
    viewscan(&tree)
        .args(["render", "app/views/nav.html.tera", "--context", "context.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must contain a JSON object"));
}

#[test]
fn test_sanitize_stdin_with_default_policy() {
    let tree = TemplateTree::new();
    viewscan(&tree)
        .arg("sanitize")
        .write_stdin("<p onclick=\"x()\">Hi <b>there</b></p><script>x()</script>")
        .assert()
        .success()
        .stdout("<p>Hi <b>there</b></p>");
}

#[test]
fn test_sanitize_strip_and_tag_overrides() {
    let tree = TemplateTree::new();
    viewscan(&tree)
        .args(["sanitize", "--strip"])
        .write_stdin("<p>Hi <b>there</b></p>")
        .assert()
        .success()
        .stdout("Hi there");

    viewscan(&tree)
        .args(["sanitize", "--tags", "b"])
        .write_stdin("<p>Hi <b>there</b></p>")
        .assert()
        .success()
        .stdout("Hi <b>there</b>");
}

#[test]
fn test_sanitize_reads_file() {
    let tree = TemplateTree::new();
    tree.write("input.html", "<em>kept</em><iframe>dropped</iframe>");
    viewscan(&tree)
        .args(["sanitize", "input.html"])
        .assert()
        .success()
        .stdout("<em>kept</em>");
}

#[test]
fn test_config_from_environment() {
    let tree = TemplateTree::new();
    tree.write("views/a.text.tera", "a")
        .write("settings/viewscan.toml", "roots = [\"../views\"]\n");

    viewscan(&tree)
        .arg("scan")
        .env("VIEWSCAN_CONFIG", tree.path("settings/viewscan.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("a.text.tera [text]"))
        .stdout(predicate::str::contains("1 template(s)"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let tree = project();
    viewscan(&tree)
        .args(["--config", "missing.toml", "scan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
#[serial]
fn test_default_config_file_in_working_directory() {
    let tree = TemplateTree::new();
    tree.write("viewscan.toml", "roots = [\"views\"]\nproduction = true\n");

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(tree.root()).unwrap();
    let loaded = ViewConfig::load_with_optional(None);
    std::env::set_current_dir(previous).unwrap();

    let config = loaded.unwrap();
    assert!(config.production);
    assert_eq!(config.roots.len(), 1);
    assert!(config.roots[0].ends_with("views"));
}
