use serde_json::json;
use tera::Context;
use viewscan::core::ViewError;
use viewscan::sanitize::SanitizePolicy;
use viewscan::templating::{RenderSettings, Renderer, TemplateHelpers, ViewSet};
use viewscan::test_utils::TemplateTree;

fn blog() -> TemplateTree {
    let tree = TemplateTree::new();
    tree.write(
        "app/views/layout.html.tera",
        r#"<html>{{ template "app/views/header.html.tera" . }}<main>{{ content | safe }}</main></html>"#,
    )
    .write("app/views/header.html.tera", "<header>{{ site }}</header>")
    .write("pages/views/home.html.tera", "<h1>Welcome</h1>")
    .write(
        "posts/views/show.html.tera",
        r#"<article><h2>{{ post.title }}</h2>{{ post.body | sanitize }}</article>"#,
    )
    .write(
        "posts/views/index.json.tera",
        r#"[{% for post in posts %}{"title": {{ post.title | json_encode() | safe }}}{% if not loop.last %},{% endif %}{% endfor %}]"#,
    )
    .write(
        "reports/views/posts.csv.tera",
        "title,words\n{% for post in posts %}{{ post.title }},{{ post.words }}\n{% endfor %}",
    )
    .write("admin/views/layout.html.tera", "<div class=\"admin\">{{ content | safe }}</div>")
    .write("admin/views/index.html.tera", "{% if dev() %}dev{% else %}prod{% endif %}");
    tree
}

#[test]
fn test_home_page_in_layout_with_include() {
    let tree = blog();
    let views = tree.view_set(true).unwrap();

    let page = Renderer::new(&views, "/").insert("site", "My <Blog>").render();
    assert_eq!(page.status, 200);
    assert_eq!(
        page.body,
        "<html><header>My &lt;Blog&gt;</header><main><h1>Welcome</h1></main></html>"
    );
}

#[test]
fn test_show_page_sanitizes_untrusted_body() {
    let tree = blog();
    let views = tree.view_set(true).unwrap();

    let post = json!({
        "title": "Hello",
        "body": "<p onclick=\"steal()\">Safe <b>text</b></p><script>steal()</script>",
    });
    let page = Renderer::new(&views, "/posts/42").insert("post", &post).insert("site", "s").render();
    assert_eq!(
        page.body,
        "<html><header>s</header><main><article><h2>Hello</h2><p>Safe <b>text</b></p></article></main></html>"
    );
}

#[test]
fn test_data_template_is_not_html_escaped() {
    let tree = blog();
    let views = tree.view_set(true).unwrap();

    let posts = json!([{ "title": "A & B" }, { "title": "<C>" }]);
    let page = Renderer::new(&views, "/posts")
        .template("posts/views/index.json.tera")
        .without_layout()
        .content_type("application/json")
        .insert("posts", &posts)
        .render();

    assert_eq!(page.content_type, "application/json; charset=utf-8");
    let parsed: serde_json::Value = serde_json::from_str(&page.body).unwrap();
    assert_eq!(parsed, json!([{ "title": "A & B" }, { "title": "<C>" }]));
}

#[test]
fn test_text_template_renders_csv() {
    let tree = blog();
    let generation = tree.scan().unwrap();

    let mut context = Context::new();
    context.insert("posts", &json!([{ "title": "One", "words": 10 }, { "title": "Two", "words": 20 }]));
    let csv = generation.execute("reports/views/posts.csv.tera", &context).unwrap();
    assert_eq!(csv, "title,words\nOne,10\nTwo,20\n");
}

#[test]
fn test_package_layout_and_dev_helper() {
    let tree = blog();

    let development = tree.view_set(false).unwrap();
    let page = Renderer::new(&development, "/admin").render();
    assert_eq!(page.body, "<div class=\"admin\">dev</div>");

    let production = tree.view_set(true).unwrap();
    let page = Renderer::new(&production, "/admin").render();
    assert_eq!(page.body, "<div class=\"admin\">prod</div>");
}

#[test]
fn test_configured_sanitizer_policy_reaches_templates() {
    let tree = TemplateTree::new();
    tree.write("x.html.tera", "{{ body | sanitize }}");

    let helpers = TemplateHelpers::new(SanitizePolicy::default().with_allowed_tags(["em"]), true);
    let views = ViewSet::load(tree.scanner().with_helpers(helpers), RenderSettings::default()).unwrap();

    let page = Renderer::new(&views, "/")
        .template("x.html.tera")
        .insert("body", "<em>a</em><p>b</p>")
        .render();
    assert_eq!(page.body, "<em>a</em>b");
}

#[test]
fn test_render_failure_uses_error_template() {
    let tree = blog();
    tree.write("app/views/500.html.tera", "<h1>Broken</h1>{% if error %}<pre>{{ error }}</pre>{% endif %}");

    let development = tree.view_set(false).unwrap();
    let page = Renderer::new(&development, "/posts/1").without_layout().render();
    assert_eq!(page.status, 500);
    assert!(page.body.starts_with("<h1>Broken</h1><pre>"), "body: {}", page.body);
}

#[test]
fn test_production_error_page_hides_error() {
    let tree = blog();
    tree.write("app/views/500.html.tera", "<h1>Broken</h1>{% if error is defined %}{{ error }}{% endif %}");

    let production = tree.view_set(true).unwrap();
    let page = Renderer::new(&production, "/posts/1").without_layout().render();
    assert_eq!(page.status, 500);
    assert_eq!(page.body, "<h1>Broken</h1>");
}

#[test]
fn test_unknown_template_suggests_close_match() {
    let tree = blog();
    let views = tree.view_set(true).unwrap();

    let err = Renderer::new(&views, "/").template("pages/views/hom.html.tera").try_render().unwrap_err();
    match err {
        ViewError::TemplateNotFound { suggestion, .. } => {
            assert_eq!(suggestion.as_deref(), Some("pages/views/home.html.tera"));
        }
        other => panic!("expected not found, got {other}"),
    }
}

#[test]
fn test_status_page_template_and_fallback() {
    let tree = blog();
    let views = tree.view_set(false).unwrap();

    let fallback = Renderer::new(&views, "/").render_status(403);
    assert_eq!(fallback.status, 403);
    assert_eq!(
        fallback.body,
        "<h1>Unauthorized</h1><p>Sorry, you don't have permission to perform that action.</p><p>Status:403</p>"
    );

    tree.write("app/views/403.html.tera", "<h1>{{ title }}</h1>{{ status }}");
    let page = Renderer::new(&views, "/").render_status(403);
    assert_eq!(page.body, "<h1>Unauthorized</h1>403");
}

#[test]
fn test_mistyped_include_is_an_execution_error() {
    let tree = TemplateTree::new();
    tree.write("app/views/page.html.tera", r#"<p>{{ template "app/views/nva.html.tera" . }}</p>"#)
        .write("app/views/nav.html.tera", "<nav></nav>")
        .write("app/views/notes.text.tera", "plain")
        .write("app/views/mixed.html.tera", r#"{{ template "app/views/notes.text.tera" . }}"#);
    let views = tree.view_set(true).unwrap();

    let err = Renderer::new(&views, "/").template("app/views/page.html.tera").without_layout().try_render();
    match err {
        Err(ViewError::RenderExecution { path, message }) => {
            assert_eq!(path, "app/views/page.html.tera");
            assert!(message.contains("app/views/nva.html.tera"), "message: {message}");
        }
        other => panic!("expected execution error, got {other:?}"),
    }

    let err = Renderer::new(&views, "/").template("app/views/mixed.html.tera").without_layout().try_render();
    assert!(matches!(err, Err(ViewError::RenderExecution { .. })));
}
