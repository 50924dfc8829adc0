use std::sync::Arc;
use std::thread;

use tera::Context;
use viewscan::core::ViewError;
use viewscan::templating::{RenderSettings, Scanner, ViewSet};
use viewscan::test_utils::TemplateTree;

#[test]
fn test_failed_reload_publishes_nothing() {
    let tree = TemplateTree::new();
    tree.write("app/views/a.html.tera", "a");
    let views = tree.view_set(true).unwrap();
    let before = views.current();

    tree.write("app/views/b.html.tera", "{% endif %}");
    let err = views.reload().unwrap_err();
    assert!(err.is_scan_error());

    let after = views.current();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(!after.contains("app/views/b.html.tera"));

    tree.write("app/views/b.html.tera", "b");
    let fixed = views.reload().unwrap();
    assert_eq!(fixed.number(), before.number() + 1);
    assert!(fixed.contains("app/views/b.html.tera"));
}

#[test]
fn test_collision_during_reload_keeps_previous_generation() {
    let first = TemplateTree::new();
    let second = TemplateTree::new();
    first.write("app/views/a.html.tera", "first");
    second.write("admin/views/b.html.tera", "second");

    let scanner = Scanner::new([first.root(), second.root()]);
    let views = ViewSet::load(scanner, RenderSettings::default()).unwrap();
    let key = views.current().cache_key("app/views/a.html.tera").unwrap().to_string();

    second.write("app/views/a.html.tera", "collides");
    assert!(matches!(views.reload(), Err(ViewError::DuplicateTemplate { .. })));

    let current = views.current();
    assert_eq!(current.number(), 1);
    assert_eq!(current.cache_key("app/views/a.html.tera").unwrap(), key);
}

#[test]
fn test_removed_template_disappears_after_reload() {
    let tree = TemplateTree::new();
    tree.write("a.text.tera", "a").write("b.text.tera", "b");
    let views = tree.view_set(true).unwrap();

    tree.remove("b.text.tera");
    let generation = views.reload().unwrap();
    assert!(!generation.contains("b.text.tera"));
    assert!(matches!(
        generation.lookup("b.text.tera"),
        Err(ViewError::TemplateNotFound { .. })
    ));
}

#[test]
fn test_readers_see_whole_generations_during_reloads() {
    let tree = TemplateTree::new();
    tree.write("greeting.text.tera", r#"{{ template "name.text.tera" . }}"#)
        .write("name.text.tera", "v0");
    let views = Arc::new(tree.view_set(true).unwrap());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let views = Arc::clone(&views);
            thread::spawn(move || {
                let mut last_number = 0;
                for _ in 0..200 {
                    let generation = views.current();
                    assert!(generation.number() >= last_number);
                    last_number = generation.number();

                    let rendered = generation.execute("greeting.text.tera", &Context::new()).unwrap();
                    let expected = generation.registry().get("name.text.tera").unwrap().source();
                    assert_eq!(rendered, expected);
                    assert!(generation.cache_key("greeting.text.tera").is_some());
                }
            })
        })
        .collect();

    for version in 1..=20 {
        tree.write("name.text.tera", &format!("v{version}"));
        views.reload().unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(views.current().number(), 21);
}

#[test]
fn test_concurrent_reloads_are_serialized() {
    let tree = TemplateTree::new();
    tree.write("a.text.tera", "a");
    let views = Arc::new(tree.view_set(true).unwrap());

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let views = Arc::clone(&views);
            thread::spawn(move || {
                for _ in 0..5 {
                    views.reload().unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(views.current().number(), 1 + 4 * 5);
}
