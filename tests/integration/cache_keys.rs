use std::collections::HashMap;

use viewscan::templating::{ViewGeneration, base_key};
use viewscan::test_utils::TemplateTree;

const LAYOUT: &str = "app/views/layout.html.tera";
const HEADER: &str = "app/views/header.html.tera";
const NAV: &str = "app/views/nav.html.tera";
const FOOTER: &str = "app/views/footer.html.tera";
const STANDALONE: &str = "app/views/standalone.html.tera";

fn include(path: &str) -> String {
    format!(r#"{{{{ template "{path}" . }}}}"#)
}

/// layout -> header -> nav, layout -> footer, standalone.
fn site() -> TemplateTree {
    let tree = TemplateTree::new();
    tree.write(LAYOUT, &format!("<body>{}{{{{ content | safe }}}}{}</body>", include(HEADER), include(FOOTER)))
        .write(HEADER, &format!("<header>{}</header>", include(NAV)))
        .write(NAV, "<nav>home</nav>")
        .write(FOOTER, "<footer>2024</footer>")
        .write(STANDALONE, "<p>alone</p>");
    tree
}

fn all_keys(generation: &ViewGeneration) -> HashMap<String, String> {
    generation
        .registry()
        .paths()
        .into_iter()
        .map(|path| (path.to_string(), generation.cache_key(path).unwrap().to_string()))
        .collect()
}

fn changed(before: &HashMap<String, String>, after: &HashMap<String, String>) -> Vec<String> {
    let mut paths: Vec<String> =
        before.iter().filter(|(path, key)| after.get(*path) != Some(key)).map(|(path, _)| path.clone()).collect();
    paths.sort();
    paths
}

#[test]
fn test_changing_unreferenced_leaf_changes_only_its_key() {
    let tree = site();
    let before = all_keys(&tree.scan().unwrap());

    tree.write(STANDALONE, "<p>changed</p>");
    let after = all_keys(&tree.scan().unwrap());

    assert_eq!(changed(&before, &after), vec![STANDALONE.to_string()]);
}

#[test]
fn test_changing_included_template_propagates_to_ancestors() {
    let tree = site();
    let before = all_keys(&tree.scan().unwrap());

    tree.write(NAV, "<nav>home | about</nav>");
    let after = all_keys(&tree.scan().unwrap());

    assert_eq!(changed(&before, &after), vec![HEADER.to_string(), LAYOUT.to_string(), NAV.to_string()]);
}

#[test]
fn test_leaf_key_is_path_and_content_hash() {
    let tree = site();
    let generation = tree.scan().unwrap();
    assert_eq!(generation.cache_key(NAV).unwrap(), base_key(NAV, "<nav>home</nav>"));
}

#[test]
fn test_include_order_matters() {
    let tree = TemplateTree::new();
    tree.write("a.text.tera", "a").write("b.text.tera", "b");

    tree.write("page.text.tera", &format!("{}{}", include("a.text.tera"), include("b.text.tera")));
    let forward = tree.scan().unwrap().cache_key("page.text.tera").unwrap().to_string();

    tree.write("page.text.tera", &format!("{}{}", include("b.text.tera"), include("a.text.tera")));
    let reverse = tree.scan().unwrap().cache_key("page.text.tera").unwrap().to_string();

    assert_ne!(forward, reverse);
}

#[test]
fn test_keys_respect_configured_maximum() {
    let tree = TemplateTree::new();
    let mut page = String::new();
    for i in 0..10 {
        let partial = format!("partials/p{i}.text.tera");
        tree.write(&partial, &format!("partial {i}"));
        page.push_str(&include(&partial));
    }
    tree.write("page.text.tera", &page);

    for max in [64, 100, 250, 1000] {
        let generation = tree.scanner().with_max_cache_key_length(max).scan(1).unwrap();
        for (id, _) in generation.registry().iter() {
            assert!(generation.registry().cache_key(id).len() <= max, "max {max}");
        }
    }

    let roomy = tree.scanner().with_max_cache_key_length(10_000).scan(1).unwrap();
    assert_eq!(roomy.cache_key("page.text.tera").unwrap().len(), 64 + 10 * 65);
}

#[test]
fn test_mutual_includes_terminate_and_are_order_independent() {
    let tree = TemplateTree::new();
    tree.write("a.html.tera", &include("b.html.tera"))
        .write("b.html.tera", &format!("{}{}", include("a.html.tera"), include("c.html.tera")))
        .write("c.html.tera", &include("b.html.tera"))
        .write("entry.html.tera", &include("c.html.tera"));

    let orders = [
        ["a.html.tera", "b.html.tera", "c.html.tera", "entry.html.tera"],
        ["entry.html.tera", "c.html.tera", "b.html.tera", "a.html.tera"],
        ["b.html.tera", "entry.html.tera", "a.html.tera", "c.html.tera"],
    ];

    let mut results: Vec<HashMap<&str, String>> = Vec::new();
    for order in orders {
        let generation = tree.scan().unwrap();
        let keys = order
            .iter()
            .map(|path| (*path, generation.cache_key(path).unwrap().to_string()))
            .collect();
        results.push(keys);
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], results[2]);
}

#[test]
fn test_cycle_member_change_changes_every_member() {
    let tree = TemplateTree::new();
    tree.write("a.text.tera", &format!("A{}", include("b.text.tera")))
        .write("b.text.tera", &format!("B{}", include("a.text.tera")));
    let before = all_keys(&tree.scan().unwrap());

    tree.write("b.text.tera", &format!("B2{}", include("a.text.tera")));
    let after = all_keys(&tree.scan().unwrap());

    assert_eq!(changed(&before, &after), vec!["a.text.tera".to_string(), "b.text.tera".to_string()]);
}

#[test]
fn test_scan_with_long_include_cycle_keys_every_template() {
    let tree = TemplateTree::new();
    let count = 40;
    let name = |i: usize| format!("partials/t{}.text.tera", i % count);
    for i in 0..count {
        tree.write(&name(i), &format!("{i}{}{}", include(&name(i + 1)), include(&name(i + 2))));
    }

    let generation = tree.scan().unwrap();
    let registry = generation.registry();
    let keys = all_keys(&generation);
    assert_eq!(keys.len(), count);
    assert!(registry.in_cycle(registry.get(&name(0)).unwrap()));

    tree.write(&name(17), &format!("changed{}{}", include(&name(18)), include(&name(19))));
    let after = all_keys(&tree.scan().unwrap());
    assert_eq!(changed(&keys, &after).len(), count);
}
