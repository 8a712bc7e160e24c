//! Loading kiln.toml and rendering with the result

use kiln_core::{Delimiters, Engine, EngineConfig, TemplateError};
use kiln_testkit::TemplateTree;
use serde_json::json;

#[tokio::test]
async fn test_config_file_drives_engine() {
    let tree = TemplateTree::with_files(&[
        (
            "kiln.toml",
            r#"
enable_caching = false
template_root = "site"
template_extension = "html"
delimiters = { open = "{%", close = "%}" }
"#,
        ),
        ("site/index.html", "<p>{%= greeting %}</p> {%% raw %%}"),
    ]);

    let config = EngineConfig::load(&tree.path("kiln.toml")).unwrap();
    assert!(!config.enable_caching);
    assert_eq!(config.template_root, tree.path("site"));
    assert_eq!(config.template_extension, ".html");
    assert_eq!(config.delimiters, Delimiters::pair("{%", "%}"));

    let engine = Engine::new(config).unwrap();
    let html = engine
        .render("index", &json!({"greeting": "hello"}))
        .await
        .unwrap();
    assert_eq!(html, "<p>hello</p> {% raw %}");
}

#[test]
fn test_invalid_config_file() {
    let tree = TemplateTree::with_files(&[("kiln.toml", "delimiters = { sigil = \" \" }\n")]);
    let result = EngineConfig::load(&tree.path("kiln.toml"));
    assert!(matches!(result, Err(TemplateError::ConfigInvalid(_))));
}
