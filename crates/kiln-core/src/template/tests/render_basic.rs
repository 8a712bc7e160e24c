//! Basic rendering tests

use super::helpers::{config, engine, engine_with, render_page, source};
use super::*;
use crate::config::Delimiters;
use serde_json::json;

#[tokio::test]
async fn test_render_without_directives_is_identity() {
    let template = "<html>\n  <p>100% plain & simple > text</p>\n</html>\n";
    assert_eq!(render_page(template, &json!({})).await.unwrap(), template);
}

#[tokio::test]
async fn test_render_placeholders() {
    let result = render_page("Hello, <%= name %>! You have <%= count %> items.", &json!({"name": "Ada", "count": 3}))
        .await
        .unwrap();
    assert_eq!(result, "Hello, Ada! You have 3 items.");
}

#[tokio::test]
async fn test_render_nested_access() {
    let locals = json!({"paper": {"title": "Notes", "authors": [{"name": "Ada"}, {"name": "Grace"}]}});
    let result = render_page("<%= paper.title %> by <%= paper.authors[1].name %>", &locals)
        .await
        .unwrap();
    assert_eq!(result, "Notes by Grace");
}

#[tokio::test]
async fn test_render_value_conversions() {
    let locals = json!({"n": null, "f": 2.0, "x": 2.5, "b": false, "list": [1, 2], "obj": {"k": "v"}});
    let result = render_page("<%= n %>|<%= f %>|<%= x %>|<%= b %>|<%= list %>|<%- obj %>", &locals)
        .await
        .unwrap();
    assert_eq!(result, r#"null|2|2.5|false|1,2|{"k":"v"}"#);
}

#[tokio::test]
async fn test_render_expressions() {
    let result = render_page("<%= price * qty %> <%= upper(name) %> <%= len(tags) %>", &json!({"price": 3, "qty": 4, "name": "kiln", "tags": ["a", "b"]}))
        .await
        .unwrap();
    assert_eq!(result, "12 KILN 2");
}

#[tokio::test]
async fn test_render_let_binding() {
    let result = render_page("<% let total = a + b %>total=<%= total %>", &json!({"a": 1, "b": 2}))
        .await
        .unwrap();
    assert_eq!(result, "total=3");
}

#[tokio::test]
async fn test_render_empty_statement_produces_nothing() {
    assert_eq!(render_page("a<% %>b", &json!({})).await.unwrap(), "ab");
}

#[tokio::test]
async fn test_declaration_leaves_no_trace() {
    let engine = engine(&[("page.kiln", "top<%@ part %>bottom"), ("part.kiln", "PART")]);
    assert_eq!(engine.render("page", &json!({})).await.unwrap(), "topbottom");
}

#[tokio::test]
async fn test_delimiter_escapes_render_literally() {
    let result = render_page("<%% if x %%> stays text", &json!({})).await.unwrap();
    assert_eq!(result, "<% if x %> stays text");
}

#[tokio::test]
async fn test_render_reference_with_extension() {
    let engine = engine(&[("page.kiln", "ok")]);
    assert_eq!(engine.render("page.kiln", &json!({})).await.unwrap(), "ok");
    assert_eq!(engine.render("/views/page", &json!({})).await.unwrap(), "ok");
}

#[tokio::test]
async fn test_render_custom_extension() {
    let engine = engine_with(config().with_extension("html"), &[("page.html", "<%= 1 + 1 %>")]);
    assert_eq!(engine.render("page", &json!({})).await.unwrap(), "2");
}

#[tokio::test]
async fn test_render_sigil_delimiters() {
    let engine = engine_with(
        config().with_delimiters(Delimiters::sigil('$')),
        &[("page.kiln", "$@ part$Cost: $$$= price$ $- render('part')$"), ("part.kiln", "[$= price * 2$]")],
    );
    let result = engine.render("page", &json!({"price": 5})).await.unwrap();
    assert_eq!(result, "Cost: $5 [10]");
}

#[tokio::test]
async fn test_renderer_is_cached_between_renders() {
    let engine = engine(&[("page.kiln", "<%= v %>")]);
    assert_eq!(engine.render("page", &json!({"v": 1})).await.unwrap(), "1");
    assert_eq!(engine.render("page", &json!({"v": 2})).await.unwrap(), "2");

    let stats = engine.cache_stats();
    assert_eq!(stats.texts, 1);
    assert_eq!(stats.renderers, 1);

    engine.clear_cache();
    assert!(engine.cache_stats().is_empty());
}

#[tokio::test]
async fn test_cached_text_survives_source_changes() {
    let source = source(&[("page.kiln", "first")]);
    let engine = Engine::with_source(config(), source.clone()).unwrap();

    assert_eq!(engine.render("page", &json!({})).await.unwrap(), "first");
    source.insert("/views/page.kiln", "second");
    assert_eq!(engine.render("page", &json!({})).await.unwrap(), "first");
    assert_eq!(source.read_count(), 1);
}

#[tokio::test]
async fn test_disabled_cache_rereads_and_stays_empty() {
    let source = source(&[("page.kiln", "<%@ part %><%- render('part') %>"), ("part.kiln", "v1")]);
    let engine = Engine::with_source(config().with_caching(false), source.clone()).unwrap();

    let first = engine.render("page", &json!({})).await.unwrap();
    assert!(engine.cache_stats().is_empty());
    let second = engine.render("page", &json!({})).await.unwrap();
    assert!(engine.cache_stats().is_empty());

    assert_eq!(first, "v1");
    assert_eq!(first, second);
    assert_eq!(source.read_count(), 4);

    source.insert("/views/part.kiln", "v2");
    assert_eq!(engine.render("page", &json!({})).await.unwrap(), "v2");
}

#[tokio::test]
async fn test_disabled_cache_stays_empty_after_failure() {
    let engine = engine_with(config().with_caching(false), &[("page.kiln", "<%= missing %>")]);
    assert!(engine.render("page", &json!({})).await.is_err());
    assert!(engine.cache_stats().is_empty());
}
