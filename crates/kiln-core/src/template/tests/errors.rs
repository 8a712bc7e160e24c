//! Error handling tests

use super::helpers::{ROOT, config, engine, render_page};
use super::*;
use crate::cache::{RendererSlot, TemplateCache};
use crate::config::Delimiters;
use crate::path::PathResolver;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn page_path() -> PathBuf {
    PathBuf::from(format!("{}/page.kiln", ROOT))
}

/// Unwrap a `Syntax` error into `(offset, line, message)`
fn syntax(result: crate::error::Result<String>) -> (usize, usize, String) {
    match result {
        Err(TemplateError::Syntax {
            path,
            offset,
            line,
            message,
        }) => {
            assert_eq!(path, page_path());
            (offset, line, message)
        }
        other => panic!("Expected Syntax error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_unmatched_close() {
    let (offset, line, message) = syntax(render_page("text %> more", &json!({})).await);
    assert_eq!(offset, 5);
    assert_eq!(line, 1);
    assert!(message.contains("Unexpected '%>'"));
}

#[tokio::test]
async fn test_error_missing_close_at_eof() {
    let (offset, _, message) = syntax(render_page("a\nb <%= c", &json!({})).await);
    assert_eq!(offset, 4);
    assert!(message.contains("Missing '%>'"));
}

#[tokio::test]
async fn test_error_message_names_template() {
    let err = render_page("%>", &json!({})).await.unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("SYNTAX_ERROR:"));
    assert!(message.contains("page.kiln"));
}

#[tokio::test]
async fn test_error_unparsable_expression() {
    let (offset, line, message) = syntax(render_page("ok\n<%= a + %>", &json!({})).await);
    assert_eq!(offset, 3);
    assert_eq!(line, 2);
    assert!(message.contains("a +"));
}

#[tokio::test]
async fn test_error_unclosed_block() {
    let (offset, _, message) =
        syntax(render_page("x<% if a %>y<% for b in c %>z<% end %>", &json!({})).await);
    assert_eq!(offset, 1);
    assert!(message.contains("Missing 'end' for 'if'"));
}

#[tokio::test]
async fn test_error_stray_end_and_else() {
    let (_, _, message) = syntax(render_page("<% end %>", &json!({})).await);
    assert!(message.contains("'end' without an open block"));

    let (_, _, message) = syntax(render_page("<% for x in xs %><% else %><% end %>", &json!({})).await);
    assert!(message.contains("'else' without 'if'"));

    let (_, _, message) =
        syntax(render_page("<% if a %><% else %><% else %><% end %>", &json!({})).await);
    assert!(message.contains("'else' after 'else'"));
}

#[tokio::test]
async fn test_error_runtime_carries_line() {
    let result = render_page("line 1\nline 2 <%= user.name.first %>", &json!({"user": {}})).await;
    match result {
        Err(TemplateError::Runtime {
            path,
            line,
            message,
        }) => {
            assert_eq!(path, page_path());
            assert_eq!(line, 2);
            assert!(message.contains("of null"));
        }
        other => panic!("Expected Runtime error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_runtime_inside_partial_names_partial() {
    let engine = engine(&[
        ("page.kiln", "<%@ bad %><%- render('bad') %>"),
        ("bad.kiln", "<%= 1 / 0 %>"),
    ]);
    match engine.render("page", &json!({})).await {
        Err(TemplateError::Runtime { path, message, .. }) => {
            assert_eq!(path, PathBuf::from(format!("{}/bad.kiln", ROOT)));
            assert!(message.contains("Division by zero"));
        }
        other => panic!("Expected Runtime error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_iterating_non_collection() {
    let result = render_page("<% for x in n %><% end %>", &json!({"n": 3})).await;
    assert!(matches!(result, Err(TemplateError::Runtime { line: 1, .. })));
}

#[tokio::test]
async fn test_error_missing_root_template() {
    let engine = engine(&[]);
    match engine.render("ghost", &json!({})).await {
        Err(TemplateError::Io { path, source }) => {
            assert_eq!(path, PathBuf::from(format!("{}/ghost.kiln", ROOT)));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("Expected Io error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_compile_leaves_no_renderer() {
    let engine = engine(&[("page.kiln", "<% if a %>")]);
    assert!(engine.render("page", &json!({})).await.is_err());

    let stats = engine.cache_stats();
    assert_eq!(stats.texts, 1);
    assert_eq!(stats.renderers, 0);
}

#[test]
fn test_error_compile_before_load() {
    let mut cache = TemplateCache::new();
    let path = PathResolver::new(ROOT, ".kiln").resolve("page");

    match compile(&mut cache, &Delimiters::default(), &path) {
        Err(TemplateError::LoadOrder { path: failed }) => assert_eq!(failed, page_path()),
        other => panic!("Expected LoadOrder error, got {:?}", other),
    }
}

#[test]
fn test_compile_while_in_progress_yields_empty_renderer() {
    let mut cache = TemplateCache::new();
    let path = PathResolver::new(ROOT, ".kiln").resolve("page");
    cache.insert_text(path.clone(), Arc::from("text <%= x %>"));
    cache.begin(path.clone());

    let renderer = compile(&mut cache, &Delimiters::default(), &path).unwrap();

    assert!(renderer.nodes().is_empty());
    assert_eq!(renderer.path(), &path);
    assert!(matches!(cache.renderer(&path), Some(RendererSlot::InProgress)));
    assert_eq!(cache.stats().renderers, 1);
}

#[test]
fn test_error_invalid_config_rejected_by_engine() {
    let result = Engine::with_source(
        config().with_delimiters(Delimiters::pair("<%", "<%")),
        crate::loader::MemorySource::new(),
    );
    assert!(matches!(result, Err(TemplateError::ConfigInvalid(_))));
}
