//! Output escaping tests

use super::helpers::render_page;
use serde_json::json;

const MARKUP: &str = r#"<b>"x"&'y'</b>"#;

#[tokio::test]
async fn test_escaped_output() {
    let result = render_page("<%= s %>", &json!({"s": MARKUP})).await.unwrap();
    assert_eq!(result, "&lt;b&gt;&quot;x&quot;&amp;&#39;y&#39;&lt;/b&gt;");
}

#[tokio::test]
async fn test_raw_output() {
    let result = render_page("<%- s %>", &json!({"s": MARKUP})).await.unwrap();
    assert_eq!(result, MARKUP);
}

#[tokio::test]
async fn test_literal_text_is_never_escaped() {
    let result = render_page(r#"<a href="?a=1&b=2"><%= t %></a>"#, &json!({"t": "T&C"}))
        .await
        .unwrap();
    assert_eq!(result, r#"<a href="?a=1&b=2">T&amp;C</a>"#);
}

#[tokio::test]
async fn test_escaping_applies_to_converted_values() {
    let result = render_page("<%= obj %>", &json!({"obj": {"k": "<v>"}})).await.unwrap();
    assert_eq!(result, "{&quot;k&quot;:&quot;&lt;v&gt;&quot;}");
}

#[tokio::test]
async fn test_string_literal_with_quotes_in_directive() {
    let result = render_page(r#"<%= "it's" + ' "ok"' %>"#, &json!({})).await.unwrap();
    assert_eq!(result, "it&#39;s &quot;ok&quot;");
}
