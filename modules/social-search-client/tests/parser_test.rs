//! Search payload → Post conversion.
//!
//! Each test: hand-craft a response body → parse_search_results() → assert.

use social_search_client::{parse_search_results, ParseError, Post};

fn post(author: &str, handle: &str, content: &str, icon_url: &str) -> Post {
    Post {
        author: author.into(),
        handle: handle.into(),
        content: content.into(),
        icon_url: icon_url.into(),
    }
}

#[test]
fn empty_statuses_is_empty_page() {
    let posts = parse_search_results(r#"{"statuses":[]}"#).unwrap();
    assert!(posts.is_empty());
}

#[test]
fn not_json_is_parse_error() {
    assert!(matches!(
        parse_search_results("not json"),
        Err(ParseError::InvalidJson(_))
    ));
}

#[test]
fn missing_statuses_is_parse_error() {
    assert!(matches!(
        parse_search_results(r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#),
        Err(ParseError::MissingStatuses)
    ));
}

#[test]
fn entry_missing_screen_name_is_dropped_and_order_kept() {
    let body = r#"{
        "statuses": [
            {"text": "first", "user": {"name": "One", "screen_name": "one",
                "profile_image_url_https": "https://img/1"}},
            {"text": "broken", "user": {"name": "Two"}},
            {"text": "third", "user": {"name": "Three", "screen_name": "three"}}
        ],
        "search_metadata": {"count": 15}
    }"#;

    let posts = parse_search_results(body).unwrap();

    assert_eq!(
        posts,
        vec![
            post("One", "one", "first", "https://img/1"),
            post("Three", "three", "third", ""),
        ]
    );
}

#[test]
fn realistic_payload_keeps_server_order() {
    let body = r#"{
        "statuses": [
            {
                "created_at": "Mon Sep 24 03:35:21 +0000 2012",
                "id_str": "250075927172759552",
                "text": "Aggressive Ponytail #freebandnames",
                "user": {
                    "name": "Sean Cummings",
                    "screen_name": "sean_cummings",
                    "profile_image_url": "http://a0.twimg.com/profile_images/2359746665/1v6zfgqo8g0d3mk7ii5s_normal.jpeg",
                    "profile_image_url_https": "https://si0.twimg.com/profile_images/2359746665/1v6zfgqo8g0d3mk7ii5s_normal.jpeg"
                }
            },
            {
                "text": "Thee Namaste Nerdz. #FreeBandNames",
                "user": {
                    "name": "Chaz Martenstein",
                    "screen_name": "bullcityrecords",
                    "profile_image_url_https": "https://si0.twimg.com/profile_images/447958234/Lichtenstein_normal.jpg"
                }
            }
        ]
    }"#;

    let posts = parse_search_results(body).unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].handle, "sean_cummings");
    assert!(posts[0].icon_url.starts_with("https://si0.twimg.com"));
    assert_eq!(posts[1].author, "Chaz Martenstein");
    assert_eq!(posts[1].content, "Thee Namaste Nerdz. #FreeBandNames");
}

#[test]
fn unicode_text_is_preserved() {
    let body = r#"{"statuses":[{"text":"café 😀","user":{"name":"Zoë","screen_name":"zoe"}}]}"#;
    let posts = parse_search_results(body).unwrap();
    assert_eq!(posts[0].content, "café 😀");
    assert_eq!(posts[0].author, "Zoë");
}
