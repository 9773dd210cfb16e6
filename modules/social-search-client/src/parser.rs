use serde_json::Value;

use crate::error::ParseError;
use crate::types::Post;

/// Parse a search response body into posts, in server order.
///
/// Fails only when the body is not JSON or has no top-level `statuses` array.
/// Entries missing `text`, `user.name` or `user.screen_name` (or holding
/// non-strings there) are dropped; the rest of the page is kept.
pub fn parse_search_results(body: &str) -> Result<Vec<Post>, ParseError> {
    let root: Value = serde_json::from_str(body)?;
    let statuses = root
        .get("statuses")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingStatuses)?;

    let mut posts = Vec::with_capacity(statuses.len());
    for (index, status) in statuses.iter().enumerate() {
        match post_from_status(status) {
            Some(post) => posts.push(post),
            None => tracing::debug!(index, "Skipping malformed status entry"),
        }
    }

    if posts.len() < statuses.len() {
        tracing::warn!(
            total = statuses.len(),
            kept = posts.len(),
            "Dropped malformed entries from search page"
        );
    }

    Ok(posts)
}

fn post_from_status(status: &Value) -> Option<Post> {
    let content = str_field(status, "text")?;
    let user = status.get("user")?;
    let author = str_field(user, "name")?;
    let handle = str_field(user, "screen_name")?;
    let icon_url = str_field(user, "profile_image_url_https")
        .or_else(|| str_field(user, "profile_image_url"))
        .unwrap_or_default();

    Some(Post {
        author,
        handle,
        content,
        icon_url,
    })
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}
