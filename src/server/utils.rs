// Response helpers shared by content handlers

use crate::constants;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Script injected into HTML pages when external links are blocked
const BLOCK_EXTERNAL_LINKS_SCRIPT: &str = r#"<script>
document.addEventListener("click", function (event) {
  var link = event.target.closest ? event.target.closest("a") : null;
  if (!link || !link.href) return;
  var url = new URL(link.href, window.location.href);
  if (url.origin !== window.location.origin) {
    event.preventDefault();
    alert("External link blocked: " + url.href);
  }
}, true);
</script>"#;

/// Insert the link-blocking script before `</head>`, else at the top of the page
pub fn inject_link_blocker(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.find("</head>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + BLOCK_EXTERNAL_LINKS_SCRIPT.len());
            out.push_str(&html[..pos]);
            out.push_str(BLOCK_EXTERNAL_LINKS_SCRIPT);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{}{}", BLOCK_EXTERNAL_LINKS_SCRIPT, html),
    }
}

/// Headers for archive content
pub fn content_headers(mimetype: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let content_type = if mimetype.is_empty() {
        "application/octet-stream"
    } else {
        mimetype
    };
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(constants::CONTENT_CACHE_CONTROL));
    headers
}

/// 302 Found to a local url
pub fn found(url: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
}

/// Link to a path inside a book, each segment percent-encoded
pub fn content_url(book: &str, path: &str) -> String {
    let encoded: Vec<String> = path.split('/').map(|s| urlencoding::encode(s).into_owned()).collect();
    format!("/content/{}/{}", urlencoding::encode(book), encoded.join("/"))
}
