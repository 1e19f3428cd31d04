use once_cell::sync::Lazy;
use regex::Regex;

static ABSOLUTE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(http|https)://([\w.]+/?)\S*").expect("valid absolute url pattern"));

static SLASH_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([\w.]+/?)\S*").expect("valid slash path pattern"));

pub fn is_absolute_url(url: &str) -> bool {
    ABSOLUTE_URL.is_match(url)
}

/// Urls containing a full `http(s)://` url pass through, `/path` urls too when `slash_absolute_url` is set,
/// anything else is appended to `base_url`.
pub fn resolve_url(base_url: &str, url: &str, slash_absolute_url: bool) -> String {
    let absolute = is_absolute_url(url) || (slash_absolute_url && SLASH_PATH.is_match(url));
    if absolute {
        url.to_string()
    } else {
        format!("{}{}", base_url, url)
    }
}
