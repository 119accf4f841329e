use std::collections::HashMap;

use http::{HeaderMap, header};
use tower_cookies::{Cookie, Cookies, cookie::CookieJar};

/// Read access to the cookies sent with a request.
pub trait CookieSource {
    fn get(&self, name: &str) -> Option<String>;
}

impl CookieSource for Cookies {
    fn get(&self, name: &str) -> Option<String> {
        Cookies::get(self, name).map(|cookie| cookie.value().to_owned())
    }
}

impl CookieSource for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        CookieJar::get(self, name).map(|cookie| cookie.value().to_owned())
    }
}

impl CookieSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Reads `Cookie` request headers directly. Unparseable pairs are skipped.
impl CookieSource for HeaderMap {
    fn get(&self, name: &str) -> Option<String> {
        self.get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse_encoded)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn header_map_lookup() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; session=abc"));
        headers.append(header::COOKIE, HeaderValue::from_static("flash=x%20y"));

        assert_eq!(CookieSource::get(&headers, "session"), Some("abc".into()));
        assert_eq!(CookieSource::get(&headers, "flash"), Some("x y".into()));
        assert_eq!(CookieSource::get(&headers, "missing"), None);
    }

    #[test]
    fn jar_lookup() {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new("session", "abc"));

        assert_eq!(CookieSource::get(&jar, "session"), Some("abc".into()));
        assert_eq!(CookieSource::get(&jar, "flash"), None);
    }
}
