//! Link parsing and normalization.
//!
//! A link is the path, query string and hash of a URL. The normalized form
//! is the key used for data entries and navigation:
//!
//! ```text
//! https://site.com/category/news/page/2?b=2&a=1#top
//!   -> route: /category/news/
//!   -> page:  2
//!   -> query: { a: 1, b: 2 }
//!   -> link:  /category/news/page/2/?a=1&b=2#top
//! ```

use std::collections::BTreeMap;

use url::{form_urlencoded, Url};

/// Query parameters, ordered by key.
pub type Query = BTreeMap<String, String>;

// Only used to resolve relative links, never part of the output.
const RESOLVE_BASE: &str = "http://localhost/";

/// Components of a parsed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParams {
    /// Pathname including any `/page/N` suffix.
    pub path: String,
    /// Pathname without the pagination suffix.
    pub route: String,
    /// Page number, `1` when the link has no pagination suffix.
    pub page: u32,
    /// Query parameters.
    pub query: Query,
    /// Query string rebuilt from `query` (`?a=1&b=2`), empty when there is none.
    pub query_string: String,
    /// Hash including the leading `#`, empty when absent.
    pub hash: String,
}

impl LinkParams {
    /// The normalized link for these parameters.
    pub fn link(&self) -> String {
        stringify(&self.route, &self.query, self.page, &self.hash)
    }

    /// Whether the link carries a search query (`s`).
    pub fn is_search(&self) -> bool {
        self.query.contains_key("s")
    }
}

/// Parse an absolute URL or a relative link.
pub fn parse(link: &str) -> LinkParams {
    let (pathname, query, hash) = split(link);
    let pathname = add_final_slash(&pathname);
    let (route, page) = split_page(&pathname);

    LinkParams {
        query_string: query_string(&query),
        path: pathname,
        route,
        page,
        query,
        hash,
    }
}

/// Normalize a link into its canonical cache key form.
pub fn normalize(link: &str) -> String {
    parse(link).link()
}

/// Build a link from its components.
pub fn stringify(route: &str, query: &Query, page: u32, hash: &str) -> String {
    let mut link = add_final_slash(route);
    if !link.starts_with('/') {
        link.insert(0, '/');
    }
    if page > 1 {
        if !link.ends_with('/') {
            link.push('/');
        }
        link.push_str(&format!("page/{}/", page));
    }
    link.push_str(&query_string(query));
    link.push_str(hash);
    link
}

/// Join path fragments with single slashes.
///
/// The result always starts and ends with `/`; empty fragments are skipped.
pub fn concat_path(parts: &[&str]) -> String {
    let segments: Vec<&str> = parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

/// Append a slash to a path unless its last segment looks like a file.
pub fn add_final_slash(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path.ends_with('/') {
        return path.to_string();
    }
    let last = path.rsplit('/').next().unwrap_or_default();
    if last.contains('.') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

fn query_string(query: &Query) -> String {
    if query.is_empty() {
        return String::new();
    }
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter())
        .finish();
    format!("?{}", encoded)
}

fn split(link: &str) -> (String, Query, String) {
    let resolved = Url::parse(RESOLVE_BASE).and_then(|base| base.join(link));

    match resolved {
        Ok(url) => {
            let query = url.query_pairs().into_owned().collect();
            let hash = url.fragment().map(|f| format!("#{}", f)).unwrap_or_default();
            (url.path().to_string(), query, hash)
        }
        Err(_) => split_raw(link),
    }
}

// Fallback for inputs the URL parser rejects: split on `#` and `?` only.
fn split_raw(link: &str) -> (String, Query, String) {
    let (rest, hash) = match link.split_once('#') {
        Some((rest, hash)) => (rest, format!("#{}", hash)),
        None => (link, String::new()),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, form_urlencoded::parse(query.as_bytes()).into_owned().collect()),
        None => (rest, Query::new()),
    };
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    (path, query, hash)
}

fn split_page(pathname: &str) -> (String, u32) {
    let trimmed = pathname.trim_end_matches('/');
    let mut segments = trimmed.rsplitn(3, '/');

    if let (Some(number), Some("page"), Some(rest)) =
        (segments.next(), segments.next(), segments.next())
    {
        if let Ok(page) = number.parse::<u32>() {
            if page >= 1 {
                return (add_final_slash(rest), page);
            }
        }
    }

    (pathname.to_string(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    // === parse Tests ===

    #[test]
    fn test_parse_plain_route() {
        let params = parse("/movie/inception");

        assert_eq!(params.route, "/movie/inception/");
        assert_eq!(params.path, "/movie/inception/");
        assert_eq!(params.page, 1);
        assert!(params.query.is_empty());
        assert_eq!(params.query_string, "");
        assert_eq!(params.hash, "");
    }

    #[test]
    fn test_parse_pagination_suffix() {
        let params = parse("/category/news/page/3/");

        assert_eq!(params.route, "/category/news/");
        assert_eq!(params.path, "/category/news/page/3/");
        assert_eq!(params.page, 3);
    }

    #[test]
    fn test_parse_root_pagination() {
        let params = parse("/page/2");

        assert_eq!(params.route, "/");
        assert_eq!(params.page, 2);
    }

    #[test]
    fn test_parse_page_zero_is_not_pagination() {
        let params = parse("/page/0/");

        assert_eq!(params.route, "/page/0/");
        assert_eq!(params.page, 1);
    }

    #[test]
    fn test_parse_absolute_url() {
        let params = parse("https://site.com/tag/rust/?b=2&a=1#comments");

        assert_eq!(params.route, "/tag/rust/");
        assert_eq!(params.query.get("a").map(String::as_str), Some("1"));
        assert_eq!(params.query_string, "?a=1&b=2");
        assert_eq!(params.hash, "#comments");
    }

    #[test]
    fn test_parse_file_keeps_no_final_slash() {
        let params = parse("/wp-content/image.png");

        assert_eq!(params.route, "/wp-content/image.png");
    }

    #[test]
    fn test_parse_search() {
        let params = parse("/?s=hello+world");

        assert!(params.is_search());
        assert_eq!(params.query.get("s").map(String::as_str), Some("hello world"));
    }

    // === normalize Tests ===

    #[test]
    fn test_normalize_sorts_query() {
        assert_eq!(normalize("/?p=12&post_type=movie"), "/?p=12&post_type=movie");
        assert_eq!(normalize("/?post_type=movie&p=12"), "/?p=12&post_type=movie");
    }

    #[test]
    fn test_normalize_adds_slashes() {
        assert_eq!(normalize("movie/inception"), "/movie/inception/");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn test_normalize_keeps_page_and_hash() {
        assert_eq!(
            normalize("/category/news/page/2?x=1#top"),
            "/category/news/page/2/?x=1#top"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("https://site.com/blog/page/4?s=rust");
        assert_eq!(normalize(&once), once);
    }

    // === concat_path Tests ===

    #[test]
    fn test_concat_path() {
        assert_eq!(concat_path(&["/blog", "/"]), "/blog/");
        assert_eq!(concat_path(&["", "/topics/", ":subpath+"]), "/topics/:subpath+/");
        assert_eq!(concat_path(&[]), "/");
        assert_eq!(concat_path(&["movie", "/:slug"]), "/movie/:slug/");
    }
}
