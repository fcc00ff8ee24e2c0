//! Data entries: the per-link fetch state.

use serde::ser::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::link::{LinkParams, Query};

/// Reference to an entity stored in the `DataStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// Entity kind (`post`, `page`, `category`, `author`, ...).
    pub kind: String,
    /// Entity id.
    pub id: u64,
    /// Normalized link of the entity, when the API provides one.
    pub link: Option<String>,
}

/// What a successful entry represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// A single item of a post type.
    PostType { post_type: String, id: u64 },
    /// The archive of a custom post type.
    PostTypeArchive { post_type: String },
    /// The main posts archive (home or posts page).
    PostArchive,
    /// A taxonomy term archive.
    Taxonomy { taxonomy: String, id: u64 },
    /// An author archive.
    Author { id: u64 },
    /// A date archive.
    Date {
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
    },
}

/// Successful handler result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// What was resolved.
    pub kind: ContentKind,
    /// Listed entities, for archives.
    pub items: Vec<EntityRef>,
    /// Total number of items, for archives.
    pub total: Option<u64>,
    /// Total number of pages, for archives.
    pub total_pages: Option<u32>,
    /// Search query the listing was filtered by.
    pub search_query: Option<String>,
}

impl Content {
    /// Create content with no listing.
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            total: None,
            total_pages: None,
            search_query: None,
        }
    }

    /// Single post type item.
    pub fn post_type(post_type: impl Into<String>, id: u64) -> Self {
        Self::new(ContentKind::PostType {
            post_type: post_type.into(),
            id,
        })
    }

    /// Set the listed items.
    pub fn with_items(mut self, items: Vec<EntityRef>) -> Self {
        self.items = items;
        self
    }

    /// Set listing totals.
    pub fn with_totals(mut self, total: Option<u64>, total_pages: Option<u32>) -> Self {
        self.total = total;
        self.total_pages = total_pages;
        self
    }

    /// Set the search query.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search_query = search.map(String::from);
        self
    }

    /// Whether this content is an archive listing.
    pub fn is_archive(&self) -> bool {
        !matches!(self.kind, ContentKind::PostType { .. })
    }

    /// Whether this content is a search listing.
    pub fn is_search(&self) -> bool {
        self.search_query.is_some()
    }

    /// Whether this content is of the given post type or taxonomy.
    pub fn is_type(&self, name: &str) -> bool {
        match &self.kind {
            ContentKind::PostType { post_type, .. }
            | ContentKind::PostTypeArchive { post_type } => post_type == name,
            ContentKind::Taxonomy { taxonomy, .. } => taxonomy == name,
            ContentKind::PostArchive => name == "post",
            ContentKind::Author { .. } => name == "author",
            ContentKind::Date { .. } => name == "date",
        }
    }

    /// Presentation markers (`isPostType`, `isMovie`, `isArchive`, ...).
    pub fn markers(&self) -> Vec<String> {
        let mut markers = Vec::new();
        if self.is_archive() {
            markers.push("isArchive".to_string());
        }
        match &self.kind {
            ContentKind::PostType { post_type, .. } => {
                markers.push("isPostType".to_string());
                markers.push(marker(post_type));
            }
            ContentKind::PostTypeArchive { post_type } => {
                markers.push("isPostTypeArchive".to_string());
                markers.push(format!("{}Archive", marker(post_type)));
            }
            ContentKind::PostArchive => {
                markers.push("isPostTypeArchive".to_string());
                markers.push("isPostArchive".to_string());
            }
            ContentKind::Taxonomy { taxonomy, .. } => {
                markers.push("isTaxonomy".to_string());
                markers.push(marker(taxonomy));
            }
            ContentKind::Author { .. } => markers.push("isAuthor".to_string()),
            ContentKind::Date { .. } => markers.push("isDate".to_string()),
        }
        if self.is_search() {
            markers.push("isSearch".to_string());
        }
        markers
    }
}

/// Classified failure recorded on an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorStatus {
    /// Numeric status.
    pub status: u16,
    /// Reason text.
    pub status_text: String,
}

impl ErrorStatus {
    /// Create a new error status.
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
        }
    }

    /// Presentation flags for this status (`isError`, `is404`).
    pub fn flags(&self) -> Vec<String> {
        vec!["isError".to_string(), format!("is{}", self.status)]
    }

    /// Whether the status is a 4xx.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Whether the status is a 5xx.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Resolution state of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Never resolved.
    Pending,
    /// Resolved successfully.
    Content(Content),
    /// Resolved with a classified failure.
    Error(ErrorStatus),
}

/// Cached fetch state for one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    /// Normalized link.
    pub link: String,
    /// Route of the link (before redirection).
    pub route: String,
    /// Query parameters.
    pub query: Query,
    /// Page number.
    pub page: u32,
    /// A fetch is in flight.
    pub is_fetching: bool,
    /// The entry is settled (not mid-fetch).
    pub is_ready: bool,
    /// The link is the site's home.
    pub is_home: bool,
    /// Last resolution.
    pub outcome: Outcome,
}

impl DataEntry {
    /// A new entry in the fetching state.
    pub fn fetching(link: impl Into<String>, params: &LinkParams) -> Self {
        Self {
            link: link.into(),
            route: params.route.clone(),
            query: params.query.clone(),
            page: params.page,
            is_fetching: true,
            is_ready: false,
            is_home: false,
            outcome: Outcome::Pending,
        }
    }

    /// Replace this entry with a settled error, keeping its link fields.
    pub fn fail(&mut self, status: ErrorStatus) {
        *self = Self {
            link: std::mem::take(&mut self.link),
            route: std::mem::take(&mut self.route),
            query: std::mem::take(&mut self.query),
            page: self.page,
            is_fetching: false,
            is_ready: true,
            is_home: false,
            outcome: Outcome::Error(status),
        };
    }

    /// Settle this entry with content.
    pub fn succeed(&mut self, content: Content, is_home: bool) {
        self.outcome = Outcome::Content(content);
        self.is_fetching = false;
        self.is_ready = true;
        self.is_home = is_home;
    }

    /// The resolved content, if successful.
    pub fn content(&self) -> Option<&Content> {
        match &self.outcome {
            Outcome::Content(content) => Some(content),
            _ => None,
        }
    }

    /// The recorded failure, if any.
    pub fn error(&self) -> Option<&ErrorStatus> {
        match &self.outcome {
            Outcome::Error(status) => Some(status),
            _ => None,
        }
    }

    /// Whether the entry settled with a failure.
    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }

    /// Whether the entry settled with the given status.
    pub fn is_status(&self, status: u16) -> bool {
        self.error().is_some_and(|e| e.status == status)
    }

    /// Numeric status of the failure.
    pub fn error_status(&self) -> Option<u16> {
        self.error().map(|e| e.status)
    }

    /// Reason text of the failure.
    pub fn error_status_text(&self) -> Option<&str> {
        self.error().map(|e| e.status_text.as_str())
    }

    /// Whether the entry is an archive listing.
    pub fn is_archive(&self) -> bool {
        self.content().is_some_and(Content::is_archive)
    }

    /// Whether the entry is a search listing.
    pub fn is_search(&self) -> bool {
        self.content().is_some_and(Content::is_search)
    }

    /// Whether the entry is a single post type item.
    pub fn is_post_type(&self) -> bool {
        matches!(
            self.content().map(|c| &c.kind),
            Some(ContentKind::PostType { .. })
        )
    }

    /// Whether the entry is a taxonomy archive.
    pub fn is_taxonomy(&self) -> bool {
        matches!(
            self.content().map(|c| &c.kind),
            Some(ContentKind::Taxonomy { .. })
        )
    }

    /// Whether the entry is of the given post type or taxonomy.
    pub fn is_type(&self, name: &str) -> bool {
        self.content().is_some_and(|c| c.is_type(name))
    }

    /// The flag-shaped view handed to the rendering layer.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("link".into(), json!(self.link));
        map.insert("route".into(), json!(self.route));
        map.insert("query".into(), json!(self.query));
        map.insert("page".into(), json!(self.page));
        map.insert("isFetching".into(), json!(self.is_fetching));
        map.insert("isReady".into(), json!(self.is_ready));
        if self.is_home {
            map.insert("isHome".into(), json!(true));
        }

        match &self.outcome {
            Outcome::Pending => {}
            Outcome::Error(status) => {
                for flag in status.flags() {
                    map.insert(flag, json!(true));
                }
                map.insert("errorStatus".into(), json!(status.status));
                map.insert("errorStatusText".into(), json!(status.status_text));
            }
            Outcome::Content(content) => {
                for flag in content.markers() {
                    map.insert(flag, json!(true));
                }
                insert_kind_fields(&mut map, &content.kind);
                if content.is_archive() {
                    let items: Vec<Value> = content
                        .items
                        .iter()
                        .map(|item| json!({ "type": item.kind, "id": item.id, "link": item.link }))
                        .collect();
                    map.insert("items".into(), Value::Array(items));
                    if let Some(total) = content.total {
                        map.insert("total".into(), json!(total));
                    }
                    if let Some(total_pages) = content.total_pages {
                        map.insert("totalPages".into(), json!(total_pages));
                    }
                }
                if let Some(search) = &content.search_query {
                    map.insert("searchQuery".into(), json!(search));
                }
            }
        }

        Value::Object(map)
    }
}

impl Serialize for DataEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn insert_kind_fields(map: &mut Map<String, Value>, kind: &ContentKind) {
    match kind {
        ContentKind::PostType { post_type, id } => {
            map.insert("type".into(), json!(post_type));
            map.insert("id".into(), json!(id));
        }
        ContentKind::PostTypeArchive { post_type } => {
            map.insert("type".into(), json!(post_type));
        }
        ContentKind::PostArchive => {
            map.insert("type".into(), json!("post"));
        }
        ContentKind::Taxonomy { taxonomy, id } => {
            map.insert("taxonomy".into(), json!(taxonomy));
            map.insert("id".into(), json!(id));
        }
        ContentKind::Author { id } => {
            map.insert("id".into(), json!(id));
        }
        ContentKind::Date { year, month, day } => {
            map.insert("year".into(), json!(year));
            if let Some(month) = month {
                map.insert("month".into(), json!(month));
            }
            if let Some(day) = day {
                map.insert("day".into(), json!(day));
            }
        }
    }
}

/// Build the `is<Name>` marker for a type name (`post_tag` -> `isPostTag`).
pub fn marker(name: &str) -> String {
    let mut out = String::from("is");
    for word in name.split(|c: char| c == '_' || c == '-' || c == ' ') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
