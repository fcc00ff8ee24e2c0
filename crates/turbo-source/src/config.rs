//! Data source configuration.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiConfig, Variant};
use crate::error::ConfigError;

/// A custom post type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTypeConfig {
    /// Post type name, also the first path segment of its items.
    #[serde(rename = "type")]
    pub post_type: String,
    /// REST endpoint of the post type.
    pub endpoint: String,
    /// Path of the post type archive, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
}

/// A custom taxonomy declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyConfig {
    /// Taxonomy name, also the first path segment of its terms.
    pub taxonomy: String,
    /// REST endpoint of the terms.
    pub endpoint: String,
    /// REST endpoint of the items listed in a term archive.
    #[serde(default = "default_post_type_endpoint")]
    pub post_type_endpoint: String,
    /// Extra query parameters for the listing request.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

fn default_post_type_endpoint() -> String {
    "posts".to_string()
}

fn default_per_page() -> u32 {
    10
}

/// Data source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// REST API root (self-hosted) or site name (hosted).
    pub api: String,

    /// Source platform variant.
    #[serde(default)]
    pub variant: Variant,

    /// Path prefix the site is served under (e.g. `/blog`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdirectory: Option<String>,

    /// Route shown at the site root instead of the posts archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Route of the posts archive when `homepage` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts_page: Option<String>,

    /// Replacement for the `/category/` base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_base: Option<String>,

    /// Replacement for the `/tag/` base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_base: Option<String>,

    /// Replacement for the `/author/` base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_base: Option<String>,

    /// Custom post types, in declaration order.
    #[serde(default)]
    pub post_types: Vec<PostTypeConfig>,

    /// Custom taxonomies, in declaration order.
    #[serde(default)]
    pub taxonomies: Vec<TaxonomyConfig>,

    /// Items per archive page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl SourceConfig {
    /// Create a configuration for an API root with defaults.
    pub fn new(api: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            variant: Variant::default(),
            subdirectory: None,
            homepage: None,
            posts_page: None,
            category_base: None,
            tag_base: None,
            author_base: None,
            post_types: Vec::new(),
            taxonomies: Vec::new(),
            per_page: default_per_page(),
        }
    }

    /// Load config from a TOML or JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Set the platform variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the subdirectory prefix.
    pub fn with_subdirectory(mut self, subdirectory: impl Into<String>) -> Self {
        self.subdirectory = Some(subdirectory.into());
        self
    }

    /// Set the homepage route.
    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    /// Set the posts page route.
    pub fn with_posts_page(mut self, posts_page: impl Into<String>) -> Self {
        self.posts_page = Some(posts_page.into());
        self
    }

    /// Set the category base.
    pub fn with_category_base(mut self, base: impl Into<String>) -> Self {
        self.category_base = Some(base.into());
        self
    }

    /// Set the tag base.
    pub fn with_tag_base(mut self, base: impl Into<String>) -> Self {
        self.tag_base = Some(base.into());
        self
    }

    /// Set the author base.
    pub fn with_author_base(mut self, base: impl Into<String>) -> Self {
        self.author_base = Some(base.into());
        self
    }

    /// Declare a custom post type.
    pub fn with_post_type(
        mut self,
        post_type: impl Into<String>,
        endpoint: impl Into<String>,
        archive: Option<&str>,
    ) -> Self {
        self.post_types.push(PostTypeConfig {
            post_type: post_type.into(),
            endpoint: endpoint.into(),
            archive: archive.map(String::from),
        });
        self
    }

    /// Declare a custom taxonomy.
    pub fn with_taxonomy(mut self, taxonomy: TaxonomyConfig) -> Self {
        self.taxonomies.push(taxonomy);
        self
    }

    /// Set items per archive page.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Resolve the API location.
    pub fn api_config(&self) -> Result<ApiConfig, ConfigError> {
        ApiConfig::init(&self.api, self.variant)
    }

    /// Subdirectory prefix, empty when unset.
    pub fn subdirectory_prefix(&self) -> &str {
        self.subdirectory.as_deref().unwrap_or_default()
    }

    /// Validate paths and declarations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_config()?;

        let paths = [
            ("subdirectory", &self.subdirectory),
            ("homepage", &self.homepage),
            ("postsPage", &self.posts_page),
            ("categoryBase", &self.category_base),
            ("tagBase", &self.tag_base),
            ("authorBase", &self.author_base),
        ];
        for (field, value) in paths {
            if let Some(value) = value {
                if !value.starts_with('/') {
                    return Err(ConfigError::InvalidPath {
                        field,
                        value: value.clone(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for post_type in &self.post_types {
            if post_type.post_type.is_empty() || post_type.endpoint.is_empty() {
                return Err(ConfigError::EmptyName("post type"));
            }
            if !seen.insert(post_type.post_type.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "post type",
                    name: post_type.post_type.clone(),
                });
            }
            if let Some(archive) = &post_type.archive {
                if !archive.starts_with('/') {
                    return Err(ConfigError::InvalidPath {
                        field: "archive",
                        value: archive.clone(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for taxonomy in &self.taxonomies {
            if taxonomy.taxonomy.is_empty() || taxonomy.endpoint.is_empty() {
                return Err(ConfigError::EmptyName("taxonomy"));
            }
            if !seen.insert(taxonomy.taxonomy.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "taxonomy",
                    name: taxonomy.taxonomy.clone(),
                });
            }
        }

        Ok(())
    }
}

impl TaxonomyConfig {
    /// Create a taxonomy declaration listing `posts`.
    pub fn new(taxonomy: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            endpoint: endpoint.into(),
            post_type_endpoint: default_post_type_endpoint(),
            params: BTreeMap::new(),
        }
    }

    /// Set the endpoint of the listed items.
    pub fn with_post_type_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.post_type_endpoint = endpoint.into();
        self
    }

    /// Add an extra listing parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const API: &str = "https://cms.example.com/wp-json/";

    // === SourceConfig Tests ===

    #[test]
    fn test_source_config_new() {
        let config = SourceConfig::new(API);

        assert_eq!(config.variant, Variant::SelfHosted);
        assert_eq!(config.per_page, 10);
        assert!(config.post_types.is_empty());
        assert_eq!(config.subdirectory_prefix(), "");
    }

    #[test]
    fn test_source_config_builder_chain() {
        let config = SourceConfig::new(API)
            .with_subdirectory("/blog")
            .with_homepage("/about-us/")
            .with_posts_page("/news/")
            .with_category_base("/topics/")
            .with_post_type("movie", "movies", Some("/movies/"))
            .with_taxonomy(TaxonomyConfig::new("genre", "genres").with_post_type_endpoint("movies"))
            .with_per_page(20);

        assert_eq!(config.subdirectory_prefix(), "/blog");
        assert_eq!(config.post_types[0].archive.as_deref(), Some("/movies/"));
        assert_eq!(config.taxonomies[0].post_type_endpoint, "movies");
        assert_eq!(config.per_page, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_base() {
        let config = SourceConfig::new(API).with_tag_base("labels/");

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPath { field: "tagBase", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config = SourceConfig::new(API)
            .with_post_type("movie", "movies", None)
            .with_post_type("movie", "films", None);

        assert!(matches!(config.validate(), Err(ConfigError::Duplicate { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_taxonomy() {
        let config = SourceConfig::new(API).with_taxonomy(TaxonomyConfig::new("", "genres"));

        assert!(matches!(config.validate(), Err(ConfigError::EmptyName("taxonomy"))));
    }

    #[test]
    fn test_validate_rejects_bad_api() {
        let config = SourceConfig::new("::nope");
        assert!(matches!(config.validate(), Err(ConfigError::ApiUrl { .. })));
    }

    // === Loading Tests ===

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
api = "https://cms.example.com/wp-json/"
subdirectory = "/blog"
categoryBase = "/topics/"

[[postTypes]]
type = "movie"
endpoint = "movies"
archive = "/movies/"

[[taxonomies]]
taxonomy = "actor"
endpoint = "actors"
postTypeEndpoint = "movies"
params = {{ per_page = "5" }}
"#
        )
        .unwrap();

        let config = SourceConfig::load(file.path()).unwrap();

        assert_eq!(config.subdirectory.as_deref(), Some("/blog"));
        assert_eq!(config.category_base.as_deref(), Some("/topics/"));
        assert_eq!(config.post_types[0].post_type, "movie");
        assert_eq!(config.taxonomies[0].post_type_endpoint, "movies");
        assert_eq!(config.taxonomies[0].params.get("per_page").map(String::as_str), Some("5"));
        assert_eq!(config.per_page, 10);
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "api": "mysite.example.com", "variant": "hosted", "postTypes": [{{ "type": "movie", "endpoint": "movies" }}] }}"#
        )
        .unwrap();

        let config = SourceConfig::load(file.path()).unwrap();

        assert_eq!(config.variant, Variant::Hosted);
        assert_eq!(config.post_types[0].archive, None);
        assert_eq!(config.taxonomies.len(), 0);
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "api = \"https://cms.example.com/\"\nhomepage = \"about\"\n").unwrap();

        let err = SourceConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SourceConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
