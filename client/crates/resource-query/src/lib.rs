//! Sparse fieldset and filter primitives for JSON:API collection queries.
//!
//! A [`ResourceQuery`] captures the two parameter families the account client
//! sends when listing a collection:
//!
//! - `fields[<collection>]=a,b,c` projections, restricting which attributes
//!   the server returns for each resource type;
//! - `filter[<field>]=<value>` predicates.
//!
//! Queries are assembled through [`ResourceQueryBuilder`], which validates
//! names once so adapters can encode the query without further checks.
//!
//! # Examples
//! ```
//! use resource_query::ResourceQuery;
//!
//! let query = ResourceQuery::builder()
//!     .fields("users", ["id", "name", "name"])
//!     .filter("self", true)
//!     .build()
//!     .expect("valid query");
//!
//! assert_eq!(query.projection("users").as_deref(), Some("id,name"));
//! assert_eq!(
//!     query.to_query_pairs(),
//!     vec![
//!         ("fields[users]".to_owned(), "id,name".to_owned()),
//!         ("filter[self]".to_owned(), "true".to_owned()),
//!     ]
//! );
//! ```

use std::collections::BTreeMap;

use thiserror::Error;
use url::Url;

const FIELDS_PREFIX: &str = "fields[";
const FILTER_PREFIX: &str = "filter[";

/// Validation and parsing failures for [`ResourceQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A collection name was blank or contained reserved characters.
    #[error("invalid collection name: {collection:?}")]
    InvalidCollection {
        /// The rejected collection name.
        collection: String,
    },
    /// A projected field name was blank or contained reserved characters.
    #[error("invalid field {field:?} in projection for {collection}")]
    InvalidField {
        /// Collection the projection belongs to.
        collection: String,
        /// The rejected field name.
        field: String,
    },
    /// A projection listed no fields at all.
    #[error("projection for {collection} must list at least one field")]
    EmptyProjection {
        /// Collection with the empty projection.
        collection: String,
    },
    /// A filter key was blank or contained reserved characters.
    #[error("invalid filter field: {field:?}")]
    InvalidFilter {
        /// The rejected filter key.
        field: String,
    },
    /// A query parameter used a known prefix but was not well formed.
    #[error("malformed query parameter: {key}")]
    MalformedParameter {
        /// The raw parameter key.
        key: String,
    },
}

/// Validated projection and filter set for one collection request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    fields: BTreeMap<String, Vec<String>>,
    filter: BTreeMap<String, String>,
}

impl ResourceQuery {
    /// Start building a query.
    #[must_use]
    pub fn builder() -> ResourceQueryBuilder {
        ResourceQueryBuilder::default()
    }

    /// A query with no projections and no filters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` when the query carries neither projections nor filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.filter.is_empty()
    }

    /// Comma-joined projection for `collection`, if one was requested.
    #[must_use]
    pub fn projection(&self, collection: &str) -> Option<String> {
        self.fields.get(collection).map(|fields| fields.join(","))
    }

    /// Fields projected for `collection`, in request order.
    #[must_use]
    pub fn projected_fields(&self, collection: &str) -> Option<&[String]> {
        self.fields.get(collection).map(Vec::as_slice)
    }

    /// Filter value registered for `field`.
    #[must_use]
    pub fn filter_value(&self, field: &str) -> Option<&str> {
        self.filter.get(field).map(String::as_str)
    }

    /// Encode the query as ordered key/value pairs.
    ///
    /// Projections come first (sorted by collection), then filters (sorted by
    /// field), so the encoding is deterministic.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let projections = self
            .fields
            .iter()
            .map(|(collection, fields)| (format!("{FIELDS_PREFIX}{collection}]"), fields.join(",")));
        let filters = self
            .filter
            .iter()
            .map(|(field, value)| (format!("{FILTER_PREFIX}{field}]"), value.clone()));
        projections.chain(filters).collect()
    }

    /// Append the encoded pairs to `url`, leaving it untouched when empty.
    pub fn append_to_url(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        for (key, value) in self.to_query_pairs() {
            pairs.append_pair(&key, &value);
        }
    }

    /// Parse projections and filters back out of decoded query pairs.
    ///
    /// Parameters outside the `fields[...]` and `filter[...]` families (for
    /// example `sort` or `page[limit]`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MalformedParameter`] when a known prefix is not
    /// closed by `]`, and the usual validation errors for bad names.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = Self::builder();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref();
            if let Some(rest) = key.strip_prefix(FIELDS_PREFIX) {
                let collection = bracketed(rest, key)?;
                builder = builder.fields(collection, value.split(','));
            } else if let Some(rest) = key.strip_prefix(FILTER_PREFIX) {
                let field = bracketed(rest, key)?;
                builder = builder.filter(field, value);
            }
        }
        builder.build()
    }
}

fn bracketed<'a>(rest: &'a str, key: &str) -> Result<&'a str, QueryError> {
    rest.strip_suffix(']')
        .filter(|inner| !inner.contains(['[', ']']))
        .ok_or_else(|| QueryError::MalformedParameter {
            key: key.to_owned(),
        })
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '[' | ']' | '&' | '='))
}

/// Accumulates projections and filters before validation.
#[derive(Debug, Clone, Default)]
pub struct ResourceQueryBuilder {
    fields: Vec<(String, Vec<String>)>,
    filter: Vec<(String, String)>,
}

impl ResourceQueryBuilder {
    /// Request `fields` for `collection`.
    ///
    /// Field names are trimmed and duplicates dropped, keeping the first
    /// occurrence. Repeated calls for the same collection extend its
    /// projection.
    #[must_use]
    pub fn fields<I, S>(mut self, collection: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = fields
            .into_iter()
            .map(|field| field.as_ref().trim().to_owned())
            .collect();
        self.fields.push((collection.into(), fields));
        self
    }

    /// Add a `filter[field]=value` predicate. Later values replace earlier
    /// ones for the same field.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.filter.push((field.into(), value.to_string()));
        self
    }

    /// Validate names and produce the query.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] describing the first invalid collection,
    /// field, or filter key encountered.
    pub fn build(self) -> Result<ResourceQuery, QueryError> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (collection, requested) in self.fields {
            if !is_valid_name(&collection) {
                return Err(QueryError::InvalidCollection { collection });
            }
            if let Some(field) = requested.iter().find(|field| !is_valid_name(field)) {
                return Err(QueryError::InvalidField {
                    field: field.clone(),
                    collection,
                });
            }
            if requested.is_empty() {
                return Err(QueryError::EmptyProjection { collection });
            }
            let projection = fields.entry(collection).or_default();
            for field in requested {
                if !projection.contains(&field) {
                    projection.push(field);
                }
            }
        }

        let mut filter = BTreeMap::new();
        for (field, value) in self.filter {
            if !is_valid_name(&field) {
                return Err(QueryError::InvalidFilter { field });
            }
            filter.insert(field, value);
        }

        Ok(ResourceQuery { fields, filter })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for query validation and encoding.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn projection_drops_duplicates_and_keeps_order() {
        let query = ResourceQuery::builder()
            .fields("users", ["id", "ratingSystem", "name", "ratingSystem"])
            .build()
            .expect("valid query");

        assert_eq!(
            query.projection("users").as_deref(),
            Some("id,ratingSystem,name")
        );
        assert!(query.projection("follows").is_none());
    }

    #[rstest]
    fn repeated_projection_calls_extend_the_collection() {
        let query = ResourceQuery::builder()
            .fields("users", ["id"])
            .fields("users", ["name", "id"])
            .build()
            .expect("valid query");

        assert_eq!(query.projected_fields("users"), Some(&["id".to_owned(), "name".to_owned()][..]));
    }

    #[rstest]
    #[case::blank_collection("", "id")]
    #[case::spaced_collection("user s", "id")]
    fn rejects_invalid_collections(#[case] collection: &str, #[case] field: &str) {
        let error = ResourceQuery::builder()
            .fields(collection, [field])
            .build()
            .expect_err("collection must be rejected");
        assert_eq!(
            error,
            QueryError::InvalidCollection {
                collection: collection.to_owned()
            }
        );
    }

    #[rstest]
    #[case::blank("")]
    #[case::comma("a,b")]
    #[case::bracket("a]")]
    fn rejects_invalid_fields(#[case] field: &str) {
        let error = ResourceQuery::builder()
            .fields("users", [field])
            .build()
            .expect_err("field must be rejected");
        assert!(matches!(error, QueryError::InvalidField { .. }));
    }

    #[rstest]
    fn rejects_empty_projection_and_blank_filters() {
        let empty: [&str; 0] = [];
        assert_eq!(
            ResourceQuery::builder().fields("users", empty).build(),
            Err(QueryError::EmptyProjection {
                collection: "users".to_owned()
            })
        );
        assert_eq!(
            ResourceQuery::builder().filter(" ", "x").build(),
            Err(QueryError::InvalidFilter {
                field: " ".to_owned()
            })
        );
    }

    #[rstest]
    fn later_filters_replace_earlier_values() {
        let query = ResourceQuery::builder()
            .filter("self", false)
            .filter("self", true)
            .build()
            .expect("valid query");
        assert_eq!(query.filter_value("self"), Some("true"));
    }

    #[rstest]
    fn appends_encoded_pairs_to_urls() {
        let query = ResourceQuery::builder()
            .fields("users", ["id", "name"])
            .filter("self", true)
            .build()
            .expect("valid query");
        let mut url = Url::parse("https://api.example.test/edge/users").expect("url");

        query.append_to_url(&mut url);

        assert_eq!(
            url.as_str(),
            "https://api.example.test/edge/users?fields%5Busers%5D=id%2Cname&filter%5Bself%5D=true"
        );
    }

    #[rstest]
    fn empty_queries_leave_urls_untouched() {
        let mut url = Url::parse("https://api.example.test/edge/users").expect("url");
        ResourceQuery::empty().append_to_url(&mut url);
        assert_eq!(url.as_str(), "https://api.example.test/edge/users");
    }

    #[rstest]
    fn parses_decoded_pairs_and_ignores_other_families() {
        let query = ResourceQuery::from_query_pairs([
            ("fields[users]", "id,name"),
            ("filter[self]", "true"),
            ("page[limit]", "20"),
            ("sort", "-createdAt"),
        ])
        .expect("parse succeeds");

        assert_eq!(query.projection("users").as_deref(), Some("id,name"));
        assert_eq!(query.filter_value("self"), Some("true"));
    }

    #[rstest]
    #[case("fields[users")]
    #[case("filter[a[b]]")]
    fn rejects_unterminated_brackets(#[case] key: &str) {
        let error =
            ResourceQuery::from_query_pairs([(key, "x")]).expect_err("malformed key must fail");
        assert_eq!(
            error,
            QueryError::MalformedParameter {
                key: key.to_owned()
            }
        );
    }
}
