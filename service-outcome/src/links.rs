//! Hypermedia links for offset-paginated collections
//!
//! Pages are addressed by a zero-based `index` (offset of the first item) and
//! a fixed `pageSize`. [`LinkBuilder`] turns a [`PageOptions`] into the
//! `self`/`first`/`previous`/`next`/`last` links of a collection response, or
//! the `self` URL of a single item.
//!
//! ```rust
//! use service_outcome::links::{LinkBuilder, LinkRelation, PageOptions};
//!
//! let options = PageOptions::new("/orders")
//!     .with_index(20)
//!     .with_page_size(10)
//!     .with_total_count(100);
//!
//! let links = LinkBuilder::collection_links(&options);
//! assert_eq!(links.get(LinkRelation::Next).unwrap().href, "/orders?index=30&pageSize=10");
//! assert_eq!(links.get(LinkRelation::Last).unwrap().href, "/orders?index=90&pageSize=10");
//! ```
//!
//! All offsets are plain unsigned arithmetic: no rounding to page boundaries.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Relation of a link to the current resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRelation {
    /// The current page or item
    #[serde(rename = "self")]
    SelfRef,
    /// The first page
    First,
    /// The page before the current one
    Previous,
    /// The page after the current one
    Next,
    /// The last page
    Last,
}

impl LinkRelation {
    /// Wire name of the relation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SelfRef => "self",
            Self::First => "first",
            Self::Previous => "previous",
            Self::Next => "next",
            Self::Last => "last",
        }
    }
}

impl fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query parameter names understood by collection endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryParam {
    /// Lower bound of a date range
    FromDate,
    /// Upper bound of a date range
    ToDate,
    /// Zero-based offset of the first item
    Index,
    /// Page number
    Page,
    /// Items per page
    PageSize,
    /// Sort field
    Sort,
    /// Sort direction
    SortDir,
    /// Sparse fieldset
    Fields,
    /// Related resources to embed
    Expand,
}

impl QueryParam {
    /// Wire name of the parameter
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FromDate => "fromDate",
            Self::ToDate => "toDate",
            Self::Index => "index",
            Self::Page => "page",
            Self::PageSize => "pageSize",
            Self::Sort => "sort",
            Self::SortDir => "sortDir",
            Self::Fields => "fields",
            Self::Expand => "expand",
        }
    }
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hypermedia link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL
    pub href: String,
}

impl Link {
    /// Create a link to a URL
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// Links keyed by relation, serialized as a `_links` style object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<LinkRelation, Link>);

impl Links {
    /// Link for a relation, if present
    #[must_use]
    pub fn get(&self, relation: LinkRelation) -> Option<&Link> {
        self.0.get(&relation)
    }

    /// Whether a relation is present
    #[must_use]
    pub fn contains(&self, relation: LinkRelation) -> bool {
        self.0.contains_key(&relation)
    }

    /// Relations present, in `self, first, previous, next, last` order
    pub fn relations(&self) -> impl Iterator<Item = LinkRelation> + '_ {
        self.0.keys().copied()
    }

    /// Number of links
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no links
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, relation: LinkRelation, link: Link) {
        self.0.insert(relation, link);
    }
}

/// Links for a single item: `{"self": "<resource url>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLinks {
    /// URL of the item itself
    #[serde(rename = "self")]
    pub self_href: String,
}

/// Position of the current page within a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOptions {
    /// Base URL of the collection, without paging parameters
    pub resource_url: String,
    /// Zero-based offset of the first item on the current page
    #[serde(default)]
    pub index: u64,
    /// Items per page; `None` or `Some(0)` means unpaged
    #[serde(default)]
    pub page_size: Option<u64>,
    /// Size of the whole collection; `None` means unknown
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl PageOptions {
    /// Options for the first, unpaged view of a collection
    pub fn new(resource_url: impl Into<String>) -> Self {
        Self {
            resource_url: resource_url.into(),
            index: 0,
            page_size: None,
            total_count: None,
        }
    }

    /// Set the offset of the current page
    #[must_use]
    pub fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set the collection size
    #[must_use]
    pub fn with_total_count(mut self, total_count: u64) -> Self {
        self.total_count = Some(total_count);
        self
    }

    /// Page size, treating zero as unset
    #[must_use]
    pub fn effective_page_size(&self) -> Option<u64> {
        self.page_size.filter(|&size| size > 0)
    }
}

/// Builds collection and item links
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkBuilder;

impl LinkBuilder {
    /// Link to the current page
    ///
    /// `index` is included only when non-zero, `pageSize` only when set.
    #[must_use]
    pub fn collection_self_link(options: &PageOptions) -> Link {
        let mut params = Vec::with_capacity(2);
        if options.index > 0 {
            params.push((QueryParam::Index, options.index));
        }
        if let Some(page_size) = options.effective_page_size() {
            params.push((QueryParam::PageSize, page_size));
        }
        Link::new(href(&options.resource_url, &params))
    }

    /// Link to the first page; the same URL as the self link
    #[must_use]
    pub fn first_link(options: &PageOptions) -> Link {
        Self::collection_self_link(options)
    }

    /// Link to the preceding page
    ///
    /// Present only when a page size is set and at least one full page
    /// precedes the current index.
    #[must_use]
    pub fn previous_link(options: &PageOptions) -> Option<Link> {
        let page_size = options.effective_page_size()?;
        let index = options.index.checked_sub(page_size)?;
        Some(page_link(&options.resource_url, index, page_size))
    }

    /// Link to the following page
    ///
    /// Present only when the total is known and items remain past the
    /// current page.
    #[must_use]
    pub fn next_link(options: &PageOptions) -> Option<Link> {
        let page_size = options.effective_page_size()?;
        let total = options.total_count?;
        let index = options.index.checked_add(page_size)?;
        (index < total).then(|| page_link(&options.resource_url, index, page_size))
    }

    /// Link to the page starting `page_size` items before the end
    ///
    /// Falls back to the first link when the collection fits in one page or
    /// its size is unknown.
    #[must_use]
    pub fn last_link(options: &PageOptions) -> Link {
        match (options.effective_page_size(), options.total_count) {
            (Some(page_size), Some(total)) if page_size < total => {
                page_link(&options.resource_url, total - page_size, page_size)
            }
            _ => Self::first_link(options),
        }
    }

    /// All links for a collection response
    ///
    /// `self` and `first` are always present. `previous`, `next` and `last`
    /// need both a total and a page size.
    #[must_use]
    pub fn collection_links(options: &PageOptions) -> Links {
        let mut links = Links::default();
        links.insert(LinkRelation::SelfRef, Self::collection_self_link(options));
        links.insert(LinkRelation::First, Self::first_link(options));

        if options.total_count.is_some() && options.effective_page_size().is_some() {
            if let Some(previous) = Self::previous_link(options) {
                links.insert(LinkRelation::Previous, previous);
            }
            if let Some(next) = Self::next_link(options) {
                links.insert(LinkRelation::Next, next);
            }
            links.insert(LinkRelation::Last, Self::last_link(options));
        }

        links
    }

    /// Links for a single item: just `self`, as the bare resource URL
    #[must_use]
    pub fn item_links(resource_url: &str) -> ItemLinks {
        ItemLinks {
            self_href: resource_url.to_string(),
        }
    }
}

fn page_link(resource_url: &str, index: u64, page_size: u64) -> Link {
    Link::new(href(
        resource_url,
        &[(QueryParam::Index, index), (QueryParam::PageSize, page_size)],
    ))
}

fn href(resource_url: &str, params: &[(QueryParam, u64)]) -> String {
    let mut href = resource_url.to_string();
    let mut separator = if resource_url.contains('?') { '&' } else { '?' };
    for (param, value) in params {
        href.push(separator);
        href.push_str(param.as_str());
        href.push('=');
        href.push_str(&value.to_string());
        separator = '&';
    }
    href
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paged(index: u64, page_size: u64, total: u64) -> PageOptions {
        PageOptions::new("/orders")
            .with_index(index)
            .with_page_size(page_size)
            .with_total_count(total)
    }

    fn href_of(links: &Links, relation: LinkRelation) -> Option<&str> {
        links.get(relation).map(|link| link.href.as_str())
    }

    #[test]
    fn test_middle_page() {
        let links = LinkBuilder::collection_links(&paged(20, 10, 100));

        assert_eq!(href_of(&links, LinkRelation::SelfRef), Some("/orders?index=20&pageSize=10"));
        assert_eq!(href_of(&links, LinkRelation::First), Some("/orders?index=20&pageSize=10"));
        assert_eq!(href_of(&links, LinkRelation::Previous), Some("/orders?index=10&pageSize=10"));
        assert_eq!(href_of(&links, LinkRelation::Next), Some("/orders?index=30&pageSize=10"));
        assert_eq!(href_of(&links, LinkRelation::Last), Some("/orders?index=90&pageSize=10"));
    }

    #[test]
    fn test_first_page_has_no_previous() {
        let links = LinkBuilder::collection_links(&paged(0, 10, 100));

        assert_eq!(href_of(&links, LinkRelation::SelfRef), Some("/orders?pageSize=10"));
        assert!(!links.contains(LinkRelation::Previous));
        assert_eq!(href_of(&links, LinkRelation::Next), Some("/orders?index=10&pageSize=10"));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let links = LinkBuilder::collection_links(&paged(90, 10, 100));
        assert!(!links.contains(LinkRelation::Next));
        assert_eq!(href_of(&links, LinkRelation::Previous), Some("/orders?index=80&pageSize=10"));
    }

    #[test]
    fn test_unknown_total_only_self_and_first() {
        let options = PageOptions::new("/orders").with_index(20).with_page_size(10);
        let links = LinkBuilder::collection_links(&options);

        let relations: Vec<_> = links.relations().collect();
        assert_eq!(relations, vec![LinkRelation::SelfRef, LinkRelation::First]);
    }

    #[test]
    fn test_single_page_last_falls_back_to_first() {
        let options = paged(0, 10, 10);
        let links = LinkBuilder::collection_links(&options);

        assert!(!links.contains(LinkRelation::Next));
        assert!(!links.contains(LinkRelation::Previous));
        assert_eq!(links.get(LinkRelation::Last), links.get(LinkRelation::First));
    }

    #[test]
    fn test_empty_collection_with_known_total() {
        let links = LinkBuilder::collection_links(&paged(0, 10, 0));
        assert!(!links.contains(LinkRelation::Next));
        assert_eq!(href_of(&links, LinkRelation::Last), Some("/orders?pageSize=10"));
    }

    #[test]
    fn test_zero_page_size_is_unpaged() {
        let options = PageOptions::new("/orders")
            .with_page_size(0)
            .with_total_count(100);
        let links = LinkBuilder::collection_links(&options);

        assert_eq!(href_of(&links, LinkRelation::SelfRef), Some("/orders"));
        assert_eq!(links.len(), 2);
        assert!(LinkBuilder::previous_link(&options).is_none());
        assert!(LinkBuilder::next_link(&options).is_none());
    }

    #[test]
    fn test_unaligned_index() {
        let options = paged(15, 10, 100);
        assert_eq!(
            LinkBuilder::previous_link(&options).unwrap().href,
            "/orders?index=5&pageSize=10"
        );
        assert!(LinkBuilder::previous_link(&paged(5, 10, 100)).is_none());
    }

    #[test]
    fn test_existing_query_string() {
        let options = PageOptions::new("/orders?status=open")
            .with_index(10)
            .with_page_size(10)
            .with_total_count(30);

        assert_eq!(
            LinkBuilder::collection_self_link(&options).href,
            "/orders?status=open&index=10&pageSize=10"
        );
        assert_eq!(
            LinkBuilder::next_link(&options).unwrap().href,
            "/orders?status=open&index=20&pageSize=10"
        );
    }

    #[test]
    fn test_next_link_does_not_overflow() {
        let options = paged(u64::MAX - 1, 10, u64::MAX);
        assert!(LinkBuilder::next_link(&options).is_none());
    }

    #[test]
    fn test_builder_is_idempotent() {
        let options = paged(20, 10, 100);
        assert_eq!(
            LinkBuilder::collection_links(&options),
            LinkBuilder::collection_links(&options)
        );
    }

    #[test]
    fn test_item_links() {
        let links = LinkBuilder::item_links("/orders/42");
        assert_eq!(links.self_href, "/orders/42");
        assert_eq!(
            serde_json::to_value(&links).unwrap(),
            json!({"self": "/orders/42"})
        );
    }

    #[test]
    fn test_collection_links_serialize_in_relation_order() {
        let links = LinkBuilder::collection_links(&paged(20, 10, 100));
        let json = serde_json::to_string(&links).unwrap();
        let order: Vec<_> = ["\"self\"", "\"first\"", "\"previous\"", "\"next\"", "\"last\""]
            .iter()
            .map(|key| json.find(key).unwrap())
            .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_query_param_names() {
        assert_eq!(QueryParam::PageSize.as_str(), "pageSize");
        assert_eq!(QueryParam::SortDir.to_string(), "sortDir");
        assert_eq!(
            serde_json::to_string(&QueryParam::FromDate).unwrap(),
            r#""fromDate""#
        );
        assert_eq!(LinkRelation::SelfRef.to_string(), "self");
    }

    #[test]
    fn test_page_options_deserialize() {
        let options: PageOptions =
            serde_json::from_str(r#"{"resourceUrl": "/orders", "pageSize": 25}"#).unwrap();
        assert_eq!(options.index, 0);
        assert_eq!(options.page_size, Some(25));
        assert_eq!(options.total_count, None);
    }
}
