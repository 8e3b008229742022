//! List filters and pagination.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{AddressKind, Email, Id, Role};
use crate::{OvooError, Result};

/// Page size used when a query does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// First page number.
pub const DEFAULT_PAGE: u32 = 1;

/// Query map as produced by URL query parsing: key -> all values.
pub type QueryMap = HashMap<String, Vec<String>>;

/// Paging and id selection shared by all filters.
///
/// `page_size == 0` disables paging entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub page: u32,
    pub page_size: u32,
    pub ids: Vec<Id>,
}

impl Filter {
    /// Filter returning everything in one go.
    pub fn unpaged() -> Self {
        Self::default()
    }

    /// Filter for one page.
    pub fn paged(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ids: Vec::new(),
        }
    }

    /// Parse `id`, `page` and `page_size`, applying defaults for missing or
    /// zero paging values.
    pub fn from_query(query: &QueryMap) -> Result<Self> {
        let mut filter = Self::default();
        if let Some(ids) = query.get("id") {
            filter.ids = ids.iter().map(|v| Id::from(v.as_str())).collect();
        }
        if let Some(value) = first(query, "page") {
            filter.page = parse_number("page", value)?;
        }
        if let Some(value) = first(query, "page_size") {
            filter.page_size = parse_number("page_size", value)?;
        }
        if filter.page_size == 0 {
            filter.page_size = DEFAULT_PAGE_SIZE;
        }
        if filter.page == 0 {
            filter.page = DEFAULT_PAGE;
        }
        Ok(filter)
    }

    /// Whether a LIMIT/OFFSET should be applied.
    pub fn is_paged(&self) -> bool {
        self.page_size > 0
    }

    /// Row offset of the current page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(self.page_size)
    }

    /// Pagination metadata for this filter and a total row count.
    pub fn metadata(&self, count: i64) -> PaginationMetadata {
        PaginationMetadata::new(self.page, self.page_size, count)
    }
}

/// Address list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFilter {
    pub filter: Filter,
    pub kinds: Vec<AddressKind>,
    pub emails: Vec<Email>,
    pub owners: Vec<Id>,
    pub service_names: Vec<String>,
    pub forward_address_ids: Vec<Id>,
}

impl AddressFilter {
    /// Parse the common keys plus `type`, `owner`, `email` and `service_name`.
    pub fn from_query(query: &QueryMap) -> Result<Self> {
        let mut af = Self {
            filter: Filter::from_query(query)?,
            ..Self::default()
        };
        if let Some(values) = query.get("type") {
            af.kinds = values
                .iter()
                .map(|v| v.parse::<AddressKind>())
                .collect::<Result<_>>()?;
        }
        if let Some(values) = query.get("owner") {
            af.owners = values.iter().map(|v| Id::from(v.as_str())).collect();
        }
        if let Some(values) = query.get("email") {
            af.emails = values.iter().map(|v| Email::from(v.as_str())).collect();
        }
        if let Some(values) = query.get("service_name") {
            af.service_names = values.clone();
        }
        Ok(af)
    }

    /// Unpaged filter on kind only.
    pub fn of_kind(kind: AddressKind) -> Self {
        Self {
            kinds: vec![kind],
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: Id) -> Self {
        self.owners = vec![owner];
        self
    }

    pub fn with_forward_address(mut self, forward: Id) -> Self {
        self.forward_address_ids = vec![forward];
        self
    }
}

/// Chain list filter. All id lists are matched against address ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainFilter {
    pub filter: Filter,
    pub orig_from_address_ids: Vec<Id>,
    pub orig_to_address_ids: Vec<Id>,
    pub from_address_ids: Vec<Id>,
    pub to_address_ids: Vec<Id>,
}

impl ChainFilter {
    /// Parse the common keys only.
    pub fn from_query(query: &QueryMap) -> Result<Self> {
        Ok(Self {
            filter: Filter::from_query(query)?,
            ..Self::default()
        })
    }
}

/// User list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub filter: Filter,
    pub kinds: Vec<Role>,
    pub logins: Vec<String>,
}

impl UserFilter {
    /// Parse the common keys plus `type` and `login`.
    pub fn from_query(query: &QueryMap) -> Result<Self> {
        let mut uf = Self {
            filter: Filter::from_query(query)?,
            ..Self::default()
        };
        if let Some(values) = query.get("type") {
            uf.kinds = values
                .iter()
                .map(|v| v.parse::<Role>())
                .collect::<Result<_>>()?;
        }
        if let Some(values) = query.get("login") {
            uf.logins = values.clone();
        }
        Ok(uf)
    }
}

/// API token list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiTokenFilter {
    pub filter: Filter,
}

impl ApiTokenFilter {
    pub fn from_query(query: &QueryMap) -> Result<Self> {
        Ok(Self {
            filter: Filter::from_query(query)?,
        })
    }
}

/// Page bookkeeping returned alongside list results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    pub current_page: u32,
    pub page_size: u32,
    pub first_page: u32,
    pub last_page: u32,
    pub total_records: u64,
}

impl PaginationMetadata {
    /// All fields are zero when there is nothing to page over.
    pub fn new(page: u32, page_size: u32, count: i64) -> Self {
        if count <= 0 || page_size == 0 {
            return Self::default();
        }
        let count = count as u64;
        let size = u64::from(page_size);
        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: count.div_ceil(size) as u32,
            total_records: count,
        }
    }
}

fn first<'a>(query: &'a QueryMap, key: &str) -> Option<&'a str> {
    query.get(key).and_then(|v| v.first()).map(String::as_str)
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| OvooError::Validation(format!("invalid {key} value='{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &[&str])]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_filter_defaults() {
        let f = Filter::from_query(&QueryMap::new()).unwrap();
        assert_eq!(f.page, DEFAULT_PAGE);
        assert_eq!(f.page_size, DEFAULT_PAGE_SIZE);
        assert!(f.ids.is_empty());
    }

    #[test]
    fn test_filter_zero_values_get_defaults() {
        let f = Filter::from_query(&query(&[("page", &["0"]), ("page_size", &["0"])])).unwrap();
        assert_eq!(f.page, 1);
        assert_eq!(f.page_size, 5);
    }

    #[test]
    fn test_filter_parses_values() {
        let f = Filter::from_query(&query(&[
            ("page", &["3", "9"]),
            ("page_size", &["20"]),
            ("id", &["a", "b"]),
        ]))
        .unwrap();
        assert_eq!(f.page, 3);
        assert_eq!(f.page_size, 20);
        assert_eq!(f.ids, vec![Id::from("a"), Id::from("b")]);
        assert_eq!(f.offset(), 40);
    }

    #[test]
    fn test_filter_rejects_non_numeric() {
        let err = Filter::from_query(&query(&[("page", &["two"])])).unwrap_err();
        assert!(matches!(err, OvooError::Validation(_)));
        assert!(Filter::from_query(&query(&[("page_size", &["-1"])])).is_err());
    }

    #[test]
    fn test_address_filter() {
        let af = AddressFilter::from_query(&query(&[
            ("type", &["0", "protected"]),
            ("owner", &["u1"]),
            ("email", &["a@x.org"]),
            ("service_name", &["shop"]),
        ]))
        .unwrap();
        assert_eq!(af.kinds, vec![AddressKind::Alias, AddressKind::Protected]);
        assert_eq!(af.owners, vec![Id::from("u1")]);
        assert_eq!(af.emails, vec![Email::from("a@x.org")]);
        assert_eq!(af.service_names, vec!["shop".to_string()]);
        assert_eq!(af.filter.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_address_filter_unknown_type() {
        assert!(AddressFilter::from_query(&query(&[("type", &["7"])])).is_err());
    }

    #[test]
    fn test_user_filter() {
        let uf = UserFilter::from_query(&query(&[("type", &["1"]), ("login", &["root"])])).unwrap();
        assert_eq!(uf.kinds, vec![Role::Admin]);
        assert_eq!(uf.logins, vec!["root".to_string()]);
        assert!(UserFilter::from_query(&query(&[("type", &["3"])])).is_err());
    }

    #[test]
    fn test_pagination_metadata() {
        let m = PaginationMetadata::new(2, 5, 11);
        assert_eq!(m.current_page, 2);
        assert_eq!(m.first_page, 1);
        assert_eq!(m.last_page, 3);
        assert_eq!(m.total_records, 11);

        assert_eq!(PaginationMetadata::new(1, 5, 10).last_page, 2);
        assert_eq!(PaginationMetadata::new(1, 5, 0), PaginationMetadata::default());
        assert_eq!(PaginationMetadata::new(1, 0, 10), PaginationMetadata::default());
    }
}
