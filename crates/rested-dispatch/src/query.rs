use std::sync::Arc;

use rested_store::EntryMap;
use rested_types::{Filter, Resource, ResourceId};
use serde_json::Value;

use crate::error::{QueryError, QueryResult};

pub const PAGE_SIZE: &str = "pageSize";
pub const PAGE_NUM: &str = "pageNum";
pub const PAGE_AFTER: &str = "pageAfter";
pub const ORDER_BY: &str = "orderBy";

/// Listing parameters as received from the caller.
///
/// Paging values are kept raw and validated against the collection when the
/// listing is planned. Every unrecognized parameter becomes a filter entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page_size: Option<String>,
    pub page_num: Option<String>,
    pub page_after: Option<String>,
    pub order_by: Option<String>,
    pub filter: Filter,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split query-string pairs into paging, ordering and filter parameters.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut query = Self::new();
        for (key, value) in params {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                PAGE_SIZE => query.page_size = Some(value),
                PAGE_NUM => query.page_num = Some(value),
                PAGE_AFTER => query.page_after = Some(value),
                ORDER_BY => query.order_by = Some(value),
                _ => {
                    query.filter.insert(key, value);
                }
            }
        }
        query
    }

    pub fn with_page_size(mut self, size: impl ToString) -> Self {
        self.page_size = Some(size.to_string());
        self
    }

    pub fn with_page_num(mut self, num: impl ToString) -> Self {
        self.page_num = Some(num.to_string());
        self
    }

    pub fn with_page_after(mut self, id: impl Into<String>) -> Self {
        self.page_after = Some(id.into());
        self
    }

    pub fn with_order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    pub fn has_filter(&self) -> bool {
        !self.filter.is_empty()
    }

    /// Validate against `entries` and produce a listing plan.
    ///
    /// An unknown `orderBy` field wins over any paging error.
    pub fn plan<R: Resource>(&self, entries: &EntryMap<R>) -> QueryResult<ListPlan> {
        let page = self.validate_paging(entries);

        if let Some(field) = &self.order_by {
            // Only the first resource in id order is inspected.
            if let Some((_, first)) = entries.iter().next() {
                if first.field(field).is_none() {
                    return Err(QueryError::UnknownOrderBy(field.clone()));
                }
            }
        }

        Ok(ListPlan {
            order_by: self.order_by.clone(),
            page: page?,
        })
    }

    fn validate_paging<R>(&self, entries: &EntryMap<R>) -> QueryResult<Option<Page>> {
        let Some(raw_size) = &self.page_size else {
            if self.page_after.is_some() {
                return Err(QueryError::MissingPageSize(PAGE_AFTER));
            }
            if self.page_num.is_some() {
                return Err(QueryError::MissingPageSize(PAGE_NUM));
            }
            return Ok(None);
        };

        let size = parse_positive(PAGE_SIZE, raw_size)?;

        if let Some(after) = &self.page_after {
            if !entries.contains_key(after.as_str()) {
                return Err(QueryError::UnknownPageAfter(after.clone()));
            }
        }
        let num = self
            .page_num
            .as_deref()
            .map(|raw| parse_positive(PAGE_NUM, raw))
            .transpose()?;

        let start = match (&self.page_after, num) {
            (Some(after), _) => PageStart::After(ResourceId::from(after.as_str())),
            (None, Some(n)) => PageStart::Number(n),
            (None, None) => PageStart::First,
        };
        Ok(Some(Page { size, start }))
    }
}

fn parse_positive(param: &'static str, raw: &str) -> QueryResult<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| QueryError::InvalidNumber {
            param,
            value: raw.to_string(),
        })
}

/// Where a page begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageStart {
    First,
    /// Everything up to and including this id is skipped.
    After(ResourceId),
    /// 1-based page number over the visible resources.
    Number(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub size: usize,
    pub start: PageStart,
}

/// A validated listing: ordering plus optional page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPlan {
    pub order_by: Option<String>,
    pub page: Option<Page>,
}

impl ListPlan {
    /// All entries in listing order: by id, or stably by the `orderBy` field
    /// compared case-insensitively as text.
    pub fn order<'a, R: Resource>(
        &self,
        entries: &'a EntryMap<R>,
    ) -> Vec<(&'a ResourceId, &'a Arc<R>)> {
        let mut ordered: Vec<_> = entries.iter().collect();
        if let Some(field) = &self.order_by {
            ordered.sort_by_cached_key(|(_, r)| sort_key(r.field(field)));
        }
        ordered
    }

    /// Apply the page to `ordered`, counting only entries accepted by
    /// `visible`.
    pub fn select<'a, R, F>(
        &self,
        ordered: Vec<(&'a ResourceId, &'a Arc<R>)>,
        mut visible: F,
    ) -> Vec<(&'a ResourceId, &'a Arc<R>)>
    where
        F: FnMut(&R) -> bool,
    {
        let start = match self.page.as_ref().map(|p| &p.start) {
            Some(PageStart::After(after)) => ordered
                .iter()
                .position(|(id, _)| *id == after)
                .map_or(0, |i| i + 1),
            _ => 0,
        };

        let shown = ordered
            .into_iter()
            .skip(start)
            .filter(|entry| visible(entry.1));

        match &self.page {
            None => shown.collect(),
            Some(page) => {
                let skip = match page.start {
                    PageStart::Number(n) => (n - 1).saturating_mul(page.size),
                    _ => 0,
                };
                shown.skip(skip).take(page.size).collect()
            }
        }
    }
}

fn sort_key(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.to_uppercase(),
        Some(other) => other.to_string().to_uppercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rested_types::{IdentityMode, Mutability, Payload, ResourceKind, ValidationError};
    use serde::Serialize;
    use serde_json::json;

    #[derive(Clone, Serialize)]
    struct Beer {
        id: ResourceId,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    }

    impl Resource for Beer {
        const KIND: ResourceKind =
            ResourceKind::new(IdentityMode::ClientAssigned, Mutability::Immutable);

        fn from_payload(_: Option<ResourceId>, _: &Payload) -> Result<Self, ValidationError> {
            Err(ValidationError::new("not used"))
        }

        fn id(&self) -> Option<&ResourceId> {
            Some(&self.id)
        }
    }

    fn entries(rows: &[(&str, &str, Option<&str>)]) -> EntryMap<Beer> {
        rows.iter()
            .map(|(id, name, style)| {
                (
                    ResourceId::from(*id),
                    Arc::new(Beer {
                        id: ResourceId::from(*id),
                        name: name.to_string(),
                        style: style.map(str::to_string),
                    }),
                )
            })
            .collect()
    }

    fn ids(selected: &[(&ResourceId, &Arc<Beer>)]) -> Vec<String> {
        selected.iter().map(|(id, _)| id.to_string()).collect()
    }

    // =====================================================================
    // Parsing
    // =====================================================================

    #[test]
    fn params_are_split() {
        let q = ListQuery::from_params([
            ("pageSize", "2"),
            ("orderBy", "name"),
            ("style", "ipa"),
        ]);
        assert_eq!(q.page_size.as_deref(), Some("2"));
        assert_eq!(q.order_by.as_deref(), Some("name"));
        assert_eq!(q.filter.get("style").map(String::as_str), Some("ipa"));
        assert!(q.has_filter());
    }

    // =====================================================================
    // Validation
    // =====================================================================

    #[test]
    fn paging_without_size_is_rejected() {
        let map = entries(&[("a", "A", None)]);
        assert_eq!(
            ListQuery::new().with_page_num(1).plan(&map),
            Err(QueryError::MissingPageSize(PAGE_NUM))
        );
        assert_eq!(
            ListQuery::new().with_page_after("a").plan(&map),
            Err(QueryError::MissingPageSize(PAGE_AFTER))
        );
    }

    #[test]
    fn page_numbers_must_be_positive_integers() {
        let map = entries(&[("a", "A", None)]);
        for bad in ["0", "-1", "two", "1.5", ""] {
            let err = ListQuery::new().with_page_size(bad).plan(&map).unwrap_err();
            assert!(matches!(err, QueryError::InvalidNumber { param: PAGE_SIZE, .. }));
        }
        let err = ListQuery::new()
            .with_page_size(1)
            .with_page_num(0)
            .plan(&map)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidNumber { param: PAGE_NUM, .. }));
    }

    #[test]
    fn unknown_page_after_is_not_found() {
        let map = entries(&[("a", "A", None)]);
        let err = ListQuery::new()
            .with_page_size(1)
            .with_page_after("zzz")
            .plan(&map)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn order_by_checks_first_resource_only() {
        let map = entries(&[("a", "A", None), ("b", "B", Some("ipa"))]);
        assert_eq!(
            ListQuery::new().with_order_by("style").plan(&map),
            Err(QueryError::UnknownOrderBy("style".into()))
        );

        let map = entries(&[("a", "A", Some("ipa")), ("b", "B", None)]);
        assert!(ListQuery::new().with_order_by("style").plan(&map).is_ok());
    }

    #[test]
    fn order_by_error_wins_over_paging_error() {
        let map = entries(&[("a", "A", None)]);
        assert_eq!(
            ListQuery::new()
                .with_page_size("x")
                .with_order_by("style")
                .plan(&map),
            Err(QueryError::UnknownOrderBy("style".into()))
        );
    }

    #[test]
    fn empty_collection_accepts_any_order_by() {
        let map: EntryMap<Beer> = EntryMap::new();
        assert!(ListQuery::new().with_order_by("anything").plan(&map).is_ok());
    }

    // =====================================================================
    // Ordering and selection
    // =====================================================================

    #[test]
    fn order_by_is_case_insensitive_and_stable() {
        let map = entries(&[
            ("a", "stout", None),
            ("b", "Amber", None),
            ("c", "STOUT", None),
            ("d", "lager", None),
        ]);
        let plan = ListQuery::new().with_order_by("name").plan(&map).unwrap();
        let ordered = plan.order(&map);
        assert_eq!(ids(&ordered), ["b", "d", "a", "c"]);
    }

    #[test]
    fn page_after_uses_chosen_order() {
        let map = entries(&[("a", "z", None), ("b", "y", None), ("c", "x", None)]);
        let plan = ListQuery::new()
            .with_order_by("name")
            .with_page_size(5)
            .with_page_after("c")
            .plan(&map)
            .unwrap();
        let selected = plan.select(plan.order(&map), |_| true);
        assert_eq!(ids(&selected), ["b", "a"]);
    }

    #[test]
    fn page_num_counts_visible_resources() {
        let map = entries(&[
            ("a", "A", None),
            ("b", "B", Some("hidden")),
            ("c", "C", None),
            ("d", "D", None),
            ("e", "E", None),
        ]);
        let plan = ListQuery::new()
            .with_page_size(2)
            .with_page_num(2)
            .plan(&map)
            .unwrap();
        let selected = plan.select(plan.order(&map), |b| b.style.is_none());
        assert_eq!(ids(&selected), ["d", "e"]);
    }

    #[test]
    fn page_past_end_is_empty() {
        let map = entries(&[("a", "A", None)]);
        let plan = ListQuery::new()
            .with_page_size(10)
            .with_page_num(3)
            .plan(&map)
            .unwrap();
        assert!(plan.select(plan.order(&map), |_| true).is_empty());
    }

    #[test]
    fn sort_key_renders_non_strings() {
        assert_eq!(sort_key(Some(json!("Ale"))), "ALE");
        assert_eq!(sort_key(Some(json!(10))), "10");
        assert_eq!(sort_key(None), "");
    }
}
