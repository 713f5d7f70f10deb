//! Dynamic query builder for per-form submission tables
//!
//! Every form has its own column set, so searches cannot be expressed against a
//! fixed entity. The functions here turn generic search/sort/filter/pagination
//! parameters into a small predicate and ordering tree that the storage layer
//! renders for its backend.
//!
//! The builders never fail: unknown or stale inputs (a sort on a column that has
//! since been renamed, a search on a column that no longer exists, an unparsable
//! date) degrade to "no restriction" or the default ordering.
//!
//! Fragments are always combined in the same order: finalized-only, search,
//! view filters, id allowlist, then ordering and pagination.

use crate::contract::{
    is_system_column, is_system_date_column, ColumnSet, Field, FieldDataType, FilterOperator,
    PageSize, Pagination, SearchSpec, SubmissionId, ViewFilter, SUBMISSION_ID,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// `search_field` value that matches the keyword against every searchable column
pub const SEARCH_ALL: &str = "all";

/// Suffix marking a `search_field` as a date search
pub const DATE_FIELD_MARKER: &str = "|date";

/// Day/month ordering of dates typed into the search form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `m/d/y`
    #[default]
    MonthFirst,
    /// `d/m/y`
    DayFirst,
}

/// Type a column is cast to before comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCast {
    DateTime,
    SignedInteger,
}

/// A column reference, optionally cast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTarget {
    pub column: String,
    pub cast: Option<ColumnCast>,
}

impl ColumnTarget {
    pub fn plain(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            cast: None,
        }
    }

    pub fn cast(column: impl Into<String>, cast: ColumnCast) -> Self {
        Self {
            column: column.into(),
            cast: Some(cast),
        }
    }

    /// System date columns are real DATETIMEs; custom date columns hold text
    fn date(column: &str) -> Self {
        if is_system_date_column(column) {
            Self::plain(column)
        } else {
            Self::cast(column, ColumnCast::DateTime)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than `desc` (any case) sorts ascending
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub target: ColumnTarget,
    pub direction: SortDirection,
}

impl OrderTerm {
    fn by_submission_id() -> Self {
        Self {
            target: ColumnTarget::plain(SUBMISSION_ID),
            direction: SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateValue {
    Text(String),
    DateTime(NaiveDateTime),
}

/// Backend-neutral row predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `is_finalized = 'yes'`
    Finalized,
    IdEquals(SubmissionId),
    Like { target: ColumnTarget, pattern: String },
    NotLike { target: ColumnTarget, pattern: String },
    Compare {
        target: ColumnTarget,
        op: Comparison,
        value: PredicateValue,
    },
    Any(Vec<Predicate>),
    All(Vec<Predicate>),
}

impl Predicate {
    fn wildcard(column: &str, keyword: &str) -> Self {
        Self::Like {
            target: ColumnTarget::plain(column),
            pattern: format!("%{keyword}%"),
        }
    }

    /// OR of `parts`, collapsing a single part; `None` when empty
    fn any_of(mut parts: Vec<Predicate>) -> Option<Self> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Self::Any(parts)),
        }
    }

    /// AND of `parts`, collapsing a single part; `None` when empty
    fn all_of(mut parts: Vec<Predicate>) -> Option<Self> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Self::All(parts)),
        }
    }
}

/// Inclusive datetime range produced by a date search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateBounds {
    fn predicate(&self, target: ColumnTarget) -> Predicate {
        Predicate::All(vec![
            Predicate::Compare {
                target: target.clone(),
                op: Comparison::Gte,
                value: PredicateValue::DateTime(self.start),
            },
            Predicate::Compare {
                target,
                op: Comparison::Lte,
                value: PredicateValue::DateTime(self.end),
            },
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub offset: u64,
}

/// A fully composed read over one form table. `columns` names every column read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub columns: Vec<String>,
    pub predicate: Predicate,
    pub order: Vec<OrderTerm>,
    pub window: Option<PageWindow>,
}

// ===== Builders =====

/// The base predicate every listing starts from
pub fn finalized_only() -> Predicate {
    Predicate::Finalized
}

/// Ordering for `order` of the form `<column>-<ASC|DESC>`.
///
/// Empty input or an unknown column sorts ascending by submission id. Custom
/// date columns are cast to DATETIME and numeric columns to a signed integer;
/// everything else sorts natively. Submission id is appended as a tiebreaker
/// unless it is already the sort key.
pub fn order_by(fields: &[Field], order: &str) -> Vec<OrderTerm> {
    let order = order.trim();
    if order.is_empty() {
        return vec![OrderTerm::by_submission_id()];
    }

    let (column, direction) = match order.rsplit_once('-') {
        Some((column, direction)) => (column.trim(), SortDirection::parse(direction)),
        None => (order, SortDirection::Asc),
    };

    let Some(target) = sort_target(fields, column) else {
        return vec![OrderTerm::by_submission_id()];
    };

    let mut terms = vec![OrderTerm { target, direction }];
    if column != SUBMISSION_ID {
        terms.push(OrderTerm::by_submission_id());
    }
    terms
}

fn sort_target(fields: &[Field], column: &str) -> Option<ColumnTarget> {
    if is_system_column(column) {
        return Some(ColumnTarget::plain(column));
    }

    let field = fields.iter().find(|f| f.column_name == column)?;
    let target = if field.is_date_field {
        ColumnTarget::cast(column, ColumnCast::DateTime)
    } else if field.data_type == FieldDataType::Number {
        ColumnTarget::cast(column, ColumnCast::SignedInteger)
    } else {
        ColumnTarget::plain(column)
    };
    Some(target)
}

/// Columns to read. `All` expands to `form_columns`; an explicit list is
/// deduplicated, stripped of empty names, and always includes submission id.
pub fn select_columns(columns: &ColumnSet, form_columns: &[String]) -> Vec<String> {
    match columns {
        ColumnSet::All => form_columns.to_vec(),
        ColumnSet::Only(requested) => {
            let mut selected: Vec<String> = Vec::with_capacity(requested.len() + 1);
            for column in requested {
                let column = column.trim();
                if column.is_empty() || selected.iter().any(|c| c == column) {
                    continue;
                }
                selected.push(column.to_string());
            }
            if !selected.iter().any(|c| c == SUBMISSION_ID) {
                selected.push(SUBMISSION_ID.to_string());
            }
            selected
        }
    }
}

/// AND of the view's configured filters
pub fn view_filter(filters: &[ViewFilter]) -> Option<Predicate> {
    Predicate::all_of(filters.iter().filter_map(filter_predicate).collect())
}

fn filter_predicate(filter: &ViewFilter) -> Option<Predicate> {
    let column = filter.column_name.trim();
    if column.is_empty() || filter.values.is_empty() {
        return None;
    }

    let target = if filter.is_date {
        ColumnTarget::date(column)
    } else {
        ColumnTarget::plain(column)
    };

    let value_of = |raw: &str| -> PredicateValue {
        if filter.is_date {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
                return PredicateValue::DateTime(parsed);
            }
        }
        PredicateValue::Text(raw.to_string())
    };

    let compare = |op: Comparison, raw: &String| Predicate::Compare {
        target: target.clone(),
        op,
        value: value_of(raw),
    };

    match filter.operator {
        FilterOperator::Equals => {
            Predicate::any_of(filter.values.iter().map(|v| compare(Comparison::Eq, v)).collect())
        }
        FilterOperator::NotEquals => Predicate::all_of(
            filter.values.iter().map(|v| compare(Comparison::NotEq, v)).collect(),
        ),
        FilterOperator::Like => Predicate::any_of(
            filter
                .values
                .iter()
                .map(|v| Predicate::Like {
                    target: target.clone(),
                    pattern: format!("%{v}%"),
                })
                .collect(),
        ),
        FilterOperator::NotLike => Predicate::all_of(
            filter
                .values
                .iter()
                .map(|v| Predicate::NotLike {
                    target: target.clone(),
                    pattern: format!("%{v}%"),
                })
                .collect(),
        ),
        FilterOperator::Before => filter.values.first().map(|v| compare(Comparison::Lt, v)),
        FilterOperator::After => filter.values.first().map(|v| compare(Comparison::Gt, v)),
    }
}

/// Predicate for the free-text/date search.
///
/// * `search_field == "all"` with a keyword: wildcard match OR-ed across the
///   searchable columns (or every non-system column for `ColumnSet::All`).
/// * `search_field` ending in `|date`: inclusive datetime range from
///   `search_date`, AND-ed with the keyword match when a keyword is given.
/// * any other known column: wildcard match on that column, given a keyword.
pub fn search_where(
    fields: &[Field],
    spec: &SearchSpec,
    searchable: &ColumnSet,
    date_order: DateOrder,
) -> Option<Predicate> {
    let search_field = spec
        .search_field
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())?;
    let keyword = spec.search_keyword.as_deref().filter(|k| !k.is_empty());

    if search_field == SEARCH_ALL {
        return keyword.and_then(|kw| keyword_predicate(fields, searchable, kw));
    }

    if let Some(column) = search_field.strip_suffix(DATE_FIELD_MARKER) {
        if !is_known_column(fields, column) {
            return None;
        }
        let date = spec.search_date.as_deref().filter(|d| !d.trim().is_empty())?;
        let range = parse_search_date(date, date_order)?.predicate(ColumnTarget::date(column));
        return match keyword.and_then(|kw| keyword_predicate(fields, searchable, kw)) {
            Some(matches) => Some(Predicate::All(vec![range, matches])),
            None => Some(range),
        };
    }

    if !is_known_column(fields, search_field) {
        return None;
    }
    keyword.map(|kw| Predicate::wildcard(search_field, kw))
}

fn keyword_predicate(fields: &[Field], searchable: &ColumnSet, keyword: &str) -> Option<Predicate> {
    let columns: Vec<&str> = match searchable {
        ColumnSet::All => fields
            .iter()
            .filter(|f| !f.is_system_field && !is_system_column(&f.column_name))
            .map(|f| f.column_name.as_str())
            .collect(),
        ColumnSet::Only(columns) => columns
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty() && is_known_column(fields, c))
            .collect(),
    };

    Predicate::any_of(
        columns
            .into_iter()
            .map(|column| Predicate::wildcard(column, keyword))
            .collect(),
    )
}

fn is_known_column(fields: &[Field], column: &str) -> bool {
    is_system_column(column) || fields.iter().any(|f| f.column_name == column)
}

/// OR of `submission_id = ?` for every id; `None` means no restriction
pub fn submission_id_allowlist(ids: &[SubmissionId]) -> Option<Predicate> {
    Predicate::any_of(ids.iter().copied().map(Predicate::IdEquals).collect())
}

/// Limit/offset for a page; `None` returns every row
pub fn page_window(pagination: &Pagination) -> Option<PageWindow> {
    match pagination.per_page {
        PageSize::Unbounded | PageSize::Limit(0) => None,
        PageSize::Limit(limit) => Some(PageWindow {
            limit,
            offset: pagination.page.max(1).saturating_sub(1).saturating_mul(limit),
        }),
    }
}

/// Combine fragments in their fixed order behind the finalized-only base
pub fn compose(
    search: Option<Predicate>,
    filter: Option<Predicate>,
    allowlist: Option<Predicate>,
) -> Predicate {
    let mut parts = vec![finalized_only()];
    parts.extend(search);
    parts.extend(filter);
    parts.extend(allowlist);
    Predicate::All(parts)
}

/// Parse a search date (`D` or `A - B`) into an inclusive range covering
/// whole days: `[A 00:00:00, B 23:59:59]`.
pub fn parse_search_date(input: &str, order: DateOrder) -> Option<DateBounds> {
    let input = input.trim();
    let (start, end) = match input.split_once(" - ") {
        Some((start, end)) => (parse_day(start, order)?, parse_day(end, order)?),
        None => {
            let day = parse_day(input, order)?;
            (day, day)
        }
    };

    Some(DateBounds {
        start: start.and_hms_opt(0, 0, 0)?,
        end: end.and_hms_opt(23, 59, 59)?,
    })
}

fn parse_day(input: &str, order: DateOrder) -> Option<NaiveDate> {
    let mut parts = input.trim().split('/');
    let (first, second, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (day, month) = match order {
        DateOrder::DayFirst => (first, second),
        DateOrder::MonthFirst => (second, first),
    };

    NaiveDate::from_ymd_opt(
        year.trim().parse().ok()?,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn field(column: &str, data_type: FieldDataType, is_date: bool) -> Field {
        Field {
            field_id: 1,
            form_id: 1,
            field_name: column.to_string(),
            column_name: column.to_string(),
            field_title: column.to_string(),
            field_type_id: 1,
            field_size: "medium".to_string(),
            data_type,
            list_order: 1,
            is_system_field: false,
            is_file_field: false,
            is_date_field: is_date,
            include_on_redirect: false,
            settings: BTreeMap::new(),
        }
    }

    fn fields() -> Vec<Field> {
        vec![
            field("first_name", FieldDataType::String, false),
            field("amount", FieldDataType::Number, false),
            field("birthday", FieldDataType::Date, true),
        ]
    }

    fn bound(text: &str) -> PredicateValue {
        PredicateValue::DateTime(
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap(),
        )
    }

    #[test]
    fn test_empty_order_sorts_by_submission_id() {
        assert_eq!(order_by(&fields(), ""), vec![OrderTerm::by_submission_id()]);
    }

    #[test]
    fn test_unknown_sort_column_degrades_to_default() {
        assert_eq!(
            order_by(&fields(), "renamed_col-DESC"),
            vec![OrderTerm::by_submission_id()]
        );
    }

    #[test]
    fn test_numeric_column_sorts_as_signed_integer_with_tiebreak() {
        let terms = order_by(&fields(), "amount-DESC");
        assert_eq!(
            terms,
            vec![
                OrderTerm {
                    target: ColumnTarget::cast("amount", ColumnCast::SignedInteger),
                    direction: SortDirection::Desc,
                },
                OrderTerm::by_submission_id(),
            ]
        );
    }

    #[test]
    fn test_custom_date_column_is_cast_and_system_date_is_native() {
        let custom = order_by(&fields(), "birthday-asc");
        assert_eq!(custom[0].target, ColumnTarget::cast("birthday", ColumnCast::DateTime));

        let system = order_by(&fields(), "submission_date-desc");
        assert_eq!(system[0].target, ColumnTarget::plain("submission_date"));
        assert_eq!(system[0].direction, SortDirection::Desc);
        assert_eq!(system.len(), 2);
    }

    #[test]
    fn test_sorting_by_submission_id_adds_no_tiebreak() {
        let terms = order_by(&fields(), "submission_id-DESC");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_select_columns_dedupes_drops_empty_and_forces_id() {
        let selected = select_columns(
            &ColumnSet::Only(vec![
                "first_name".into(),
                "".into(),
                "amount".into(),
                "first_name".into(),
            ]),
            &[],
        );
        assert_eq!(selected, vec!["first_name", "amount", "submission_id"]);
    }

    #[test]
    fn test_select_all_expands_to_form_columns() {
        let form_columns = vec!["submission_id".to_string(), "first_name".to_string()];
        assert_eq!(select_columns(&ColumnSet::All, &form_columns), form_columns);
    }

    #[test]
    fn test_keyword_across_all_columns() {
        let spec = SearchSpec {
            search_field: Some("all".into()),
            search_date: None,
            search_keyword: Some("bob".into()),
        };
        let predicate = search_where(
            &fields(),
            &spec,
            &ColumnSet::Only(vec!["first_name".into(), "amount".into()]),
            DateOrder::MonthFirst,
        );
        assert_eq!(
            predicate,
            Some(Predicate::Any(vec![
                Predicate::wildcard("first_name", "bob"),
                Predicate::wildcard("amount", "bob"),
            ]))
        );
    }

    #[test]
    fn test_all_sentinel_searches_every_custom_column() {
        let spec = SearchSpec {
            search_field: Some("all".into()),
            search_date: None,
            search_keyword: Some("x".into()),
        };
        let Some(Predicate::Any(parts)) =
            search_where(&fields(), &spec, &ColumnSet::All, DateOrder::MonthFirst)
        else {
            panic!("expected an OR of wildcard matches");
        };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_all_without_keyword_is_no_restriction() {
        let spec = SearchSpec {
            search_field: Some("all".into()),
            ..SearchSpec::default()
        };
        assert_eq!(search_where(&fields(), &spec, &ColumnSet::All, DateOrder::MonthFirst), None);
    }

    #[test]
    fn test_month_first_range_bounds() {
        let bounds = parse_search_date("01/02/2020 - 01/05/2020", DateOrder::MonthFirst).unwrap();
        assert_eq!(bounds.start.format("%Y-%m-%d %H:%M:%S").to_string(), "2020-01-02 00:00:00");
        assert_eq!(bounds.end.format("%Y-%m-%d %H:%M:%S").to_string(), "2020-01-05 23:59:59");
    }

    #[test]
    fn test_day_first_single_day_bounds() {
        let bounds = parse_search_date("5/1/2021", DateOrder::DayFirst).unwrap();
        assert_eq!(bounds.start.format("%Y-%m-%d %H:%M:%S").to_string(), "2021-01-05 00:00:00");
        assert_eq!(bounds.end.format("%Y-%m-%d %H:%M:%S").to_string(), "2021-01-05 23:59:59");
    }

    #[test]
    fn test_unparsable_date_degrades_to_no_restriction() {
        assert!(parse_search_date("yesterday", DateOrder::MonthFirst).is_none());
        assert!(parse_search_date("13/45/2020", DateOrder::MonthFirst).is_none());

        let spec = SearchSpec {
            search_field: Some("submission_date|date".into()),
            search_date: Some("not a date".into()),
            search_keyword: None,
        };
        assert_eq!(search_where(&fields(), &spec, &ColumnSet::All, DateOrder::MonthFirst), None);
    }

    #[test]
    fn test_system_date_search_is_native_custom_date_is_cast() {
        let spec = SearchSpec {
            search_field: Some("submission_date|date".into()),
            search_date: Some("1/2/2020".into()),
            search_keyword: None,
        };
        let predicate = search_where(&fields(), &spec, &ColumnSet::All, DateOrder::MonthFirst);
        assert_eq!(
            predicate,
            Some(Predicate::All(vec![
                Predicate::Compare {
                    target: ColumnTarget::plain("submission_date"),
                    op: Comparison::Gte,
                    value: bound("2020-01-02 00:00:00"),
                },
                Predicate::Compare {
                    target: ColumnTarget::plain("submission_date"),
                    op: Comparison::Lte,
                    value: bound("2020-01-02 23:59:59"),
                },
            ]))
        );

        let spec = SearchSpec {
            search_field: Some("birthday|date".into()),
            search_date: Some("1/2/2020".into()),
            search_keyword: None,
        };
        let Some(Predicate::All(parts)) =
            search_where(&fields(), &spec, &ColumnSet::All, DateOrder::MonthFirst)
        else {
            panic!("expected a date range");
        };
        assert!(matches!(
            &parts[0],
            Predicate::Compare { target, .. } if target.cast == Some(ColumnCast::DateTime)
        ));
    }

    #[test]
    fn test_date_search_with_keyword_ands_the_keyword_match() {
        let spec = SearchSpec {
            search_field: Some("submission_date|date".into()),
            search_date: Some("1/2/2020 - 1/3/2020".into()),
            search_keyword: Some("bob".into()),
        };
        let Some(Predicate::All(parts)) = search_where(
            &fields(),
            &spec,
            &ColumnSet::Only(vec!["first_name".into()]),
            DateOrder::MonthFirst,
        ) else {
            panic!("expected range AND keyword");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1], Predicate::wildcard("first_name", "bob"));
    }

    #[test]
    fn test_single_column_search_needs_field_and_keyword() {
        let spec = SearchSpec {
            search_field: Some("first_name".into()),
            search_date: None,
            search_keyword: Some("al".into()),
        };
        assert_eq!(
            search_where(&fields(), &spec, &ColumnSet::All, DateOrder::MonthFirst),
            Some(Predicate::wildcard("first_name", "al"))
        );

        let spec = SearchSpec {
            search_field: Some("first_name".into()),
            ..SearchSpec::default()
        };
        assert_eq!(search_where(&fields(), &spec, &ColumnSet::All, DateOrder::MonthFirst), None);
    }

    #[test]
    fn test_search_on_removed_column_is_ignored() {
        let spec = SearchSpec {
            search_field: Some("dropped_col".into()),
            search_date: None,
            search_keyword: Some("x".into()),
        };
        assert_eq!(search_where(&fields(), &spec, &ColumnSet::All, DateOrder::MonthFirst), None);
    }

    #[test]
    fn test_allowlist_ors_ids_and_empty_is_unrestricted() {
        assert_eq!(submission_id_allowlist(&[]), None);
        assert_eq!(
            submission_id_allowlist(&[3, 9]),
            Some(Predicate::Any(vec![Predicate::IdEquals(3), Predicate::IdEquals(9)]))
        );
    }

    #[test]
    fn test_view_filters_are_anded() {
        let filters = vec![
            ViewFilter {
                column_name: "first_name".into(),
                operator: FilterOperator::Equals,
                values: vec!["Ann".into(), "Bob".into()],
                is_date: false,
            },
            ViewFilter {
                column_name: "amount".into(),
                operator: FilterOperator::NotEquals,
                values: vec!["0".into()],
                is_date: false,
            },
            ViewFilter {
                column_name: "ignored".into(),
                operator: FilterOperator::Like,
                values: vec![],
                is_date: false,
            },
        ];
        let Some(Predicate::All(parts)) = view_filter(&filters) else {
            panic!("expected AND of filters");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], Predicate::Any(values) if values.len() == 2));
        assert!(matches!(&parts[1], Predicate::Compare { op: Comparison::NotEq, .. }));
        assert_eq!(view_filter(&[]), None);
    }

    #[test]
    fn test_compose_keeps_fixed_order() {
        let composed = compose(
            Some(Predicate::wildcard("first_name", "a")),
            None,
            Some(Predicate::IdEquals(1)),
        );
        assert_eq!(
            composed,
            Predicate::All(vec![
                Predicate::Finalized,
                Predicate::wildcard("first_name", "a"),
                Predicate::IdEquals(1),
            ])
        );
    }

    #[test]
    fn test_page_window() {
        let unbounded = Pagination::default();
        assert_eq!(page_window(&unbounded), None);

        let third_page = Pagination {
            page: 3,
            per_page: PageSize::Limit(10),
        };
        assert_eq!(page_window(&third_page), Some(PageWindow { limit: 10, offset: 20 }));

        let page_zero = Pagination {
            page: 0,
            per_page: PageSize::Limit(10),
        };
        assert_eq!(page_window(&page_zero), Some(PageWindow { limit: 10, offset: 0 }));
    }
}
