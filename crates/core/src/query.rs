//! Property list query builder.
//!
//! Translates the raw query-string map into a typed filter and optional
//! sort. Recognized filter parameters are the four structural detail fields,
//! either as exact matches (`?bedrooms=3`) or as composable ranges
//! (`?bedrooms[gte]=2&bedrooms[lte]=4`). Everything else is ignored, never
//! an error.

use std::collections::{BTreeMap, HashMap};

use haven_db::entities::property;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, Order};

/// Pattern of a range parameter: `<field>[<op>]`.
#[allow(clippy::expect_used)]
static RANGE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\[(gte|lte|gt|lt)\]$").expect("range parameter pattern is valid"));

/// A filterable structural detail of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DetailField {
    Bedrooms,
    Beds,
    Bathrooms,
    MaxGuests,
}

impl DetailField {
    /// Parse a query parameter name into a detail field.
    fn parse(name: &str) -> Option<Self> {
        match name {
            "bedrooms" => Some(Self::Bedrooms),
            "beds" => Some(Self::Beds),
            "bathrooms" => Some(Self::Bathrooms),
            "maxGuests" => Some(Self::MaxGuests),
            _ => None,
        }
    }

    /// The database column this field filters on.
    #[must_use]
    pub const fn column(self) -> property::Column {
        match self {
            Self::Bedrooms => property::Column::Bedrooms,
            Self::Beds => property::Column::Beds,
            Self::Bathrooms => property::Column::Bathrooms,
            Self::MaxGuests => property::Column::MaxGuests,
        }
    }
}

/// Accumulated numeric constraints on one detail field.
///
/// `unmatchable` records a value that failed numeric coercion; the original
/// behavior for such input is a filter nothing satisfies, so the lowered
/// condition selects no rows rather than dropping the clause.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericFilter {
    pub eq: Option<f64>,
    pub gte: Option<f64>,
    pub lte: Option<f64>,
    pub gt: Option<f64>,
    pub lt: Option<f64>,
    pub unmatchable: bool,
}

/// A resolved sort specification.
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    /// Column to order by.
    pub column: property::Column,
    /// `order=asc` sorts ascending; anything else descends.
    pub ascending: bool,
}

/// Parsed property list query: detail filters plus optional sort.
#[derive(Debug, Default)]
pub struct ListQuery {
    filters: BTreeMap<DetailField, NumericFilter>,
    /// Optional sort; absent means the result set is unordered.
    pub sort: Option<SortSpec>,
}

impl ListQuery {
    /// Build a query from the raw query-string parameters.
    #[must_use]
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut filters: BTreeMap<DetailField, NumericFilter> = BTreeMap::new();

        for (param, value) in params {
            if let Some(caps) = RANGE_PARAM.captures(param) {
                if let Some(field) = DetailField::parse(&caps[1]) {
                    let entry = filters.entry(field).or_default();
                    match parse_number(value) {
                        Some(number) => match &caps[2] {
                            "gte" => entry.gte = Some(number),
                            "lte" => entry.lte = Some(number),
                            "gt" => entry.gt = Some(number),
                            _ => entry.lt = Some(number),
                        },
                        None => entry.unmatchable = true,
                    }
                }
            } else if let Some(field) = DetailField::parse(param) {
                let entry = filters.entry(field).or_default();
                match parse_number(value) {
                    Some(number) => entry.eq = Some(number),
                    None => entry.unmatchable = true,
                }
            }
        }

        let sort = params.get("sortBy").map(|sort_by| SortSpec {
            column: resolve_sort_column(sort_by),
            ascending: params.get("order").is_some_and(|order| order == "asc"),
        });

        Self { filters, sort }
    }

    /// Lower the filters to a sea-orm condition.
    #[must_use]
    pub fn to_condition(&self) -> Condition {
        let mut condition = Condition::all();

        for (field, filter) in &self.filters {
            if filter.unmatchable {
                condition = condition.add(Expr::value(false));
                continue;
            }

            let column = field.column();
            if let Some(value) = filter.eq {
                condition = condition.add(column.eq(value));
            }
            if let Some(value) = filter.gte {
                condition = condition.add(column.gte(value));
            }
            if let Some(value) = filter.lte {
                condition = condition.add(column.lte(value));
            }
            if let Some(value) = filter.gt {
                condition = condition.add(column.gt(value));
            }
            if let Some(value) = filter.lt {
                condition = condition.add(column.lt(value));
            }
        }

        condition
    }

    /// The order pair for the repository, if a sort was requested.
    #[must_use]
    pub fn order(&self) -> Option<(property::Column, Order)> {
        self.sort.map(|sort| {
            let direction = if sort.ascending { Order::Asc } else { Order::Desc };
            (sort.column, direction)
        })
    }
}

/// Coerce a query value to a number; `None` marks the filter unmatchable.
fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Resolve a `sortBy` value to a property column.
///
/// `recent` and `rating` are the documented aliases; any other value is
/// taken as a literal field name among the known columns, and unknown names
/// fall back to creation time.
fn resolve_sort_column(sort_by: &str) -> property::Column {
    match sort_by {
        "rating" => property::Column::RatingAverage,
        "title" => property::Column::Title,
        "address" => property::Column::Address,
        "updatedAt" => property::Column::UpdatedAt,
        "bedrooms" => property::Column::Bedrooms,
        "beds" => property::Column::Beds,
        "bathrooms" => property::Column::Bathrooms,
        "maxGuests" => property::Column::MaxGuests,
        _ => property::Column::CreatedAt,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use haven_db::entities::Property;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn sql(query: &ListQuery) -> String {
        Property::find()
            .filter(query.to_condition())
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_exact_match() {
        let query = ListQuery::from_params(&params(&[("bedrooms", "3")]));

        let filter = query.filters.get(&DetailField::Bedrooms).unwrap();
        assert_eq!(filter.eq, Some(3.0));
        assert!(!filter.unmatchable);
    }

    #[test]
    fn test_range_operators_compose_per_field() {
        let query = ListQuery::from_params(&params(&[
            ("bedrooms[gte]", "2"),
            ("bedrooms[lte]", "4"),
            ("maxGuests[gt]", "6"),
        ]));

        let bedrooms = query.filters.get(&DetailField::Bedrooms).unwrap();
        assert_eq!(bedrooms.gte, Some(2.0));
        assert_eq!(bedrooms.lte, Some(4.0));
        assert_eq!(bedrooms.eq, None);

        let guests = query.filters.get(&DetailField::MaxGuests).unwrap();
        assert_eq!(guests.gt, Some(6.0));
    }

    #[test]
    fn test_unknown_params_are_ignored() {
        let query = ListQuery::from_params(&params(&[
            ("color", "blue"),
            ("price[gte]", "100"),
            ("bedrooms[between]", "2"),
        ]));

        assert!(query.filters.is_empty());
        assert!(query.sort.is_none());
    }

    #[test]
    fn test_non_numeric_value_matches_nothing() {
        let query = ListQuery::from_params(&params(&[("bedrooms", "lots")]));

        assert!(query.filters.get(&DetailField::Bedrooms).unwrap().unmatchable);
        assert!(sql(&query).contains("FALSE"));
    }

    #[test]
    fn test_condition_sql_contains_range() {
        let query = ListQuery::from_params(&params(&[
            ("bedrooms[gte]", "2"),
            ("bedrooms[lte]", "4"),
        ]));

        let sql = sql(&query);
        assert!(sql.contains(r#""bedrooms" >= 2"#));
        assert!(sql.contains(r#""bedrooms" <= 4"#));
    }

    #[test]
    fn test_sort_recent_descends_by_default() {
        let query = ListQuery::from_params(&params(&[("sortBy", "recent")]));

        let (column, direction) = query.order().unwrap();
        assert!(matches!(column, property::Column::CreatedAt));
        assert_eq!(direction, Order::Desc);
    }

    #[test]
    fn test_sort_order_asc() {
        let query = ListQuery::from_params(&params(&[("sortBy", "recent"), ("order", "asc")]));

        let (_, direction) = query.order().unwrap();
        assert_eq!(direction, Order::Asc);
    }

    #[test]
    fn test_sort_rating() {
        let query = ListQuery::from_params(&params(&[("sortBy", "rating")]));

        let (column, _) = query.order().unwrap();
        assert!(matches!(column, property::Column::RatingAverage));
    }

    #[test]
    fn test_sort_literal_field_name() {
        let query = ListQuery::from_params(&params(&[("sortBy", "title")]));

        let (column, _) = query.order().unwrap();
        assert!(matches!(column, property::Column::Title));
    }

    #[test]
    fn test_sort_unknown_field_falls_back_to_created_at() {
        let query = ListQuery::from_params(&params(&[("sortBy", "shoeSize")]));

        let (column, _) = query.order().unwrap();
        assert!(matches!(column, property::Column::CreatedAt));
    }

    #[test]
    fn test_no_sort_means_no_order() {
        let query = ListQuery::from_params(&params(&[("bedrooms", "2")]));
        assert!(query.order().is_none());
    }

    #[test]
    fn test_sort_params_do_not_become_filters() {
        let query = ListQuery::from_params(&params(&[("sortBy", "recent"), ("order", "asc")]));
        assert!(query.filters.is_empty());
    }
}
