//! In-process evaluation of query descriptors.
//!
//! Mirrors what the hosted service does with the same descriptor: absent
//! values never satisfy a comparison, text matching is case-insensitive for
//! `ILike` only, and `NULL`s sort after every value in ascending order and
//! before every value in descending order.

use std::cmp::Ordering as CmpOrdering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use handicraft_core::ProductRecord;

use super::descriptor::{Column, Direction, Ordering, Predicate, ProductQuery, Value};

/// A borrowed view of one column of a record.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field<'a> {
    Text(Option<&'a str>),
    Integer(i64),
    Float(Option<f64>),
    Decimal(Option<Decimal>),
    Bool(bool),
    List(&'a [String]),
    Timestamp(DateTime<Utc>),
}

fn field(record: &ProductRecord, column: Column) -> Field<'_> {
    match column {
        Column::Id => Field::Integer(record.id.as_i64()),
        Column::Name => Field::Text(Some(&record.name)),
        Column::Description => Field::Text(record.description.as_deref()),
        Column::Price => Field::Decimal(Some(record.price)),
        Column::DiscountedPrice => Field::Decimal(record.discounted_price),
        Column::Category => Field::Text(Some(&record.category)),
        Column::Subcategory => Field::Text(record.subcategory.as_deref()),
        Column::Material => Field::Text(Some(&record.material)),
        Column::RegionOfOrigin => Field::Text(record.region_of_origin.as_deref()),
        Column::Artisan => Field::Text(record.artisan.as_deref()),
        Column::Dimensions => Field::Text(record.dimensions.as_deref()),
        Column::Weight => Field::Text(record.weight.as_deref()),
        Column::Sku => Field::Text(record.sku.as_deref()),
        Column::StockQuantity => Field::Integer(i64::from(record.stock_quantity)),
        Column::Tags => Field::List(&record.tags),
        Column::RelatedGods => Field::List(&record.related_gods),
        Column::Occasions => Field::List(&record.occasions),
        Column::WidthIn => Field::Float(record.width_in),
        Column::HeightIn => Field::Float(record.height_in),
        Column::DepthIn => Field::Float(record.depth_in),
        Column::IsFeatured => Field::Bool(record.is_featured),
        Column::IsBestseller => Field::Bool(record.is_bestseller),
        Column::IsNewArrival => Field::Bool(record.is_new_arrival),
        Column::IsVisible => Field::Bool(record.is_visible),
        Column::CreatedAt => Field::Timestamp(record.created_at),
    }
}

#[allow(clippy::cast_precision_loss)] // catalog ids and stock counts are far below 2^52
fn compare_with(field: Field<'_>, value: &Value) -> Option<CmpOrdering> {
    match (field, value) {
        (Field::Text(Some(text)), Value::Text(other)) => Some(text.cmp(other.as_str())),
        (Field::Integer(n), Value::Number(other)) => (n as f64).partial_cmp(other),
        (Field::Integer(n), Value::Decimal(other)) => Decimal::from(n).partial_cmp(other),
        (Field::Float(Some(n)), Value::Number(other)) => n.partial_cmp(other),
        (Field::Float(Some(n)), Value::Decimal(other)) => n.partial_cmp(&other.to_f64()?),
        (Field::Decimal(Some(d)), Value::Decimal(other)) => Some(d.cmp(other)),
        (Field::Decimal(Some(d)), Value::Number(other)) => d.to_f64()?.partial_cmp(other),
        (Field::Bool(b), Value::Bool(other)) => Some(b.cmp(other)),
        _ => None,
    }
}

/// Whether `record` satisfies `predicate`.
#[must_use]
pub fn matches(record: &ProductRecord, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { column, value } => {
            compare_with(field(record, *column), value) == Some(CmpOrdering::Equal)
        }
        Predicate::Gte { column, value } => matches!(
            compare_with(field(record, *column), value),
            Some(CmpOrdering::Greater | CmpOrdering::Equal)
        ),
        Predicate::Lte { column, value } => matches!(
            compare_with(field(record, *column), value),
            Some(CmpOrdering::Less | CmpOrdering::Equal)
        ),
        Predicate::In { column, values } => match field(record, *column) {
            Field::Text(Some(text)) => values.iter().any(|v| v == text),
            _ => false,
        },
        Predicate::ILike { column, pattern } => match field(record, *column) {
            Field::Text(Some(text)) => contains_ignore_case(text, pattern),
            _ => false,
        },
        Predicate::Contains { column, value } => match field(record, *column) {
            Field::List(items) => items.iter().any(|item| item == value),
            _ => false,
        },
        Predicate::NotFalse { column } => !matches!(field(record, *column), Field::Bool(false)),
        Predicate::AnyOf { predicates } => predicates.iter().any(|p| matches(record, p)),
    }
}

/// Whether `record` satisfies every predicate.
#[must_use]
pub fn matches_all(record: &ProductRecord, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| matches(record, p))
}

/// Case-insensitive substring test.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn compare_fields(a: Field<'_>, b: Field<'_>) -> CmpOrdering {
    // NULL sorts as the largest value
    fn nulls_last<T>(
        a: Option<T>,
        b: Option<T>,
        cmp: impl FnOnce(T, T) -> CmpOrdering,
    ) -> CmpOrdering {
        match (a, b) {
            (Some(a), Some(b)) => cmp(a, b),
            (Some(_), None) => CmpOrdering::Less,
            (None, Some(_)) => CmpOrdering::Greater,
            (None, None) => CmpOrdering::Equal,
        }
    }

    match (a, b) {
        (Field::Text(a), Field::Text(b)) => nulls_last(a, b, |a, b| a.cmp(b)),
        (Field::Integer(a), Field::Integer(b)) => a.cmp(&b),
        (Field::Float(a), Field::Float(b)) => nulls_last(a, b, |a: f64, b: f64| a.total_cmp(&b)),
        (Field::Decimal(a), Field::Decimal(b)) => nulls_last(a, b, |a, b| a.cmp(&b)),
        (Field::Bool(a), Field::Bool(b)) => a.cmp(&b),
        (Field::List(a), Field::List(b)) => a.cmp(b),
        (Field::Timestamp(a), Field::Timestamp(b)) => a.cmp(&b),
        _ => CmpOrdering::Equal,
    }
}

/// Compare two records by a list of sort keys.
#[must_use]
pub fn compare_records(a: &ProductRecord, b: &ProductRecord, orderings: &[Ordering]) -> CmpOrdering {
    for ordering in orderings {
        let order = compare_fields(field(a, ordering.column), field(b, ordering.column));
        let order = match ordering.direction {
            Direction::Asc => order,
            Direction::Desc => order.reverse(),
        };
        if order != CmpOrdering::Equal {
            return order;
        }
    }
    CmpOrdering::Equal
}

/// Sort records in place by a list of sort keys.
pub fn sort_records(records: &mut [ProductRecord], orderings: &[Ordering]) {
    records.sort_by(|a, b| compare_records(a, b, orderings));
}

/// Evaluate a full query over an in-memory collection.
///
/// Returns the requested page and the size of the whole matched set.
#[must_use]
pub fn execute(records: &[ProductRecord], query: &ProductQuery) -> (Vec<ProductRecord>, u64) {
    let mut matched: Vec<ProductRecord> = records
        .iter()
        .filter(|record| matches_all(record, &query.predicates))
        .cloned()
        .collect();
    sort_records(&mut matched, &query.orderings);
    let total = matched.len() as u64;
    let page = matched
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();
    (page, total)
}
