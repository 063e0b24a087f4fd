//! Backend-neutral query descriptor.
//!
//! A [`ProductQuery`] is a conjunction of [`Predicate`]s, an ordering, and a
//! page window. Each store renders it in its own dialect: PostgREST query
//! parameters, parameterized SQL, or in-process evaluation.

use rust_decimal::Decimal;
use serde::Serialize;

use handicraft_core::PageRequest;

/// A column of the products table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    Name,
    Description,
    Price,
    DiscountedPrice,
    Category,
    Subcategory,
    Material,
    RegionOfOrigin,
    Artisan,
    Dimensions,
    Weight,
    Sku,
    StockQuantity,
    Tags,
    RelatedGods,
    Occasions,
    WidthIn,
    HeightIn,
    DepthIn,
    IsFeatured,
    IsBestseller,
    IsNewArrival,
    IsVisible,
    CreatedAt,
}

impl Column {
    /// Column name in the products table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Description => "description",
            Self::Price => "price",
            Self::DiscountedPrice => "discounted_price",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::Material => "material",
            Self::RegionOfOrigin => "region_of_origin",
            Self::Artisan => "artisan",
            Self::Dimensions => "dimensions",
            Self::Weight => "weight",
            Self::Sku => "sku",
            Self::StockQuantity => "stock_quantity",
            Self::Tags => "tags",
            Self::RelatedGods => "related_gods",
            Self::Occasions => "occasions",
            Self::WidthIn => "width_in",
            Self::HeightIn => "height_in",
            Self::DepthIn => "depth_in",
            Self::IsFeatured => "is_featured",
            Self::IsBestseller => "is_bestseller",
            Self::IsNewArrival => "is_new_arrival",
            Self::IsVisible => "is_visible",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Text columns searched by the free-text filter.
pub const TEXT_SEARCH_COLUMNS: [Column; 10] = [
    Column::Name,
    Column::Description,
    Column::Material,
    Column::Dimensions,
    Column::Weight,
    Column::Sku,
    Column::Artisan,
    Column::RegionOfOrigin,
    Column::Category,
    Column::Subcategory,
];

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Decimal(Decimal),
    Bool(bool),
}

impl Value {
    /// Literal as it appears in a PostgREST filter.
    #[must_use]
    pub fn to_literal(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(n) => n.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// A filter on a single row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// `column = value`; absent values never match.
    Eq { column: Column, value: Value },
    /// Column value is one of `values`.
    In { column: Column, values: Vec<String> },
    /// `column >= value`.
    Gte { column: Column, value: Value },
    /// `column <= value`.
    Lte { column: Column, value: Value },
    /// Case-insensitive substring match.
    ILike { column: Column, pattern: String },
    /// Array column contains `value` as an element.
    Contains { column: Column, value: String },
    /// Boolean column is true or unset.
    NotFalse { column: Column },
    /// At least one of the nested predicates holds.
    AnyOf { predicates: Vec<Self> },
}

impl Predicate {
    #[must_use]
    pub fn eq(column: Column, value: Value) -> Self {
        Self::Eq { column, value }
    }

    #[must_use]
    pub fn in_set(column: Column, values: Vec<String>) -> Self {
        Self::In { column, values }
    }

    #[must_use]
    pub fn gte(column: Column, value: Value) -> Self {
        Self::Gte { column, value }
    }

    #[must_use]
    pub fn lte(column: Column, value: Value) -> Self {
        Self::Lte { column, value }
    }

    #[must_use]
    pub fn ilike(column: Column, pattern: impl Into<String>) -> Self {
        Self::ILike {
            column,
            pattern: pattern.into(),
        }
    }

    #[must_use]
    pub fn contains(column: Column, value: impl Into<String>) -> Self {
        Self::Contains {
            column,
            value: value.into(),
        }
    }

    /// Array column shares at least one element with `values`.
    #[must_use]
    pub fn contains_any(column: Column, values: &[String]) -> Self {
        Self::AnyOf {
            predicates: values
                .iter()
                .map(|value| Self::contains(column, value.clone()))
                .collect(),
        }
    }

    #[must_use]
    pub const fn any_of(predicates: Vec<Self>) -> Self {
        Self::AnyOf { predicates }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One sort key of an `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ordering {
    pub column: Column,
    pub direction: Direction,
}

impl Ordering {
    #[must_use]
    pub const fn asc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    #[must_use]
    pub const fn desc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }
}

/// A filtered, ordered, paginated select over the products table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductQuery {
    /// Conjunction of filters.
    pub predicates: Vec<Predicate>,
    /// Sort keys; ends with `id asc` once built through [`ProductQuery::order_by`].
    pub orderings: Vec<Ordering>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductQuery {
    /// Select everything, ordered by id, first default page.
    #[must_use]
    pub fn new() -> Self {
        let page = PageRequest::default();
        Self {
            predicates: Vec::new(),
            orderings: vec![Ordering::asc(Column::Id)],
            offset: page.offset(),
            limit: page.limit(),
        }
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Replace the ordering. An `id asc` tiebreak is appended unless `id`
    /// already appears, so equal sort keys page deterministically.
    #[must_use]
    pub fn order_by(mut self, orderings: Vec<Ordering>) -> Self {
        self.orderings = orderings;
        if !self.orderings.iter().any(|o| o.column == Column::Id) {
            self.orderings.push(Ordering::asc(Column::Id));
        }
        self
    }

    /// Select one page.
    #[must_use]
    pub const fn paginate(mut self, page: PageRequest) -> Self {
        self.offset = page.offset();
        self.limit = page.limit();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_orders_by_id() {
        let query = ProductQuery::new();
        assert!(query.predicates.is_empty());
        assert_eq!(query.orderings, vec![Ordering::asc(Column::Id)]);
        assert_eq!(query.offset, 0);
        assert_eq!(query.limit, 12);
    }

    #[test]
    fn test_order_by_appends_id_tiebreak() {
        let query = ProductQuery::new().order_by(vec![Ordering::desc(Column::CreatedAt)]);
        assert_eq!(
            query.orderings,
            vec![Ordering::desc(Column::CreatedAt), Ordering::asc(Column::Id)]
        );

        let query = ProductQuery::new().order_by(vec![Ordering::asc(Column::Id)]);
        assert_eq!(query.orderings.len(), 1);
    }

    #[test]
    fn test_paginate() {
        let query = ProductQuery::new().paginate(PageRequest::new(3, 10));
        assert_eq!(query.offset, 20);
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn test_contains_any_expands_to_or() {
        let gods = vec!["Shiva".to_string(), "Ganesha".to_string()];
        let predicate = Predicate::contains_any(Column::RelatedGods, &gods);
        let Predicate::AnyOf { predicates } = predicate else {
            panic!("expected AnyOf");
        };
        assert_eq!(predicates.len(), 2);
        assert_eq!(
            predicates.first(),
            Some(&Predicate::contains(Column::RelatedGods, "Shiva"))
        );
    }

    #[test]
    fn test_value_literals() {
        assert_eq!(Value::Number(12.5).to_literal(), "12.5");
        assert_eq!(Value::Number(12.0).to_literal(), "12");
        assert_eq!(Value::Decimal(Decimal::new(49_999, 2)).to_literal(), "499.99");
        assert_eq!(Value::Bool(true).to_literal(), "true");
    }
}
