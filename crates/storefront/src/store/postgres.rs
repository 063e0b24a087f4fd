//! Direct `PostgreSQL` catalog store.
//!
//! Descriptors are rendered with `sqlx::QueryBuilder`, so every filter value
//! is a bound parameter. The table name comes from validated configuration
//! and is the only interpolated identifier.
//!
//! # Migrations
//!
//! The `products` table is created by `crates/storefront/migrations/`, run
//! via:
//! ```bash
//! cargo run -p handicraft-cli -- migrate
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use handicraft_core::{ProductId, ProductRecord};

use super::{CatalogStore, escape_like};
use crate::admin::bulk::stored_discount;
use crate::admin::{BulkUpdate, ProductUpdate};
use crate::config::CatalogConfig;
use crate::error::StoreError;
use crate::query::{Direction, Predicate, ProductQuery, QueryPage, Value};

/// Catalog store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    table: String,
}

impl PgCatalogStore {
    /// Open a pool for the configured database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection cannot be established.
    pub async fn connect(config: &CatalogConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(config.store_url.expose_secret())
            .await?;
        Ok(Self::from_pool(pool, config.table.clone()))
    }

    /// Wrap an existing pool. `table` must be a plain identifier.
    #[must_use]
    pub const fn from_pool(pool: PgPool, table: String) -> Self {
        Self { pool, table }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))
    }
}

/// One row of the products table as stored.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Decimal,
    discounted_price: Option<Decimal>,
    category: String,
    subcategory: Option<String>,
    material: String,
    region_of_origin: Option<String>,
    artisan: Option<String>,
    dimensions: Option<String>,
    weight: Option<String>,
    sku: Option<String>,
    stock_quantity: i32,
    tags: Option<Vec<String>>,
    related_gods: Option<Vec<String>>,
    occasions: Option<Vec<String>>,
    image_urls: Option<Vec<String>>,
    width_in: Option<f64>,
    height_in: Option<f64>,
    depth_in: Option<f64>,
    is_featured: Option<bool>,
    is_bestseller: Option<bool>,
    is_new_arrival: Option<bool>,
    is_visible: Option<bool>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for ProductRecord {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock_quantity = u32::try_from(row.stock_quantity).map_err(|_| {
            StoreError::DataCorruption(format!(
                "product {} has negative stock {}",
                row.id, row.stock_quantity
            ))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            discounted_price: row.discounted_price,
            category: row.category,
            subcategory: row.subcategory,
            material: row.material,
            region_of_origin: row.region_of_origin,
            artisan: row.artisan,
            dimensions: row.dimensions,
            weight: row.weight,
            sku: row.sku,
            stock_quantity,
            tags: row.tags.unwrap_or_default(),
            related_gods: row.related_gods.unwrap_or_default(),
            occasions: row.occasions.unwrap_or_default(),
            image_urls: row.image_urls.unwrap_or_default(),
            width_in: row.width_in,
            height_in: row.height_in,
            depth_in: row.depth_in,
            is_featured: row.is_featured.unwrap_or(false),
            is_bestseller: row.is_bestseller.unwrap_or(false),
            is_new_arrival: row.is_new_arrival.unwrap_or(false),
            is_visible: row.is_visible.unwrap_or(true),
            created_at: row.created_at,
        })
    }
}

fn into_records(rows: Vec<ProductRow>) -> Result<Vec<ProductRecord>, StoreError> {
    rows.into_iter().map(ProductRecord::try_from).collect()
}

fn stock_to_db(stock: u32) -> Result<i32, StoreError> {
    i32::try_from(stock)
        .map_err(|_| StoreError::DataCorruption(format!("stock quantity {stock} out of range")))
}

impl CatalogStore for PgCatalogStore {
    #[instrument(skip(self, query), fields(predicates = query.predicates.len()))]
    async fn query(&self, query: &ProductQuery) -> Result<QueryPage, StoreError> {
        let rows: Vec<ProductRow> = select_query(&self.table, query)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let (count,): (i64,) = count_query(&self.table, &query.predicates)
            .build_query_as()
            .fetch_one(&self.pool)
            .await?;

        Ok(QueryPage {
            items: into_records(rows)?,
            total_count: u64::try_from(count).unwrap_or(0),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("SELECT * FROM {} ORDER BY id ASC", self.table))
                .fetch_all(&self.pool)
                .await?;
        into_records(rows)
    }

    #[instrument(skip(self))]
    async fn fetch_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT * FROM {} WHERE id = $1", self.table))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(ProductRecord::try_from).transpose()
    }

    #[instrument(skip(self, update))]
    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<ProductRecord, StoreError> {
        let sql = format!(
            r"
            UPDATE {}
            SET name = $1, description = $2, price = $3, discounted_price = $4,
                category = $5, subcategory = $6, material = $7, region_of_origin = $8,
                artisan = $9, dimensions = $10, weight = $11, sku = $12,
                stock_quantity = $13, tags = $14, image_urls = $15, related_gods = $16,
                occasions = $17, width_in = $18, height_in = $19, depth_in = $20,
                is_featured = $21, is_bestseller = $22, is_new_arrival = $23,
                is_visible = $24
            WHERE id = $25
            RETURNING *
            ",
            self.table
        );

        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(&update.name)
            .bind(&update.description)
            .bind(update.price)
            .bind(update.discounted_price)
            .bind(&update.category)
            .bind(&update.subcategory)
            .bind(&update.material)
            .bind(&update.region_of_origin)
            .bind(&update.artisan)
            .bind(&update.dimensions)
            .bind(&update.weight)
            .bind(&update.sku)
            .bind(stock_to_db(update.stock_quantity)?)
            .bind(&update.tags)
            .bind(&update.image_urls)
            .bind(&update.related_gods)
            .bind(&update.occasions)
            .bind(update.width_in)
            .bind(update.height_in)
            .bind(update.depth_in)
            .bind(update.is_featured)
            .bind(update.is_bestseller)
            .bind(update.is_new_arrival)
            .bind(update.is_visible)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .try_into()
    }

    #[instrument(skip(self, ids, update), fields(ids = ids.len()))]
    async fn bulk_update(&self, ids: &[ProductId], update: &BulkUpdate) -> Result<u64, StoreError> {
        if ids.is_empty() || update.is_empty() {
            return Ok(0);
        }
        let result = bulk_update_query(&self.table, ids, update)?
            .build()
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// SQL rendering
// =============================================================================

fn select_query(table: &str, query: &ProductQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT * FROM {table}"));
    push_where(&mut builder, &query.predicates);

    if !query.orderings.is_empty() {
        builder.push(" ORDER BY ");
        let mut order = builder.separated(", ");
        for ordering in &query.orderings {
            let direction = match ordering.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            order.push(format!("{} {direction}", ordering.column.as_str()));
        }
    }

    builder.push(" LIMIT ");
    builder.push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));
    builder.push(" OFFSET ");
    builder.push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));
    builder
}

fn count_query(table: &str, predicates: &[Predicate]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {table}"));
    push_where(&mut builder, predicates);
    builder
}

fn bulk_update_query(
    table: &str,
    ids: &[ProductId],
    update: &BulkUpdate,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut builder = QueryBuilder::new(format!("UPDATE {table} SET "));
    let mut set = builder.separated(", ");
    if let Some(price) = update.price {
        set.push("price = ").push_bind_unseparated(price);
    }
    if let Some(discounted) = update.discounted_price {
        set.push("discounted_price = ")
            .push_bind_unseparated(stored_discount(discounted));
    }
    if let Some(stock) = update.stock_quantity {
        set.push("stock_quantity = ").push_bind_unseparated(stock_to_db(stock)?);
    }
    for (column, flag) in [
        ("is_visible", update.is_visible),
        ("is_featured", update.is_featured),
        ("is_bestseller", update.is_bestseller),
        ("is_new_arrival", update.is_new_arrival),
    ] {
        if let Some(flag) = flag {
            set.push(format!("{column} = ")).push_bind_unseparated(flag);
        }
    }

    builder.push(" WHERE id = ANY(");
    builder.push_bind(ids.iter().map(ProductId::as_i64).collect::<Vec<_>>());
    builder.push(")");
    Ok(builder)
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, predicates: &[Predicate]) {
    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_predicate(builder, predicate);
    }
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Eq { column, value } => {
            builder.push(format!("{} = ", column.as_str()));
            push_value(builder, value);
        }
        Predicate::Gte { column, value } => {
            builder.push(format!("{} >= ", column.as_str()));
            push_value(builder, value);
        }
        Predicate::Lte { column, value } => {
            builder.push(format!("{} <= ", column.as_str()));
            push_value(builder, value);
        }
        Predicate::In { column, values } => {
            builder.push(format!("{} = ANY(", column.as_str()));
            builder.push_bind(values.clone());
            builder.push(")");
        }
        Predicate::ILike { column, pattern } => {
            builder.push(format!("{} ILIKE ", column.as_str()));
            builder.push_bind(format!("%{}%", escape_like(pattern)));
        }
        Predicate::Contains { column, value } => {
            builder.push(format!("{} @> ", column.as_str()));
            builder.push_bind(vec![value.clone()]);
        }
        Predicate::NotFalse { column } => {
            builder.push(format!("{} IS NOT FALSE", column.as_str()));
        }
        Predicate::AnyOf { predicates } if predicates.is_empty() => {
            builder.push("FALSE");
        }
        Predicate::AnyOf { predicates } => {
            builder.push("(");
            for (i, nested) in predicates.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                push_predicate(builder, nested);
            }
            builder.push(")");
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value {
        Value::Text(text) => builder.push_bind(text.clone()),
        Value::Number(n) => builder.push_bind(*n),
        Value::Decimal(d) => builder.push_bind(*d),
        Value::Bool(b) => builder.push_bind(*b),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Column, Ordering};
    use handicraft_core::PageRequest;

    #[test]
    fn test_select_sql() {
        let query = ProductQuery::new()
            .filter(Predicate::in_set(Column::Category, vec!["Brass".to_string()]))
            .filter(Predicate::gte(Column::Price, Value::Decimal(Decimal::new(100, 0))))
            .filter(Predicate::NotFalse {
                column: Column::IsVisible,
            })
            .order_by(vec![Ordering::desc(Column::Price)])
            .paginate(PageRequest::new(2, 12));

        let builder = select_query("products", &query);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM products WHERE category = ANY($1) AND price >= $2 \
             AND is_visible IS NOT FALSE ORDER BY price DESC, id ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_any_of_groups_with_or() {
        let query = ProductQuery::new().filter(Predicate::any_of(vec![
            Predicate::ilike(Column::Name, "diya"),
            Predicate::contains(Column::Tags, "festive"),
        ]));
        let builder = count_query("products", &query.predicates);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM products WHERE (name ILIKE $1 OR tags @> $2)"
        );
    }

    #[test]
    fn test_empty_any_of_matches_nothing() {
        let builder = count_query("products", &[Predicate::any_of(Vec::new())]);
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM products WHERE FALSE");
    }

    #[test]
    fn test_bulk_update_sql() {
        let update = BulkUpdate {
            price: Some(Decimal::new(900, 0)),
            is_featured: Some(true),
            ..BulkUpdate::default()
        };
        let builder = bulk_update_query("products", &[ProductId::new(1)], &update)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            builder.sql(),
            "UPDATE products SET price = $1, is_featured = $2 WHERE id = ANY($3)"
        );
    }

    #[test]
    fn test_row_conversion_defaults() {
        let row = ProductRow {
            id: ProductId::new(1),
            name: "Bell".to_string(),
            description: None,
            price: Decimal::new(100, 0),
            discounted_price: None,
            category: "Pooja".to_string(),
            subcategory: None,
            material: "Bronze".to_string(),
            region_of_origin: None,
            artisan: None,
            dimensions: None,
            weight: None,
            sku: None,
            stock_quantity: 4,
            tags: None,
            related_gods: None,
            occasions: None,
            image_urls: None,
            width_in: None,
            height_in: None,
            depth_in: None,
            is_featured: None,
            is_bestseller: None,
            is_new_arrival: None,
            is_visible: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let record = ProductRecord::try_from(row).unwrap_or_else(|e| panic!("{e}"));
        assert!(record.is_visible);
        assert!(record.tags.is_empty());
        assert_eq!(record.stock_quantity, 4);
    }
}
