//! Product editing commands.
//!
//! Both commands read the current rows first: `update` edits on top of the
//! stored product, and `bulk` checks its change against every selected
//! product before writing.

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

use handicraft_core::ProductId;
use handicraft_storefront::admin::{BulkUpdate, CatalogAdmin, ProductDraft, Selection};
use handicraft_storefront::notify::TracingNotifier;
use handicraft_storefront::{AppError, CatalogStore};

use super::print_json;

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Product id
    id: i64,

    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    price: Option<Decimal>,
    /// Discounted price; 0 removes the discount
    #[arg(long)]
    discounted_price: Option<Decimal>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    subcategory: Option<String>,
    #[arg(long)]
    material: Option<String>,
    #[arg(long)]
    artisan: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    dimensions: Option<String>,
    #[arg(long)]
    weight: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    #[arg(long)]
    stock: Option<u32>,

    /// Tag to add (repeatable)
    #[arg(long = "add-tag")]
    add_tags: Vec<String>,
    /// Tag to remove (repeatable)
    #[arg(long = "remove-tag")]
    remove_tags: Vec<String>,

    #[arg(long)]
    visible: Option<bool>,
    #[arg(long)]
    featured: Option<bool>,
    #[arg(long)]
    bestseller: Option<bool>,
    #[arg(long)]
    new_arrival: Option<bool>,
}

impl UpdateArgs {
    /// Overlay the given flags on a draft of the stored product.
    fn apply_to(self, draft: &mut ProductDraft) {
        fn set<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut draft.name, self.name);
        set(&mut draft.description, self.description);
        set(&mut draft.price, self.price);
        set(&mut draft.discounted_price, self.discounted_price);
        set(&mut draft.category, self.category);
        set(&mut draft.subcategory, self.subcategory);
        set(&mut draft.material, self.material);
        set(&mut draft.artisan, self.artisan);
        set(&mut draft.region_of_origin, self.region);
        set(&mut draft.dimensions, self.dimensions);
        set(&mut draft.weight, self.weight);
        set(&mut draft.sku, self.sku);
        set(&mut draft.stock_quantity, self.stock);
        set(&mut draft.is_visible, self.visible);
        set(&mut draft.is_featured, self.featured);
        set(&mut draft.is_bestseller, self.bestseller);
        set(&mut draft.is_new_arrival, self.new_arrival);

        for tag in &self.add_tags {
            draft.add_tag(tag);
        }
        for tag in &self.remove_tags {
            draft.remove_tag(tag);
        }
    }
}

#[derive(Debug, Args)]
pub struct BulkArgs {
    /// Comma-separated product ids
    #[arg(long, value_delimiter = ',', required = true)]
    ids: Vec<i64>,

    #[arg(long)]
    price: Option<Decimal>,
    #[arg(long)]
    discounted_price: Option<Decimal>,
    #[arg(long)]
    stock: Option<u32>,
    #[arg(long)]
    visible: Option<bool>,
    #[arg(long)]
    featured: Option<bool>,
    #[arg(long)]
    bestseller: Option<bool>,
    #[arg(long)]
    new_arrival: Option<bool>,
}

#[derive(Serialize)]
struct BulkOutput {
    updated: u64,
    fields: Vec<&'static str>,
}

/// Edit one product.
pub async fn update<S: CatalogStore>(
    store: S,
    args: UpdateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = ProductId::new(args.id);
    let current = store
        .fetch_by_id(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let mut draft = ProductDraft::from_record(&current);
    args.apply_to(&mut draft);

    let admin = CatalogAdmin::new(store, TracingNotifier);
    let saved = admin.save_product(id, draft).await?;
    print_json(&saved)?;
    Ok(())
}

/// Apply one change to several products.
pub async fn bulk<S: CatalogStore>(store: S, args: BulkArgs) -> Result<(), Box<dyn std::error::Error>> {
    let update = BulkUpdate {
        price: args.price,
        discounted_price: args.discounted_price,
        stock_quantity: args.stock,
        is_visible: args.visible,
        is_featured: args.featured,
        is_bestseller: args.bestseller,
        is_new_arrival: args.new_arrival,
    };
    let selection: Selection = args.ids.into_iter().map(ProductId::new).collect();

    let records = store.fetch_all().await.map_err(AppError::from)?;
    let missing: Vec<String> = selection
        .ids()
        .into_iter()
        .filter(|id| !records.iter().any(|r| r.id == *id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        tracing::warn!(missing = %missing.join(","), "Skipping unknown product ids");
    }

    let admin = CatalogAdmin::new(store, TracingNotifier);
    let updated = admin.apply_bulk(&selection, &records, &update).await?;
    print_json(&BulkOutput {
        updated,
        fields: update.field_names(),
    })?;
    Ok(())
}
