//! Read-only catalog commands.

use std::time::Duration;

use clap::Args;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use handicraft_core::{
    FilterCriteria, PageRequest, ProductId, ProductRecord, RawFilterInput, RawRange, VisibilityMode,
};
use handicraft_storefront::debounce::{DEFAULT_DEBOUNCE, Debouncer};
use handicraft_storefront::listing::{ListingState, ProductListing};
use handicraft_storefront::notify::TracingNotifier;
use handicraft_storefront::query::Strategy;
use handicraft_storefront::settings::load_visibility_mode;
use handicraft_storefront::{AppError, CatalogStore};

use super::{Context, print_json};

/// Listing filters. Numeric values are passed through as typed; values that
/// do not parse are ignored rather than rejected.
#[derive(Debug, Args)]
pub struct ProductsArgs {
    /// Free-text search (weights such as "2kg" match heavier items too)
    #[arg(short, long)]
    search: Option<String>,

    /// Category to include (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Material to include (repeatable)
    #[arg(long = "material")]
    materials: Vec<String>,

    /// Related deity to include (repeatable)
    #[arg(long = "god")]
    gods: Vec<String>,

    /// Occasion to include (repeatable)
    #[arg(long = "occasion")]
    occasions: Vec<String>,

    #[arg(long)]
    min_price: Option<String>,
    #[arg(long)]
    max_price: Option<String>,

    /// Exact width in inches
    #[arg(long)]
    width: Option<String>,
    /// Exact height in inches
    #[arg(long)]
    height: Option<String>,
    /// Exact depth in inches
    #[arg(long)]
    depth: Option<String>,

    /// SKU substring
    #[arg(long)]
    sku: Option<String>,
    /// Weight text substring
    #[arg(long)]
    weight: Option<String>,

    #[arg(long)]
    min_width: Option<String>,
    #[arg(long)]
    max_width: Option<String>,
    #[arg(long)]
    min_height: Option<String>,
    #[arg(long)]
    max_height: Option<String>,
    #[arg(long)]
    min_depth: Option<String>,
    #[arg(long)]
    max_depth: Option<String>,
    #[arg(long)]
    min_weight: Option<String>,
    #[arg(long)]
    max_weight: Option<String>,

    /// newest, price-asc, price-desc, featured, or popular
    #[arg(long)]
    sort: Option<String>,

    /// all, visible, or hidden (defaults to the saved preference)
    #[arg(long)]
    visibility: Option<String>,

    #[arg(short, long, default_value_t = 1)]
    page: u32,

    #[arg(long)]
    page_size: Option<u32>,
}

fn range(min: Option<&String>, max: Option<&String>) -> Option<RawRange> {
    (min.is_some() || max.is_some())
        .then(|| RawRange::new(min.map(String::as_str), max.map(String::as_str)))
}

fn selection(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

impl ProductsArgs {
    fn to_raw(&self) -> RawFilterInput {
        RawFilterInput {
            search: self.search.clone(),
            categories: selection(self.categories.clone()),
            materials: selection(self.materials.clone()),
            gods: selection(self.gods.clone()),
            occasions: selection(self.occasions.clone()),
            price_range: range(self.min_price.as_ref(), self.max_price.as_ref()),
            width_search: self.width.clone(),
            height_search: self.height.clone(),
            depth_search: self.depth.clone(),
            sku_search: self.sku.clone(),
            weight_search: self.weight.clone(),
            width_range: range(self.min_width.as_ref(), self.max_width.as_ref()),
            height_range: range(self.min_height.as_ref(), self.max_height.as_ref()),
            depth_range: range(self.min_depth.as_ref(), self.max_depth.as_ref()),
            weight_range: range(self.min_weight.as_ref(), self.max_weight.as_ref()),
            sort: self.sort.clone(),
            visibility: self.visibility.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductsOutput {
    page: u32,
    page_size: u32,
    total_pages: u64,
    strategy: &'static str,
    #[serde(flatten)]
    state: ListingState,
}

/// A record with its presentation fields resolved.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductDetail {
    #[serde(flatten)]
    record: ProductRecord,
    display_price: String,
    discount_percentage: u32,
    stock_status: String,
    dimensions_label: Option<String>,
    tags_label: String,
}

impl From<ProductRecord> for ProductDetail {
    fn from(record: ProductRecord) -> Self {
        Self {
            display_price: record.display_price(),
            discount_percentage: record.discount_percentage(),
            stock_status: record.stock_status().label(),
            dimensions_label: record.dimensions_label(),
            tags_label: record.tags_label(),
            record,
        }
    }
}

/// List one page of products.
pub async fn products<S: CatalogStore>(
    store: S,
    context: &Context,
    args: ProductsArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut criteria = FilterCriteria::from_raw(args.to_raw());
    if args.visibility.is_none() {
        criteria.visibility = saved_visibility(context).await;
    }

    let page = PageRequest::new(args.page, args.page_size.unwrap_or(context.page_size));
    let strategy = Strategy::for_criteria(&criteria);

    let listing = ProductListing::new(store, TracingNotifier);
    let state = listing.load(&criteria, page).await;

    print_json(&ProductsOutput {
        page: page.page(),
        page_size: page.page_size(),
        total_pages: page.total_pages(state.total_count),
        strategy: strategy.as_str(),
        state,
    })?;
    Ok(())
}

/// Options for interactive search.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Quiet period in milliseconds before a term is applied [default: 500]
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// all, visible, or hidden (defaults to the saved preference)
    #[arg(long)]
    visibility: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput {
    term: String,
    strategy: &'static str,
    #[serde(flatten)]
    state: ListingState,
}

/// Read search terms from stdin, one per line, and print the first page for
/// each term once input pauses.
pub async fn search<S: CatalogStore>(
    store: S,
    context: &Context,
    args: SearchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let visibility = match args.visibility {
        Some(mode) => mode.parse().unwrap_or_default(),
        None => saved_visibility(context).await,
    };
    let delay = args.debounce_ms.map_or(DEFAULT_DEBOUNCE, Duration::from_millis);
    let (tx, mut debouncer) = Debouncer::new(delay);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if !tx.push(line) {
                break;
            }
        }
        Ok::<_, std::io::Error>(())
    });

    let listing = ProductListing::new(store, TracingNotifier);
    let page = PageRequest::new(1, context.page_size);
    while let Some(term) = debouncer.next().await {
        let mut criteria = FilterCriteria::from_raw(RawFilterInput {
            search: Some(term.clone()),
            ..RawFilterInput::default()
        });
        criteria.visibility = visibility;

        let state = listing.load(&criteria, page).await;
        print_json(&SearchOutput {
            term,
            strategy: Strategy::for_criteria(&criteria).as_str(),
            state,
        })?;
    }

    reader.await??;
    Ok(())
}

async fn saved_visibility(context: &Context) -> VisibilityMode {
    match load_visibility_mode(&context.settings_store()).await {
        Ok(mode) => mode,
        Err(e) => {
            tracing::warn!(error = %e, "Using default visibility");
            VisibilityMode::default()
        }
    }
}

/// Show one product.
pub async fn product<S: CatalogStore>(store: S, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let listing = ProductListing::new(store, TracingNotifier);
    let record = listing
        .load_product(ProductId::new(id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    print_json(&ProductDetail::from(record))?;
    Ok(())
}

/// Show facet values.
pub async fn filters<S: CatalogStore>(store: S) -> Result<(), Box<dyn std::error::Error>> {
    let listing = ProductListing::new(store, TracingNotifier);
    print_json(&listing.load_filter_options().await)?;
    Ok(())
}
