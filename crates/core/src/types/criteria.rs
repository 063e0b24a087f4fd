//! Typed filter criteria for catalog browsing.
//!
//! User input arrives loosely typed (strings from search boxes, slider values,
//! checkbox selections). [`RawFilterInput`] captures that shape, and
//! [`FilterCriteria::apply`] overlays it onto the current criteria, parsing
//! numbers defensively: blank or non-numeric input means "no constraint".

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of products shown per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Sort order for product listings.
///
/// When no key is selected, listings are ordered by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Most recently created first.
    Newest,
    PriceAsc,
    PriceDesc,
    /// Featured products only, by id.
    Featured,
    /// Bestsellers only, by id.
    Popular,
}

impl SortKey {
    /// Wire name of the sort key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Featured => "featured",
            Self::Popular => "popular",
        }
    }

    /// Parse a wire name. Unknown names yield `None` (default ordering).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "newest" => Some(Self::Newest),
            "price-asc" => Some(Self::PriceAsc),
            "price-desc" => Some(Self::PriceDesc),
            "featured" => Some(Self::Featured),
            "popular" => Some(Self::Popular),
            _ => None,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state filter over the `is_visible` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityMode {
    #[default]
    All,
    Visible,
    Hidden,
}

impl VisibilityMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        }
    }

    /// Whether a record with the given visibility flag passes this mode.
    #[must_use]
    pub const fn admits(self, is_visible: bool) -> bool {
        match self {
            Self::All => true,
            Self::Visible => is_visible,
            Self::Hidden => !is_visible,
        }
    }
}

impl FromStr for VisibilityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "visible" => Ok(Self::Visible),
            "hidden" => Ok(Self::Hidden),
            other => Err(format!("unknown visibility mode: {other}")),
        }
    }
}

impl fmt::Display for VisibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Range<T> {
    #[must_use]
    pub const fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// A range with neither bound set constrains nothing.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Price range in rupees.
pub type PriceRange = Range<Decimal>;

/// Dimension or weight range (inches or kilograms).
pub type NumericRange = Range<f64>;

/// Page number and size for a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Create a page request. Page numbers start at 1; page 0 is read as
    /// page 1 and a page size of 0 falls back to [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Zero-based index of the first record on this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    /// Maximum number of records on this page.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.page_size as usize
    }

    /// Number of pages needed for `total` records.
    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Loosely typed range as entered by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRange {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

impl RawRange {
    #[must_use]
    pub fn new(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min: min.map(str::to_string),
            max: max.map(str::to_string),
        }
    }
}

/// A partial, loosely typed criteria update.
///
/// Every field is optional; only fields that are present replace the current
/// value when applied. Field names accept the camelCase keys used by the
/// browser UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFilterInput {
    pub search: Option<String>,
    pub categories: Option<Vec<String>>,
    pub materials: Option<Vec<String>>,
    pub gods: Option<Vec<String>>,
    pub occasions: Option<Vec<String>>,
    pub price_range: Option<RawRange>,
    pub width_search: Option<String>,
    pub height_search: Option<String>,
    pub depth_search: Option<String>,
    pub sku_search: Option<String>,
    pub weight_search: Option<String>,
    pub width_range: Option<RawRange>,
    pub height_range: Option<RawRange>,
    pub depth_range: Option<RawRange>,
    pub weight_range: Option<RawRange>,
    pub sort: Option<String>,
    pub visibility: Option<String>,
}

/// Normalized search state for a product listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Free-text search, trimmed and never empty.
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub materials: Vec<String>,
    pub gods: Vec<String>,
    pub occasions: Vec<String>,
    pub price_range: Option<PriceRange>,
    /// Exact width in inches.
    pub width: Option<f64>,
    /// Exact height in inches.
    pub height: Option<f64>,
    /// Exact depth in inches.
    pub depth: Option<f64>,
    pub sku_search: Option<String>,
    /// Substring of the raw weight text.
    pub weight_search: Option<String>,
    pub width_range: Option<NumericRange>,
    pub height_range: Option<NumericRange>,
    pub depth_range: Option<NumericRange>,
    /// Weight range in kilograms.
    ///
    /// Weights are free text, so remote queries cannot compare them
    /// numerically and this range is not applied to declarative queries.
    pub weight_range: Option<NumericRange>,
    pub sort: Option<SortKey>,
    pub visibility: VisibilityMode,
}

impl FilterCriteria {
    /// Build criteria from raw input.
    #[must_use]
    pub fn from_raw(raw: RawFilterInput) -> Self {
        let mut criteria = Self::default();
        criteria.apply(raw);
        criteria
    }

    /// Overlay a partial update. Fields absent from `raw` keep their value.
    pub fn apply(&mut self, raw: RawFilterInput) {
        if let Some(search) = raw.search {
            self.search = non_blank(&search);
        }
        if let Some(categories) = raw.categories {
            self.categories = clean_selection(categories);
        }
        if let Some(materials) = raw.materials {
            self.materials = clean_selection(materials);
        }
        if let Some(gods) = raw.gods {
            self.gods = clean_selection(gods);
        }
        if let Some(occasions) = raw.occasions {
            self.occasions = clean_selection(occasions);
        }
        if let Some(range) = raw.price_range {
            self.price_range = parse_range(&range, parse_decimal);
        }
        if let Some(width) = raw.width_search {
            self.width = parse_number(&width);
        }
        if let Some(height) = raw.height_search {
            self.height = parse_number(&height);
        }
        if let Some(depth) = raw.depth_search {
            self.depth = parse_number(&depth);
        }
        if let Some(sku) = raw.sku_search {
            self.sku_search = non_blank(&sku);
        }
        if let Some(weight) = raw.weight_search {
            self.weight_search = non_blank(&weight);
        }
        if let Some(range) = raw.width_range {
            self.width_range = parse_range(&range, parse_number);
        }
        if let Some(range) = raw.height_range {
            self.height_range = parse_range(&range, parse_number);
        }
        if let Some(range) = raw.depth_range {
            self.depth_range = parse_range(&range, parse_number);
        }
        if let Some(range) = raw.weight_range {
            self.weight_range = parse_range(&range, parse_number);
        }
        if let Some(sort) = raw.sort {
            self.sort = SortKey::parse(&sort);
        }
        if let Some(visibility) = raw.visibility {
            self.visibility = visibility.parse().unwrap_or_default();
        }
    }

    /// Drop every facet, range, and exact filter, keeping search, sort, and
    /// visibility.
    #[must_use]
    pub fn clear_filters(&self) -> Self {
        Self {
            search: self.search.clone(),
            sort: self.sort,
            visibility: self.visibility,
            ..Self::default()
        }
    }

    /// The active search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Whether any facet, range, or exact filter is active.
    ///
    /// Search text, sort order, and visibility mode are not refinements.
    #[must_use]
    pub fn has_refinements(&self) -> bool {
        !self.categories.is_empty()
            || !self.materials.is_empty()
            || !self.gods.is_empty()
            || !self.occasions.is_empty()
            || self.price_range.is_some_and(|r| !r.is_unbounded())
            || self.width.is_some()
            || self.height.is_some()
            || self.depth.is_some()
            || self.sku_search.is_some()
            || self.weight_search.is_some()
            || active_range(self.width_range)
            || active_range(self.height_range)
            || active_range(self.depth_range)
            || active_range(self.weight_range)
    }

    /// Whether a listing should use the in-memory comprehensive search:
    /// search text is the only active filter.
    #[must_use]
    pub fn uses_comprehensive_search(&self) -> bool {
        self.search_term().is_some() && !self.has_refinements()
    }
}

fn active_range(range: Option<NumericRange>) -> bool {
    range.is_some_and(|r| !r.is_unbounded())
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn clean_selection(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !cleaned.contains(&value) {
            cleaned.push(value);
        }
    }
    cleaned
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    value.trim().parse::<Decimal>().ok()
}

fn parse_range<T, F>(raw: &RawRange, parse: F) -> Option<Range<T>>
where
    T: PartialOrd + Copy,
    F: Fn(&str) -> Option<T>,
{
    let range = Range::new(
        raw.min.as_deref().and_then(&parse),
        raw.max.as_deref().and_then(&parse),
    );
    (!range.is_unbounded()).then_some(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_search(text: &str) -> RawFilterInput {
        RawFilterInput {
            search: Some(text.to_string()),
            ..RawFilterInput::default()
        }
    }

    #[test]
    fn test_empty_criteria_has_no_refinements() {
        let criteria = FilterCriteria::default();
        assert!(!criteria.has_refinements());
        assert!(!criteria.uses_comprehensive_search());
        assert_eq!(criteria.visibility, VisibilityMode::All);
    }

    #[test]
    fn test_search_alone_uses_comprehensive_search() {
        let criteria = FilterCriteria::from_raw(raw_search("  2kg "));
        assert_eq!(criteria.search_term(), Some("2kg"));
        assert!(criteria.uses_comprehensive_search());
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let criteria = FilterCriteria::from_raw(raw_search("   "));
        assert_eq!(criteria.search, None);
    }

    #[test]
    fn test_search_with_facet_uses_declarative_path() {
        let mut criteria = FilterCriteria::from_raw(raw_search("2kg"));
        criteria.apply(RawFilterInput {
            categories: Some(vec!["Brass".to_string()]),
            ..RawFilterInput::default()
        });
        assert!(criteria.has_refinements());
        assert!(!criteria.uses_comprehensive_search());
    }

    #[test]
    fn test_sort_and_visibility_are_not_refinements() {
        let criteria = FilterCriteria::from_raw(RawFilterInput {
            search: Some("lamp".to_string()),
            sort: Some("price-asc".to_string()),
            visibility: Some("hidden".to_string()),
            ..RawFilterInput::default()
        });
        assert_eq!(criteria.sort, Some(SortKey::PriceAsc));
        assert_eq!(criteria.visibility, VisibilityMode::Hidden);
        assert!(criteria.uses_comprehensive_search());
    }

    #[test]
    fn test_malformed_numbers_mean_no_constraint() {
        let criteria = FilterCriteria::from_raw(RawFilterInput {
            width_search: Some("wide".to_string()),
            height_search: Some("NaN".to_string()),
            depth_range: Some(RawRange::new(Some("abc"), Some(""))),
            price_range: Some(RawRange::new(Some("cheap"), None)),
            ..RawFilterInput::default()
        });
        assert_eq!(criteria.width, None);
        assert_eq!(criteria.height, None);
        assert_eq!(criteria.depth_range, None);
        assert_eq!(criteria.price_range, None);
        assert!(!criteria.has_refinements());
    }

    #[test]
    fn test_ranges_parse_partial_bounds() {
        let criteria = FilterCriteria::from_raw(RawFilterInput {
            price_range: Some(RawRange::new(Some("500"), Some("2500.50"))),
            width_range: Some(RawRange::new(None, Some("12"))),
            ..RawFilterInput::default()
        });
        assert_eq!(
            criteria.price_range,
            Some(Range::between(Decimal::new(500, 0), Decimal::new(250_050, 2)))
        );
        assert_eq!(criteria.width_range, Some(Range::new(None, Some(12.0))));
    }

    #[test]
    fn test_apply_keeps_absent_fields() {
        let mut criteria = FilterCriteria::from_raw(RawFilterInput {
            materials: Some(vec!["Brass".to_string()]),
            sort: Some("newest".to_string()),
            ..RawFilterInput::default()
        });
        criteria.apply(RawFilterInput {
            gods: Some(vec!["Shiva".to_string(), " Shiva ".to_string()]),
            ..RawFilterInput::default()
        });
        assert_eq!(criteria.materials, vec!["Brass".to_string()]);
        assert_eq!(criteria.gods, vec!["Shiva".to_string()]);
        assert_eq!(criteria.sort, Some(SortKey::Newest));
    }

    #[test]
    fn test_unknown_sort_falls_back_to_default_order() {
        let criteria = FilterCriteria::from_raw(RawFilterInput {
            sort: Some("rating".to_string()),
            ..RawFilterInput::default()
        });
        assert_eq!(criteria.sort, None);
    }

    #[test]
    fn test_clear_filters_keeps_search_and_sort() {
        let criteria = FilterCriteria::from_raw(RawFilterInput {
            search: Some("diya".to_string()),
            categories: Some(vec!["Lamps".to_string()]),
            sort: Some("popular".to_string()),
            ..RawFilterInput::default()
        });
        let cleared = criteria.clear_filters();
        assert_eq!(cleared.search.as_deref(), Some("diya"));
        assert_eq!(cleared.sort, Some(SortKey::Popular));
        assert!(cleared.categories.is_empty());
    }

    #[test]
    fn test_weight_range_counts_as_refinement() {
        let criteria = FilterCriteria::from_raw(RawFilterInput {
            search: Some("lamp".to_string()),
            weight_range: Some(RawRange::new(Some("1"), Some("3"))),
            ..RawFilterInput::default()
        });
        assert!(!criteria.uses_comprehensive_search());
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let range = Range::between(1.0, 3.0);
        assert!(range.contains(1.0));
        assert!(range.contains(3.0));
        assert!(!range.contains(3.5));
        assert!(Range::<f64>::new(None, None).contains(100.0));
    }

    #[test]
    fn test_page_request_normalization() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(3, 12);
        assert_eq!(page.offset(), 24);
        assert_eq!(page.limit(), 12);
        assert_eq!(page.total_pages(25), 3);
        assert_eq!(page.total_pages(0), 0);
    }

    #[test]
    fn test_raw_input_accepts_camel_case_keys() {
        let raw: RawFilterInput = serde_json::from_str(
            r#"{"search":"diya","priceRange":{"min":"100","max":"900"},"skuSearch":"BR-"}"#,
        )
        .unwrap_or_default();
        let criteria = FilterCriteria::from_raw(raw);
        assert_eq!(criteria.sku_search.as_deref(), Some("BR-"));
        assert!(criteria.price_range.is_some());
    }
}
