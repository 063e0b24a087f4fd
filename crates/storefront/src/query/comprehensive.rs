//! Weight-aware full-text matching over the whole catalog.
//!
//! Used when a search term is the only active filter. A term that reads as
//! a weight ("2kg", "500g", "3") also matches every product at least that
//! heavy, which a remote substring query cannot express.

use handicraft_core::{ProductRecord, parse_weight_kg};

/// A compiled comprehensive search term.
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensiveSearch {
    needle: String,
    weight_kg: Option<f64>,
}

impl ComprehensiveSearch {
    #[must_use]
    pub fn new(term: &str) -> Self {
        let term = term.trim();
        Self {
            needle: term.to_lowercase(),
            weight_kg: parse_weight_kg(term),
        }
    }

    /// Minimum weight in kilograms, when the term reads as a weight.
    #[must_use]
    pub const fn weight_query(&self) -> Option<f64> {
        self.weight_kg
    }

    /// Whether `record` matches the term.
    ///
    /// A record matches when any of these holds:
    /// - the term is a weight and the record weighs at least that much
    /// - the term appears in one of the record's descriptive text fields
    /// - the term is not a weight and appears in the raw weight text
    /// - the term appears in one of the record's gods, tags, or occasions
    #[must_use]
    pub fn matches(&self, record: &ProductRecord) -> bool {
        if let Some(min_kg) = self.weight_kg
            && record.weight_kg().is_some_and(|kg| kg >= min_kg)
        {
            return true;
        }

        let text_fields = [
            Some(record.name.as_str()),
            record.description.as_deref(),
            Some(record.material.as_str()),
            record.dimensions.as_deref(),
            record.sku.as_deref(),
            record.artisan.as_deref(),
            record.region_of_origin.as_deref(),
            Some(record.category.as_str()),
            record.subcategory.as_deref(),
        ];
        if text_fields.into_iter().flatten().any(|text| self.found_in(text)) {
            return true;
        }

        if self.weight_kg.is_none() && record.weight.as_deref().is_some_and(|w| self.found_in(w)) {
            return true;
        }

        record
            .related_gods
            .iter()
            .chain(&record.tags)
            .chain(&record.occasions)
            .any(|entry| self.found_in(entry))
    }

    fn found_in(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.needle)
    }
}
