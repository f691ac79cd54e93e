//! Filter/Search Engine. Pure derivations over product sequences; nothing
//! here is cached between calls.

use crate::error::FilterError;
use crate::model::Product;
use serde::{Deserialize, Serialize};

/// Inclusive price bounds. A missing bound doesn't restrict.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilter {
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
}

impl PriceFilter {
  pub const UNBOUNDED: PriceFilter = PriceFilter {
    min_price: None,
    max_price: None,
  };

  pub const fn between(min_price: f64, max_price: f64) -> Self {
    Self {
      min_price: Some(min_price),
      max_price: Some(max_price),
    }
  }

  /// A user-entered range. Both bounds set requires `min < max`.
  pub fn custom(min_price: Option<f64>, max_price: Option<f64>) -> Result<Self, FilterError> {
    if let (Some(min), Some(max)) = (min_price, max_price) {
      if min >= max {
        return Err(FilterError::InvertedRange {
          min_price: min,
          max_price: max,
        });
      }
    }
    Ok(Self { min_price, max_price })
  }

  pub fn is_unbounded(&self) -> bool {
    self.min_price.is_none() && self.max_price.is_none()
  }

  pub fn admits(&self, price: f64) -> bool {
    self.min_price.map_or(true, |min| price >= min) && self.max_price.map_or(true, |max| price <= max)
  }

  /// True when any vendor's price falls in range.
  pub fn matches(&self, product: &Product) -> bool {
    self.is_unbounded() || product.sites.iter().any(|site| self.admits(site.price))
  }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricePreset {
  pub label: &'static str,
  pub min_price: f64,
  pub max_price: f64,
}

impl PricePreset {
  const fn new(label: &'static str, min_price: f64, max_price: f64) -> Self {
    Self {
      label,
      min_price,
      max_price,
    }
  }

  pub fn filter(&self) -> PriceFilter {
    PriceFilter::between(self.min_price, self.max_price)
  }
}

pub const PRICE_PRESETS: [PricePreset; 7] = [
  PricePreset::new("$1-25", 1.0, 25.0),
  PricePreset::new("$25-50", 25.0, 50.0),
  PricePreset::new("$50-100", 50.0, 100.0),
  PricePreset::new("$100-200", 100.0, 200.0),
  PricePreset::new("$200-400", 200.0, 400.0),
  PricePreset::new("$400-800", 400.0, 800.0),
  PricePreset::new("$800-1600", 800.0, 1600.0),
];

pub fn preset(label: &str) -> Result<PriceFilter, FilterError> {
  PRICE_PRESETS
    .iter()
    .find(|preset| preset.label == label)
    .map(PricePreset::filter)
    .ok_or_else(|| FilterError::UnknownPreset(label.to_string()))
}

/// Current search inputs for one view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterState {
  pub query: String,
  pub price: PriceFilter,
}

impl FilterState {
  pub fn apply<'a, I>(&self, items: I) -> Vec<&'a Product>
  where
    I: IntoIterator<Item = &'a Product>,
  {
    filter_products(items, &self.query, &self.price)
  }
}

/// Name substring match (case-insensitive) AND price match.
pub fn filter_products<'a, I>(items: I, query: &str, price: &PriceFilter) -> Vec<&'a Product>
where
  I: IntoIterator<Item = &'a Product>,
{
  items
    .into_iter()
    .filter(|product| product.matches_query(query) && price.matches(product))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::product;

  fn priced() -> Vec<Product> {
    vec![
      product(1, "Budget Phone", &[10.0]),
      product(2, "Midrange Phone", &[30.0]),
      product(3, "Flagship Phone", &[55.0]),
    ]
  }

  fn ids(products: Vec<&Product>) -> Vec<i64> {
    products.iter().map(|product| product.id).collect()
  }

  #[test]
  fn price_range_is_inclusive() {
    let products = priced();
    assert_eq!(ids(filter_products(&products, "", &PriceFilter::between(20.0, 40.0))), vec![2]);
    assert_eq!(ids(filter_products(&products, "", &PriceFilter::between(30.0, 55.0))), vec![2, 3]);
  }

  #[test]
  fn unbounded_filter_keeps_everything() {
    let mut products = priced();
    products.push(product(4, "Unpriced Phone", &[]));
    assert_eq!(ids(filter_products(&products, "", &PriceFilter::UNBOUNDED)), vec![1, 2, 3, 4]);
  }

  #[test]
  fn single_bound_is_half_open() {
    let products = priced();
    let at_least = PriceFilter {
      min_price: Some(30.0),
      max_price: None,
    };
    let at_most = PriceFilter {
      min_price: None,
      max_price: Some(30.0),
    };
    assert_eq!(ids(filter_products(&products, "", &at_least)), vec![2, 3]);
    assert_eq!(ids(filter_products(&products, "", &at_most)), vec![1, 2]);
  }

  #[test]
  fn any_vendor_in_range_matches() {
    let products = vec![product(1, "Monitor", &[500.0, 35.0])];
    assert_eq!(ids(filter_products(&products, "", &PriceFilter::between(20.0, 40.0))), vec![1]);
  }

  #[test]
  fn query_and_price_combine() {
    let products = priced();
    assert!(filter_products(&products, "tablet", &PriceFilter::UNBOUNDED).is_empty());
    assert_eq!(ids(filter_products(&products, "PHONE", &PriceFilter::between(50.0, 100.0))), vec![3]);
    assert!(filter_products(&products, "budget", &PriceFilter::between(50.0, 100.0)).is_empty());
  }

  #[test]
  fn custom_range_requires_min_below_max() {
    assert!(matches!(
      PriceFilter::custom(Some(40.0), Some(20.0)),
      Err(FilterError::InvertedRange { .. })
    ));
    assert!(PriceFilter::custom(Some(20.0), Some(20.0)).is_err());
    assert_eq!(PriceFilter::custom(Some(20.0), None), Ok(PriceFilter {
      min_price: Some(20.0),
      max_price: None,
    }));
  }

  #[test]
  fn presets_resolve_by_label() {
    assert_eq!(preset("$25-50"), Ok(PriceFilter::between(25.0, 50.0)));
    assert!(matches!(preset("$5-10"), Err(FilterError::UnknownPreset(_))));
  }

  #[test]
  fn filter_state_applies_both_inputs() {
    let products = priced();
    let state = FilterState {
      query: "phone".to_string(),
      price: PriceFilter::between(1.0, 25.0),
    };
    assert_eq!(ids(state.apply(&products)), vec![1]);
  }
}
