//! Product Store: the loaded catalog, the tracked subset and each product's
//! selected vendors.

use crate::catalog::{catalog_fingerprint, CatalogLoader};
use crate::config::TrackingMode;
use crate::error::ProductError;
use crate::model::{Product, ProductId, Site};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum LoadState {
  NotAttempted,
  Loaded {
    at: DateTime<Utc>,
    fingerprint: String,
  },
  Failed {
    at: DateTime<Utc>,
    reason: String,
  },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
  pub attempted: bool,
  pub loaded: bool,
  pub product_count: usize,
  pub fingerprint: Option<String>,
  pub attempted_at: Option<String>,
  pub error: Option<String>,
}

#[derive(Debug)]
pub struct ProductStore {
  products: Vec<Product>,
  load: LoadState,
  tracking_mode: TrackingMode,
  tracked: Vec<Product>,
  selected_sites: HashMap<ProductId, Vec<String>>,
}

impl ProductStore {
  pub fn new(tracking_mode: TrackingMode, tracked: Vec<Product>) -> Self {
    Self {
      products: Vec::new(),
      load: LoadState::NotAttempted,
      tracking_mode,
      tracked,
      selected_sites: HashMap::new(),
    }
  }

  /// Loads the catalog on first call. Later calls do nothing, even when the
  /// first attempt failed; a failure leaves the store empty.
  pub fn ensure_loaded(&mut self, loader: &dyn CatalogLoader, now: DateTime<Utc>) -> bool {
    if self.load != LoadState::NotAttempted {
      return self.is_loaded();
    }

    match loader.load() {
      Ok(products) => {
        let fingerprint = catalog_fingerprint(&products);
        log::info!(
          "catalog loaded: {} products, fingerprint {}",
          products.len(),
          fingerprint
        );
        self.products = products;
        self.load = LoadState::Loaded { at: now, fingerprint };
        true
      }
      Err(error) => {
        log::error!("Failed to fetch products: {}", error);
        self.load = LoadState::Failed {
          at: now,
          reason: error.to_string(),
        };
        false
      }
    }
  }

  pub fn is_loaded(&self) -> bool {
    matches!(self.load, LoadState::Loaded { .. })
  }

  pub fn status(&self) -> CatalogStatus {
    let (fingerprint, attempted_at, error) = match &self.load {
      LoadState::NotAttempted => (None, None, None),
      LoadState::Loaded { at, fingerprint } => (Some(fingerprint.clone()), Some(at.to_rfc3339()), None),
      LoadState::Failed { at, reason } => (None, Some(at.to_rfc3339()), Some(reason.clone())),
    };

    CatalogStatus {
      attempted: self.load != LoadState::NotAttempted,
      loaded: self.is_loaded(),
      product_count: self.products.len(),
      fingerprint,
      attempted_at,
      error,
    }
  }

  pub fn products(&self) -> &[Product] {
    &self.products
  }

  pub fn product(&self, id: ProductId) -> Option<&Product> {
    self.products.iter().find(|product| product.id == id)
  }

  pub fn require(&self, id: ProductId) -> Result<&Product, ProductError> {
    self.product(id).ok_or(ProductError::NotFound(id))
  }

  pub fn tracking_mode(&self) -> TrackingMode {
    self.tracking_mode
  }

  /// Products shown on the home view.
  pub fn tracked_products(&self) -> &[Product] {
    match self.tracking_mode {
      TrackingMode::WholeCatalog => &self.products,
      TrackingMode::Explicit => &self.tracked,
    }
  }

  /// The explicit list as persisted, regardless of mode.
  pub fn explicit_tracked(&self) -> &[Product] {
    &self.tracked
  }

  fn is_tracked(&self, id: ProductId) -> bool {
    self.tracked.iter().any(|product| product.id == id)
  }

  /// Catalog products that could still be tracked. The first catalog product
  /// is always on the home view and never offered.
  pub fn tracking_candidates(&self) -> Vec<&Product> {
    self
      .products
      .iter()
      .skip(1)
      .filter(|product| !self.is_tracked(product.id))
      .collect()
  }

  /// Appends catalog products to the explicit list. Unknown and already
  /// tracked ids are skipped. Returns how many were added.
  pub fn track_products(&mut self, ids: &[ProductId]) -> usize {
    let mut added = 0;
    for id in ids {
      if self.is_tracked(*id) {
        continue;
      }
      match self.product(*id).cloned() {
        Some(product) => {
          self.tracked.push(product);
          added += 1;
        }
        None => log::debug!("skipping unknown product {} for tracking", id),
      }
    }
    added
  }

  pub fn untrack_product(&mut self, id: ProductId) -> bool {
    let before = self.tracked.len();
    self.tracked.retain(|product| product.id != id);
    self.tracked.len() != before
  }

  fn selection_for(&mut self, id: ProductId) -> Result<(&Product, &mut Vec<String>), ProductError> {
    let product = self
      .products
      .iter()
      .find(|product| product.id == id)
      .ok_or(ProductError::NotFound(id))?;
    let selection = self
      .selected_sites
      .entry(id)
      .or_insert_with(|| product.sites.first().map(|site| vec![site.site.clone()]).unwrap_or_default());
    Ok((product, selection))
  }

  /// Vendors the user tracks for this product, defaulting to the first one.
  pub fn selected_sites(&mut self, id: ProductId) -> Result<Vec<Site>, ProductError> {
    let (product, selection) = self.selection_for(id)?;
    Ok(
      selection
        .iter()
        .filter_map(|vendor| product.site(vendor).cloned())
        .collect(),
    )
  }

  pub fn unselected_sites(&mut self, id: ProductId) -> Result<Vec<Site>, ProductError> {
    let (product, selection) = self.selection_for(id)?;
    Ok(
      product
        .sites
        .iter()
        .filter(|site| !selection.contains(&site.site))
        .cloned()
        .collect(),
    )
  }

  /// Adds the named vendors to the selection in catalog order. Vendors the
  /// product doesn't list, or that are already selected, are ignored.
  pub fn select_sites(&mut self, id: ProductId, vendors: &[String]) -> Result<Vec<Site>, ProductError> {
    let (product, selection) = self.selection_for(id)?;
    for site in &product.sites {
      if vendors.contains(&site.site) && !selection.contains(&site.site) {
        selection.push(site.site.clone());
      }
    }
    self.selected_sites(id)
  }
}
