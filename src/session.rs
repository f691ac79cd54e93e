//! `ShopSession`: the one owned store object for a user session.
//!
//! Constructed once at session start with its clock and storage tiers, then
//! handed by reference to whatever needs it. It is the only path that
//! mutates collections, favorites and tracked products, and it writes every
//! change through to storage.

use crate::catalog::CatalogLoader;
use crate::clock::{Clock, SystemClock};
use crate::collections::{Collection, CollectionKey, CollectionRecord, Collections, FavoriteToggle};
use crate::config::Config;
use crate::error::{CollectionError, FilterError, ProductError, ShopError, StorageError};
use crate::filter::{self, FilterState, PriceFilter};
use crate::model::{Product, ProductId, Site};
use crate::products::{CatalogStatus, ProductStore};
use crate::storage::{
  read_json, write_json, KeyValueStore, MemoryStore, SqliteStore, COLLECTIONS_KEY, FAVORITES_KEY,
  TRACKED_PRODUCTS_KEY,
};
use crate::undo::{UndoManager, UndoTicket};
use std::sync::Arc;

/// Result of toggling a product's favorite state.
#[derive(Clone, Debug, PartialEq)]
pub enum ToggleOutcome {
  /// Removed from every collection; undoable until the ticket expires.
  Removed(UndoTicket),
  /// Not yet a favorite; confirm with one or more of these names.
  ChooseCollections(Vec<String>),
}

pub struct ShopSession {
  config: Config,
  clock: Arc<dyn Clock>,
  products: ProductStore,
  collections: Collections,
  undo: UndoManager,
  home_filter: FilterState,
  session_store: Box<dyn KeyValueStore>,
  durable_store: Box<dyn KeyValueStore>,
}

impl ShopSession {
  /// Production wiring: system clock, in-memory session tier and the SQLite
  /// durable tier at `config.database_path`.
  pub fn open(config: Config) -> Result<Self, StorageError> {
    let durable = SqliteStore::open(&config.database_path)?;
    Ok(Self::new(
      config,
      Arc::new(SystemClock),
      Box::new(MemoryStore::new()),
      Box::new(durable),
    ))
  }

  /// Seeds state from both tiers (read once) and writes the reconciled
  /// favorites back.
  pub fn new(
    config: Config,
    clock: Arc<dyn Clock>,
    session_store: Box<dyn KeyValueStore>,
    durable_store: Box<dyn KeyValueStore>,
  ) -> Self {
    let tracked: Vec<Product> = read_json(durable_store.as_ref(), TRACKED_PRODUCTS_KEY).unwrap_or_default();
    let records: Vec<CollectionRecord> = read_json(session_store.as_ref(), COLLECTIONS_KEY).unwrap_or_default();
    let collections = Collections::from_records(records);

    if let Some(mut stored) = read_json::<Vec<ProductId>>(session_store.as_ref(), FAVORITES_KEY) {
      stored.sort_unstable();
      stored.dedup();
      if stored != collections.favorite_ids() {
        log::warn!("stored favorites disagree with collection membership, rebuilding from collections");
      }
    }

    let undo = UndoManager::new(clock.clone(), config.undo_window);
    let mut session = Self {
      products: ProductStore::new(config.tracking_mode, tracked),
      config,
      clock,
      collections,
      undo,
      home_filter: FilterState::default(),
      session_store,
      durable_store,
    };
    session.persist_collections();
    log::info!(
      "session started with {} collections, {} favorites, {} tracked products",
      session.collections.iter().count(),
      session.collections.favorite_ids().len(),
      session.products.explicit_tracked().len()
    );
    session
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Flushes state to both tiers and ends the session.
  pub fn close(mut self) {
    self.persist_collections();
    self.persist_tracked();
    log::info!("session closed");
  }

  // --- catalog and products -------------------------------------------------

  /// Loads the configured catalog on first call; see [`ProductStore::ensure_loaded`].
  pub fn load_catalog(&mut self) -> bool {
    let source = self.config.catalog_source.clone();
    self.load_catalog_with(&source)
  }

  pub fn load_catalog_with(&mut self, loader: &dyn CatalogLoader) -> bool {
    let now = self.clock.now();
    self.products.ensure_loaded(loader, now)
  }

  pub fn catalog_status(&self) -> CatalogStatus {
    self.products.status()
  }

  pub fn products(&self) -> &[Product] {
    self.products.products()
  }

  pub fn product(&self, id: ProductId) -> Result<&Product, ProductError> {
    self.products.require(id)
  }

  // Catalog first, then anything already held by the user.
  fn find_product(&self, id: ProductId) -> Result<Product, ProductError> {
    self
      .products
      .product(id)
      .or_else(|| self.products.explicit_tracked().iter().find(|product| product.id == id))
      .or_else(|| self.collections.all_items().items.iter().find(|product| product.id == id))
      .cloned()
      .ok_or(ProductError::NotFound(id))
  }

  pub fn tracked_products(&self) -> &[Product] {
    self.products.tracked_products()
  }

  pub fn tracking_candidates(&self) -> Vec<&Product> {
    self.products.tracking_candidates()
  }

  pub fn track_products(&mut self, ids: &[ProductId]) -> usize {
    let added = self.products.track_products(ids);
    if added > 0 {
      self.persist_tracked();
    }
    added
  }

  pub fn untrack_product(&mut self, id: ProductId) -> bool {
    let removed = self.products.untrack_product(id);
    if removed {
      self.persist_tracked();
    }
    removed
  }

  pub fn selected_sites(&mut self, id: ProductId) -> Result<Vec<Site>, ProductError> {
    self.products.selected_sites(id)
  }

  pub fn unselected_sites(&mut self, id: ProductId) -> Result<Vec<Site>, ProductError> {
    self.products.unselected_sites(id)
  }

  pub fn select_sites(&mut self, id: ProductId, vendors: &[String]) -> Result<Vec<Site>, ProductError> {
    self.products.select_sites(id, vendors)
  }

  // --- search and filters ---------------------------------------------------

  pub fn filter_state(&self) -> &FilterState {
    &self.home_filter
  }

  pub fn set_search_query(&mut self, query: &str) {
    self.home_filter.query = query.to_string();
  }

  /// Applies a custom range. An inverted range leaves the previous filter in place.
  pub fn set_price_filter(&mut self, min_price: Option<f64>, max_price: Option<f64>) -> Result<PriceFilter, FilterError> {
    let price = PriceFilter::custom(min_price, max_price)?;
    self.home_filter.price = price;
    Ok(price)
  }

  pub fn apply_price_preset(&mut self, label: &str) -> Result<PriceFilter, FilterError> {
    let price = filter::preset(label)?;
    self.home_filter.price = price;
    Ok(price)
  }

  pub fn reset_filters(&mut self) {
    self.home_filter.price = PriceFilter::UNBOUNDED;
  }

  /// The home view: tracked products through the current query and price filter.
  pub fn filtered_products(&self) -> Vec<&Product> {
    self.home_filter.apply(self.products.tracked_products())
  }

  pub fn search_favorites(&self, query: &str) -> Vec<&Product> {
    filter::filter_products(&self.collections.all_items().items, query, &PriceFilter::UNBOUNDED)
  }

  // --- collections and favorites --------------------------------------------

  pub fn collections(&self) -> &Collections {
    &self.collections
  }

  pub fn collection(&self, name: &str) -> Result<&Collection, CollectionError> {
    self.collections.get_by_name(name)
  }

  pub fn is_favorite(&self, id: ProductId) -> bool {
    self.collections.is_favorite(id)
  }

  pub fn favorite_ids(&self) -> Vec<ProductId> {
    self.collections.favorite_ids()
  }

  pub fn create_collection(&mut self, name: &str) -> Result<CollectionKey, CollectionError> {
    let key = self.collections.create_collection(name)?;
    self.persist_collections();
    Ok(key)
  }

  pub fn add_to_collection(&mut self, name: &str, product_id: ProductId) -> Result<(), ShopError> {
    let product = self.find_product(product_id)?;
    self
      .collections
      .add_to_collection(&CollectionKey::from_name(name), &product)?;
    self.persist_collections();
    Ok(())
  }

  pub fn add_to_collections(&mut self, names: &[String], product_id: ProductId) -> Result<(), ShopError> {
    let product = self.find_product(product_id)?;
    let keys: Vec<CollectionKey> = names.iter().map(|name| CollectionKey::from_name(name)).collect();
    self.collections.add_to_collections(&keys, &product)?;
    self.persist_collections();
    Ok(())
  }

  /// Removes and opens an undo window. `None` when the product wasn't in
  /// that collection; the previous undo window then stays as it was.
  pub fn remove_from_collection(&mut self, name: &str, product_id: ProductId) -> Result<Option<UndoTicket>, ShopError> {
    let removal = self
      .collections
      .remove_from_collection(&CollectionKey::from_name(name), product_id)?;
    let Some(removal) = removal else {
      return Ok(None);
    };

    self.persist_collections();
    Ok(Some(self.undo.record(removal)))
  }

  pub fn toggle_favorite(&mut self, product_id: ProductId) -> Result<ToggleOutcome, ShopError> {
    let product = self.find_product(product_id)?;
    match self.collections.toggle_favorite(&product) {
      FavoriteToggle::Removed(removal) => {
        self.persist_collections();
        Ok(ToggleOutcome::Removed(self.undo.record(removal)))
      }
      FavoriteToggle::ChooseCollections(names) => Ok(ToggleOutcome::ChooseCollections(names)),
    }
  }

  // --- undo -----------------------------------------------------------------

  /// Reverses the last removal if its window is still open.
  pub fn undo(&mut self) -> bool {
    let Some(removal) = self.undo.take() else {
      return false;
    };
    self.collections.restore(&removal);
    self.persist_collections();
    log::debug!("restored product {} to {:?}", removal.product.id, removal.source_collection_names());
    true
  }

  pub fn undo_status(&mut self) -> Option<UndoTicket> {
    self.undo.pending().cloned()
  }

  pub fn expire_undo(&mut self) -> bool {
    self.undo.expire()
  }

  // --- persistence ----------------------------------------------------------

  fn persist_collections(&mut self) {
    let records = self.collections.to_records();
    if let Err(error) = write_json(self.session_store.as_mut(), COLLECTIONS_KEY, &records) {
      log::warn!("could not persist collections: {}", error);
    }
    let favorites = self.collections.favorite_ids();
    if let Err(error) = write_json(self.session_store.as_mut(), FAVORITES_KEY, &favorites) {
      log::warn!("could not persist favorites: {}", error);
    }
  }

  fn persist_tracked(&mut self) {
    let tracked = self.products.explicit_tracked().to_vec();
    if let Err(error) = write_json(self.durable_store.as_mut(), TRACKED_PRODUCTS_KEY, &tracked) {
      log::warn!("could not persist tracked products: {}", error);
    }
  }
}
