//! Tauri command surface. Every command locks the session, delegates, and
//! renders errors as display strings.

use crate::collections::{Collection, ALL_ITEMS};
use crate::filter::{PriceFilter, PricePreset, PRICE_PRESETS};
use crate::model::{Product, ProductId, Site};
use crate::products::CatalogStatus;
use crate::session::{ShopSession, ToggleOutcome};
use crate::undo::UndoTicket;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tauri::State;

pub struct AppState {
  session: Mutex<ShopSession>,
}

impl AppState {
  pub fn new(session: ShopSession) -> Self {
    Self {
      session: Mutex::new(session),
    }
  }
}

fn lock_session<'a>(state: &'a State<'_, AppState>) -> Result<MutexGuard<'a, ShopSession>, String> {
  state.session.lock().map_err(|e| e.to_string())
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummaryDto {
  name: String,
  is_all_items: bool,
  item_count: usize,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDto {
  name: String,
  is_all_items: bool,
  items: Vec<Product>,
}

impl From<&Collection> for CollectionDto {
  fn from(collection: &Collection) -> Self {
    Self {
      name: collection.name().to_string(),
      is_all_items: collection.name() == ALL_ITEMS,
      items: collection.items.clone(),
    }
  }
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteDto {
  removed: bool,
  undo: Option<UndoTicket>,
  choices: Vec<String>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UndoStatusDto {
  pending: bool,
  ticket: Option<UndoTicket>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCollectionsInput {
  product_id: ProductId,
  collection_names: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCollectionInput {
  collection_name: String,
  product_id: ProductId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilterInput {
  min_price: Option<f64>,
  max_price: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSitesInput {
  product_id: ProductId,
  vendors: Vec<String>,
}

#[tauri::command]
pub fn load_catalog(state: State<'_, AppState>) -> Result<CatalogStatus, String> {
  let mut session = lock_session(&state)?;
  session.load_catalog();
  Ok(session.catalog_status())
}

#[tauri::command]
pub fn catalog_status(state: State<'_, AppState>) -> Result<CatalogStatus, String> {
  let session = lock_session(&state)?;
  Ok(session.catalog_status())
}

#[tauri::command]
pub fn get_products(state: State<'_, AppState>) -> Result<Vec<Product>, String> {
  let mut session = lock_session(&state)?;
  session.load_catalog();
  Ok(session.tracked_products().to_vec())
}

#[tauri::command]
pub fn get_filtered_products(state: State<'_, AppState>) -> Result<Vec<Product>, String> {
  let mut session = lock_session(&state)?;
  session.load_catalog();
  Ok(session.filtered_products().into_iter().cloned().collect())
}

#[tauri::command]
pub fn set_search_query(state: State<'_, AppState>, query: String) -> Result<Vec<Product>, String> {
  let mut session = lock_session(&state)?;
  session.set_search_query(&query);
  Ok(session.filtered_products().into_iter().cloned().collect())
}

#[tauri::command]
pub fn set_price_filter(state: State<'_, AppState>, input: PriceFilterInput) -> Result<PriceFilter, String> {
  let mut session = lock_session(&state)?;
  session
    .set_price_filter(input.min_price, input.max_price)
    .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn apply_price_preset(state: State<'_, AppState>, label: String) -> Result<PriceFilter, String> {
  let mut session = lock_session(&state)?;
  session.apply_price_preset(&label).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn reset_filters(state: State<'_, AppState>) -> Result<PriceFilter, String> {
  let mut session = lock_session(&state)?;
  session.reset_filters();
  Ok(session.filter_state().price)
}

#[tauri::command]
pub fn price_presets() -> Vec<PricePreset> {
  PRICE_PRESETS.to_vec()
}

#[tauri::command]
pub fn list_collections(state: State<'_, AppState>) -> Result<Vec<CollectionSummaryDto>, String> {
  let session = lock_session(&state)?;
  Ok(
    session
      .collections()
      .sorted()
      .into_iter()
      .map(|collection| CollectionSummaryDto {
        name: collection.name().to_string(),
        is_all_items: collection.name() == ALL_ITEMS,
        item_count: collection.items.len(),
      })
      .collect(),
  )
}

#[tauri::command]
pub fn get_collection(state: State<'_, AppState>, name: String) -> Result<CollectionDto, String> {
  let session = lock_session(&state)?;
  let collection = session.collection(&name).map_err(|e| e.to_string())?;
  Ok(CollectionDto::from(collection))
}

#[tauri::command]
pub fn create_collection(state: State<'_, AppState>, name: String) -> Result<Vec<String>, String> {
  let mut session = lock_session(&state)?;
  session.create_collection(&name).map_err(|e| e.to_string())?;
  Ok(session.collections().choices())
}

#[tauri::command]
pub fn add_to_collections(state: State<'_, AppState>, input: AddToCollectionsInput) -> Result<Vec<ProductId>, String> {
  let mut session = lock_session(&state)?;
  session
    .add_to_collections(&input.collection_names, input.product_id)
    .map_err(|e| e.to_string())?;
  Ok(session.favorite_ids())
}

#[tauri::command]
pub fn remove_from_collection(
  state: State<'_, AppState>,
  input: RemoveFromCollectionInput,
) -> Result<Option<UndoTicket>, String> {
  let mut session = lock_session(&state)?;
  session
    .remove_from_collection(&input.collection_name, input.product_id)
    .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn toggle_favorite(state: State<'_, AppState>, product_id: ProductId) -> Result<ToggleFavoriteDto, String> {
  let mut session = lock_session(&state)?;
  let outcome = session.toggle_favorite(product_id).map_err(|e| e.to_string())?;
  Ok(match outcome {
    ToggleOutcome::Removed(ticket) => ToggleFavoriteDto {
      removed: true,
      undo: Some(ticket),
      choices: Vec::new(),
    },
    ToggleOutcome::ChooseCollections(choices) => ToggleFavoriteDto {
      removed: false,
      undo: None,
      choices,
    },
  })
}

#[tauri::command]
pub fn get_favorites(state: State<'_, AppState>) -> Result<Vec<ProductId>, String> {
  let session = lock_session(&state)?;
  Ok(session.favorite_ids())
}

#[tauri::command]
pub fn search_favorites(state: State<'_, AppState>, query: String) -> Result<Vec<Product>, String> {
  let session = lock_session(&state)?;
  Ok(session.search_favorites(&query).into_iter().cloned().collect())
}

#[tauri::command]
pub fn undo_removal(state: State<'_, AppState>) -> Result<bool, String> {
  let mut session = lock_session(&state)?;
  Ok(session.undo())
}

#[tauri::command]
pub fn undo_status(state: State<'_, AppState>) -> Result<UndoStatusDto, String> {
  let mut session = lock_session(&state)?;
  let ticket = session.undo_status();
  Ok(UndoStatusDto {
    pending: ticket.is_some(),
    ticket,
  })
}

#[tauri::command]
pub fn get_tracked_products(state: State<'_, AppState>) -> Result<Vec<Product>, String> {
  let session = lock_session(&state)?;
  Ok(session.tracked_products().to_vec())
}

#[tauri::command]
pub fn get_tracking_candidates(state: State<'_, AppState>) -> Result<Vec<Product>, String> {
  let mut session = lock_session(&state)?;
  session.load_catalog();
  Ok(session.tracking_candidates().into_iter().cloned().collect())
}

#[tauri::command]
pub fn track_products(state: State<'_, AppState>, product_ids: Vec<ProductId>) -> Result<Vec<Product>, String> {
  let mut session = lock_session(&state)?;
  session.track_products(&product_ids);
  Ok(session.tracked_products().to_vec())
}

#[tauri::command]
pub fn untrack_product(state: State<'_, AppState>, product_id: ProductId) -> Result<Vec<Product>, String> {
  let mut session = lock_session(&state)?;
  session.untrack_product(product_id);
  Ok(session.tracked_products().to_vec())
}

#[tauri::command]
pub fn get_selected_sites(state: State<'_, AppState>, product_id: ProductId) -> Result<Vec<Site>, String> {
  let mut session = lock_session(&state)?;
  session.selected_sites(product_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_unselected_sites(state: State<'_, AppState>, product_id: ProductId) -> Result<Vec<Site>, String> {
  let mut session = lock_session(&state)?;
  session.unselected_sites(product_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn select_sites(state: State<'_, AppState>, input: SelectSitesInput) -> Result<Vec<Site>, String> {
  let mut session = lock_session(&state)?;
  session
    .select_sites(input.product_id, &input.vendors)
    .map_err(|e| e.to_string())
}
