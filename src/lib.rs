pub mod catalog;
pub mod clock;
pub mod collections;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod products;
pub mod session;
pub mod storage;
pub mod undo;

#[cfg(feature = "desktop")]
pub mod commands;

pub use collections::{Collection, CollectionKey, Collections, FavoriteToggle, Removal, ALL_ITEMS};
pub use config::{CatalogSource, Config, TrackingMode};
pub use filter::{PriceFilter, PRICE_PRESETS};
pub use model::{Product, ProductId, Site};
pub use session::{ShopSession, ToggleOutcome};
pub use undo::UndoTicket;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  use tauri::Manager;

  tauri::Builder::default()
    .setup(|app| {
      let app_data_dir = app.path().app_data_dir()?;
      let config = Config::from_env(&app_data_dir);
      let session = ShopSession::open(config)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::Other, error))?;
      app.manage(commands::AppState::new(session));

      if cfg!(debug_assertions) {
        app.handle().plugin(
          tauri_plugin_log::Builder::default()
            .level(log::LevelFilter::Info)
            .build(),
        )?;
      }
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      commands::load_catalog,
      commands::catalog_status,
      commands::get_products,
      commands::get_filtered_products,
      commands::set_search_query,
      commands::set_price_filter,
      commands::apply_price_preset,
      commands::reset_filters,
      commands::price_presets,
      commands::list_collections,
      commands::get_collection,
      commands::create_collection,
      commands::add_to_collections,
      commands::remove_from_collection,
      commands::toggle_favorite,
      commands::get_favorites,
      commands::search_favorites,
      commands::undo_removal,
      commands::undo_status,
      commands::get_tracked_products,
      commands::get_tracking_candidates,
      commands::track_products,
      commands::untrack_product,
      commands::get_selected_sites,
      commands::get_unselected_sites,
      commands::select_sites
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
