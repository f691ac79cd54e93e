//! Favorites/Collections Engine.
//!
//! Owns the collection graph: the "All Items" aggregate plus user-named
//! collections, and the favorites set derived from them. All mutations go
//! through [`Collections`] so that, after every call, a product id is a
//! favorite exactly when it is in "All Items", and every item of a named
//! collection is also in "All Items".

use crate::error::CollectionError;
use crate::model::{Product, ProductId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const ALL_ITEMS: &str = "All Items";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum CollectionKey {
  AllItems,
  Named(String),
}

impl CollectionKey {
  /// Resolves a display name; "All Items" maps to the aggregate.
  pub fn from_name(name: &str) -> Self {
    if name == ALL_ITEMS {
      CollectionKey::AllItems
    } else {
      CollectionKey::Named(name.to_string())
    }
  }

  pub fn name(&self) -> &str {
    match self {
      CollectionKey::AllItems => ALL_ITEMS,
      CollectionKey::Named(name) => name,
    }
  }
}

impl fmt::Display for CollectionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Collection {
  pub key: CollectionKey,
  pub items: Vec<Product>,
}

impl Collection {
  fn new(key: CollectionKey) -> Self {
    Self {
      key,
      items: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    self.key.name()
  }

  pub fn contains(&self, id: ProductId) -> bool {
    self.items.iter().any(|item| item.id == id)
  }

  fn position(&self, id: ProductId) -> Option<usize> {
    self.items.iter().position(|item| item.id == id)
  }

  fn push_unique(&mut self, product: &Product) -> bool {
    if self.contains(product.id) {
      return false;
    }
    self.items.push(product.clone());
    true
  }

  fn take(&mut self, id: ProductId) -> Option<(usize, Product)> {
    let index = self.position(id)?;
    Some((index, self.items.remove(index)))
  }
}

/// Persisted shape of one collection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CollectionRecord {
  pub name: String,
  pub items: Vec<Product>,
}

impl From<&Collection> for CollectionRecord {
  fn from(collection: &Collection) -> Self {
    Self {
      name: collection.name().to_string(),
      items: collection.items.clone(),
    }
  }
}

/// Everything a single destructive removal changed, enough to put it back.
#[derive(Clone, Debug, PartialEq)]
pub struct Removal {
  pub product: Product,
  /// Each collection the product left, with the index it occupied.
  pub positions: Vec<(CollectionKey, usize)>,
  pub was_favorite: bool,
}

impl Removal {
  pub fn source_collection_names(&self) -> Vec<String> {
    self
      .positions
      .iter()
      .map(|(key, _)| key.name().to_string())
      .collect()
  }

  pub fn touched_all_items(&self) -> bool {
    self
      .positions
      .iter()
      .any(|(key, _)| *key == CollectionKey::AllItems)
  }
}

/// Outcome of pressing the heart on a product card.
#[derive(Clone, Debug, PartialEq)]
pub enum FavoriteToggle {
  /// The product was a favorite and has been removed everywhere.
  Removed(Removal),
  /// The product was not a favorite; the caller picks target collections
  /// from these names and confirms with [`Collections::add_to_collections`].
  ChooseCollections(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collections {
  all_items: Collection,
  named: Vec<Collection>,
  favorites: HashSet<ProductId>,
}

impl Default for Collections {
  fn default() -> Self {
    Self::new()
  }
}

impl Collections {
  pub fn new() -> Self {
    Self {
      all_items: Collection::new(CollectionKey::AllItems),
      named: Vec::new(),
      favorites: HashSet::new(),
    }
  }

  /// Rebuilds the graph from persisted records. Records with blank or
  /// repeated names are dropped, named items missing from "All Items" are
  /// appended to it and favorites are recomputed from "All Items".
  pub fn from_records(records: Vec<CollectionRecord>) -> Self {
    let mut collections = Self::new();

    for record in records {
      let key = CollectionKey::from_name(&record.name);
      let target = match &key {
        CollectionKey::AllItems => &mut collections.all_items,
        CollectionKey::Named(name) => {
          if name.trim().is_empty() || collections.find_named(name).is_some() {
            log::warn!("dropping persisted collection with invalid name {:?}", name);
            continue;
          }
          collections.named.push(Collection::new(key.clone()));
          let last = collections.named.len() - 1;
          &mut collections.named[last]
        }
      };
      for item in &record.items {
        target.push_unique(item);
      }
    }

    let named_items: Vec<Product> = collections
      .named
      .iter()
      .flat_map(|collection| collection.items.iter().cloned())
      .collect();
    for item in &named_items {
      collections.all_items.push_unique(item);
    }
    collections.favorites = collections.all_items.items.iter().map(|item| item.id).collect();
    collections
  }

  pub fn to_records(&self) -> Vec<CollectionRecord> {
    self.iter().map(CollectionRecord::from).collect()
  }

  fn find_named(&self, name: &str) -> Option<usize> {
    self.named.iter().position(|collection| collection.name() == name)
  }

  fn get_mut(&mut self, key: &CollectionKey) -> Option<&mut Collection> {
    match key {
      CollectionKey::AllItems => Some(&mut self.all_items),
      CollectionKey::Named(name) => {
        let index = self.find_named(name)?;
        Some(&mut self.named[index])
      }
    }
  }

  pub fn get(&self, key: &CollectionKey) -> Option<&Collection> {
    match key {
      CollectionKey::AllItems => Some(&self.all_items),
      CollectionKey::Named(name) => self.find_named(name).map(|index| &self.named[index]),
    }
  }

  pub fn get_by_name(&self, name: &str) -> Result<&Collection, CollectionError> {
    self
      .get(&CollectionKey::from_name(name))
      .ok_or_else(|| CollectionError::NotFound {
        name: name.to_string(),
      })
  }

  pub fn all_items(&self) -> &Collection {
    &self.all_items
  }

  /// "All Items" first, then named collections in creation order.
  pub fn iter(&self) -> impl Iterator<Item = &Collection> {
    std::iter::once(&self.all_items).chain(self.named.iter())
  }

  /// Display order: "All Items" first, then named collections by name.
  pub fn sorted(&self) -> Vec<&Collection> {
    let mut named: Vec<&Collection> = self.named.iter().collect();
    named.sort_by(|a, b| a.name().cmp(b.name()));
    std::iter::once(&self.all_items).chain(named).collect()
  }

  /// Names a product can be filed under, in display order.
  pub fn choices(&self) -> Vec<String> {
    self
      .sorted()
      .into_iter()
      .skip(1)
      .map(|collection| collection.name().to_string())
      .collect()
  }

  pub fn is_favorite(&self, id: ProductId) -> bool {
    self.favorites.contains(&id)
  }

  pub fn favorite_ids(&self) -> Vec<ProductId> {
    let mut ids: Vec<ProductId> = self.favorites.iter().copied().collect();
    ids.sort_unstable();
    ids
  }

  pub fn create_collection(&mut self, name: &str) -> Result<CollectionKey, CollectionError> {
    let name = name.trim();
    if name.is_empty() {
      return Err(CollectionError::EmptyName);
    }
    if name == ALL_ITEMS || self.find_named(name).is_some() {
      return Err(CollectionError::DuplicateName {
        name: name.to_string(),
      });
    }

    let key = CollectionKey::Named(name.to_string());
    self.named.push(Collection::new(key.clone()));
    log::debug!("created collection {:?}", name);
    Ok(key)
  }

  /// Files `product` under `key`, mirroring it into "All Items" and marking
  /// it a favorite. Returns whether any collection changed.
  pub fn add_to_collection(&mut self, key: &CollectionKey, product: &Product) -> Result<bool, CollectionError> {
    let collection = self.get_mut(key).ok_or_else(|| CollectionError::NotFound {
      name: key.name().to_string(),
    })?;
    let mut changed = collection.push_unique(product);
    if let CollectionKey::Named(_) = key {
      changed |= self.all_items.push_unique(product);
    }
    self.favorites.insert(product.id);
    Ok(changed)
  }

  /// Files `product` under every key at once. Fails without changes when
  /// any key is unknown.
  pub fn add_to_collections(&mut self, keys: &[CollectionKey], product: &Product) -> Result<(), CollectionError> {
    if let Some(missing) = keys.iter().find(|key| self.get(key).is_none()) {
      return Err(CollectionError::NotFound {
        name: missing.name().to_string(),
      });
    }

    for key in keys {
      self.add_to_collection(key, product)?;
    }
    self.all_items.push_unique(product);
    self.favorites.insert(product.id);
    Ok(())
  }

  /// Takes the product out of `key`. Leaving the last named collection also
  /// drops it from "All Items" and favorites; removing from "All Items"
  /// removes it everywhere. `Ok(None)` means it wasn't there.
  pub fn remove_from_collection(
    &mut self,
    key: &CollectionKey,
    id: ProductId,
  ) -> Result<Option<Removal>, CollectionError> {
    let name = match key {
      CollectionKey::AllItems => return Ok(self.remove_everywhere(id)),
      CollectionKey::Named(name) => name,
    };
    let index = self.find_named(name).ok_or_else(|| CollectionError::NotFound {
      name: name.clone(),
    })?;

    let Some((position, product)) = self.named[index].take(id) else {
      return Ok(None);
    };
    let mut removal = Removal {
      product,
      positions: vec![(key.clone(), position)],
      was_favorite: false,
    };

    let still_filed = self.named.iter().any(|collection| collection.contains(id));
    if !still_filed {
      if let Some((position, _)) = self.all_items.take(id) {
        removal.positions.push((CollectionKey::AllItems, position));
      }
      removal.was_favorite = self.favorites.remove(&id);
    }

    Ok(Some(removal))
  }

  /// Drops the product from every collection and clears its favorite bit.
  pub fn remove_everywhere(&mut self, id: ProductId) -> Option<Removal> {
    let mut positions = Vec::new();
    let mut product = None;

    for collection in std::iter::once(&mut self.all_items).chain(self.named.iter_mut()) {
      if let Some((position, item)) = collection.take(id) {
        positions.push((collection.key.clone(), position));
        product.get_or_insert(item);
      }
    }
    let was_favorite = self.favorites.remove(&id);

    let Some(product) = product else {
      if was_favorite {
        log::debug!("cleared favorite {} that had no collection entries", id);
      }
      return None;
    };

    Some(Removal {
      product,
      positions,
      was_favorite,
    })
  }

  /// Puts a removed product back where it was.
  pub fn restore(&mut self, removal: &Removal) {
    for (key, position) in &removal.positions {
      let Some(collection) = self.get_mut(key) else {
        log::warn!("cannot restore product {} into missing collection {}", removal.product.id, key);
        continue;
      };
      if collection.contains(removal.product.id) {
        continue;
      }
      let index = (*position).min(collection.items.len());
      collection.items.insert(index, removal.product.clone());
    }

    let filed = self.iter().any(|collection| collection.contains(removal.product.id));
    if filed {
      self.all_items.push_unique(&removal.product);
    }
    if removal.was_favorite || filed {
      self.favorites.insert(removal.product.id);
    }
  }

  pub fn toggle_favorite(&mut self, product: &Product) -> FavoriteToggle {
    if self.is_favorite(product.id) {
      if let Some(removal) = self.remove_everywhere(product.id) {
        return FavoriteToggle::Removed(removal);
      }
    }
    FavoriteToggle::ChooseCollections(self.choices())
  }

  /// Whether favorites, "All Items" and named membership agree.
  pub fn is_consistent(&self) -> bool {
    let all_ids: HashSet<ProductId> = self.all_items.items.iter().map(|item| item.id).collect();
    let named_in_all = self
      .named
      .iter()
      .flat_map(|collection| collection.items.iter())
      .all(|item| all_ids.contains(&item.id));
    let no_duplicates = self
      .iter()
      .all(|collection| {
        let unique: HashSet<ProductId> = collection.items.iter().map(|item| item.id).collect();
        unique.len() == collection.items.len()
      });
    all_ids == self.favorites && named_in_all && no_duplicates
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::product;

  fn named(name: &str) -> CollectionKey {
    CollectionKey::Named(name.to_string())
  }

  fn ids(collection: &Collection) -> Vec<ProductId> {
    collection.items.iter().map(|item| item.id).collect()
  }

  #[test]
  fn starts_with_empty_all_items() {
    let collections = Collections::new();
    assert_eq!(collections.iter().count(), 1);
    assert!(collections.all_items().items.is_empty());
    assert!(collections.favorite_ids().is_empty());
  }

  #[test]
  fn create_collection_validates_names() {
    let mut collections = Collections::new();
    assert_eq!(collections.create_collection(""), Err(CollectionError::EmptyName));
    assert_eq!(collections.create_collection("   "), Err(CollectionError::EmptyName));
    assert_eq!(
      collections.create_collection("All Items"),
      Err(CollectionError::DuplicateName {
        name: "All Items".to_string()
      })
    );
    assert_eq!(collections.iter().count(), 1);

    assert_eq!(collections.create_collection("Books"), Ok(named("Books")));
    assert!(matches!(
      collections.create_collection("Books"),
      Err(CollectionError::DuplicateName { .. })
    ));
    assert!(collections.create_collection("books").is_ok());
    assert_eq!(collections.iter().count(), 3);
  }

  #[test]
  fn adding_mirrors_into_all_items_and_favorites() {
    let mut collections = Collections::new();
    collections.create_collection("Gifts").unwrap();
    let p42 = product(42, "Camera", &[300.0]);

    assert!(collections.add_to_collection(&named("Gifts"), &p42).unwrap());
    assert_eq!(ids(collections.all_items()), vec![42]);
    assert_eq!(ids(collections.get(&named("Gifts")).unwrap()), vec![42]);
    assert_eq!(collections.favorite_ids(), vec![42]);
    assert!(collections.is_consistent());
  }

  #[test]
  fn add_is_idempotent() {
    let mut collections = Collections::new();
    collections.create_collection("Gifts").unwrap();
    let item = product(1, "Mug", &[9.0]);

    collections.add_to_collection(&named("Gifts"), &item).unwrap();
    let once = collections.clone();
    assert!(!collections.add_to_collection(&named("Gifts"), &item).unwrap());
    assert_eq!(collections, once);
  }

  #[test]
  fn add_to_unknown_collection_changes_nothing() {
    let mut collections = Collections::new();
    let item = product(1, "Mug", &[9.0]);
    assert_eq!(
      collections.add_to_collection(&named("Nowhere"), &item),
      Err(CollectionError::NotFound {
        name: "Nowhere".to_string()
      })
    );
    assert!(!collections.is_favorite(1));
    assert!(collections.all_items().items.is_empty());
  }

  #[test]
  fn add_to_collections_is_all_or_nothing() {
    let mut collections = Collections::new();
    collections.create_collection("Reading").unwrap();
    collections.create_collection("Wishlist").unwrap();
    let item = product(7, "Lamp", &[40.0]);

    let result = collections.add_to_collections(&[named("Reading"), named("Missing")], &item);
    assert!(result.is_err());
    assert!(collections.get(&named("Reading")).unwrap().items.is_empty());

    collections
      .add_to_collections(&[named("Reading"), named("Wishlist"), CollectionKey::AllItems], &item)
      .unwrap();
    assert_eq!(ids(collections.all_items()), vec![7]);
    assert!(collections.get(&named("Wishlist")).unwrap().contains(7));
    assert!(collections.is_favorite(7));
    assert!(collections.is_consistent());
  }

  #[test]
  fn removal_cascades_only_after_last_named_membership() {
    let mut collections = Collections::new();
    collections.create_collection("Reading").unwrap();
    collections.create_collection("Wishlist").unwrap();
    let p = product(5, "Kindle", &[120.0]);
    collections
      .add_to_collections(&[named("Reading"), named("Wishlist")], &p)
      .unwrap();

    let first = collections.remove_from_collection(&named("Reading"), 5).unwrap().unwrap();
    assert!(!first.touched_all_items());
    assert!(!first.was_favorite);
    assert!(collections.all_items().contains(5));
    assert!(collections.get(&named("Wishlist")).unwrap().contains(5));
    assert!(collections.is_favorite(5));

    let second = collections.remove_from_collection(&named("Wishlist"), 5).unwrap().unwrap();
    assert!(second.touched_all_items());
    assert!(second.was_favorite);
    assert!(!collections.all_items().contains(5));
    assert!(!collections.is_favorite(5));
    assert!(collections.is_consistent());
  }

  #[test]
  fn removing_from_all_items_removes_everywhere() {
    let mut collections = Collections::new();
    collections.create_collection("Reading").unwrap();
    collections.create_collection("Wishlist").unwrap();
    let p = product(5, "Kindle", &[120.0]);
    collections
      .add_to_collections(&[named("Reading"), named("Wishlist")], &p)
      .unwrap();

    let removal = collections
      .remove_from_collection(&CollectionKey::AllItems, 5)
      .unwrap()
      .unwrap();
    assert_eq!(removal.source_collection_names(), vec!["All Items", "Reading", "Wishlist"]);
    assert!(collections.iter().all(|collection| !collection.contains(5)));
    assert!(!collections.is_favorite(5));
  }

  #[test]
  fn removing_absent_product_yields_no_removal() {
    let mut collections = Collections::new();
    collections.create_collection("Reading").unwrap();
    assert_eq!(collections.remove_from_collection(&named("Reading"), 1), Ok(None));
    assert_eq!(collections.remove_from_collection(&CollectionKey::AllItems, 1), Ok(None));
    assert!(collections.remove_from_collection(&named("Nope"), 1).is_err());
  }

  #[test]
  fn direct_all_items_membership_keeps_favorite_in_sync() {
    let mut collections = Collections::new();
    let item = product(3, "Blender", &[60.0]);
    collections.add_to_collection(&CollectionKey::AllItems, &item).unwrap();
    assert!(collections.is_favorite(3));
    assert!(collections.is_consistent());

    collections.remove_from_collection(&CollectionKey::AllItems, 3).unwrap();
    assert!(!collections.is_favorite(3));
    assert!(collections.is_consistent());
  }

  #[test]
  fn restore_puts_items_back_at_their_positions() {
    let mut collections = Collections::new();
    collections.create_collection("Gifts").unwrap();
    for id in 1..=3 {
      collections
        .add_to_collection(&named("Gifts"), &product(id, &format!("Item {}", id), &[10.0]))
        .unwrap();
    }
    let before = collections.clone();

    let removal = collections.remove_from_collection(&named("Gifts"), 2).unwrap().unwrap();
    collections.restore(&removal);
    assert_eq!(collections, before);
    assert_eq!(ids(collections.all_items()), vec![1, 2, 3]);
  }

  #[test]
  fn toggle_favorite_offers_choices_then_removes() {
    let mut collections = Collections::new();
    collections.create_collection("Wishlist").unwrap();
    collections.create_collection("Gifts").unwrap();
    let item = product(8, "Speaker", &[80.0]);

    match collections.toggle_favorite(&item) {
      FavoriteToggle::ChooseCollections(names) => assert_eq!(names, vec!["Gifts", "Wishlist"]),
      other => panic!("expected collection choice, got {:?}", other),
    }

    collections.add_to_collections(&[named("Gifts")], &item).unwrap();
    match collections.toggle_favorite(&item) {
      FavoriteToggle::Removed(removal) => {
        assert!(removal.was_favorite);
        assert_eq!(removal.product.id, 8);
      }
      other => panic!("expected removal, got {:?}", other),
    }
    assert!(!collections.is_favorite(8));
    assert!(collections.is_consistent());
  }

  #[test]
  fn sorted_view_puts_all_items_first() {
    let mut collections = Collections::new();
    for name in ["Wishlist", "Books", "apparel"] {
      collections.create_collection(name).unwrap();
    }
    let names: Vec<&str> = collections.sorted().into_iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["All Items", "Books", "Wishlist", "apparel"]);
  }

  #[test]
  fn records_round_trip_and_repair_invariant() {
    let mut collections = Collections::new();
    collections.create_collection("Gifts").unwrap();
    collections.add_to_collection(&named("Gifts"), &product(1, "Mug", &[9.0])).unwrap();
    assert_eq!(Collections::from_records(collections.to_records()), collections);

    let broken = vec![
      CollectionRecord {
        name: "All Items".to_string(),
        items: vec![],
      },
      CollectionRecord {
        name: "Gifts".to_string(),
        items: vec![product(2, "Pen", &[3.0])],
      },
      CollectionRecord {
        name: "Gifts".to_string(),
        items: vec![product(9, "Ghost", &[1.0])],
      },
    ];
    let repaired = Collections::from_records(broken);
    assert!(repaired.is_consistent());
    assert_eq!(repaired.favorite_ids(), vec![2]);
    assert_eq!(repaired.iter().count(), 2);
  }
}
