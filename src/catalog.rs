//! Catalog Loader: reads the static product list from a file or URL.

use crate::config::CatalogSource;
use crate::error::CatalogError;
use crate::model::Product;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::time::Duration;

const CATALOG_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Anything that can produce the product list once per session.
pub trait CatalogLoader {
  fn load(&self) -> Result<Vec<Product>, CatalogError>;
}

impl CatalogLoader for CatalogSource {
  fn load(&self) -> Result<Vec<Product>, CatalogError> {
    let body = match self {
      CatalogSource::File(path) => fs::read_to_string(path)?,
      CatalogSource::Url(url) => fetch_catalog_body(url)?,
    };
    decode_catalog(&body)
  }
}

impl<F> CatalogLoader for F
where
  F: Fn() -> Result<Vec<Product>, CatalogError>,
{
  fn load(&self) -> Result<Vec<Product>, CatalogError> {
    self()
  }
}

#[derive(Deserialize)]
struct CatalogPayload {
  products: Vec<Product>,
}

fn fetch_catalog_body(url: &str) -> Result<String, CatalogError> {
  let client = Client::builder()
    .timeout(Duration::from_secs(CATALOG_REQUEST_TIMEOUT_SECONDS))
    .build()?;

  let response = client
    .get(url)
    .header(USER_AGENT, concat!("savr/", env!("CARGO_PKG_VERSION")))
    .header(ACCEPT, "application/json")
    .send()?;

  if !response.status().is_success() {
    return Err(CatalogError::Status(response.status()));
  }

  Ok(response.text()?)
}

/// Decodes a bare product array or a `{ "products": [...] }` wrapper.
/// Repeated ids keep their first occurrence.
pub fn decode_catalog(body: &str) -> Result<Vec<Product>, CatalogError> {
  let products = match serde_json::from_str::<Vec<Product>>(body) {
    Ok(products) => products,
    Err(array_error) => match serde_json::from_str::<CatalogPayload>(body) {
      Ok(payload) => payload.products,
      Err(_) => return Err(CatalogError::Decode(array_error)),
    },
  };

  let mut seen = HashSet::new();
  let mut unique = Vec::with_capacity(products.len());
  for product in products {
    if seen.insert(product.id) {
      unique.push(product);
    } else {
      log::warn!("catalog lists product {} more than once, keeping the first entry", product.id);
    }
  }
  Ok(unique)
}

/// Order-independent SHA-256 over the catalog contents.
pub fn catalog_fingerprint(products: &[Product]) -> String {
  let mut sorted: Vec<&Product> = products.iter().collect();
  sorted.sort_by_key(|product| product.id);

  let mut hasher = Sha256::new();
  for product in sorted {
    let sites = product
      .sites
      .iter()
      .map(|site| format!("{}:{:.2}", site.site, site.price))
      .collect::<Vec<_>>()
      .join(",");
    let line = format!(
      "{}|{}|{}|{}|{}\n",
      product.id, product.name, product.image, product.information, sites
    );
    hasher.update(line.as_bytes());
  }

  format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::product;
  use std::io::Write;

  const CATALOG_JSON: &str = r#"[
    { "id": 1, "name": "Laptop", "image": "/laptop.png", "information": "13 inch",
      "sites": [{ "site": "Amazon", "price": 999 }, { "site": "BestBuy", "price": 949.99 }] },
    { "id": 2, "name": "Mouse", "image": "/mouse.png", "information": "Wireless",
      "sites": [{ "site": "Amazon", "price": "25" }] }
  ]"#;

  #[test]
  fn decodes_bare_array() {
    let products = decode_catalog(CATALOG_JSON).unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[1].sites[0].price, 25.0);
  }

  #[test]
  fn decodes_wrapped_payload() {
    let body = format!(r#"{{ "products": {} }}"#, CATALOG_JSON);
    let products = decode_catalog(&body).unwrap();
    assert_eq!(products.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
  }

  #[test]
  fn keeps_first_of_repeated_ids() {
    let body = r#"[{ "id": 4, "name": "First" }, { "id": 4, "name": "Second" }]"#;
    let products = decode_catalog(body).unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "First");
  }

  #[test]
  fn rejects_non_catalog_json() {
    assert!(matches!(
      decode_catalog(r#"{ "items": [] }"#),
      Err(CatalogError::Decode(_))
    ));
  }

  #[test]
  fn fingerprint_ignores_order_but_not_prices() {
    let a = product(1, "Laptop", &[999.0]);
    let b = product(2, "Mouse", &[25.0]);
    let forward = catalog_fingerprint(&[a.clone(), b.clone()]);
    let reversed = catalog_fingerprint(&[b.clone(), a.clone()]);
    assert_eq!(forward, reversed);

    let cheaper = product(2, "Mouse", &[19.0]);
    assert_ne!(forward, catalog_fingerprint(&[a, cheaper]));
  }

  #[test]
  fn file_source_loads_catalog() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CATALOG_JSON.as_bytes()).unwrap();

    let source = CatalogSource::File(file.path().to_path_buf());
    let products = source.load().unwrap();
    assert_eq!(products[0].name, "Laptop");
  }

  #[test]
  fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = CatalogSource::File(dir.path().join("missing.json"));
    assert!(matches!(source.load(), Err(CatalogError::Io(_))));
  }
}
