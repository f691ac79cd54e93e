use serde::{Deserialize, Deserializer, Serialize};

/// Catalog-assigned product identity.
pub type ProductId = i64;

/// One vendor's offer for a product.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Site {
  pub site: String,
  #[serde(deserialize_with = "deserialize_price")]
  pub price: f64,
}

/// A catalog product. Immutable once loaded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  #[serde(default)]
  pub image: String,
  #[serde(default, alias = "description")]
  pub information: String,
  #[serde(default)]
  pub sites: Vec<Site>,
}

impl Product {
  /// Price of the first listed vendor, the one shown on product cards.
  pub fn display_price(&self) -> Option<f64> {
    self.sites.first().map(|site| site.price)
  }

  pub fn site(&self, vendor: &str) -> Option<&Site> {
    self.sites.iter().find(|site| site.site == vendor)
  }

  pub fn matches_query(&self, query: &str) -> bool {
    let needle = query.to_lowercase();
    needle.is_empty() || self.name.to_lowercase().contains(&needle)
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
  Number(f64),
  Text(String),
}

fn parse_price_text(value: &str) -> Option<f64> {
  value.trim().trim_start_matches('$').trim().parse::<f64>().ok()
}

// Catalog prices show up both as numbers and as "$12.99" style strings.
fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  let price = match RawPrice::deserialize(deserializer)? {
    RawPrice::Number(value) => value,
    RawPrice::Text(text) => parse_price_text(&text)
      .ok_or_else(|| serde::de::Error::custom(format!("invalid price '{}'", text)))?,
  };
  if !price.is_finite() {
    return Err(serde::de::Error::custom("price must be finite"));
  }
  Ok(price)
}

#[cfg(test)]
pub(crate) fn product(id: ProductId, name: &str, prices: &[f64]) -> Product {
  Product {
    id,
    name: name.to_string(),
    image: format!("/images/{}.png", id),
    information: String::new(),
    sites: prices
      .iter()
      .enumerate()
      .map(|(index, price)| Site {
        site: format!("Vendor{}", index + 1),
        price: *price,
      })
      .collect(),
  }
}
