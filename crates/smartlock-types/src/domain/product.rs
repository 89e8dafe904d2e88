use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::money::{max_unit_price, MAX_STOCK};
use crate::domain::validation::{ValidationErrors, Validator};

pub const DEFAULT_IMAGE: &str = "/images/default-product.jpg";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Fietsslot,
    Kabelslot,
    Hangslot,
    Deurslot,
}

impl ProductCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductCategory::Fietsslot => "fietsslot",
            ProductCategory::Kabelslot => "kabelslot",
            ProductCategory::Hangslot => "hangslot",
            ProductCategory::Deurslot => "deurslot",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown product category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ProductCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fietsslot" => Ok(ProductCategory::Fietsslot),
            "kabelslot" => Ok(ProductCategory::Kabelslot),
            "hangslot" => Ok(ProductCategory::Hangslot),
            "deurslot" => Ok(ProductCategory::Deurslot),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// VAT-inclusive EUR price.
    pub price: Decimal,
    pub image: String,
    pub category: ProductCategory,
    pub stock: u32,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Admin create/update payload. Fields are loose so that a missing or
/// malformed value becomes a field error instead of a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
}

/// A validated product without identity; the catalog assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: ProductCategory,
    pub stock: u32,
    pub features: Vec<String>,
}

impl ProductDraft {
    pub fn validate(self) -> Result<NewProduct, ValidationErrors> {
        let mut v = Validator::new();
        v.require("name", &self.name);
        v.require("description", &self.description);

        let price = match self.price {
            Some(p) if p > max_unit_price() => {
                v.push("price", format!("must not exceed {}", max_unit_price()));
                None
            }
            Some(p) if p > Decimal::ZERO => Some(p),
            Some(_) => {
                v.push("price", "must be greater than zero");
                None
            }
            None => {
                v.push("price", "is required");
                None
            }
        };

        let category = if v.require("category", &self.category) {
            match self.category.parse::<ProductCategory>() {
                Ok(c) => Some(c),
                Err(e) => {
                    v.push("category", e.to_string());
                    None
                }
            }
        } else {
            None
        };

        let stock = match self.stock.map(u32::try_from) {
            Some(Ok(s)) if s > MAX_STOCK => {
                v.push("stock", format!("must not exceed {MAX_STOCK}"));
                None
            }
            Some(Ok(s)) => Some(s),
            Some(Err(_)) => {
                v.push("stock", "must be a non-negative integer");
                None
            }
            None => {
                v.push("stock", "is required");
                None
            }
        };

        v.finish()?;
        match (price, category, stock) {
            (Some(price), Some(category), Some(stock)) => Ok(NewProduct {
                name: self.name.trim().to_string(),
                description: self.description.trim().to_string(),
                price,
                image: self
                    .image
                    .filter(|i| !i.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
                category,
                stock,
                features: self
                    .features
                    .unwrap_or_default()
                    .into_iter()
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect(),
            }),
            _ => Err(ValidationErrors::single("product", "is incomplete")),
        }
    }
}

impl NewProduct {
    pub fn into_product(self, id: i64, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            category: self.category,
            stock: self.stock,
            features: self.features,
            created_at,
        }
    }
}
