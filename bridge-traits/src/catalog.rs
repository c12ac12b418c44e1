//! Product Catalog Abstraction
//!
//! Read-only access to the host's product catalog. The core never mutates
//! products; sync metadata is kept in its own tables.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Identifier of a product in the host catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Stock availability of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "instock",
            Self::OutOfStock => "outofstock",
            Self::OnBackorder => "onbackorder",
        }
    }

    pub fn is_in_stock(&self) -> bool {
        matches!(self, Self::InStock)
    }
}

/// Publication state of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Trash,
}

/// Simple products carry fixed attributes; variable products expose the
/// attribute values their variations can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Simple,
    Variable,
}

/// Named attribute with its list of values (e.g. `Color: Red, Blue`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    /// Display label of the attribute
    pub name: String,
    /// Values, in catalog order
    pub options: Vec<String>,
}

impl ProductAttribute {
    pub fn new(name: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// Product as exposed by the host catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    /// Active price as formatted by the catalog (no currency)
    pub price: String,
    pub regular_price: String,
    pub sale_price: String,
    /// Store currency code (e.g. `EUR`)
    pub currency: String,
    /// Long description, may contain HTML
    pub description: String,
    /// Short description, may contain HTML
    pub short_description: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub stock_status: StockStatus,
    pub kind: ProductKind,
    pub attributes: Vec<ProductAttribute>,
    pub permalink: String,
    pub status: PublishStatus,
    pub image_url: Option<String>,
}

impl Product {
    /// Published, in-stock simple product with empty optional fields
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sku: String::new(),
            price: String::new(),
            regular_price: String::new(),
            sale_price: String::new(),
            currency: String::new(),
            description: String::new(),
            short_description: String::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            stock_status: StockStatus::InStock,
            kind: ProductKind::Simple,
            attributes: Vec::new(),
            permalink: String::new(),
            status: PublishStatus::Publish,
            image_url: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PublishStatus::Publish
    }

    pub fn is_variable(&self) -> bool {
        self.kind == ProductKind::Variable
    }
}

/// Product catalog trait
///
/// Implemented by the host (e.g. a CMS adapter) to let the core read products.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::catalog::{ProductCatalog, ProductId};
///
/// async fn product_name(catalog: &dyn ProductCatalog, id: ProductId) -> Result<Option<String>> {
///     Ok(catalog.get_product(id).await?.map(|p| p.name))
/// }
/// ```
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a product by ID, `None` if it does not exist
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// IDs of every published product, in catalog order
    async fn list_published_ids(&self) -> Result<Vec<ProductId>>;
}
