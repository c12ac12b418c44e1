//! Result shapes returned to search callers.

use bridge_traits::catalog::{Product, ProductId};
use core_sync::content::strip_html;
use serde::{Deserialize, Serialize};

/// Words kept in a result's description
pub const DESCRIPTION_WORDS: usize = 50;

/// Characters of the matching passage kept in `matched_text`
pub const MATCHED_TEXT_CHARS: usize = 200;

/// Product as shown in search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResult {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: String,
    pub regular_price: String,
    pub sale_price: String,
    /// Plain text, cut to [`DESCRIPTION_WORDS`] words
    pub description: String,
    pub short_description: String,
    pub permalink: String,
    /// Empty when the product has no image
    pub image: String,
    pub stock_status: String,
    pub in_stock: bool,
    pub categories: Vec<String>,
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
}

impl ProductResult {
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            price: product.price.clone(),
            regular_price: product.regular_price.clone(),
            sale_price: product.sale_price.clone(),
            description: trim_words(&strip_html(&product.description), DESCRIPTION_WORDS),
            short_description: strip_html(&product.short_description),
            permalink: product.permalink.clone(),
            image: product.image_url.clone().unwrap_or_default(),
            stock_status: product.stock_status.as_str().to_string(),
            in_stock: product.stock_status.is_in_stock(),
            categories: product.categories.clone(),
            tags: product.tags.clone(),
            relevance_score: None,
            matched_text: None,
        }
    }

    /// Attach the passage that matched
    pub fn with_match(mut self, passage: &str) -> Self {
        // The service exposes no score; every hit ranks the same
        self.relevance_score = Some(1.0);
        self.matched_text = Some(passage.chars().take(MATCHED_TEXT_CHARS).collect());
        self
    }
}

/// Response of a semantic search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub products: Vec<ProductResult>,
}

/// Response of an AI search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSearchResponse {
    pub query: String,
    pub ai_text: String,
    pub products: Vec<ProductResult>,
    pub grounding_metadata: Option<serde_json::Value>,
}

/// Keep the first `max_words` words, ending with `…` when text was dropped
pub fn trim_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}…", words[..max_words].join(" "))
    } else {
        words.join(" ")
    }
}
