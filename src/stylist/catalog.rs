//! Product catalog shared by the stylist features.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Garment size, either a label ("M") or a number (28).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Size {
    Number(u32),
    Label(String),
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Number(n) => write!(f, "{}", n),
            Size::Label(label) => write!(f, "{}", label),
        }
    }
}

/// A product in a closet, wishlist or store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        brand: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: brand.into(),
            price,
            image_url: String::new(),
            color: None,
            size: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }
}

/// Merge product lists, keeping one entry per id.
///
/// The first occurrence fixes the position; a later duplicate replaces its data.
pub fn dedupe_by_id(products: impl IntoIterator<Item = Product>) -> Vec<Product> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Product> = Vec::new();

    for product in products {
        match index.get(&product.id) {
            Some(&pos) => unique[pos] = product,
            None => {
                index.insert(product.id.clone(), unique.len());
                unique.push(product);
            }
        }
    }
    unique
}

/// Resolve ids against `products` in the given order, dropping unknown and repeated ids.
pub fn resolve_ids(ids: &[String], products: &[Product]) -> Vec<Product> {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut seen: Vec<&str> = Vec::new();
    let mut resolved = Vec::new();

    for id in ids {
        let id = id.trim();
        if seen.contains(&id) {
            continue;
        }
        match by_id.get(id) {
            Some(product) => {
                seen.push(id);
                resolved.push((*product).clone());
            }
            None => tracing::debug!("Dropping unknown product id {}", id),
        }
    }
    resolved
}

/// Sample catalog for the command-line demo.
pub fn demo_catalog() -> Vec<Product> {
    const IMG: &str = "https://images.pexels.com/photos";
    vec![
        Product::new("prod-001", "Oversized Linen Shirt", "Urban Threads", 68.0)
            .with_image_url(format!("{IMG}/4066290/pexels-photo-4066290.jpeg"))
            .with_color("White")
            .with_size(Size::Label("M".to_string())),
        Product::new("prod-002", "Classic Denim Jacket", "Levi's", 120.0)
            .with_image_url(format!("{IMG}/1043474/pexels-photo-1043474.jpeg"))
            .with_color("Vintage Blue")
            .with_size(Size::Label("L".to_string())),
        Product::new("prod-003", "High-Waisted Trousers", "Zara", 79.9)
            .with_image_url(format!("{IMG}/5439433/pexels-photo-5439433.jpeg"))
            .with_color("Beige")
            .with_size(Size::Number(28)),
        Product::new("prod-004", "Leather Crossbody Bag", "Coach", 250.0)
            .with_image_url(format!("{IMG}/1152077/pexels-photo-1152077.jpeg"))
            .with_color("Black"),
        Product::new("prod-005", "Minimalist Gold Hoops", "Mejuri", 85.0)
            .with_image_url(format!("{IMG}/2735970/pexels-photo-2735970.jpeg")),
        Product::new("prod-006", "Chunky Knit Sweater", "Aritzia", 150.0)
            .with_image_url(format!("{IMG}/7187893/pexels-photo-7187893.jpeg"))
            .with_color("Heather Grey")
            .with_size(Size::Label("S".to_string())),
        Product::new("prod-007", "Suede Ankle Boots", "Steve Madden", 130.0)
            .with_image_url(format!("{IMG}/267320/pexels-photo-267320.jpeg"))
            .with_color("Tan")
            .with_size(Size::Number(8)),
        Product::new("prod-008", "Silk Slip Dress", "Reformation", 278.0)
            .with_image_url(format!("{IMG}/1755428/pexels-photo-1755428.jpeg"))
            .with_color("Champagne")
            .with_size(Size::Label("M".to_string())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_product_json_shape() {
        let json = r#"{"id":"prod-003","name":"High-Waisted Trousers","brand":"Zara","price":79.9,"imageUrl":"x","size":28}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.size, Some(Size::Number(28)));
        assert_eq!(product.image_url, "x");

        let json = r#"{"id":"a","name":"n","brand":"b","price":1,"size":"M"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.size, Some(Size::Label("M".to_string())));
        assert!(product.color.is_none());
    }

    #[test]
    fn test_dedupe_keeps_first_position_last_value() {
        let closet = vec![
            Product::new("a", "Shirt", "X", 10.0),
            Product::new("b", "Jacket", "Y", 20.0),
        ];
        let wishlist = vec![
            Product::new("c", "Boots", "Z", 30.0),
            Product::new("a", "Shirt", "X", 12.0),
        ];

        let merged = dedupe_by_id(closet.into_iter().chain(wishlist));
        assert_eq!(ids(&merged), vec!["a", "b", "c"]);
        assert_eq!(merged[0].price, 12.0);
    }

    #[test]
    fn test_resolve_ids_drops_unknown_and_repeats() {
        let catalog = demo_catalog();
        let wanted = vec![
            "prod-004".to_string(),
            "prod-999".to_string(),
            " prod-001 ".to_string(),
            "prod-004".to_string(),
        ];
        assert_eq!(ids(&resolve_ids(&wanted, &catalog)), vec!["prod-004", "prod-001"]);
    }

    #[test]
    fn test_demo_catalog_ids_are_unique() {
        let catalog = demo_catalog();
        assert_eq!(dedupe_by_id(catalog.clone()).len(), catalog.len());
    }
}
