//! Product domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use souq_core::{BrandId, CategoryId, CurrencyCode, ProductId, Slug, SubCategoryId};

/// A sellable product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display title (Arabic or Latin).
    pub title: String,
    /// URL slug derived from the title, unique across products.
    pub slug: Slug,
    /// Long description.
    pub description: String,
    /// Units in stock. Never negative.
    pub quantity: i32,
    /// Units sold to date.
    pub sold: i32,
    /// List price.
    pub price: Decimal,
    /// Discounted price, strictly below `price` when present.
    pub price_after_discount: Option<Decimal>,
    /// Currency for both prices.
    pub currency: CurrencyCode,
    /// Available colors.
    pub colors: Vec<String>,
    /// Cover image URL (media-storage asset).
    pub image_cover: Option<String>,
    /// Gallery image URLs.
    pub images: Vec<String>,
    /// Parent category.
    pub category_id: CategoryId,
    /// Optional brand.
    pub brand_id: Option<BrandId>,
    /// Subcategories this product is listed under.
    pub subcategory_ids: Vec<SubCategoryId>,
    /// Average rating, 1.0-5.0 when present.
    pub ratings_average: Option<Decimal>,
    /// Number of ratings contributing to the average.
    pub ratings_count: i32,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a shopper actually pays: the discounted price when set.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.price_after_discount.unwrap_or(self.price)
    }

    /// Whether the product is soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether at least `quantity` units are in stock.
    #[must_use]
    pub const fn has_stock(&self, quantity: i32) -> bool {
        self.quantity >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn product(price: Decimal, discounted: Option<Decimal>) -> Product {
        Product {
            id: ProductId::new(1),
            title: "Test".to_owned(),
            slug: Slug::new("test").expect("valid"),
            description: String::new(),
            quantity: 5,
            sold: 0,
            price,
            price_after_discount: discounted,
            currency: CurrencyCode::EGP,
            colors: vec![],
            image_cover: None,
            images: vec![],
            category_id: CategoryId::new(1),
            brand_id: None,
            subcategory_ids: vec![],
            ratings_average: None,
            ratings_count: 0,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_discount() {
        let p = product(dec!(100), Some(dec!(75)));
        assert_eq!(p.effective_price(), dec!(75));
    }

    #[test]
    fn test_effective_price_without_discount() {
        let p = product(dec!(100), None);
        assert_eq!(p.effective_price(), dec!(100));
    }

    #[test]
    fn test_has_stock() {
        let p = product(dec!(10), None);
        assert!(p.has_stock(5));
        assert!(!p.has_stock(6));
    }
}
