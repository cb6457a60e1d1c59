//! Product repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use souq_core::{BrandId, CategoryId, CurrencyCode, ProductId, Slug, SubCategoryId};

use super::RepositoryError;
use crate::models::Product;
use crate::pagination::ListParams;

/// Whitelisted sort keys for product listings.
const SORT_COLUMNS: &[(&str, &str)] = &[
    ("title", "title"),
    ("price", "price"),
    ("sold", "sold"),
    ("ratings_average", "ratings_average"),
    ("created_at", "created_at"),
];

/// Catalog filters specific to product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters {
    /// Restrict to a category by slug.
    pub category: Option<String>,
    /// Restrict to a subcategory by slug.
    pub subcategory: Option<String>,
    /// Restrict to a brand by slug.
    pub brand: Option<String>,
    /// Minimum effective price.
    pub min_price: Option<Decimal>,
    /// Maximum effective price.
    pub max_price: Option<Decimal>,
    /// Minimum average rating.
    pub min_rating: Option<Decimal>,
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub title: &'a str,
    pub slug: &'a Slug,
    pub description: &'a str,
    pub quantity: i32,
    pub price: Decimal,
    pub price_after_discount: Option<Decimal>,
    pub colors: &'a [String],
    pub image_cover: Option<&'a str>,
    pub images: &'a [String],
    pub category_id: CategoryId,
    pub brand_id: Option<BrandId>,
    pub subcategory_ids: &'a [SubCategoryId],
}

/// Fields for updating a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate<'a> {
    pub title: Option<&'a str>,
    pub slug: Option<&'a Slug>,
    pub description: Option<&'a str>,
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
    pub price_after_discount: Option<Option<Decimal>>,
    pub colors: Option<&'a [String]>,
    pub image_cover: Option<&'a str>,
    pub images: Option<&'a [String]>,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<Option<BrandId>>,
    pub subcategory_ids: Option<&'a [SubCategoryId]>,
}

/// Database row for a product.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    slug: String,
    description: String,
    quantity: i32,
    sold: i32,
    price: Decimal,
    price_after_discount: Option<Decimal>,
    currency: String,
    colors: Vec<String>,
    image_cover: Option<String>,
    images: Vec<String>,
    category_id: i32,
    brand_id: Option<i32>,
    ratings_average: Option<Decimal>,
    ratings_count: i32,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, subcategory_ids: Vec<SubCategoryId>) -> Result<Product, RepositoryError> {
        let currency = CurrencyCode::from_code(&self.currency).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown currency code: {}", self.currency))
        })?;

        Ok(Product {
            id: ProductId::new(self.id),
            title: self.title,
            slug: Slug::from_raw(self.slug),
            description: self.description,
            quantity: self.quantity,
            sold: self.sold,
            price: self.price,
            price_after_discount: self.price_after_discount,
            currency,
            colors: self.colors,
            image_cover: self.image_cover,
            images: self.images,
            category_id: CategoryId::new(self.category_id),
            brand_id: self.brand_id.map(BrandId::new),
            subcategory_ids,
            ratings_average: self.ratings_average,
            ratings_count: self.ratings_count,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT: &str = "SELECT id, title, slug, description, quantity, sold, price, \
                      price_after_discount, currency, colors, image_cover, images, \
                      category_id, brand_id, ratings_average, ratings_count, \
                      deleted_at, created_at, updated_at FROM products";

const RETURNING: &str = "RETURNING id, title, slug, description, quantity, sold, price, \
                         price_after_discount, currency, colors, image_cover, images, \
                         category_id, brand_id, ratings_average, ratings_count, \
                         deleted_at, created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        params: &ListParams,
        filters: &ProductFilters,
        staff: bool,
    ) {
        qb.push(" WHERE 1=1");
        if !(staff && params.include_deleted()) {
            qb.push(" AND deleted_at IS NULL");
        }
        if let Some(pattern) = params.keyword_pattern() {
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category) = filters.category.as_deref() {
            qb.push(" AND category_id = (SELECT id FROM categories WHERE slug = ")
                .push_bind(category.to_owned())
                .push(")");
        }
        if let Some(subcategory) = filters.subcategory.as_deref() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM product_subcategories ps \
                  JOIN subcategories s ON s.id = ps.subcategory_id \
                  WHERE ps.product_id = products.id AND s.slug = ",
            )
            .push_bind(subcategory.to_owned())
            .push(")");
        }
        if let Some(brand) = filters.brand.as_deref() {
            qb.push(" AND brand_id = (SELECT id FROM brands WHERE slug = ")
                .push_bind(brand.to_owned())
                .push(")");
        }
        if let Some(min_price) = filters.min_price {
            qb.push(" AND COALESCE(price_after_discount, price) >= ")
                .push_bind(min_price);
        }
        if let Some(max_price) = filters.max_price {
            qb.push(" AND COALESCE(price_after_discount, price) <= ")
                .push_bind(max_price);
        }
        if let Some(min_rating) = filters.min_rating {
            qb.push(" AND ratings_average >= ").push_bind(min_rating);
        }
    }

    /// List products with pagination and catalog filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        params: &ListParams,
        filters: &ProductFilters,
        staff: bool,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM products");
        Self::push_filters(&mut count_qb, params, filters, staff);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::new(SELECT);
        Self::push_filters(&mut qb, params, filters, staff);
        qb.push(" ")
            .push(params.order_by(SORT_COLUMNS, "created_at DESC"))
            .push(" LIMIT ")
            .push_bind(params.sql_limit())
            .push(" OFFSET ")
            .push_bind(params.sql_offset());

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(self.pool).await?;
        let ids: Vec<ProductId> = rows.iter().map(|r| ProductId::new(r.id)).collect();
        let mut subcategory_map = self.load_subcategory_ids(&ids).await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let subs = subcategory_map.remove(&row.id).unwrap_or_default();
            products.push(row.into_product(subs)?);
        }
        Ok((products, total))
    }

    /// Get a product by slug. Soft-deleted rows are hidden unless `include_deleted`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(
        &self,
        slug: &str,
        include_deleted: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut qb = QueryBuilder::new(SELECT);
        qb.push(" WHERE slug = ").push_bind(slug);
        if !include_deleted {
            qb.push(" AND deleted_at IS NULL");
        }
        let row: Option<ProductRow> = qb.build_query_as().fetch_optional(self.pool).await?;
        self.attach_subcategories(row).await
    }

    /// Get a product by ID, regardless of deletion state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        self.attach_subcategories(row).await
    }

    async fn attach_subcategories(
        &self,
        row: Option<ProductRow>,
    ) -> Result<Option<Product>, RepositoryError> {
        match row {
            Some(row) => {
                let id = ProductId::new(row.id);
                let mut map = self.load_subcategory_ids(&[id]).await?;
                let subs = map.remove(&row.id).unwrap_or_default();
                Ok(Some(row.into_product(subs)?))
            }
            None => Ok(None),
        }
    }

    /// Load subcategory IDs for a batch of products, keyed by raw product id.
    async fn load_subcategory_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<i32, Vec<SubCategoryId>>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let rows: Vec<(i32, i32)> = sqlx::query_as(
            "SELECT product_id, subcategory_id FROM product_subcategories \
             WHERE product_id = ANY($1) ORDER BY subcategory_id",
        )
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        let mut map: HashMap<i32, Vec<SubCategoryId>> = HashMap::new();
        for (product_id, subcategory_id) in rows {
            map.entry(product_id)
                .or_default()
                .push(SubCategoryId::new(subcategory_id));
        }
        Ok(map)
    }

    /// Create a product with its subcategory links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists and
    /// `RepositoryError::NotFound` if a referenced category/brand/subcategory
    /// doesn't exist.
    pub async fn create(&self, new: &NewProduct<'_>) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (title, slug, description, quantity, price, \
                 price_after_discount, colors, image_cover, images, category_id, brand_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) {RETURNING}"
        ))
        .bind(new.title)
        .bind(new.slug.as_str())
        .bind(new.description)
        .bind(new.quantity)
        .bind(new.price)
        .bind(new.price_after_discount)
        .bind(new.colors)
        .bind(new.image_cover)
        .bind(new.images)
        .bind(new.category_id.as_i32())
        .bind(new.brand_id.map(|b| b.as_i32()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::from_unique(e, "product slug already exists")
        })?;

        let id = ProductId::new(row.id);
        Self::replace_subcategories(&mut tx, id, new.subcategory_ids).await?;
        tx.commit().await?;

        row.into_product(new.subcategory_ids.to_vec())
    }

    /// Update a product. `None` fields are left unchanged; double-`Option`
    /// fields distinguish "leave alone" from "clear".
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist and
    /// `RepositoryError::Conflict` if the new slug collides.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate<'_>,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::new("UPDATE products SET updated_at = NOW()");
        if let Some(title) = update.title {
            qb.push(", title = ").push_bind(title.to_owned());
        }
        if let Some(slug) = update.slug {
            qb.push(", slug = ").push_bind(slug.as_str().to_owned());
        }
        if let Some(description) = update.description {
            qb.push(", description = ").push_bind(description.to_owned());
        }
        if let Some(quantity) = update.quantity {
            qb.push(", quantity = ").push_bind(quantity);
        }
        if let Some(price) = update.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(discount) = update.price_after_discount {
            qb.push(", price_after_discount = ").push_bind(discount);
        }
        if let Some(colors) = update.colors {
            qb.push(", colors = ").push_bind(colors.to_vec());
        }
        if let Some(image_cover) = update.image_cover {
            qb.push(", image_cover = ").push_bind(image_cover.to_owned());
        }
        if let Some(images) = update.images {
            qb.push(", images = ").push_bind(images.to_vec());
        }
        if let Some(category_id) = update.category_id {
            qb.push(", category_id = ").push_bind(category_id.as_i32());
        }
        if let Some(brand_id) = update.brand_id {
            qb.push(", brand_id = ").push_bind(brand_id.map(|b| b.as_i32()));
        }
        qb.push(" WHERE id = ").push_bind(id.as_i32());
        qb.push(" ").push(RETURNING);

        let row: Option<ProductRow> = qb
            .build_query_as()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::NotFound;
                }
                RepositoryError::from_unique(e, "product slug already exists")
            })?;

        let row = row.ok_or(RepositoryError::NotFound)?;

        if let Some(subcategory_ids) = update.subcategory_ids {
            Self::replace_subcategories(&mut tx, id, subcategory_ids).await?;
        }

        // Read links inside the transaction so the response reflects the write.
        let raw: Vec<(i32,)> = sqlx::query_as(
            "SELECT subcategory_id FROM product_subcategories \
             WHERE product_id = $1 ORDER BY subcategory_id",
        )
        .bind(id.as_i32())
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let subs = raw.into_iter().map(|(s,)| SubCategoryId::new(s)).collect();
        row.into_product(subs)
    }

    async fn replace_subcategories(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: ProductId,
        subcategory_ids: &[SubCategoryId],
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM product_subcategories WHERE product_id = $1")
            .bind(id.as_i32())
            .execute(&mut **tx)
            .await?;

        for subcategory_id in subcategory_ids {
            sqlx::query(
                "INSERT INTO product_subcategories (product_id, subcategory_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id.as_i32())
            .bind(subcategory_id.as_i32())
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::NotFound;
                }
                RepositoryError::Database(e)
            })?;
        }
        Ok(())
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no live product matches.
    pub async fn soft_delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Restore a soft-deleted product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no deleted product matches.
    pub async fn restore(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET deleted_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NOT NULL {RETURNING}"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        self.attach_subcategories(row).await?.ok_or(RepositoryError::NotFound)
    }
}
