//! Seed the database with demo catalog data.
//!
//! # Usage
//!
//! ```bash
//! souq-cli seed
//! ```
//!
//! Inserts a small bilingual catalog (categories, subcategories, brands,
//! products) for local development and demos. Seeding is idempotent: rows
//! are keyed by slug and re-runs skip what already exists.

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use souq_core::Slug;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// No database URL in the environment.
    #[error(transparent)]
    MissingEnvVar(#[from] super::MissingDatabaseUrl),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A seed name produced an empty slug.
    #[error("slug error: {0}")]
    Slug(#[from] souq_core::SlugError),
}

/// A category with its subcategories.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("إلكترونيات", &["هواتف", "سماعات"]),
    ("ملابس", &["رجالي", "نسائي"]),
    ("كتب", &[]),
];

/// Brand names.
const BRANDS: &[&str] = &["النور", "Horizon"];

/// Demo products: (title, description, category, brand, quantity, price).
const PRODUCTS: &[(&str, &str, &str, Option<&str>, i32, &str)] = &[
    (
        "سماعات لاسلكية",
        "سماعات بلوتوث لاسلكية مع عزل للضوضاء وبطارية تدوم طوال اليوم.",
        "إلكترونيات",
        Some("Horizon"),
        40,
        "1499.00",
    ),
    (
        "هاتف ذكي Horizon X2",
        "شاشة 6.5 بوصة وكاميرا مزدوجة وذاكرة 128 جيجابايت.",
        "إلكترونيات",
        Some("Horizon"),
        25,
        "10999.00",
    ),
    (
        "قميص قطني",
        "قميص رجالي قطن مصري بأكمام طويلة، متوفر بعدة ألوان.",
        "ملابس",
        Some("النور"),
        120,
        "450.00",
    ),
    (
        "رواية الليالي البيضاء",
        "طبعة عربية مترجمة بغلاف ورقي.",
        "كتب",
        None,
        60,
        "120.00",
    ),
];

/// Seed the catalog.
///
/// # Errors
///
/// Returns `SeedError` if the database is unreachable or an insert fails.
pub async fn catalog() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    for (name, subcategories) in CATEGORIES {
        let slug = Slug::new(name)?;
        let category_id: i32 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) \
             ON CONFLICT (slug) DO UPDATE SET updated_at = NOW() \
             RETURNING id",
        )
        .bind(name)
        .bind(slug.as_str())
        .fetch_one(&pool)
        .await?;

        for subcategory in *subcategories {
            let sub_slug = Slug::new(subcategory)?;
            sqlx::query(
                "INSERT INTO subcategories (category_id, name, slug) VALUES ($1, $2, $3) \
                 ON CONFLICT (category_id, slug) DO NOTHING",
            )
            .bind(category_id)
            .bind(subcategory)
            .bind(sub_slug.as_str())
            .execute(&pool)
            .await?;
        }
        tracing::info!(category = %name, "Seeded category");
    }

    for name in BRANDS {
        let slug = Slug::new(name)?;
        sqlx::query(
            "INSERT INTO brands (name, slug) VALUES ($1, $2) \
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(name)
        .bind(slug.as_str())
        .execute(&pool)
        .await?;
        tracing::info!(brand = %name, "Seeded brand");
    }

    for (title, description, category, brand, quantity, price) in PRODUCTS {
        let slug = Slug::new(title)?;
        let price: Decimal = price.parse().expect("seed price is a valid decimal");

        sqlx::query(
            "INSERT INTO products \
                 (title, slug, description, quantity, price, category_id, brand_id) \
             SELECT $1, $2, $3, $4, $5, c.id, b.id \
             FROM categories c \
             LEFT JOIN brands b ON b.slug = $7 \
             WHERE c.slug = $6 \
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(title)
        .bind(slug.as_str())
        .bind(description)
        .bind(quantity)
        .bind(price)
        .bind(Slug::new(category)?.as_str())
        .bind(brand.map(Slug::new).transpose()?.as_ref().map(Slug::as_str))
        .execute(&pool)
        .await?;
        tracing::info!(product = %title, "Seeded product");
    }

    tracing::info!("Seeding complete!");
    Ok(())
}
