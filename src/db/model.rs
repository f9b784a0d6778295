use sqlx::FromRow;

/// Active catalog image, joined with the product name for progress output.
///
/// The `images` and `products` tables belong to the shop backend; rows are
/// read-only from this side.
#[derive(Debug, Clone, FromRow)]
pub struct CatalogImageRecord {
    pub image_id: i64,
    pub product_id: i64,
    /// URL as stored by the backend, `/public/uploads/<filename>`.
    pub image_url: String,
    pub product_name: String,
}

/// One product's catalog image, without the product join.
#[derive(Debug, Clone, FromRow)]
pub struct ProductImageRecord {
    pub image_id: i64,
    pub product_id: i64,
    pub image_url: String,
}

/// Stored feature row. `features` holds the embedding as a JSON array.
#[derive(Debug, Clone, FromRow)]
pub struct FeatureRecord {
    pub image_id: i64,
    pub product_id: i64,
    pub features: String,
}
