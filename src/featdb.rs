use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::db::{self, CatalogImageRecord, Database, ProductImageRecord};

/// An embedding bound to the catalog image it was extracted from.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFeature {
    pub image_id: i64,
    pub product_id: i64,
    pub embedding: Vec<f32>,
}

/// Facade over the feature store.
///
/// The CLI layer only sees `Vec<f32>` embeddings; the JSON column encoding
/// and the transactional replace semantics live here. One instance per
/// invocation, dropped at exit.
pub struct FeatureDb {
    pool: Database,
}

impl FeatureDb {
    /// Open (and create if missing) the database, applying migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::init_db(path)
            .await
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Ok(Self { pool })
    }

    /// All images of non-deleted products, in `(product_id, image_id)` order.
    pub async fn active_images(&self) -> Result<Vec<CatalogImageRecord>> {
        Ok(db::crud::active_images(&self.pool).await?)
    }

    /// One product's images, without the active-product filter.
    pub async fn product_images(&self, product_id: i64) -> Result<Vec<ProductImageRecord>> {
        Ok(db::crud::product_images(&self.pool, product_id).await?)
    }

    /// Replace the entire feature table with `features`, atomically.
    pub async fn replace_all(&self, features: &[ImageFeature]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        db::crud::delete_all_features(&mut *tx).await?;
        for feature in features {
            let json = encode_embedding(&feature.embedding)?;
            db::crud::insert_feature(&mut *tx, feature.image_id, feature.product_id, &json)
                .await?;
        }
        tx.commit().await?;
        info!("saved {} feature rows", features.len());
        Ok(())
    }

    /// Replace one product's rows with `features`, atomically. Rows of other
    /// products are untouched.
    pub async fn replace_product(&self, product_id: i64, features: &[ImageFeature]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        db::crud::delete_product_features(&mut *tx, product_id).await?;
        for feature in features {
            let json = encode_embedding(&feature.embedding)?;
            db::crud::insert_feature(&mut *tx, feature.image_id, feature.product_id, &json)
                .await?;
        }
        tx.commit().await?;
        info!("saved {} feature rows for product {}", features.len(), product_id);
        Ok(())
    }

    /// Load every stored feature in insertion order, decoding the JSON
    /// vectors. A row that fails to decode means the store is corrupt and is
    /// a hard error, not a skip.
    pub async fn load_features(&self) -> Result<Vec<ImageFeature>> {
        let rows = db::crud::all_features(&self.pool).await?;
        let mut features = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding: Vec<f32> = serde_json::from_str(&row.features).with_context(|| {
                format!("corrupt feature row for image {}: invalid JSON vector", row.image_id)
            })?;
            features.push(ImageFeature {
                image_id: row.image_id,
                product_id: row.product_id,
                embedding,
            });
        }
        Ok(features)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(db::crud::count_features(&self.pool).await?)
    }
}

fn encode_embedding(embedding: &[f32]) -> Result<String> {
    serde_json::to_string(embedding).context("failed to encode embedding")
}
