use sqlx::{Executor, Result, Sqlite};

use super::{CatalogImageRecord, FeatureRecord, ProductImageRecord};

/// Fetch every image of a non-deleted product, joined with the product name.
pub async fn active_images<'c, E>(executor: E) -> Result<Vec<CatalogImageRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as(
        r#"
        SELECT
            i.image_id,
            i.product_id,
            i.image_url,
            p.name AS product_name
        FROM images i
        JOIN products p ON i.product_id = p.product_id
        WHERE p.del_flag = 0
        ORDER BY i.product_id, i.image_id
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Fetch one product's images, deleted or not.
pub async fn product_images<'c, E>(executor: E, product_id: i64) -> Result<Vec<ProductImageRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as(
        r#"
        SELECT image_id, product_id, image_url
        FROM images
        WHERE product_id = ?
        "#,
    )
    .bind(product_id)
    .fetch_all(executor)
    .await
}

/// Delete every stored feature row.
pub async fn delete_all_features<'c, E>(executor: E) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query("DELETE FROM product_image_features").execute(executor).await?;
    Ok(())
}

/// Delete the stored feature rows of one product.
pub async fn delete_product_features<'c, E>(executor: E, product_id: i64) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query("DELETE FROM product_image_features WHERE product_id = ?")
        .bind(product_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Insert one feature row with a JSON-encoded embedding.
pub async fn insert_feature<'c, E>(
    executor: E,
    image_id: i64,
    product_id: i64,
    features: &str,
) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO product_image_features (image_id, product_id, features)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(image_id)
    .bind(product_id)
    .bind(features)
    .execute(executor)
    .await?;
    Ok(())
}

/// Fetch every stored feature row in insertion order.
pub async fn all_features<'c, E>(executor: E) -> Result<Vec<FeatureRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as(
        r#"
        SELECT image_id, product_id, features
        FROM product_image_features
        ORDER BY id
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn count_features<'c, E>(executor: E) -> Result<u64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_image_features")
        .fetch_one(executor)
        .await?;
    Ok(count as u64)
}
