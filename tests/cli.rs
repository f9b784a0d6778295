use std::path::Path;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::*;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

macro_rules! visearch {
    ($($args:expr),*) => {{
        let mut cmd = Command::cargo_bin("visearch")?;
        $(cmd.arg($args);)*
        cmd.assert()
    }};
}

/// Create the backend-owned catalog tables the way the shop's own
/// migrations would, so the binary finds them in place.
async fn seed_catalog(db_path: &Path, rows: &[(i64, i64, &str)]) -> Result<()> {
    let options = SqliteConnectOptions::new().filename(db_path).create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    sqlx::query(
        r#"
        CREATE TABLE products (
            product_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            del_flag INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE images (
            image_id INTEGER PRIMARY KEY,
            product_id INTEGER NOT NULL,
            image_url TEXT NOT NULL
        );
        "#,
    )
    .execute(&pool)
    .await?;
    for (image_id, product_id, url) in rows {
        sqlx::query("INSERT OR IGNORE INTO products (product_id, name) VALUES (?, 'fixture')")
            .bind(product_id)
            .execute(&pool)
            .await?;
        sqlx::query("INSERT INTO images (image_id, product_id, image_url) VALUES (?, ?, ?)")
            .bind(image_id)
            .bind(product_id)
            .bind(url)
            .execute(&pool)
            .await?;
    }
    pool.close().await;
    Ok(())
}

#[test]
fn no_subcommand_prints_usage() -> Result<()> {
    let mut cmd = Command::cargo_bin("visearch")?;
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
    Ok(())
}

#[rstest]
#[case::non_integer("abc")]
#[case::float("1.5")]
fn refresh_rejects_non_integer_product_id(#[case] arg: &str) -> Result<()> {
    visearch!("refresh", arg).failure().stdout(predicate::str::is_empty());
    Ok(())
}

#[tokio::test]
async fn refresh_without_images_is_a_soft_success() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;
    let db_path = dir.path().join("fashion.db");
    seed_catalog(&db_path, &[]).await?;

    // No model artifact exists; the image lookup must come first so this
    // still exits 0 with nothing on stdout.
    visearch!("--database", &db_path, "--model", dir.path().join("missing.onnx"), "refresh", "42")
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no images found"));
    Ok(())
}

#[tokio::test]
async fn refresh_with_images_requires_the_model() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;
    let db_path = dir.path().join("fashion.db");
    seed_catalog(&db_path, &[(1, 42, "/public/uploads/shirt.jpg")]).await?;

    visearch!("--database", &db_path, "--model", dir.path().join("missing.onnx"), "refresh", "42")
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("model not found"));
    Ok(())
}

#[test]
fn extract_fails_fast_on_missing_model() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;

    // The database flag points at a file that must never be created: the
    // model check comes before any database work.
    let db_path = dir.path().join("untouched.db");
    visearch!("--database", &db_path, "--model", dir.path().join("missing.onnx"), "extract")
        .failure()
        .stderr(predicate::str::contains("model not found"));
    assert!(!db_path.exists());
    Ok(())
}

#[test]
fn search_fails_on_missing_image() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;

    visearch!(
        "--database",
        dir.path().join("fashion.db"),
        "--model",
        dir.path().join("missing.onnx"),
        "search",
        dir.path().join("no-such-query.jpg")
    )
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("image not found"));
    Ok(())
}

#[test]
fn search_checks_image_before_model() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;
    let query = dir.path().join("query.jpg");
    std::fs::write(&query, b"not a real image")?;

    // The query file exists, so the next check in line is the model.
    visearch!(
        "--database",
        dir.path().join("fashion.db"),
        "--model",
        dir.path().join("missing.onnx"),
        "search",
        &query
    )
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("model not found"));
    Ok(())
}
