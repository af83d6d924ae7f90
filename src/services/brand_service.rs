/// Brand management service
use anyhow::Result;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::now_epoch;
use crate::models::brand::Brand;

#[derive(Debug, Clone, Deserialize)]
pub struct BrandReq {
    pub name: String,
    pub domain: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i64>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub from_email: Option<String>,
    pub email_delay_ms: Option<i64>,
    pub is_default: Option<bool>,
}

pub async fn create_brand(pool: &SqlitePool, user_id: i64, req: &BrandReq) -> Result<Brand> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_epoch();
    let password_enc = req
        .smtp_password
        .as_deref()
        .map(Brand::encode_password)
        .unwrap_or_default();

    sqlx::query(
        r#"INSERT INTO brands
           (id, user_id, name, domain, smtp_host, smtp_port, smtp_user, smtp_password_enc,
            from_email, email_delay_ms, is_default, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&req.name)
    .bind(req.domain.as_deref().unwrap_or(""))
    .bind(req.smtp_host.as_deref().unwrap_or(""))
    .bind(req.smtp_port.unwrap_or(587))
    .bind(req.smtp_user.as_deref().unwrap_or(""))
    .bind(&password_enc)
    .bind(req.from_email.as_deref().unwrap_or(""))
    .bind(req.email_delay_ms.unwrap_or(1000))
    .bind(req.is_default.unwrap_or(false))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if req.is_default.unwrap_or(false) {
        set_default(pool, user_id, &id).await?;
    }

    get_brand(pool, &id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("brand {} vanished after insert", id))
}

pub async fn list_brands(pool: &SqlitePool, user_id: i64) -> Result<Vec<Brand>> {
    let brands =
        sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE user_id = ? ORDER BY created_at")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
    Ok(brands)
}

pub async fn get_brand(pool: &SqlitePool, brand_id: &str) -> Result<Option<Brand>> {
    let brand = sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE id = ?")
        .bind(brand_id)
        .fetch_optional(pool)
        .await?;
    Ok(brand)
}

pub async fn update_brand(pool: &SqlitePool, brand_id: &str, req: &BrandReq) -> Result<Option<Brand>> {
    let Some(existing) = get_brand(pool, brand_id).await? else {
        return Ok(None);
    };
    let now = now_epoch();
    let password_enc = match req.smtp_password.as_deref() {
        Some(p) if !p.is_empty() => Brand::encode_password(p),
        _ => existing.smtp_password_enc.clone(),
    };

    sqlx::query(
        r#"UPDATE brands
           SET name = ?, domain = ?, smtp_host = ?, smtp_port = ?, smtp_user = ?,
               smtp_password_enc = ?, from_email = ?, email_delay_ms = ?, updated_at = ?
           WHERE id = ?"#,
    )
    .bind(&req.name)
    .bind(req.domain.as_deref().unwrap_or(&existing.domain))
    .bind(req.smtp_host.as_deref().unwrap_or(&existing.smtp_host))
    .bind(req.smtp_port.unwrap_or(existing.smtp_port))
    .bind(req.smtp_user.as_deref().unwrap_or(&existing.smtp_user))
    .bind(&password_enc)
    .bind(req.from_email.as_deref().unwrap_or(&existing.from_email))
    .bind(req.email_delay_ms.unwrap_or(existing.email_delay_ms))
    .bind(now)
    .bind(brand_id)
    .execute(pool)
    .await?;

    if req.is_default == Some(true) {
        set_default(pool, existing.user_id, brand_id).await?;
    }

    get_brand(pool, brand_id).await
}

/// Make one brand the user's default, clearing the flag on the others.
pub async fn set_default(pool: &SqlitePool, user_id: i64, brand_id: &str) -> Result<()> {
    let now = now_epoch();
    sqlx::query("UPDATE brands SET is_default = (id = ?), updated_at = ? WHERE user_id = ?")
        .bind(brand_id)
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_brand(pool: &SqlitePool, brand_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM brands WHERE id = ?")
        .bind(brand_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
