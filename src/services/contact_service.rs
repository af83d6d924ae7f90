/// Contact management service
use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::now_epoch;
use crate::models::contact::{Contact, ContactReq, ContactStatus};

pub async fn add_contact(pool: &SqlitePool, brand_id: &str, req: &ContactReq) -> Result<Contact> {
    let id = uuid::Uuid::new_v4().to_string();
    let token = uuid::Uuid::new_v4().to_string();
    let now = now_epoch();

    sqlx::query(
        r#"INSERT INTO contacts (id, brand_id, email, name, status, unsubscribe_token, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(brand_id)
    .bind(&req.email)
    .bind(&req.name)
    .bind(ContactStatus::Subscribed.as_str())
    .bind(&token)
    .bind(now)
    .execute(pool)
    .await?;

    let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(contact)
}

/// Bulk import of already-parsed rows. Duplicate (brand, email) pairs are
/// skipped, not errors. Returns the number of rows actually inserted.
pub async fn import_contacts(
    pool: &SqlitePool,
    brand_id: &str,
    rows: &[ContactReq],
) -> Result<usize> {
    let now = now_epoch();
    let mut imported = 0usize;
    for row in rows {
        let id = uuid::Uuid::new_v4().to_string();
        let token = uuid::Uuid::new_v4().to_string();
        let res = sqlx::query(
            r#"INSERT OR IGNORE INTO contacts
               (id, brand_id, email, name, status, unsubscribe_token, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(brand_id)
        .bind(&row.email)
        .bind(&row.name)
        .bind(ContactStatus::Subscribed.as_str())
        .bind(&token)
        .bind(now)
        .execute(pool)
        .await?;
        imported += res.rows_affected() as usize;
    }
    Ok(imported)
}

pub async fn list_contacts(pool: &SqlitePool, brand_id: &str) -> Result<Vec<Contact>> {
    let contacts =
        sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE brand_id = ? ORDER BY rowid")
            .bind(brand_id)
            .fetch_all(pool)
            .await?;
    Ok(contacts)
}

/// The fixed snapshot a send run iterates: all currently subscribed
/// contacts of the brand, in insertion order.
pub async fn list_subscribed(pool: &SqlitePool, brand_id: &str) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(
        "SELECT * FROM contacts WHERE brand_id = ? AND status = ? ORDER BY rowid",
    )
    .bind(brand_id)
    .bind(ContactStatus::Subscribed.as_str())
    .fetch_all(pool)
    .await?;
    Ok(contacts)
}

/// Flip a contact to unsubscribed by its token. Returns the contact when
/// the token matched.
pub async fn unsubscribe_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Contact>> {
    let contact =
        sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE unsubscribe_token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;
    let Some(contact) = contact else {
        return Ok(None);
    };

    sqlx::query("UPDATE contacts SET status = ? WHERE id = ?")
        .bind(ContactStatus::Unsubscribed.as_str())
        .bind(&contact.id)
        .execute(pool)
        .await?;

    Ok(Some(contact))
}

pub async fn delete_contact(pool: &SqlitePool, contact_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
        .bind(contact_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
