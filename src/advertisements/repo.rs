use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;

use super::search::{Page, SearchFilters};

#[derive(Debug, Clone, FromRow)]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub user_id: i64,
}

/// Column changes for one advertisement; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct AdvertisementChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

const ADV_COLUMNS: &str = "id, title, description, price, created_at, updated_at, user_id";

impl Advertisement {
    pub async fn create(
        db: &PgPool,
        owner_id: i64,
        title: &str,
        description: &str,
        price: Decimal,
    ) -> sqlx::Result<Advertisement> {
        sqlx::query_as::<_, Advertisement>(&format!(
            r#"
            INSERT INTO advertisements (title, description, price, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {ADV_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(owner_id)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<Advertisement>> {
        sqlx::query_as::<_, Advertisement>(&format!(
            "SELECT {ADV_COLUMNS} FROM advertisements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn lock_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> sqlx::Result<Option<Advertisement>> {
        sqlx::query_as::<_, Advertisement>(&format!(
            "SELECT {ADV_COLUMNS} FROM advertisements WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn apply(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        changes: AdvertisementChanges,
    ) -> sqlx::Result<Advertisement> {
        sqlx::query_as::<_, Advertisement>(&format!(
            r#"
            UPDATE advertisements
               SET title       = COALESCE($2, title),
                   description = COALESCE($3, description),
                   price       = COALESCE($4, price),
                   updated_at  = now()
             WHERE id = $1
            RETURNING {ADV_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.price)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: i64) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM advertisements WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// One page of matches, newest first, plus the total ignoring the page.
    pub async fn search(
        db: &PgPool,
        filters: &SearchFilters,
        page: Page,
    ) -> sqlx::Result<(Vec<Advertisement>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM advertisements");
        filters.push_where(&mut count);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {ADV_COLUMNS} FROM advertisements"));
        filters.push_where(&mut select);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        let rows = select
            .build_query_as::<Advertisement>()
            .fetch_all(db)
            .await?;

        Ok((rows, total))
    }
}
