use tracing::info;

use super::{
    dto::{
        AdvertisementView, CreateAdvertisementRequest, PaginationInfo, SearchParams,
        SearchResponse, UpdateAdvertisementRequest,
    },
    repo::{Advertisement, AdvertisementChanges},
};
use crate::{
    auth::guard::{self, Identity},
    error::{ApiError, ApiResult},
    state::AppState,
};

fn not_found() -> ApiError {
    ApiError::not_found("Advertisement not found")
}

pub async fn create(
    state: &AppState,
    owner: &Identity,
    req: CreateAdvertisementRequest,
) -> ApiResult<Advertisement> {
    req.validate()?;
    let adv =
        Advertisement::create(&state.db, owner.id, &req.title, &req.description, req.price).await?;
    info!(adv_id = adv.id, owner_id = owner.id, "advertisement created");
    Ok(adv)
}

pub async fn get(state: &AppState, id: i64) -> ApiResult<Advertisement> {
    Advertisement::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)
}

pub async fn update(
    state: &AppState,
    actor: &Identity,
    id: i64,
    req: UpdateAdvertisementRequest,
) -> ApiResult<Advertisement> {
    req.validate()?;

    let mut tx = state.db.begin().await?;
    let current = Advertisement::lock_for_update(&mut tx, id)
        .await?
        .ok_or_else(not_found)?;

    guard::ensure(
        guard::can_modify_advertisement(actor, current.user_id),
        "You can change only your own advertisements",
    )?;

    if req.is_empty() {
        return Ok(current);
    }

    let changes = AdvertisementChanges {
        title: req.title,
        description: req.description,
        price: req.price,
    };
    let adv = Advertisement::apply(&mut tx, id, changes).await?;
    tx.commit().await?;

    info!(adv_id = id, actor_id = actor.id, "advertisement updated");
    Ok(adv)
}

pub async fn delete(state: &AppState, actor: &Identity, id: i64) -> ApiResult<()> {
    let mut tx = state.db.begin().await?;
    let current = Advertisement::lock_for_update(&mut tx, id)
        .await?
        .ok_or_else(not_found)?;

    guard::ensure(
        guard::can_delete_advertisement(actor, current.user_id),
        "You can only delete your own advertisements",
    )?;

    Advertisement::delete(&mut tx, id).await?;
    tx.commit().await?;

    info!(adv_id = id, actor_id = actor.id, "advertisement deleted");
    Ok(())
}

pub async fn search(state: &AppState, params: SearchParams) -> ApiResult<SearchResponse> {
    let (filters, page) = params.into_query()?;
    let (rows, total) = Advertisement::search(&state.db, &filters, page).await?;

    let has_more = page.has_more(rows.len(), total);
    Ok(SearchResponse {
        results: rows.into_iter().map(AdvertisementView::from).collect(),
        pagination: PaginationInfo {
            total,
            limit: page.limit,
            offset: page.offset,
            has_more,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::guard::Role;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn member(db: &PgPool, email: &str, role: Role) -> Identity {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, email, role, password_hash)
             VALUES ('Test', 'User', $1, $2, 'x') RETURNING id",
        )
        .bind(email)
        .bind(role)
        .fetch_one(db)
        .await
        .unwrap();
        Identity {
            id,
            email: email.into(),
            role,
        }
    }

    fn listing(title: &str, description: &str, price: i64) -> CreateAdvertisementRequest {
        CreateAdvertisementRequest {
            title: title.into(),
            description: description.into(),
            price: Decimal::from(price),
        }
    }

    fn retitle(title: &str) -> UpdateAdvertisementRequest {
        UpdateAdvertisementRequest {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn owner_admin_and_stranger(pool: PgPool) {
        let state = AppState::with_pool(pool.clone());
        let a = member(&pool, "a@x.com", Role::User).await;
        let b = member(&pool, "b@x.com", Role::Admin).await;
        let c = member(&pool, "c@x.com", Role::User).await;

        let bike = create(&state, &a, listing("Bike", "red", 100)).await.unwrap();
        assert_eq!(bike.user_id, a.id);
        assert_eq!(bike.price, Decimal::from(100));

        let edited = update(&state, &b, bike.id, UpdateAdvertisementRequest {
            price: Some(Decimal::from(90)),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(edited.price, Decimal::from(90));
        assert_eq!(edited.user_id, a.id);

        let err = update(&state, &c, bike.id, retitle("Mine")).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        let err = delete(&state, &c, bike.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        delete(&state, &a, bike.id).await.expect("owner delete");
        assert!(matches!(get(&state, bike.id).await, Err(ApiError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn missing_advertisement_is_not_found_before_permission(pool: PgPool) {
        let state = AppState::with_pool(pool.clone());
        let c = member(&pool, "c@x.com", Role::User).await;

        let err = update(&state, &c, 9_999, retitle("Ghost")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = delete(&state, &c, 9_999).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn invalid_patch_is_rejected_and_empty_patch_is_a_no_op(pool: PgPool) {
        let state = AppState::with_pool(pool.clone());
        let a = member(&pool, "a@x.com", Role::User).await;
        let bike = create(&state, &a, listing("Bike", "red", 100)).await.unwrap();

        let zero = UpdateAdvertisementRequest {
            price: Some(Decimal::ZERO),
            ..Default::default()
        };
        let err = update(&state, &a, bike.id, zero).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let same = update(&state, &a, bike.id, UpdateAdvertisementRequest::default())
            .await
            .unwrap();
        assert_eq!(same.updated_at, bike.updated_at);
        assert_eq!(same.price, bike.price);

        let renamed = update(&state, &a, bike.id, retitle("Road bike")).await.unwrap();
        assert_eq!(renamed.title, "Road bike");
        assert_eq!(renamed.description, "red");
        assert_eq!(renamed.created_at, bike.created_at);
        assert!(renamed.updated_at >= bike.updated_at);
    }

    async fn seed_catalogue(state: &AppState, owner: &Identity) -> Vec<Advertisement> {
        let mut ads = Vec::new();
        for (title, description, price) in [
            ("Bike", "red city bike", 100),
            ("Bike pump", "fits any valve", 20),
            ("Lamp", "desk lamp", 120),
            ("Mountain bike", "full suspension", 400),
        ] {
            ads.push(create(state, owner, listing(title, description, price)).await.unwrap());
        }
        ads
    }

    fn titles(resp: &SearchResponse) -> Vec<&str> {
        let mut t: Vec<&str> = resp.results.iter().map(|a| a.title.as_str()).collect();
        t.sort_unstable();
        t
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn and_intersects_while_or_unites(pool: PgPool) {
        let state = AppState::with_pool(pool.clone());
        let a = member(&pool, "a@x.com", Role::User).await;
        seed_catalogue(&state, &a).await;

        let params = |mode: &str| SearchParams {
            title: Some("bike".into()),
            price_min: Some(Decimal::from(50)),
            price_max: Some(Decimal::from(150)),
            search_mode: Some(mode.into()),
            ..Default::default()
        };

        let and = search(&state, params("AND")).await.unwrap();
        assert_eq!(titles(&and), ["Bike"]);
        assert_eq!(and.pagination.total, 1);

        let or = search(&state, params("or")).await.unwrap();
        assert_eq!(titles(&or), ["Bike", "Bike pump", "Lamp", "Mountain bike"]);
        assert_eq!(or.pagination.total, 4);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn pages_are_newest_first_and_report_has_more(pool: PgPool) {
        let state = AppState::with_pool(pool.clone());
        let a = member(&pool, "a@x.com", Role::User).await;
        let ads = seed_catalogue(&state, &a).await;
        let mut newest_first: Vec<i64> = ads.iter().map(|a| a.id).collect();
        newest_first.reverse();

        let page = |offset| SearchParams {
            limit: Some(3),
            offset: Some(offset),
            ..Default::default()
        };

        let first = search(&state, page(0)).await.unwrap();
        assert_eq!(first.pagination.total, 4);
        assert!(first.pagination.has_more);
        let ids: Vec<i64> = first.results.iter().map(|a| a.id).collect();
        assert_eq!(ids, newest_first[..3]);

        let again = search(&state, page(0)).await.unwrap();
        let again_ids: Vec<i64> = again.results.iter().map(|a| a.id).collect();
        assert_eq!(again_ids, ids);

        let last = search(&state, page(3)).await.unwrap();
        assert!(!last.pagination.has_more);
        assert_eq!(last.results.len(), 1);
        assert_eq!(last.results[0].id, newest_first[3]);

        let past_end = search(&state, page(10)).await.unwrap();
        assert!(past_end.results.is_empty());
        assert!(!past_end.pagination.has_more);
        assert_eq!(past_end.pagination.total, 4);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn wildcards_in_filters_match_literally(pool: PgPool) {
        let state = AppState::with_pool(pool.clone());
        let a = member(&pool, "a@x.com", Role::User).await;
        seed_catalogue(&state, &a).await;
        create(&state, &a, listing("50% off", "sale", 10)).await.unwrap();

        let resp = search(&state, SearchParams {
            title: Some("%".into()),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(titles(&resp), ["50% off"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn no_filters_lists_everything(pool: PgPool) {
        let state = AppState::with_pool(pool.clone());
        let a = member(&pool, "a@x.com", Role::User).await;
        seed_catalogue(&state, &a).await;

        let resp = search(&state, SearchParams::default()).await.unwrap();
        assert_eq!(resp.pagination.total, 4);
        assert_eq!(resp.pagination.limit, 100);
        assert!(!resp.pagination.has_more);
    }
}
