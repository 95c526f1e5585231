use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{
    repo::Advertisement,
    search::{Page, SearchFilters, SearchMode, DEFAULT_LIMIT, MAX_LIMIT},
};
use crate::error::{ApiError, ApiResult};

pub const MAX_TITLE_LEN: usize = 50;

fn check_title(title: &str) -> ApiResult<()> {
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(ApiError::validation(format!(
            "title must be 1 to {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn check_price(price: Decimal) -> ApiResult<()> {
    if price <= Decimal::ZERO {
        return Err(ApiError::validation("price must be greater than 0"));
    }
    Ok(())
}

/// Request body for `POST /advertisements`. The owner comes from the token.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAdvertisementRequest {
    pub title: String,
    pub description: String,
    pub price: Decimal,
}

impl CreateAdvertisementRequest {
    pub fn validate(&self) -> ApiResult<()> {
        check_title(&self.title)?;
        check_price(self.price)
    }
}

/// Request body for `PATCH /advertisements/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAdvertisementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

impl UpdateAdvertisementRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.price.is_none()
    }

    pub fn validate(&self) -> ApiResult<()> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct AdvertisementView {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub user_id: i64,
}

impl From<Advertisement> for AdvertisementView {
    fn from(a: Advertisement) -> Self {
        Self {
            id: a.id,
            title: a.title,
            description: a.description,
            price: a.price,
            created_at: a.created_at,
            updated_at: a.updated_at,
            user_id: a.user_id,
        }
    }
}

/// Query string of `GET /advertisements`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search_mode: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchParams {
    pub fn into_query(self) -> ApiResult<(SearchFilters, Page)> {
        let mode = match self.search_mode.as_deref() {
            Some(raw) => raw.parse::<SearchMode>()?,
            None => SearchMode::default(),
        };

        for (name, bound) in [("price_min", self.price_min), ("price_max", self.price_max)] {
            if matches!(bound, Some(p) if p <= Decimal::ZERO) {
                return Err(ApiError::validation(format!("{name} must be greater than 0")));
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                return Err(ApiError::validation(
                    "price_min must not exceed price_max",
                ));
            }
        }

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::validation("offset must not be negative"));
        }

        let filters = SearchFilters {
            title: self.title.filter(|s| !s.is_empty()),
            description: self.description.filter(|s| !s.is_empty()),
            price_min: self.price_min,
            price_max: self.price_max,
            mode,
        };
        Ok((filters, Page { limit, offset }))
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationInfo {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<AdvertisementView>,
    pub pagination: PaginationInfo,
}
