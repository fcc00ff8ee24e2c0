//! Date archives.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Months, NaiveDate};

use crate::api::{Api, ApiRequest};
use crate::entry::{Content, ContentKind};
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::handlers::fetch_listing;

// Midnight, in the API's ISO 8601 form.
const API_DATE_FORMAT: &str = "%Y-%m-%dT00:00:00";

/// Year, month and day archives.
///
/// Matches `year`, `month` and `day` parameters; dates that do not exist
/// in the calendar resolve to 404.
pub struct DateHandler {
    api: Arc<dyn Api>,
    per_page: u32,
}

impl DateHandler {
    pub fn new(api: Arc<dyn Api>, per_page: u32) -> Self {
        Self { api, per_page }
    }
}

fn parse_part<T: std::str::FromStr>(ctx: &HandlerContext<'_>, name: &str) -> Result<Option<T>, HandlerError> {
    ctx.param(name)
        .map(|value| value.parse().map_err(|_| HandlerError::not_found()))
        .transpose()
}

/// First instant of the archive and the first instant after it.
fn bounds(year: i32, month: Option<u32>, day: Option<u32>) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1))?;
    let end = match (month, day) {
        (Some(_), Some(_)) => start.succ_opt()?,
        (Some(_), None) => start.checked_add_months(Months::new(1))?,
        (None, None) => start.checked_add_months(Months::new(12))?,
        (None, Some(_)) => return None,
    };
    Some((start, end))
}

#[async_trait]
impl Handler for DateHandler {
    async fn handle(&self, ctx: HandlerContext<'_>) -> Result<Content, HandlerError> {
        let year: i32 = parse_part(&ctx, "year")?.ok_or_else(HandlerError::not_found)?;
        let month: Option<u32> = parse_part(&ctx, "month")?;
        let day: Option<u32> = parse_part(&ctx, "day")?;

        let (start, end) = bounds(year, month, day).ok_or_else(HandlerError::not_found)?;

        let request = ApiRequest::new("posts")
            .param("after", start.format(API_DATE_FORMAT))
            .param("before", end.format(API_DATE_FORMAT));

        fetch_listing(
            self.api.as_ref(),
            &ctx,
            ContentKind::Date { year, month, day },
            request,
            self.per_page,
        )
        .await
    }
}
