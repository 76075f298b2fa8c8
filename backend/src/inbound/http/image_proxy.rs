//! Image proxy: fetch remote images server-side so catalog logos load
//! without CORS blocks, backed by the TTL cache.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    url: Option<String>,
}

#[get("/image-proxy")]
pub async fn image_proxy(
    state: web::Data<HttpState>,
    query: web::Query<ProxyQuery>,
) -> ApiResult<HttpResponse> {
    let Some(url) = query.url.as_deref().filter(|u| !u.is_empty()) else {
        return Err(Error::invalid_request("URL parameter is required"));
    };
    let image = state.images.get_or_fetch(url).await?;
    Ok(HttpResponse::Ok()
        .content_type(image.content_type)
        .body(image.bytes))
}
