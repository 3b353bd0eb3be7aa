use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::partners::{rank_partners, PartnerMatch};
use crate::services::PartnerService;

/// GET /api/partners/matches - empty until the caller has a listing
pub async fn matches(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<PartnerMatch>> {
    let service = PartnerService::new()?;
    let Some(me) = service.listing_for(user.user_id).await? else {
        return Ok(ApiResponse::success(vec![]));
    };

    let candidates = service.candidates(&me).await?;
    Ok(ApiResponse::success(rank_partners(&me, candidates)))
}
