use tracing::{debug, warn};
use tubescope_extractor_api::{ExtractError, ExtractionContext, PageKind, PageResult};

use super::common::innertube_request;
use super::mapper::{inherit_author, map_continuation_response, MappedItems};
use super::types::request::{self, clients::MWEB};

/// Fetches the next page of `page` and appends its items.
///
/// Returns how many items were appended. `MissingToken` is the normal end of
/// the list and leaves `page.error` alone; every other error is also stored in
/// `page.error`, with the token kept so the caller can retry.
pub async fn continue_page(
    ctx: &ExtractionContext,
    page: &mut PageResult,
) -> Result<usize, ExtractError> {
    let Some(api_key) = page.api_key.clone().filter(|k| !k.is_empty()) else {
        page.fail(ExtractError::MissingApiKey);
        return Err(ExtractError::MissingApiKey);
    };
    let Some(token) = page.continuation_token.clone() else {
        return Err(ExtractError::MissingToken);
    };

    match fetch_continuation(ctx, page.kind, &api_key, token).await {
        Ok(mut mapped) => {
            let count = mapped.items.len();
            if page.kind == PageKind::Channel {
                inherit_author(&mut mapped.items, &page.name);
            }
            ctx.append_items(page, mapped.items);
            page.set_continuation(mapped.continuation);
            page.error = None;
            debug!(
                url = %page.url,
                appended = count,
                total = page.items().len(),
                exhausted = !page.has_continuation(),
                "continuation appended"
            );
            Ok(count)
        }
        Err(e) => {
            warn!(url = %page.url, error = %e, "continuation failed");
            page.fail(e.clone());
            Err(e)
        }
    }
}

async fn fetch_continuation(
    ctx: &ExtractionContext,
    kind: PageKind,
    api_key: &str,
    token: String,
) -> Result<MappedItems, ExtractError> {
    let response = match kind {
        PageKind::Search => {
            let json = request::Search {
                context: MWEB.context(&ctx.locale),
                continuation: Some(token),
                ..Default::default()
            };
            innertube_request(ctx, "search continuation", &MWEB, "search", api_key, json).await?
        }
        PageKind::Channel | PageKind::Playlist => {
            let json = request::Browse {
                context: MWEB.context(&ctx.locale),
                continuation: Some(token),
                ..Default::default()
            };
            innertube_request(ctx, "browse continuation", &MWEB, "browse", api_key, json).await?
        }
    };
    Ok(map_continuation_response(&response))
}
