use actix_web::{web, HttpResponse};
use geojson::{FeatureCollection, GeoJson, JsonValue};

use crate::error::{Error, Result};
use crate::handlers::{BasinQuery, Ctx, NavigationQuery, PageQuery};
use crate::lookup::{BasinLookup, FeatureLookup, FlowlineLookup};
use crate::model::NavMode;
use crate::navigation::NavParams;
use crate::response;
use crate::util::paging::Page;

/// `GET /linked-data`.
pub async fn list_sources(ctx: Ctx) -> HttpResponse {
    let sources = ctx.sources.list().await;
    let links = ctx.link_builder();
    json_response(&ctx, &response::source_list_json(&sources, &links))
}

/// `GET /linked-data/{source}` (paged).
pub async fn list_features(
    ctx: Ctx,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let source = ctx.sources.get(&path.into_inner()).await?;
    let page = Page::new(query.limit, query.offset)?;

    let features = if source.is_comid_source() {
        Vec::new()
    } else {
        ctx.features
            .list_paged(source.source_id, page.limit, page.offset)
            .await?
    };

    let links = ctx.link_builder();
    let collection = response::source_feature_collection(&features, &source, &[], &links);
    Ok(json_geojson_response(&ctx, &collection))
}

/// `GET /linked-data/{source}/{featureId}`.
pub async fn get_feature(ctx: Ctx, path: web::Path<(String, String)>) -> Result<HttpResponse> {
    let (source_suffix, feature_id) = path.into_inner();
    let source = ctx.sources.get(&source_suffix).await?;

    let links = ctx.link_builder();
    let collection = if source.is_comid_source() {
        let comid: i64 = feature_id
            .parse()
            .map_err(|_| Error::invalid_input(format!("'{feature_id}' is not a COMID")))?;
        let flowline = ctx.flowlines.by_comid(comid).await?;
        FeatureCollection {
            bbox: None,
            features: vec![response::flowline_feature(&flowline, &links, false)?],
            foreign_members: None,
        }
    } else {
        let feature = ctx.features.by_identifier(source.source_id, &feature_id).await?;
        let mainstem = ctx.mainstems.by_comid(feature.comid).await?.map(|uri| {
            crate::model::MainstemEntry {
                comid: feature.comid,
                mainstem_uri: uri,
            }
        });
        FeatureCollection {
            bbox: None,
            features: vec![response::source_feature(
                &feature,
                &source,
                mainstem.as_ref(),
                &links,
            )],
            foreign_members: None,
        }
    };

    Ok(json_geojson_response(&ctx, &collection))
}

/// `GET /linked-data/{source}/{featureId}/basin?simplified=&splitCatchment=`.
pub async fn get_basin(
    ctx: Ctx,
    path: web::Path<(String, String)>,
    query: web::Query<BasinQuery>,
) -> Result<HttpResponse> {
    let (source_suffix, feature_id) = path.into_inner();
    let source = ctx.sources.get(&source_suffix).await?;
    let anchor = ctx.anchors.by_feature(&source, &feature_id).await?;

    let params = NavParams::new(NavMode::Ut, 9_999.0, None)?;
    let nav_result = ctx.navigation.navigate(&anchor, params).await?;

    // The anchor's own reach is part of its upstream basin.
    let mut comids = nav_result.comids;
    if !comids.contains(&anchor.comid) {
        comids.push(anchor.comid);
    }

    let tolerance = if query.simplified { Some(0.0001) } else { None };
    let basin = ctx.basins.upstream_basin(&comids, tolerance).await?;
    let collection = response::basin_feature_collection(&basin)?;

    Ok(json_geojson_response(&ctx, &collection))
}

/// `GET /linked-data/{source}/{featureId}/navigation`.
pub async fn navigation_index(ctx: Ctx, path: web::Path<(String, String)>) -> Result<HttpResponse> {
    let (source_suffix, feature_id) = path.into_inner();
    // Existence check: resolving the anchor also validates the identifier.
    let source = ctx.sources.get(&source_suffix).await?;
    ctx.anchors.by_feature(&source, &feature_id).await?;

    let links = ctx.link_builder();
    Ok(json_response(
        &ctx,
        &response::navigation_index_json(&links, &source_suffix, &feature_id),
    ))
}

/// `GET /linked-data/{source}/{featureId}/navigation/{mode}`.
pub async fn navigation_outputs(
    ctx: Ctx,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse> {
    let (source_suffix, feature_id, mode) = path.into_inner();
    let source = ctx.sources.get(&source_suffix).await?;
    ctx.anchors.by_feature(&source, &feature_id).await?;

    NavMode::from_str_ci(&mode).ok_or_else(|| Error::invalid_input(format!("unknown mode '{mode}'")))?;

    let data_sources = ctx.sources.list().await;
    let links = ctx.link_builder();
    Ok(json_response(
        &ctx,
        &response::navigation_outputs_json(&links, &source_suffix, &feature_id, &mode, &data_sources),
    ))
}

/// `GET /linked-data/{source}/{featureId}/navigation/{mode}/{dataSource}` —
/// the primary navigation call (spec.md §8 scenarios S3-S7).
pub async fn navigate(
    ctx: Ctx,
    path: web::Path<(String, String, String, String)>,
    query: web::Query<NavigationQuery>,
) -> Result<HttpResponse> {
    let (source_suffix, feature_id, mode_str, data_source) = path.into_inner();

    if let Some(legacy) = &query.legacy {
        tracing::debug!(legacy = %legacy, "accepted legacy navigation parameter (no-op)");
    }

    let source = ctx.sources.get(&source_suffix).await?;
    let anchor = ctx.anchors.by_feature(&source, &feature_id).await?;

    let mode = NavMode::from_str_ci(&mode_str)
        .ok_or_else(|| Error::invalid_input(format!("unknown mode '{mode_str}'")))?;

    let distance_km = match mode {
        NavMode::Pp => query.distance.unwrap_or(0.0),
        _ => query
            .distance
            .ok_or_else(|| Error::invalid_input("distance is required"))?,
    };

    let params = NavParams::new(mode, distance_km, query.stop_comid)?;
    let nav_result = ctx.navigation.navigate(&anchor, params).await?;

    let links = ctx.link_builder();

    let collection = if data_source.eq_ignore_ascii_case("flowlines") {
        let flowlines = ctx
            .navigation
            .project_flowlines(
                &anchor,
                params,
                &nav_result,
                query.trim_start,
                query.trim_tolerance,
            )
            .await?;
        response::flowline_collection(&flowlines, &links, query.exclude_geometry)?
    } else {
        let target_source = ctx.sources.get(&data_source).await?;
        if target_source.is_comid_source() {
            return Err(Error::invalid_input(
                "use dataSource 'flowlines' to navigate onto flowlines",
            ));
        }

        let mut by_source = ctx
            .features
            .by_source_and_comids(target_source.source_id, &nav_result.comids)
            .await?;
        // Ordering: navigation order first, then feature identifier
        // (spec.md §4.5) — `by_source_and_comids` already sorts by
        // identifier, so a stable sort by navigation position preserves
        // that as the tie-break.
        by_source.sort_by_key(|f| {
            nav_result
                .comids
                .iter()
                .position(|c| *c == f.comid)
                .unwrap_or(usize::MAX)
        });
        let all_features = by_source;

        let mainstems = ctx
            .navigation
            .mainstem_annotations(&nav_result.comids)
            .await?;

        response::source_feature_collection(&all_features, &target_source, &mainstems, &links)
    };

    Ok(json_geojson_response(&ctx, &collection))
}

pub(crate) fn json_response(ctx: &Ctx, value: &JsonValue) -> HttpResponse {
    let body = if ctx.config.server.pretty_print {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .unwrap_or_else(|_| "null".to_owned());

    HttpResponse::Ok()
        .content_type("application/json")
        .body(body)
}

pub(crate) fn json_geojson_response(ctx: &Ctx, collection: &FeatureCollection) -> HttpResponse {
    let geojson = GeoJson::from(collection.clone());
    let body = if ctx.config.server.pretty_print {
        serde_json::to_string_pretty(&geojson)
    } else {
        serde_json::to_string(&geojson)
    }
    .unwrap_or_else(|_| "null".to_owned());

    HttpResponse::Ok()
        .content_type("application/json")
        .body(body)
}
