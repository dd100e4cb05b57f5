use actix_web::{web, HttpResponse};
use geojson::FeatureCollection;

use crate::error::Result;
use crate::handlers::{Ctx, CoordsQuery};
use crate::lookup::{CatchmentLookup, FlowlineLookup};
use crate::response;
use crate::util::geom::point_at_fraction;
use crate::util::point::parse_point;

/// `GET /linked-data/comid/{comid}` (spec.md §8 scenario S1/S6).
pub async fn get_comid(ctx: Ctx, path: web::Path<String>) -> Result<HttpResponse> {
    let comid_str = path.into_inner();
    let comid: i64 = comid_str
        .parse()
        .map_err(|_| crate::error::Error::invalid_input(format!("'{comid_str}' is not a COMID")))?;

    let flowline = ctx.flowlines.by_comid(comid).await?;
    let links = ctx.link_builder();
    let feature = response::flowline_feature(&flowline, &links, false)?;

    Ok(respond(&ctx, FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }))
}

/// `GET /linked-data/comid/position?coords=POINT(lon lat)` (spec.md §8 S2).
pub async fn position(ctx: Ctx, query: web::Query<CoordsQuery>) -> Result<HttpResponse> {
    let point = parse_point(&query.coords)?;
    let catchment = ctx.catchments.containing_point(point.lon, point.lat).await?;

    let links = ctx.link_builder();
    let feature = response::catchment_feature(&catchment, &links)?;

    Ok(respond(&ctx, FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }))
}

/// `GET /linked-data/hydrolocation?coords=POINT(lon lat)`.
pub async fn hydrolocation(ctx: Ctx, query: web::Query<CoordsQuery>) -> Result<HttpResponse> {
    let point = parse_point(&query.coords)?;
    let anchor = ctx.anchors.hydrolocation(point).await?;
    let measure = anchor.measure.unwrap_or(0.0);

    let flowline = ctx.flowlines.by_comid(anchor.comid).await?;
    let fraction = crate::util::geom::measure_to_fraction(measure);
    let coord = point_at_fraction(&flowline.geometry, fraction);

    let links = ctx.link_builder();
    let feature = response::hydrolocation_feature(
        anchor.comid,
        measure,
        geo_types::Point::new(coord.x, coord.y),
        &links,
    )?;

    Ok(respond(&ctx, FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }))
}

fn respond(ctx: &Ctx, collection: FeatureCollection) -> HttpResponse {
    crate::handlers::sources::json_geojson_response(ctx, &collection)
}
