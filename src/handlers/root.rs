use actix_web::{web, HttpResponse};
use geojson::{JsonObject, JsonValue};

use crate::context::AppContext;

/// `GET /` — service root / landing document (SPEC_FULL.md §E.2). A full
/// OGC landing page is out of scope; this is just enough for a client to
/// discover the two real entry points.
pub async fn landing(ctx: web::Data<AppContext>) -> HttpResponse {
    let base = ctx.link_builder().base_url;

    let mut body = JsonObject::new();
    body.insert(
        "title".into(),
        JsonValue::from(ctx.config.metadata.title.as_str()),
    );
    body.insert(
        "links".into(),
        JsonValue::Array(vec![
            link(&format!("{base}/linked-data"), "linked-data"),
            link(&format!("{base}/openapi"), "service-desc"),
        ]),
    );

    HttpResponse::Ok().json(body)
}

fn link(href: &str, rel: &str) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.insert("href".into(), JsonValue::from(href));
    obj.insert("rel".into(), JsonValue::from(rel));
    JsonValue::Object(obj)
}
