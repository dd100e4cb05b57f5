use actix_web::{web, HttpResponse};
use geojson::{JsonObject, JsonValue};
use serde::Deserialize;

use crate::context::AppContext;

#[derive(Debug, Deserialize)]
pub struct OpenapiQuery {
    #[serde(default = "default_format")]
    pub f: String,
}

fn default_format() -> String {
    "json".to_owned()
}

/// `GET /openapi?f=` — a minimal stub. Full OpenAPI document generation is
/// an external collaborator's responsibility (spec.md §1); this endpoint
/// exists so the route in spec.md §6 resolves to something, carrying just
/// the metadata block verbatim.
pub async fn openapi(
    ctx: web::Data<AppContext>,
    query: web::Query<OpenapiQuery>,
) -> HttpResponse {
    if !matches!(query.f.as_str(), "json" | "yaml" | "html") {
        return HttpResponse::NotAcceptable().json(crate::error::ErrorBody {
            code: "InvalidInput",
            message: format!("unsupported openapi format '{}'", query.f),
        });
    }

    let mut body = JsonObject::new();
    body.insert(
        "title".into(),
        JsonValue::from(ctx.config.metadata.title.as_str()),
    );
    body.insert(
        "license".into(),
        JsonValue::from(ctx.config.metadata.license.as_str()),
    );
    body.insert(
        "contact".into(),
        JsonValue::from(ctx.config.metadata.contact.as_str()),
    );
    HttpResponse::Ok().json(body)
}
