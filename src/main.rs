use actix_web::{web, App, HttpServer};
use nldi_services::config::AppConfig;
use nldi_services::context::AppContext;
use nldi_services::handlers::{self, request_id::RequestId};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config_path = std::env::var("NLDI_CONFIG").unwrap_or_else(|_| "nldi.yml".to_owned());
    let config = AppConfig::load(&config_path).unwrap_or_else(|err| {
        panic!("failed to load configuration from {config_path}: {err}");
    });

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let bind_addr = config.server.bind_address.clone();
    let prefix = config.server.prefix.clone();

    tracing::info!(bind_addr, "starting nldi-services");

    let ctx = AppContext::bootstrap(config)
        .await
        .unwrap_or_else(|err| panic!("failed to bootstrap application context: {err}"));
    let data = web::Data::new(ctx);

    HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(RequestId)
            .app_data(data.clone())
            .configure(|cfg| handlers::configure(cfg, &prefix))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
