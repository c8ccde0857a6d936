use actix_web::{App, HttpServer, middleware};
use actix_cors::Cors;
use skillgate::api::{configure_routes, AppState};
use skillgate::{banner, config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    banner::print_banner();

    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  No .env file loaded ({}), using the process environment", e);
    }

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = config::AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let bind = (app_config.host.clone(), app_config.port);

    log::info!(
        "Running submissions with '{}' ({}ms timeout)",
        app_config.execution.interpreter,
        app_config.execution.timeout.as_millis()
    );

    let state = AppState::new(app_config)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    println!("🚀 Backend server running on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(actix_web::web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(bind)?
    .run()
    .await
}
