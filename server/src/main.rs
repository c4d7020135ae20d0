use actix_cors::Cors;
use actix_web::{middleware, App, HttpServer};

use canvas_relay::config::RelayConfig;
use canvas_relay::handlers::root;
use canvas_relay::server::spawn_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = RelayConfig::from_env();
    log::info!("Relay listening on {}", config.bind_addr);

    let srv_tx = spawn_server(config.queue_capacity);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .data(srv_tx.clone())
            .configure(root)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
