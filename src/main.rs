mod errors;
mod logging;
mod initialization;
mod handlers;
mod manager_sizing;
mod manager_rainfall;
mod manager_blueprint;
mod models;
mod cache;
mod serialize_timestamp;

use actix_web::{middleware, web, App, HttpServer};
use log::info;
use crate::errors::UnrecoverableError;
use crate::handlers::{get_assessment, get_health, post_blueprint_dimensions};
use crate::initialization::{config, Config};

struct AppState {
    config: Config,
}

#[actix_web::main]
async fn main() -> Result<(), UnrecoverableError> {
    let config = config()?;
    let web_data = web::Data::new(AppState { config: config.clone() });

    info!("starting web server on {}:{}", config.web_server.bind_address, config.web_server.bind_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web_data.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::DefaultHeaders::new().add(("Cache-Control", "no-cache")))
            .service(get_assessment)
            .service(post_blueprint_dimensions)
            .service(get_health)
    })
        .bind((config.web_server.bind_address.as_str(), config.web_server.bind_port))?
        .run()
        .await?;

    Ok(())
}
