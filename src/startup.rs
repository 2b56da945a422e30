use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::middleware::{JwtMiddleware, RequestLogger};
use crate::routes::{health_check, liveness, login, logout, readiness, refresh};

pub fn run(listener: TcpListener, auth: AuthService) -> Result<Server, std::io::Error> {
    let issuer = auth.issuer().clone();
    let auth = web::Data::new(auth);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(auth.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/system/liveness", web::get().to(liveness))
            .route("/system/readiness", web::get().to(readiness))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            // Protected routes (require a valid access token)
            .service(
                web::resource("/auth/logout")
                    .route(web::post().to(logout))
                    .wrap(JwtMiddleware::new(issuer.clone())),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
