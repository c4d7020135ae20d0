use crate::admin::{AdminCommand, SessionDescription};
use crate::server::{ServerCommand, ServerTx};
use actix_web::error;
use actix_web::web::{self, HttpResponse};
use actix_web::Result;

pub fn configure_session_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/sessions")
            .name("sessions")
            .route(web::get().to(list_sessions)),
    );
}

pub async fn list_sessions(srv_tx: web::Data<ServerTx>) -> Result<HttpResponse> {
    let (tx, rx) = tokio::sync::oneshot::channel::<Vec<SessionDescription>>();

    srv_tx
        .get_ref()
        .clone()
        .send(ServerCommand::Admin(AdminCommand::ListSessions { tx }))
        .await
        .map_err(|_| error::ErrorInternalServerError("Internal Server Error"))?;

    let sessions = rx
        .await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))?;

    Ok(HttpResponse::Ok().json(sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::spawn_server;
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn it_should_list_sessions_as_json() {
        let srv_tx = spawn_server(8);
        let mut app = test::init_service(
            App::new()
                .data(srv_tx)
                .configure(configure_session_handlers),
        )
        .await;

        let req = test::TestRequest::get().uri("/sessions").to_request();
        let body = test::read_response(&mut app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"[]"));
    }
}
