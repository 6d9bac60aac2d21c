use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use log::*;
use std::net::SocketAddr;

pub async fn log_request(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_owned(), |ConnectInfo(addr)| addr.to_string());

    info!(
        "{remote} - {:?} {} {}",
        request.version(),
        request.method(),
        request.uri()
    );

    next.run(request).await
}
