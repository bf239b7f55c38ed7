use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    domain::{communication::email_messages::EmailService, dns::DnsService},
    infrastructure::http::{open_api::ApiDocs, state::AppState},
};

pub mod dns;
pub mod emails;
pub mod stoplight;
pub mod uptime;

pub fn router<E: EmailService, D: DnsService>() -> Router<AppState<E, D>> {
    Router::new()
        .route("/", get(stoplight::handler))
        .route("/openapi.json", get(Json(ApiDocs::openapi())))
        .route("/uptime", get(uptime::handler))
        .route(
            "/emails",
            get(emails::list_emails::handler).post(emails::send_email::handler),
        )
        .route("/dns/mx", post(dns::create_mx::handler))
        .route("/dns/spf", post(dns::create_spf::handler))
        .route("/dns/dkim", post(dns::create_dkim::handler))
        .route("/dns/verify", post(dns::verify::handler))
        .route("/dns/records", get(dns::list_records::handler))
}
