//! OpenAPI module

use utoipa::OpenApi;

use crate::{
    domain::{
        communication::email_messages::EmailStatus,
        dns::{DnsRecord, DnsRecordKind, VerificationReport, VerificationStatus},
    },
    infrastructure::http::{errors::ErrorResponse, handlers::v1::*},
};

#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Mail Dispatch"),
    paths(
        emails::send_email::handler,
        emails::list_emails::handler,
        dns::create_mx::handler,
        dns::create_spf::handler,
        dns::create_dkim::handler,
        dns::verify::handler,
        dns::list_records::handler,
        uptime::handler
    ),
    components(schemas(
        emails::send_email::SendEmailBody,
        emails::send_email::SendEmailResponse,
        emails::list_emails::EmailListItem,
        emails::list_emails::ListEmailsResponse,
        EmailStatus,
        dns::PlannedRecordResponse,
        dns::create_mx::CreateMxBody,
        dns::create_spf::CreateSpfBody,
        dns::create_dkim::CreateDkimBody,
        dns::list_records::DnsRecordListItem,
        dns::list_records::ListRecordsResponse,
        DnsRecord,
        DnsRecordKind,
        VerificationStatus,
        VerificationReport,
        uptime::UptimeResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDocs;
