//! Maps Compute Engine error responses onto the closed gateway error set.

use crate::gateway::{GatewayError, ResourceKind};

use super::types::ApiErrorEnvelope;

/// Identifies the resource a failed call was operating on, so not-found and
/// already-exists responses can name it.
#[derive(Clone, Copy, Debug)]
pub(super) struct ErrorContext<'a> {
    pub(super) kind: ResourceKind,
    pub(super) name: &'a str,
    pub(super) zone: &'a str,
}

impl<'a> ErrorContext<'a> {
    pub(super) const fn disk(name: &'a str, zone: &'a str) -> Self {
        Self {
            kind: ResourceKind::Disk,
            name,
            zone,
        }
    }

    pub(super) const fn instance(name: &'a str, zone: &'a str) -> Self {
        Self {
            kind: ResourceKind::Instance,
            name,
            zone,
        }
    }
}

/// Classifies a non-success API response.
///
/// The provider's `reason` code takes precedence over the HTTP status: the
/// API reports in-use conflicts with status 400, and quota failures with
/// status 403, so the status alone cannot distinguish the fatal categories.
pub(super) fn classify(status: u16, body: &[u8], context: ErrorContext<'_>) -> GatewayError {
    let parsed = serde_json::from_slice::<ApiErrorEnvelope>(body).ok();
    let (message, reason) = parsed.map_or_else(
        || (String::from_utf8_lossy(body).into_owned(), String::new()),
        |envelope| {
            let reason = envelope
                .error
                .errors
                .first()
                .map(|detail| detail.reason.clone())
                .unwrap_or_default();
            let message = if envelope.error.message.is_empty() {
                envelope
                    .error
                    .errors
                    .first()
                    .map(|detail| detail.message.clone())
                    .unwrap_or_default()
            } else {
                envelope.error.message
            };
            (message, reason)
        },
    );

    match reason.as_str() {
        "notFound" => not_found(context),
        "alreadyExists" => GatewayError::AlreadyExists {
            name: context.name.to_owned(),
        },
        "quotaExceeded" => GatewayError::QuotaExceeded { message },
        "resourceInUseByAnotherResource" => GatewayError::ResourceInUse { message },
        _ => match status {
            404 => not_found(context),
            409 => GatewayError::AlreadyExists {
                name: context.name.to_owned(),
            },
            _ => GatewayError::Provider {
                status,
                code: if reason.is_empty() {
                    String::from("unknown")
                } else {
                    reason
                },
                message,
            },
        },
    }
}

fn not_found(context: ErrorContext<'_>) -> GatewayError {
    GatewayError::NotFound {
        kind: context.kind,
        name: context.name.to_owned(),
        zone: context.zone.to_owned(),
    }
}
