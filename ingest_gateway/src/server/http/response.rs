//! Mapping of request [`Outcome`]s onto HTTP responses.

use hyper::{
    Body, Response, StatusCode,
    header::{CONTENT_TYPE, HeaderValue, RETRY_AFTER},
};
use serde::Serialize;

use crate::{dispatch::Outcome, validate::RejectionReason};

/// Seconds suggested to an overloaded client before retrying.
const RETRY_AFTER_SECS: &str = "1";

const APPLICATION_JSON: &str = "application/json";

/// The body returned with every non-2xx response: a short machine-readable
/// reason code plus a human-readable message.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// The body returned with an accepted submission, carrying the opaque
/// storage reference assigned by the backend.
#[derive(Debug, Serialize)]
struct AcceptedBody<'a> {
    storage_ref: &'a str,
}

/// Map the terminal `outcome` of a request onto the HTTP response returned
/// to the client.
///
/// The mapping is pure and deterministic - equal outcomes always map to the
/// same status code:
///
/// | outcome                         | status |
/// |---------------------------------|--------|
/// | `Accepted`                      | 201    |
/// | `Rejected(MethodNotAllowed)`    | 405    |
/// | `Rejected(PayloadTooLarge)`     | 413    |
/// | `Rejected(..)`                  | 400    |
/// | `Overloaded`                    | 503    |
/// | `BackendFailure`                | 502    |
/// | `TimedOut`                      | 504    |
pub fn into_response(outcome: Outcome) -> Response<Body> {
    match outcome {
        Outcome::Accepted(storage_ref) => {
            let body = serde_json::to_vec(&AcceptedBody {
                storage_ref: storage_ref.as_str(),
            })
            .unwrap();

            Response::builder()
                .status(StatusCode::CREATED)
                .header(CONTENT_TYPE, APPLICATION_JSON)
                .body(Body::from(body))
                .unwrap()
        }
        Outcome::Rejected(reason) => {
            error_response(rejection_status(&reason), reason.code(), reason.to_string())
        }
        Outcome::Overloaded => {
            let mut resp = error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "overloaded",
                "too many in-flight writes for this namespace, retry later".to_string(),
            );
            resp.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
            resp
        }
        // The root cause is not the caller's to see - it is logged where it
        // was observed.
        Outcome::BackendFailure(_) => error_response(
            StatusCode::BAD_GATEWAY,
            "backend_failure",
            "storage backend failed to accept the write".to_string(),
        ),
        Outcome::TimedOut => error_response(
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            "write did not complete within the deadline and may still be applied".to_string(),
        ),
    }
}

/// The status code for each rejection reason.
fn rejection_status(reason: &RejectionReason) -> StatusCode {
    match reason {
        RejectionReason::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        RejectionReason::MalformedPath
        | RejectionReason::UnknownEndpoint(_)
        | RejectionReason::InvalidNamespace(_)
        | RejectionReason::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
        RejectionReason::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
    }
}

fn error_response(status: StatusCode, code: &'static str, message: String) -> Response<Body> {
    let body = serde_json::to_vec(&ErrorBody { code, message }).unwrap();

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, APPLICATION_JSON)
        .body(Body::from(body))
        .unwrap()
}
