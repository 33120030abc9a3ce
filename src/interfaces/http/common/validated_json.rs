//! JSON body extractor with field validation
//!
//! Malformed JSON is answered with 400, bodies that parse but break a
//! `validator` rule with 422 listing every offending field. Nested line
//! errors are reported by path, e.g. `items[1].quantity: must be positive`.

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::{unprocessable, ApiError, ApiResponse};

/// `Json<T>` that also runs `validator::Validate` on the body.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct StartSession {
///     #[validate(range(min = 1))]
///     duration_minutes: i32,
/// }
///
/// async fn handler(ValidatedJson(body): ValidatedJson<StartSession>) {}
/// ```
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Invalid JSON: {}", rejection))),
            )
        })?;

        body.validate()
            .map_err(|errors| unprocessable(describe(&errors)))?;
        Ok(ValidatedJson(body))
    }
}

/// Flatten validation errors into one sorted `path: message` list
fn describe(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect(errors, "", &mut lines);
    if lines.is_empty() {
        return "Validation failed".to_string();
    }
    lines.sort();
    lines.join("; ")
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|e| match &e.message {
                    Some(msg) => format!("{}: {}", path, msg),
                    None => format!("{}: {}", path, e.code),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    collect(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}
