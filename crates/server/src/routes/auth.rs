use crate::error::ApiError;
use axum::http::StatusCode;
use tower_oauth2_resource_server::claims::DefaultClaims;
use uuid::Uuid;

/// Identity of the caller, taken from the `sub` claim of their JWT
pub fn caller_id(claims: &DefaultClaims) -> Result<Uuid, ApiError> {
    parse_subject(claims.sub.as_deref())
}

fn parse_subject(sub: Option<&str>) -> Result<Uuid, ApiError> {
    let sub = sub.ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "token has no subject"))?;

    Uuid::parse_str(sub)
        .map_err(|_| ApiError::bad_request(format!("subject {sub} is not a valid identifier")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subject() {
        let id = Uuid::new_v4();
        assert_eq!(parse_subject(Some(&id.to_string())).unwrap(), id);

        assert_eq!(
            parse_subject(None).unwrap_err().status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            parse_subject(Some("alice")).unwrap_err().status,
            StatusCode::BAD_REQUEST
        );
    }
}
