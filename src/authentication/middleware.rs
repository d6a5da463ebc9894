use std::convert::Infallible;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use super::jwt::{verify_jwt_session, SessionData};

#[derive(Debug)]
struct Unauthorized;

impl reject::Reject for Unauthorized {}

/// Requires a valid session cookie, discarding its contents.
pub fn with_auth() -> impl Filter<Extract = ((),), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        if verify_jwt_session(session).is_ok() {
            Ok(())
        } else {
            Err(warp::reject::custom(Unauthorized))
        }
    })
}

/// Requires a valid session cookie and extracts the identity.
pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        match verify_jwt_session(session) {
            Ok(data) => Ok(SessionData::from(data)),
            Err(_) => Err(warp::reject::custom(Unauthorized)),
        }
    })
}

/// Extracts the identity when present; a missing or invalid cookie yields an
/// anonymous request instead of a rejection.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<SessionData>,), Error = Infallible> + Copy {
    warp::cookie::optional::<String>("session").map(move |session: Option<String>| {
        session
            .and_then(|session| verify_jwt_session(session).ok())
            .map(SessionData::from)
    })
}
