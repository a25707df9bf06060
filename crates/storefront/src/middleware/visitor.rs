//! Visitor extractor.
//!
//! Gives handlers the visitor's session together with a stable visitor id,
//! the key for the in-memory checkout and tracking registries. The id is
//! created and stored in the session on the visitor's first request.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session_keys;

/// The current visitor.
pub struct Visitor {
    pub session: Session,
    pub id: String,
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let id = visitor_id(&session).await?;

        Ok(Self { session, id })
    }
}

/// Read the visitor id, assigning one if the session has none yet.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn visitor_id(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(id) = session.get::<String>(session_keys::VISITOR_ID).await? {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    session.insert(session_keys::VISITOR_ID, &id).await?;
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_visitor_id_is_stable() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let first = visitor_id(&session).await.unwrap();
        let second = visitor_id(&session).await.unwrap();

        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
