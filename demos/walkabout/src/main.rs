//! Demo presence server: one static space, tokens taken at face value.
//!
//! Connect with any WebSocket client and walk around:
//!
//! ```text
//! {"type":"join","payload":{"spaceId":"lobby","token":"alice"}}
//! {"type":"movement","payload":{"x":1,"y":0}}
//! ```

use std::collections::HashMap;

use plaza::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Accepts any non-empty token and uses it as the user id. The real
/// deployment swaps this for the account service's token validation.
struct OpenDoorVerifier;

impl IdentityVerifier for OpenDoorVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, SessionError> {
        if token.is_empty() {
            return Err(SessionError::AuthFailed("empty token".into()));
        }
        Ok(UserId::from(token))
    }
}

/// Serves a fixed set of spaces from memory.
struct StaticDirectory {
    spaces: HashMap<SpaceId, SpaceSnapshot>,
}

impl SpaceDirectory for StaticDirectory {
    async fn lookup(
        &self,
        space_id: &SpaceId,
    ) -> Result<SpaceSnapshot, SpaceError> {
        self.spaces
            .get(space_id)
            .cloned()
            .ok_or_else(|| SpaceError::NotFound(space_id.clone()))
    }
}

/// A 20x10 lobby with a pillar in the middle.
fn lobby() -> SpaceSnapshot {
    SpaceSnapshot::new(SpaceId::from("lobby"), 20, 10).with_obstacles([
        Position::new(9, 4),
        Position::new(10, 4),
        Position::new(9, 5),
        Position::new(10, 5),
    ])
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("PLAZA_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let space = lobby();
    let directory = StaticDirectory {
        spaces: HashMap::from([(space.id.clone(), space)]),
    };

    let server = PlazaServerBuilder::new()
        .bind(&addr)
        .build(OpenDoorVerifier, directory)
        .await?;

    tracing::info!(%addr, "walkabout demo listening");
    server.run().await?;
    Ok(())
}
