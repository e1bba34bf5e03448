//! Connection gateway: join handshake and per-connection message loop.
//!
//! Each accepted connection gets its own task running this handler. The
//! flow is:
//!   1. Await exactly one `join` request (bounded by the handshake
//!      timeout)
//!   2. Verify the token, look up the space (each bounded by the
//!      collaborator timeout)
//!   3. Attach to the space's room via the registry, reply
//!      `space-joined`
//!   4. Loop: forward movement requests; answer anything else with an
//!      error frame
//!
//! A writer task drains the room's per-member event buffer into the
//! socket, so broadcasts never touch the room's critical section.

use std::sync::Arc;
use std::time::Duration;

use plaza_proto::{
    ClientMessage, Codec, ProtoError, ServerMessage, UserId, UserSummary,
};
use plaza_room::{RoomError, RoomHandle};
use plaza_session::{IdentityVerifier, Session, SessionError};
use plaza_space::{SpaceDirectory, SpaceError};
use plaza_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::PlazaError;

/// Drop guard that detaches a session's user from its room when the
/// handler exits — normal disconnect, error, or panic alike. `Drop` is
/// synchronous, so the leave is sent from a spawned task; the room
/// treats repeated leaves as no-ops.
struct LeaveGuard {
    room: RoomHandle,
    user_id: UserId,
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let room = self.room.clone();
        let user_id = self.user_id.clone();
        tokio::spawn(async move {
            let _ = room.leave(user_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<V, D, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<V, D, C>>,
) -> Result<(), PlazaError>
where
    V: IdentityVerifier,
    D: SpaceDirectory,
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: join handshake ---
    let (session, outbound) = match perform_join(&conn, &state).await {
        Ok(pair) => pair,
        Err(e) => {
            let _ = conn.close().await;
            return Err(e);
        }
    };
    let _guard = LeaveGuard {
        room: session.room().clone(),
        user_id: session.user_id().clone(),
    };

    // Writer task: drain the member's event buffer into the socket. It
    // ends when the room drops the sender (leave or overflow kick) or
    // the socket dies, and closes the connection either way.
    let _writer = {
        let conn = conn.clone();
        let codec = state.codec.clone();
        let mut outbound = outbound;
        tokio::spawn(async move {
            while let Some(event) = outbound.recv().await {
                let frame = match codec.encode(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode event");
                        break;
                    }
                };
                if conn.send(&frame).await.is_err() {
                    break;
                }
            }
            let _ = conn.close().await;
        })
    };

    // --- Step 2: message loop ---
    let result = drive_session(&conn, &state, &session).await;

    tracing::info!(
        %conn_id,
        user_id = %session.user_id(),
        space_id = %session.space_id(),
        session_secs = session.joined_at().elapsed().as_secs(),
        "session ended"
    );

    // _guard drops here → the leave fires; the room then drops our
    // sender and the writer winds down on its own.
    result
}

/// Reads frames until the connection ends, forwarding movements to the
/// session's room.
async fn drive_session<V, D, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<V, D, C>>,
    session: &Session,
) -> Result<(), PlazaError>
where
    V: IdentityVerifier,
    D: SpaceDirectory,
    C: Codec + Clone,
{
    loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(
                    user_id = %session.user_id(),
                    "connection closed cleanly"
                );
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(
                    user_id = %session.user_id(),
                    error = %e,
                    "recv error"
                );
                return Ok(());
            }
        };

        let msg: ClientMessage = match state.codec.decode(&frame) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(
                    user_id = %session.user_id(),
                    error = %e,
                    "malformed frame"
                );
                send_error(conn, &state.codec, 400, "malformed frame")
                    .await?;
                continue;
            }
        };

        match msg {
            ClientMessage::Movement { x, y } => {
                if session.forward_move(x, y).await.is_err() {
                    // The room is gone out from under us; close and let
                    // the normal cleanup path run.
                    return Ok(());
                }
            }
            ClientMessage::Join { .. } => {
                // At most one room attachment per connection.
                tracing::debug!(
                    user_id = %session.user_id(),
                    "second join ignored"
                );
                send_error(conn, &state.codec, 400, "already joined")
                    .await?;
            }
        }
    }
}

/// Performs the join handshake. On failure an error frame has already
/// been sent; the caller closes the connection.
async fn perform_join<V, D, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<V, D, C>>,
) -> Result<(Session, mpsc::Receiver<ServerMessage>), PlazaError>
where
    V: IdentityVerifier,
    D: SpaceDirectory,
    C: Codec + Clone,
{
    let conn_id = conn.id();

    let frame = match tokio::time::timeout(
        state.gateway.handshake_timeout,
        conn.recv(),
    )
    .await
    {
        Ok(Ok(Some(frame))) => frame,
        Ok(Ok(None)) => {
            return Err(ProtoError::InvalidMessage(
                "connection closed before join".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            send_error(conn, &state.codec, 400, "join timed out").await?;
            return Err(ProtoError::InvalidMessage(
                "join timed out".into(),
            )
            .into());
        }
    };

    let msg: ClientMessage = match state.codec.decode(&frame) {
        Ok(msg) => msg,
        Err(e) => {
            send_error(conn, &state.codec, 400, "malformed frame").await?;
            return Err(e.into());
        }
    };

    let (space_id, token) = match msg {
        ClientMessage::Join { space_id, token } => (space_id, token),
        ClientMessage::Movement { .. } => {
            send_error(conn, &state.codec, 400, "join required").await?;
            return Err(ProtoError::InvalidMessage(
                "first message must be join".into(),
            )
            .into());
        }
    };

    let user_id = match bounded(
        state.gateway.collaborator_timeout,
        state.verifier.verify(&token),
    )
    .await
    {
        Some(Ok(user_id)) => user_id,
        Some(Err(e)) => {
            send_error(conn, &state.codec, 401, "authentication failed")
                .await?;
            return Err(e.into());
        }
        None => {
            send_error(conn, &state.codec, 401, "authentication failed")
                .await?;
            return Err(SessionError::AuthFailed(
                "identity verifier timed out".into(),
            )
            .into());
        }
    };

    let space = match bounded(
        state.gateway.collaborator_timeout,
        state.directory.lookup(&space_id),
    )
    .await
    {
        Some(Ok(space)) => space,
        Some(Err(e)) => {
            // Unknown space and catalog failure look the same to the
            // client, so retries are uniform.
            send_error(conn, &state.codec, 404, "space not found").await?;
            return Err(e.into());
        }
        None => {
            send_error(conn, &state.codec, 404, "space not found").await?;
            return Err(SpaceError::LookupFailed(
                "space directory timed out".into(),
            )
            .into());
        }
    };

    let (sender, outbound) = mpsc::channel(state.outbound_capacity);
    let (room, accept) = match state
        .registry
        .join(&space, user_id.clone(), sender)
        .await
    {
        Ok(ok) => ok,
        Err(e) => {
            send_error(conn, &state.codec, room_error_code(&e), &e.to_string())
                .await?;
            return Err(e.into());
        }
    };

    // Reply before the writer task starts draining the buffer, so the
    // joiner always sees space-joined ahead of any broadcast.
    let reply = ServerMessage::SpaceJoined {
        spawn: accept.spawn,
        users: accept
            .users
            .into_iter()
            .map(|id| UserSummary { id })
            .collect(),
    };
    if let Err(e) = send_message(conn, &state.codec, &reply).await {
        let _ = room.leave(user_id).await;
        return Err(e);
    }

    tracing::info!(
        %conn_id,
        %user_id,
        space_id = %room.space_id(),
        "user joined space"
    );

    Ok((Session::new(user_id, conn_id, room), outbound))
}

/// Runs a collaborator call under the configured bound. `None` means it
/// timed out.
async fn bounded<F: std::future::Future>(
    limit: Duration,
    fut: F,
) -> Option<F::Output> {
    tokio::time::timeout(limit, fut).await.ok()
}

fn room_error_code(e: &RoomError) -> u16 {
    match e {
        RoomError::SpaceFull(_) | RoomError::AlreadyJoined(_, _) => 409,
        RoomError::Closed(_) => 503,
    }
}

async fn send_message<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    msg: &ServerMessage,
) -> Result<(), PlazaError> {
    let frame = codec.encode(msg)?;
    conn.send(&frame).await?;
    Ok(())
}

async fn send_error<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    code: u16,
    message: &str,
) -> Result<(), PlazaError> {
    send_message(
        conn,
        codec,
        &ServerMessage::Error {
            code,
            message: message.to_string(),
        },
    )
    .await
}
