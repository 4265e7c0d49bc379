//! TCP server: accept loop and per-connection tasks.
//!
//! Each accepted connection runs in its own Tokio task, so a slow client
//! never blocks the others.  Requests on one connection are answered in
//! order.  After a successful `Subscribe` a second task forwards change
//! events onto the same socket; both tasks share the write half behind an
//! async mutex so frames never interleave.
//!
//! Shutdown is driven by the shared `running` flag, checked between accept
//! attempts (see `main.rs`).

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use dms_core::protocol::{encode_frame, AgentId, CodecError, FrameBuffer};
use dms_core::{ChangeEvent, DmError, Request, Response};

use super::handler::RequestHandler;

const READ_CHUNK: usize = 8 * 1024;
const ACCEPT_POLL: Duration = Duration::from_millis(200);

type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the IPC listener.
///
/// # Errors
///
/// Fails when the address is in use or cannot be bound.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind IPC listener on {addr}"))
}

/// Binds `addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Fails only when the listener cannot be bound.
pub async fn run_server(
    handler: Arc<dyn RequestHandler>,
    addr: SocketAddr,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = bind(addr).await?;
    serve(listener, handler, running).await
}

/// Accept loop on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    handler: Arc<dyn RequestHandler>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("IPC server listening on {addr}");
    }

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the flag is re-checked while idle.
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new client connection from {peer_addr}");
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, handler).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

/// Listener registrations owned by one connection.
#[derive(Default)]
struct Session {
    agents: Vec<AgentId>,
    forwarders: Vec<JoinHandle<()>>,
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, handler: Arc<dyn RequestHandler>) {
    let (mut reader, writer) = stream.into_split();
    let writer: SharedWriter = Arc::new(Mutex::new(writer));
    let mut session = Session::default();

    match serve_requests(&mut reader, &writer, handler.as_ref(), &mut session).await {
        Ok(()) => debug!("connection {peer_addr} closed"),
        Err(e) => warn!("connection {peer_addr} closed with error: {e:#}"),
    }

    for agent in session.agents {
        handler.unsubscribe_agent(agent);
    }
    for forwarder in session.forwarders {
        forwarder.abort();
    }
}

async fn serve_requests(
    reader: &mut OwnedReadHalf,
    writer: &SharedWriter,
    handler: &dyn RequestHandler,
    session: &mut Session,
) -> anyhow::Result<()> {
    let mut frames = FrameBuffer::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut buf).await.context("read from client failed")?;
        if n == 0 {
            return Ok(());
        }
        frames.push(&buf[..n]);

        while let Some(request) = frames.next_frame::<Request>()? {
            match request {
                Request::Subscribe { agent, kinds } => match handler.subscribe(agent, &kinds) {
                    Ok(events) => {
                        // Ack first; events published meanwhile wait in the channel.
                        write_response(writer, &Response::Status(Ok(()))).await?;
                        session.agents.push(agent);
                        session
                            .forwarders
                            .push(spawn_forwarder(events, Arc::clone(writer)));
                        info!(%agent, ?kinds, "client subscribed");
                    }
                    Err(e) => write_response(writer, &Response::Status(Err(e))).await?,
                },
                other => {
                    let response = handler.handle(other).await;
                    write_response(writer, &response).await?;
                }
            }
        }
    }
}

fn spawn_forwarder(mut events: UnboundedReceiver<ChangeEvent>, writer: SharedWriter) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Err(e) = write_response(&writer, &Response::Event(event)).await {
                debug!("event forwarding stopped: {e:#}");
                return;
            }
        }
    })
}

async fn write_response(writer: &SharedWriter, response: &Response) -> anyhow::Result<()> {
    let bytes = match encode_frame(response) {
        Ok(bytes) => bytes,
        Err(e @ CodecError::FrameTooLarge { .. }) => {
            warn!("response dropped: {e}");
            encode_frame(&Response::Status(Err(DmError::StateConflict(e.to_string()))))?
        }
        Err(e) => return Err(e.into()),
    };
    writer
        .lock()
        .await
        .write_all(&bytes)
        .await
        .context("write to client failed")
}
