//! Inbound RPC envelopes and their single-use return path.

use tokio::sync::oneshot;

use super::error::TransportError;
use super::requests::Request;
use super::responses::Response;

/// What the engine hands back for one envelope: either a response of the
/// matching kind, or an error that stays local to this process.
pub type RpcOutcome = std::result::Result<Response, TransportError>;

/// One received request awaiting the engine's answer.
///
/// The connection worker that read the request blocks on the paired
/// receiver until [`Responder::respond`] is called, then writes the
/// answer back on the same connection.
#[derive(Debug)]
pub struct Rpc {
    command: Request,
    responder: Responder,
}

impl Rpc {
    /// Wraps a decoded request, returning the envelope together with the
    /// receiver the connection worker awaits.
    pub fn new(command: Request) -> (Self, oneshot::Receiver<RpcOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Rpc {
                command,
                responder: Responder { tx },
            },
            rx,
        )
    }

    pub fn command(&self) -> &Request {
        &self.command
    }

    /// Splits the envelope when the engine wants to move the request out
    /// and answer later.
    pub fn into_parts(self) -> (Request, Responder) {
        (self.command, self.responder)
    }

    /// Answers the envelope, consuming it.
    pub fn respond(self, outcome: RpcOutcome) {
        self.responder.respond(outcome);
    }
}

/// Write-only handle for answering one [`Rpc`].
///
/// Responding consumes the handle, so a second response to the same
/// envelope cannot be expressed. Dropping the handle unanswered makes
/// the waiting connection worker give up and close its connection.
#[derive(Debug)]
pub struct Responder {
    tx: oneshot::Sender<RpcOutcome>,
}

impl Responder {
    pub fn respond(self, outcome: RpcOutcome) {
        // The worker may have gone away with its connection; nothing to
        // do with the answer then.
        let _ = self.tx.send(outcome);
    }
}
