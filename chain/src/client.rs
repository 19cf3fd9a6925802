//! Request/reply client (C12): a fresh REQ socket per call. The socket,
//! and its context, are torn down after each reply (or timeout) rather
//! than kept open across calls, matching the reference client's
//! one-shot-per-request discipline.

use tracing::warn;

/// Connects to one server address. Stateless beyond that address: every
/// [`Client::send_message`] call opens and closes its own socket.
pub struct Client {
    address: String,
}

impl Client {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Sends `message` and waits up to `timeout_ms` for a reply. Returns
    /// `None` on timeout, connection failure, or any socket-level error —
    /// callers cannot distinguish these cases, matching the reference
    /// client's boolean success/failure contract.
    pub fn send_message(&self, message: &[u8], timeout_ms: i32) -> Option<Vec<u8>> {
        let ctx = zmq::Context::new();
        let socket = match ctx.socket(zmq::REQ) {
            Ok(s) => s,
            Err(e) => {
                warn!("failed to create socket: {e}");
                return None;
            }
        };

        if socket.set_rcvtimeo(timeout_ms).is_err()
            || socket.set_sndtimeo(timeout_ms).is_err()
            || socket.set_linger(0).is_err()
        {
            warn!("failed to configure socket options");
            return None;
        }

        if let Err(e) = socket.connect(&self.address) {
            warn!("failed to connect to {}: {e}", self.address);
            return None;
        }

        if let Err(e) = socket.send(message, 0) {
            warn!("failed to send request: {e}");
            return None;
        }

        match socket.recv_bytes(0) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("no reply from {}: {e}", self.address);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::manager::Manager;
    use crate::server::Server;
    use prost::Message as _;
    use std::sync::atomic::Ordering;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[test]
    fn send_message_round_trips_through_a_real_server() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(Manager::new(tmp.path()), String::new());
        let port = free_port();
        let server = Server::new(dispatcher, port);
        let stop = server.stop_flag();

        let handle = thread::spawn(move || server.run());
        thread::sleep(Duration::from_millis(100));

        let client = Client::new(format!("tcp://127.0.0.1:{port}"));
        let request = crate::pb::Request {
            auth_data: None,
            kind: Some(crate::pb::request::Kind::PingRequest(crate::pb::PingRequest {})),
        };
        let reply = client
            .send_message(&request.encode_to_vec(), 1000)
            .expect("expected a reply");

        let response = crate::pb::Response::decode(reply.as_slice()).unwrap();
        assert_eq!(response.status.unwrap().status, 0);

        stop.store(true, Ordering::SeqCst);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn send_message_times_out_against_nothing_listening() {
        let client = Client::new("tcp://127.0.0.1:1".to_string());
        assert!(client.send_message(b"anything", 200).is_none());
    }
}
