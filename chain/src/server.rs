//! Request/reply server (C11): a single REP socket bound to `tcp://*:<port>`,
//! polled on a short interval so an external stop signal is honored
//! promptly without blocking indefinitely in `recv`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::dispatcher::Dispatcher;

/// Poll timeout, matching the reference implementation's 5ms tick.
const POLL_TIMEOUT_MS: i64 = 5;

/// Owns the REP socket and the stop flag. `run` blocks the calling thread;
/// callers typically spawn it on a dedicated OS thread and keep the
/// [`Arc<AtomicBool>`] from [`Server::stop_flag`] to signal shutdown from a
/// signal handler.
pub struct Server {
    dispatcher: Dispatcher,
    port: u16,
    stop: Arc<AtomicBool>,
}

impl Server {
    pub fn new(dispatcher: Dispatcher, port: u16) -> Self {
        Self {
            dispatcher,
            port,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Binds the socket and runs the receive-dispatch-send loop until
    /// `stop()` is observed. Exactly one send follows each successful
    /// receive, as the REQ/REP pattern requires.
    pub fn run(&self) -> Result<(), zmq::Error> {
        let ctx = zmq::Context::new();
        let socket = ctx.socket(zmq::REP)?;
        socket.bind(&format!("tcp://*:{}", self.port))?;
        info!(port = self.port, "server listening");

        while !self.stop.load(Ordering::SeqCst) {
            let mut items = [socket.as_poll_item(zmq::POLLIN)];
            match zmq::poll(&mut items, POLL_TIMEOUT_MS) {
                Ok(n) if n > 0 && items[0].is_readable() => {
                    let request = match socket.recv_bytes(0) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            error!("recv error: {e}");
                            break;
                        }
                    };

                    let response = self.dispatcher.handle_message(&request);

                    if let Err(e) = socket.send(response, 0) {
                        warn!("send error: {e}");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("poll error: {e}");
                    break;
                }
            }
        }

        info!("server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::Manager;
    use prost::Message as _;
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
    fn server_answers_ping_and_stops_cleanly() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(Manager::new(tmp.path()), String::new());
        let port = free_port();
        let server = Server::new(dispatcher, port);
        let stop = server.stop_flag();

        let handle = thread::spawn(move || server.run());

        thread::sleep(Duration::from_millis(100));

        let ctx = zmq::Context::new();
        let client = ctx.socket(zmq::REQ).unwrap();
        client.set_rcvtimeo(2000).unwrap();
        client.connect(&format!("tcp://127.0.0.1:{port}")).unwrap();

        let request = crate::pb::Request {
            auth_data: None,
            kind: Some(crate::pb::request::Kind::PingRequest(crate::pb::PingRequest {})),
        };
        client.send(request.encode_to_vec(), 0).unwrap();
        let reply = client.recv_bytes(0).unwrap();
        let response = crate::pb::Response::decode(reply.as_slice()).unwrap();
        assert_eq!(response.status.unwrap().status, 0);

        stop.store(true, Ordering::SeqCst);
        handle.join().unwrap().unwrap();
    }
}
