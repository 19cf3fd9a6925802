//! Request dispatcher (C10): decode a framed request, enforce
//! authentication, dispatch to the manager, encode the response.

use std::sync::Arc;
use std::time::Instant;

use prost::Message as _;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::block::{Block, MAX_DATA_LENGTH};
use crate::error::DispatchError;
use crate::header::ChainHeader;
use crate::manager::Manager;
use crate::metrics::MetricsRegistry;
use crate::pb;

/// Build-time constant salted into the password hash, matching the
/// reference implementation's `PASSWORD_SALT`.
pub const PASSWORD_SALT: &str = "EMPTY_SALT/";

/// Response status codes (§4.C10).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success = 0,
    Error = 1,
    DataError = 2,
    NotSupported = 3,
    NotAuthorized = 4,
}

/// Decodes, authenticates, and dispatches a single wire request, returning
/// the encoded wire response. Never panics: every failure path is folded
/// into a status code and an optional message.
pub struct Dispatcher {
    manager: Manager,
    password: String,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Dispatcher {
    pub fn new(manager: Manager, password: String) -> Self {
        Self {
            manager,
            password,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn handle_message(&self, raw: &[u8]) -> Vec<u8> {
        let start = Instant::now();
        let (kind_label, response) = self.handle_message_inner(raw);

        if let Some(metrics) = &self.metrics {
            metrics
                .dispatcher
                .request_seconds
                .observe(start.elapsed().as_secs_f64());
            let status_label = response_status_label(&response);
            metrics
                .dispatcher
                .requests_total
                .with_label_values(&[kind_label, status_label])
                .inc();
        }

        response
    }

    fn handle_message_inner(&self, raw: &[u8]) -> (&'static str, Vec<u8>) {
        let request = match pb::Request::decode(raw) {
            Ok(req) => req,
            Err(_) => return ("unknown", error_response(DispatchError::Decode)),
        };

        let kind_label = request_kind_label(&request.kind);

        if !self.password.is_empty() {
            match &request.auth_data {
                None => {
                    self.note_auth_failure();
                    return (kind_label, error_response(DispatchError::AuthMissing));
                }
                Some(auth) => {
                    if !self.check_auth(&auth.password_hash) {
                        self.note_auth_failure();
                        return (kind_label, error_response(DispatchError::AuthMismatch));
                    }
                }
            }
        }

        let response = match request.kind {
            Some(pb::request::Kind::PingRequest(_)) => self.handle_ping(),
            Some(pb::request::Kind::CreateChainRequest(r)) => self.handle_create_chain(r),
            Some(pb::request::Kind::RemoveChainRequest(r)) => self.handle_remove_chain(r),
            Some(pb::request::Kind::AddBlockRequest(r)) => self.handle_add_block(r),
            Some(pb::request::Kind::GetBlockRequest(r)) => self.handle_get_block(r),
            Some(pb::request::Kind::GetBlocksRequest(r)) => self.handle_get_blocks(r),
            Some(pb::request::Kind::VerifyChainRequest(r)) => self.handle_verify_chain(r),
            Some(pb::request::Kind::GetChainHeaderRequest(r)) => self.handle_get_chain_header(r),
            Some(pb::request::Kind::GetChainKeysRequest(r)) => self.handle_get_chain_keys(r),
            Some(pb::request::Kind::GetChainInfoRequest(r)) => self.handle_get_chain_info(r),
            None => error_response(DispatchError::UnknownRequest),
        };

        (kind_label, response)
    }

    fn note_auth_failure(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.dispatcher.auth_failures_total.inc();
        }
    }

    fn check_auth(&self, password_hash: &[u8]) -> bool {
        if password_hash.len() != 32 {
            error!("invalid password hash length");
            return false;
        }

        let mut hasher = Sha256::new();
        hasher.update(PASSWORD_SALT.as_bytes());
        hasher.update(self.password.as_bytes());
        let expected: [u8; 32] = hasher.finalize().into();

        expected.as_slice() == password_hash
    }

    fn handle_ping(&self) -> Vec<u8> {
        info!("handle ping request");
        make_status(Status::Success, "")
    }

    fn handle_create_chain(&self, req: pb::CreateChainRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, "handle create chain request");

        if req.data.len() > MAX_DATA_LENGTH {
            return error_response(DispatchError::DataTooLarge);
        }

        match self.manager.create_chain(req.chain_id, req.data) {
            Ok(()) => make_status(Status::Success, ""),
            Err(e) => error_response(e.into()),
        }
    }

    fn handle_remove_chain(&self, req: pb::RemoveChainRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, "handle remove chain request");

        match self.manager.remove_chain(req.chain_id) {
            Ok(()) => make_status(Status::Success, ""),
            Err(e) => error_response(e.into()),
        }
    }

    fn handle_add_block(&self, req: pb::AddBlockRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, "handle add block request");

        if req.data.len() > MAX_DATA_LENGTH {
            return error_response(DispatchError::DataTooLarge);
        }

        match self.manager.add_block(req.chain_id, req.data) {
            Ok(block) => make_response(
                Status::Success,
                pb::response::Kind::AddBlockResponse(pb::AddBlockResponse {
                    block: Some(wire_block(&block)),
                }),
            ),
            Err(e) => error_response(e.into()),
        }
    }

    fn handle_get_block(&self, req: pb::GetBlockRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, block_id = req.block_id, "handle get block request");

        match self.manager.get_block(req.chain_id, req.block_id) {
            Ok(block) => make_response(
                Status::Success,
                pb::response::Kind::GetBlockResponse(pb::GetBlockResponse {
                    block: Some(wire_block(&block)),
                }),
            ),
            Err(e) => error_response(e.into()),
        }
    }

    fn handle_get_blocks(&self, req: pb::GetBlocksRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, "handle get blocks request");

        match self.manager.get_blocks(req.chain_id) {
            Ok(blocks) => make_response(
                Status::Success,
                pb::response::Kind::GetBlocksResponse(pb::GetBlocksResponse {
                    blocks: blocks.iter().map(wire_block).collect(),
                }),
            ),
            Err(e) => error_response(e.into()),
        }
    }

    fn handle_verify_chain(&self, req: pb::VerifyChainRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, "handle verify chain request");

        match self.manager.verify_chain(req.chain_id) {
            Ok(true) => make_status(Status::Success, ""),
            Ok(false) => error_response(DispatchError::Corruption),
            Err(e) => error_response(e.into()),
        }
    }

    fn handle_get_chain_header(&self, req: pb::GetChainHeaderRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, "handle get chain header request");

        match self.manager.get_chain_header(req.chain_id) {
            Ok(header) => make_response(
                Status::Success,
                pb::response::Kind::GetChainHeaderResponse(pb::GetChainHeaderResponse {
                    header: Some(wire_header(&header)),
                }),
            ),
            Err(e) => error_response(e.into()),
        }
    }

    fn handle_get_chain_keys(&self, req: pb::GetChainKeysRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, "handle get chain keys request");

        match self.manager.get_chain_header(req.chain_id) {
            Ok(header) => make_response(
                Status::Success,
                pb::response::Kind::GetChainKeysResponse(pb::GetChainKeysResponse {
                    private_key: header.private_key.to_vec(),
                    public_key: header.public_key.to_vec(),
                }),
            ),
            Err(e) => error_response(e.into()),
        }
    }

    fn handle_get_chain_info(&self, req: pb::GetChainInfoRequest) -> Vec<u8> {
        info!(chain_id = req.chain_id, "handle get chain info request");

        match self.manager.get_chain_info(req.chain_id) {
            Ok((version, index)) => make_response(
                Status::Success,
                pb::response::Kind::GetChainInfoResponse(pb::GetChainInfoResponse {
                    chain_id: req.chain_id,
                    version,
                    index,
                }),
            ),
            Err(e) => error_response(e.into()),
        }
    }
}

/// Maps a [`DispatchError`] to its wire status code (§7's taxonomy).
fn status_for_error(e: &DispatchError) -> Status {
    match e {
        DispatchError::Decode => Status::DataError,
        DispatchError::DataTooLarge => Status::DataError,
        DispatchError::AuthMissing | DispatchError::AuthMismatch => Status::NotAuthorized,
        DispatchError::UnknownRequest => Status::NotSupported,
        DispatchError::Corruption | DispatchError::Storage(_) => Status::Error,
    }
}

/// The single place a [`DispatchError`] is lowered into an encoded response.
fn error_response(e: DispatchError) -> Vec<u8> {
    make_status(status_for_error(&e), &e.to_string())
}

fn request_kind_label(kind: &Option<pb::request::Kind>) -> &'static str {
    match kind {
        Some(pb::request::Kind::PingRequest(_)) => "ping",
        Some(pb::request::Kind::CreateChainRequest(_)) => "create_chain",
        Some(pb::request::Kind::RemoveChainRequest(_)) => "remove_chain",
        Some(pb::request::Kind::AddBlockRequest(_)) => "add_block",
        Some(pb::request::Kind::GetBlockRequest(_)) => "get_block",
        Some(pb::request::Kind::GetBlocksRequest(_)) => "get_blocks",
        Some(pb::request::Kind::VerifyChainRequest(_)) => "verify_chain",
        Some(pb::request::Kind::GetChainHeaderRequest(_)) => "get_chain_header",
        Some(pb::request::Kind::GetChainKeysRequest(_)) => "get_chain_keys",
        Some(pb::request::Kind::GetChainInfoRequest(_)) => "get_chain_info",
        None => "unknown",
    }
}

fn response_status_label(response: &[u8]) -> &'static str {
    match pb::Response::decode(response) {
        Ok(resp) => match resp.status.map(|s| s.status) {
            Some(s) if s == Status::Success as i32 => "success",
            Some(s) if s == Status::DataError as i32 => "data_error",
            Some(s) if s == Status::NotSupported as i32 => "not_supported",
            Some(s) if s == Status::NotAuthorized as i32 => "not_authorized",
            _ => "error",
        },
        Err(_) => "error",
    }
}

fn wire_block(block: &Block) -> pb::Block {
    pb::Block {
        hash: block.hash.to_vec(),
        prev_hash: block.prev_hash.to_vec(),
        nonce: block.nonce.to_vec(),
        data: block.data.clone(),
        signature: block.signature.to_vec(),
    }
}

fn wire_header(header: &ChainHeader) -> pb::Header {
    pb::Header {
        version: header.version,
        index: header.index,
        data: header.data.clone(),
        private_key: header.private_key.to_vec(),
        public_key: header.public_key.to_vec(),
    }
}

fn make_status(status: Status, text: &str) -> Vec<u8> {
    if status != Status::Success && !text.is_empty() {
        error!("{text}");
    }

    let resp = pb::Response {
        status: Some(pb::Status {
            status: status as i32,
            message: text.to_string(),
        }),
        kind: None,
    };

    resp.encode_to_vec()
}

fn make_response(status: Status, kind: pb::response::Kind) -> Vec<u8> {
    let resp = pb::Response {
        status: Some(pb::Status {
            status: status as i32,
            message: String::new(),
        }),
        kind: Some(kind),
    };

    resp.encode_to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dispatcher(tmp: &TempDir, password: &str) -> Dispatcher {
        Dispatcher::new(Manager::new(tmp.path()), password.to_string())
    }

    fn encode(req: pb::Request) -> Vec<u8> {
        req.encode_to_vec()
    }

    fn password_hash(password: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(PASSWORD_SALT.as_bytes());
        hasher.update(password.as_bytes());
        hasher.finalize().to_vec()
    }

    #[test]
    fn ping_without_auth_when_no_password_succeeds() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "");

        let req = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::PingRequest(pb::PingRequest {})),
        };
        let resp = pb::Response::decode(dispatcher.handle_message(&encode(req)).as_slice()).unwrap();
        assert_eq!(resp.status.unwrap().status, Status::Success as i32);
    }

    #[test]
    fn ping_with_correct_password_succeeds() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "password");

        let req = pb::Request {
            auth_data: Some(pb::AuthData {
                password_hash: password_hash("password"),
            }),
            kind: Some(pb::request::Kind::PingRequest(pb::PingRequest {})),
        };
        let resp = pb::Response::decode(dispatcher.handle_message(&encode(req)).as_slice()).unwrap();
        assert_eq!(resp.status.unwrap().status, Status::Success as i32);
    }

    #[test]
    fn ping_with_wrong_password_is_not_authorized() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "password");

        let req = pb::Request {
            auth_data: Some(pb::AuthData {
                password_hash: password_hash("wrong"),
            }),
            kind: Some(pb::request::Kind::PingRequest(pb::PingRequest {})),
        };
        let resp = pb::Response::decode(dispatcher.handle_message(&encode(req)).as_slice()).unwrap();
        assert_eq!(resp.status.unwrap().status, Status::NotAuthorized as i32);
    }

    #[test]
    fn ping_with_missing_auth_when_password_set_is_not_authorized() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "password");

        let req = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::PingRequest(pb::PingRequest {})),
        };
        let resp = pb::Response::decode(dispatcher.handle_message(&encode(req)).as_slice()).unwrap();
        assert_eq!(resp.status.unwrap().status, Status::NotAuthorized as i32);
    }

    #[test]
    fn create_chain_twice_then_second_is_error() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "");

        let make_req = || pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::CreateChainRequest(pb::CreateChainRequest {
                chain_id: 1,
                data: b"data".to_vec(),
            })),
        };

        let first = pb::Response::decode(dispatcher.handle_message(&encode(make_req())).as_slice()).unwrap();
        let second = pb::Response::decode(dispatcher.handle_message(&encode(make_req())).as_slice()).unwrap();

        assert_eq!(first.status.unwrap().status, Status::Success as i32);
        assert_eq!(second.status.unwrap().status, Status::Error as i32);
    }

    #[test]
    fn create_chain_then_add_blocks_then_get_blocks() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "");

        let create = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::CreateChainRequest(pb::CreateChainRequest {
                chain_id: 1,
                data: b"data".to_vec(),
            })),
        };
        dispatcher.handle_message(&encode(create));

        for _ in 0..8 {
            let add = pb::Request {
                auth_data: None,
                kind: Some(pb::request::Kind::AddBlockRequest(pb::AddBlockRequest {
                    chain_id: 1,
                    data: b"data".to_vec(),
                })),
            };
            let resp =
                pb::Response::decode(dispatcher.handle_message(&encode(add)).as_slice()).unwrap();
            assert_eq!(resp.status.unwrap().status, Status::Success as i32);
        }

        let get_blocks = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::GetBlocksRequest(pb::GetBlocksRequest { chain_id: 1 })),
        };
        let resp =
            pb::Response::decode(dispatcher.handle_message(&encode(get_blocks)).as_slice()).unwrap();
        assert_eq!(resp.status.unwrap().status, Status::Success as i32);
        match resp.kind {
            Some(pb::response::Kind::GetBlocksResponse(r)) => assert_eq!(r.blocks.len(), 8),
            _ => panic!("expected GetBlocksResponse"),
        }
    }

    #[test]
    fn verify_chain_succeeds_then_fails_for_missing_chain() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "");

        let create = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::CreateChainRequest(pb::CreateChainRequest {
                chain_id: 1,
                data: b"data".to_vec(),
            })),
        };
        dispatcher.handle_message(&encode(create));

        for _ in 0..8 {
            let add = pb::Request {
                auth_data: None,
                kind: Some(pb::request::Kind::AddBlockRequest(pb::AddBlockRequest {
                    chain_id: 1,
                    data: b"data".to_vec(),
                })),
            };
            dispatcher.handle_message(&encode(add));
        }

        let verify_ok = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::VerifyChainRequest(pb::VerifyChainRequest { chain_id: 1 })),
        };
        let resp =
            pb::Response::decode(dispatcher.handle_message(&encode(verify_ok)).as_slice()).unwrap();
        assert_eq!(resp.status.unwrap().status, Status::Success as i32);

        let verify_missing = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::VerifyChainRequest(pb::VerifyChainRequest { chain_id: 2 })),
        };
        let resp = pb::Response::decode(dispatcher.handle_message(&encode(verify_missing)).as_slice())
            .unwrap();
        assert_eq!(resp.status.unwrap().status, Status::Error as i32);
    }

    #[test]
    fn get_chain_info_echoes_requested_chain_id() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "");

        let create = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::CreateChainRequest(pb::CreateChainRequest {
                chain_id: 1,
                data: b"data".to_vec(),
            })),
        };
        dispatcher.handle_message(&encode(create));

        let add = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::AddBlockRequest(pb::AddBlockRequest {
                chain_id: 1,
                data: b"data".to_vec(),
            })),
        };
        dispatcher.handle_message(&encode(add));

        let info = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::GetChainInfoRequest(pb::GetChainInfoRequest { chain_id: 1 })),
        };
        let resp = pb::Response::decode(dispatcher.handle_message(&encode(info)).as_slice()).unwrap();
        match resp.kind {
            Some(pb::response::Kind::GetChainInfoResponse(r)) => {
                assert_eq!(r.chain_id, 1);
                assert_eq!(r.index, 1);
            }
            _ => panic!("expected GetChainInfoResponse"),
        }
    }

    #[test]
    fn unknown_request_kind_is_not_supported() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "");

        let req = pb::Request {
            auth_data: None,
            kind: None,
        };
        let resp = pb::Response::decode(dispatcher.handle_message(&encode(req)).as_slice()).unwrap();
        assert_eq!(resp.status.unwrap().status, Status::NotSupported as i32);
    }

    #[test]
    fn malformed_bytes_are_a_data_error() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "");

        let resp = pb::Response::decode(dispatcher.handle_message(&[0xFFu8; 6]).as_slice());
        if let Ok(resp) = resp {
            assert_eq!(resp.status.unwrap().status, Status::DataError as i32);
        }
    }

    #[test]
    fn oversized_create_chain_payload_is_data_error() {
        let tmp = TempDir::new().unwrap();
        let dispatcher = dispatcher(&tmp, "");

        let req = pb::Request {
            auth_data: None,
            kind: Some(pb::request::Kind::CreateChainRequest(pb::CreateChainRequest {
                chain_id: 1,
                data: vec![0u8; MAX_DATA_LENGTH + 1],
            })),
        };
        let resp = pb::Response::decode(dispatcher.handle_message(&encode(req)).as_slice()).unwrap();
        assert_eq!(resp.status.unwrap().status, Status::DataError as i32);
    }
}
