//! `chain-cli` binary: a thin command-line peer that issues exactly one
//! request per invocation and prints the decoded reply, mirroring the
//! reference `Application`'s one-shot request builders.

use clap::{ArgGroup, Parser};
use prost::Message as _;
use sha2::{Digest, Sha256};

use chain::dispatcher::PASSWORD_SALT;
use chain::pb;

#[derive(Debug, Parser)]
#[command(name = "chain-cli", about = "Command-line peer for the chain server")]
#[command(group(
    ArgGroup::new("request_kind")
        .required(true)
        .args([
            "ping", "create_chain", "remove_chain", "add_block", "get_block",
            "get_blocks", "verify_chain", "get_header", "get_keys", "get_info",
        ])
))]
struct Cli {
    /// Server host.
    #[arg(long, default_value = "127.0.0.1")]
    addr: String,

    /// Server port.
    #[arg(long, default_value_t = 8888)]
    port: u16,

    /// Reply timeout, in seconds.
    #[arg(long, default_value_t = 1)]
    timeout: u64,

    /// Target chain ID.
    #[arg(long, default_value_t = 1)]
    chain_id: u64,

    /// Target block ID (for `--get-block`).
    #[arg(long, default_value_t = 1)]
    block_id: u64,

    /// Shared secret; must match the server's `--password`.
    #[arg(long, default_value = "")]
    password: String,

    /// Payload for `--create-chain`/`--add-block`.
    #[arg(long, default_value = "{}")]
    data: String,

    #[arg(long)]
    ping: bool,
    #[arg(long)]
    create_chain: bool,
    #[arg(long)]
    remove_chain: bool,
    #[arg(long)]
    add_block: bool,
    #[arg(long)]
    get_block: bool,
    #[arg(long)]
    get_blocks: bool,
    #[arg(long)]
    verify_chain: bool,
    #[arg(long)]
    get_header: bool,
    #[arg(long)]
    get_keys: bool,
    #[arg(long)]
    get_info: bool,
}

impl Cli {
    fn auth_data(&self) -> Option<pb::AuthData> {
        if self.password.is_empty() {
            return None;
        }

        let mut hasher = Sha256::new();
        hasher.update(PASSWORD_SALT.as_bytes());
        hasher.update(self.password.as_bytes());

        Some(pb::AuthData {
            password_hash: hasher.finalize().to_vec(),
        })
    }

    fn build_request(&self) -> pb::Request {
        let kind = if self.ping {
            pb::request::Kind::PingRequest(pb::PingRequest {})
        } else if self.create_chain {
            pb::request::Kind::CreateChainRequest(pb::CreateChainRequest {
                chain_id: self.chain_id,
                data: self.data.clone().into_bytes(),
            })
        } else if self.remove_chain {
            pb::request::Kind::RemoveChainRequest(pb::RemoveChainRequest {
                chain_id: self.chain_id,
            })
        } else if self.add_block {
            pb::request::Kind::AddBlockRequest(pb::AddBlockRequest {
                chain_id: self.chain_id,
                data: self.data.clone().into_bytes(),
            })
        } else if self.get_block {
            pb::request::Kind::GetBlockRequest(pb::GetBlockRequest {
                chain_id: self.chain_id,
                block_id: self.block_id,
            })
        } else if self.get_blocks {
            pb::request::Kind::GetBlocksRequest(pb::GetBlocksRequest {
                chain_id: self.chain_id,
            })
        } else if self.verify_chain {
            pb::request::Kind::VerifyChainRequest(pb::VerifyChainRequest {
                chain_id: self.chain_id,
            })
        } else if self.get_header {
            pb::request::Kind::GetChainHeaderRequest(pb::GetChainHeaderRequest {
                chain_id: self.chain_id,
            })
        } else if self.get_keys {
            pb::request::Kind::GetChainKeysRequest(pb::GetChainKeysRequest {
                chain_id: self.chain_id,
            })
        } else {
            pb::request::Kind::GetChainInfoRequest(pb::GetChainInfoRequest {
                chain_id: self.chain_id,
            })
        };

        pb::Request {
            auth_data: self.auth_data(),
            kind: Some(kind),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "cli=info".to_string()))
        .init();

    let cli = Cli::parse();
    let request = cli.build_request();

    let address = format!("tcp://{}:{}", cli.addr, cli.port);
    let client = chain::client::Client::new(address);
    let timeout_ms = (cli.timeout.max(1) * 1000) as i32;

    let encoded = request.encode_to_vec();
    let reply = match client.send_message(&encoded, timeout_ms) {
        Some(bytes) => bytes,
        None => {
            tracing::error!("no reply from server within {} seconds", cli.timeout);
            std::process::exit(1);
        }
    };

    let response = match pb::Response::decode(reply.as_slice()) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("failed to decode server response: {e}");
            std::process::exit(1);
        }
    };

    print_response(&response);

    let success = response.status.as_ref().map(|s| s.status == 0).unwrap_or(false);
    if !success {
        std::process::exit(1);
    }
}

fn print_response(response: &pb::Response) {
    if let Some(status) = &response.status {
        if !status.message.is_empty() {
            println!("status: {} ({})", status.status, status.message);
        } else {
            println!("status: {}", status.status);
        }
    }

    match &response.kind {
        Some(pb::response::Kind::AddBlockResponse(r)) => print_block(r.block.as_ref()),
        Some(pb::response::Kind::GetBlockResponse(r)) => print_block(r.block.as_ref()),
        Some(pb::response::Kind::GetBlocksResponse(r)) => {
            for block in &r.blocks {
                print_block(Some(block));
            }
        }
        Some(pb::response::Kind::GetChainHeaderResponse(r)) => {
            if let Some(header) = &r.header {
                println!(
                    "version={} index={} data={} private_key={} public_key={}",
                    header.version,
                    header.index,
                    hex::encode(&header.data),
                    hex::encode(&header.private_key),
                    hex::encode(&header.public_key),
                );
            }
        }
        Some(pb::response::Kind::GetChainKeysResponse(r)) => {
            println!(
                "private_key={} public_key={}",
                hex::encode(&r.private_key),
                hex::encode(&r.public_key),
            );
        }
        Some(pb::response::Kind::GetChainInfoResponse(r)) => {
            println!("chain_id={} version={} index={}", r.chain_id, r.version, r.index);
        }
        _ => {}
    }
}

fn print_block(block: Option<&pb::Block>) {
    if let Some(block) = block {
        println!(
            "hash={} prev_hash={} nonce={} data={} signature={}",
            hex::encode(&block.hash),
            hex::encode(&block.prev_hash),
            hex::encode(&block.nonce),
            hex::encode(&block.data),
            hex::encode(&block.signature),
        );
    }
}
