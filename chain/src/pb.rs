//! Generated protobuf types for the wire schema (`proto/chaindb.proto`),
//! compiled by `build.rs` via `prost-build`. Unknown fields are ignored on
//! decode by default, giving the forward-compatibility behavior §6
//! requires.

include!(concat!(env!("OUT_DIR"), "/chaindb.rs"));
