fn main() {
    println!("cargo:rerun-if-changed=../proto/chaindb.proto");

    prost_build::compile_protos(&["../proto/chaindb.proto"], &["../proto"])
        .expect("failed to compile proto/chaindb.proto");
}
