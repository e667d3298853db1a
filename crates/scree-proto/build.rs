fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use protoc-bin-vendored to avoid needing protoc installed
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/scree.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/scree.proto");
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
