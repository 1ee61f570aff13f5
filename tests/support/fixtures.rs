use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Builds an in-memory tar archive from `(path, contents)` pairs.
pub fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *data)
            .expect("append tar entry");
    }
    builder.into_inner().expect("finish tar")
}

/// Same as [`tar_bytes`], gzip-compressed.
pub fn tar_gz_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&tar_bytes(entries))
        .expect("compress tar");
    encoder.finish().expect("finish gzip")
}

/// A small project tarball with a single `ExampleProject-0.1` root.
pub fn project_tarball() -> Vec<u8> {
    tar_gz_bytes(&[
        ("ExampleProject-0.1/README.md", &b"# ExampleProject\n"[..]),
        ("ExampleProject-0.1/src/main.php", &b"<?php echo 'hi';\n"[..]),
        ("ExampleProject-0.1/docs/usage.txt", &b"usage\n"[..]),
    ])
}
