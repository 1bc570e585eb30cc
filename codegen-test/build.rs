use std::{env, path::Path};

use openapi2code::{generate_rust, Document, GeneratorConfig};

fn main() {
    println!("cargo:rerun-if-changed=openapi.yaml");
    let out_dir = env::var("OUT_DIR").unwrap();
    let document = Document::from_path(Path::new("openapi.yaml")).unwrap();
    let files = generate_rust(&document, &GeneratorConfig::default())
        .expect("Failed to generate code");
    for file in files {
        // `include!` does not accept inner doc comments
        let content = file
            .content
            .lines()
            .filter(|line| !line.starts_with("//!"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(Path::new(&out_dir).join(&file.file_name), content).unwrap();
    }
}
