//! # CRD Generator
//!
//! Generates Kubernetes CustomResourceDefinition (CRD) YAML from the Rust type
//! definitions in `schema_registry_controller::crd`.
//!
//! ## Usage
//!
//! ```bash
//! # Generate both CRDs as a multi-document YAML stream
//! cargo run --bin crdgen > config/crd/all.yaml
//!
//! # Generate a single CRD
//! cargo run --bin crdgen -- --kind schema > config/crd/schema.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use clap::{Parser, ValueEnum};
use kube::core::CustomResourceExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use schema_registry_controller::crd::{Schema, SchemaRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    SchemaRegistry,
    Schema,
}

#[derive(Debug, Parser)]
#[command(name = "crdgen", about = "Print the controller's CRDs as YAML")]
struct Cli {
    /// Only print the CRD for this kind (default: all)
    #[arg(long, value_enum)]
    kind: Option<Kind>,
}

fn main() {
    let cli = Cli::parse();

    let crds: Vec<CustomResourceDefinition> = match cli.kind {
        Some(Kind::SchemaRegistry) => vec![SchemaRegistry::crd()],
        Some(Kind::Schema) => vec![Schema::crd()],
        None => vec![SchemaRegistry::crd(), Schema::crd()],
    };

    // Print header comments warning that this file should not be edited manually
    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    println!("# If there are malformed YAML issues, fix them in the Rust code (src/crd/)");
    println!("# This file will be overwritten on every code update");
    println!("#");

    for crd in &crds {
        match serde_yaml::to_string(crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Error serializing CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}
