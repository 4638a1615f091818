// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Writes one CustomResourceDefinition per MySQL operator kind, generated from
//! the types in src/crd.rs, so the manifests never drift from the code.
//!
//! Usage:
//!   cargo run --bin crdgen -- [--output-dir deploy/crds]

use anyhow::{Context, Result};
use clap::Parser;
use kube::CustomResourceExt;
use mysql_operator::crd::{Backup, BackupSchedule, Cluster, Restore};
use std::fs;
use std::path::{Path, PathBuf};

const GENERATED_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# Generated by `cargo run --bin crdgen` from src/crd.rs. Do not edit.
#
";

#[derive(Parser, Debug)]
#[command(name = "crdgen", about = "Generate MySQL operator CRD manifests")]
struct Args {
    /// Directory the manifests are written to
    #[arg(long, default_value = "deploy/crds")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let written = [
        write_crd::<Cluster>(&args.output_dir)?,
        write_crd::<Backup>(&args.output_dir)?,
        write_crd::<BackupSchedule>(&args.output_dir)?,
        write_crd::<Restore>(&args.output_dir)?,
    ];

    for path in &written {
        println!("wrote {}", path.display());
    }
    println!("apply with: kubectl apply -f {}", args.output_dir.display());
    Ok(())
}

/// Write `<plural>.crd.yaml` for `T` and return its path.
fn write_crd<T: CustomResourceExt>(output_dir: &Path) -> Result<PathBuf> {
    let crd = T::crd();
    let path = output_dir.join(format!("{}.crd.yaml", T::api_resource().plural));
    let yaml = serde_yaml::to_string(&crd)
        .with_context(|| format!("encoding {}", T::crd_name()))?;
    fs::write(&path, format!("{GENERATED_HEADER}{yaml}"))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
