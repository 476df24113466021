//! # CRD Generator
//!
//! Generates the `DummySite` CustomResourceDefinition YAML from the Rust types.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p crds --bin crdgen > config/crd/dummysite.yaml
//! cargo run -p crds --bin crdgen | kubectl apply -f -
//! ```

use crds::DummySite;
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    let yaml = serde_yaml::to_string(&DummySite::crd())?;
    print!("{yaml}");
    Ok(())
}
