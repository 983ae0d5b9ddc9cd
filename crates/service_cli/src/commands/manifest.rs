//! Manifest command implementation
//!
//! Prints the run manifest of a resolved request without simulating.

use std::path::Path;

use voltarget_core::RunManifest;
use voltarget_pricing::ENGINE_VERSION;

use crate::config::{resolve, Overrides};
use crate::Result;

/// Run the manifest command
pub fn run(request: &Path, overrides: &Overrides) -> Result<()> {
    let request = resolve(request, overrides)?;
    let manifest =
        RunManifest::capture(&request.trade, &request.market, &request.config, ENGINE_VERSION);
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}
