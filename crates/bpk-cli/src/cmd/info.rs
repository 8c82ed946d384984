//! Info command

use anyhow::{Context as _, Result};
use bpk_core::metadata::link_metadata;

use crate::Context;

/// Print the link metadata a consumer of this package would use.
pub fn info(ctx: &Context) -> Result<()> {
    let metadata = link_metadata(&ctx.platform, &ctx.recipe.libraries, &ctx.version());
    let json = serde_json::to_string_pretty(&metadata).context("Failed to encode metadata")?;
    println!("{json}");
    Ok(())
}
