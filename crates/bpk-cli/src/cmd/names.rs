//! Names command

use anyhow::Result;
use bpk_core::naming::expected_files;

use crate::Context;

/// Print the files each library is expected to produce, one per line.
pub fn names(ctx: &Context) -> Result<()> {
    let version = ctx.version();
    for library in &ctx.recipe.libraries {
        for file in expected_files(&ctx.platform, library, &version) {
            println!("{file}");
        }
    }
    Ok(())
}
