//! Flags command

use std::path::Path;

use anyhow::Result;
use bpk_core::builder::{FanOut, sub_architectures};
use bpk_core::flags::{FlagContext, resolve_flags};
use bpk_core::paths::staging_root;

use crate::Context;

/// Print the build-tool flags.
///
/// A single architecture prints the bare flag list so it can be pasted into
/// a `b2` command line; a universal target prints one `<arch>\t<flags>` line
/// per sub-architecture, in build order.
pub fn flags(ctx: &Context, work_dir: &Path, jobs: usize) -> Result<()> {
    let fan_out = FanOut::for_platform(&ctx.platform);
    let archs = sub_architectures(&ctx.platform, &ctx.recipe.universal_archs)?;
    let root = staging_root(work_dir, fan_out == FanOut::Fanning);
    let flag_ctx = FlagContext {
        libraries: &ctx.recipe.libraries,
        staging_root: &root,
        jobs,
        shim: None,
    };

    for arch in &archs {
        let flag_set = resolve_flags(&ctx.platform.with_arch(arch), &flag_ctx)?;
        match fan_out {
            FanOut::Idle => println!("{flag_set}"),
            FanOut::Fanning => println!("{arch}\t{flag_set}"),
        }
    }
    Ok(())
}
