//! Toolchain shims for non-Visual Studio compilers.
//!
//! The build tool picks up whatever compiler it finds unless told otherwise.
//! To pin the compiler and flags chosen by the caller, we write:
//!
//! 1. `<toolset>-wrapper.sh`: runs the real compiler with the caller's
//!    arguments, then the ambient compile flags, then a fixed per-family
//!    suffix.
//! 2. `user-config.jam`: declares the toolset against that wrapper and adds
//!    the ambient link flags.
//!
//! The config is handed to the build tool through `BOOST_BUILD_USER_CONFIG`
//! on the build invocation only.

use std::path::{Path, PathBuf};

use bpk_schema::{Compiler, CompilerFamily};

use crate::error::BuildError;

/// File name of the generated build-system config fragment.
pub const USER_CONFIG_FILE: &str = "user-config.jam";

/// Environment variable the build tool reads the user config path from.
pub const USER_CONFIG_ENV: &str = "BOOST_BUILD_USER_CONFIG";

/// Compiler selection captured from the caller's environment.
///
/// The core never reads the process environment itself; the CLI fills this
/// in from `CXX`, `CXXFLAGS` and `LDFLAGS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainEnv {
    /// Compiler driver path (`CXX`).
    pub cxx: Option<String>,
    /// Extra compile flags (`CXXFLAGS`).
    pub cxxflags: Option<String>,
    /// Extra link flags (`LDFLAGS`).
    pub ldflags: Option<String>,
}

/// Files written for a custom toolset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainShim {
    /// Toolset name to pass as `toolset=`.
    pub toolset: String,
    /// Executable compiler wrapper.
    pub wrapper: PathBuf,
    /// Config fragment declaring the toolset.
    pub user_config: PathBuf,
}

/// Flags appended after the caller's flags for a compiler family.
///
/// Only clang is noisy enough about unused local typedefs in the library
/// headers to warrant silencing.
pub fn family_suffix(family: CompilerFamily) -> &'static [&'static str] {
    match family {
        CompilerFamily::Clang | CompilerFamily::AppleClang => &["-Wno-unused-local-typedef"],
        CompilerFamily::Gcc | CompilerFamily::VisualStudio => &[],
    }
}

/// Write the wrapper script and user config into `work_dir`.
///
/// # Errors
///
/// Returns [`BuildError::Io`] if either file cannot be written or the
/// wrapper cannot be made executable.
pub fn write_shim(
    work_dir: &Path,
    compiler: &Compiler,
    env: &ToolchainEnv,
) -> Result<ToolchainShim, BuildError> {
    let toolset = compiler.family.toolset_module().to_string();
    std::fs::create_dir_all(work_dir)?;

    let driver = resolve_driver(compiler.family, env);
    let wrapper = work_dir.join(format!("{toolset}-wrapper.sh"));
    std::fs::write(&wrapper, wrapper_script(&driver, compiler.family, env))?;
    make_executable(&wrapper)?;

    let user_config = work_dir.join(USER_CONFIG_FILE);
    std::fs::write(&user_config, user_config_fragment(&toolset, &wrapper, env))?;

    tracing::debug!(
        toolset = %toolset,
        driver = %driver,
        wrapper = %wrapper.display(),
        "wrote toolchain shim"
    );

    Ok(ToolchainShim {
        toolset,
        wrapper,
        user_config,
    })
}

/// `CXX` if given, else the family's default driver found on `PATH`, else
/// the bare driver name.
fn resolve_driver(family: CompilerFamily, env: &ToolchainEnv) -> String {
    if let Some(cxx) = env.cxx.as_deref().filter(|c| !c.trim().is_empty()) {
        return cxx.trim().to_string();
    }
    let name = family.default_driver();
    which::which(name).map_or_else(|_| name.to_string(), |p| p.display().to_string())
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn wrapper_script(driver: &str, family: CompilerFamily, env: &ToolchainEnv) -> String {
    let mut line = format!("exec \"{driver}\" \"$@\"");
    if let Some(cxxflags) = non_empty(env.cxxflags.as_ref()) {
        line.push(' ');
        line.push_str(cxxflags);
    }
    for flag in family_suffix(family) {
        line.push(' ');
        line.push_str(flag);
    }
    format!("#!/bin/sh\n{line}\n")
}

fn user_config_fragment(toolset: &str, wrapper: &Path, env: &ToolchainEnv) -> String {
    let mut decl = format!("using {toolset} : : \"{}\"", wrapper.display());
    if let Some(ldflags) = non_empty(env.ldflags.as_ref()) {
        decl.push_str(&format!(" : <linkflags>\"{}\"", ldflags.replace('"', "\\\"")));
    }
    format!("{decl} ;\n")
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env(cxx: &str, cxxflags: &str, ldflags: &str) -> ToolchainEnv {
        ToolchainEnv {
            cxx: Some(cxx.to_string()),
            cxxflags: Some(cxxflags.to_string()),
            ldflags: Some(ldflags.to_string()),
        }
    }

    #[test]
    fn test_clang_wrapper_suppresses_typedef_warning() {
        let tmp = tempdir().unwrap();
        let shim = write_shim(
            tmp.path(),
            &Compiler::new(CompilerFamily::AppleClang, 9),
            &env("/usr/bin/clang++", "-O2 -arch arm64", "-arch arm64"),
        )
        .unwrap();

        assert_eq!(shim.toolset, "clang");
        let script = std::fs::read_to_string(&shim.wrapper).unwrap();
        assert_eq!(
            script,
            "#!/bin/sh\nexec \"/usr/bin/clang++\" \"$@\" -O2 -arch arm64 -Wno-unused-local-typedef\n"
        );
    }

    #[test]
    fn test_gcc_wrapper_has_no_suppression() {
        let tmp = tempdir().unwrap();
        let shim = write_shim(
            tmp.path(),
            &Compiler::new(CompilerFamily::Gcc, 7),
            &env("g++-7", "", ""),
        )
        .unwrap();

        assert_eq!(shim.toolset, "gcc");
        assert!(shim.wrapper.ends_with("gcc-wrapper.sh"));
        let script = std::fs::read_to_string(&shim.wrapper).unwrap();
        assert_eq!(script, "#!/bin/sh\nexec \"g++-7\" \"$@\"\n");
        assert!(!script.contains("-Wno-unused-local-typedef"));
    }

    #[test]
    fn test_user_config_declares_toolset() {
        let tmp = tempdir().unwrap();
        let shim = write_shim(
            tmp.path(),
            &Compiler::new(CompilerFamily::Clang, 6),
            &env("clang++-6.0", "", "-L/opt/lib -Wl,-rpath,\"/opt/lib\""),
        )
        .unwrap();

        let config = std::fs::read_to_string(&shim.user_config).unwrap();
        assert_eq!(
            config,
            format!(
                "using clang : : \"{}\" : <linkflags>\"-L/opt/lib -Wl,-rpath,\\\"/opt/lib\\\"\" ;\n",
                shim.wrapper.display()
            )
        );
    }

    #[test]
    fn test_user_config_without_ldflags() {
        let tmp = tempdir().unwrap();
        let shim = write_shim(
            tmp.path(),
            &Compiler::new(CompilerFamily::Gcc, 7),
            &ToolchainEnv {
                cxx: Some("g++".into()),
                ..ToolchainEnv::default()
            },
        )
        .unwrap();
        let config = std::fs::read_to_string(&shim.user_config).unwrap();
        assert!(config.starts_with("using gcc : : \""));
        assert!(!config.contains("<linkflags>"));
    }

    #[cfg(unix)]
    #[test]
    fn test_wrapper_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let shim = write_shim(
            tmp.path(),
            &Compiler::new(CompilerFamily::Gcc, 7),
            &ToolchainEnv::default(),
        )
        .unwrap();
        let mode = std::fs::metadata(&shim.wrapper).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
