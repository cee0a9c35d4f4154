//! Cross-platform shell command utilities

/// Returns the shell program and argument flag for the current platform.
///
/// Returns (shell_program, shell_arg) where:
/// - Windows: ("cmd", "/C")
/// - Unix-like: ("bash", "-c"), or ("sh", "-c") when bash is unavailable
pub fn shell_command() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else if std::path::Path::new("/bin/bash").exists() {
        ("bash", "-c")
    } else {
        ("sh", "-c")
    }
}

/// Resolves the full path of an executable via the PATH environment variable.
///
/// On Windows, resolving before handing the name to
/// `std::process::Command::new` is necessary because the latter has been
/// deficient in finding executables.
pub fn resolve_executable_path(executable: &str) -> Option<String> {
    which::which(executable)
        .ok()
        .map(|p| p.to_string_lossy().to_string())
}
