//! Environment configuration shared by the binaries.
//!
//! | variable              | default | effect                              |
//! |-----------------------|---------|-------------------------------------|
//! | `LIFECYCLE_BASE_PATH` | `.`     | working directory for relative I/O  |
//! | `RAYON_NUM_THREADS`   | 8       | rayon pool size (`OMP_NUM_THREADS` is the fallback) |

use std::path::PathBuf;

const BASE_PATH_VAR: &str = "LIFECYCLE_BASE_PATH";
const DEFAULT_THREADS: usize = 8;

/// Resolve the base path from an optional `LIFECYCLE_BASE_PATH` value.
pub fn base_path_from(value: Option<String>) -> PathBuf {
    value
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Parse a thread count; zero and garbage fall back to `None`.
pub fn parse_threads(value: Option<String>) -> Option<usize> {
    value.and_then(|s| s.trim().parse().ok()).filter(|&n: &usize| n > 0)
}

/// Make `LIFECYCLE_BASE_PATH` the working directory so that config and output
/// paths resolve against it. Exits on failure.
pub fn init_base_path() -> PathBuf {
    let base = base_path_from(std::env::var(BASE_PATH_VAR).ok());
    if let Err(e) = std::env::set_current_dir(&base) {
        eprintln!("{}={}: cannot enter directory: {}", BASE_PATH_VAR, base.display(), e);
        std::process::exit(1);
    }
    let resolved = std::env::current_dir().unwrap_or_else(|_| base.clone());
    println!("{}={} ({})", BASE_PATH_VAR, base.display(), resolved.display());
    base
}

/// Thread count from `RAYON_NUM_THREADS`, then `OMP_NUM_THREADS`, default 8.
pub fn configured_threads() -> usize {
    parse_threads(std::env::var("RAYON_NUM_THREADS").ok())
        .or_else(|| parse_threads(std::env::var("OMP_NUM_THREADS").ok()))
        .unwrap_or(DEFAULT_THREADS)
}

/// Build the rayon global thread pool. Tolerates an already-initialized pool.
/// Returns thread count.
pub fn init_rayon_threads() -> usize {
    let num_threads = configured_threads();
    if rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .is_err()
    {
        eprintln!("Rayon global pool already initialized");
    }
    println!("Rayon threads: {}", num_threads);
    num_threads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path_defaults_to_cwd() {
        assert_eq!(base_path_from(None), PathBuf::from("."));
        assert_eq!(base_path_from(Some("  ".to_string())), PathBuf::from("."));
        assert_eq!(base_path_from(Some("/data/run".to_string())), PathBuf::from("/data/run"));
    }

    #[test]
    fn test_parse_threads() {
        assert_eq!(parse_threads(Some("12".to_string())), Some(12));
        assert_eq!(parse_threads(Some(" 4 ".to_string())), Some(4));
        assert_eq!(parse_threads(Some("0".to_string())), None);
        assert_eq!(parse_threads(Some("many".to_string())), None);
        assert_eq!(parse_threads(None), None);
    }
}
