//! Template store: a directory of recorded login requests, one file per
//! wifi network, looked up by SSID.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Find the stored request file for `ssid` under `dir`.
///
/// Tries, in order: the SSID itself, `SSID.txt`, and the SSID with spaces
/// replaced by hyphens plus `.txt`. Only regular files match.
pub fn find_template(dir: &Path, ssid: &str) -> Option<PathBuf> {
    let candidates = [
        ssid.to_string(),
        format!("{ssid}.txt"),
        format!("{}.txt", ssid.replace(' ', "-")),
    ];
    debug!("expected request filenames: {candidates:?}");
    for name in candidates {
        let path = dir.join(name);
        if path.is_file() {
            debug!("located request file {}", path.display());
            return Some(path);
        }
    }
    None
}
