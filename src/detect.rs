use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

/// Candidate device names for this platform, in the order they should be
/// probed. On Windows devices are labeled COM[X], on Unix-likes they live
/// under /dev/tty[X].
#[cfg(windows)]
pub(crate) fn candidate_ports() -> SyncResult<Vec<String>> {
    Ok((1..=255).map(|i| format!("COM{}", i)).collect())
}

#[cfg(unix)]
pub(crate) fn candidate_ports() -> SyncResult<Vec<String>> {
    let entries = std::fs::read_dir("/dev")
        .map_err(|e| SyncError::Communication(format!("Failed to list /dev: {}", e)))?;

    let mut candidates = Vec::new();
    // Directory-listing order, deliberately unsorted
    for entry in entries {
        let entry =
            entry.map_err(|e| SyncError::Communication(format!("Failed to list /dev: {}", e)))?;
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with("tty") {
                candidates.push(format!("/dev/{}", name));
            }
        }
    }

    Ok(candidates)
}

#[cfg(not(any(windows, unix)))]
pub(crate) fn candidate_ports() -> SyncResult<Vec<String>> {
    Err(SyncError::UnsupportedPlatform)
}

/// Probe `candidates` in order and adopt the first one that opens. Open
/// failures are suppressed until the whole list is exhausted.
pub(crate) fn scan<T, F>(candidates: impl IntoIterator<Item = String>, mut open: F) -> SyncResult<(String, T)>
where
    F: FnMut(&str) -> SyncResult<T>,
{
    for candidate in candidates {
        match open(&candidate) {
            Ok(transport) => {
                info!("Using device {}", candidate);
                return Ok((candidate, transport));
            }
            Err(e) => {
                debug!("Skipping {}: {}", candidate, e);
            }
        }
    }

    Err(SyncError::DeviceNotFound)
}
