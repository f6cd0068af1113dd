// src/storage.rs
// Trajectory archive: one JSON document holding the time grid "t" and the state rows "Y".

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::error::SimResult;
use crate::logic::Trajectory;

/// File name used when the caller does not pick one.
pub const DEFAULT_ARCHIVE_NAME: &str = "pendulum_data.json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Sibling of `path` that no other in-flight save in this process uses.
fn temp_path_for(path: &Path) -> PathBuf {
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.to_string());
    path.with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
}

/// Writes `trajectory` to `path`, replacing any existing file.
///
/// The document goes to a temporary sibling first and is renamed into place,
/// so concurrent saves to one path leave one complete archive behind.
pub async fn save_trajectory(path: impl AsRef<Path>, trajectory: &Trajectory) -> SimResult<PathBuf> {
    let path = path.as_ref().to_path_buf();
    let bytes = serde_json::to_vec(trajectory)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temp = temp_path_for(&path);
    if let Err(err) = tokio::fs::write(&temp, &bytes).await {
        let _ = tokio::fs::remove_file(&temp).await; // Partial temp file, if any
        return Err(err.into());
    }
    if let Err(err) = tokio::fs::rename(&temp, &path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(err.into());
    }
    info!(path = %path.display(), samples = trajectory.len(), bytes = bytes.len(), "trajectory saved");
    Ok(path)
}

/// Reads an archive written by [`save_trajectory`], re-checking that both sequences line up.
pub async fn load_trajectory(path: impl AsRef<Path>) -> SimResult<Trajectory> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    let raw: Trajectory = serde_json::from_slice(&bytes)?;
    let (time, states) = raw.into_parts();
    Trajectory::from_parts(time, states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("double-pendulum-storage-{}", std::process::id()))
            .join(name)
    }

    #[tokio::test]
    async fn archive_uses_t_and_y_keys() {
        let traj = Trajectory::from_parts(vec![0.0, 0.5], vec![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]).unwrap();
        let path = save_trajectory(scratch_path("keys.json"), &traj).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["t"][1], 0.5);
        assert_eq!(value["Y"][1][3], 8.0);
        assert_eq!(load_trajectory(&path).await.unwrap(), traj);
    }

    #[tokio::test]
    async fn concurrent_saves_leave_one_complete_archive() {
        let path = scratch_path("concurrent.json");
        let runs: Vec<Trajectory> = (0..8)
            .map(|k| {
                let n = 200 + 50 * k;
                let time = (0..n).map(|i| i as f64 * 0.01).collect();
                let states = (0..n).map(|i| [k as f64, i as f64, 0.0, 0.0]).collect();
                Trajectory::from_parts(time, states).unwrap()
            })
            .collect();

        let handles: Vec<_> = runs
            .iter()
            .cloned()
            .map(|traj| {
                let path = path.clone();
                tokio::spawn(async move { save_trajectory(&path, &traj).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let saved = load_trajectory(&path).await.unwrap();
        assert!(runs.contains(&saved));
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".concurrent.json."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn temp_paths_are_unique_siblings() {
        let target = Path::new("/tmp/out/pendulum_data.json");
        let a = temp_path_for(target);
        let b = temp_path_for(target);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
    }

    #[tokio::test]
    async fn mismatched_archive_is_rejected() {
        let path = scratch_path("mismatch.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, br#"{"t":[0.0,1.0],"Y":[[0.0,0.0,0.0,0.0]]}"#).unwrap();
        let err = load_trajectory(&path).await.unwrap_err();
        assert!(matches!(err, SimError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn missing_archive_is_an_io_error() {
        let err = load_trajectory(scratch_path("does-not-exist.json")).await.unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
