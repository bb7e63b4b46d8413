use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry name against `destination`.
///
/// Fails with [`Error::ZipSlip`] when the entry is absolute or climbs out of the destination.
pub fn resolve_entry(destination: &Path, entry: &str) -> Result<PathBuf> {
    let entry_path = Path::new(entry);
    let normalized = normalize(entry_path);

    let escapes = normalized.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        let resolved = normalize(&destination.join(&normalized));
        return Err(Error::ZipSlip {
            entry: entry_path.to_path_buf(),
            resolved,
        });
    }

    Ok(destination.join(normalized))
}

/// Lexically drop `.` and fold `..`; backslashes count as separators.
fn normalize(path: &Path) -> PathBuf {
    let unified = path.to_string_lossy().replace('\\', "/");
    let mut result = PathBuf::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                // leading `..` survives so callers can see the escape
                _ => result.push(".."),
            },
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push("/"),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }
    result
}
