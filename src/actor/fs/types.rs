use std::path::{Path, PathBuf};
use std::time::Instant;

use notify::EventKind;
use notify::event::ModifyKind;

use crate::utils::path::normalize_path;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    /// Kind of a notify event, `None` for events that never trigger a build.
    fn from_notify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            // mtime/atime/chmod noise; rsync touching timestamps would loop forever
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }
}

/// One observed change under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ChangeEvent {
    pub(super) path: PathBuf,
    pub(super) kind: ChangeKind,
    pub(super) at: Instant,
}

impl ChangeEvent {
    /// Changes carried by a raw notify event, editor artifacts dropped.
    pub(super) fn from_notify(event: &notify::Event, at: Instant) -> Vec<Self> {
        let Some(kind) = ChangeKind::from_notify(&event.kind) else {
            return Vec::new();
        };

        event
            .paths
            .iter()
            .filter(|path| !is_temp_file(path))
            .map(|path| Self {
                path: normalize_path(path),
                kind,
                at,
            })
            .collect()
    }
}

/// Check if path is a temp/backup file (editor artifacts).
///
/// Other dotfiles such as `.latexmkrc` are real sources.
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        // emacs lock and autosave files
        || name.starts_with(".#")
        || (name.len() > 1 && name.starts_with('#') && name.ends_with('#'))
        // vim's write probe, gvfs atomic saves
        || name == "4913"
        || name.starts_with(".goutputstream-")
}
