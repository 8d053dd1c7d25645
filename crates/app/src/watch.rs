use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// PDFs an event brings into the folder, either created in place or moved
/// in under their final name.
pub fn arrived_pdfs(event: Event) -> Vec<PathBuf> {
    let paths = match event.kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To))
        | EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => event.paths,
        // [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event.paths.into_iter().skip(1).collect(),
        _ => Vec::new(),
    };
    paths.into_iter().filter(|p| is_pdf(p)).collect()
}

/// Spawn a notify watcher on `dir` that sends arriving PDFs to `tx`.
/// The returned watcher must be kept alive for watching to continue.
pub fn spawn_pdf_watcher(
    dir: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<impl Watcher> {
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        if let Ok(ev) = event {
            for path in arrived_pdfs(ev) {
                let _ = tx.blocking_send(path);
            }
        }
    })?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Polls `path` until two consecutive reads see the same non-zero size.
/// Returns false if the file disappears or is still changing after
/// `attempts` polls.
pub async fn wait_until_stable(path: &Path, interval: Duration, attempts: u32) -> bool {
    let mut last = None;
    for _ in 0..attempts {
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(_) => return false,
        };
        if size > 0 && last == Some(size) {
            return true;
        }
        last = Some(size);
        tokio::time::sleep(interval).await;
    }
    false
}

/// Output folder for one watched file: `<root>/<file stem>`.
pub fn output_dir_for(root: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    root.join(stem)
}
