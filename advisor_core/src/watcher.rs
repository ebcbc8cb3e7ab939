//! Background log tailing.
//!
//! A dedicated thread follows the host's append-only log, combining
//! filesystem change events with a poll ticker (the events are best-effort;
//! the ticker is the guarantee). Extraction itself is the pure machinery in
//! `state_codec`; this module owns the file I/O, the read cursor, truncation
//! recovery, and log-size maintenance. Shutdown is immediate and never waits
//! on downstream enrichment.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, tick, unbounded, Receiver, Sender};
use notify::{RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use state_codec::{decode, extract_blocks, extract_latest, StreamCursor, END_MARKER};

use crate::config::WatcherConfig;
use crate::raw::RawSnapshot;

/// Handle to a running watcher thread. Dropping the receiver also stops the
/// loop at its next wake.
pub struct LogWatcher {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl LogWatcher {
    /// Start tailing `path`. On startup only the most recent complete state
    /// already in the log is emitted; afterwards every new complete block
    /// produces one snapshot on the returned channel.
    pub fn spawn(path: PathBuf, config: WatcherConfig) -> (LogWatcher, Receiver<RawSnapshot>) {
        let (snapshot_tx, snapshot_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded(1);
        let handle = std::thread::spawn(move || run(path, config, snapshot_tx, shutdown_rx));
        (
            LogWatcher {
                shutdown: shutdown_tx,
                handle: Some(handle),
            },
            snapshot_rx,
        )
    }

    /// Stop the polling loop and wait for the thread to exit. In-flight
    /// downstream enrichment is not waited on.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LogWatcher {
    fn drop(&mut self) {
        let _ = self.shutdown.try_send(());
    }
}

struct TailState {
    cursor: StreamCursor,
    pending: String,
    polls: u32,
}

fn run(path: PathBuf, config: WatcherConfig, snapshots: Sender<RawSnapshot>, shutdown: Receiver<()>) {
    let (fs_tx, fs_rx) = unbounded::<()>();
    let fs_watcher = start_fs_watcher(&path, fs_tx);
    // Without a live backend the event channel would read as permanently
    // disconnected and spin the select; fall back to a silent channel.
    let fs_rx = if fs_watcher.is_some() {
        fs_rx
    } else {
        crossbeam_channel::never()
    };
    let ticker = tick(config.poll_interval());

    let mut state = TailState {
        cursor: StreamCursor::new(),
        pending: String::new(),
        polls: 0,
    };

    prime(&path, &mut state, &snapshots);

    loop {
        crossbeam_channel::select! {
            recv(shutdown) -> _ => {
                info!(target: "turn_advisor::watcher", "log watcher shutting down");
                break;
            }
            recv(ticker) -> _ => {}
            recv(fs_rx) -> _ => {
                // Coalesce event bursts into one poll.
                while fs_rx.try_recv().is_ok() {}
            }
        }

        state.polls = state.polls.wrapping_add(1);
        if config.trim_oversized
            && config.trim_check_every > 0
            && state.polls % config.trim_check_every == 0
        {
            trim_oversized_log(&path, &config, &mut state);
        }

        if !poll(&path, &config, &mut state, &snapshots) {
            info!(target: "turn_advisor::watcher", "snapshot receiver dropped; stopping");
            break;
        }
    }
}

fn start_fs_watcher(path: &Path, events: Sender<()>) -> Option<notify::RecommendedWatcher> {
    let mut watcher = match notify::recommended_watcher(
        move |result: Result<notify::Event, notify::Error>| {
            if result.is_ok() {
                let _ = events.send(());
            }
        },
    ) {
        Ok(watcher) => watcher,
        Err(err) => {
            warn!(
                target: "turn_advisor::watcher",
                error = %err,
                "fs watcher unavailable; polling only"
            );
            return None;
        }
    };

    // Watch the directory: the log file itself may not exist yet and gets
    // rotated by the host.
    let target = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if let Err(err) = watcher.watch(target, RecursiveMode::NonRecursive) {
        warn!(
            target: "turn_advisor::watcher",
            path = %target.display(),
            error = %err,
            "fs watch failed; polling only"
        );
        return None;
    }
    Some(watcher)
}

/// Initial pass over a pre-existing log: emit only the latest complete
/// state, then continue from the end of the file.
fn prime(path: &Path, state: &mut TailState, snapshots: &Sender<RawSnapshot>) {
    let Ok(bytes) = fs::read(path) else {
        info!(target: "turn_advisor::watcher", path = %path.display(), "log not present yet; waiting");
        return;
    };
    let content = String::from_utf8_lossy(&bytes);
    state.cursor.advance_to(bytes.len() as u64);
    if let Some(value) = extract_latest(&content) {
        let raw = RawSnapshot::from_value(&value);
        info!(
            target: "turn_advisor::watcher",
            turn = raw.turn,
            "resuming from most recent logged state"
        );
        let _ = snapshots.send(raw);
    }
}

/// One poll: reconcile the cursor, read the new tail, extract and forward
/// complete blocks. Returns false once the receiver is gone.
fn poll(
    path: &Path,
    config: &WatcherConfig,
    state: &mut TailState,
    snapshots: &Sender<RawSnapshot>,
) -> bool {
    let len = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(_) => return true,
    };
    if state.cursor.sync(len) {
        debug!(target: "turn_advisor::watcher", "log truncated externally; cursor reset");
        state.pending.clear();
    }
    if len == state.cursor.position() {
        return true;
    }

    let new_text = match read_from(path, state.cursor.position()) {
        Ok((text, end)) => {
            state.cursor.advance_to(end);
            text
        }
        Err(err) => {
            warn!(target: "turn_advisor::watcher", error = %err, "log read failed; will retry");
            return true;
        }
    };
    state.pending.push_str(&new_text);

    for payload in extract_blocks(&state.pending) {
        match decode(&payload) {
            Ok(value) => {
                if snapshots.send(RawSnapshot::from_value(&value)).is_err() {
                    return false;
                }
            }
            Err(err) => {
                debug!(
                    target: "turn_advisor::watcher",
                    error = %err,
                    "block failed to decode; skipping"
                );
            }
        }
    }
    drain_processed(&mut state.pending, config.max_pending_bytes);
    true
}

fn read_from(path: &Path, position: u64) -> std::io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(position))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let end = position + bytes.len() as u64;
    Ok((String::from_utf8_lossy(&bytes).into_owned(), end))
}

/// Keep only the residue after the last complete block, bounded so a stream
/// that never terminates a block cannot grow the buffer forever.
fn drain_processed(pending: &mut String, max_pending_bytes: usize) {
    if let Some(last_end) = pending.rfind(END_MARKER) {
        pending.drain(..last_end + END_MARKER.len());
    }
    if pending.len() > max_pending_bytes {
        let mut cut = pending.len() - max_pending_bytes / 5;
        while !pending.is_char_boundary(cut) {
            cut += 1;
        }
        pending.drain(..cut);
    }
}

/// Rewrite an oversized log keeping the most recent quarter. The host only
/// ever appends, so without this the log grows for the whole session.
fn trim_oversized_log(path: &Path, config: &WatcherConfig, state: &mut TailState) {
    let Ok(metadata) = fs::metadata(path) else {
        return;
    };
    if metadata.len() <= config.max_log_bytes {
        return;
    }

    let keep = config.max_log_bytes / 4;
    let tail = match read_from(path, metadata.len().saturating_sub(keep)) {
        Ok((text, _)) => text,
        Err(err) => {
            warn!(target: "turn_advisor::watcher", error = %err, "log trim read failed");
            return;
        }
    };
    // Drop the partial first line.
    let tail = match tail.find('\n') {
        Some(newline) => &tail[newline + 1..],
        None => tail.as_str(),
    };
    let rewritten = format!("--- log trimmed by turn advisor ---\n{tail}");
    match fs::write(path, &rewritten) {
        Ok(()) => {
            info!(
                target: "turn_advisor::watcher",
                from = metadata.len(),
                to = rewritten.len(),
                "oversized log trimmed"
            );
            // Already-processed content may be re-extracted after the
            // reset; the enricher treats same-turn re-emissions as no-ops.
            state.cursor = StreamCursor::new();
            state.pending.clear();
        }
        Err(err) => {
            // The host may hold the file; try again on a later check.
            warn!(target: "turn_advisor::watcher", error = %err, "log trim skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_keeps_residue_after_last_block() {
        let mut pending =
            ">>>GAMESTATE>>>{\"turn\":1}<<<END<<<\n>>>GAMESTATE>>>{\"tu".to_string();
        drain_processed(&mut pending, 50_000);
        assert_eq!(pending, "\n>>>GAMESTATE>>>{\"tu");
    }

    #[test]
    fn drain_bounds_endless_noise() {
        let mut pending = "x".repeat(100_000);
        drain_processed(&mut pending, 50_000);
        assert_eq!(pending.len(), 10_000);
    }

    #[test]
    fn drain_respects_char_boundaries() {
        let mut pending = "é".repeat(30_000);
        drain_processed(&mut pending, 50_000);
        assert!(pending.len() <= 10_001);
        assert!(pending.chars().all(|c| c == 'é'));
    }
}
