//! Log watcher end to end: a real file on disk, appends, truncation, and
//! shutdown.

mod common;

use std::fs;
use std::time::Duration;

use advisor_core::{collect_report, report_lines, LogWatcher, WatcherConfig};
use common::{append, temp_log, ScriptedHost};

fn fast_config() -> WatcherConfig {
    WatcherConfig {
        poll_interval_ms: 25,
        trim_oversized: false,
        ..WatcherConfig::default()
    }
}

fn framed(turn: i64) -> String {
    let report = collect_report(&ScriptedHost { turn });
    let mut text = report_lines(&report, 4000).join("\n");
    text.push('\n');
    text
}

#[test]
fn watcher_emits_each_new_complete_block() -> anyhow::Result<()> {
    let path = temp_log("emits");
    let (watcher, snapshots) = LogWatcher::spawn(path.clone(), fast_config());

    append(&path, "host booting\n")?;
    append(&path, &framed(1))?;
    let first = snapshots.recv_timeout(Duration::from_secs(5))?;
    assert_eq!(first.turn, 1);

    append(&path, "between turns noise\n")?;
    append(&path, &framed(2))?;
    let second = snapshots.recv_timeout(Duration::from_secs(5))?;
    assert_eq!(second.turn, 2);
    assert_eq!(second.cities.len(), 1);

    watcher.shutdown();
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn watcher_survives_external_truncation() -> anyhow::Result<()> {
    let path = temp_log("truncate");
    let (watcher, snapshots) = LogWatcher::spawn(path.clone(), fast_config());

    append(&path, &framed(1))?;
    assert_eq!(snapshots.recv_timeout(Duration::from_secs(5))?.turn, 1);

    // The host rotates the log out from under us.
    fs::write(&path, "fresh log\n")?;
    append(&path, &framed(3))?;
    let after = snapshots.recv_timeout(Duration::from_secs(5))?;
    assert_eq!(after.turn, 3);

    watcher.shutdown();
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn watcher_resumes_from_the_latest_preexisting_state() -> anyhow::Result<()> {
    let path = temp_log("resume");
    append(&path, &framed(1))?;
    append(&path, &framed(2))?;

    let (watcher, snapshots) = LogWatcher::spawn(path.clone(), fast_config());
    let resumed = snapshots.recv_timeout(Duration::from_secs(5))?;
    assert_eq!(resumed.turn, 2);
    // Older states in the backlog are not replayed.
    assert!(snapshots.recv_timeout(Duration::from_millis(300)).is_err());

    watcher.shutdown();
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn watcher_reassembles_chunked_blocks() -> anyhow::Result<()> {
    let path = temp_log("chunked");
    let (watcher, snapshots) = LogWatcher::spawn(path.clone(), fast_config());

    let report = collect_report(&ScriptedHost { turn: 2 });
    let mut chunked = report_lines(&report, 48).join("\n");
    chunked.push('\n');
    assert!(chunked.lines().count() > 1);
    append(&path, &chunked)?;

    let snapshot = snapshots.recv_timeout(Duration::from_secs(5))?;
    assert_eq!(snapshot.turn, 2);
    assert_eq!(snapshot.cities[0].name, "Rome");

    watcher.shutdown();
    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn incomplete_blocks_stay_pending_until_terminated() -> anyhow::Result<()> {
    let path = temp_log("pending");
    let (watcher, snapshots) = LogWatcher::spawn(path.clone(), fast_config());

    append(&path, ">>>GAMESTATE>>>{\"turn\":7}")?;
    assert!(snapshots.recv_timeout(Duration::from_millis(300)).is_err());

    append(&path, "<<<END<<<\n")?;
    assert_eq!(snapshots.recv_timeout(Duration::from_secs(5))?.turn, 7);

    watcher.shutdown();
    let _ = fs::remove_file(&path);
    Ok(())
}
