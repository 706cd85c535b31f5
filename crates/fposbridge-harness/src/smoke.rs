//! End-to-end smoke scenario.
//!
//! allocate a, allocate b, fill a from `fgetpos`, copy a into b, compare the
//! bytes, seek with b, release both, then confirm the registry counters are
//! back where they started. The scenario's handles go through a registry of
//! their own so unrelated bridge traffic in the process cannot skew the check.

use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Serialize;
use sha2::{Digest, Sha256};

use fposbridge_abi::{BridgeContext, FposHandle, open_file};
use fposbridge_core::{FPOS_SIZE, FposRecord};
use fposbridge_membrane::config::set_bridge_mode;
use fposbridge_membrane::{BridgeMode, HandleRegistry};

use crate::error::HarnessError;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

const SCRATCH_CONTENTS: &str = "fposbridge smoke\nposition survives a copy\n";
const AFTER_FIRST_LINE: &str = "position survives a copy\n";

/// Outcome of one smoke run.
#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
    pub mode: &'static str,
    pub record_size: usize,
    pub copy_matches: bool,
    pub seek_matches: bool,
    pub leaked_handles: usize,
    pub denials: u64,
}

impl SmokeReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.copy_matches && self.seek_matches && self.leaked_handles == 0
    }
}

/// Hex SHA-256 of a record's bytes.
#[must_use]
pub fn record_digest(record: &FposRecord) -> String {
    format!("{:x}", Sha256::digest(record.as_bytes()))
}

fn smoke_registry() -> &'static HandleRegistry {
    static REGISTRY: OnceLock<HandleRegistry> = OnceLock::new();
    REGISTRY.get_or_init(HandleRegistry::new)
}

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("fposbridge-smoke-{}.txt", std::process::id()))
}

/// Run the scenario under `mode`, logging each step to `log`.
pub fn run_smoke<W: Write>(
    log: &mut LogEmitter<W>,
    mode: BridgeMode,
) -> Result<SmokeReport, HarnessError> {
    set_bridge_mode(mode);
    let ctx = BridgeContext::new(mode, smoke_registry());
    let before = ctx.stats();
    let mode_name = mode.as_str();
    let step = |event: &str, symbol: &str| {
        LogEntry::new("", LogLevel::Info, event)
            .with_mode(mode_name)
            .with_symbol(symbol)
    };

    log.emit_entry(step("smoke.start", "-").with_details(serde_json::json!({
        "record_size": FPOS_SIZE,
    })))?;

    let path = scratch_path();
    std::fs::write(&path, SCRATCH_CONTENTS)?;
    let result = run_steps(log, &path, ctx, &step);
    std::fs::remove_file(&path).ok();
    let (copy_matches, seek_matches) = result?;

    let after = ctx.stats();
    let leaked = after.outstanding().saturating_sub(before.outstanding());
    let leaked_handles = usize::try_from(leaked).unwrap_or(usize::MAX);
    let report = SmokeReport {
        mode: mode_name,
        record_size: FPOS_SIZE,
        copy_matches,
        seek_matches,
        leaked_handles,
        denials: after.denials.saturating_sub(before.denials),
    };

    let outcome = if report.passed() {
        Outcome::Pass
    } else {
        Outcome::Fail
    };
    let level = if report.passed() {
        LogLevel::Info
    } else {
        LogLevel::Error
    };
    let mut summary = step("smoke.finish", "-")
        .with_outcome(outcome)
        .with_details(serde_json::to_value(&report)?);
    summary.level = level;
    log.emit_entry(summary)?;
    log.flush()?;

    Ok(report)
}

type StepFn<'a> = dyn Fn(&str, &str) -> LogEntry + 'a;

fn run_steps<W: Write>(
    log: &mut LogEmitter<W>,
    path: &std::path::Path,
    ctx: BridgeContext<'static>,
    step: &StepFn<'_>,
) -> Result<(bool, bool), HarnessError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| HarnessError::SmokeFailed(format!("non-UTF-8 path {}", path.display())))?;

    let mut a = FposHandle::try_new_in(ctx)?;
    let mut b = FposHandle::try_new_in(ctx)?;
    log.emit_entry(step("smoke.allocate", "allocate_fpos_t").with_record_sha256(record_digest(&a)))?;
    log.emit_entry(step("smoke.allocate", "allocate_fpos_t").with_record_sha256(record_digest(&b)))?;

    let mut file = open_file(path_str, "r")?;
    file.gets(256)?;
    file.store_pos(&mut a)?;
    log.emit_entry(step("smoke.populate", "fgetpos").with_record_sha256(record_digest(&a)))?;

    b.overwrite_from(&a);
    let copy_matches = a.as_bytes() == b.as_bytes();
    log.emit_entry(
        step("smoke.copy", "copy_fpos_t")
            .with_decision("allow")
            .with_outcome(if copy_matches {
                Outcome::Pass
            } else {
                Outcome::Fail
            })
            .with_record_sha256(record_digest(&b)),
    )?;

    // Consume the rest, then seek back with the copy.
    file.read_until_char(&a, 0)?;
    let (rest, _) = file.read_until_char(&b, 0)?;
    let seek_matches = rest == AFTER_FIRST_LINE;
    log.emit_entry(
        step("smoke.seek", "fsetpos")
            .with_outcome(if seek_matches {
                Outcome::Pass
            } else {
                Outcome::Fail
            })
            .with_details(serde_json::json!({ "bytes_read": rest.len() })),
    )?;

    drop(file);
    drop(a);
    drop(b);
    log.emit_entry(step("smoke.release", "deallocate_fpos_t").with_details(serde_json::json!({
        "live_handles": ctx.live_handles(),
    })))?;

    Ok((copy_matches, seek_matches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured_log::validate_log_line;

    #[test]
    fn digest_of_zeroed_record_is_stable() {
        let zero = FposRecord::zeroed();
        assert_eq!(record_digest(&zero), record_digest(&FposRecord::zeroed()));
        assert_eq!(record_digest(&zero).len(), 64);

        let mut other = FposRecord::zeroed();
        other.as_bytes_mut()[0] = 1;
        assert_ne!(record_digest(&zero), record_digest(&other));
    }

    #[test]
    fn smoke_passes_in_each_mode_and_logs_valid_jsonl() {
        for mode in [BridgeMode::Strict, BridgeMode::Hardened] {
            let mut log = LogEmitter::new(Vec::new(), "unit");
            let report = run_smoke(&mut log, mode).unwrap();
            assert!(report.passed(), "{report:?}");
            assert_eq!(report.mode, mode.as_str());
            assert_eq!(report.record_size, FPOS_SIZE);
            assert_eq!(report.denials, 0);

            let out = String::from_utf8(log.into_inner()).unwrap();
            let entries: Vec<LogEntry> = out
                .lines()
                .enumerate()
                .map(|(i, line)| validate_log_line(line, i + 1).unwrap())
                .collect();
            assert_eq!(entries.first().unwrap().event, "smoke.start");
            assert_eq!(entries.last().unwrap().event, "smoke.finish");
            assert_eq!(entries.last().unwrap().outcome, Some(Outcome::Pass));

            let populate = entries.iter().find(|e| e.event == "smoke.populate").unwrap();
            let copy = entries.iter().find(|e| e.event == "smoke.copy").unwrap();
            assert_eq!(populate.record_sha256, copy.record_sha256);
        }
        set_bridge_mode(BridgeMode::Strict);
    }
}
