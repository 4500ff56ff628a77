//! Per-process resource metrics from /proc.
//!
//! Reads `/proc/<pid>/stat`, `/proc/<pid>/status`, and `/proc/<pid>/fd` to
//! snapshot the resource consumption of an external process. Every metric
//! degrades independently: a read the OS refuses yields the `-1` sentinel
//! for that metric only, never an error — the caller decides what missing
//! data means.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// Sentinel recorded when a metric cannot be read (permission denied,
/// kernel too old, process racing away). Means "unavailable", not zero.
pub const UNAVAILABLE: i64 = -1;

/// Jiffies per second for `utime`/`stime` accounting (USER_HZ; 100 on
/// every Linux configuration this tool targets).
const JIFFIES_PER_SEC: f64 = 100.0;

/// One snapshot of a process's resource consumption.
///
/// Timestamp and elapsed-time fields are added by the sampling loop, which
/// owns the clock; this struct carries only what `/proc` reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// CPU utilization since the previous snapshot, percent. May exceed
    /// 100 on multicore hosts. 0 on the first snapshot of a handle.
    pub cpu_percent: f64,
    /// Resident set size in MB, or -1.0.
    pub memory_mb: f64,
    /// Open file descriptors, or -1.
    pub fd_count: i64,
    /// Thread count, or -1.
    pub thread_count: i64,
    /// Open sockets (subset of the fd table), or -1.
    pub connection_count: i64,
}

/// Capability handle over one OS process.
///
/// CPU percentage is a rate, so the handle remembers the jiffy count and
/// wall-clock instant of its previous sample.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    proc_dir: PathBuf,
    prev_cpu: Option<(Instant, u64)>,
}

impl ProcessHandle {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            proc_dir: PathBuf::from(format!("/proc/{pid}")),
            prev_cpu: None,
        }
    }

    /// Process id this handle points at.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether the process currently exists.
    pub fn exists(&self) -> bool {
        self.proc_dir.exists()
    }

    /// Take one snapshot. Never fails; unavailable metrics come back as
    /// the sentinel.
    pub fn sample(&mut self) -> Snapshot {
        let (fd_count, connection_count) = self.count_fds();
        Snapshot {
            cpu_percent: self.cpu_percent(),
            memory_mb: self.memory_rss_mb(),
            fd_count,
            thread_count: self.thread_count(),
            connection_count,
        }
    }

    /// CPU utilization percent over the window since the previous call.
    fn cpu_percent(&mut self) -> f64 {
        let jiffies = match std::fs::read_to_string(self.proc_dir.join("stat"))
            .ok()
            .and_then(|content| parse_stat_total_jiffies(&content))
        {
            Some(j) => j,
            None => return UNAVAILABLE as f64,
        };

        let now = Instant::now();
        let percent = match self.prev_cpu {
            Some((prev_at, prev_jiffies)) => {
                let wall = now.duration_since(prev_at).as_secs_f64();
                if wall <= 0.0 {
                    0.0
                } else {
                    let busy = jiffies.saturating_sub(prev_jiffies) as f64 / JIFFIES_PER_SEC;
                    (busy / wall) * 100.0
                }
            }
            // First observation has no window to rate over.
            None => 0.0,
        };
        self.prev_cpu = Some((now, jiffies));
        percent
    }

    fn memory_rss_mb(&self) -> f64 {
        match self.read_status_kb("VmRSS:") {
            Some(kb) => kb as f64 / 1024.0,
            None => UNAVAILABLE as f64,
        }
    }

    fn thread_count(&self) -> i64 {
        std::fs::read_to_string(self.proc_dir.join("status"))
            .ok()
            .and_then(|content| parse_status_value(&content, "Threads:"))
            .and_then(|v| i64::try_from(v).ok())
            .unwrap_or(UNAVAILABLE)
    }

    fn read_status_kb(&self, key: &str) -> Option<u64> {
        let content = std::fs::read_to_string(self.proc_dir.join("status")).ok()?;
        parse_status_value(&content, key)
    }

    /// Count fd-table entries and how many of them are sockets, in one
    /// directory pass. `/proc/<pid>/fd` is readable only by the process
    /// owner, so both counts degrade together on permission denial.
    fn count_fds(&self) -> (i64, i64) {
        let entries = match std::fs::read_dir(self.proc_dir.join("fd")) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(pid = self.pid, error = %e, "fd table not readable");
                return (UNAVAILABLE, UNAVAILABLE);
            }
        };

        let mut fds: i64 = 0;
        let mut sockets: i64 = 0;
        for entry in entries.flatten() {
            fds += 1;
            if let Ok(link) = std::fs::read_link(entry.path())
                && link_is_socket(&link)
            {
                sockets += 1;
            }
        }
        (fds, sockets)
    }
}

/// Whether an fd symlink target names a socket (`socket:[12345]`).
fn link_is_socket(link: &Path) -> bool {
    link.to_str().is_some_and(|s| s.starts_with("socket:"))
}

/// Parse a `Key:   12345 kB`-style line from `/proc/<pid>/status`.
///
/// Returns the numeric value; the `kB` suffix, present on memory keys and
/// absent on counters like `Threads:`, is ignored either way.
pub(crate) fn parse_status_value(content: &str, key: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix(key) {
            return rest
                .trim()
                .trim_end_matches(" kB")
                .trim()
                .parse::<u64>()
                .ok();
        }
    }
    None
}

/// Total CPU jiffies (`utime + stime`) from `/proc/<pid>/stat`.
///
/// The comm field (field 2) is parenthesized and may itself contain spaces
/// or parentheses, so fields are counted from the last `)` in the line:
/// after it, `state` is field 0, making `utime` field 11 and `stime`
/// field 12.
pub(crate) fn parse_stat_total_jiffies(content: &str) -> Option<u64> {
    let after_comm = &content[content.rfind(')')? + 1..];
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some(utime + stime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::info;
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    fn init_test_logging() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .json(),
            )
            .with(filter)
            .try_init();
    }

    #[test]
    fn test_parse_status_memory_and_threads() {
        init_test_logging();
        info!("TEST START: test_parse_status_memory_and_threads");

        let sample = r#"Name:   webserv
Umask:  0022
State:  S (sleeping)
Pid:    31337
VmPeak:    24392 kB
VmSize:    24392 kB
VmRSS:      8192 kB
Threads:        5
voluntary_ctxt_switches:        2297
nonvoluntary_ctxt_switches:     117"#;

        let rss = parse_status_value(sample, "VmRSS:").expect("VmRSS should parse");
        let threads = parse_status_value(sample, "Threads:").expect("Threads should parse");

        info!(rss_kb = rss, threads = threads, "RESULT: parsed status fields");

        assert_eq!(rss, 8192);
        assert_eq!(threads, 5);

        info!("TEST PASS: test_parse_status_memory_and_threads");
    }

    #[test]
    fn test_parse_status_missing_key() {
        init_test_logging();
        info!("TEST START: test_parse_status_missing_key");

        let sample = "Name:\twebserv\nPid:\t42\n";
        assert_eq!(parse_status_value(sample, "VmRSS:"), None);

        info!("TEST PASS: test_parse_status_missing_key");
    }

    #[test]
    fn test_parse_stat_jiffies() {
        init_test_logging();
        info!("TEST START: test_parse_stat_jiffies");

        // utime=250 stime=120
        let sample = "31337 (webserv) S 1 31337 31337 0 -1 4194304 1234 0 0 0 250 120 0 0 20 0 5 0 12345678 24977408 2048 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";

        let jiffies = parse_stat_total_jiffies(sample).expect("stat should parse");
        info!(jiffies = jiffies, "RESULT: parsed total jiffies");

        assert_eq!(jiffies, 370);

        info!("TEST PASS: test_parse_stat_jiffies");
    }

    #[test]
    fn test_parse_stat_comm_with_spaces_and_parens() {
        init_test_logging();
        info!("TEST START: test_parse_stat_comm_with_spaces_and_parens");

        // Hostile comm field: counting from the last ')' must still land
        // on the right columns.
        let sample = "99 (web (serv) v2) R 1 99 99 0 -1 4194304 0 0 0 0 77 33 0 0 20 0 1 0 100 1000 10 0 0 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";

        assert_eq!(parse_stat_total_jiffies(sample), Some(110));

        info!("TEST PASS: test_parse_stat_comm_with_spaces_and_parens");
    }

    #[test]
    fn test_parse_stat_truncated() {
        init_test_logging();
        info!("TEST START: test_parse_stat_truncated");

        assert_eq!(parse_stat_total_jiffies("1 (x) S 1 2 3"), None);
        assert_eq!(parse_stat_total_jiffies(""), None);

        info!("TEST PASS: test_parse_stat_truncated");
    }

    #[test]
    fn test_socket_link_detection() {
        init_test_logging();
        info!("TEST START: test_socket_link_detection");

        assert!(link_is_socket(Path::new("socket:[48151623]")));
        assert!(!link_is_socket(Path::new("/var/log/webserv.log")));
        assert!(!link_is_socket(Path::new("pipe:[123]")));
        assert!(!link_is_socket(Path::new("anon_inode:[eventpoll]")));

        info!("TEST PASS: test_socket_link_detection");
    }

    #[test]
    fn test_sample_own_process_on_linux() {
        init_test_logging();
        info!("TEST START: test_sample_own_process_on_linux");

        #[cfg(target_os = "linux")]
        {
            let mut handle = ProcessHandle::new(std::process::id());
            assert!(handle.exists());

            let snapshot = handle.sample();
            info!(
                memory_mb = snapshot.memory_mb,
                fd_count = snapshot.fd_count,
                thread_count = snapshot.thread_count,
                connections = snapshot.connection_count,
                "RESULT: sampled own process"
            );

            // Our own process is always readable by us.
            assert!(snapshot.memory_mb > 0.0);
            assert!(snapshot.fd_count > 0);
            assert!(snapshot.thread_count >= 1);
            assert!(snapshot.connection_count >= 0);
            // First sample of a handle has no CPU window.
            assert_eq!(snapshot.cpu_percent, 0.0);
        }

        #[cfg(not(target_os = "linux"))]
        {
            info!("SKIP: not on Linux, skipping /proc sampling test");
        }

        info!("TEST PASS: test_sample_own_process_on_linux");
    }

    #[test]
    fn test_missing_process_reports_sentinels() {
        init_test_logging();
        info!("TEST START: test_missing_process_reports_sentinels");

        // PID near the 32-bit max is far above any default pid_max.
        let mut handle = ProcessHandle::new(u32::MAX - 1);
        assert!(!handle.exists());

        let snapshot = handle.sample();
        assert_eq!(snapshot.cpu_percent, UNAVAILABLE as f64);
        assert_eq!(snapshot.memory_mb, UNAVAILABLE as f64);
        assert_eq!(snapshot.fd_count, UNAVAILABLE);
        assert_eq!(snapshot.thread_count, UNAVAILABLE);
        assert_eq!(snapshot.connection_count, UNAVAILABLE);

        info!("TEST PASS: test_missing_process_reports_sentinels");
    }

    #[test]
    fn test_snapshot_serialization() {
        init_test_logging();
        info!("TEST START: test_snapshot_serialization");

        let snapshot = Snapshot {
            cpu_percent: 12.5,
            memory_mb: 64.0,
            fd_count: 12,
            thread_count: 4,
            connection_count: 3,
        };

        let json = serde_json::to_string(&snapshot).expect("serialization should succeed");
        let back: Snapshot = serde_json::from_str(&json).expect("deserialization should succeed");
        assert_eq!(snapshot, back);

        info!("TEST PASS: test_snapshot_serialization");
    }
}
