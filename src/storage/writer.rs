//! Append-only partition logs
//!
//! Each partition owns one JSON-lines file named `api{partition}.log` in the
//! log directory. Appends to the same partition serialize on that partition's
//! lock; different partitions never contend.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::GatekeeperError;
use crate::event::Event;

/// Writes accepted events to their partition's log
#[derive(Debug)]
pub struct EventWriter {
    log_dir: PathBuf,
    /// Flush file contents to disk after every append
    sync_on_write: bool,
    logs: DashMap<u32, Arc<PartitionLog>>,
}

#[derive(Debug)]
struct PartitionLog {
    path: PathBuf,
    /// Opened lazily on first append
    file: Mutex<Option<File>>,
    appended: AtomicU64,
}

impl PartitionLog {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: Mutex::new(None),
            appended: AtomicU64::new(0),
        }
    }

    fn append(&self, line: &[u8], sync: bool) -> io::Result<()> {
        let mut guard = self.file.lock();
        if guard.is_none() {
            *guard = Some(open_sealed(&self.path)?);
        }

        if let Some(file) = guard.as_mut() {
            let len = file.metadata()?.len();
            if let Err(e) = file.write_all(line) {
                // Cut a partial record so the next append starts on a clean line
                if let Err(trunc) = file.set_len(len) {
                    tracing::warn!("Failed to roll back {}: {}", self.path.display(), trunc);
                }
                return Err(e);
            }
            if sync {
                file.sync_data()?;
            }
        }

        self.appended.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Open a log for appending. A torn final line left by an earlier process is
/// terminated first so it can't swallow the next record.
fn open_sealed(path: &Path) -> io::Result<File> {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;

    if file.metadata()?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            tracing::warn!("Sealing torn record at end of {}", path.display());
            file.write_all(b"\n")?;
        }
    }

    Ok(file)
}

/// Per-partition append counters
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    pub partition: u32,
    pub path: String,
    pub records_appended: u64,
}

impl EventWriter {
    /// Create a writer rooted at `log_dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(log_dir: P) -> io::Result<Self> {
        std::fs::create_dir_all(log_dir.as_ref())?;

        Ok(Self {
            log_dir: log_dir.as_ref().to_path_buf(),
            sync_on_write: false,
            logs: DashMap::new(),
        })
    }

    pub fn with_sync(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the log owned by `partition`
    pub fn partition_path(&self, partition: u32) -> PathBuf {
        self.log_dir.join(format!("api{}.log", partition))
    }

    fn log_for(&self, partition: u32) -> Arc<PartitionLog> {
        // Clone the Arc out so the map shard is not held during I/O
        let entry = self
            .logs
            .entry(partition)
            .or_insert_with(|| Arc::new(PartitionLog::new(self.partition_path(partition))));
        Arc::clone(&entry)
    }

    /// Append one event as a newline-terminated JSON record. No retries.
    pub fn write(&self, event: &Event) -> Result<(), GatekeeperError> {
        let partition = event.chosen_partition.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "event has no chosen partition")
        })?;

        let mut line = serde_json::to_vec(event).map_err(io::Error::from)?;
        line.push(b'\n');

        self.log_for(partition)
            .append(&line, self.sync_on_write)
            .map_err(|e| {
                tracing::error!("Failed to append to partition {}: {}", partition, e);
                GatekeeperError::IoFailure(e)
            })
    }

    /// Read every record in a partition log back, oldest first.
    /// A partition that has never been written reads as empty. Lines that
    /// don't decode are skipped with a warning.
    pub fn read_partition(&self, partition: u32) -> Result<Vec<Event>, GatekeeperError> {
        let path = self.partition_path(partition);
        let log = self.logs.get(&partition).map(|entry| Arc::clone(&entry));
        // Hold the append lock so a concurrent writer can't hand us half a line
        let _guard = log.as_ref().map(|log| log.file.lock());

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(
                    "Skipping undecodable record at {}:{}: {}",
                    path.display(),
                    n + 1,
                    e
                ),
            }
        }

        Ok(events)
    }

    /// Counters for every partition touched since startup, by partition id
    pub fn stats(&self) -> Vec<PartitionStats> {
        let mut stats: Vec<PartitionStats> = self
            .logs
            .iter()
            .map(|entry| PartitionStats {
                partition: *entry.key(),
                path: entry.value().path.display().to_string(),
                records_appended: entry.value().appended.load(Ordering::Relaxed),
            })
            .collect();
        stats.sort_by_key(|s| s.partition);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn make_event(partition: u32, n: i64) -> Event {
        Event::new("abcd123EFGH", 1, json!({"n": n, "nested": {"ok": true}}))
            .with_timestamp(Some(1_000 + n))
            .with_partition(partition)
    }

    #[test]
    fn test_write_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let writer = EventWriter::new(temp_dir.path()).unwrap();

        let event = Event::new("abcd123EFGH", 10, json!({"k": 1, "s": "text"}))
            .with_timestamp(Some(1_544_712_660_000))
            .with_partition(2);
        writer.write(&event).unwrap();

        let records = writer.read_partition(2).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.chosen_partition, Some(2));
        assert_eq!(record.timestamp, Some(1_544_712_660_000));
        assert_eq!(record.sample_rate, 10);
        assert_eq!(record.payload, json!({"k": 1, "s": "text"}));
        assert_eq!(record, &event);
    }

    #[test]
    fn test_appends_in_order_per_partition() {
        let temp_dir = TempDir::new().unwrap();
        let writer = EventWriter::new(temp_dir.path()).unwrap();

        for n in 0..5 {
            writer.write(&make_event(1, n)).unwrap();
        }
        writer.write(&make_event(3, 99)).unwrap();

        let ones: Vec<i64> = writer
            .read_partition(1)
            .unwrap()
            .iter()
            .map(|e| e.payload["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ones, vec![0, 1, 2, 3, 4]);
        assert_eq!(writer.read_partition(3).unwrap().len(), 1);
        assert!(writer.read_partition(4).unwrap().is_empty());

        assert!(temp_dir.path().join("api1.log").exists());
        assert!(temp_dir.path().join("api3.log").exists());
    }

    #[test]
    fn test_appends_survive_new_writer() {
        let temp_dir = TempDir::new().unwrap();

        EventWriter::new(temp_dir.path())
            .unwrap()
            .write(&make_event(1, 1))
            .unwrap();

        let writer = EventWriter::new(temp_dir.path()).unwrap().with_sync(true);
        writer.write(&make_event(1, 2)).unwrap();

        assert_eq!(writer.read_partition(1).unwrap().len(), 2);
    }

    #[test]
    fn test_one_record_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let writer = EventWriter::new(temp_dir.path()).unwrap();

        writer.write(&make_event(1, 1)).unwrap();
        writer.write(&make_event(1, 2)).unwrap();

        let contents = std::fs::read_to_string(writer.partition_path(1)).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn test_concurrent_writers_do_not_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let writer = Arc::new(EventWriter::new(temp_dir.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let writer = Arc::clone(&writer);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        let big = "x".repeat(512);
                        let event = Event::new("abcd123EFGH", 1, json!({"t": t, "n": n, "pad": big}))
                            .with_timestamp(Some(n))
                            .with_partition(t % 2);
                        writer.write(&event).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every line must decode; a torn write would fail here
        let total = writer.read_partition(0).unwrap().len() + writer.read_partition(1).unwrap().len();
        assert_eq!(total, 400);

        let stats = writer.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.iter().map(|s| s.records_appended).sum::<u64>(), 400);
    }

    #[test]
    fn test_torn_record_does_not_poison_partition() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("api1.log"),
            "not json at all\n{\"write_key\":\"abcd",
        )
        .unwrap();

        let writer = EventWriter::new(temp_dir.path()).unwrap();
        writer.write(&make_event(1, 1)).unwrap();
        writer.write(&make_event(1, 2)).unwrap();

        let records = writer.read_partition(1).unwrap();
        assert_eq!(records, vec![make_event(1, 1), make_event(1, 2)]);

        let contents = std::fs::read_to_string(writer.partition_path(1)).unwrap();
        assert_eq!(contents.lines().count(), 4);
    }

    #[test]
    fn test_missing_partition_is_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let writer = EventWriter::new(temp_dir.path()).unwrap();

        let event = Event::new("abcd123EFGH", 1, json!({}));
        assert!(matches!(writer.write(&event), Err(GatekeeperError::IoFailure(_))));
    }

    #[test]
    fn test_unwritable_directory_is_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let writer = EventWriter::new(temp_dir.path().join("logs")).unwrap();
        std::fs::remove_dir_all(temp_dir.path().join("logs")).unwrap();

        assert!(matches!(
            writer.write(&make_event(1, 1)),
            Err(GatekeeperError::IoFailure(_))
        ));
    }
}
