//! # Observers
//!
//! The two sinks a run produces: a trace of applied (and skipped)
//! firings, and a CSV of observed symbol counts per step. Both are
//! traits so the driver and its tests can use an in-memory sink
//! instead of touching the filesystem.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::rule::{MoveCode, Rule};
use crate::symbol::Symbol;

/// Receives one line per applied or skipped firing, grouped by step.
pub trait TraceSink {
    fn begin_step(&mut self, step: u64) -> io::Result<()>;
    fn applied(&mut self, mv: MoveCode, membrane_id: &str, k: u32, rule: &Rule) -> io::Result<()>;
    fn not_applied(&mut self, mv: MoveCode, membrane_id: &str, k: u32, rule: &Rule) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Receives one (step, symbol, count) row at a time.
pub trait OutputSink {
    fn record(&mut self, step: u64, symbol: &Symbol, count: u32) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Trace sink writing the append-only text format:
///
/// ```text
/// =============== STEP k ===============
///  - Applying <MOVE> <mem.id> -> <k> x <rule.repr>
/// ```
pub struct FileTraceSink {
    writer: BufWriter<File>,
    current_step: Option<u64>,
}

impl FileTraceSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(FileTraceSink { writer: BufWriter::new(file), current_step: None })
    }

    fn ensure_step_header(&mut self, step: u64) -> io::Result<()> {
        if self.current_step != Some(step) {
            writeln!(self.writer, "=============== STEP {step} ===============")?;
            self.current_step = Some(step);
        }
        Ok(())
    }
}

impl TraceSink for FileTraceSink {
    fn begin_step(&mut self, step: u64) -> io::Result<()> {
        self.ensure_step_header(step)
    }

    fn applied(&mut self, mv: MoveCode, membrane_id: &str, k: u32, rule: &Rule) -> io::Result<()> {
        tracing::debug!(move_code = %mv, membrane_id, multiplicity = k, "firing applied");
        writeln!(self.writer, " - Applying {mv} {membrane_id} -> {k} x {}", rule.canonical_repr())
    }

    fn not_applied(&mut self, mv: MoveCode, membrane_id: &str, k: u32, rule: &Rule) -> io::Result<()> {
        tracing::debug!(move_code = %mv, membrane_id, multiplicity = k, "firing not applied");
        writeln!(self.writer, " - NOT Applied {mv} {membrane_id} -> {k} x {}", rule.canonical_repr())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Output sink writing the `step,object,count` CSV.
pub struct CsvOutputSink {
    writer: BufWriter<File>,
}

impl CsvOutputSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut file = File::create(path)?;
        writeln!(file, "step,object,count")?;
        Ok(CsvOutputSink { writer: BufWriter::new(file) })
    }
}

impl OutputSink for CsvOutputSink {
    fn record(&mut self, step: u64, symbol: &Symbol, count: u32) -> io::Result<()> {
        writeln!(self.writer, "{step},{symbol},{count}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// In-memory trace double, used by tests and by `driver`'s own tests.
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    pub lines: Vec<String>,
    current_step: Option<u64>,
}

impl TraceSink for MemoryTraceSink {
    fn begin_step(&mut self, step: u64) -> io::Result<()> {
        if self.current_step != Some(step) {
            self.lines.push(format!("=============== STEP {step} ==============="));
            self.current_step = Some(step);
        }
        Ok(())
    }

    fn applied(&mut self, mv: MoveCode, membrane_id: &str, k: u32, rule: &Rule) -> io::Result<()> {
        self.lines.push(format!(" - Applying {mv} {membrane_id} -> {k} x {}", rule.canonical_repr()));
        Ok(())
    }

    fn not_applied(&mut self, mv: MoveCode, membrane_id: &str, k: u32, rule: &Rule) -> io::Result<()> {
        self.lines.push(format!(" - NOT Applied {mv} {membrane_id} -> {k} x {}", rule.canonical_repr()));
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory output double.
#[derive(Debug, Default)]
pub struct MemoryOutputSink {
    pub rows: Vec<(u64, Symbol, u32)>,
}

impl OutputSink for MemoryOutputSink {
    fn record(&mut self, step: u64, symbol: &Symbol, count: u32) -> io::Result<()> {
        self.rows.push((step, symbol.clone(), count));
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiset::Multiset;
    use crate::rule::RuleRight;
    use tempfile::tempdir;

    fn rule() -> Rule {
        Rule::new(
            Some("r1".into()),
            Multiset::from_pairs([(Symbol::new("a"), 1)]),
            RuleRight::Simple(Multiset::from_pairs([(Symbol::new("b"), 1)])),
            MoveCode::Here,
            1.0,
            None,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn memory_trace_sink_groups_lines_under_one_step_header() {
        let mut sink = MemoryTraceSink::default();
        sink.begin_step(1).unwrap();
        sink.applied(MoveCode::Here, "skin", 1, &rule()).unwrap();
        sink.begin_step(1).unwrap();
        sink.not_applied(MoveCode::Here, "skin", 1, &rule()).unwrap();
        assert_eq!(sink.lines.len(), 3);
        assert!(sink.lines[0].contains("STEP 1"));
    }

    #[test]
    fn file_trace_sink_writes_expected_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.txt");
        let mut sink = FileTraceSink::create(&path).unwrap();
        sink.begin_step(1).unwrap();
        sink.applied(MoveCode::Here, "skin", 2, &rule()).unwrap();
        sink.flush().unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("=============== STEP 1 ==============="));
        assert!(contents.contains("Applying HERE skin -> 2 x Rule(id=r1"));
    }

    #[test]
    fn csv_output_sink_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = CsvOutputSink::create(&path).unwrap();
        sink.record(0, &Symbol::new("a"), 3).unwrap();
        sink.flush().unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "step,object,count\n0,a,3\n");
    }
}
