//! A simulator wrapper: trace loading and whole runs

use std::path::Path;

use crate::config::SimConfig;
use crate::error::SimulatorResult;
use crate::error::TraceError;
use crate::memory::hierarchy::Hierarchy;
use crate::memory::{Access, AccessType};
use crate::report::Report;
use crate::simulator::Simulator;

/// Parse trace text, one `op address` record per line
pub fn parse_operations(content: &str) -> SimulatorResult<Vec<Access>> {
    let mut operations: Vec<Access> = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line_num = line_num + 1;

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        // Parse the line into op and address
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(TraceError::InvalidFormat(line_num).into());
        }

        let mut op_chars = parts[0].chars();
        let op = match (op_chars.next(), op_chars.next()) {
            (Some(code), None) => AccessType::from_code(code),
            _ => None,
        }
        .ok_or_else(|| {
            TraceError::InvalidOperation(line_num, parts[0].to_string())
        })?;

        let address_str = parts[1];
        let digits = address_str
            .strip_prefix("0x")
            .or_else(|| address_str.strip_prefix("0X"))
            .unwrap_or(address_str);
        let address = u64::from_str_radix(digits, 16).map_err(|_| {
            TraceError::InvalidAddress(line_num, address_str.to_string())
        })?;

        operations.push(Access { op, address });
    }

    Ok(operations)
}

/// Fetch operations from the trace file
pub fn fetch_operations(
    trace_path: impl AsRef<Path>,
) -> SimulatorResult<Vec<Access>> {
    let trace_path = trace_path.as_ref();
    let content = std::fs::read_to_string(trace_path).map_err(|e| {
        TraceError::FileReadError(trace_path.to_path_buf(), e)
    })?;
    parse_operations(&content)
}

/// Replay already loaded operations and return the final hierarchy
pub fn run_trace(
    config: &SimConfig,
    operations: Vec<Access>,
) -> SimulatorResult<Hierarchy> {
    let mut simulator = Simulator::make(config, operations)?;
    simulator.run();

    let hierarchy = simulator.into_hierarchy();
    hierarchy.verify_inclusion()?;
    Ok(hierarchy)
}

/// Run simulation on the given trace file
pub fn run(
    config: &SimConfig,
    trace_path: impl AsRef<Path>,
) -> SimulatorResult<Report> {
    let trace_path = trace_path.as_ref();
    let operations = fetch_operations(trace_path)?;
    log::debug!(
        "loaded {} operations from {}",
        operations.len(),
        trace_path.display()
    );

    let hierarchy = run_trace(config, operations)?;
    let trace_name = trace_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| trace_path.display().to_string());
    Ok(Report::make(config, trace_name, &hierarchy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulatorError;
    use std::io::Write;

    #[test]
    fn test_parse_operations() {
        let operations =
            parse_operations("r ffe04540\n\nw 0x1F\n  R 0Xa  \n").unwrap();
        assert_eq!(
            operations,
            vec![
                Access::read(0xffe0_4540),
                Access::write(0x1f),
                Access::read(0xa),
            ]
        );
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = parse_operations("r 0x0\nx 0x4\n").unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::TraceError(TraceError::InvalidOperation(2, _))
        ));

        let err = parse_operations("r 0x0 extra\n").unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::TraceError(TraceError::InvalidFormat(1))
        ));

        let err = parse_operations("w zz\n").unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::TraceError(TraceError::InvalidAddress(1, _))
        ));

        let err = parse_operations("rw 0x10\n").unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::TraceError(TraceError::InvalidOperation(1, _))
        ));
    }

    #[test]
    fn test_fetch_missing_file() {
        let err = fetch_operations("/nonexistent/trace.txt").unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::TraceError(TraceError::FileReadError(..))
        ));
    }

    #[test]
    fn test_run_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "r 0x0\nr 0x10\nr 0x0").unwrap();

        let config = SimConfig::single_level(
            16,
            crate::config::LevelConfig::make(256, 1),
            Default::default(),
        );
        let report = run(&config, file.path()).unwrap();
        assert_eq!(report.l1.stats.reads, 3);
        assert_eq!(report.l1.stats.read_misses, 2);
        assert!(report.l2.is_none());
    }
}
