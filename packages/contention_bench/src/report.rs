//! Console tables for benchmark results.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use crate::{Result, RoundResult};

const SEPARATOR: &str = "============================";

/// Returns `numerator / denominator`, each measured in seconds.
///
/// For positive durations the result is finite, positive and the reciprocal of
/// `ratio(denominator, numerator)`. A zero denominator yields infinity (or NaN if both are
/// zero).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use contention_bench::ratio;
///
/// let slow = Duration::from_millis(300);
/// let fast = Duration::from_millis(100);
/// assert!((ratio(slow, fast) - 3.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn ratio(numerator: Duration, denominator: Duration) -> f64 {
    numerator.as_secs_f64() / denominator.as_secs_f64()
}

/// How much slower (above 1) or faster (below 1) one measurement was than another.
#[derive(Clone, Debug, PartialEq)]
pub struct RatioReport {
    numerator_id: String,
    denominator_id: String,
    ratio: f64,
}

impl RatioReport {
    /// Compares the duration of `numerator` with the duration of `denominator`.
    #[must_use]
    pub fn new(numerator: &RoundResult, denominator: &RoundResult) -> Self {
        Self {
            numerator_id: numerator.test_id().to_owned(),
            denominator_id: denominator.test_id().to_owned(),
            ratio: ratio(numerator.duration(), denominator.duration()),
        }
    }

    /// Identifies the measurement in the numerator.
    #[must_use]
    pub fn numerator_id(&self) -> &str {
        &self.numerator_id
    }

    /// Identifies the measurement in the denominator.
    #[must_use]
    pub fn denominator_id(&self) -> &str {
        &self.denominator_id
    }

    /// The duration of the numerator divided by the duration of the denominator.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl fmt::Display for RatioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{}/{}", self.numerator_id, self.denominator_id);
        write!(f, "{label:<22}: {:.2}", self.ratio)
    }
}

/// Writes benchmark tables to any output, typically standard output.
#[derive(Debug)]
pub struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    /// Creates a reporter writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the reporter, returning the output.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes a free-standing line, such as the warm-up marker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`][crate::Error::Report] if the output cannot be written.
    pub fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    /// Writes the header of a lock comparison round.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`][crate::Error::Report] if the output cannot be written.
    pub fn round_header(&mut self, cycles: u64) -> Result<()> {
        writeln!(self.out, "{SEPARATOR}")?;
        writeln!(self.out, "{:<12} : {cycles:>13}", "Cycles")?;
        Ok(())
    }

    /// Writes the wall clock duration of a round, the total read time, the total write time
    /// and the sum of both, all in nanoseconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`][crate::Error::Report] if the output cannot be written.
    pub fn timing(&mut self, result: &RoundResult) -> Result<()> {
        writeln!(
            self.out,
            "{:<13}: {:>13} {:>14} {:>14} {:>14}",
            result.test_id(),
            result.duration().as_nanos(),
            result.read_time().as_nanos(),
            result.write_time().as_nanos(),
            result.total_time().as_nanos()
        )?;
        Ok(())
    }

    /// Writes one ratio line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`][crate::Error::Report] if the output cannot be written.
    pub fn ratio(&mut self, report: &RatioReport) -> Result<()> {
        writeln!(self.out, "{report}")?;
        Ok(())
    }

    /// Writes the column header of a container comparison.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`][crate::Error::Report] if the output cannot be written.
    pub fn container_header(&mut self) -> Result<()> {
        writeln!(self.out, "{:<27} {:>14} {:>14}", "Type", "Read time", "Write time")?;
        Ok(())
    }

    /// Writes the read and write time of a container round in nanoseconds, followed by their
    /// sum when both are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`][crate::Error::Report] if the output cannot be written.
    pub fn container_timing(&mut self, result: &RoundResult) -> Result<()> {
        let read = result.read_time().as_nanos();
        let write = result.write_time().as_nanos();

        writeln!(self.out, "{:<27} {read:>14} {write:>14}", result.test_id())?;

        if read != 0 && write != 0 {
            writeln!(
                self.out,
                "{:<27} {:>14}",
                "readTime + writeTime =",
                result.total_time().as_nanos()
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use new_zealand::nz;

    use super::*;
    use crate::{AccumulatorTarget, BenchmarkConfig, Harness, Strategy, seeded_values};

    #[test]
    fn ratio_is_reciprocal() {
        let pairs = [
            (Duration::from_nanos(1), Duration::from_nanos(7)),
            (Duration::from_millis(250), Duration::from_micros(3)),
            (Duration::from_secs(4), Duration::from_secs(4)),
        ];

        for (first, second) in pairs {
            let forward = ratio(first, second);
            let backward = ratio(second, first);

            assert!(forward.is_finite() && forward > 0.0);
            assert!((forward * backward - 1.0).abs() < 1e-12);
            assert!((forward - 1.0 / backward).abs() <= forward * 1e-12);
        }
    }

    #[test]
    fn ratio_with_zero_denominator_is_infinite() {
        assert!(ratio(Duration::from_secs(1), Duration::ZERO).is_infinite());
    }

    #[test]
    fn ratio_report_formats_label_and_two_decimals() {
        let report = RatioReport {
            numerator_id: "Monitor".to_owned(),
            denominator_id: "BaseLine".to_owned(),
            ratio: 19.456,
        };

        assert_eq!(report.to_string(), "Monitor/BaseLine      : 19.46");
        assert_eq!(report.numerator_id(), "Monitor");
        assert_eq!(report.denominator_id(), "BaseLine");
    }

    #[test]
    fn round_header_aligns_columns() {
        let mut reporter = Reporter::new(Vec::new());

        reporter.round_header(50_000).unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            output,
            "============================\nCycles       :         50000\n"
        );
    }

    #[test]
    #[cfg(not(miri))] // Runs a real round on the thread pool.
    fn timing_aligns_duration_and_role_totals() {
        let mut harness = Harness::new(nz!(3));
        let target = Arc::new(AccumulatorTarget::new(
            Strategy::Monitor.build(seeded_values(1, 10)),
        ));
        let config = BenchmarkConfig::new("Monitor", 2, 1, nz!(10), nz!(100));
        let result = harness.run_round(&config, target).unwrap();
        let mut reporter = Reporter::new(Vec::new());

        reporter.timing(&result).unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        let line = output.strip_suffix('\n').unwrap();
        assert_eq!(line.len(), 13 + 2 + 13 + 3 * 15);
        assert!(line.starts_with("Monitor      : "));

        let columns = line
            .get(15..)
            .unwrap()
            .split_whitespace()
            .map(|column| column.parse::<u128>().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            columns,
            [
                result.duration().as_nanos(),
                result.read_time().as_nanos(),
                result.write_time().as_nanos(),
                result.read_time().as_nanos() + result.write_time().as_nanos(),
            ]
        );
    }

    #[test]
    fn container_header_names_columns() {
        let mut reporter = Reporter::new(Vec::new());

        reporter.container_header().unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(output.starts_with("Type "));
        assert!(output.trim_end().ends_with("Write time"));
    }
}
