//! Console rendering of verdicts, suites and probes
use crate::probe::{ProbeReport, ProbeStatus};
use crate::scenario::ScenarioVerdict;
use crate::suite::SuiteReport;
use authstress_core::Threshold;
use std::fmt;

/// Coarse rating of a success rate, independent of the scenario's own threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Acceptable,
    Failing,
}

impl Grade {
    pub fn of(success_rate_percent: f64) -> Self {
        if success_rate_percent >= 90. {
            Grade::Excellent
        } else if success_rate_percent >= 70. {
            Grade::Acceptable
        } else {
            Grade::Failing
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Excellent => write!(f, "EXCELLENT (success rate >= 90%)"),
            Grade::Acceptable => write!(f, "ACCEPTABLE (success rate >= 70%)"),
            Grade::Failing => write!(f, "FAILING (success rate < 70%)"),
        }
    }
}

impl fmt::Display for ScenarioVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== {} STRESS TEST RESULTS ===",
            self.name.to_uppercase()
        )?;
        writeln!(f, "{}", self.aggregate)?;
        writeln!(f, "Threshold: {}", self.threshold)?;

        // Grading only makes sense for scenarios expected to succeed.
        if let Threshold::AtLeast(_) = self.threshold {
            writeln!(f, "Grade: {}", Grade::of(self.aggregate.success_rate_percent))?;
        }

        for reason in &self.reasons {
            writeln!(f, "  - {reason}")?;
        }
        write!(f, "Verdict: {}", if self.passed { "PASSED" } else { "FAILED" })
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for verdict in &self.verdicts {
            writeln!(f, "{verdict}")?;
            writeln!(f)?;
        }

        writeln!(f, "=== SUMMARY ===")?;
        for verdict in &self.verdicts {
            writeln!(
                f,
                "{:<28} {:>7.2}% success  {}",
                verdict.name,
                verdict.aggregate.success_rate_percent,
                if verdict.passed { "passed" } else { "FAILED" }
            )?;
        }

        let failed = self.failed().count();
        if failed == 0 {
            write!(f, "All {} scenarios passed", self.verdicts.len())
        } else {
            write!(f, "{failed} of {} scenarios failed", self.verdicts.len())
        }
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            write!(f, "{}. {} ({}): ", i + 1, step.name, step.url)?;
            match &step.status {
                ProbeStatus::Responded(status) => write!(f, "status {status}")?,
                ProbeStatus::ConnectionRefused(err) => {
                    write!(f, "connection refused, is the service running? ({err})")?
                }
                ProbeStatus::Unreachable(err) => write!(f, "unreachable ({err})")?,
            }
            if let Some(has_token) = step.has_token {
                write!(f, ", token present: {has_token}")?;
            }
            writeln!(f)?;
        }

        write!(
            f,
            "Reachable: {}, can authenticate: {}",
            self.reachable(),
            self.can_authenticate()
        )
    }
}
