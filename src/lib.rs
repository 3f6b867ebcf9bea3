//! forkcase - unit testing with per-test process isolation
//!
//! Tests are grouped into suites with optional before/after procedures.
//! Every phase of every test runs in its own forked child, so a segfault,
//! abort or stray `exit` in one test is reported as an error for that test
//! and the rest of the suite keeps running.
//!
//! ```no_run
//! use forkcase::{check, check_approx, Status, Suite, Verdict};
//!
//! fn sum(s: &mut Status) -> Verdict {
//!     check!(s, 2 + 2 == 4, "sum");
//!     check_approx!(s, 0.1 + 0.2, 0.3, 1e-9, "float sum");
//!     Ok(())
//! }
//!
//! let mut suite = Suite::named("arithmetic");
//! suite.register(sum, "sum");
//! let report = suite.run().expect("runner failed");
//! assert_eq!(report.tally().failures, 0);
//! ```

#[macro_use]
pub mod assertions;

pub mod config;
pub mod error;
pub mod isolation;
pub mod predicates;
pub mod report;
pub mod runner;
pub mod status;
pub mod suite;
pub mod utils;
pub mod wire;

pub use config::{ConfigError, IsolationMode, ReportFormat, RunnerConfig};
pub use error::RunError;
pub use report::{ConsoleReporter, JsonReporter, NullReporter, Reporter, TracingReporter};
pub use runner::{ErrorCause, Outcome, RunSummary, Runner, SuiteReport, Tally, TestReport};
pub use status::{Abort, Status, Verdict};
pub use suite::{Procedure, Suite, TestCase};
