//! forkcase-selftest: runs demonstration suites and checks their tallies
//!
//! Every suite below has a known outcome. The binary runs them with the
//! configured runner and reporter, then compares each suite's tally with the
//! expected one.
//!
//! ## Configuration
//! - `--config <path>`: YAML configuration file (optional)
//! - FORKCASE_CONFIG: configuration file path (optional)
//! - FORKCASE__ISOLATION: `fork` (default) or `in_process`
//! - FORKCASE__PHASE_TIMEOUT_MS: per-phase timeout in milliseconds
//! - FORKCASE__FORMAT: `console` (default), `json` or `tracing`
//! - FORKCASE_LOG: log filter (default: warn)
//!
//! Exits 0 when every tally matches, 1 otherwise.

use std::process;

use tracing::{error, info};

use forkcase::report;
use forkcase::utils::bootstrap::{init_tracing, parse_config_path};
use forkcase::{
    check, check_approx, check_array_eq, check_eq, check_str_eq, fail, Runner, RunnerConfig, Status, Suite, Tally, Verdict,
};

fn addition(s: &mut Status) -> Verdict {
    check!(s, 2 + 2 == 4, "two plus two");
    check_eq!(s, 7 * 6, 42, "product");
    check_approx!(s, 0.1 + 0.2, 0.3, 1e-9, "float sum");
    check_str_eq!(s, "fork", "fork", "names");
    Ok(())
}

fn wrong_product(s: &mut Status) -> Verdict {
    check_eq!(s, 6 * 9, 42, "six by nine");
    Ok(())
}

fn zero_length(s: &mut Status) -> Verdict {
    let x = [1, 2, 3];
    check_array_eq!(s, x, x, 0, "empty comparison");
    Ok(())
}

fn unfinished(s: &mut Status) -> Verdict {
    fail!(s, "not implemented yet");
}

fn segfault(_: &mut Status) -> Verdict {
    // Address 8 is never mapped; the read faults for real.
    let value = unsafe { std::ptr::read_volatile(8 as *const u8) };
    println!("unreachable: {}", value);
    Ok(())
}

fn aborts(_: &mut Status) -> Verdict {
    process::abort();
}

fn exits(_: &mut Status) -> Verdict {
    process::exit(3);
}

fn panics(_: &mut Status) -> Verdict {
    panic!("test body panicked");
}

fn noop() {}

fn broken_setup() {
    panic!("setup failed");
}

fn broken_teardown() {
    panic!("teardown failed");
}

fn expected(total: usize, successes: usize, failures: usize, errors: usize) -> Tally {
    Tally {
        total,
        successes,
        failures,
        errors,
    }
}

/// Whether `runner` survives real crashes. `Runner::new` falls back to
/// in-process isolation where fork is unavailable, so ask the runner rather
/// than the configuration.
fn contains_crashes(runner: &Runner) -> bool {
    runner.isolation_name() == "fork"
}

fn suites(crashes_contained: bool) -> Vec<(Suite, Tally)> {
    let mut assertions = Suite::named("assertions");
    assertions
        .register(addition, "addition")
        .register(wrong_product, "wrong product")
        .register(zero_length, "zero length")
        .register(unfinished, "unfinished");

    let mut containment = Suite::named("containment");
    containment.register(panics, "panics");
    let containment_tally = if crashes_contained {
        containment
            .register(segfault, "segfault")
            .register(aborts, "aborts")
            .register(exits, "exits");
        expected(5, 1, 0, 4)
    } else {
        expected(2, 1, 0, 1)
    };
    containment.register(addition, "still running");

    let mut fixtures = Suite::new("fixtures", Some(noop), Some(broken_teardown));
    fixtures
        .register(addition, "passes despite teardown")
        .register(wrong_product, "fails despite teardown");

    let mut setup = Suite::named("broken setup").with_before(broken_setup);
    setup
        .register(addition, "never runs")
        .register(wrong_product, "never runs either");

    vec![
        (assertions, expected(4, 1, 2, 1)),
        (containment, containment_tally),
        (fixtures, expected(2, 1, 1, 0)),
        (setup, expected(2, 0, 0, 2)),
        (Suite::named("empty"), Tally::default()),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = RunnerConfig::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let runner = Runner::new(&config);
    let mut reporter = report::for_format(config.format);
    info!(isolation = runner.isolation_name(), "Starting forkcase self-test");

    let mut mismatches = 0;
    for (suite, expected) in suites(contains_crashes(&runner)) {
        let tally = runner.run(&suite, reporter.as_mut())?.tally();
        if tally != expected {
            error!(
                suite = suite.name(),
                ?expected,
                actual = ?tally,
                "Self-test tally mismatch"
            );
            mismatches += 1;
        }
    }

    if mismatches > 0 {
        error!(mismatches, "Self-test failed");
        process::exit(1);
    }
    info!("Self-test passed");
    Ok(())
}
