//! Behavior tests for suite execution using Cucumber.
//!
//! Scenarios fork real children, so they run one at a time:
//!
//! ```bash
//! cargo test --test behaviors
//! ```

#[cfg(unix)]
mod steps;

#[cfg(unix)]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    use cucumber::World;
    use steps::suite_execution::SuiteWorld;

    println!("\n=== Running Suite Execution Behavior Tests ===\n");
    SuiteWorld::cucumber()
        .max_concurrent_scenarios(1)
        .fail_on_skipped()
        .run_and_exit("tests/behaviors/features/suite_execution.feature")
        .await;
}

#[cfg(not(unix))]
fn main() {}
