use assert_cmd::Command;
use predicates::prelude::*;

// Points the FinMind credential at an env var that is never set, so every
// fetch fails locally with a config error and nothing touches the network.
const NO_TOKEN_YAML: &str = r#"
data:
  provider: finmind
  providers:
    finmind:
      token_env: WR_TEST_TOKEN_THAT_IS_NEVER_SET
"#;

fn wr(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wr").expect("binary");
    cmd.current_dir(dir.path())
        .env_remove("FINMIND_TOKEN")
        .env_remove("WR_TEST_TOKEN_THAT_IS_NEVER_SET")
        .env("RUST_LOG", "warn");
    cmd
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> String {
    let path = dir.path().join("base.yaml");
    std::fs::write(&path, body).expect("write config");
    path.to_string_lossy().to_string()
}

#[test]
fn backtest_without_credential_reports_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(&dir, NO_TOKEN_YAML);

    wr(&dir)
        .args(["backtest", "--ticker", "2330", "--config", &cfg, "--as-of", "2024-06-28"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ticker=2330 provider=finmind start=2023-12-31 end=2024-06-28"))
        .stdout(predicate::str::contains("status=no_data"))
        .stdout(predicate::str::contains("status=ok").not());
}

#[test]
fn out_of_range_threshold_fails_before_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(&dir, NO_TOKEN_YAML);

    wr(&dir)
        .args(["backtest", "--ticker", "2330", "--config", &cfg, "--threshold", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_THRESHOLD_OUT_OF_RANGE"))
        .stdout(predicate::str::contains("status=").not());
}

#[test]
fn unknown_provider_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    wr(&dir)
        .args(["backtest", "--ticker", "2330", "--provider", "bloomberg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid provider 'bloomberg'"));
}

#[test]
fn rank_with_every_ticker_unavailable_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(&dir, NO_TOKEN_YAML);

    wr(&dir)
        .args([
            "rank", "--config", &cfg, "--tickers", "2330,2317", "--as-of", "2024-06-28",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "range=2023-12-31~2024-06-28 provider=finmind source=fresh requested=2 ranked=0 skipped=2",
        ))
        .stdout(predicate::str::contains("skipped ticker=2330"))
        .stdout(predicate::str::contains("skipped ticker=2317"))
        .stdout(predicate::str::contains("rank=1").not());

    // Ad hoc lists never write the ranking cache.
    assert!(!dir.path().join("wr_ranking.csv").exists());
}

#[test]
fn fundamentals_without_credential_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(&dir, NO_TOKEN_YAML);

    wr(&dir)
        .args(["fundamentals", "--ticker", "2330", "--config", &cfg, "--as-of", "2024-06-28"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ticker=2330 provider=finmind as_of=2024-06-28"))
        .stdout(predicate::str::contains("status=unavailable"));
}

#[test]
fn rank_rejects_out_of_range_three_day_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(&dir, NO_TOKEN_YAML);

    wr(&dir)
        .args(["rank", "--config", &cfg, "--tickers", "2330", "--three-day-threshold", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_THRESHOLD_OUT_OF_RANGE --three-day-threshold=9"));
}
