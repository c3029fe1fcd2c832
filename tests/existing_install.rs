mod common;

use std::fs;

use common::{Harness, TEMPLATE};
use mc_server_installer::install::{Completion, HaltReason, InstallError, WarningKind};

const USER_CONFIG: &[u8] = b"SERVER_PORT=19132\nRAM=3G\n# tuned by hand\n";

async fn installed() -> Harness {
    let h = Harness::new();
    h.run().await.unwrap();
    fs::write(h.root().join(".env"), USER_CONFIG).unwrap();
    h.runner.clear();
    h
}

#[tokio::test]
async fn update_preserves_the_configuration_bytes() {
    let h = installed().await;
    h.prompter.answer_input("1");

    let report = h.run().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(fs::read(h.root().join(".env")).unwrap(), USER_CONFIG);
    assert!(!h.config.backup_path.exists());
    assert_eq!(h.runner.count("git", "pull"), 1);
    assert_eq!(
        fs::read_to_string(h.root().join("main.py")).unwrap(),
        "print('updated')\n"
    );
}

#[tokio::test]
async fn empty_answer_means_update() {
    let h = installed().await;
    h.prompter.answer_input("");

    h.run().await.unwrap();
    assert_eq!(fs::read(h.root().join(".env")).unwrap(), USER_CONFIG);
}

#[tokio::test]
async fn reinstall_removes_every_old_file() {
    let h = installed().await;
    fs::write(h.root().join("server").join("world.dat"), "old world").unwrap();
    fs::write(h.root().join("notes.txt"), "old").unwrap();
    h.prompter.answer_input("2");

    let report = h.run().await.unwrap();

    assert!(report.is_complete());
    assert!(!h.root().join("server").join("world.dat").exists());
    assert!(!h.root().join("notes.txt").exists());
    // configuration is seeded again from the template, not carried over
    assert_eq!(fs::read_to_string(h.root().join(".env")).unwrap(), TEMPLATE);
    assert_eq!(h.runner.count("git", "clone"), 1);
    assert_eq!(h.runner.count("git", "pull"), 0);
}

#[tokio::test]
async fn reinstall_drops_an_orphaned_backup() {
    let h = installed().await;
    fs::write(&h.config.backup_path, "ORPHAN=1\n").unwrap();
    h.prompter.answer_input("reinstall");

    h.run().await.unwrap();

    assert!(!h.config.backup_path.exists());
    assert_eq!(fs::read_to_string(h.root().join(".env")).unwrap(), TEMPLATE);
}

#[tokio::test]
async fn cancel_stops_without_side_effects() {
    let h = installed().await;
    h.prompter.answer_input("3");

    let report = h.run().await.unwrap();

    assert_eq!(report.completion, Completion::Halted(HaltReason::Cancelled));
    assert!(!h.runner.ran("git"));
    assert!(!h.runner.ran("python"));
    assert_eq!(fs::read(h.root().join(".env")).unwrap(), USER_CONFIG);
    assert!(!h.config.backup_path.exists());
}

#[tokio::test]
async fn cancel_exits_zero() {
    let h = installed().await;
    h.prompter.answer_input("cancel");
    assert_eq!(h.exit_code().await, 0);
}

#[tokio::test]
async fn invalid_choice_is_fatal() {
    let h = installed().await;
    h.prompter.answer_input("9");

    let err = h.run().await.unwrap_err();

    assert!(matches!(err, InstallError::InvalidChoice { ref input } if input == "9"));
    assert!(!h.runner.ran("git"));
    assert_eq!(fs::read(h.root().join(".env")).unwrap(), USER_CONFIG);
}

#[tokio::test]
async fn invalid_choice_exits_one() {
    let h = installed().await;
    h.prompter.answer_input("maybe");
    assert_eq!(h.exit_code().await, 1);
}

#[tokio::test]
async fn stale_backup_is_replaced_with_a_warning() {
    let h = installed().await;
    fs::write(&h.config.backup_path, "STALE=1\n").unwrap();
    h.prompter.answer_input("1");

    let report = h.run().await.unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::StaleBackup);
    assert_eq!(fs::read(h.root().join(".env")).unwrap(), USER_CONFIG);
    assert!(!h.config.backup_path.exists());
}

#[tokio::test]
async fn backup_left_by_an_interrupted_update_is_restored() {
    let h = installed().await;
    // a previous UPDATE stashed the file and was then interrupted
    fs::rename(h.root().join(".env"), &h.config.backup_path).unwrap();
    h.prompter.answer_input("1");

    let report = h.run().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(fs::read(h.root().join(".env")).unwrap(), USER_CONFIG);
    assert!(!h.config.backup_path.exists());
}

#[tokio::test]
async fn failed_pull_keeps_the_previous_version() {
    let h = installed().await;
    h.runner.set_flags(|f| f.pull_fails = true);
    h.prompter.answer_input("1");

    let report = h.run().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::ProjectUpdate);
    assert_eq!(
        fs::read_to_string(h.root().join("main.py")).unwrap(),
        "print('mc-server-termux')\n"
    );
}

#[tokio::test]
async fn failed_pull_without_marker_is_fatal() {
    let h = installed().await;
    fs::remove_file(h.root().join("main.py")).unwrap();
    h.runner.set_flags(|f| f.pull_fails = true);
    h.prompter.answer_input("1");

    let err = h.run().await.unwrap_err();

    assert!(matches!(err, InstallError::FetchValidation { .. }));
    assert!(err.log_locations()[0].ends_with("git-fetch.log"));
    assert!(!h.runner.ran("python"));
}

#[tokio::test]
async fn update_over_a_plain_directory_merges_a_fresh_checkout() {
    let h = Harness::new();
    fs::create_dir_all(h.root().join("server")).unwrap();
    fs::write(h.root().join("server").join("world.dat"), "world").unwrap();
    fs::write(h.root().join("main.py"), "stale").unwrap();
    fs::write(h.root().join(".env"), USER_CONFIG).unwrap();
    h.prompter.answer_input("1");

    let report = h.run().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(
        fs::read_to_string(h.root().join("main.py")).unwrap(),
        "print('mc-server-termux')\n"
    );
    assert!(h.root().join(".git").is_dir());
    assert_eq!(fs::read_to_string(h.root().join("server").join("world.dat")).unwrap(), "world");
    assert_eq!(fs::read(h.root().join(".env")).unwrap(), USER_CONFIG);
}

#[tokio::test]
async fn stale_marker_cannot_validate_a_failed_fetch() {
    let h = Harness::new();
    fs::create_dir_all(h.root()).unwrap();
    fs::write(h.root().join("main.py"), "stale").unwrap();
    h.runner.set_fixture(|f| f.marker = false);
    h.prompter.answer_input("1");

    let err = h.run().await.unwrap_err();
    assert!(matches!(err, InstallError::FetchValidation { .. }));
    assert!(!h.runner.ran("python"));
}
