// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! End-to-end tests of one `upgrade` invocation and the command wrapper.

mod common;

use common::{
    board_parts, config, image, run_upgrade, Action, Call, MockBoard, MockMedium, TEST_LOAD_ADDR,
    TEST_LOAD_SIZE,
};
use flashgate_common::command::{parse_invocation, UPGRADE_USAGE};
use flashgate_common::{
    do_upgrade, AutoContinueTarget, CmdRet, GateOutcome, LoadError, LoadRegion, MediumError,
    Outcome, Part, PostActionFault, Redirect, UpgradeConfig, UpgradeError,
};

// =============================================================================
// Scenarios per post-action kind
// =============================================================================

#[test]
fn test_fw_boot_confirmed() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let data = image(100);
    let mut board = MockBoard::new(&data).typed(b"y");

    let outcome = run_upgrade(&parts, &config(), &mut board, Some("fw")).unwrap();

    assert_eq!(outcome, Outcome::Redirected(Redirect::Boot));
    assert_eq!(board.loads, ["bootfile"]);
    assert_eq!(medium.calls(), [Call::Validate(2), Call::Write(2)]);
    assert_eq!(medium.stored(), data);
    assert_eq!(board.actions, [Action::BootDefault]);
    // No continuation gate after a boot.
    assert_eq!(board.polls, 0);
    assert!(board.output.contains("*** Upgrading Firmware ***"));
    assert!(board.output.contains("Run image after upgrading? (Y/n) y"));
}

#[test]
fn test_fw_boot_declined_reaches_gate() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100)).typed(b"n");

    let outcome = run_upgrade(&parts, &config(), &mut board, Some("fw")).unwrap();

    assert_eq!(outcome, Outcome::Continued(GateOutcome::AutoContinue));
    assert!(board.actions.is_empty());
    assert_eq!(board.polls, 5);
}

#[test]
fn test_bl2_reboot_confirmed() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100)).typed(b"\r");

    let outcome = run_upgrade(&parts, &config(), &mut board, Some("bl2")).unwrap();

    assert_eq!(outcome, Outcome::Redirected(Redirect::Reset));
    assert_eq!(board.actions, [Action::Reset]);
    assert_eq!(board.polls, 0);
}

#[test]
fn test_simg_none_reaches_gate_without_prompt() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100));

    let outcome = run_upgrade(&parts, &config(), &mut board, Some("simg")).unwrap();

    assert_eq!(outcome, Outcome::Continued(GateOutcome::AutoContinue));
    assert_eq!(medium.calls(), [Call::Write(3)]);
    assert!(board.actions.is_empty());
    assert!(!board.output.contains("(Y/n)"));
}

#[test]
fn test_fip_custom_confirmed_runs_hook_then_action() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100)).typed(b"y");

    let outcome = run_upgrade(&parts, &config(), &mut board, Some("fip")).unwrap();

    assert_eq!(outcome, Outcome::Continued(GateOutcome::AutoContinue));
    assert_eq!(
        medium.calls(),
        [
            Call::Validate(1),
            Call::Write(1),
            Call::Hook(1),
            Call::Custom(1)
        ]
    );
}

#[test]
fn test_post_action_sees_loaded_length() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let data = image(100);
    let mut board = MockBoard::new(&data).typed(b"y");
    board.reported_len = Some(60);

    run_upgrade(&parts, &config(), &mut board, Some("fip")).unwrap();

    assert_eq!(medium.stored(), &data[..60]);
    assert_eq!(medium.hook_data(), [data[..60].to_vec()]);
    assert_eq!(medium.custom_data(), [data[..60].to_vec()]);
}

#[test]
fn test_crlf_enter_at_prompt_does_not_interrupt_gate() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100)).typed(b"\r\n");

    let outcome = run_upgrade(&parts, &config(), &mut board, Some("fip")).unwrap();

    assert_eq!(outcome, Outcome::Continued(GateOutcome::AutoContinue));
    assert_eq!(medium.count(&Call::Custom(1)), 1);
    assert_eq!(board.unread(), 0);
    assert_eq!(board.polls, 5);
    assert!(board.actions.is_empty());
}

#[test]
fn test_fip_custom_declined_still_runs_hook() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100)).typed(b"n");

    run_upgrade(&parts, &config(), &mut board, Some("fip")).unwrap();

    assert_eq!(medium.count(&Call::Hook(1)), 1);
    assert_eq!(medium.count(&Call::Custom(1)), 0);
}

#[test]
fn test_fip_custom_failing_hook_fails_after_write() {
    let medium = MockMedium {
        hook_result: Err(MediumError::Verify),
        ..MockMedium::default()
    };
    let parts = board_parts(&medium);
    let data = image(100);
    let mut board = MockBoard::new(&data).typed(b"y");

    let err = run_upgrade(&parts, &config(), &mut board, Some("fip")).unwrap_err();

    assert_eq!(
        err,
        UpgradeError::PostActionFailed(PostActionFault::Hook(MediumError::Verify))
    );
    // The write persisted and is not undone.
    assert_eq!(medium.stored(), data);
    assert_eq!(medium.count(&Call::Custom(1)), 0);
    assert_eq!(board.polls, 0);
}

#[test]
fn test_interactive_upgrade() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100)).typed(b"\n2y");

    let outcome = run_upgrade(&parts, &config(), &mut board, None).unwrap();

    assert_eq!(outcome, Outcome::Redirected(Redirect::Boot));
    assert_eq!(board.loads, ["bootfile"]);
    assert_eq!(board.unread(), 0);
}

#[test]
fn test_write_failure_stops_before_post_action() {
    let medium = MockMedium {
        write_result: Err(MediumError::Erase),
        ..MockMedium::default()
    };
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100)).typed(b"y");

    let err = run_upgrade(&parts, &config(), &mut board, Some("fw")).unwrap_err();

    assert_eq!(err, UpgradeError::WriteFailed(MediumError::Erase));
    assert!(!err.after_write());
    assert!(board.actions.is_empty());
    assert_eq!(board.unread(), 1);
    assert_eq!(board.polls, 0);
}

#[test]
fn test_load_failure_stops_everything() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&[]).failing_load(LoadError::NoData);

    let err = run_upgrade(&parts, &config(), &mut board, Some("bl2")).unwrap_err();

    assert_eq!(err, UpgradeError::LoadFailed(LoadError::NoData));
    assert!(medium.calls().is_empty());
}

// =============================================================================
// Board policy
// =============================================================================

#[test]
fn test_prompt_before_load_asks_first() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let cfg = UpgradeConfig {
        prompt_before_load: true,
        ..UpgradeConfig::DEFAULT
    };
    let mut board = MockBoard::new(&image(100)).typed(b"n");

    let outcome = run_upgrade(&parts, &cfg, &mut board, Some("bl2")).unwrap();

    assert_eq!(outcome, Outcome::Continued(GateOutcome::AutoContinue));
    let prompt_at = board.output.find("Reboot after upgrading?").unwrap();
    let loaded_at = board.output.find("*** Loaded").unwrap();
    assert!(prompt_at < loaded_at);
}

#[test]
fn test_prompt_before_load_still_stops_on_failure() {
    let medium = MockMedium {
        validate_result: Err(MediumError::Invalid),
        ..MockMedium::default()
    };
    let parts = board_parts(&medium);
    let cfg = UpgradeConfig {
        prompt_before_load: true,
        ..UpgradeConfig::DEFAULT
    };
    let mut board = MockBoard::new(&image(100)).typed(b"y");

    let err = run_upgrade(&parts, &cfg, &mut board, Some("bl2")).unwrap_err();

    assert_eq!(err, UpgradeError::ValidationFailed(MediumError::Invalid));
    assert!(board.actions.is_empty());
}

#[test]
fn test_unconfirmed_reboot_policy() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let cfg = UpgradeConfig {
        confirm_post_action: false,
        ..UpgradeConfig::DEFAULT
    };
    let mut board = MockBoard::new(&image(100));

    let outcome = run_upgrade(&parts, &cfg, &mut board, Some("bl2")).unwrap();

    assert_eq!(outcome, Outcome::Redirected(Redirect::Reset));
    assert!(!board.output.contains("(Y/n)"));
}

#[test]
fn test_auto_continue_runs_configured_command() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let cfg = UpgradeConfig {
        auto_continue: AutoContinueTarget::Command("bootmenu"),
        ..UpgradeConfig::DEFAULT
    };
    let mut board = MockBoard::new(&image(100));

    run_upgrade(&parts, &cfg, &mut board, Some("simg")).unwrap();

    assert_eq!(board.actions, [Action::Command("bootmenu".to_string())]);
}

#[test]
fn test_interrupted_gate_enters_console() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut board = MockBoard::new(&image(100));
    board.key_at_poll = Some((2, b'x'));

    let outcome = run_upgrade(&parts, &config(), &mut board, Some("simg")).unwrap();

    assert_eq!(outcome, Outcome::Continued(GateOutcome::Interactive));
    assert_eq!(board.actions, [Action::EnterConsole]);
}

// =============================================================================
// Command wrapper
// =============================================================================

#[test]
fn test_cmd_ret_codes() {
    assert_eq!(CmdRet::Success.code(), 0);
    assert_eq!(CmdRet::Failure.code(), 1);
    assert_eq!(CmdRet::Usage.code(), -1);
    assert_eq!(CmdRet::from(Ok::<(), ()>(())), CmdRet::Success);
    assert_eq!(CmdRet::from(Err::<(), ()>(())), CmdRet::Failure);
}

#[test]
fn test_parse_invocation() {
    let inv = parse_invocation("  upgrade   fw ").unwrap();
    assert_eq!(inv.name, "upgrade");
    assert_eq!(inv.args.as_slice(), ["fw"]);

    let inv = parse_invocation("upgrade").unwrap();
    assert!(inv.args.is_empty());

    assert!(parse_invocation("").is_none());
    assert!(parse_invocation("   ").is_none());
    assert!(parse_invocation("a b c d e").is_none());
}

#[test]
fn test_do_upgrade_too_many_arguments() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let mut buf = vec![0u8; TEST_LOAD_SIZE];
    let mut board = MockBoard::new(&image(10));

    let ret = do_upgrade(
        &["fw", "extra"],
        &parts,
        &config(),
        LoadRegion::new(TEST_LOAD_ADDR, &mut buf),
        &mut board,
    );

    assert_eq!(ret, CmdRet::Usage);
    assert!(board.output.contains(UPGRADE_USAGE));
    assert!(board.loads.is_empty());
}

#[test]
fn test_do_upgrade_not_configured() {
    let parts: Vec<Part<'_, u32>> = Vec::new();
    let mut buf = vec![0u8; TEST_LOAD_SIZE];
    let mut board = MockBoard::new(&image(10));

    let ret = do_upgrade(
        &["fw"],
        &parts,
        &config(),
        LoadRegion::new(TEST_LOAD_ADDR, &mut buf),
        &mut board,
    );

    assert_eq!(ret, CmdRet::Failure);
    assert!(board.output.contains("upgrade is not configured!"));
}

#[test]
fn test_do_upgrade_success_and_failure() {
    let medium = MockMedium::default();
    let parts = board_parts(&medium);
    let cfg = config();

    let mut buf = vec![0u8; TEST_LOAD_SIZE];
    let mut board = MockBoard::new(&image(10));
    let ret = do_upgrade(
        &["simg"],
        &parts,
        &cfg,
        LoadRegion::new(TEST_LOAD_ADDR, &mut buf),
        &mut board,
    );
    assert_eq!(ret, CmdRet::Success);

    let mut board = MockBoard::new(&image(10));
    let ret = do_upgrade(
        &["nope"],
        &parts,
        &cfg,
        LoadRegion::new(TEST_LOAD_ADDR, &mut buf),
        &mut board,
    );
    assert_eq!(ret, CmdRet::Failure);
    assert_eq!(ret.code(), 1);
}
