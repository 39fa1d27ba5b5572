// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Tests for the loader protocol and the receive-side session.

use flashgate_common::image::crc32;
use flashgate_common::protocol::{
    parse_ready_line, AckStatus, Command, Response, LOAD_READY_MARKER, MAX_DATA_BLOCK_SIZE,
    MAX_FRAME_SIZE,
};
use flashgate_common::transfer::{LoadSession, Step};
use flashgate_common::LoadError;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

fn block(offset: usize, chunk: &[u8]) -> Command {
    Command::DataBlock {
        offset: offset as u32,
        data: chunk.try_into().unwrap(),
    }
}

/// Feed a complete, well-formed transfer and return the final step.
fn send_all(session: &mut LoadSession, buf: &mut [u8], data: &[u8]) -> Step {
    let begin = Command::Begin {
        size: data.len() as u32,
        crc32: crc32(data),
    };
    assert_eq!(
        session.handle(&begin, buf),
        Step::Continue(Response::Ack(AckStatus::Ok))
    );

    for (i, chunk) in data.chunks(MAX_DATA_BLOCK_SIZE).enumerate() {
        let step = session.handle(&block(i * MAX_DATA_BLOCK_SIZE, chunk), buf);
        assert_eq!(step, Step::Continue(Response::Ack(AckStatus::Ok)));
    }

    session.handle(&Command::Finish, buf)
}

// =============================================================================
// Ready marker
// =============================================================================

#[test]
fn test_parse_ready_line() {
    let line = format!("{} bootfile.fip (196608 bytes max)\r\n", LOAD_READY_MARKER);
    assert_eq!(parse_ready_line(&line), Some(("bootfile.fip", 196608)));
}

#[test]
fn test_parse_ready_line_rejects_other_text() {
    assert_eq!(parse_ready_line("*** Upgrading Firmware ***"), None);
    assert_eq!(parse_ready_line(LOAD_READY_MARKER), None);
    assert_eq!(
        parse_ready_line("## flashgate: ready to receive fw (lots bytes max)"),
        None
    );
}

// =============================================================================
// Framing
// =============================================================================

#[test]
fn test_full_data_block_fits_in_a_frame() {
    let chunk = vec![0u8; MAX_DATA_BLOCK_SIZE];
    let cmd = block(0, &chunk);
    let mut frame = [0u8; MAX_FRAME_SIZE];

    let used = postcard::to_slice_cobs(&cmd, &mut frame).unwrap();
    assert_eq!(*used.last().unwrap(), 0);

    let decoded: Command = postcard::from_bytes_cobs(used).unwrap();
    assert_eq!(decoded, cmd);
}

#[test]
fn test_response_frame() {
    let resp = Response::Loaded {
        size: 4096,
        crc32: 0xCBF4_3926,
    };
    let mut frame = [0u8; 32];

    let used = postcard::to_slice_cobs(&resp, &mut frame).unwrap();
    let decoded: Response = postcard::from_bytes_cobs(used).unwrap();

    assert_eq!(decoded, resp);
}

// =============================================================================
// LoadSession
// =============================================================================

#[test]
fn test_complete_transfer() {
    let data = payload(3000);
    let mut buf = vec![0u8; 4096];
    let mut session = LoadSession::new();

    let step = send_all(&mut session, &mut buf, &data);

    assert_eq!(
        step,
        Step::Done(
            Response::Loaded {
                size: 3000,
                crc32: crc32(&data)
            },
            Ok(3000)
        )
    );
    assert_eq!(&buf[..3000], &data[..]);
    assert!(!session.is_receiving());
}

#[test]
fn test_crc_mismatch() {
    let data = payload(100);
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();

    let begin = Command::Begin {
        size: 100,
        crc32: crc32(&data) ^ 1,
    };
    session.handle(&begin, &mut buf);
    session.handle(&block(0, &data), &mut buf);
    let step = session.handle(&Command::Finish, &mut buf);

    assert_eq!(
        step,
        Step::Done(Response::Ack(AckStatus::CrcError), Err(LoadError::Checksum))
    );
}

#[test]
fn test_begin_larger_than_region() {
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();

    let step = session.handle(&Command::Begin { size: 257, crc32: 0 }, &mut buf);

    assert_eq!(
        step,
        Step::Done(Response::Ack(AckStatus::TooLarge), Err(LoadError::TooLarge))
    );
}

#[test]
fn test_begin_empty_image() {
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();

    let step = session.handle(&Command::Begin { size: 0, crc32: 0 }, &mut buf);

    assert_eq!(
        step,
        Step::Done(Response::Ack(AckStatus::BadCommand), Err(LoadError::NoData))
    );
}

#[test]
fn test_data_beyond_announced_size() {
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();
    session.handle(&Command::Begin { size: 10, crc32: 0 }, &mut buf);

    let step = session.handle(&block(0, &[0u8; 11]), &mut buf);

    assert_eq!(
        step,
        Step::Done(Response::Ack(AckStatus::TooLarge), Err(LoadError::TooLarge))
    );
}

#[test]
fn test_out_of_order_block_is_refused() {
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();
    session.handle(&Command::Begin { size: 20, crc32: 0 }, &mut buf);
    session.handle(&block(0, &[1u8; 10]), &mut buf);

    let step = session.handle(&block(0, &[2u8; 10]), &mut buf);

    assert_eq!(step, Step::Continue(Response::Ack(AckStatus::BadCommand)));
    assert_eq!(session.received(), 10);
    assert_eq!(&buf[..10], &[1u8; 10]);
}

#[test]
fn test_data_before_begin() {
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();

    let step = session.handle(&block(0, &[0u8; 4]), &mut buf);

    assert_eq!(step, Step::Continue(Response::Ack(AckStatus::BadState)));
    assert_eq!(session.received(), 0);
}

#[test]
fn test_begin_twice() {
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();
    session.handle(&Command::Begin { size: 20, crc32: 0 }, &mut buf);

    let step = session.handle(&Command::Begin { size: 30, crc32: 0 }, &mut buf);

    assert_eq!(step, Step::Continue(Response::Ack(AckStatus::BadState)));
    assert!(session.is_receiving());
}

#[test]
fn test_finish_before_all_data() {
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();
    session.handle(&Command::Begin { size: 20, crc32: 0 }, &mut buf);
    session.handle(&block(0, &[0u8; 10]), &mut buf);

    let step = session.handle(&Command::Finish, &mut buf);

    assert_eq!(
        step,
        Step::Done(Response::Ack(AckStatus::BadState), Err(LoadError::Transfer))
    );
}

#[test]
fn test_abort_ends_transfer() {
    let mut buf = vec![0u8; 256];
    let mut session = LoadSession::new();
    session.handle(&Command::Begin { size: 20, crc32: 0 }, &mut buf);

    let step = session.handle(&Command::Abort, &mut buf);

    assert_eq!(
        step,
        Step::Done(Response::Ack(AckStatus::Ok), Err(LoadError::Aborted))
    );
    assert!(!session.is_receiving());
}
