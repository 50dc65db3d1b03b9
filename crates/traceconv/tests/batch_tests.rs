use assert_fs::prelude::*;
use assert_fs::TempDir;
use assert_matches::assert_matches;
use predicates::prelude::*;

use tracecodec::{Decoded, Event, LineError, LineErrorKind, Words};
use traceconv::batch::{self, InputFormat, Mode};
use traceconv::config::{Config, LockIdMode, ValueMode};

const SCENARIO: &str = "\
T2|fork(T1)|0
T20|acq(L2a45c47085)|361
T20|rel(L2a45c47085)|361
";

fn recorded() -> Config {
    Config {
        values: ValueMode::Recorded,
        ..Config::default()
    }
}

#[test]
fn canonicalize_directory() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    input.child("a.std").write_str(SCENARIO).unwrap();
    input.child("b.std").write_str("T1|join(T21)|358\n").unwrap();
    input.child("notes.md").write_str("not a trace").unwrap();

    let summary = batch::run(input.path(), output.path(), Mode::Canonicalize, &Config::default())
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.converted.len(), 2);
    output
        .child("a.txt")
        .assert("Fork 2 1 0\nBegin 1 0 0\nAcq 20 0 0\nRel 20 0 0");
    output.child("b.txt").assert("End 21 0 0\nJoin 1 21 0");
    output.child("notes.txt").assert(predicate::path::missing());
}

#[test]
fn failing_file_does_not_stop_batch() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    input.child("bad.std").write_str("T1|acq(L1)|0\nT1|lock(L1)|0\n").unwrap();
    input.child("good.std").write_str(SCENARIO).unwrap();

    let summary = batch::run(input.path(), output.path(), Mode::Canonicalize, &Config::default())
        .unwrap();

    assert!(!summary.is_success());
    assert_eq!(summary.converted, vec![input.child("good.std").path().to_path_buf()]);
    assert_eq!(summary.failed.len(), 1);

    let (path, err) = &summary.failed[0];
    assert_eq!(path, input.child("bad.std").path());
    assert_matches!(
        err.downcast_ref::<tracecodec::ConvertError>(),
        Some(tracecodec::ConvertError::Line(LineError {
            line: 2,
            kind: LineErrorKind::UnknownAction(_)
        }))
    );

    output.child("bad.txt").assert(predicate::path::missing());
    output.child("good.txt").assert(predicate::path::exists());
}

#[test]
fn registries_are_per_file() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    input.child("a.std").write_str("T1|acq(La)|0\nT1|acq(Lb)|0\n").unwrap();
    input.child("b.std").write_str("T1|acq(Lb)|0\n").unwrap();

    batch::run(input.path(), output.path(), Mode::Canonicalize, &Config::default()).unwrap();

    output.child("a.txt").assert("Acq 1 0 0\nAcq 1 1 0");
    output.child("b.txt").assert("Acq 1 0 0");
}

#[test]
fn shared_lock_ids_with_recorded_values() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    input
        .child("t.std")
        .write_str("T20|w(Vx)|362\nT20|acq(Lm)|361\nT20|r(Vx)|374\n")
        .unwrap();

    let config = Config {
        lock_ids: LockIdMode::Shared,
        ..recorded()
    };
    batch::run(input.path(), output.path(), Mode::Canonicalize, &config).unwrap();

    output
        .child("t.txt")
        .assert("Write 20 X_0 362\nAcq 20 1 0\nRead 20 X_0 374");
}

#[test]
fn seeded_values_are_reproducible() {
    let input = TempDir::new().unwrap();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    input
        .child("t.std")
        .write_str("T1|w(Va)|0\nT1|r(Va)|0\nT2|w(Vb)|0\n")
        .unwrap();

    let config = Config {
        seed: Some(42),
        ..Config::default()
    };
    batch::run(input.path(), first.path(), Mode::Canonicalize, &config).unwrap();
    batch::run(input.path(), second.path(), Mode::Canonicalize, &config).unwrap();

    let a = std::fs::read_to_string(first.child("t.txt").path()).unwrap();
    let b = std::fs::read_to_string(second.child("t.txt").path()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn raw_and_canonical_encoding_agree() {
    let raw = TempDir::new().unwrap();
    let canonical = TempDir::new().unwrap();
    let direct = TempDir::new().unwrap();
    let indirect = TempDir::new().unwrap();
    raw.child("t.std")
        .write_str("T2|fork(T1)|0\nT1|w(Va)|7\nT1|acq(La)|0\nT1|r(Va)|7\nT1|rel(La)|0\nT2|join(T1)|0\n")
        .unwrap();

    let config = recorded();
    batch::run(raw.path(), canonical.path(), Mode::Canonicalize, &config).unwrap();
    batch::run(raw.path(), direct.path(), Mode::Encode(InputFormat::Raw), &config).unwrap();
    batch::run(
        canonical.path(),
        indirect.path(),
        Mode::Encode(InputFormat::Canonical),
        &config,
    )
    .unwrap();

    let direct = std::fs::read(direct.child("t.bin").path()).unwrap();
    let indirect = std::fs::read(indirect.child("t.bin").path()).unwrap();
    assert_eq!(direct, indirect);

    let events: Vec<_> = Words::new(direct.as_slice())
        .map(|w| tracecodec::decode(w.unwrap()))
        .collect();
    assert_eq!(
        events,
        vec![
            Decoded::Event(Event::write(1, 0, 7)),
            Decoded::Event(Event::acquire(1, 0)),
            Decoded::Event(Event::read(1, 0, 7)),
            Decoded::Event(Event::release(1, 0)),
        ]
    );
}

#[test]
fn encode_rejects_out_of_range_thread() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    input.child("t.txt").write_str("Read 256 X_0 1\n").unwrap();

    let summary = batch::run(
        input.path(),
        output.path(),
        Mode::Encode(InputFormat::Canonical),
        &Config::default(),
    )
    .unwrap();

    assert_eq!(summary.failed.len(), 1);
    output.child("t.bin").assert(predicate::path::missing());
}

#[test]
fn recursive_walk() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    input.child("top.std").write_str("T1|acq(L)|0\n").unwrap();
    input.child("nested/deep.std").write_str("T1|rel(L)|0\n").unwrap();
    input.child(".hidden/skip.std").write_str("T1|rel(L)|0\n").unwrap();

    let flat = batch::collect_inputs(input.path(), "std", false).unwrap();
    assert_eq!(flat, vec![input.child("top.std").path().to_path_buf()]);

    let config = Config {
        recursive: true,
        ..Config::default()
    };
    let summary = batch::run(input.path(), output.path(), Mode::Canonicalize, &config).unwrap();
    assert_eq!(summary.converted.len(), 2);
    output.child("top.txt").assert("Acq 1 0 0");
    output.child("nested/deep.txt").assert("Rel 1 0 0");
    output.child("deep.txt").assert(predicate::path::missing());
    output.child(".hidden").assert(predicate::path::missing());
}

#[test]
fn recursive_outputs_keep_relative_paths() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    input.child("a.std").write_str("T1|acq(L)|0\n").unwrap();
    input.child("sub/a.std").write_str("T9|rel(L)|0\n").unwrap();

    let config = Config {
        recursive: true,
        ..Config::default()
    };
    let summary = batch::run(input.path(), output.path(), Mode::Canonicalize, &config).unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.converted.len(), 2);
    output.child("a.txt").assert("Acq 1 0 0");
    output.child("sub/a.txt").assert("Rel 9 0 0");
}

#[test]
fn single_file_input() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    input.child("t.std").write_str("T4|acq(L)|0\n").unwrap();

    let summary = batch::run(
        input.child("t.std").path(),
        output.path(),
        Mode::Canonicalize,
        &Config::default(),
    )
    .unwrap();

    assert!(summary.is_success());
    output.child("t.txt").assert("Acq 4 0 0");
}

#[test]
fn print_truncated_binary() {
    let dir = TempDir::new().unwrap();
    let word = tracecodec::encode(&Event::write(3, 4, 5)).unwrap();
    let mut data = word.to_le_bytes().to_vec();
    data.extend_from_slice(&[9, 9, 9, 9]);
    dir.child("t.bin").write_binary(&data).unwrap();

    let mut out = Vec::new();
    let err = batch::print_binary(dir.child("t.bin").path(), &mut out).unwrap_err();

    assert_matches!(
        err.downcast_ref::<tracecodec::DecodeError>(),
        Some(tracecodec::DecodeError::Truncated { offset: 8, len: 4 })
    );
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, format!("Raw event (uint64_t): {}\nwrite 3 4 5\n\n", word));
}

#[test]
fn print_complete_binary() {
    let dir = TempDir::new().unwrap();
    let mut data = Vec::new();
    for event in [Event::acquire(1, 0), Event::release(1, 0)] {
        data.extend_from_slice(&tracecodec::encode(&event).unwrap().to_le_bytes());
    }
    dir.child("t.bin").write_binary(&data).unwrap();

    let mut out = Vec::new();
    let words = batch::print_binary(dir.child("t.bin").path(), &mut out).unwrap();
    assert_eq!(words, 2);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("acq 1 0 0\n"));
    assert!(text.contains("rel 1 0 0\n"));
}
