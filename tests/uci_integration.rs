//! Smoke test for the `chess_engine_uci` binary: feeds it a short UCI
//! session over stdin and checks the printed `bestmove` is a legal reply.

use std::io::Write;
use std::process::{Command, Stdio};

use chess_engine::movegen::get_move_from_uci;
use chess_engine::position::Position;

#[test]
fn uci_smoke_test_returns_legal_move() {
    let exe = env!("CARGO_BIN_EXE_chess_engine_uci");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn engine binary");

    let input = b"uci\nisready\nposition startpos moves e2e4\ngo movetime 50\nquit\n";
    child.stdin.as_mut().unwrap().write_all(input).unwrap();

    let output = child.wait_with_output().expect("failed to read output");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("uciok"));
    assert!(stdout.contains("readyok"));

    let bestmove_line = stdout
        .lines()
        .filter(|line| line.starts_with("bestmove"))
        .last()
        .expect("no bestmove found");
    let parts: Vec<&str> = bestmove_line.split_whitespace().collect();
    assert!(parts.len() >= 2, "bestmove missing move: {bestmove_line}");
    let mv = parts[1];
    assert_ne!(mv, "0000", "engine returned null move");

    let mut pos = Position::startpos();
    let e4 = get_move_from_uci(&mut pos, "e2e4").expect("e2e4 should be legal from startpos");
    pos.do_move(e4);

    assert!(get_move_from_uci(&mut pos, mv).is_some(), "bestmove {mv} was not legal in the position");
}
