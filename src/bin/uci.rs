//! Universal Chess Interface front end: reads commands from stdin, drives
//! an [`chess_engine::engine::Engine`], and prints `info`/`bestmove` lines
//! to stdout.
//!
//! Tokenizes each line into a command and its arguments, dispatches `go`
//! onto a background search via [`chess_engine::engine::Engine`], and
//! formats progress as standard `info ...` lines.

use std::io::{self, BufRead, Write};

use chess_engine::config::{EngineConfig, TimeControl, UciOptionSpec};
use chess_engine::engine::{Engine, GoRequest};
use chess_engine::search::SearchProgress;
use chess_engine::types;

fn main() {
    let stdin = io::stdin();
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parts: Vec<&str> = trimmed.split_whitespace().collect();

        match parts[0] {
            "uci" => handle_uci(),
            "isready" => println!("readyok"),
            "ucinewgame" => engine.new_game(),
            "position" => handle_position(&mut engine, &parts),
            "go" => handle_go(&mut engine, &parts),
            "stop" => handle_stop(&mut engine),
            "ponderhit" => {
                let _ = engine.ponder_hit(GoRequest::default());
            }
            "setoption" => handle_setoption(&mut engine, &parts),
            "quit" => {
                engine.stop_search();
                break;
            }
            _ => {}
        }
        let _ = io::stdout().flush();
    }
}

fn handle_uci() {
    println!("id name chess_engine");
    println!("id author the chess_engine contributors");
    EngineConfig::for_each_option(|spec| match spec {
        UciOptionSpec::Spin { name, min, max } => {
            println!("option name {name} type spin default {min} min {min} max {max}");
        }
        UciOptionSpec::Check { name } => {
            println!("option name {name} type check default false");
        }
    });
    println!("uciok");
}

fn handle_position(engine: &mut Engine, parts: &[&str]) {
    if parts.len() < 2 {
        return;
    }
    let (root, mut idx) = if parts[1] == "startpos" {
        ("startpos".to_string(), 2)
    } else if parts[1] == "fen" {
        if parts.len() < 8 {
            return;
        }
        (parts[2..8].join(" "), 8)
    } else {
        return;
    };

    let mut moves = Vec::new();
    if idx < parts.len() && parts[idx] == "moves" {
        idx += 1;
        moves.extend_from_slice(&parts[idx..]);
    }

    if let Err(err) = engine.set_position(&root, &moves) {
        eprintln!("info string {err}");
    }
}

fn handle_go(engine: &mut Engine, parts: &[&str]) {
    let mut depth: Option<i32> = None;
    let mut max_nodes: Option<u64> = None;
    let mut movetime: Option<u64> = None;
    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc: Option<u64> = None;
    let mut binc: Option<u64> = None;
    let mut movestogo: Option<u64> = None;
    let mut infinite = false;
    let mut ponder = false;

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                depth = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "nodes" => {
                max_nodes = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "movetime" => {
                movetime = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "wtime" => {
                wtime = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "btime" => {
                btime = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "winc" => {
                winc = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "binc" => {
                binc = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "movestogo" => {
                movestogo = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "infinite" => {
                infinite = true;
                i += 1;
            }
            "ponder" => {
                ponder = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    let white_to_move = engine.position().side_to_move() == types::Color::White;
    let time_control = if infinite || ponder {
        TimeControl::Infinite
    } else if let Some(ms) = movetime {
        TimeControl::MoveTime { time_ms: ms }
    } else {
        let (time_left_ms, inc_ms) = if white_to_move {
            (wtime, winc.unwrap_or(0))
        } else {
            (btime, binc.unwrap_or(0))
        };
        match time_left_ms {
            Some(time_left_ms) => TimeControl::Incremental { time_left_ms, inc_ms, movestogo },
            None => TimeControl::Infinite,
        }
    };

    let request = GoRequest { depth, max_nodes, time_control, ponder };

    let result = engine.start_search(
        request,
        |progress| print_info(&progress),
        |result| {
            let mv = result
                .best_move
                .map(|m| m.to_uci())
                .unwrap_or_else(|| "0000".to_string());
            println!("bestmove {mv}");
            let _ = io::stdout().flush();
        },
    );
    if let Err(err) = result {
        eprintln!("info string {err}");
    }
}

fn handle_stop(engine: &mut Engine) {
    engine.stop_search();
}

fn handle_setoption(engine: &mut Engine, parts: &[&str]) {
    // setoption name <name...> value <value...>
    let Some(name_idx) = parts.iter().position(|p| *p == "name") else { return };
    let value_idx = parts.iter().position(|p| *p == "value");
    let name_end = value_idx.unwrap_or(parts.len());
    let name = parts[name_idx + 1..name_end].join(" ");
    let value = value_idx.map(|vi| parts[vi + 1..].join(" "));
    engine.set_option(&name, value.as_deref());
}

fn print_info(progress: &SearchProgress) {
    let score_str = if types::is_mate_score(progress.score) {
        let sign = if progress.score > 0 { 1 } else { -1 };
        format!("mate {}", sign * types::mate_in_plies(progress.score))
    } else {
        format!("cp {}", progress.score)
    };

    let pv = progress
        .pv
        .iter()
        .map(|m| m.to_uci())
        .collect::<Vec<_>>()
        .join(" ");

    let millis = progress.elapsed.as_millis().max(1) as u64;
    let nps = progress.nodes * 1000 / millis;

    println!(
        "info depth {} score {} nodes {} nps {} time {} pv {}",
        progress.depth,
        score_str,
        progress.nodes,
        nps,
        progress.elapsed.as_millis(),
        pv
    );
}
