//! Interactive console for sending messages and inspecting state

use anyhow::Result;
use baton_client::osc::{Message, TypedValue};
use baton_client::profiles::demo_message;
use baton_client::{Session, StateStore};
use colored::*;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Parsed console input
#[derive(Debug, PartialEq)]
enum ReplCommand {
    Send(Message),
    Demo,
    State,
    StateJson,
    Help,
    Quit,
    Empty,
}

/// Split a console line on whitespace; double quotes group words
/// (`s:"Guten Tag"`), and `\"` / `\\` escape inside quotes
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            },
            '\\' if quoted => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err("dangling escape at end of line".to_string()),
            },
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            },
            c => {
                current.push(c);
                in_word = true;
            },
        }
    }

    if quoted {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let words = split_words(line)?;
    let mut words = words.iter().map(String::as_str);
    let Some(command) = words.next() else {
        return Ok(ReplCommand::Empty);
    };

    match command {
        "send" => {
            let address = words.next().ok_or("usage: send /address [tag:value ...]")?;
            let args = words
                .map(TypedValue::parse)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?;
            Message::new(address, args)
                .map(ReplCommand::Send)
                .map_err(|e| e.to_string())
        },
        "demo" => Ok(ReplCommand::Demo),
        "state" => match words.next() {
            None => Ok(ReplCommand::State),
            Some("json") => Ok(ReplCommand::StateJson),
            Some(other) => Err(format!("unknown state format '{}', try 'state json'", other)),
        },
        "help" | "?" => Ok(ReplCommand::Help),
        "exit" | "quit" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command '{}', try 'help'", other)),
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  send /address [tag:value ...]   e.g. send /bar s:helloworld i:1234 f:567.89");
    println!("  demo                            send the /bar demo message");
    println!("  state [json]                    show the state store");
    println!("  quit                            exit");
    println!("  tags: s string, i int32, f float32, h int64, d float64, b hex blob, T, F, N");
    println!("  quote values with spaces: send /lang i:2 s:\"Guten Tag\"");
}

fn print_state(store: &StateStore) {
    let snapshot = store.snapshot();
    if snapshot.is_empty() {
        println!("{}", "(no state yet)".dimmed());
        return;
    }
    for (key, value) in snapshot {
        println!("  {} = {}", key.cyan(), value.to_string().green());
    }
}

/// Store snapshot as pretty JSON, keys sorted
fn state_json(store: &StateStore) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&store.snapshot())
}

/// Run the console until `quit`, end of input, or the session closes
///
/// Line editing blocks, so it lives on its own thread and forwards lines here.
pub async fn run_repl(session: Arc<Session>, store: StateStore) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                warn!("Console unavailable: {}", e);
                return;
            },
        };
        loop {
            match rl.readline("osc> ") {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    if line_tx.send(line).is_err() {
                        break;
                    }
                },
                Err(_) => break,
            }
        }
    });

    print_help();

    loop {
        let line = tokio::select! {
            line = line_rx.recv() => match line {
                Some(line) => line,
                None => break,
            },
            _ = session.wait_closed() => {
                println!("{}", "Session closed".yellow());
                break;
            },
        };

        match parse_command(&line) {
            Ok(ReplCommand::Send(message)) => send(&session, &message).await,
            Ok(ReplCommand::Demo) => match demo_message() {
                Ok(message) => send(&session, &message).await,
                Err(e) => println!("{} {}", "error:".red(), e),
            },
            Ok(ReplCommand::State) => print_state(&store),
            Ok(ReplCommand::StateJson) => match state_json(&store) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("{} {}", "error:".red(), e),
            },
            Ok(ReplCommand::Help) => print_help(),
            Ok(ReplCommand::Quit) => break,
            Ok(ReplCommand::Empty) => {},
            Err(e) => println!("{} {}", "error:".red(), e),
        }
    }

    debug!("Console finished");
    Ok(())
}

async fn send(session: &Session, message: &Message) {
    match session.send(message).await {
        Ok(()) => println!("{} {}", "sent".green(), message),
        Err(e) => println!("{} {}", "error:".red(), e),
    }
}
