//! Line-oriented method-call interface
//!
//! Each stdin line is `method [json-arguments]`, e.g.
//! `start {"localName": "Sensor", "serviceUuids": ["180D"]}`. Replies and
//! state changes are printed as one JSON object per line. With a simulated
//! radio, `sim connect|disconnect|power-off|power-on` plays the outside world.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::app::PeripheralApp;
use crate::error::{CliError, Result};

/// Simulated outside-world action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimAction {
    Connect,
    Disconnect,
    PowerOff,
    PowerOn,
}

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum InputLine {
    Empty,
    Quit,
    Call { method: String, args: Option<Value> },
    Sim(SimAction),
}

/// Parse one input line
pub fn parse_line(line: &str) -> Result<InputLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(InputLine::Empty);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "quit" | "exit" => Ok(InputLine::Quit),
        "sim" => {
            let action = match rest {
                "connect" => SimAction::Connect,
                "disconnect" => SimAction::Disconnect,
                "power-off" => SimAction::PowerOff,
                "power-on" => SimAction::PowerOn,
                other => return Err(CliError::InvalidInput(format!("unknown sim action '{}'", other))),
            };
            Ok(InputLine::Sim(action))
        }
        method => {
            let args = if rest.is_empty() {
                None
            } else {
                Some(serde_json::from_str(rest)?)
            };
            Ok(InputLine::Call {
                method: method.to_string(),
                args,
            })
        }
    }
}

/// Run the interactive loop until EOF or `quit`
pub async fn run(app: &PeripheralApp) -> Result<()> {
    let session = app.session();
    session.subscribe(|state| {
        println!("{}", json!({ "event": state }));
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_line(&line) {
            Ok(input) => input,
            Err(e) => {
                println!("{}", json!({ "error": e.to_string() }));
                continue;
            }
        };

        match input {
            InputLine::Empty => {}
            InputLine::Quit => break,
            InputLine::Call { method, args } => {
                debug!("Dispatching {}", method);
                let reply = match session.method_call(&method, args.as_ref()).await {
                    Ok(result) => json!({ "method": method, "result": result }),
                    Err(e) => json!({ "method": method, "error": e.to_string() }),
                };
                println!("{}", reply);
            }
            InputLine::Sim(action) => {
                let Some(radio) = app.radio() else {
                    println!("{}", json!({ "error": "sim actions need --simulate" }));
                    continue;
                };
                match action {
                    SimAction::Connect => {
                        radio.connect_central();
                    }
                    SimAction::Disconnect => {
                        radio.disconnect_central();
                    }
                    SimAction::PowerOff => radio.power_off(),
                    SimAction::PowerOn => radio.power_on(),
                }
            }
        }
    }

    session.unsubscribe();
    Ok(())
}
