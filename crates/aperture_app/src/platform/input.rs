use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use aperture_core::Msg;
use aperture_logging::{shell_info, shell_warn};

pub(crate) const HELP: &str =
    "Type to search. Commands: :search, :jobs, :ingest, :quit (Ctrl-C also quits).";

/// Maps one stdin line onto a message. Anything that is not a command is the
/// new search box content.
pub(crate) fn parse_line(line: &str) -> Msg {
    match line.trim() {
        ":search" => Msg::SearchViewOpened,
        ":jobs" => Msg::JobsViewOpened,
        ":ingest" => Msg::IngestClicked,
        ":quit" | ":q" => Msg::ShutdownRequested,
        _ => Msg::QueryChanged(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

/// Reads stdin on its own thread. EOF requests shutdown.
pub(crate) fn spawn_stdin_reader(tx: mpsc::Sender<Msg>) -> io::Result<()> {
    thread::Builder::new()
        .name("aperture-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let msg = match line {
                    Ok(line) => parse_line(&line),
                    Err(err) => {
                        shell_warn!("Failed to read stdin: {}", err);
                        break;
                    }
                };
                if tx.send(msg).is_err() {
                    return;
                }
            }
            shell_info!("stdin closed");
            let _ = tx.send(Msg::ShutdownRequested);
        })?;
    Ok(())
}
