//! Interactive AHI calculator session

use anyhow::Context;
use sleep_ledger::command::{AlertList, Command};
use sleep_ledger::{report, AlertBoard, Config, Session};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  start <stage> <HH:MM|->     set/clear start time (stages: W N1 N2 N3 R)
  end <stage> <HH:MM|->       set/clear end time
  inc <stage> <event>         add one event (oa ca ma oh ch mh)
  dec <stage> <event>         remove one event
  toggle <stage>              activate/deactivate a stage
  dismiss error|warning <n>   hide an alert until the next edit
  show | json | metrics | help | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("AHI_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env()?,
    };

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.default_directive));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    tracing::info!("Starting AHI calculator session");

    let session = Session::open(config)?;
    let input = session.config().input.clone();

    let snapshot = session.handle().snapshot().await?;
    let mut board = AlertBoard::from_view(&snapshot.view);
    println!("{}", HELP);
    println!();
    print!("{}", report::render(&snapshot.rows, &snapshot.view, &board, &input));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line, &input) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Edit(edit) => {
                let receipt = session.handle().apply(edit).await?;
                board.sync(&receipt.snapshot.view);
                print!(
                    "{}",
                    report::render(&receipt.snapshot.rows, &receipt.snapshot.view, &board, &input)
                );
            }
            Command::Dismiss { list, index } => {
                let dismissed = match list {
                    AlertList::Errors => board.dismiss_error(index),
                    AlertList::Warnings => board.dismiss_warning(index),
                };
                if dismissed.is_none() {
                    println!("nothing to dismiss at position {}", index + 1);
                    continue;
                }
                let snapshot = session.handle().latest();
                print!("{}", report::render(&snapshot.rows, &snapshot.view, &board, &input));
            }
            Command::Show => {
                let snapshot = session.handle().latest();
                print!("{}", report::render(&snapshot.rows, &snapshot.view, &board, &input));
            }
            Command::Json => {
                let snapshot = session.handle().snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            Command::Metrics => match session.metrics() {
                Some(metrics) => print!("{}", metrics.gather_text()?),
                None => println!("metrics disabled"),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    session.shutdown().await?;
    tracing::info!("Session ended");
    Ok(())
}
