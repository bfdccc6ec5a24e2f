//! Tracker CLI Tool
//!
//! Command-line client for a running match tracker: list the remaining
//! pairings of a draw, print its standings, or keep score of a game at the
//! table and upload it when it is over.
//!
//! Usage:
//!   cargo run --bin tracker-cli -- --help
//!   cargo run --bin tracker-cli remaining --draw single
//!   cargo run --bin tracker-cli standings --draw double
//!   cargo run --bin tracker-cli play --draw single --pairing "Ana vs Mia" --token "secret"

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rally_ledger::scoreboard::{Phase, Scoreboard};
use rally_ledger::types::{Draw, Side};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "tracker-cli")]
#[command(about = "Command-line client for the rally-ledger match tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the tracker service
    #[arg(long, default_value = "http://localhost:8080")]
    url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// List pairings that still have to be played
    Remaining {
        /// Draw name (single, single-final, double, ...)
        #[arg(short, long, default_value = "single")]
        draw: String,
    },
    /// Print the standings of a draw
    Standings {
        /// Draw name (single, single-final, double, ...)
        #[arg(short, long, default_value = "single")]
        draw: String,
    },
    /// Keep score of one game and upload it
    Play {
        /// Draw name (single, single-final, double, ...)
        #[arg(short, long, default_value = "single")]
        draw: String,
        /// Pairing label, e.g. "Ana vs Mia"; the first name plays home
        #[arg(short, long)]
        pairing: String,
        /// Bearer token carrying the write permission
        #[arg(short, long)]
        token: String,
    },
}

struct TrackerClient {
    http: reqwest::Client,
    base_url: String,
}

impl TrackerClient {
    fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str, draw: Draw) -> Result<Value> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(&[("type", draw.as_str())])
            .send()
            .await
            .with_context(|| format!("GET {path} failed"))?;

        let status = response.status();
        let body: Value = response.json().await.context("Response was not JSON")?;
        if !status.is_success() {
            anyhow::bail!("GET {} returned {}: {}", path, status, body);
        }
        Ok(body)
    }

    async fn submit(&self, draw: Draw, token: &str, rows: &[Vec<String>]) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}/api/match", self.base_url))
            .query(&[("type", draw.as_str())])
            .bearer_auth(token)
            .json(rows)
            .send()
            .await
            .context("POST /api/match failed")?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            anyhow::bail!("Upload rejected with {}: {}", status, body);
        }
        Ok(body)
    }
}

fn parse_side(word: &str) -> Option<Side> {
    match word {
        "h" | "home" => Some(Side::Home),
        "a" | "away" => Some(Side::Away),
        _ => None,
    }
}

fn print_board(board: &Scoreboard) {
    let name = |side| board.player(side).unwrap_or("?").to_string();
    let marker = |side| if board.server() == side { "*" } else { " " };
    println!(
        "{}{} {:>2} : {:<2} {}{}   [{:?}]",
        marker(Side::Home),
        name(Side::Home),
        board.score(Side::Home),
        board.score(Side::Away),
        name(Side::Away),
        marker(Side::Away),
        board.phase()
    );
}

fn print_help() {
    println!("Commands:");
    println!("  h | a          point for home / away");
    println!("  undo h | a     take back the last point of a side");
    println!("  swap           swap sides (before start)");
    println!("  serve h | a    choose the first server (before start)");
    println!("  start          start the game");
    println!("  upload         upload the finished game");
    println!("  reset          clear the board");
    println!("  quit           leave");
}

async fn play(client: &TrackerClient, draw: Draw, pairing: &str, token: &str) -> Result<()> {
    let mut board = Scoreboard::new();
    board.select(pairing)?;
    print_help();
    print_board(&board);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();

        let outcome = match words.as_slice() {
            [] => Ok(()),
            ["quit"] | ["q"] => break,
            ["help"] => {
                print_help();
                Ok(())
            }
            ["start"] => board.start(),
            ["swap"] => board.swap_sides(),
            ["reset"] => {
                board.reset();
                board.select(pairing)
            }
            ["serve", side] => match parse_side(side) {
                Some(side) => board.choose_server(side),
                None => Err(anyhow::anyhow!("unknown side '{side}'")),
            },
            ["undo", side] => match parse_side(side) {
                Some(side) => board.undo(side),
                None => Err(anyhow::anyhow!("unknown side '{side}'")),
            },
            ["upload"] => match board.begin_upload() {
                Ok(rows) => match client.submit(draw, token, &rows).await {
                    Ok(receipt) => {
                        println!("Uploaded: {receipt}");
                        board.upload_succeeded()
                    }
                    Err(e) => {
                        eprintln!("{e:#}");
                        board.upload_failed()
                    }
                },
                Err(e) => Err(e),
            },
            [word] => match parse_side(word) {
                Some(side) => board.point(side).map(|phase| {
                    if let Phase::Finished { winner } = phase {
                        println!(
                            "Game over, {} wins. Type 'upload' to save it.",
                            board.player(winner).unwrap_or("?")
                        );
                    }
                }),
                None => Err(anyhow::anyhow!("unknown command '{word}', try 'help'")),
            },
            _ => Err(anyhow::anyhow!("unknown command '{line}', try 'help'")),
        };

        if let Err(e) = outcome {
            eprintln!("❌ {e}");
        }
        print_board(&board);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = TrackerClient::new(&cli.url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Remaining { draw } => {
            let draw: Draw = draw.parse()?;
            let body = client.get("/api/match", draw).await?;
            let pairings = body["remainingMatches"].as_array().cloned().unwrap_or_default();
            println!("📋 {} pairing(s) left in {}", pairings.len(), draw);
            for pairing in pairings {
                println!("  {}", pairing.as_str().unwrap_or_default());
            }
        }
        Commands::Standings { draw } => {
            let draw: Draw = draw.parse()?;
            let body = client.get("/api/rank", draw).await?;
            println!("🏆 Standings for {draw}");
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Play {
            draw,
            pairing,
            token,
        } => {
            let draw: Draw = draw.parse()?;
            play(&client, draw, &pairing, &token).await?;
        }
    }

    Ok(())
}
