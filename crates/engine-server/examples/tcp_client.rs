use std::env;
use std::io::{self, Write};
use std::time::Duration;

use engine_protocol::csv_codec::parse_input_line;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Where to connect: env override or default.
    let addr = env::var("ENGINE_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:9000".to_string());

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut responses = BufReader::new(read_half).lines();
    println!("Connected.");
    println!("Type CSV commands like:");
    println!("  CREATE, o1, alice, BTC/USD, BUY, 0.5, 63500");
    println!("  DELETE, o1");
    println!("  BOOK");
    println!("  TRADES");
    println!("Type 'quit' or 'exit' to leave.\n");

    let stdin = io::stdin();

    loop {
        // Print whatever the server pushed (greeting, broadcasts, answers)
        // until it goes quiet for a moment.
        while let Ok(Ok(Some(line))) =
            timeout(Duration::from_millis(150), responses.next_line()).await
        {
            println!("<< {}", line);
        }

        print!(">> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            println!("\nEOF on stdin, exiting client.");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            println!("Exiting client.");
            break;
        }

        // Catch typos locally instead of waiting for the server's E line.
        if let Err(e) = parse_input_line(trimmed) {
            eprintln!("Could not parse line: {}", e);
            continue;
        }

        write_half.write_all(trimmed.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
    }

    Ok(())
}
