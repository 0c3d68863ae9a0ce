//! Interactive terminal for the campus chat endpoint.
//!
//! ```bash
//! campus-chat-client --endpoint http://127.0.0.1:3000
//! CHAT_ENDPOINT=https://chat.example.ac.th campus-chat-client --no-stream
//! ```

use std::{
    error::Error,
    io::{self, Write},
    time::Duration,
};

use ai_llm_service::telemetry;
use chat_client::{ChatSession, ChatTransport, Role, TYPING_DELAY};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "campus-chat-client")]
#[command(about = "Ask the campus assistant questions from the terminal")]
#[command(version)]
struct Cli {
    /// Server root URL.
    #[arg(long, env = "CHAT_ENDPOINT", default_value = "http://127.0.0.1:3000")]
    endpoint: String,

    /// Ask for whole answers instead of streamed ones.
    #[arg(long)]
    no_stream: bool,

    /// Delay between revealed characters, in milliseconds. 0 prints at once.
    #[arg(long, default_value_t = TYPING_DELAY.as_millis() as u64)]
    typing_ms: u64,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Writes the session's typed view of the latest answer to the terminal.
///
/// The session owns the typing projection; this only paces `tick` and turns
/// successive renders into terminal output. Rendering can restyle the line
/// being typed (a list number gaining its period), so a changed last line is
/// redrawn in place.
struct Printer {
    delay: Duration,
    printed: String,
    notice_shown: bool,
    settled: bool,
}

impl Printer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            printed: String::new(),
            notice_shown: false,
            settled: false,
        }
    }

    async fn catch_up(&mut self, session: &mut ChatSession) {
        let Some(index) = session.messages().len().checked_sub(1) else {
            return;
        };
        if self.settled || session.messages()[index].role != Role::Bot {
            return;
        }

        if session.pending_index() == Some(index) {
            if !self.notice_shown {
                if let Some(notice) = session.image_view(index).notice() {
                    println!("{notice}");
                    self.notice_shown = true;
                }
            }
            let step = if self.delay.is_zero() { usize::MAX } else { 1 };
            while session.tick(step) {
                self.show(session.display_text(index).as_deref().unwrap_or_default());
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
            }
            return;
        }

        // Settled: whole content, then the illustration if any.
        self.settled = true;
        self.show(session.display_text(index).as_deref().unwrap_or_default());
        println!();
        if let Some(notice) = session.image_view(index).notice() {
            println!("{notice}");
        }
    }

    fn show(&mut self, now: &str) {
        if let Some(rest) = now.strip_prefix(self.printed.as_str()) {
            print!("{rest}");
        } else {
            let line_start = self.printed.rfind('\n').map_or(0, |i| i + 1);
            match now.get(..line_start) {
                Some(head) if head == &self.printed[..line_start] => {
                    print!("\r\x1b[2K{}", &now[line_start..]);
                }
                // Earlier lines changed, e.g. a failure replaced the answer.
                _ => print!("\n{now}"),
            }
        }
        let _ = io::stdout().flush();
        self.printed = now.to_string();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(telemetry::env_filter("warn"))
        .with(telemetry::layer())
        .try_init()?;

    let transport = ChatTransport::new(&cli.endpoint, cli.timeout_secs.map(Duration::from_secs))?;
    let delay = Duration::from_millis(cli.typing_ms);
    let mut session = ChatSession::new(!cli.no_stream);

    println!("เชื่อมต่อกับ {} (พิมพ์ /quit เพื่อออก)", transport.url());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "/quit" | "/exit") {
            break;
        }

        session.set_input(line);
        let Some(request) = session.submit() else {
            continue;
        };

        let mut printer = Printer::new(delay);
        transport
            .exchange(&mut session, &request, async |s: &mut ChatSession| {
                printer.catch_up(s).await
            })
            .await;
    }

    Ok(())
}
