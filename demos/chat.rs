use clap::Parser;
use gemini_live::types::{ResponseModality, Role, SessionConfig};
use gemini_live::{friendly, Client, Config, SessionEvent, TranscriptLog};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Text chat with a live model over a single session.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Model to talk to
    #[arg(long)]
    model: Option<String>,

    /// System instruction for the session
    #[arg(long, default_value = "")]
    system: String,

    /// Thinking budget in tokens, 0 disables thinking
    #[arg(long, default_value_t = 0)]
    thinking_budget: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv_override().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let args = Args::parse();
    let mut session = SessionConfig::builder()
        .with_response_modality(ResponseModality::Text)
        .with_system_instruction(&args.system)
        .with_thinking_budget(args.thinking_budget);
    if let Some(model) = &args.model {
        session = session.with_model(model);
    }

    let (client, mut events) = Client::with_channel(Config::new(), session.build());
    if let Err(e) = client.connect().await {
        anyhow::bail!("{}", friendly::describe(&e));
    }

    tokio::spawn(async move {
        let mut transcript = TranscriptLog::new();
        while let Some(event) = events.recv().await {
            transcript.observe(&event);
            match &event {
                SessionEvent::SetupComplete => println!("[ready]"),
                SessionEvent::TurnComplete | SessionEvent::Interrupted => {
                    for line in transcript.take_final() {
                        if line.role == Role::Model {
                            println!("model: {}", line.text);
                        }
                    }
                }
                SessionEvent::Error(e) => eprintln!("error: {}", friendly::describe(e)),
                SessionEvent::Close(reason) => {
                    println!("[closed] {}", friendly::describe_close(reason));
                    break;
                }
                _ => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        if let Err(e) = client.send_text(line).await {
            eprintln!("error: {}", friendly::describe(&e));
            if e.is_not_connected() {
                break;
            }
        }
    }

    client.disconnect().await;
    let stats = client.stats();
    println!(
        "tokens: total={} prompt={} response={}",
        stats.total_tokens(),
        stats.prompt_tokens(),
        stats.response_tokens()
    );
    Ok(())
}
