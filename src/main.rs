use anyhow::Result;
use aria::config::AssistantConfig;
use aria::convo::{AssistantPipeline, ConversationLoop, LoopCommand, LoopEvent};
use aria::llm::GroqTurnStream;
use aria::speech::GroqSpeech;
use aria::store::{MemorySessionStore, RestSessionStore, SessionStore};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aria=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aria CRM assistant");

    let mut config = AssistantConfig::default()
        .with_credential(std::env::var("GROQ_API_KEY").unwrap_or_default());
    if let Ok(model) = std::env::var("GROQ_MODEL") {
        info!(%model, "model override from environment");
        config = config.with_model(model);
    }

    let store: Arc<dyn SessionStore> = match (
        std::env::var("SUPABASE_URL"),
        std::env::var("SUPABASE_KEY"),
    ) {
        (Ok(url), Ok(key)) => Arc::new(RestSessionStore::new(url, key)?),
        _ => {
            warn!("no storage endpoint configured, sessions will not survive restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let llm = Arc::new(GroqTurnStream::new(config.base_url.clone())?);
    let speech = Arc::new(
        GroqSpeech::new(config.base_url.clone(), config.credential.clone())?
            .with_voice(config.tts_voice.clone())
            .with_speed(config.tts_speed),
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    print!("Business name: ");
    stdout.flush()?;
    let mut business = String::new();
    stdin.lock().read_line(&mut business)?;
    let user_key = normalize_user_key(&business);
    if user_key.is_empty() {
        anyhow::bail!("a business name is required");
    }

    let convo = ConversationLoop::new(config, llm, speech, store, user_key);
    let pipeline = AssistantPipeline::start(convo);

    pipeline.send(LoopCommand::Greet)?;
    drain_until_settled(&pipeline)?;

    println!("Type a message, or /quit to exit.");
    for line in stdin.lock().lines() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }
        if text == "/new" {
            pipeline.send(LoopCommand::NewChat)?;
            pipeline.send(LoopCommand::Greet)?;
            drain_until_settled(&pipeline)?;
            continue;
        }
        if text == "/history" {
            pipeline.send(LoopCommand::ListSessions)?;
            drain_until_settled(&pipeline)?;
            continue;
        }

        pipeline.send(LoopCommand::Submit(text.to_string()))?;
        drain_until_settled(&pipeline)?;
    }

    Ok(())
}

/// Lowercase alphanumerics with everything else collapsed to
/// underscores, so "Acme Pvt. Ltd" and "acme pvt ltd" share a key
fn normalize_user_key(name: &str) -> String {
    let mut key = String::new();
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c);
        } else if !key.ends_with('_') && !key.is_empty() {
            key.push('_');
        }
    }
    key.trim_end_matches('_').to_string()
}

/// Print events until the pipeline finishes the current command
fn drain_until_settled(pipeline: &AssistantPipeline) -> Result<()> {
    loop {
        match pipeline.recv()? {
            LoopEvent::Fragment(fragment) => {
                print!("{}", fragment);
                std::io::stdout().flush()?;
            }
            LoopEvent::TurnFinalized(_) => {
                println!();
                return Ok(());
            }
            LoopEvent::Greeting(greeting) => {
                println!("{}", greeting);
                return Ok(());
            }
            LoopEvent::SessionList(sessions) => {
                for s in &sessions {
                    println!(
                        "{}  {}  ({} rows)",
                        s.session_id, s.title, s.message_count
                    );
                }
                return Ok(());
            }
            LoopEvent::SessionSaved(session_id) => {
                info!(%session_id, "session saved");
            }
            LoopEvent::SessionLoaded { session_id, turns } => {
                info!(%session_id, turns = turns.len(), "session loaded");
            }
            LoopEvent::SpeechReady(_) => {}
            LoopEvent::Warning(message) => {
                warn!("{}", message);
                return Ok(());
            }
            LoopEvent::Error(message) => {
                anyhow::bail!(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_user_key() {
        assert_eq!(normalize_user_key("Acme Pvt. Ltd"), "acme_pvt_ltd");
        assert_eq!(normalize_user_key("  acme  "), "acme");
        assert_eq!(normalize_user_key("!!"), "");
    }
}
