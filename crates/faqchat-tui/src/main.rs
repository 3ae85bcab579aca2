use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use faqchat_core::{show_contact, AnswerClient, Chat, Config, Message, Sender};
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "faqchat")]
#[command(version, about = "Terminal chat client for an FAQ answer service")]
struct Cli {
    /// Answer service base URL (overrides FAQCHAT_SERVER_URL and the config file)
    #[arg(short, long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: Vec<String>,
    },
    /// Check whether the answer service is up
    Health,
    /// Show support contact details
    Contact,
    /// Print the effective configuration, or change it
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save the answer service base URL to the config file
    SetServer {
        /// Base URL, e.g. http://localhost:5000
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let server_url = config.effective_server_url(cli.server.as_deref());
    let client = AnswerClient::new(&server_url);

    match cli.command {
        None => {
            let _guard = logging::init_file(&config.log_path()?)?;
            tracing::info!(server = %server_url, "starting chat");
            run_tui(client).await
        }
        Some(command) => {
            logging::init_stderr()?;
            match command {
                Commands::Ask { question } => ask_once(&client, &question.join(" ")).await,
                Commands::Health => print_health(&client).await,
                Commands::Contact => {
                    println!("{}", show_contact());
                    Ok(())
                }
                Commands::Config { action: None } => print_config(&config, &server_url),
                Commands::Config { action: Some(ConfigAction::SetServer { url }) } => {
                    let saved = Config::save_server_url(&url)?;
                    tracing::info!(server = %saved.server_url, "saved server url");
                    println!("{} {}", "Server URL set to".green(), saved.server_url.bold());
                    Ok(())
                }
            }
        }
    }
}

async fn run_tui(client: AnswerClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(client);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn ask_once(client: &AnswerClient, question: &str) -> Result<()> {
    let mut chat = Chat::new();
    chat.input = question.to_string();

    if !chat.submit(client).await {
        println!("{}", "Nothing to ask: the question is empty".yellow());
        return Ok(());
    }

    for message in chat.transcript() {
        print_message(message);
    }

    if chat.related_visible() {
        println!("{}", "Related questions:".bold().blue());
        for (i, related) in chat.related().iter().enumerate() {
            let category = related
                .category
                .as_deref()
                .map(|c| format!(" [{}]", c))
                .unwrap_or_default();
            println!("  {}. {}{}", (i + 1).to_string().bold(), related.question, category.dimmed());
        }
    }

    Ok(())
}

fn print_message(message: &Message) {
    match message.sender {
        Sender::User => println!("{} {}", "You:".bold().cyan(), message.text),
        Sender::Bot => {
            let mut header = "Bot:".bold().yellow().to_string();
            if let Some(category) = &message.category {
                header.push_str(&format!(" {}", format!("[{}]", category).dimmed()));
            }
            if let Some(source) = &message.source {
                header.push_str(&format!(" {}", format!("via {}", source).dimmed().italic()));
            }
            println!("{}", header);
            if message.is_error {
                println!("{}", message.text.red());
            } else {
                println!("{}", message.text);
            }
            if let Some(confidence) = message.confidence {
                println!("{}", confidence.to_string().green().italic());
            }
            println!();
        }
    }
}

async fn print_health(client: &AnswerClient) -> Result<()> {
    match client.health().await {
        Ok(health) => {
            let status = if health.is_healthy() {
                health.status.green()
            } else {
                health.status.red()
            };
            println!("{} {}", health.service.bold(), status);
            println!("  endpoint: {}", client.base_url());
            println!("  FAQs loaded: {}", health.faq_count.to_string().bold());
        }
        Err(e) => {
            println!("{}: {:#}", "Answer service unreachable".red(), e);
            println!("Set the address with {} or {}", "--server".bold(), "FAQCHAT_SERVER_URL".bold());
        }
    }
    Ok(())
}

fn print_config(config: &Config, server_url: &str) -> Result<()> {
    println!("{} {}", "config file:".bold(), Config::get_config_path()?.display());
    println!("{} {}", "log file:".bold(), config.log_path()?.display());
    println!("{} {}", "server url:".bold(), server_url);
    if server_url != config.server_url {
        println!("  {}", format!("(config file says {})", config.server_url).dimmed());
    }
    Ok(())
}
