//! Line-oriented chat client.
//!
//! ```text
//! chat-client --user t-1 --name Meera --school sch-1 --session 2026-27 --contact s-9 [--contact-name Ravi]
//! ```
//!
//! Each stdin line is sent to the contact. `/attach <path>` stages a file for
//! the next send, `/quit` (or EOF) exits.

use chat_client::{debug, AttachmentFile, ChatConfig, ChatSession, SendOutcome, SenderIdentity, SessionEvent};
use clap::Parser;
use shared::{format_file_size, Contact, Message};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Line-oriented staff chat client.
#[derive(Parser, Debug)]
#[command(name = "chat-client", version, about = "Chat with one contact from the terminal", long_about = None)]
struct Args {
    /// Your user id
    #[arg(long)]
    user: String,

    /// Id of the contact to chat with
    #[arg(long)]
    contact: String,

    /// Display name shown on your messages (defaults to the user id)
    #[arg(long)]
    name: Option<String>,

    /// School the conversation belongs to
    #[arg(long, default_value = "")]
    school: String,

    /// Academic session, e.g. 2026-27
    #[arg(long, default_value = "")]
    session: String,

    /// Display name of the contact (defaults to the contact id)
    #[arg(long)]
    contact_name: Option<String>,
}

fn render(message: &Message) -> String {
    let mut line = format!("[{}] {}: {}", message.timestamp, message.sender_name, message.content);
    if let Some(attachment) = &message.attachment {
        line.push_str(&format!(
            " [{} ({}) {}]",
            attachment.file_name,
            format_file_size(attachment.file_size),
            attachment.file_url
        ));
    }
    line
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = debug::init();

    let name = args.name.unwrap_or_else(|| args.user.clone());
    let sender = SenderIdentity::new(args.user, name, args.school, args.session);
    let contact_name = args.contact_name.unwrap_or_else(|| args.contact.clone());
    let contact = Contact::new(args.contact, contact_name);

    let config = ChatConfig::from_env();
    info!(api = %config.api_base_url, ws = %config.ws_url(), "Starting chat client");

    let session = match ChatSession::start(&config, sender).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Failed to start chat session");
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    spawn_printer(Arc::clone(&session));

    if let Err(e) = session.select_contact(contact.clone()).await {
        eprintln!("history unavailable: {}", e);
    }
    println!("chatting with {} ({})", contact.display_label(), session.connection_state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                break;
            }
        };

        if line.trim() == "/quit" {
            break;
        }
        if let Some(path) = line.strip_prefix("/attach ") {
            match AttachmentFile::from_path(path.trim()).await {
                Ok(file) => {
                    println!("attached {} ({})", file.name, format_file_size(file.size()));
                    session.attach_file(file);
                }
                Err(e) => eprintln!("cannot attach: {}", e),
            }
            continue;
        }

        session.set_compose_input(line);
        match session.send().await {
            Ok(SendOutcome::Sent { published: false, .. }) => eprintln!("(offline: message kept locally)"),
            Ok(_) => {}
            Err(e) => eprintln!("send failed: {}", e),
        }
    }

    session.shutdown().await;
    ExitCode::SUCCESS
}

/// Print incoming messages and connection changes.
fn spawn_printer(session: Arc<ChatSession>) {
    let events = session.events();
    tokio::spawn(async move {
        let mut shown = session.message_count();
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::MessagesChanged { count } if count > shown => {
                    let messages = session.messages();
                    for message in messages.iter().skip(shown) {
                        println!("{}", render(message));
                    }
                    shown = messages.len();
                }
                SessionEvent::MessagesChanged { count } => shown = count,
                SessionEvent::ConnectionChanged(state) => eprintln!("({})", state),
                SessionEvent::Error(e) => eprintln!("(error: {})", e),
                SessionEvent::HistoryLoaded { .. } => {}
            }
        }
    });
}
