// alma-session: headless line-mode client for the realtime session layer.
//
// Reads ALMA_USER_ID, ALMA_CREDENTIAL and ALMA_BASE_URL, connects the
// notification stream, and maps stdin lines to controller commands.

use std::sync::Arc;

use alma_realtime::controller::{ChatSessionController, Command, Dispatcher, UiUpdate};
use alma_realtime::monitor::HttpProbe;
use alma_realtime::notifications::DesktopNotifier;
use alma_realtime::rest::{ChatApi, HttpChatApi};
use alma_realtime::transport::{Connector, WebSocketConnector};
use alma_realtime::{ChatId, ChatMarker, Credential, MessageId, Session, SessionOptions, UserId};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: /chats  /select <chat id>  /search [query]  /close-search  /refresh  /delete <message id>  /quit";

/// What one stdin line asks for
enum Input {
    Commands(Vec<Command>),
    ShowChats,
    Quit,
    Nothing,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let user_id: i64 = std::env::var("ALMA_USER_ID")
        .context("ALMA_USER_ID is not set")?
        .trim()
        .parse()
        .context("ALMA_USER_ID is not a number")?;
    let credential = Credential::new(std::env::var("ALMA_CREDENTIAL").unwrap_or_default());
    let options = SessionOptions::from_env()?;
    let session = Session::new(UserId::new(user_id), credential);

    log::info!(
        "alma-session {} as user {user_id} against {}",
        alma_realtime::VERSION,
        options.base_url
    );

    let api = HttpChatApi::new(&options, &session);
    let connector = WebSocketConnector::new(options.credential_header.clone());
    let probe = HttpProbe::new(options.base_url.clone());

    let (mut controller, dispatcher, mut updates) = ChatSessionController::new(
        session,
        options,
        api,
        connector,
        Arc::new(DesktopNotifier::detect()),
    );

    dispatcher.send(Command::ConnectNotifications);
    dispatcher.send(Command::Refresh);
    controller.start_monitor(probe);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let mut input = None;
        tokio::select! {
            alive = controller.process_next() => {
                if !alive {
                    break;
                }
            }
            line = lines.next_line() => {
                input = Some(match line? {
                    Some(line) => parse_line(&line),
                    None => Input::Quit,
                });
            }
        }

        if let Some(input) = input {
            dispatch(&controller, &dispatcher, input);
        }

        while let Ok(update) = updates.try_recv() {
            render(&controller, update);
        }
    }

    Ok(())
}

fn parse_line(line: &str) -> Input {
    let line = line.trim();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match head {
        "" => return Input::Nothing,
        "/quit" => return Input::Quit,
        "/chats" => return Input::ShowChats,
        "/help" => {
            println!("{HELP}");
            return Input::Nothing;
        }
        "/select" => match rest.parse::<i64>() {
            Ok(id) => Command::SelectChat(ChatId::new(id)),
            Err(_) => {
                eprintln!("usage: /select <chat id>");
                return Input::Nothing;
            }
        },
        "/search" if rest.is_empty() => Command::OpenSearch,
        "/search" => Command::SetSearchQuery(rest.to_string()),
        "/close-search" => Command::CloseSearch,
        "/refresh" => Command::Refresh,
        "/delete" => match rest.parse::<i64>() {
            Ok(id) => Command::DeleteMessage(MessageId::new(id)),
            Err(_) => {
                eprintln!("usage: /delete <message id>");
                return Input::Nothing;
            }
        },
        _ if head.starts_with('/') => {
            eprintln!("unknown command {head}; {HELP}");
            return Input::Nothing;
        }
        _ => {
            return Input::Commands(vec![
                Command::SetCompose(line.to_string()),
                Command::SendMessage,
            ]);
        }
    };

    Input::Commands(vec![command])
}

fn dispatch<A: ChatApi, C: Connector>(
    controller: &ChatSessionController<A, C>,
    dispatcher: &Dispatcher,
    input: Input,
) {
    match input {
        Input::Commands(commands) => {
            for command in commands {
                dispatcher.send(command);
            }
        }
        Input::ShowChats => print_chats(controller),
        Input::Quit => {
            dispatcher.shutdown();
        }
        Input::Nothing => {}
    }
}

fn print_chats<A: ChatApi, C: Connector>(controller: &ChatSessionController<A, C>) {
    for entry in controller.chat_list() {
        let marker = match entry.marker {
            ChatMarker::Group => "#",
            ChatMarker::Online => "*",
            ChatMarker::Offline => "-",
        };
        println!("{marker} {:>6}  {}", entry.chat_id, entry.label);
    }
}

fn render<A: ChatApi, C: Connector>(controller: &ChatSessionController<A, C>, update: UiUpdate) {
    match update {
        UiUpdate::MessagesChanged => {
            if let Some(chat) = controller.active_chat() {
                println!("--- {} ---", chat.display_name(controller.session().user_id()));
            }
            for line in controller.messages() {
                println!("[{}] {line}", line.id);
            }
        }
        UiUpdate::ChatListChanged => print_chats(controller),
        UiUpdate::ConnectionStatus { online } => {
            log::info!("chat stream {}", if online { "online" } else { "offline" });
        }
        UiUpdate::ComposeChanged | UiUpdate::Banner(None) => {}
        UiUpdate::Banner(Some(text)) => println!("[notification] {text}"),
        UiUpdate::Alert(text) => eprintln!("! {text}"),
        UiUpdate::Info(text) => println!("{text}"),
        UiUpdate::SearchResults => {
            for user in controller.search_results() {
                println!("  {:>6}  {}", user.id, user.username);
            }
        }
        UiUpdate::Monitor(sample) => {
            let latency = sample
                .latency_ms()
                .map_or_else(|| "n/a".to_string(), |ms| format!("{ms}ms"));
            let memory = sample
                .memory_mib()
                .map_or_else(|| "n/a".to_string(), |mib| format!("{mib}MiB"));
            log::debug!(
                "uptime {}s, memory {memory}, latency {latency}",
                sample.uptime.as_secs()
            );
        }
    }
}
