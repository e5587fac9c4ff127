//! Shell state for the chat client.
//!
//! `App` plays the single-page app: it owns the location bar, routes every
//! `go` through the navigation guard, and renders the screen it lands on by
//! calling the chat service through the authenticated transport.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tracing::info;

use chatgate_core::api::{ApiError, AuthTransport, ChatClient, HardNavigator, NewConversation};
use chatgate_core::router::{canonical_path, NavigationGuard, NavigationIntent, Resolution};
use chatgate_core::{Config, SessionStore};

// ============================================================================
// Location
// ============================================================================

/// The location bar. Shared with the transport so a rejected credential can
/// move it without going through the guard.
#[derive(Clone)]
pub struct Location {
    current: Arc<Mutex<String>>,
}

impl Location {
    pub fn new(initial: &str) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial.to_string())),
        }
    }

    pub fn get(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, path: &str) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = path.to_string();
    }
}

impl HardNavigator for Location {
    fn hard_redirect(&self, location: &str) {
        info!(location, "Hard redirect");
        self.set(location);
    }
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(String),
    Login(String),
    Logout,
    Send(String),
    Delete(i64),
    Chat(String),
    Group(String),
    Users(String),
    Whoami,
    Where,
    Ping,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
Commands:
  go <path>        navigate (e.g. go /chats, go /chats/3)
  login <name>     log in or register
  logout           end the session
  send <text>      send a message in the open conversation
  delete <id>      delete a message in the open conversation
  chat <user>      start a private conversation
  group <name>     start a group conversation
  users [query]    search users
  whoami           show session state
  where            show current location
  ping             check the service is reachable
  help             this text
  quit             exit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let need_arg = |name: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("usage: {} <argument>", name))
        } else {
            Ok(rest.to_string())
        }
    };

    match word {
        "go" | "cd" => need_arg("go").map(Command::Go),
        "login" => need_arg("login").map(Command::Login),
        "logout" => Ok(Command::Logout),
        "send" => need_arg("send").map(Command::Send),
        "delete" | "rm" => need_arg("delete")?
            .parse()
            .map(Command::Delete)
            .map_err(|_| "usage: delete <message id>".to_string()),
        "chat" => need_arg("chat").map(Command::Chat),
        "group" => need_arg("group").map(Command::Group),
        "users" => Ok(Command::Users(rest.to_string())),
        "whoami" => Ok(Command::Whoami),
        "where" | "pwd" => Ok(Command::Where),
        "ping" => Ok(Command::Ping),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "" => Err("empty command".to_string()),
        other => Err(format!("unknown command '{}', try 'help'", other)),
    }
}

/// Conversation id of a `/chats/<id>` location, in any form the guard accepts
pub fn conversation_id(location: &str) -> Option<i64> {
    canonical_path(location)
        .strip_prefix("/chats/")
        .and_then(|id| id.parse().ok())
}

/// What the shell draws for a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chats,
    Conversation(i64),
    Other(String),
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    guard: NavigationGuard,
    client: ChatClient,
    location: Location,
}

/// Whether the shell loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let session = SessionStore::new();
        let location = Location::new("/");

        let registry = config.registry()?;
        let guard = NavigationGuard::new(registry, session.clone())
            .with_paths(config.login_path.clone(), config.landing_path.clone());

        let transport = AuthTransport::http(
            &config.api_url,
            config.timeout(),
            session,
            Arc::new(location.clone()),
        )?;

        Ok(Self {
            guard,
            client: ChatClient::new(transport),
            location,
        })
    }

    pub fn location(&self) -> String {
        self.location.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_present()
    }

    /// Route a transition through the guard and apply the result
    pub fn navigate(&self, target: &str) -> Resolution {
        let intent = NavigationIntent::new(self.location.get(), target);
        let resolution = self.guard.resolve(&intent);
        self.location.set(resolution.destination());
        resolution
    }

    pub async fn execute(&self, command: Command) -> Result<Flow> {
        match command {
            Command::Go(target) => {
                if let Resolution::Redirect { to, .. } = self.navigate(&target) {
                    println!("-> redirected to {}", to);
                }
                self.render().await;
            }
            Command::Login(name) => match self.client.login(&name).await {
                Ok(id) => {
                    println!("logged in as {} (id {})", name, id);
                    self.navigate(self.guard.landing_path());
                    self.render().await;
                }
                Err(e) => self.report(e),
            },
            Command::Logout => {
                self.client.logout();
                self.navigate(self.guard.login_path());
                self.render().await;
            }
            Command::Send(text) => match conversation_id(&self.location.get()) {
                Some(id) => match self.client.send_message(id, &text).await {
                    Ok(msg) => println!("sent #{}", msg.id),
                    Err(e) => self.report(e),
                },
                None => println!("open a conversation first (go /chats/<id>)"),
            },
            Command::Delete(message_id) => match conversation_id(&self.location.get()) {
                Some(id) => match self.client.delete_message(id, message_id).await {
                    Ok(()) => println!("deleted #{}", message_id),
                    Err(e) => self.report(e),
                },
                None => println!("open a conversation first (go /chats/<id>)"),
            },
            Command::Chat(participant) => {
                self.start_conversation(NewConversation::Private { participant }).await
            }
            Command::Group(name) => self.start_conversation(NewConversation::Group { name }).await,
            Command::Users(query) => match self.client.search_users(&query).await {
                Ok(users) if users.is_empty() => println!("no users found"),
                Ok(users) => {
                    for user in users {
                        println!("  {:>4}  {}", user.id, user.username);
                    }
                }
                Err(e) => self.report(e),
            },
            Command::Whoami => {
                let state = if self.is_authenticated() { "signed in" } else { "guest" };
                println!("{}", state);
            }
            Command::Where => println!("{}", self.location.get()),
            Command::Ping => match self.client.liveness().await {
                Ok(()) => println!("service is up"),
                Err(e) => self.report(e),
            },
            Command::Help => println!("{}", HELP_TEXT),
            Command::Quit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    async fn start_conversation(&self, conversation: NewConversation) {
        match self.client.create_conversation(&conversation).await {
            Ok(id) => {
                println!("conversation #{} created", id);
                self.navigate(&format!("/chats/{}", id));
                self.render().await;
            }
            Err(e) => self.report(e),
        }
    }

    /// Screen for `location`, matched on its canonical path
    pub fn screen_for(&self, location: &str) -> Screen {
        let path = canonical_path(location);
        if path == canonical_path(self.guard.login_path()) {
            Screen::Login
        } else if path == canonical_path(self.guard.landing_path()) {
            Screen::Chats
        } else if let Some(id) = conversation_id(&path) {
            Screen::Conversation(id)
        } else {
            Screen::Other(path)
        }
    }

    /// Draw the screen for the current location
    async fn render(&self) {
        match self.screen_for(&self.location.get()) {
            Screen::Login => println!("[login] use 'login <name>' to sign in"),
            Screen::Chats => match self.client.conversations().await {
                Ok(previews) if previews.is_empty() => println!("[chats] no conversations yet"),
                Ok(previews) => {
                    println!("[chats]");
                    for preview in previews {
                        println!("  {:>4}  {:<17} {}", preview.id, preview.name, preview.preview_line());
                    }
                }
                Err(e) => self.report(e),
            },
            Screen::Conversation(id) => match self.client.messages(id).await {
                Ok(messages) => {
                    println!("[chat {}]", id);
                    for msg in messages {
                        println!("  #{:<4} {}: {}", msg.id, msg.sender.username, msg.summary());
                    }
                }
                Err(e) => self.report(e),
            },
            Screen::Other(path) => println!("[{}]", path),
        }
    }

    fn report(&self, err: ApiError) {
        match err {
            ApiError::Unauthorized(_) => {
                println!("session rejected by the server, now at {}", self.location.get())
            }
            other => eprintln!("error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgate_core::Credential;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("go /chats"), Ok(Command::Go("/chats".to_string())));
        assert_eq!(parse_command("  login   mario "), Ok(Command::Login("mario".to_string())));
        assert_eq!(parse_command("send hello there"), Ok(Command::Send("hello there".to_string())));
        assert_eq!(parse_command("users"), Ok(Command::Users(String::new())));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
        assert_eq!(parse_command("chat luigi"), Ok(Command::Chat("luigi".to_string())));
        assert_eq!(parse_command("group road trip"), Ok(Command::Group("road trip".to_string())));
        assert_eq!(parse_command("delete 41"), Ok(Command::Delete(41)));
        assert!(parse_command("delete last").is_err());
        assert!(parse_command("chat").is_err());
        assert!(parse_command("go").is_err());
        assert!(parse_command("dance").is_err());
        assert!(parse_command("").is_err());
    }

    #[test]
    fn test_conversation_id() {
        assert_eq!(conversation_id("/chats/12"), Some(12));
        assert_eq!(conversation_id("/chats/12/"), Some(12));
        assert_eq!(conversation_id("/chats"), None);
        assert_eq!(conversation_id("/chats/abc"), None);
        assert_eq!(conversation_id("/#/chats/3"), Some(3));
        assert_eq!(conversation_id("/chats/3?from=list"), Some(3));
    }

    #[test]
    fn test_screen_matches_normalised_locations() {
        let app = App::new(&Config::default()).unwrap();

        assert_eq!(app.screen_for("/chats"), Screen::Chats);
        assert_eq!(app.screen_for("/chats/"), Screen::Chats);
        assert_eq!(app.screen_for("/#/chats"), Screen::Chats);
        assert_eq!(app.screen_for("/login/"), Screen::Login);
        assert_eq!(app.screen_for("/#/chats/3"), Screen::Conversation(3));
        assert_eq!(app.screen_for("/about/"), Screen::Other("/about".to_string()));
    }

    #[test]
    fn test_hard_redirect_moves_location() {
        let location = Location::new("/chats/3");
        let shared = location.clone();
        shared.hard_redirect("/login");
        assert_eq!(location.get(), "/login");
    }

    #[test]
    fn test_navigate_applies_guard_decision() {
        let app = App::new(&Config::default()).unwrap();

        let resolution = app.navigate("/chats");
        assert!(resolution.is_redirect());
        assert_eq!(app.location(), "/login");

        app.client.session().set(Credential::bearer(1));
        app.navigate("/login");
        assert_eq!(app.location(), "/chats");

        app.navigate("/somewhere");
        assert_eq!(app.location(), "/somewhere");
    }
}
