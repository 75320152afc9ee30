//! Console session.
//!
//! Each input line is either a command (leading `/`) or a user message that
//! is routed as one turn of a single conversation thread. A turn that
//! creates or updates a draft anchors the session to that draft.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use drafter_core::constants::ANCHOR_TYPE_DRAFT;
use drafter_core::types::DraftStatus;
use drafter_service::conversation::ConversationTurn;
use drafter_service::delivery::DeliveryOutcome;
use drafter_service::router::{AnchoredItem, RouteOutcome, Turn};

use crate::bootstrap::App;

const HELP: &str = "\
Commands:
  /anchor <draft-id>   anchor following messages to a draft
  /anchor              clear the anchor
  /assistant <text>    add an assistant turn to the history
  /drafts              list drafts in this thread
  /send                deliver the anchored draft
  /close               close the anchored draft without sending
  /help                show this help
  /quit                leave
Anything else is sent as a user message.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Message(String),
    Anchor(Option<String>),
    Assistant(String),
    Drafts,
    Send,
    Close,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Message(line.to_string()));
        };

        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, arg)| (name, arg.trim()));
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        Some(match (name, arg) {
            ("anchor", arg) => Self::Anchor(arg),
            ("assistant", Some(text)) => Self::Assistant(text),
            ("drafts", None) => Self::Drafts,
            ("send", None) => Self::Send,
            ("close", None) => Self::Close,
            ("help", None) => Self::Help,
            ("quit" | "exit", None) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        })
    }
}

/// Conversation state for one console session.
#[derive(Debug, Clone)]
pub struct Session {
    pub thread_id: String,
    pub history: Vec<ConversationTurn>,
    pub anchor: Option<String>,
    turns: u64,
}

impl Session {
    #[must_use]
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            history: Vec::new(),
            anchor: None,
            turns: 0,
        }
    }

    /// Builds the next turn for `message` without recording it.
    #[must_use]
    pub fn next_turn(&mut self, message: &str) -> Turn {
        self.turns += 1;
        Turn {
            thread_id: self.thread_id.clone(),
            message_id: format!("{}-{}", self.thread_id, self.turns),
            user_message: message.to_string(),
            history: self.history.clone(),
            anchor: self.anchor.as_ref().map(|id| AnchoredItem {
                item_type: ANCHOR_TYPE_DRAFT.to_string(),
                item_id: id.clone(),
                snapshot: None,
            }),
        }
    }

    fn anchored_id(&self) -> anyhow::Result<uuid::Uuid> {
        let id = self
            .anchor
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no draft anchored; use /anchor <draft-id>"))?;
        Ok(id.parse()?)
    }
}

async fn handle(app: &App, session: &mut Session, command: Command) -> anyhow::Result<Option<String>> {
    let drafts = app.router.drafts();
    let reply = match command {
        Command::Message(text) => {
            let turn = session.next_turn(&text);
            let outcome = app.router.route(&turn).await;
            session.history.push(ConversationTurn::user(text));
            match outcome {
                RouteOutcome::PassThrough => "(not a draft request)".to_string(),
                RouteOutcome::Draft(draft_turn) => {
                    session.anchor = (draft_turn.draft.status != DraftStatus::Closed)
                        .then(|| draft_turn.draft.draft_id.to_string());
                    serde_json::to_string_pretty(&draft_turn)?
                }
            }
        }
        Command::Anchor(id) => {
            session.anchor = id;
            format!("anchor: {}", session.anchor.as_deref().unwrap_or("none"))
        }
        Command::Assistant(text) => {
            session.history.push(ConversationTurn::assistant(text));
            "(assistant turn recorded)".to_string()
        }
        Command::Drafts => serde_json::to_string_pretty(&drafts.thread_drafts(&session.thread_id).await?)?,
        Command::Send => {
            let Some(provider) = app.delivery.as_deref() else {
                anyhow::bail!("delivery is disabled; set delivery.webhook_url");
            };
            let outcome = drafts.deliver_draft(session.anchored_id()?, provider).await?;
            if let DeliveryOutcome::Delivered { .. } = outcome {
                session.anchor = None;
            }
            serde_json::to_string_pretty(outcome.draft())?
        }
        Command::Close => {
            let draft = drafts
                .close_draft(session.anchored_id()?, DraftStatus::Closed)
                .await?;
            session.anchor = None;
            serde_json::to_string_pretty(&draft)?
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(None),
        Command::Unknown(line) => format!("unknown command: {line}\n{HELP}"),
    };
    Ok(Some(reply))
}

/// ## Summary
/// Runs a session on stdin/stdout until `/quit` or end of input.
///
/// ## Errors
/// Returns an error if reading stdin or writing stdout fails. Command
/// failures are printed and the session continues.
pub async fn run(app: &App, thread_id: &str) -> anyhow::Result<()> {
    let mut session = Session::new(thread_id);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout
        .write_all(format!("thread {thread_id}; /help for commands\n").as_bytes())
        .await?;

    while let Some(line) = lines.next_line().await? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        let output = match handle(app, &mut session, command).await {
            Ok(Some(output)) => output,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Command failed");
                format!("error: {e}")
            }
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}
