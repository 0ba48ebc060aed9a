use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{BackendClient, EchoResult, HealthStatus, UserRecord};

/// One trigger -> request -> display cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    HealthCheck,
    UserList,
    Echo(String),
}

/// What a finished flow hands back. Failures have already been swapped for
/// their fallback value, so every outcome is displayable.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    Health(HealthStatus),
    Users(Vec<UserRecord>),
    Echo(EchoResult),
}

pub async fn health_flow(client: &BackendClient) -> HealthStatus {
    tracing::info!("health check started");
    let status = client.health().await.unwrap_or_else(|e| {
        tracing::error!("health check failed: {}", e);
        HealthStatus::unreachable()
    });
    tracing::info!("health check finished");
    status
}

pub async fn users_flow(client: &BackendClient) -> Vec<UserRecord> {
    tracing::info!("user list started");
    let users = client.users().await.unwrap_or_else(|e| {
        tracing::error!("user list failed: {}", e);
        Vec::new()
    });
    tracing::info!("user list finished");
    users
}

pub async fn echo_flow(client: &BackendClient, message: &str) -> EchoResult {
    tracing::info!("echo started");
    let result = client.echo(message).await.unwrap_or_else(|e| {
        tracing::error!("echo failed: {}", e);
        EchoResult::send_failed()
    });
    tracing::info!("echo finished");
    result
}

/// Issue the single request for `flow` and fold any failure into its fallback
pub async fn run_flow(client: &BackendClient, flow: Flow) -> FlowOutcome {
    match flow {
        Flow::HealthCheck => FlowOutcome::Health(health_flow(client).await),
        Flow::UserList => FlowOutcome::Users(users_flow(client).await),
        Flow::Echo(message) => FlowOutcome::Echo(echo_flow(client, &message).await),
    }
}

/// Focusable controls, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    HealthButton,
    UsersButton,
    DraftInput,
    SendButton,
}

impl Control {
    fn next(self) -> Self {
        match self {
            Control::HealthButton => Control::UsersButton,
            Control::UsersButton => Control::DraftInput,
            Control::DraftInput => Control::SendButton,
            Control::SendButton => Control::HealthButton,
        }
    }

    fn prev(self) -> Self {
        match self {
            Control::HealthButton => Control::SendButton,
            Control::UsersButton => Control::HealthButton,
            Control::DraftInput => Control::UsersButton,
            Control::SendButton => Control::DraftInput,
        }
    }
}

pub struct App {
    client: BackendClient,

    // Result slots, each replaced wholesale when its flow finishes
    pub health: Option<HealthStatus>,
    pub users: Vec<UserRecord>,
    pub echo: Option<EchoResult>,

    /// First user shown in the users box
    pub users_scroll: usize,

    /// Text in the message field. Left alone after a send.
    pub draft: String,

    /// True while a request is in flight; disables every control
    pub loading: bool,

    pub focus: Control,
    pub should_quit: bool,

    outcome_tx: UnboundedSender<FlowOutcome>,
    outcome_rx: UnboundedReceiver<FlowOutcome>,
}

impl App {
    pub fn new(client: BackendClient) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            client,
            health: None,
            users: Vec::new(),
            echo: None,
            users_scroll: 0,
            draft: String::new(),
            loading: false,
            focus: Control::HealthButton,
            should_quit: false,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Whether the user may activate `control` right now
    pub fn is_enabled(&self, control: Control) -> bool {
        if self.loading {
            return false;
        }
        match control {
            Control::SendButton => !self.draft.trim().is_empty(),
            _ => true,
        }
    }

    /// Kick off `flow` in the background. Does not look at `loading`: keeping
    /// flows apart is the job of the disabled controls.
    pub fn start_flow(&mut self, flow: Flow) {
        self.loading = true;

        let client = self.client.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = run_flow(&client, flow).await;
            // Receiver only goes away on shutdown
            let _ = tx.send(outcome);
        });
    }

    pub fn check_health(&mut self) {
        self.start_flow(Flow::HealthCheck);
    }

    pub fn fetch_users(&mut self) {
        self.start_flow(Flow::UserList);
    }

    /// Send the draft to the echo endpoint. Returns false, and touches
    /// nothing, when the draft is blank.
    pub fn send_message(&mut self) -> bool {
        if self.draft.trim().is_empty() {
            return false;
        }
        self.start_flow(Flow::Echo(self.draft.clone()));
        true
    }

    /// Store a finished flow's result and clear the loading flag
    pub fn apply(&mut self, outcome: FlowOutcome) {
        match outcome {
            FlowOutcome::Health(status) => self.health = Some(status),
            FlowOutcome::Users(users) => {
                self.users = users;
                self.users_scroll = 0;
            }
            FlowOutcome::Echo(result) => self.echo = Some(result),
        }
        self.loading = false;
    }

    /// Called from the UI loop: apply whatever has finished since last time
    pub fn tick(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply(outcome);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            _ if self.focus == Control::DraftInput => self.handle_input_key(key),
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') if self.focus == Control::UsersButton => {
                self.scroll_users(1)
            }
            KeyCode::Up | KeyCode::Char('k') if self.focus == Control::UsersButton => {
                self.scroll_users(-1)
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(self.focus),
            _ => {}
        }
    }

    /// Move the users window; the renderer clamps it further to what fits
    fn scroll_users(&mut self, delta: isize) {
        let max = self.users.len().saturating_sub(1);
        self.users_scroll = self.users_scroll.saturating_add_signed(delta).min(max);
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        if self.loading {
            return;
        }
        match key.code {
            KeyCode::Enter => self.activate(Control::SendButton),
            KeyCode::Backspace => {
                self.draft.pop();
            }
            KeyCode::Char(c) => self.draft.push(c),
            _ => {}
        }
    }

    fn activate(&mut self, control: Control) {
        if !self.is_enabled(control) {
            return;
        }
        match control {
            Control::HealthButton => self.check_health(),
            Control::UsersButton => self.fetch_users(),
            Control::SendButton => {
                self.send_message();
            }
            Control::DraftInput => {}
        }
    }

    #[cfg(test)]
    pub(crate) async fn settle(&mut self) {
        if let Some(outcome) = self.outcome_rx.recv().await {
            self.apply(outcome);
        }
    }
}
