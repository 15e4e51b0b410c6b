use serde::Deserialize;
use serde::Serialize;

pub const ACCEPTED_MESSAGE: &str = "Пароль верный! Перенаправление...";
pub const REJECTED_MESSAGE: &str = "Неверный пароль";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSpec {
    pub password: String,
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    Idle,
    Rejected { generation: u64 },
    Accepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected { generation: u64 },
    /// Prompt hidden or already accepted.
    Ignored,
}

/// Password screen in front of the desktop.
#[derive(Debug, Clone)]
pub struct LoginGate {
    password: String,
    pub hint: Option<String>,
    prompt_open: bool,
    input: String,
    status: LoginStatus,
    generation: u64,
}

impl LoginGate {
    pub fn new(spec: &LoginSpec) -> Self {
        Self {
            password: spec.password.clone(),
            hint: spec.hint.clone(),
            prompt_open: false,
            input: String::new(),
            status: LoginStatus::Idle,
            generation: 0,
        }
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt_open
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> LoginStatus {
        self.status
    }

    /// Input and buttons stay disabled once the password was accepted.
    pub fn locked_in(&self) -> bool {
        self.status == LoginStatus::Accepted
    }

    pub fn message(&self) -> Option<&'static str> {
        match self.status {
            LoginStatus::Idle => None,
            LoginStatus::Rejected { .. } => Some(REJECTED_MESSAGE),
            LoginStatus::Accepted => Some(ACCEPTED_MESSAGE),
        }
    }

    pub fn open_prompt(&mut self) -> bool {
        if self.locked_in() {
            return false;
        }
        self.prompt_open = true;
        self.input.clear();
        true
    }

    pub fn close_prompt(&mut self) -> bool {
        if !self.prompt_open || self.locked_in() {
            return false;
        }
        self.prompt_open = false;
        self.input.clear();
        true
    }

    pub fn set_input(&mut self, value: &str) -> bool {
        if !self.prompt_open || self.locked_in() {
            return false;
        }
        self.input = value.to_string();
        true
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if !self.prompt_open || self.locked_in() {
            return SubmitOutcome::Ignored;
        }
        if self.input == self.password {
            self.status = LoginStatus::Accepted;
            return SubmitOutcome::Accepted;
        }
        self.generation += 1;
        self.input.clear();
        self.status = LoginStatus::Rejected {
            generation: self.generation,
        };
        SubmitOutcome::Rejected {
            generation: self.generation,
        }
    }

    /// Ends the error flash started by the rejection with `generation`.
    pub fn clear_error(&mut self, generation: u64) -> bool {
        match self.status {
            LoginStatus::Rejected { generation: current } if current == generation => {
                self.status = LoginStatus::Idle;
                true
            }
            _ => false,
        }
    }
}
