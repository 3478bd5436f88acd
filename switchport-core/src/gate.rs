//! Safety checks run against the target switch before it is modified.

use thiserror::Error;

use crate::model::DeviceConfig;

/// Tag an operator adds to a switch to mark it as free to overwrite.
pub const UNDEPLOYED_TAG: &str = "undeployed";

/// Operator response to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAnswer {
    Yes,
    No,
    TimedOut,
}

/// Source of operator confirmation.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> ConfirmAnswer;
}

/// Confirms every prompt, for unattended runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> ConfirmAnswer {
        ConfirmAnswer::Yes
    }
}

/// Why the gate refused to let a migration modify its target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("target switch {serial} appears to be in use (name = mac address)")]
    TargetInUse { serial: String },
    #[error("target switch {serial} does not have the \"undeployed\" tag")]
    TargetNotUndeployed { serial: String },
    #[error("migration to {serial} was not confirmed")]
    ConfirmationDeclined { serial: String },
    #[error("confirmation for {serial} timed out")]
    ConfirmationTimedOut { serial: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Init,
    NameCheck,
    TagCheck,
    Confirm,
    Proceed,
    Aborted(GateError),
}

impl GateState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GateState::Proceed | GateState::Aborted(_))
    }
}

/// Precondition state machine for one target switch.
///
/// Runs `Init -> NameCheck -> TagCheck -> Confirm -> Proceed`. A failed
/// check moves straight to `Aborted`, so an invalid target never reaches
/// the confirmation prompt.
#[derive(Debug)]
pub struct PreconditionGate<'a> {
    target: &'a DeviceConfig,
    target_serial: &'a str,
    prompt: String,
    auto_confirm: bool,
    state: GateState,
}

impl<'a> PreconditionGate<'a> {
    pub fn new(
        target: &'a DeviceConfig,
        target_serial: &'a str,
        prompt: impl Into<String>,
        auto_confirm: bool,
    ) -> Self {
        Self {
            target,
            target_serial,
            prompt: prompt.into(),
            auto_confirm,
            state: GateState::Init,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Advance one state. Terminal states are sticky.
    pub fn step(&mut self, confirmer: &mut dyn Confirmer) -> &GateState {
        let serial = self.target_serial.to_string();
        let next = match &self.state {
            GateState::Init => GateState::NameCheck,
            GateState::NameCheck => {
                // A switch nobody has named reports its MAC address as name.
                if self.target.name == self.target.mac {
                    GateState::Aborted(GateError::TargetInUse { serial })
                } else {
                    GateState::TagCheck
                }
            }
            GateState::TagCheck => {
                if self.target.has_tag(UNDEPLOYED_TAG) {
                    GateState::Confirm
                } else {
                    GateState::Aborted(GateError::TargetNotUndeployed { serial })
                }
            }
            GateState::Confirm if self.auto_confirm => GateState::Proceed,
            GateState::Confirm => match confirmer.confirm(&self.prompt) {
                ConfirmAnswer::Yes => GateState::Proceed,
                ConfirmAnswer::No => {
                    GateState::Aborted(GateError::ConfirmationDeclined { serial })
                }
                ConfirmAnswer::TimedOut => {
                    GateState::Aborted(GateError::ConfirmationTimedOut { serial })
                }
            },
            GateState::Proceed | GateState::Aborted(_) => return &self.state,
        };
        self.state = next;
        &self.state
    }

    /// Drive the gate to a terminal state.
    pub fn run(mut self, confirmer: &mut dyn Confirmer) -> Result<(), GateError> {
        loop {
            match self.step(confirmer) {
                GateState::Proceed => return Ok(()),
                GateState::Aborted(err) => return Err(err.clone()),
                _ => {}
            }
        }
    }
}
