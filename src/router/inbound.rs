//! Inbound events
//!
//! [`RawEvent`] is what the device delivers: string ids and free text.
//! [`RawEvent::decode`] turns it into a typed [`KioskEvent`] once, so the
//! router matches on variants instead of id suffixes.

use serde::{Deserialize, Serialize};

use crate::error::{KioskError, Result};
use crate::guard::{ConfirmationKind, ConfirmationToken};
use crate::triggers::{RemoteCommand, SensorState, StandbyState, TriggerKind};
use crate::ui::PanelIds;

/// Event as emitted by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RawEvent {
    PanelClicked {
        panel_id: String,
    },
    WidgetAction {
        widget_id: String,
        action: String,
        #[serde(default)]
        value: String,
    },
    TextInputResponse {
        feedback_id: String,
        text: String,
    },
    PromptResponse {
        feedback_id: String,
        option_id: u32,
    },
    MessageSend {
        text: String,
    },
    StandbyChanged {
        state: String,
    },
    SensorChanged {
        state: String,
    },
}

/// Press on one of the control panel widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPress {
    /// 0-based registry index
    Destination(usize),
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Pin { token: ConfirmationToken },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    NoUrlWarning { token: ConfirmationToken },
}

/// Decoded inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskEvent {
    PanelClicked,
    WidgetPressed(WidgetPress),
    TextResponse(TextKind, String),
    /// `true` when the user accepted
    PromptResponse(PromptKind, bool),
    ExitTrigger(TriggerKind),
}

const GROUP_PRESSED: &str = "pressed";
const BUTTON_CLICKED: &str = "clicked";
const OPTION_ACCEPT: u32 = 1;
const OPTION_REJECT: u32 = 2;

impl RawEvent {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::PanelClicked { .. } => "panel_clicked",
            Self::WidgetAction { .. } => "widget_action",
            Self::TextInputResponse { .. } => "text_input_response",
            Self::PromptResponse { .. } => "prompt_response",
            Self::MessageSend { .. } => "message_send",
            Self::StandbyChanged { .. } => "standby_changed",
            Self::SensorChanged { .. } => "sensor_changed",
        }
    }

    /// Decode against this controller's ids.
    ///
    /// Ids without the panel prefix yield `ForeignEvent`; ids with the
    /// prefix but a bad shape yield `MalformedEvent`.
    pub fn decode(&self, ids: &PanelIds) -> Result<KioskEvent> {
        match self {
            Self::PanelClicked { panel_id } => {
                if ids.owns_panel(panel_id) {
                    Ok(KioskEvent::PanelClicked)
                } else {
                    Err(foreign(panel_id))
                }
            }

            Self::WidgetAction {
                widget_id,
                action,
                value,
            } => {
                let name = ids.strip(widget_id).ok_or_else(|| foreign(widget_id))?;
                match (name, action.as_str()) {
                    (PanelIds::SITE_GROUP, GROUP_PRESSED) => {
                        let index = parse_one_based(value)?;
                        Ok(KioskEvent::WidgetPressed(WidgetPress::Destination(index)))
                    }
                    (PanelIds::TOGGLE, BUTTON_CLICKED) => {
                        Ok(KioskEvent::WidgetPressed(WidgetPress::Toggle))
                    }
                    _ => Err(foreign(&format!("{}:{}", widget_id, action))),
                }
            }

            Self::TextInputResponse { feedback_id, text } => {
                let token = feedback_token(ids, feedback_id, ConfirmationKind::PinChallenge)?;
                Ok(KioskEvent::TextResponse(TextKind::Pin { token }, text.clone()))
            }

            Self::PromptResponse {
                feedback_id,
                option_id,
            } => {
                let token = feedback_token(ids, feedback_id, ConfirmationKind::NoUrlWarning)?;
                let accepted = match *option_id {
                    OPTION_ACCEPT => true,
                    OPTION_REJECT => false,
                    other => {
                        return Err(KioskError::MalformedEvent {
                            reason: format!("unknown prompt option {}", other),
                        })
                    }
                };
                Ok(KioskEvent::PromptResponse(
                    PromptKind::NoUrlWarning { token },
                    accepted,
                ))
            }

            Self::MessageSend { text } => Ok(KioskEvent::ExitTrigger(TriggerKind::Remote(
                RemoteCommand::parse(text)?,
            ))),

            Self::StandbyChanged { state } => Ok(KioskEvent::ExitTrigger(TriggerKind::Standby(
                StandbyState::parse(state)?,
            ))),

            Self::SensorChanged { state } => {
                Ok(KioskEvent::ExitTrigger(SensorState::parse(state)?.into()))
            }
        }
    }
}

fn foreign(id: &str) -> KioskError {
    KioskError::ForeignEvent { id: id.to_string() }
}

fn parse_one_based(value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(KioskError::MalformedEvent {
            reason: format!("invalid selector value '{}'", value),
        }),
    }
}

/// `{panel}-{pin|warning}-{seq}` into a token of the expected kind
fn feedback_token(
    ids: &PanelIds,
    feedback_id: &str,
    kind: ConfirmationKind,
) -> Result<ConfirmationToken> {
    let name = ids.strip(feedback_id).ok_or_else(|| foreign(feedback_id))?;
    let prefix = match kind {
        ConfirmationKind::PinChallenge => PanelIds::PIN,
        ConfirmationKind::NoUrlWarning => PanelIds::WARNING,
    };
    let seq = name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(|| foreign(feedback_id))?;

    let seq = seq.parse::<u64>().map_err(|_| KioskError::MalformedEvent {
        reason: format!("invalid feedback id '{}'", feedback_id),
    })?;
    Ok(ConfirmationToken { kind, seq })
}
