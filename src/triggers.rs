//! Exit Trigger Set - device signals that may move the kiosk mode
//!
//! Turns a [`TriggerKind`] plus the current mode into an ordered list of
//! [`TriggerAction`]s. Evaluation is pure; the router carries the actions out.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::KioskConfig;
use crate::error::{KioskError, Result};
use crate::store::KioskMode;

/// Device standby state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandbyState {
    /// Awake
    Off,
    Halfwake,
    Standby,
}

impl StandbyState {
    /// Parse the device status value.
    ///
    /// Intermediate states (e.g. `EnteringStandby`) are not triggers.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "Off" => Ok(Self::Off),
            "Halfwake" => Ok(Self::Halfwake),
            "Standby" => Ok(Self::Standby),
            other => Err(KioskError::ForeignEvent {
                id: format!("standby:{}", other),
            }),
        }
    }
}

/// Presence sensor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorState {
    Active,
    Inactive,
}

impl SensorState {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            other => Err(KioskError::MalformedEvent {
                reason: format!("unknown sensor state '{}'", other),
            }),
        }
    }
}

/// Keyword received over the remote message channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteCommand {
    Enable,
    Disable,
}

impl RemoteCommand {
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim() {
            "ExitKiosk" | "DisableKiosk" => Ok(Self::Disable),
            "EnableKiosk" => Ok(Self::Enable),
            other => Err(KioskError::ForeignEvent {
                id: format!("message:{}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "trigger", content = "state", rename_all = "snake_case")]
pub enum TriggerKind {
    SensorInactive,
    SensorActive,
    Standby(StandbyState),
    Remote(RemoteCommand),
}

impl From<SensorState> for TriggerKind {
    fn from(state: SensorState) -> Self {
        match state {
            SensorState::Active => Self::SensorActive,
            SensorState::Inactive => Self::SensorInactive,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorInactive => write!(f, "sensor inactive"),
            Self::SensorActive => write!(f, "sensor active"),
            Self::Standby(state) => write!(f, "standby {:?}", state),
            Self::Remote(cmd) => write!(f, "remote {:?}", cmd),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerAction {
    Cleanup,
    Enable,
    Disable,
}

/// Per-state standby behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StandbyRule {
    pub auto_enable: bool,
    pub auto_cleanup: bool,
}

/// Which triggers are armed and what they do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitTriggerSet {
    pub allow_exit: bool,
    pub standby: StandbyRule,
    pub halfwake: StandbyRule,
}

impl ExitTriggerSet {
    pub fn from_config(config: &KioskConfig) -> Self {
        Self {
            allow_exit: config.allow_exit,
            standby: StandbyRule {
                auto_enable: config.auto_enable_on_standby,
                auto_cleanup: config.auto_cleanup_on_standby,
            },
            halfwake: StandbyRule {
                auto_enable: config.auto_enable_on_halfwake,
                auto_cleanup: config.auto_cleanup_on_halfwake,
            },
        }
    }

    pub fn evaluate(&self, trigger: TriggerKind, mode: KioskMode) -> Vec<TriggerAction> {
        use TriggerAction::*;

        match trigger {
            TriggerKind::Remote(RemoteCommand::Disable) => vec![Disable],
            TriggerKind::Remote(RemoteCommand::Enable) => vec![Enable],
            TriggerKind::SensorInactive if self.allow_exit && mode.is_enabled() => vec![Disable],
            TriggerKind::SensorInactive | TriggerKind::SensorActive => vec![],
            TriggerKind::Standby(StandbyState::Off) => vec![],
            TriggerKind::Standby(state) => {
                let rule = match state {
                    StandbyState::Halfwake => self.halfwake,
                    _ => self.standby,
                };
                let mut actions = Vec::with_capacity(2);

                if rule.auto_enable {
                    if rule.auto_cleanup {
                        actions.push(Cleanup);
                    }
                    actions.push(Enable);
                } else if state == StandbyState::Standby {
                    // already disabled: nothing to exit from, cleanup skipped too
                    if self.allow_exit && mode.is_enabled() {
                        if rule.auto_cleanup {
                            actions.push(Cleanup);
                        }
                        actions.push(Disable);
                    }
                } else if rule.auto_cleanup {
                    actions.push(Cleanup);
                }
                actions
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TriggerAction::*;

    fn set(allow_exit: bool, standby: (bool, bool), halfwake: (bool, bool)) -> ExitTriggerSet {
        ExitTriggerSet {
            allow_exit,
            standby: StandbyRule {
                auto_enable: standby.0,
                auto_cleanup: standby.1,
            },
            halfwake: StandbyRule {
                auto_enable: halfwake.0,
                auto_cleanup: halfwake.1,
            },
        }
    }

    #[test]
    fn test_remote_commands_ignore_allow_exit() {
        let locked = set(false, (false, false), (false, false));
        for mode in [KioskMode::Enabled, KioskMode::Disabled] {
            assert_eq!(
                locked.evaluate(TriggerKind::Remote(RemoteCommand::Disable), mode),
                vec![Disable]
            );
            assert_eq!(
                locked.evaluate(TriggerKind::Remote(RemoteCommand::Enable), mode),
                vec![Enable]
            );
        }
    }

    #[test]
    fn test_sensor_inactive_exits_only_when_allowed() {
        let open = set(true, (false, false), (false, false));
        assert_eq!(
            open.evaluate(TriggerKind::SensorInactive, KioskMode::Enabled),
            vec![Disable]
        );
        assert!(open
            .evaluate(TriggerKind::SensorInactive, KioskMode::Disabled)
            .is_empty());
        assert!(open
            .evaluate(TriggerKind::SensorActive, KioskMode::Enabled)
            .is_empty());

        let locked = set(false, (false, false), (false, false));
        assert!(locked
            .evaluate(TriggerKind::SensorInactive, KioskMode::Enabled)
            .is_empty());
    }

    #[test]
    fn test_standby_auto_enable_with_cleanup() {
        let s = set(true, (true, true), (false, false));
        assert_eq!(
            s.evaluate(TriggerKind::Standby(StandbyState::Standby), KioskMode::Disabled),
            vec![Cleanup, Enable]
        );

        let s = set(true, (true, false), (false, false));
        assert_eq!(
            s.evaluate(TriggerKind::Standby(StandbyState::Standby), KioskMode::Enabled),
            vec![Enable]
        );
    }

    #[test]
    fn test_standby_exit_path() {
        let s = set(true, (false, true), (false, false));
        assert_eq!(
            s.evaluate(TriggerKind::Standby(StandbyState::Standby), KioskMode::Enabled),
            vec![Cleanup, Disable]
        );
        assert!(s
            .evaluate(TriggerKind::Standby(StandbyState::Standby), KioskMode::Disabled)
            .is_empty());

        let no_exit = set(false, (false, true), (false, false));
        assert!(no_exit
            .evaluate(TriggerKind::Standby(StandbyState::Standby), KioskMode::Enabled)
            .is_empty());
    }

    #[test]
    fn test_halfwake_rules() {
        let s = set(true, (false, false), (true, true));
        assert_eq!(
            s.evaluate(TriggerKind::Standby(StandbyState::Halfwake), KioskMode::Disabled),
            vec![Cleanup, Enable]
        );

        let cleanup_only = set(true, (false, false), (false, true));
        assert_eq!(
            cleanup_only.evaluate(TriggerKind::Standby(StandbyState::Halfwake), KioskMode::Enabled),
            vec![Cleanup]
        );

        let nothing = set(true, (true, true), (false, false));
        assert!(nothing
            .evaluate(TriggerKind::Standby(StandbyState::Halfwake), KioskMode::Enabled)
            .is_empty());
    }

    #[test]
    fn test_wake_up_does_nothing() {
        let s = set(true, (true, true), (true, true));
        assert!(s
            .evaluate(TriggerKind::Standby(StandbyState::Off), KioskMode::Enabled)
            .is_empty());
    }

    #[test]
    fn test_from_config_defaults() {
        let s = ExitTriggerSet::from_config(&KioskConfig::default());
        assert!(s.allow_exit);
        assert_eq!(
            s.standby,
            StandbyRule {
                auto_enable: true,
                auto_cleanup: true
            }
        );
        assert_eq!(s.halfwake, StandbyRule::default());
    }

    #[test]
    fn test_parse_remote_command() {
        assert_eq!(RemoteCommand::parse("ExitKiosk").unwrap(), RemoteCommand::Disable);
        assert_eq!(RemoteCommand::parse(" DisableKiosk\n").unwrap(), RemoteCommand::Disable);
        assert_eq!(RemoteCommand::parse("EnableKiosk").unwrap(), RemoteCommand::Enable);
        assert!(matches!(
            RemoteCommand::parse("exitkiosk"),
            Err(KioskError::ForeignEvent { .. })
        ));
    }

    #[test]
    fn test_parse_states() {
        assert_eq!(StandbyState::parse("Halfwake").unwrap(), StandbyState::Halfwake);
        assert!(StandbyState::parse("EnteringStandby").is_err());
        assert_eq!(SensorState::parse("Inactive").unwrap(), SensorState::Inactive);
        assert!(matches!(
            SensorState::parse("Maybe"),
            Err(KioskError::MalformedEvent { .. })
        ));
        assert_eq!(TriggerKind::from(SensorState::Active), TriggerKind::SensorActive);
    }

    #[test]
    fn test_trigger_kind_serializes() {
        let json = serde_json::to_value(TriggerKind::Standby(StandbyState::Halfwake)).unwrap();
        assert_eq!(json["trigger"], "standby");
        assert_eq!(json["state"], "Halfwake");
        let json = serde_json::to_value(TriggerKind::SensorInactive).unwrap();
        assert_eq!(json["trigger"], "sensor_inactive");
    }
}
