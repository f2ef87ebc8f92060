//! Frame role and host client descriptors.
//!
//! Both values arrive in the handshake acknowledgement and are
//! string-typed on the wire. Unknown strings are kept rather than
//! rejected so that a newer host never breaks the handshake of an older
//! page.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of the embedding surface the page currently occupies.
///
/// Several host capabilities are only valid in specific frame contexts
/// (a settings page can save tab configuration, a task frame can submit
/// a dialog result). Callers check the negotiated frame context before
/// invoking such capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FrameContext {
    /// Configuration page of a tab.
    Settings,
    /// Default content surface.
    Content,
    /// Window opened for an authentication flow.
    Authentication,
    /// Page shown while the app is being removed.
    Remove,
    /// Task module / dialog frame.
    Task,
    /// Persistent side panel.
    SidePanel,
    /// Large central stage surface.
    Stage,
    /// Shared stage of a meeting.
    MeetingStage,
    /// A context this library does not know about yet.
    Other(String),
}

impl FrameContext {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Settings => "settings",
            Self::Content => "content",
            Self::Authentication => "authentication",
            Self::Remove => "remove",
            Self::Task => "task",
            Self::SidePanel => "sidePanel",
            Self::Stage => "stage",
            Self::MeetingStage => "meetingStage",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for FrameContext {
    fn from(s: String) -> Self {
        match s.as_str() {
            "settings" => Self::Settings,
            "content" => Self::Content,
            "authentication" => Self::Authentication,
            "remove" => Self::Remove,
            "task" => Self::Task,
            "sidePanel" => Self::SidePanel,
            "stage" => Self::Stage,
            "meetingStage" => Self::MeetingStage,
            _ => Self::Other(s),
        }
    }
}

impl From<FrameContext> for String {
    fn from(ctx: FrameContext) -> Self {
        match ctx {
            FrameContext::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for FrameContext {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for FrameContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client platform the host application is running on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HostClientType {
    Desktop,
    Web,
    Android,
    Ios,
    IpadOs,
    MacOs,
    Rigel,
    SurfaceHub,
    TeamsRoomsWindows,
    TeamsRoomsAndroid,
    TeamsPhones,
    TeamsDisplays,
    Other(String),
}

impl HostClientType {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Desktop => "desktop",
            Self::Web => "web",
            Self::Android => "android",
            Self::Ios => "ios",
            Self::IpadOs => "ipados",
            Self::MacOs => "macos",
            Self::Rigel => "rigel",
            Self::SurfaceHub => "surfaceHub",
            Self::TeamsRoomsWindows => "teamsRoomsWindows",
            Self::TeamsRoomsAndroid => "teamsRoomsAndroid",
            Self::TeamsPhones => "teamsPhones",
            Self::TeamsDisplays => "teamsDisplays",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` for phone and tablet clients.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Android | Self::Ios | Self::IpadOs)
    }
}

impl From<String> for HostClientType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "desktop" => Self::Desktop,
            "web" => Self::Web,
            "android" => Self::Android,
            "ios" => Self::Ios,
            "ipados" => Self::IpadOs,
            "macos" => Self::MacOs,
            "rigel" => Self::Rigel,
            "surfaceHub" => Self::SurfaceHub,
            "teamsRoomsWindows" => Self::TeamsRoomsWindows,
            "teamsRoomsAndroid" => Self::TeamsRoomsAndroid,
            "teamsPhones" => Self::TeamsPhones,
            "teamsDisplays" => Self::TeamsDisplays,
            _ => Self::Other(s),
        }
    }
}

impl From<HostClientType> for String {
    fn from(client: HostClientType) -> Self {
        match client {
            HostClientType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for HostClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
