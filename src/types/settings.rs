use serde::{Deserialize, Serialize};

/// Current schema version of the settings record.
pub const SETTINGS_RECORD_VERSION: u32 = 1;

/// The single persisted settings record.
///
/// Missing fields fall back to their defaults so that records written by an
/// older build still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub version: u32,
    pub auto_restore_on_startup: bool,
    pub restore_target: RestoreTarget,
    pub restore_in_new_window: bool,
    pub keep_pinned_on_duplicate_close: bool,
    pub keep_pinned_on_auto_close: bool,
    pub duplicate_key_mode: DuplicateKeyMode,
    pub pinned_precedence: PinnedPrecedence,
    pub duplicate_scope: DuplicateScope,
    pub focus_scope: FocusScope,
    pub focus_allowlist: Vec<String>,
    pub focus_allowlist_match: AllowlistMatch,
    pub focus_keep_pinned: bool,
    pub focus_close_audible: bool,
    pub focus_action: FocusAction,
    pub auto_close_inactive_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_RECORD_VERSION,
            auto_restore_on_startup: false,
            restore_target: RestoreTarget::Last,
            restore_in_new_window: true,
            keep_pinned_on_duplicate_close: true,
            keep_pinned_on_auto_close: true,
            duplicate_key_mode: DuplicateKeyMode::OriginPath,
            pinned_precedence: PinnedPrecedence::RecordAsSeen,
            duplicate_scope: DuplicateScope::Window,
            focus_scope: FocusScope::Domain,
            focus_allowlist: Vec::new(),
            focus_allowlist_match: AllowlistMatch::Exact,
            focus_keep_pinned: true,
            focus_close_audible: false,
            focus_action: FocusAction::Close,
            auto_close_inactive_minutes: 0,
        }
    }
}

/// Which session the startup auto-restore picks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RestoreTarget {
    Last,
    Favorite,
}

/// How a URL is reduced to a duplicate-detection key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DuplicateKeyMode {
    /// `origin + path`; query and fragment are ignored.
    OriginPath,
    /// Legacy rule: only the fragment is ignored.
    StripFragment,
}

/// Whether an exempt pinned tab still registers its key as seen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PinnedPrecedence {
    /// Pinned tabs are kept and their key is recorded, so later unpinned
    /// copies are closed.
    RecordAsSeen,
    /// Pinned tabs are kept and otherwise ignored.
    ExemptOnly,
}

/// Which tabs the duplicate scan covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DuplicateScope {
    Window,
    AllWindows,
}

/// The rule set deciding which tabs survive focus enforcement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FocusScope {
    Window,
    Domain,
    Allowlist,
}

/// Hostname comparison rule for the allowlist scope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AllowlistMatch {
    /// Lowercased hostname must equal an allowlist entry.
    Exact,
    /// A leading `www.` is stripped from both sides before comparing.
    StripWww,
}

/// What focus mode does with out-of-scope tabs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FocusAction {
    Close,
    Group,
}
