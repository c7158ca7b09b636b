// Tabfix state managers
// Managers own stateful collaborators: the tab provider and the session archive.

pub mod session_manager;
pub mod tab_manager;
