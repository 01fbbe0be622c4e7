pub mod notification_sweep;
pub mod session_reaper;
pub mod token_reaper;
