pub mod action;
pub mod activity_log;
pub mod caller;
pub mod recruitment;
pub mod slot;
pub mod stage;
