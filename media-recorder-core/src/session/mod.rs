pub mod recorder_session;
