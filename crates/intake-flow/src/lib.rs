//! The conversational intake flow: keyword classification, the per-contact
//! state machine, the in-memory session store, and the event engine that
//! ties them to the transport.

pub mod engine;
pub mod machine;
pub mod pacer;
pub mod patterns;
pub mod session;
pub mod sweeper;

pub use engine::FlowEngine;
pub use machine::{Decision, IntakeMachine};
pub use pacer::{NoopPacer, ReplyPacer, TypingPacer};
pub use patterns::KeywordSet;
pub use session::{Session, SessionStore, SessionUpdate, Step};
pub use sweeper::IdleSweeper;
