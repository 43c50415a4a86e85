//! catalog-runtime: the admin views of the music catalog, driven from a
//! terminal. Owns the gate board, the action invoker and the command surface;
//! the `catalog-admin` binary is a thin wrapper over this library.

pub mod board;
pub mod cli;
pub mod cmd_delete;
pub mod cmd_list;
pub mod command;
pub mod config;
pub mod invoker;
pub mod memory;
pub mod shell;

pub use board::{BoardUpdate, DisarmReason, GateBoard, GateEvent};
pub use invoker::{Action, ActionFailure, ActionResult, ActionSuccess, RefreshScope};
pub use memory::MemoryCatalog;
