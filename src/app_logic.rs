/*
 * This module provides the application logic layer, centered around
 * `ToolboxHost`, the platform-independent shell that owns the plugin list and
 * the open tool tabs. `WorkspaceState` tracks the tabs, `shell_session` turns
 * interactive command lines into host calls, and `background` runs slow tool
 * operations off the calling thread.
 * Unit tests for `ToolboxHost` are in `handler_tests.rs`.
 */
pub mod background;
pub mod handler;
pub mod shell_session;
pub mod ui_constants;
pub mod workspace_state;


pub use handler::{OpenMode, ToolboxHost};
pub use shell_session::{ShellReply, execute_line};
