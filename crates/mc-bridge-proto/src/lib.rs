//! Shared protocol types for the container-protocol bridge.
//!
//! The front protocol is flat and client-authoritative: the client names
//! source and destination slots directly. The back protocol is click-based
//! and server-authoritative: only a handful of cursor-mediated primitives
//! exist. This crate holds the typed vocabulary of both sides; the synthesis
//! logic that bridges them lives in `mc-bridge-inventory`.

pub mod click;
pub mod item_stack;
pub mod request;
pub mod response;

pub use click::{ClickFrame, ClickKind, OUTSIDE_SLOT};
pub use item_stack::ItemStack;
pub use request::{ContainerTag, ItemStackBatch, SlotRef, StackAction, StackRequest};
pub use response::{BatchResponse, ContainerReport, RejectKind, SlotReport};
