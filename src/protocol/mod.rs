//! GDB Remote Serial Protocol framing and command decoding.

mod common;

pub(crate) mod commands;
pub(crate) mod packet;
pub(crate) mod recv_packet;

pub(crate) use common::hex;
