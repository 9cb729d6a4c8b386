//! The CLI physical metadata model.
//!
//! Layered bottom-up:
//!
//! - [`token`] — 32-bit table/row references.
//! - [`tables`] — row types, the resolved layout, coded indexes, the lazy
//!   table store and the write buffer.
//! - [`root`] / [`streams`] — the BSJB root header, the stream directory and
//!   the five stream views.
//! - [`members`] — memoized token resolution.
//! - [`signatures`] — blob signature decoding and resolution.
//! - [`view`] — everything above assembled over one byte region, plus the
//!   owned [`view::Metadata`] wrapper.

pub mod members;
pub mod root;
pub mod signatures;
pub mod streams;
pub mod tables;
pub mod token;
pub mod view;
