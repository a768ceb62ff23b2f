//! Destination shape checks.
//!
//! A destination must be a `Vec<R>` or a `Vec<Box<R>>` for the record type
//! being loaded. Anything else is rejected before any row is fetched.

use crate::record::Record;
use std::any::Any;

/// Element shape of a destination sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiArgType {
    StructSequence,
    PointerSequence,
    Invalid,
}

/// A validated destination, ready to receive records.
#[derive(Debug)]
pub enum MultiArg<'a, R> {
    Struct(&'a mut Vec<R>),
    Boxed(&'a mut Vec<Box<R>>),
    Invalid,
}

impl<R> MultiArg<'_, R> {
    pub fn kind(&self) -> MultiArgType {
        match self {
            MultiArg::Struct(_) => MultiArgType::StructSequence,
            MultiArg::Boxed(_) => MultiArgType::PointerSequence,
            MultiArg::Invalid => MultiArgType::Invalid,
        }
    }

    /// Append a record in the validated shape. No-op for `Invalid`.
    pub fn push(&mut self, record: R) {
        match self {
            MultiArg::Struct(dst) => dst.push(record),
            MultiArg::Boxed(dst) => dst.push(Box::new(record)),
            MultiArg::Invalid => {}
        }
    }
}

/// Classify `dst` as a sequence of `R` or a sequence of boxed `R`.
pub fn check_multi_arg<R: Record>(dst: &mut dyn Any) -> MultiArg<'_, R> {
    if dst.is::<Vec<R>>() {
        dst.downcast_mut::<Vec<R>>()
            .map_or(MultiArg::Invalid, MultiArg::Struct)
    } else if dst.is::<Vec<Box<R>>>() {
        dst.downcast_mut::<Vec<Box<R>>>()
            .map_or(MultiArg::Invalid, MultiArg::Boxed)
    } else {
        MultiArg::Invalid
    }
}
