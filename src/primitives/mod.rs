//! This module contains reimplementations of Elements primitives.

pub mod confidential;
pub mod encode;
pub mod hash;
pub mod script;
pub mod transaction;
