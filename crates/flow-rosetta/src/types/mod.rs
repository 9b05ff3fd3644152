// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Types of the Rosetta API, serialized as defined by the Rosetta API

mod identifiers;
mod misc;
mod objects;
mod requests;

pub use identifiers::*;
pub use misc::*;
pub use objects::*;
pub use requests::*;
