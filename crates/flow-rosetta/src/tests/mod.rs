// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

mod construction_test;
mod server_test;
pub(crate) mod test_context;
