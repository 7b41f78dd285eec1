// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod error;
mod search;

pub use error::{SearchError, DEFAULT_STEP_LIMIT};
pub use search::{search, search_with_limit, SearchOutcome};
