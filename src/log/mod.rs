//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Tanxi.
//! The Tanxi project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Logging
//!
//! Every component logs through the `log` facade. This module provides the
//! backend applications install to see those records:
//!
//! ```rust
//! use tanxi::log::{TanLogConfig, TanLogger};
//!
//! TanLogger::init(TanLogConfig::default().with_level("DEBUG").with_json(true));
//! ```

pub mod config;
pub mod core;

pub use self::config::TanLogConfig;
pub use self::core::TanLogger;
