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

//! # Inspect Module
//!
//! Decides what the analysis application should compute for a column set.
//!
//! - **Selection** ([selection.rs](selection/index.html)): heuristic analyzer
//!   selection and the job specification it produces

pub mod selection;

pub use selection::{
    TanAnalyzerDescriptor, TanAnalyzerKind, TanAnalyzerSpec, TanJobMode, TanJobSpec,
    TanParameterValue, TanPropertyDescriptor, TanPropertyKind, TanSelectionEngine,
    IDENTIFIER_TOKENS, NOT_BLANK_OR_NULL,
};
