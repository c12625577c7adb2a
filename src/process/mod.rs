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

//! # Process Module
//!
//! Starting and supervising the external analysis application.
//!
//! - **Command** ([command.rs](command/index.html)): argument vector, classpath and environment
//! - **Sink** ([sink.rs](sink/index.html)): where child output lines go
//! - **Orchestrator** ([orchestrator.rs](orchestrator/index.html)): spawn, drain, wait, kill

pub mod command;
pub mod orchestrator;
pub mod sink;

pub use command::{
    assemble_classpath, find_library, java_executable, TanApplicationCommand, TanLaunchArgs,
    TanProcessRequest, HOME_VARIABLE, MAIN_CLASS, MAIN_JAR,
};
pub use orchestrator::{TanProcessOrchestrator, TanProcessOutcome};
pub use sink::{TanLogFacadeSink, TanLogSink, TanMemorySink, TanStreamKind, TanWriterSink};
