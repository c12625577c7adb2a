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

//! # Command Assembly
//!
//! Builds the [`TanProcessRequest`] that starts the analysis application:
//! Java executable, classpath, system properties, main class and the
//! application's own command-line arguments.
//!
//! The classpath is ordered and deterministic. The installation's libraries
//! come first (main jar, then `lib/*.jar` sorted by file name), caller
//! supplied entries follow, and a repeated entry keeps its first position.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::errors::{Result, TanError};

pub const MAIN_CLASS: &str = "org.eobjects.datacleaner.Main";

/// Environment variable carrying the installation root to the child.
pub const HOME_VARIABLE: &str = "DATACLEANER_HOME";

/// Jar expected directly under the installation root.
pub const MAIN_JAR: &str = "DataCleaner.jar";

/// Arguments understood by the analysis application. Absent or empty
/// values are omitted together with their flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TanLaunchArgs {
    pub conf_file: Option<PathBuf>,
    pub job_file: Option<PathBuf>,
    pub datastore_name: Option<String>,
    pub output_type: Option<String>,
    pub output_file: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl TanLaunchArgs {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_pair(&mut args, "-conf", self.conf_file.as_ref().map(|p| p.display().to_string()));
        push_pair(&mut args, "-job", self.job_file.as_ref().map(|p| p.display().to_string()));
        push_pair(&mut args, "-ds", self.datastore_name.clone());
        push_pair(&mut args, "-ot", self.output_type.clone());
        push_pair(&mut args, "-of", self.output_file.as_ref().map(|p| p.display().to_string()));
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        args.push(flag.to_string());
        args.push(value);
    }
}

/// Everything needed to start one external process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TanProcessRequest {
    pub executable: PathBuf,
    /// Arguments after the classpath option.
    pub arguments: Vec<String>,
    /// Variables added to the inherited environment.
    pub working_env: BTreeMap<String, String>,
    /// Rendered as `-cp <entries>` before `arguments` when non-empty.
    pub classpath_entries: Vec<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl TanProcessRequest {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.working_env.insert(key.into(), value.into());
        self
    }

    /// Full argument vector handed to the executable.
    pub fn argv(&self) -> Result<Vec<OsString>> {
        let mut argv = Vec::with_capacity(self.arguments.len() + 2);
        if !self.classpath_entries.is_empty() {
            let classpath = std::env::join_paths(&self.classpath_entries).map_err(|e| {
                TanError::Launch {
                    executable: self.executable.display().to_string(),
                    message: format!("invalid classpath entry: {}", e),
                }
            })?;
            argv.push(OsString::from("-cp"));
            argv.push(classpath);
        }
        argv.extend(self.arguments.iter().map(OsString::from));
        Ok(argv)
    }

    /// Space separated rendering for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.executable.display().to_string();
        if let Ok(argv) = self.argv() {
            for arg in argv {
                let _ = write!(line, " {}", arg.to_string_lossy());
            }
        }
        line
    }
}

/// Java executable: explicit home, then `JAVA_HOME`, then `java` on `PATH`.
pub fn java_executable(java_home: Option<&Path>) -> PathBuf {
    let binary = if cfg!(windows) { "java.exe" } else { "java" };
    let home = java_home
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("JAVA_HOME").filter(|v| !v.is_empty()).map(PathBuf::from));
    match home {
        Some(home) => home.join("bin").join(binary),
        None => PathBuf::from(binary),
    }
}

/// First `*.jar` in `dir` whose file name starts with `prefix`, in file name order.
pub fn find_library(dir: &Path, prefix: &str) -> Option<PathBuf> {
    list_jars(dir).into_iter().find(|jar| {
        jar.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(prefix))
    })
}

fn list_jars(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    let mut jars: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "jar"))
        .collect();
    jars.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    jars
}

/// Installation libraries followed by `supplemental`, first occurrence wins.
pub fn assemble_classpath(installation_root: &Path, supplemental: &[PathBuf]) -> Vec<PathBuf> {
    let main_jar = installation_root.join(MAIN_JAR);
    let prefix = main_jar
        .is_file()
        .then_some(main_jar)
        .into_iter()
        .chain(list_jars(&installation_root.join("lib")));

    let mut seen = HashSet::new();
    prefix
        .chain(supplemental.iter().cloned())
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

/// Launch recipe for the analysis application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TanApplicationCommand {
    pub installation_root: PathBuf,
    pub java_home: Option<PathBuf>,
    pub supplemental_classpath: Vec<PathBuf>,
    pub ui_visible: bool,
}

impl TanApplicationCommand {
    pub fn new(installation_root: impl Into<PathBuf>) -> Self {
        Self {
            installation_root: installation_root.into(),
            java_home: None,
            supplemental_classpath: Vec::new(),
            ui_visible: true,
        }
    }

    pub fn request(&self, launch: &TanLaunchArgs) -> TanProcessRequest {
        let root = self.installation_root.display().to_string();
        let mut request = TanProcessRequest::new(java_executable(self.java_home.as_deref()))
            .arg(format!("-Ddatacleaner.ui.visible={}", self.ui_visible))
            .arg("-Ddatacleaner.embed.client=Kettle")
            .arg(format!("-DDATACLEANER_HOME={}", root))
            .arg(MAIN_CLASS)
            .args(launch.to_args())
            .env(HOME_VARIABLE, root);
        request.classpath_entries =
            assemble_classpath(&self.installation_root, &self.supplemental_classpath);
        request
    }
}
