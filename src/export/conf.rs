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

//! # Run Configuration Writer
//!
//! Produces the configuration file the analysis application loads at start:
//! a datastore catalog with exactly one datastore, the worker-thread ceiling
//! and the packages its classpath scanner searches for analyzers and
//! renderers. The output is a single line after the XML header, matching
//! what the application's own tooling writes.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::export::{escape_xml, write_atomic};
use crate::export::materialize::TanMaterializeFormat;

/// Datastore class that reads materialized row streams.
pub const KETTLE_DATASTORE_CLASS: &str = "org.pentaho.di.profiling.datacleaner.KettleDatastore";

pub const DEFAULT_MAX_THREADS: u32 = 30;

const CONFIGURATION_NAMESPACE: &str = "http://eobjects.org/analyzerbeans/configuration/1.0";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// `(package, recursive)` pairs scanned for components.
const SCANNED_PACKAGES: [(&str, bool); 9] = [
    ("org.eobjects.analyzer.beans", true),
    ("org.eobjects.analyzer.result.renderer", false),
    ("org.eobjects.datacleaner.output.beans", false),
    ("org.eobjects.datacleaner.visualization", false),
    ("org.eobjects.datacleaner.extension", true),
    ("org.eobjects.datacleaner.panels", false),
    ("org.eobjects.datacleaner.widgets.result", true),
    ("com.hi", true),
    ("com.neopost", true),
];

/// How the datastore's backing file is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TanDatastoreKind {
    /// Custom datastore over a materialized row stream.
    Kettle,
    /// Built-in CSV datastore.
    Csv,
}

impl From<TanMaterializeFormat> for TanDatastoreKind {
    fn from(format: TanMaterializeFormat) -> Self {
        match format {
            TanMaterializeFormat::RowStream => TanDatastoreKind::Kettle,
            TanMaterializeFormat::Csv => TanDatastoreKind::Csv,
        }
    }
}

/// The single datastore declared in a configuration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TanDatastoreDecl {
    pub name: String,
    pub filename: PathBuf,
    pub kind: TanDatastoreKind,
}

impl TanDatastoreDecl {
    pub fn new(name: impl Into<String>, filename: impl Into<PathBuf>, kind: TanDatastoreKind) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            kind,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TanConfWriter {
    max_threads: u32,
}

impl Default for TanConfWriter {
    fn default() -> Self {
        Self {
            max_threads: DEFAULT_MAX_THREADS,
        }
    }
}

impl TanConfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_threads(mut self, max_threads: u32) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn render(&self, datastore: &TanDatastoreDecl) -> String {
        let name = escape_xml(&datastore.name);
        let filename = escape_xml(&datastore.filename.to_string_lossy());

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<configuration xmlns=\"{}\" xmlns:xsi=\"{}\">",
            CONFIGURATION_NAMESPACE, XSI_NAMESPACE
        ));

        xml.push_str("<datastore-catalog>");
        match datastore.kind {
            TanDatastoreKind::Kettle => {
                xml.push_str(&format!("<custom-datastore class-name=\"{}\">", KETTLE_DATASTORE_CLASS));
                xml.push_str(&format!("<property name=\"Name\" value=\"{}\" />", name));
                xml.push_str(&format!("<property name=\"Filename\" value=\"{}\" />", filename));
                xml.push_str("</custom-datastore>");
            }
            TanDatastoreKind::Csv => {
                xml.push_str(&format!("<csv-datastore name=\"{}\">", name));
                xml.push_str(&format!("<filename>{}</filename>", filename));
                xml.push_str("<quote-char>\"</quote-char>");
                xml.push_str("<separator-char>,</separator-char>");
                xml.push_str("<encoding>UTF-8</encoding>");
                xml.push_str("</csv-datastore>");
            }
        }
        xml.push_str("</datastore-catalog>");

        xml.push_str(&format!(
            "<multithreaded-taskrunner max-threads=\"{}\" />",
            self.max_threads
        ));

        xml.push_str("<classpath-scanner>");
        for (package, recursive) in SCANNED_PACKAGES {
            if recursive {
                xml.push_str(&format!(" <package recursive=\"true\">{}</package>", package));
            } else {
                xml.push_str(&format!(" <package>{}</package>", package));
            }
        }
        xml.push_str("</classpath-scanner>");

        xml.push_str("</configuration>");
        xml
    }

    pub fn write(&self, datastore: &TanDatastoreDecl, path: &Path) -> Result<()> {
        let xml = self.render(datastore);
        write_atomic(path, |w| Ok(w.write_all(xml.as_bytes())?))?;
        log::info!(
            "Wrote configuration for datastore '{}' to {}",
            datastore.name,
            path.display()
        );
        Ok(())
    }
}
