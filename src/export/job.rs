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

//! # Job Description Writer
//!
//! Serializes a [`TanJobSpec`] into the analysis application's job XML. The
//! layout is owned by the application's job reader; elements appear in the
//! order it expects:
//!
//! ```text
//! job
//! ├── job-metadata (job-version, author, updated-date)
//! ├── source
//! │   ├── data-context ref=<datastore>
//! │   └── columns / column id=col_N path=<table>.<column> type=<SQL type>
//! ├── transformation
//! └── analysis / analyzer*
//!     ├── descriptor ref=<analyzer name>
//!     ├── properties / property*
//!     └── input ref=col_N *
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use chrono::{NaiveDate, Utc};

use crate::errors::Result;
use crate::export::{escape_xml, write_atomic};
use crate::inspect::{TanAnalyzerSpec, TanJobSpec, TanParameterValue};
use crate::schema::TanSemanticType;

pub const JOB_NAMESPACE: &str = "http://eobjects.org/analyzerbeans/job/1.0";

/// Column type names the job reader maps back to semantic types.
pub fn column_type(ty: TanSemanticType) -> &'static str {
    match ty {
        TanSemanticType::Number => "DOUBLE",
        TanSemanticType::String => "VARCHAR",
        TanSemanticType::Date => "TIMESTAMP",
        TanSemanticType::Boolean => "BOOLEAN",
        TanSemanticType::Other => "BINARY",
    }
}

/// Header block of a job file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TanJobMetadata {
    pub job_version: String,
    pub author: String,
    pub updated_date: NaiveDate,
}

impl Default for TanJobMetadata {
    fn default() -> Self {
        Self {
            job_version: "2.0".to_string(),
            author: std::env::var("USER").unwrap_or_else(|_| "tanxi".to_string()),
            updated_date: Utc::now().date_naive(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TanJobWriter {
    metadata: TanJobMetadata,
}

impl TanJobWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: TanJobMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata(&self) -> &TanJobMetadata {
        &self.metadata
    }

    pub fn render(&self, job: &TanJobSpec) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        let _ = writeln!(xml, "<job xmlns=\"{}\">", JOB_NAMESPACE);

        xml.push_str("    <job-metadata>\n");
        let _ = writeln!(
            xml,
            "        <job-version>{}</job-version>",
            escape_xml(&self.metadata.job_version)
        );
        let _ = writeln!(xml, "        <author>{}</author>", escape_xml(&self.metadata.author));
        let _ = writeln!(
            xml,
            "        <updated-date>{}Z</updated-date>",
            self.metadata.updated_date.format("%Y-%m-%d")
        );
        xml.push_str("    </job-metadata>\n");

        let mut ids = HashMap::with_capacity(job.source_columns.len());
        xml.push_str("    <source>\n");
        let _ = writeln!(
            xml,
            "        <data-context ref=\"{}\"/>",
            escape_xml(&job.datastore_name)
        );
        xml.push_str("        <columns>\n");
        for (index, column) in job.source_columns.iter().enumerate() {
            let id = format!("col_{}", index);
            let _ = writeln!(
                xml,
                "            <column id=\"{}\" path=\"{}\" type=\"{}\"/>",
                id,
                escape_xml(&format!("{}.{}", job.table_name, column.name)),
                column_type(column.semantic_type)
            );
            ids.insert(column.name.as_str(), id);
        }
        xml.push_str("        </columns>\n");
        xml.push_str("    </source>\n");

        xml.push_str("    <transformation/>\n");

        if job.analyzers.is_empty() {
            xml.push_str("    <analysis/>\n");
        } else {
            xml.push_str("    <analysis>\n");
            for analyzer in &job.analyzers {
                render_analyzer(&mut xml, analyzer, &ids);
            }
            xml.push_str("    </analysis>\n");
        }

        xml.push_str("</job>\n");
        xml
    }

    /// Renders `job` and writes it atomically to `path`.
    pub fn write(&self, job: &TanJobSpec, path: &Path) -> Result<()> {
        let xml = self.render(job);
        write_atomic(path, |w| Ok(w.write_all(xml.as_bytes())?))?;
        log::info!(
            "Wrote job with {} analyzers over {} columns to {}",
            job.analyzers.len(),
            job.source_columns.len(),
            path.display()
        );
        Ok(())
    }
}

fn render_analyzer(xml: &mut String, analyzer: &TanAnalyzerSpec, ids: &HashMap<&str, String>) {
    if analyzer.has_custom_name() {
        let _ = writeln!(xml, "        <analyzer name=\"{}\">", escape_xml(&analyzer.display_name));
    } else {
        xml.push_str("        <analyzer>\n");
    }
    let _ = writeln!(
        xml,
        "            <descriptor ref=\"{}\"/>",
        escape_xml(analyzer.kind.descriptor().name)
    );

    if analyzer.parameters.is_empty() {
        xml.push_str("            <properties/>\n");
    } else {
        xml.push_str("            <properties>\n");
        for (name, value) in &analyzer.parameters {
            let _ = writeln!(
                xml,
                "                <property name=\"{}\" value=\"{}\"/>",
                escape_xml(name),
                escape_xml(&property_value(value))
            );
        }
        xml.push_str("            </properties>\n");
    }

    for column in &analyzer.target_columns {
        match ids.get(column.name.as_str()) {
            Some(id) => {
                let _ = writeln!(xml, "            <input ref=\"{}\"/>", id);
            }
            None => log::warn!(
                "Analyzer '{}' targets '{}' which is not a source column",
                analyzer.display_name,
                column.name
            ),
        }
    }
    xml.push_str("        </analyzer>\n");
}

fn property_value(value: &TanParameterValue) -> String {
    match value {
        TanParameterValue::Boolean(b) => b.to_string(),
        TanParameterValue::Text(text) => text.clone(),
        TanParameterValue::TextList(items) => format!("[{}]", items.join(",")),
    }
}
