use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;
use validator::Validate;

/// A cataloged programming error: what it looks like, why it happens and how
/// to fix it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ErrorRecord {
    /// Unique identifier, shared by the record store and the search index
    #[serde(default)]
    pub id: Uuid,

    /// Programming language
    #[validate(length(min = 1, max = 100))]
    pub language: String,

    /// Framework or library, if any
    #[serde(default)]
    pub framework: Option<String>,

    /// Error category (e.g. "Runtime", "Compile")
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100))]
    pub error_type: String,

    /// Catalog code, unique across the store
    #[validate(length(min = 1, max = 255))]
    pub code: String,

    /// The error message text
    #[validate(length(min = 1))]
    pub error: String,

    #[serde(default)]
    pub severity: Option<Severity>,

    #[serde(default)]
    pub description: Option<String>,

    /// Ordered list of causes
    #[serde(default)]
    pub cause: Vec<String>,

    /// Ordered list of solutions
    #[serde(default)]
    pub solution: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    pub examples: Vec<Example>,

    #[serde(default)]
    pub links: Vec<String>,

    #[serde(default)]
    pub resources: Resources,

    #[serde(default)]
    pub meta: Meta,
}

impl ErrorRecord {
    /// Create a record with the required fields; everything else empty.
    pub fn new(
        language: impl Into<String>,
        error_type: impl Into<String>,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::nil(),
            language: language.into(),
            framework: None,
            error_type: error_type.into(),
            code: code.into(),
            error: error.into(),
            severity: None,
            description: None,
            cause: Vec::new(),
            solution: Vec::new(),
            tags: Vec::new(),
            examples: Vec::new(),
            links: Vec::new(),
            resources: Resources::default(),
            meta: Meta::default(),
        }
    }

    /// Drop duplicate tags, keeping first occurrence order.
    pub fn dedup_tags(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.tags.retain(|tag| seen.insert(tag.clone()));
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A code sample reproducing the error together with its output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Example {
    #[validate(length(min = 1))]
    pub code: String,

    #[validate(length(min = 1))]
    pub output: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub videos: Vec<String>,

    #[serde(default)]
    pub tutorials: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub added_by: Option<String>,

    #[serde(default)]
    pub added_on: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
}

/// Text-bearing fields of a record, addressable by their dotted document path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Language,
    Framework,
    Type,
    Code,
    Error,
    Severity,
    Description,
    Tags,
    Cause,
    Solution,
    ExampleCode,
    ExampleOutput,
    ResourceVideos,
    ResourceTutorials,
    Links,
    AddedBy,
}

impl RecordField {
    /// Dotted document path, as stored in the index and the record store
    pub fn path(&self) -> &'static str {
        match self {
            RecordField::Language => "language",
            RecordField::Framework => "framework",
            RecordField::Type => "type",
            RecordField::Code => "code",
            RecordField::Error => "error",
            RecordField::Severity => "severity",
            RecordField::Description => "description",
            RecordField::Tags => "tags",
            RecordField::Cause => "cause",
            RecordField::Solution => "solution",
            RecordField::ExampleCode => "examples.code",
            RecordField::ExampleOutput => "examples.output",
            RecordField::ResourceVideos => "resources.videos",
            RecordField::ResourceTutorials => "resources.tutorials",
            RecordField::Links => "links",
            RecordField::AddedBy => "meta.added_by",
        }
    }

    /// All text values held by this field on `record`. Absent optionals
    /// yield nothing; list fields yield every element.
    pub fn values<'a>(&self, record: &'a ErrorRecord) -> Vec<&'a str> {
        match self {
            RecordField::Language => vec![record.language.as_str()],
            RecordField::Framework => record.framework.as_deref().into_iter().collect(),
            RecordField::Type => vec![record.error_type.as_str()],
            RecordField::Code => vec![record.code.as_str()],
            RecordField::Error => vec![record.error.as_str()],
            RecordField::Severity => record
                .severity
                .map(<&'static str>::from)
                .into_iter()
                .collect(),
            RecordField::Description => record.description.as_deref().into_iter().collect(),
            RecordField::Tags => record.tags.iter().map(String::as_str).collect(),
            RecordField::Cause => record.cause.iter().map(String::as_str).collect(),
            RecordField::Solution => record.solution.iter().map(String::as_str).collect(),
            RecordField::ExampleCode => record.examples.iter().map(|e| e.code.as_str()).collect(),
            RecordField::ExampleOutput => {
                record.examples.iter().map(|e| e.output.as_str()).collect()
            }
            RecordField::ResourceVideos => {
                record.resources.videos.iter().map(String::as_str).collect()
            }
            RecordField::ResourceTutorials => record
                .resources
                .tutorials
                .iter()
                .map(String::as_str)
                .collect(),
            RecordField::Links => record.links.iter().map(String::as_str).collect(),
            RecordField::AddedBy => record.meta.added_by.as_deref().into_iter().collect(),
        }
    }
}
