use serde_json::Value;

const EXPORT_SCHEMA: &str = include_str!("../../schemas/export.schema.json");
const ANALYSIS_SCHEMA: &str = include_str!("../../schemas/analysis.schema.json");
const SCRIPT_OUTPUT_SCHEMA: &str = include_str!("../../schemas/script_output.schema.json");

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// C5: holds the export and analysis schemas, compiled once at
/// construction, and validates artifacts against them.
pub struct SchemaValidator {
    export: jsonschema::Validator,
    analysis: jsonschema::Validator,
    script_output: jsonschema::Validator,
}

impl SchemaValidator {
    pub fn new() -> Result<Self, String> {
        let export_schema: Value = serde_json::from_str(EXPORT_SCHEMA).map_err(|e| e.to_string())?;
        let analysis_schema: Value = serde_json::from_str(ANALYSIS_SCHEMA).map_err(|e| e.to_string())?;
        let script_schema: Value = serde_json::from_str(SCRIPT_OUTPUT_SCHEMA).map_err(|e| e.to_string())?;
        Ok(Self {
            export: jsonschema::validator_for(&export_schema).map_err(|e| e.to_string())?,
            analysis: jsonschema::validator_for(&analysis_schema).map_err(|e| e.to_string())?,
            script_output: jsonschema::validator_for(&script_schema).map_err(|e| e.to_string())?,
        })
    }

    pub fn validate_export(&self, artifact: &Value) -> Result<(), Vec<ValidationIssue>> {
        collect_errors(&self.export, artifact)
    }

    /// Validates the analysis schema directly, and additionally checks
    /// the extension relation (§6): a view of the artifact stripped of
    /// analysis-only fields must also satisfy the export schema, not
    /// just the analysis schema in isolation.
    pub fn validate_analysis(&self, artifact: &Value) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = collect_errors(&self.analysis, artifact).err().unwrap_or_default();
        if let Some(export_view) = strip_to_export_view(artifact) {
            if let Err(mut export_issues) = collect_errors(&self.export, &export_view) {
                issues.append(&mut export_issues);
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    pub fn validate_script_output(&self, output: &Value) -> Result<(), Vec<ValidationIssue>> {
        collect_errors(&self.script_output, output)
    }
}

fn collect_errors(validator: &jsonschema::Validator, instance: &Value) -> Result<(), Vec<ValidationIssue>> {
    let issues: Vec<ValidationIssue> = validator
        .iter_errors(instance)
        .map(|err| ValidationIssue { path: err.instance_path.to_string(), message: err.to_string() })
        .collect();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Projects an analysis artifact down to its export-equivalent shape by
/// dropping the enrichment-only fields, so the extension relation can be
/// checked without a second, independent schema.
fn strip_to_export_view(artifact: &Value) -> Option<Value> {
    let obj = artifact.as_object()?;
    let metadata = obj.get("metadata")?.as_object()?;
    let mut export_metadata = serde_json::Map::new();
    for key in ["exportTimestamp", "totalCount", "exporterVersion", "userId", "username"] {
        if let Some(v) = metadata.get(key) {
            export_metadata.insert(key.to_string(), v.clone());
        }
    }
    let bookmarks = obj.get("bookmarks")?.as_array()?;
    let record_fields = [
        "id",
        "url",
        "text",
        "authorUsername",
        "authorName",
        "createdAt",
        "likeCount",
        "retweetCount",
        "replyCount",
    ];
    let stripped_bookmarks: Vec<Value> = bookmarks
        .iter()
        .filter_map(|b| {
            let b = b.as_object()?;
            let mut out = serde_json::Map::new();
            for key in record_fields {
                if let Some(v) = b.get(key) {
                    out.insert(key.to_string(), v.clone());
                }
            }
            Some(Value::Object(out))
        })
        .collect();
    Some(serde_json::json!({ "metadata": export_metadata, "bookmarks": stripped_bookmarks }))
}
