//! Schema validation of packets and VOEvent files
//!
//! [`SchemaValidator`] validates single documents against one parsed schema.
//! [`ValidationEngine`] runs it over discovered files on a rayon pool:
//! libxml2 validation is CPU-bound and thread-safe once the schema is
//! parsed, so each file gets its own document and validation context while
//! the schema is shared.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LibXml2Error, Result, VoeventError};
use crate::file_discovery::FileDiscovery;
use crate::libxml2::{LibXml2Wrapper, ValidationResult, Violation, XmlSchemaPtr};
use crate::schema_loader::{SchemaLoader, SchemaSource, extract_schema_references};
use crate::serialize;
use crate::voevent::Voevent;

/// Section a VOEvent packet must carry beyond what the v2.0 schema demands
const REQUIRED_SECTION: &str = "WhereWhen";

/// libxml2's `XML_SCHEMAV_ELEMENT_CONTENT`, reused for a missing section
const XML_SCHEMAV_ELEMENT_CONTENT: i32 = 1871;

/// Validates documents against one parsed XSD
pub struct SchemaValidator {
    schema: XmlSchemaPtr,
    source: SchemaSource,
    wrapper: LibXml2Wrapper,
}

impl SchemaValidator {
    /// Validator for the embedded VOEvent v2.0 schema
    pub fn new() -> Result<Self> {
        Self::from_source(SchemaSource::Embedded)
    }

    pub fn from_source(source: SchemaSource) -> Result<Self> {
        let schema = SchemaLoader::new().load(&source)?;
        debug!(schema = %source, "Schema ready");
        Ok(Self {
            schema,
            source,
            wrapper: LibXml2Wrapper::new(),
        })
    }

    /// Validator for a local XSD file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        Self::from_source(SchemaSource::File(path.into()))
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    /// Parse and validate raw XML. Text that is not well-formed XML fails
    /// with [`VoeventError::Parse`].
    ///
    /// The published v2.0 schema leaves every section optional. Against the
    /// embedded schema a packet must also carry `WhereWhen`; a packet without
    /// one is reported as a violation at `/voe:VOEvent/WhereWhen`.
    pub fn validate_bytes(&self, content: &[u8], name: &str) -> Result<ValidationResult> {
        let doc = self
            .wrapper
            .parse_document(content, name)
            .map_err(|err| match err {
                LibXml2Error::MalformedDocument { name } => VoeventError::parse(name),
                other => VoeventError::from(other),
            })?;
        let mut result = self.wrapper.validate_document(&self.schema, &doc, name)?;

        if result.is_valid()
            && self.source == SchemaSource::Embedded
            && !doc.root_has_child(REQUIRED_SECTION)
        {
            let root = doc.root_path().unwrap_or_else(|| "/voe:VOEvent".to_string());
            result = ValidationResult::Invalid {
                code: XML_SCHEMAV_ELEMENT_CONTENT,
                violation: Violation {
                    path: format!("{root}/{REQUIRED_SECTION}"),
                    line: 0,
                    message: format!(
                        "Element 'VOEvent': Missing child element(s). Expected is ( {REQUIRED_SECTION} )."
                    ),
                },
            };
        }

        match &result {
            ValidationResult::Valid => debug!(document = name, "Document is valid"),
            ValidationResult::Invalid { violation, .. } => {
                debug!(document = name, path = %violation.path, reason = %violation.message, "Document is invalid")
            }
            ValidationResult::InternalError { code } => debug!(document = name, code, "Validation error"),
        }
        Ok(result)
    }

    pub fn validate_str(&self, xml: &str) -> Result<ValidationResult> {
        self.validate_bytes(xml.as_bytes(), "<string>")
    }

    pub fn validate_file(&self, path: &Path) -> Result<ValidationResult> {
        let content = fs::read(path)?;
        self.validate_bytes(&content, &path.display().to_string())
    }

    /// Serialize `voevent` to its canonical text and validate that text
    pub fn validate(&self, voevent: &Voevent) -> Result<ValidationResult> {
        let xml = serialize::dumps(voevent, false);
        self.validate_bytes(xml.as_bytes(), voevent.ivorn())
    }

    pub fn is_valid(&self, voevent: &Voevent) -> bool {
        matches!(self.validate(voevent), Ok(ValidationResult::Valid))
    }

    /// Succeeds for a valid packet; otherwise reports the first violation
    pub fn assert_valid(&self, voevent: &Voevent) -> Result<()> {
        match self.validate(voevent)? {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid { violation, .. } => Err(VoeventError::SchemaViolation {
                path: violation.path,
                reason: violation.message,
            }),
            ValidationResult::InternalError { code } => Err(VoeventError::LibXml2Internal {
                details: format!("validation returned internal code {code}"),
            }),
        }
    }
}

/// Check a packet against the embedded VOEvent v2.0 schema
pub fn is_valid(voevent: &Voevent) -> bool {
    match SchemaValidator::new() {
        Ok(validator) => validator.is_valid(voevent),
        Err(err) => {
            warn!(error = %err, "Embedded schema unavailable");
            false
        }
    }
}

/// Like [`is_valid`], but a failure names the offending element
pub fn assert_valid(voevent: &Voevent) -> Result<()> {
    SchemaValidator::new()?.assert_valid(voevent)
}

/// Batch validation settings
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Size of the validation thread pool
    pub threads: usize,
    /// Stop validating once a file fails
    pub fail_fast: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            fail_fast: false,
        }
    }
}

/// Status of a single file validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// File validated successfully
    Valid,
    /// First schema violation in the file
    Invalid {
        path: String,
        line: i32,
        reason: String,
    },
    /// The file could not be read, was not well-formed, or libxml2 failed
    Error { message: String },
    /// File was not validated
    Skipped { reason: String },
}

impl ValidationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationStatus::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationStatus::Error { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ValidationStatus::Skipped { .. })
    }
}

impl From<ValidationResult> for ValidationStatus {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid => ValidationStatus::Valid,
            ValidationResult::Invalid { violation, .. } => ValidationStatus::Invalid {
                path: violation.path,
                line: violation.line,
                reason: violation.message,
            },
            ValidationResult::InternalError { code } => ValidationStatus::Error {
                message: format!("LibXML2 internal error: {}", code),
            },
        }
    }
}

/// Result of validating a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileValidationResult {
    pub path: PathBuf,
    pub status: ValidationStatus,
    /// Schema the file was checked against, absent when it was not checked
    pub schema: Option<String>,
    pub duration: Duration,
}

impl FileValidationResult {
    pub fn new(
        path: PathBuf,
        status: ValidationStatus,
        schema: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            path,
            status,
            schema,
            duration,
        }
    }

    pub fn error(path: PathBuf, error: VoeventError, duration: Duration) -> Self {
        Self::new(
            path,
            ValidationStatus::Error {
                message: error.to_string(),
            },
            None,
            duration,
        )
    }

    pub fn skipped(path: PathBuf, reason: impl Into<String>, duration: Duration) -> Self {
        Self::new(
            path,
            ValidationStatus::Skipped {
                reason: reason.into(),
            },
            None,
            duration,
        )
    }
}

/// Timing of a batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_duration: Duration,
    pub discovery_duration: Duration,
    pub validation_duration: Duration,
    pub average_time_per_file: Duration,
    pub throughput_files_per_second: f64,
    pub threads: usize,
}

/// Aggregated results of validating multiple files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResults {
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub error_files: usize,
    pub skipped_files: usize,
    /// Sum of per-file durations
    pub total_duration: Duration,
    pub average_duration: Duration,
    /// In discovery order
    pub file_results: Vec<FileValidationResult>,
    pub performance_metrics: PerformanceMetrics,
}

impl ValidationResults {
    /// Aggregate individual file results into summary
    pub fn aggregate(file_results: Vec<FileValidationResult>) -> Self {
        let total_files = file_results.len();
        let mut valid_files = 0;
        let mut invalid_files = 0;
        let mut error_files = 0;
        let mut skipped_files = 0;
        let mut total_duration = Duration::ZERO;

        for result in &file_results {
            match result.status {
                ValidationStatus::Valid => valid_files += 1,
                ValidationStatus::Invalid { .. } => invalid_files += 1,
                ValidationStatus::Error { .. } => error_files += 1,
                ValidationStatus::Skipped { .. } => skipped_files += 1,
            }
            total_duration += result.duration;
        }

        let average_duration = if total_files > 0 {
            total_duration / total_files as u32
        } else {
            Duration::ZERO
        };

        let performance_metrics = PerformanceMetrics {
            total_duration,
            validation_duration: total_duration,
            average_time_per_file: average_duration,
            throughput_files_per_second: throughput(total_files, total_duration),
            threads: 1,
            ..PerformanceMetrics::default()
        };

        Self {
            total_files,
            valid_files,
            invalid_files,
            error_files,
            skipped_files,
            total_duration,
            average_duration,
            file_results,
            performance_metrics,
        }
    }

    /// Create results with measured performance metrics
    pub fn with_metrics(
        file_results: Vec<FileValidationResult>,
        performance_metrics: PerformanceMetrics,
    ) -> Self {
        let mut results = Self::aggregate(file_results);
        results.performance_metrics = performance_metrics;
        results
    }

    /// Check if all files validated successfully
    pub fn all_valid(&self) -> bool {
        self.valid_files == self.total_files && self.total_files > 0
    }

    /// Check if any files were invalid or could not be validated
    pub fn has_errors(&self) -> bool {
        self.error_files > 0 || self.invalid_files > 0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.valid_files as f64 / self.total_files as f64) * 100.0
        }
    }
}

fn throughput(files: usize, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        files as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

/// Parallel validation of VOEvent files against one shared schema
pub struct ValidationEngine {
    validator: SchemaValidator,
    discovery: FileDiscovery,
    config: ValidationConfig,
    pool: rayon::ThreadPool,
}

impl ValidationEngine {
    pub fn new(
        validator: SchemaValidator,
        discovery: FileDiscovery,
        config: ValidationConfig,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| VoeventError::Config(format!("Failed to build thread pool: {}", e)))?;

        Ok(Self {
            validator,
            discovery,
            config,
            pool,
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Discover files below `paths` and validate them
    pub fn validate_paths(&self, paths: &[PathBuf]) -> Result<ValidationResults> {
        let start = Instant::now();
        let files = self.discovery.discover_all(paths)?;
        let discovery_duration = start.elapsed();
        debug!(files = files.len(), ?discovery_duration, "Discovery complete");

        let mut results = self.validate_files(&files);
        results.performance_metrics.discovery_duration = discovery_duration;
        results.performance_metrics.total_duration = start.elapsed();
        Ok(results)
    }

    /// Validate an explicit list of files; results keep the input order
    pub fn validate_files(&self, files: &[PathBuf]) -> ValidationResults {
        let start = Instant::now();
        let stop = AtomicBool::new(false);

        let file_results: Vec<FileValidationResult> = self.pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    if stop.load(Ordering::Relaxed) {
                        return FileValidationResult::skipped(
                            path.clone(),
                            "not validated after an earlier failure (fail-fast)",
                            Duration::ZERO,
                        );
                    }
                    let result = self.validate_file(path);
                    if self.config.fail_fast
                        && (result.status.is_invalid() || result.status.is_error())
                    {
                        stop.store(true, Ordering::Relaxed);
                    }
                    result
                })
                .collect()
        });

        let validation_duration = start.elapsed();
        let metrics = PerformanceMetrics {
            total_duration: validation_duration,
            discovery_duration: Duration::ZERO,
            validation_duration,
            average_time_per_file: if files.is_empty() {
                Duration::ZERO
            } else {
                validation_duration / files.len() as u32
            },
            throughput_files_per_second: throughput(files.len(), validation_duration),
            threads: self.config.threads,
        };

        ValidationResults::with_metrics(file_results, metrics)
    }

    /// Validate one file. Files declaring only non-VOEvent schema locations
    /// are skipped.
    pub fn validate_file(&self, path: &Path) -> FileValidationResult {
        let start = Instant::now();

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cannot read file");
                return FileValidationResult::error(path.to_path_buf(), err.into(), start.elapsed());
            }
        };

        let references = extract_schema_references(&String::from_utf8_lossy(&content));
        if !references.is_empty() && !references.iter().any(|r| r.is_voevent()) {
            let declared: Vec<&str> = references
                .iter()
                .map(|r| r.namespace.as_deref().unwrap_or(r.url.as_str()))
                .collect();
            debug!(path = %path.display(), ?declared, "Skipping non-VOEvent document");
            return FileValidationResult::skipped(
                path.to_path_buf(),
                format!("not a VOEvent v2.0 document (schema: {})", declared.join(", ")),
                start.elapsed(),
            );
        }

        match self
            .validator
            .validate_bytes(&content, &path.display().to_string())
        {
            Ok(result) => FileValidationResult::new(
                path.to_path_buf(),
                result.into(),
                Some(self.validator.source().to_string()),
                start.elapsed(),
            ),
            Err(err) => FileValidationResult::error(path.to_path_buf(), err, start.elapsed()),
        }
    }
}
