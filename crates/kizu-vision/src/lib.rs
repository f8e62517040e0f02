//! Vision module - AI-backed damage assessment per photo slot

pub mod prompts;
pub mod quality;

pub use prompts::build_damage_prompt;
pub use quality::LumaQualityScorer;

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use kizu_types::{AnalysisResult, CameraSlot, Error, Result, Severity};

/// Default pause between analysis calls, to stay under service rate limits
pub const DEFAULT_ANALYSIS_DELAY: Duration = Duration::from_millis(1500);

/// Default ceiling on a single backend invocation
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// External AI command line; None selects the deterministic stub
    pub backend_command: Option<String>,
    pub timeout: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            backend_command: None,
            timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_backend_command(mut self, command: Option<String>) -> Self {
        self.backend_command = command;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Instantiate the configured backend
    pub fn backend(&self) -> Box<dyn VisionBackend> {
        match &self.backend_command {
            Some(command) => Box::new(CommandBackend {
                command: command.clone(),
                timeout: self.timeout,
            }),
            None => Box::new(StubBackend),
        }
    }
}

/// External vision service contract: one photo plus its expected angle label
/// in, the model's raw response out
pub trait VisionBackend {
    fn analyze(&self, image_path: &Path, angle: &str) -> Result<String>;
}

/// Backend driving an external AI CLI
///
/// The configured command is split shell-style, the prompt is written to the
/// child's stdin and the image path appended as the final argument. The child
/// is killed once the timeout expires.
pub struct CommandBackend {
    pub command: String,
    pub timeout: Duration,
}

impl VisionBackend for CommandBackend {
    fn analyze(&self, image_path: &Path, angle: &str) -> Result<String> {
        let argv = shell_words::split(&self.command)
            .map_err(|e| Error::AnalysisFailed(format!("invalid backend command: {}", e)))?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::AnalysisFailed("empty backend command".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .arg(image_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::AnalysisFailed(format!("failed to launch {}: {}", program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(build_damage_prompt(angle).as_bytes())?;
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait()? {
                Some(_) => break,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::AnalysisFailed(format!(
                        "backend timed out after {}s",
                        self.timeout.as_secs()
                    )));
                }
                None => thread::sleep(Duration::from_millis(50)),
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::AnalysisFailed(format!(
                "backend exited with {}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Deterministic stand-in for a real vision model
///
/// Derives a stable pseudo-assessment from the photo's content hash so that
/// development and tests run without an AI service. Swap in a real backend
/// through `AnalyzerConfig::backend_command`.
pub struct StubBackend;

const STUB_DAMAGE_TYPES: &[&str] = &["Scratch", "Dent", "Paint Damage", "Crack"];

impl VisionBackend for StubBackend {
    fn analyze(&self, image_path: &Path, angle: &str) -> Result<String> {
        let digest = fingerprint(image_path);
        let assessment = synthesize_assessment(&digest, angle);
        Ok(serde_json::to_string(&assessment)?)
    }
}

/// Stable fingerprint of the photo: content hash when readable, path hash
/// otherwise
fn fingerprint(image_path: &Path) -> [u8; 32] {
    let mut hasher = Sha256::new();
    match File::open(image_path) {
        Ok(file) => {
            let mut reader = BufReader::new(file);
            if std::io::copy(&mut reader, &mut hasher).is_err() {
                hasher = Sha256::new();
                hasher.update(image_path.display().to_string().as_bytes());
            }
        }
        Err(_) => hasher.update(image_path.display().to_string().as_bytes()),
    }
    hasher.finalize().into()
}

fn synthesize_assessment(digest: &[u8; 32], angle: &str) -> AnalysisResult {
    let has_damage = digest[0] % 4 == 0;
    let severity = if has_damage {
        match digest[1] % 3 {
            0 => Severity::Minor,
            1 => Severity::Moderate,
            _ => Severity::Severe,
        }
    } else {
        Severity::None
    };
    let image_complete = digest[3] % 10 != 0;

    let (damage_type, description, recommendations) = if has_damage {
        let damage_type = STUB_DAMAGE_TYPES[digest[2] as usize % STUB_DAMAGE_TYPES.len()];
        (
            damage_type.to_string(),
            format!("{} visible in the {} view.", damage_type, angle),
            vec![format!("Have the {} inspected at a body shop.", angle)],
        )
    } else {
        (
            String::new(),
            format!("No visible damage in the {} view.", angle),
            Vec::new(),
        )
    };

    AnalysisResult {
        has_damage,
        damage_type,
        severity,
        description,
        recommendations,
        image_complete,
        completeness_note: if image_complete {
            None
        } else {
            Some(format!("The {} view could not be verified.", angle))
        },
    }
}

/// Extract JSON from a model response (handles markdown code blocks)
pub fn extract_json_from_response(response: &str) -> String {
    let response = response.trim();

    if response.starts_with("```json") {
        if let Some(end) = response.rfind("```") {
            let start = response.find('\n').unwrap_or(7) + 1;
            if start < end {
                return response[start..end].trim().to_string();
            }
        }
    }

    if response.starts_with("```") {
        if let Some(end) = response.rfind("```") {
            let start = response.find('\n').unwrap_or(3) + 1;
            if start < end {
                return response[start..end].trim().to_string();
            }
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if start < end {
                return response[start..=end].to_string();
            }
        }
    }

    response.to_string()
}

/// Parse a model response into an assessment
///
/// Unparseable output is an error; the batch layer substitutes the synthetic
/// failure result so a batch never loses an entry.
pub fn parse_assessment(response: &str) -> Result<AnalysisResult> {
    let json = extract_json_from_response(response);
    let result: AnalysisResult = serde_json::from_str(&json).map_err(|e| {
        let truncated: String = response.chars().take(200).collect();
        Error::AnalysisFailed(format!("unparseable response: {} | raw: {}", e, truncated))
    })?;
    Ok(result.normalized())
}

/// Progress callback for batch analysis
pub type ProgressCallback = Box<dyn Fn(&str)>;

/// Options for batch analysis
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Pause between consecutive backend calls
    pub delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_ANALYSIS_DELAY,
        }
    }
}

impl BatchOptions {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Outcome of analyzing one photo set
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One entry per input photo, failures included
    pub results: Vec<AnalysisResult>,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Analyze a photo set one slot at a time.
///
/// Calls are strictly sequential with a fixed pause between them. A failed
/// call is replaced by the synthetic failure result and the batch continues;
/// the outcome always holds exactly one result per input photo.
pub fn analyze_photo_set(
    backend: &dyn VisionBackend,
    photos: &[String],
    options: &BatchOptions,
    progress: Option<ProgressCallback>,
) -> BatchOutcome {
    let notify = |msg: &str| {
        if let Some(ref cb) = progress {
            cb(msg);
        }
    };

    let started_at = Utc::now();
    let mut results = Vec::with_capacity(photos.len());
    let mut succeeded = 0;
    let mut failed = 0;

    for (index, photo) in photos.iter().enumerate() {
        if index > 0 && !options.delay.is_zero() {
            thread::sleep(options.delay);
        }

        let angle = CameraSlot::label_for_index(index);
        notify(&format!(
            "Analyzing {} ({}/{})...",
            angle,
            index + 1,
            photos.len()
        ));

        match backend
            .analyze(Path::new(photo), &angle)
            .and_then(|raw| parse_assessment(&raw))
        {
            Ok(result) => {
                succeeded += 1;
                results.push(result);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(angle = %angle, error = %e, "photo analysis failed");
                notify(&format!("{} failed: {}", angle, e));
                results.push(AnalysisResult::analysis_failed(e.to_string()));
            }
        }
    }

    BatchOutcome {
        results,
        succeeded,
        failed,
        started_at,
        completed_at: Utc::now(),
    }
}
