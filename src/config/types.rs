use serde::Deserialize;

/// Browser identity sent with every article request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for Paperbind
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub pipeline: PipelineConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub email: EmailConfig,
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Total attempts per URL, including the first one
    pub retry_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Maximum number of redirects followed per request
    pub max_redirects: usize,

    /// User-Agent header value
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Whether permanent failures (invalid URL, most 4xx) are retried too
    pub retry_permanent_errors: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_attempts: 2,
            retry_delay_ms: 2_000,
            max_redirects: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            retry_permanent_errors: true,
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Number of concurrent fetch-and-extract workers
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 3 }
    }
}

/// CSV input configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InputConfig {
    /// Directory searched for the newest CSV when no path is given
    pub directory: String,

    /// Folders whose entries are skipped
    pub excluded_folders: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            directory: "input".to_string(),
            excluded_folders: vec!["Archive".to_string()],
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the book (and any extra formats) are written to
    pub directory: String,

    /// Book file name prefix; the run date is appended
    pub file_stem: String,

    /// Book title; empty means "Reading list – <date>"
    pub book_title: String,

    /// Author recorded in the EPUB metadata
    pub author: String,

    /// Book language (BCP 47 tag)
    pub language: String,

    /// Also write a single-file HTML book
    pub html: bool,

    /// Also write one markdown file per article
    pub markdown: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            file_stem: "paperbind".to_string(),
            book_title: String::new(),
            author: "Paperbind".to_string(),
            language: "en".to_string(),
            html: false,
            markdown: false,
        }
    }
}

/// Email delivery of the finished EPUB
///
/// Addresses and the password are read from the `SENDER_EMAIL`,
/// `SENDER_PASSWORD` and `RECIPIENT_EMAIL` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EmailConfig {
    /// Attempt delivery after the book is written
    pub enabled: bool,

    pub smtp_host: String,

    /// 465 uses implicit TLS, any other port STARTTLS
    pub smtp_port: u16,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
        }
    }
}
