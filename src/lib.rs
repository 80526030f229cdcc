//! Network Analyzer
//!
//! Collects the textual output of the macOS network utilities, normalizes it
//! into a typed per-interface record and grades the result with a composite
//! health score, warnings and recommendations.

pub mod analyzer;
pub mod cli;
pub mod collector;
pub mod command;
pub mod config;
pub mod dns;
pub mod error;
pub mod health;
pub mod logging;
pub mod merge;
pub mod models;
pub mod output;
pub mod parsers;
pub mod types;

// Re-export commonly used types
pub use analyzer::{AnalyzeOptions, Analysis, Analyzer};
pub use error::{AppError, Result};
pub use health::assess;
pub use models::{Config, HealthAssessment, HealthCategory, InterfaceRecord};
pub use types::{resolve_mode, Mode, RequestedMode};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata from build.rs
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_SPEED_TEST_TIMEOUT: Duration = Duration::from_secs(180);
    pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(600);
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DEFAULT_DNS_QUERY_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_DNS_CONCURRENCY: usize = 16;
    pub const DEFAULT_PING_COUNT: u32 = 10;
    pub const DEFAULT_IPERF3_DURATION_SECS: u32 = 10;
    pub const DEFAULT_IPERF3_PORT: u16 = 5201;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const DEFAULT_PUBLIC_IP_URL: &str = "https://api.ipify.org?format=json";
    pub const DEFAULT_GEOLOCATION_URL: &str = "http://ip-api.com/json/";

    /// Pinged when the gateway does not answer
    pub const PUBLIC_ANCHOR: &str = "1.1.1.1";

    /// Well-known resolvers pinged in online mode, as (address, label)
    pub const GLOBAL_PING_TARGETS: &[(&str, &str)] = &[
        ("8.8.8.8", "Google DNS"),
        ("1.1.1.1", "Cloudflare DNS"),
        ("9.9.9.9", "Quad9 DNS"),
    ];

    /// TCP endpoints tried by the reachability probe, in order
    pub const PROBE_ENDPOINTS: &[&str] = &["1.1.1.1:443", "8.8.8.8:53"];

    /// Resolver label used when no resolver address is configured
    pub const SYSTEM_RESOLVER_LABEL: &str = "system default";

    /// Domains queried by the DNS reliability sweep
    pub const DNS_TEST_DOMAINS: [&str; 100] = [
        "google.com", "facebook.com", "youtube.com", "amazon.com", "microsoft.com",
        "apple.com", "netflix.com", "twitter.com", "instagram.com", "linkedin.com",
        "adobe.com", "oracle.com", "salesforce.com", "zoom.us", "cisco.com",
        "intel.com", "nvidia.com", "amd.com", "ibm.com", "dell.com",
        "hp.com", "samsung.com", "sony.com", "toshiba.com", "lenovo.com",
        "cloudflare.com", "aws.amazon.com", "azure.microsoft.com", "cloud.google.com",
        "digitalocean.com", "heroku.com", "netlify.com", "vercel.com", "fastly.com",
        "akamai.com",
        "whatsapp.com", "telegram.org", "discord.com", "slack.com", "teams.microsoft.com",
        "snapchat.com", "tiktok.com", "pinterest.com", "tumblr.com", "mastodon.social",
        "github.com", "gitlab.com", "bitbucket.org", "stackoverflow.com", "npmjs.com",
        "pypi.org", "docker.com", "kubernetes.io", "apache.org", "mozilla.org",
        "w3.org", "ietf.org", "jquery.com", "nodejs.org", "python.org",
        "ebay.com", "walmart.com", "target.com", "bestbuy.com", "shopify.com",
        "etsy.com", "aliexpress.com", "alibaba.com", "rakuten.com", "wayfair.com",
        "cnn.com", "bbc.com", "nytimes.com", "reuters.com", "bloomberg.com",
        "wsj.com", "theguardian.com", "forbes.com", "techcrunch.com", "wired.com",
        "theverge.com", "arstechnica.com", "engadget.com", "mashable.com",
        "spotify.com", "soundcloud.com", "twitch.tv", "vimeo.com", "dailymotion.com",
        "hulu.com", "disneyplus.com", "hbomax.com", "primevideo.com", "crunchyroll.com",
        "dropbox.com", "box.com", "onedrive.live.com", "notion.so", "trello.com",
        "asana.com",
    ];
}
