use anyhow::{bail, Context, Result};
use reqwest::Url;

/// Production backend
pub const DEFAULT_API_BASE_URL: &str = "https://shukuma-backend.onrender.com";

/// Which slice of the exercise catalogue to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseFilter {
    All,
    Difficulty(String),
    Type(String),
}

/// Endpoint table, rooted at a configurable base URL.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            bail!("API base URL must be http or https: {}", base_url);
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    // ===== Authentication =====

    pub fn login(&self) -> Url {
        self.url(&["api", "login"])
    }

    pub fn register(&self) -> Url {
        self.url(&["api", "register"])
    }

    // ===== Exercises =====

    pub fn daily(&self) -> Url {
        self.url(&["api", "daily"])
    }

    pub fn exercises(&self) -> Url {
        self.url(&["api", "exercises"])
    }

    pub fn exercises_by_difficulty(&self, level: &str) -> Url {
        self.url(&["api", "exercises", "difficulty", level])
    }

    pub fn exercises_by_type(&self, kind: &str) -> Url {
        self.url(&["api", "exercises", "type", kind])
    }

    pub fn exercises_for(&self, filter: &ExerciseFilter) -> Url {
        match filter {
            ExerciseFilter::All => self.exercises(),
            ExerciseFilter::Difficulty(level) => self.exercises_by_difficulty(level),
            ExerciseFilter::Type(kind) => self.exercises_by_type(kind),
        }
    }

    pub fn exercise(&self, id: &str) -> Url {
        self.url(&["api", "exercises", id])
    }

    pub fn random_exercise(&self) -> Url {
        self.url(&["api", "exercises", "random"])
    }

    // ===== Progress =====

    pub fn progress(&self) -> Url {
        self.url(&["api", "progress"])
    }

    /// Append path segments to the base; each segment is percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // http(s) URLs always have a path, so this cannot fail
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
