//! Recycler configuration.
//!
//! Build a [`RecyclerConfig`] with the `with_*` methods, or read overrides
//! from the environment with [`RecyclerConfig::from_env`]:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `FRANKENTUI_RECYCLE_CACHE_DEPTH` | cache band depth (default 2) |
//! | `FRANKENTUI_RECYCLE_PREWARM` | views created up front (default 0) |
//! | `FRANKENTUI_RECYCLE_ENDCAP` | `1`/`true`/`yes` enables the endcap |
//! | `FRANKENTUI_RECYCLE_SETTLE_LIMIT` | settle pass cap (default none); `0`/`none` removes it |
//! | `FRANKENTUI_RECYCLE_ORIENTATION` | `forward` or `reverse` |
//!
//! Values that fail to parse are ignored.

/// Default number of indices pre-materialized on each side of the viewport.
pub const DEFAULT_CACHE_DEPTH: usize = 2;

/// Suggested settle pass cap for hosts whose visibility test may not
/// stabilize. A cap is opt-in: each pass grows the window by at most
/// `cache_depth` indices, so a viewport wider than
/// `limit * cache_depth` rows needs more passes than this to settle.
pub const DEFAULT_SETTLE_PASS_LIMIT: usize = 256;

/// Screen direction in which the list grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppendOrientation {
    /// Index 0 on the leading edge (top or left); appends grow away from it.
    #[default]
    Forward,
    /// Index 0 on the trailing edge, as in chat transcripts.
    Reverse,
}

impl AppendOrientation {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "forward" | "down" => Some(Self::Forward),
            "reverse" | "up" => Some(Self::Reverse),
            _ => None,
        }
    }
}

/// Tuning for a [`Recycler`](crate::Recycler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecyclerConfig {
    /// Cache band depth `D` on each side of the visible range.
    ///
    /// A tick only probes active indices, so the cache bands are what lets
    /// the visible range grow. With `0` a tick can shrink or move the
    /// visible range within the active views but never widen it past them;
    /// widen it with [`Recycler::set_visible_range`](crate::Recycler::set_visible_range).
    pub cache_depth: usize,
    pub orientation: AppendOrientation,
    /// Views created by the factory when the recycler is built.
    pub prewarm: usize,
    /// Track a sentinel endcap after the last item.
    pub endcap: bool,
    /// Maximum settle passes before giving up with
    /// [`RecycleError::SettleDidNotConverge`](crate::RecycleError::SettleDidNotConverge).
    /// `None` (the default) removes the cap, so a visibility test that
    /// never stabilizes loops forever. See [`DEFAULT_SETTLE_PASS_LIMIT`].
    pub settle_pass_limit: Option<usize>,
}

impl Default for RecyclerConfig {
    fn default() -> Self {
        Self {
            cache_depth: DEFAULT_CACHE_DEPTH,
            orientation: AppendOrientation::Forward,
            prewarm: 0,
            endcap: false,
            settle_pass_limit: None,
        }
    }
}

impl RecyclerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through a custom lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(depth) = get_env("FRANKENTUI_RECYCLE_CACHE_DEPTH")
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            config.cache_depth = depth;
        }
        if let Some(prewarm) =
            get_env("FRANKENTUI_RECYCLE_PREWARM").and_then(|v| v.trim().parse::<usize>().ok())
        {
            config.prewarm = prewarm;
        }
        if let Some(endcap) = get_env("FRANKENTUI_RECYCLE_ENDCAP") {
            config.endcap = matches!(
                endcap.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        if let Some(limit) = get_env("FRANKENTUI_RECYCLE_SETTLE_LIMIT") {
            match limit.trim().to_ascii_lowercase().as_str() {
                "0" | "none" | "off" => config.settle_pass_limit = None,
                other => {
                    if let Ok(passes) = other.parse::<usize>() {
                        config.settle_pass_limit = Some(passes);
                    }
                }
            }
        }
        if let Some(orientation) =
            get_env("FRANKENTUI_RECYCLE_ORIENTATION").and_then(|v| AppendOrientation::parse(&v))
        {
            config.orientation = orientation;
        }
        config
    }

    #[must_use]
    pub fn with_cache_depth(mut self, depth: usize) -> Self {
        self.cache_depth = depth;
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: AppendOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn with_prewarm(mut self, views: usize) -> Self {
        self.prewarm = views;
        self
    }

    #[must_use]
    pub fn with_endcap(mut self, endcap: bool) -> Self {
        self.endcap = endcap;
        self
    }

    #[must_use]
    pub fn with_settle_pass_limit(mut self, limit: Option<usize>) -> Self {
        self.settle_pass_limit = limit;
        self
    }
}
