//! Presentation port and its adapters
//!
//! The session never formats anything itself; it hands finished view models
//! and user-facing notices to a [`PresentationPort`].

use std::fmt::Write as _;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::models::{BackgroundTheme, ViewModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A short message for the user, e.g. a fallback explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Consumer of finished view models
pub trait PresentationPort: Send + Sync {
    /// Show `view`. `theme` is the background currently in effect, which may
    /// be carried over from an earlier cycle.
    fn render(&self, view: &ViewModel, theme: Option<BackgroundTheme>);

    fn notify(&self, notice: &Notice);
}

/// Plain-text rendering used by the CLI
#[must_use]
pub fn format_view(view: &ViewModel, theme: Option<BackgroundTheme>) -> String {
    let temperature_unit = view.units.temperature_unit();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}  {}{}  {} [{}]",
        view.location_label, view.temperature, temperature_unit, view.description, view.icon
    );
    let _ = writeln!(out, "{}  {}", view.date_label, view.clock);
    let _ = writeln!(out, "Sunrise {}  Sunset {}", view.sunrise, view.sunset);
    let _ = writeln!(
        out,
        "Humidity {}% ({})  Wind {} {} @ {}°",
        view.humidity, view.humidity_tier, view.wind_speed, view.wind_unit, view.wind_direction
    );
    let uv = match view.uv_tier {
        Some(tier) => format!("{} ({tier})", view.uv_label),
        None => view.uv_label.clone(),
    };
    let _ = writeln!(
        out,
        "Precipitation (24h) {}  UV {}  Feels like {}{}",
        view.precipitation_label, uv, view.feels_like, temperature_unit
    );
    let _ = writeln!(out, "Chance of rain {}", view.rain_chance_label);

    let hourly: Vec<String> = view
        .hourly
        .iter()
        .map(|entry| {
            format!(
                "{} {}{} {}%",
                entry.label, entry.temperature, temperature_unit, entry.precipitation_percent
            )
        })
        .collect();
    if !hourly.is_empty() {
        let _ = writeln!(out, "{}", hourly.join(" | "));
    }

    let _ = write!(
        out,
        "{} · theme {}",
        if view.is_daytime { "Day" } else { "Night" },
        theme.map_or("unchanged", |t| t.as_str())
    );
    out
}

/// Writes to stdout and notices to stderr
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl PresentationPort for ConsolePresenter {
    fn render(&self, view: &ViewModel, theme: Option<BackgroundTheme>) {
        println!("{}", format_view(view, theme));
    }

    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Warning => eprintln!("warning: {}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}

/// Latest frame plus pending notices, for adapters that poll
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub view: Option<ViewModel>,
    pub theme: Option<BackgroundTheme>,
    pub notices: Vec<Notice>,
}

/// Keeps what was presented so the HTTP adapter can serve it
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    inner: Mutex<Snapshot>,
}

impl RecordingPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest frame and every notice since the previous call
    pub fn take_snapshot(&self) -> Snapshot {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Snapshot {
            view: inner.view.clone(),
            theme: inner.theme,
            notices: std::mem::take(&mut inner.notices),
        }
    }
}

impl PresentationPort for RecordingPresenter {
    fn render(&self, view: &ViewModel, theme: Option<BackgroundTheme>) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.view = Some(view.clone());
        inner.theme = theme;
    }

    fn notify(&self, notice: &Notice) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.notices.push(notice.clone());
    }
}
