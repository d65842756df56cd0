//! Theme and Colors
//!
//! A green-on-black terminal palette, one color per transcript entry kind.

use ratatui::style::{Color, Modifier, Style};

use sudosolve_core::{EntryKind, NotifyLevel};

// ============================================================================
// Transcript Colors
// ============================================================================

/// Echoed commands
pub const COMMAND_GREEN: Color = Color::Rgb(130, 220, 130);

/// Plain responses
pub const RESPONSE_WHITE: Color = Color::Rgb(220, 220, 220);

/// Error entries
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Image references
pub const IMAGE_CYAN: Color = Color::Rgb(100, 200, 230);

/// Embedded components
pub const COMPONENT_BLUE: Color = Color::Rgb(150, 180, 255);

// ============================================================================
// UI Colors
// ============================================================================

/// Separators and dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Progress gauge fill
pub const PROGRESS_YELLOW: Color = Color::Rgb(255, 223, 128);

/// Warning notifications
pub const WARNING_ORANGE: Color = Color::Rgb(255, 170, 80);

/// Success notifications
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Style for a transcript line of the given kind
pub fn entry_style(kind: EntryKind) -> Style {
    match kind {
        EntryKind::Command => Style::default().fg(COMMAND_GREEN),
        EntryKind::Response => Style::default().fg(RESPONSE_WHITE),
        EntryKind::Error => Style::default().fg(ERROR_RED),
        EntryKind::Image => Style::default()
            .fg(IMAGE_CYAN)
            .add_modifier(Modifier::UNDERLINED),
        EntryKind::Component => Style::default().fg(COMPONENT_BLUE),
    }
}

/// Style for a status bar notification
pub fn notify_style(level: NotifyLevel) -> Style {
    match level {
        NotifyLevel::Info => Style::default().fg(DIM_GRAY),
        NotifyLevel::Warning => Style::default().fg(WARNING_ORANGE),
        NotifyLevel::Error => Style::default().fg(ERROR_RED),
        NotifyLevel::Success => Style::default().fg(SUCCESS_GREEN),
    }
}
