//! Toolbar state: active tool, color, and width.

use meetboard_core::input::Brush;
use meetboard_core::stroke::StrokeMode;

/// Narrowest stroke the width slider allows.
pub const MIN_WIDTH: f64 = 1.0;
/// Widest stroke the width slider allows.
pub const MAX_WIDTH: f64 = 16.0;

/// The drawing tool selected in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Pen,
    Highlighter,
    Eraser,
}

impl From<ToolKind> for StrokeMode {
    fn from(tool: ToolKind) -> Self {
        match tool {
            ToolKind::Pen => StrokeMode::Pen,
            ToolKind::Highlighter => StrokeMode::Highlighter,
            ToolKind::Eraser => StrokeMode::Eraser,
        }
    }
}

/// Current toolbar selection, applied to newly begun strokes.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub tool: ToolKind,
    color: String,
    width: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::Pen,
            color: "#22c55e".to_string(),
            width: 3.0,
        }
    }
}

impl ToolSettings {
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Set the stroke width, clamped to the slider range.
    pub fn set_width(&mut self, width: f64) {
        self.width = width.clamp(MIN_WIDTH, MAX_WIDTH);
    }

    /// The brush new strokes are begun with.
    pub fn brush(&self) -> Brush {
        Brush {
            mode: self.tool.into(),
            color: self.color.clone(),
            width: self.width,
        }
    }
}
