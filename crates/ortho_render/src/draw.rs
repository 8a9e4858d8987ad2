//! Retained draw commands.
//!
//! Every command carries the transform from its local space to the
//! surface's logical space; the canvas adds its own base transform on top.

use crate::{Affine, Bitmap, Color, Rect};

/// Font settings for a text command.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels
    pub size: f64,
    /// CSS-style font family list
    pub family: String,
    pub color: Color,
}

/// A draw command to be executed during rasterization
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Draw `bitmap` stretched to `width` x `height` with its top-left at the local origin
    Image {
        bitmap: Bitmap,
        width: f64,
        height: f64,
        transform: Affine,
    },
    FillRect {
        rect: Rect,
        color: Color,
        transform: Affine,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f64,
        transform: Affine,
    },
    /// Single line of text with its top-left corner at `(x, y)`
    Text {
        text: String,
        x: f64,
        y: f64,
        style: TextStyle,
        transform: Affine,
    },
}

impl DrawCommand {
    pub fn transform(&self) -> Affine {
        match self {
            DrawCommand::Image { transform, .. }
            | DrawCommand::FillRect { transform, .. }
            | DrawCommand::StrokeRect { transform, .. }
            | DrawCommand::Text { transform, .. } => *transform,
        }
    }
}

/// An ordered list of draw commands, painted back to front.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Append all commands of `other`, keeping their order.
    pub fn extend(&mut self, other: &DrawList) {
        self.commands.extend(other.commands.iter().cloned());
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
