//! Cross-module tests of the canvas session.
