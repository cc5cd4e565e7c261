//! Shared UI icons.
//!
//! Each icon falls back to plain ASCII on terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Phase indicators
pub static QUESTION: Emoji<'_, '_> = Emoji("❓ ", "?");
pub static BLUEPRINT: Emoji<'_, '_> = Emoji("📐 ", "[PLAN]");
pub static HAMMER: Emoji<'_, '_> = Emoji("🔨 ", "[IMPL]");
pub static REVIEW: Emoji<'_, '_> = Emoji("🔍 ", "[QA]");
pub static BOOK: Emoji<'_, '_> = Emoji("📖 ", "[GUIDE]");

// File indicators
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static FILE_NEW: Emoji<'_, '_> = Emoji("📄 ", "+");
