//! Tracing targets used by this crate.
//!
//! Events are emitted through [`tracing`]; install any subscriber (for example
//! `tracing_subscriber::fmt`) to see them. Filter by target to narrow the
//! output:
//!
//! ```text
//! RUST_LOG=horizon_lattice_textframe::layout=trace
//! ```

/// Log target constants for filtering.
pub mod targets {
    /// Crate-wide target.
    pub const TEXT_FRAME: &str = "horizon_lattice_textframe";
    /// Line breaking, truncation and the scale-to-fit search.
    pub const LAYOUT: &str = "horizon_lattice_textframe::layout";
    /// Glyph shaping and font loading.
    pub const SHAPING: &str = "horizon_lattice_textframe::shaping";
    /// Drawing onto surfaces.
    pub const DRAW: &str = "horizon_lattice_textframe::draw";
}
