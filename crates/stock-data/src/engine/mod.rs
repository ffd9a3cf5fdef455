//! Stock Analysis Engine
//!
//! Orchestration boundary for analysis passes: gathers one context, runs
//! pluggable passes over it and hands their reports to a synthesizer.

pub mod analysis_engine;
pub mod context;
pub mod result;

pub use analysis_engine::{AnalysisPass, ReportSynthesizer, StockAnalysisEngine};
pub use context::AnalysisContext;
pub use result::{PassReport, Rating, Recommendation};
