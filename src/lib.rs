//! # Slushpile
//!
//! Heuristic manuscript scoring for slush-pile triage.
//!
//! Slushpile decodes manuscript files (txt, md, pdf, docx), measures prose
//! statistics, and scores five dimensions (genre, style, character,
//! causality, market) with transparent deterministic rules. The same
//! analysis backs a CLI and a JSON HTTP API; nothing leaves the machine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │  Decode  │──▶│ Features │──▶│  Score   │──▶│  Report  │
//! │ txt/pdf/ │   │ sentences│   │  rules+  │   │ sections │
//! │   docx   │   │  quotes  │   │  consts  │   │ evidence │
//! └──────────┘   └──────────┘   └──────────┘   └────┬─────┘
//!                                                   │
//!                                 ┌─────────────────┤
//!                                 ▼                 ▼
//!                           ┌──────────┐      ┌──────────┐
//!                           │   CLI    │      │   HTTP   │
//!                           │ (slush)  │      │  (JSON)  │
//!                           └──────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! slush init                          # create storage directories
//! slush analyze drafts/harbor.txt     # print the summary
//! slush analyze drafts/harbor.txt --json
//! slush serve                         # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and upload limits |
//! | [`decode`] | File format detection and text extraction |
//! | [`features`] | Prose statistics |
//! | [`score`] | Rule-based dimension scoring |
//! | [`report`] | Report data model and assembly |
//! | [`pipeline`] | Decode → features → score → report |
//! | [`store`] | Manuscript and report persistence |
//! | [`server`] | JSON HTTP server |

pub mod config;
pub mod decode;
pub mod features;
pub mod pipeline;
pub mod report;
pub mod score;
pub mod server;
pub mod store;
