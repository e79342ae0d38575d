//! # Integration-Style Test Suites
//!
//! Cross-module checks that drive the tide engine the way the client does:
//! vendor JSON in, station summaries and chart curves out.

mod forecast_tests;
