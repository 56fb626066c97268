//! Scenario-level tests for the full construction and parse pipeline.

mod grammar_tests;
