//! Integration Tests Module
//!
//! End-to-end tests for the windsite orchestrator. Every test drives the full
//! pipeline through `WorkflowOrchestrator::handle` against hand-written tool
//! invoker, decision-engine, and project-store doubles.

// Shared collaborator doubles
mod support;

// Request scenarios across the four workflow steps
mod pipeline_test;

// Decision-engine fallback for low-confidence requests
mod fallback_test;

// Persistence failures, version conflicts and cancellation
mod persistence_test;
