//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Gate writes with boundary validation before any persistence happens.
//! - Keep the HTTP layer decoupled from storage details.

pub mod city_service;
