// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod classifier_properties;
mod diff_properties;
