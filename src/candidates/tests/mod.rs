// src/candidates/tests/mod.rs
