//! End-to-end tests for the creative engine.
//!
//! Most run over the in-memory store; `postgres_test` needs a scratch
//! database named by `CREATIVEHUB_TEST_DATABASE_URL`.

mod access_test;
mod batch_test;
mod copy_test;
mod helpers;
mod postgres_test;
mod regeneration_test;
