//! Migration and API E2E test suite.
//!
//! Runs against a real PostgreSQL server named by `TT_TEST_DATABASE_URL`.
//! Every test works in its own freshly created schema, so tests can run in
//! parallel against one database. The tests are `#[ignore]`d so a plain
//! `cargo test` does not report them as passing; with `--ignored` and no
//! database configured they fail.
//!
//! Run with: TT_TEST_DATABASE_URL=postgres://... cargo test --test migrations_e2e -- --ignored

mod test_helpers;

mod test_api_flow;
mod test_backfill;
mod test_down;
mod test_failure;
mod test_idempotence;
mod test_ordering;
