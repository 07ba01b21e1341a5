/*! Integration tests for KidSpark.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - backend: the SQLite file datastore
 * - credential: the family password pool
 * - session: admin and kid session lifecycle
 * - kid: kid profiles
 * - progress: the server-side upsert and the client-side buffer
 * - activity: lesson runs feeding the buffer
 * - api: the HTTP surface, end to end over a real socket
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("kidspark=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod activity;
mod api;
mod credential;
mod kid;
