/// PostgreSQL plumbing behind `store::PgStore`
///
/// - `pool`: connection pool construction, liveness probe, usage stats
/// - `migrations`: schema migrations embedded from `migrations/`
///
/// SQL for each table lives with its model in `crate::models`.

pub mod migrations;
pub mod pool;
