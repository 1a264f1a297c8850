use std::time::Duration;

use dbgate_spec::DbConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};

const DEFAULT_MAX_OPEN: u32 = 10;

/// Build a lazily-connecting pool from the document's `db:` section.
///
/// No connection is opened here; the first query dials out. A bad URL
/// still fails immediately.
pub fn create_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let (max_open, max_idle, max_lifetime) = pool_sizes(config);
    let mut options = PgPoolOptions::new()
        .max_connections(max_open)
        .min_connections(max_idle);
    if let Some(lifetime) = max_lifetime {
        options = options.max_lifetime(lifetime);
    }
    options.connect_lazy(&config.url)
}

/// Effective pool sizing: a `maxOpen` that is non-positive or too large to
/// represent falls back to the default, `maxIdle` is clamped into
/// `[0, maxOpen]`, and a non-positive `maxLifetime` means connections never
/// retire.
fn pool_sizes(config: &DbConfig) -> (u32, u32, Option<Duration>) {
    let max_open = if config.max_open < 1 {
        DEFAULT_MAX_OPEN
    } else {
        u32::try_from(config.max_open).unwrap_or(DEFAULT_MAX_OPEN)
    };
    let max_idle = config.max_idle.clamp(0, i64::from(max_open)) as u32;
    let max_lifetime = if config.max_lifetime > 0 {
        Some(Duration::from_secs(config.max_lifetime as u64))
    } else {
        None
    };
    (max_open, max_idle, max_lifetime)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_open: i64, max_idle: i64, max_lifetime: i64) -> DbConfig {
        DbConfig {
            url: "postgres://localhost/app".to_string(),
            max_open,
            max_idle,
            max_lifetime,
        }
    }

    #[test]
    fn unset_max_open_falls_back_to_default() {
        let (open, _, _) = pool_sizes(&config(0, 0, 0));
        assert_eq!(open, DEFAULT_MAX_OPEN);
        let (open, _, _) = pool_sizes(&config(-5, 0, 0));
        assert_eq!(open, DEFAULT_MAX_OPEN);
    }

    #[test]
    fn oversized_max_open_falls_back_to_default() {
        let (open, idle, _) = pool_sizes(&config(i64::MAX, 3, 0));
        assert_eq!(open, DEFAULT_MAX_OPEN);
        assert_eq!(idle, 3);
    }

    #[test]
    fn max_idle_is_clamped_to_max_open() {
        let (open, idle, _) = pool_sizes(&config(4, 100, 0));
        assert_eq!(open, 4);
        assert_eq!(idle, 4);
        let (_, idle, _) = pool_sizes(&config(4, -1, 0));
        assert_eq!(idle, 0);
    }

    #[test]
    fn lifetime_only_applies_when_positive() {
        let (_, _, lifetime) = pool_sizes(&config(4, 0, 300));
        assert_eq!(lifetime, Some(Duration::from_secs(300)));
        let (_, _, lifetime) = pool_sizes(&config(4, 0, 0));
        assert_eq!(lifetime, None);
    }

    #[tokio::test]
    async fn lazy_pool_builds_without_a_server() {
        let pool = create_pool(&config(2, 1, 60)).expect("lazy pool");
        assert!(!pool.is_closed());
    }
}
