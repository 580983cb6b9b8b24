//! Scratch Postgres databases carrying the search schema, for `#[ignore]`d integration tests.
//!
//! Each [`TestDatabase`] lives on the server named by `SCOUT_PG_DSN` under a random name and is
//! removed by [`TestDatabase::cleanup`]. A test that panics before cleanup leaves its database
//! behind; the `scout_test_` prefix makes such leftovers easy to sweep.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use uuid::Uuid;

use scout_config::Postgres;
use scout_storage::db::Db;

pub const DSN_VAR: &str = "SCOUT_PG_DSN";

const DATABASE_PREFIX: &str = "scout_test_";
const POOL_MAX_CONNS: u32 = 4;

pub fn env_dsn() -> Option<String> {
	env::var(DSN_VAR).ok().filter(|dsn| !dsn.trim().is_empty())
}

pub struct TestDatabase {
	name: String,
	admin: PgConnectOptions,
	postgres: Postgres,
	db: Db,
}
impl TestDatabase {
	/// Creates a scratch database from `SCOUT_PG_DSN`, or returns `None` when it is unset.
	pub async fn from_env() -> Result<Option<Self>> {
		match env_dsn() {
			Some(dsn) => Ok(Some(Self::create(&dsn).await?)),
			None => Ok(None),
		}
	}

	/// Creates a scratch database next to `base_dsn` and bootstraps the search schema in it.
	pub async fn create(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn).map_err(Error::InvalidDsn)?;
		let (admin, mut conn) = admin_connection(&base).await?;
		let name = format!("{DATABASE_PREFIX}{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;
		conn.close().await?;

		let dsn = base.database(&name).to_url_lossy().to_string();
		let postgres = Postgres { dsn, pool_max_conns: POOL_MAX_CONNS };
		let db = Db::connect(&postgres).await?;

		db.ensure_schema().await?;

		Ok(Self { name, admin, postgres, db })
	}

	/// Pool on the scratch database, schema already in place.
	pub fn db(&self) -> &Db {
		&self.db
	}

	/// Storage config pointing at the scratch database.
	pub fn postgres(&self) -> &Postgres {
		&self.postgres
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Closes the pool and drops the scratch database.
	pub async fn cleanup(self) -> Result<()> {
		self.db.pool.close().await;

		let mut conn = PgConnection::connect_with(&self.admin).await?;

		sqlx::query(
			"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
		)
		.bind(&self.name)
		.execute(&mut conn)
		.await?;
		conn.execute(format!(r#"DROP DATABASE IF EXISTS "{}""#, self.name).as_str()).await?;
		conn.close().await?;

		Ok(())
	}
}

/// `CREATE DATABASE` needs a connection to some other database on the same server.
async fn admin_connection(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let postgres = base.clone().database("postgres");

	match PgConnection::connect_with(&postgres).await {
		Ok(conn) => Ok((postgres, conn)),
		Err(_) => {
			let template = base.clone().database("template1");
			let conn =
				PgConnection::connect_with(&template).await.map_err(Error::AdminUnavailable)?;

			Ok((template, conn))
		},
	}
}
